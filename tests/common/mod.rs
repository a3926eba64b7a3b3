//! Shared mock chambers for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream, UdpSocket};

use chamber_walker::config::{EndpointConfig, WalkerConfig};

/// Start a TCP chamber on a free port; `handler` runs once per connection.
pub async fn start_tcp_chamber<F, Fut>(handler: F) -> SocketAddr
where
    F: Fn(TcpStream) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handler = std::sync::Arc::new(handler);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    let handler = handler.clone();
                    tokio::spawn(async move { handler(socket).await });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Start a UDP chamber on a free port; `handler` owns the socket.
pub async fn start_udp_chamber<F, Fut>(handler: F) -> SocketAddr
where
    F: FnOnce(UdpSocket) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let addr = socket.local_addr().unwrap();
    tokio::spawn(handler(socket));
    addr
}

/// Start an upstream file provider that answers every request with `body`
/// and echoes the request line in an `X-Request-Line` header.
pub async fn start_mock_upstream(body: &'static str) -> SocketAddr {
    start_tcp_chamber(move |mut socket| async move {
        let head = read_until(&mut socket, b"\r\n\r\n").await;
        let request_line = String::from_utf8_lossy(&head)
            .lines()
            .next()
            .unwrap_or_default()
            .to_string();

        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nX-Request-Line: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            request_line,
            body
        );
        let _ = socket.write_all(response.as_bytes()).await;
        let _ = socket.shutdown().await;
    })
    .await
}

/// Read until the accumulated bytes end with `suffix` (or the peer closes).
pub async fn read_until(socket: &mut TcpStream, suffix: &[u8]) -> Vec<u8> {
    let mut received = Vec::new();
    let mut buf = [0u8; 1024];
    while !received.ends_with(suffix) {
        let n = socket.read(&mut buf).await.unwrap();
        if n == 0 {
            break;
        }
        received.extend_from_slice(&buf[..n]);
    }
    received
}

/// Read exactly `len` bytes.
pub async fn read_len(socket: &mut TcpStream, len: usize) -> Vec<u8> {
    let mut buf = vec![0u8; len];
    socket.read_exact(&mut buf).await.unwrap();
    buf
}

/// Write `chunks` as separate writes with a short pause between them, so
/// the client sees them as separate reads.
pub async fn write_chunks(socket: &mut TcpStream, chunks: &[&[u8]]) {
    for chunk in chunks {
        socket.write_all(chunk).await.unwrap();
        socket.flush().await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Default config with every chamber pointed at an unroutable address and a
/// fixed username; tests override the chambers they exercise.
pub fn test_config() -> WalkerConfig {
    let mut config = WalkerConfig::default();
    config.identity.username = Some("tester".to_string());
    config.transport.udp_reply_timeout_secs = Some(5);
    config.http_proxy.bind_address = "127.0.0.1:0".to_string();
    config
}

pub fn endpoint(addr: SocketAddr) -> EndpointConfig {
    EndpointConfig::new(addr.to_string())
}
