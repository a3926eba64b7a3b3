//! Forwarding a fetch to the upstream file provider.
//!
//! # Responsibilities
//! - Open a fresh upstream connection per fetch
//! - Rewrite the request as `GET <prefix><target>` with `Host` and
//!   `Connection: close`
//! - Relay the upstream response verbatim until upstream closes

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

/// Build the upstream request line and headers. The target is copied
/// byte for byte.
pub fn upstream_request(upstream: &str, path_prefix: &str, target: &[u8]) -> Vec<u8> {
    let mut request = format!("GET {}", path_prefix).into_bytes();
    request.extend_from_slice(target);
    request.extend_from_slice(
        format!(" HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n", upstream).as_bytes(),
    );
    request
}

/// Fetch `target` from `upstream` and stream the response into `inbound`.
///
/// Returns the number of response bytes relayed. The inbound side is shut
/// down for writing once upstream closes.
pub async fn forward<S>(
    inbound: &mut S,
    upstream: &str,
    path_prefix: &str,
    target: &[u8],
) -> std::io::Result<u64>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut upstream_conn = TcpStream::connect(upstream).await?;

    let request = upstream_request(upstream, path_prefix, target);
    tracing::debug!(
        upstream = %upstream,
        request = %String::from_utf8_lossy(&request).trim_end(),
        "Forwarding request"
    );
    upstream_conn.write_all(&request).await?;

    let relayed = tokio::io::copy(&mut upstream_conn, inbound).await?;
    inbound.shutdown().await?;
    Ok(relayed)
}
