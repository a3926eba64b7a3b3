//! Proxy chamber HTTP server.
//!
//! # Responsibilities
//! - Accept inbound connections on a free local port
//! - Hand each connection to a detached handler task
//! - Forward fetches upstream, capture the first submission
//! - Stop accepting as soon as a submission has been captured
//!
//! # Design Decisions
//! - The outcome slot is a one-slot channel: the first handler to
//!   `try_send` wins, later submissions are logged and dropped
//! - Handler tasks are never joined; fetches still in flight when the
//!   submission arrives keep running on their own sockets
//! - A failed fetch is logged and only closes its own connection
//! - Accepting never waits on running handlers; only upstream fetches are
//!   bounded, and a fetch over the limit is answered with `503`

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use tokio::net::TcpStream;
use tokio::sync::mpsc;

use crate::config::HttpProxyConfig;
use crate::http::forward::forward;
use crate::http::request::{submission_prompt, RequestHead, RequestKind};
use crate::net::connection::{ConnectionGuard, ConnectionTracker};
use crate::net::listener::{ConnectionLimit, Listener, ListenerError};
use crate::net::StreamReader;

/// Largest request head accepted from an inbound client.
const MAX_HEAD_SIZE: usize = 16 * 1024;

/// Largest submission body accepted.
const MAX_BODY_SIZE: usize = 1024 * 1024;

const SUBMISSION_ACCEPTED: &[u8] =
    b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";

const FETCH_REFUSED: &[u8] =
    b"HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";

/// HTTP server that proxies fetches until a submission arrives.
pub struct ProxyServer {
    listener: Listener,
    config: Arc<HttpProxyConfig>,
    tracker: ConnectionTracker,
    fetch_limit: ConnectionLimit,
}

impl ProxyServer {
    /// Bind the listening socket described by `config`.
    pub async fn bind(config: &HttpProxyConfig) -> Result<Self, ListenerError> {
        let listener = Listener::bind(&config.bind_address).await?;
        Ok(Self {
            listener,
            config: Arc::new(config.clone()),
            tracker: ConnectionTracker::new(),
            fetch_limit: ConnectionLimit::new(config.max_concurrent_fetches),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.listener.local_addr()
    }

    /// Tracker of inbound connections whose handlers are still running.
    pub fn tracker(&self) -> ConnectionTracker {
        self.tracker.clone()
    }

    /// Serve until the first submission and return its prompt.
    ///
    /// The listener is closed on return; handler tasks are left running.
    pub async fn run_until_submission(self) -> Result<Bytes, ListenerError> {
        let (outcome_tx, mut outcome_rx) = mpsc::channel::<Bytes>(1);

        tracing::info!(address = %self.local_addr(), "Proxy accepting connections");

        loop {
            tokio::select! {
                biased;

                Some(prompt) = outcome_rx.recv() => {
                    tracing::info!(
                        accepted = self.tracker.accepted_count(),
                        in_flight = self.tracker.active_count(),
                        "Submission captured, proxy stops accepting"
                    );
                    return Ok(prompt);
                }

                accepted = self.listener.accept() => {
                    let (stream, peer_addr) = accepted?;
                    let guard = self.tracker.track();
                    let config = Arc::clone(&self.config);
                    let fetch_limit = self.fetch_limit.clone();
                    let outcome = outcome_tx.clone();

                    tokio::spawn(async move {
                        handle_connection(stream, peer_addr, config, fetch_limit, outcome, guard).await;
                    });
                }
            }
        }
    }
}

async fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    config: Arc<HttpProxyConfig>,
    fetch_limit: ConnectionLimit,
    outcome: mpsc::Sender<Bytes>,
    guard: ConnectionGuard,
) {
    let connection_id = guard.id();
    let mut inbound = StreamReader::new(stream);

    let head = match inbound.read_head(MAX_HEAD_SIZE).await {
        Ok(raw) => match RequestHead::parse(&raw) {
            Ok(head) => head,
            Err(e) => {
                tracing::warn!(%connection_id, %peer_addr, error = %e, "Unparseable request");
                return;
            }
        },
        Err(e) => {
            tracing::warn!(%connection_id, %peer_addr, error = %e, "Failed to read request");
            return;
        }
    };

    let target = head.target_lossy();
    tracing::debug!(
        %connection_id,
        %peer_addr,
        method = %head.method,
        %target,
        "Request received"
    );

    match head.kind(&config.submit_path) {
        RequestKind::Fetch => {
            let Some(_slot) = fetch_limit.try_acquire() else {
                tracing::warn!(%connection_id, %target, "Too many fetches in flight, refusing");
                if let Err(e) = inbound.send(FETCH_REFUSED).await {
                    tracing::debug!(%connection_id, error = %e, "Could not refuse fetch");
                }
                return;
            };

            match forward(
                inbound.get_mut(),
                &config.upstream,
                &config.upstream_path_prefix,
                &head.target,
            )
            .await
            {
                Ok(bytes) => tracing::debug!(%connection_id, %target, bytes, "Fetch relayed"),
                Err(e) => tracing::warn!(%connection_id, %target, error = %e, "Fetch failed"),
            }
        }
        RequestKind::Submission => {
            if head.content_length > MAX_BODY_SIZE {
                tracing::warn!(
                    %connection_id,
                    content_length = head.content_length,
                    "Submission body too large"
                );
                return;
            }

            let mut body = Vec::with_capacity(head.content_length);
            if let Err(e) = inbound
                .read_exact_with(head.content_length as u64, |chunk| body.extend_from_slice(chunk))
                .await
            {
                tracing::warn!(%connection_id, error = %e, "Failed to read submission body");
                return;
            }

            if let Err(e) = inbound.send(SUBMISSION_ACCEPTED).await {
                tracing::debug!(%connection_id, error = %e, "Could not acknowledge submission");
            }

            let prompt = submission_prompt(&head, &body);
            match outcome.try_send(prompt) {
                Ok(()) => tracing::info!(%connection_id, method = %head.method, "Submission received"),
                Err(_) => tracing::warn!(%connection_id, "Ignoring submission after the first"),
            }
        }
    }
}
