//! TCP listener for the proxy chamber.
//!
//! # Responsibilities
//! - Bind to the configured address (port 0 picks a free port)
//! - Provide a non-blocking slot budget for bounded per-connection work
//! - Report the bound port so it can be announced to the chamber

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Why the proxy could not take connections.
#[derive(Debug)]
pub enum ListenerError {
    /// The configured address could not be bound.
    Bind {
        address: String,
        source: std::io::Error,
    },
    /// The listening socket failed while waiting for a connection.
    Accept(std::io::Error),
}

impl std::fmt::Display for ListenerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListenerError::Bind { address, source } => {
                write!(f, "cannot listen on {}: {}", address, source)
            }
            ListenerError::Accept(e) => write!(f, "accept failed: {}", e),
        }
    }
}

impl std::error::Error for ListenerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ListenerError::Bind { source, .. } => Some(source),
            ListenerError::Accept(e) => Some(e),
        }
    }
}

/// The proxy's listening socket.
///
/// `accept` never waits on in-flight handlers; work that must be bounded
/// takes a slot from a [`ConnectionLimit`] after the connection is accepted.
pub struct Listener {
    inner: TcpListener,
    local_addr: SocketAddr,
}

impl Listener {
    /// Bind to `address` (`host:port`).
    pub async fn bind(address: &str) -> Result<Self, ListenerError> {
        let bind_error = |source| ListenerError::Bind {
            address: address.to_string(),
            source,
        };
        let inner = TcpListener::bind(address).await.map_err(bind_error)?;
        let local_addr = inner.local_addr().map_err(bind_error)?;

        tracing::info!(address = %local_addr, "Listener bound");

        Ok(Self { inner, local_addr })
    }

    /// Accept the next connection. Cancel-safe.
    pub async fn accept(&self) -> Result<(TcpStream, SocketAddr), ListenerError> {
        let (stream, addr) = self.inner.accept().await.map_err(ListenerError::Accept)?;
        tracing::debug!(peer_addr = %addr, "Connection accepted");
        Ok((stream, addr))
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

/// Shared budget of slots for bounded per-connection work.
///
/// Acquisition never waits: a caller that finds the budget exhausted is
/// expected to refuse the work.
#[derive(Debug, Clone)]
pub struct ConnectionLimit {
    slots: Arc<Semaphore>,
}

impl ConnectionLimit {
    pub fn new(max: usize) -> Self {
        Self {
            slots: Arc::new(Semaphore::new(max.max(1))),
        }
    }

    /// Take a slot if one is free.
    pub fn try_acquire(&self) -> Option<ConnectionPermit> {
        Arc::clone(&self.slots)
            .try_acquire_owned()
            .ok()
            .map(|permit| ConnectionPermit { _permit: permit })
    }

    /// Currently free slots.
    pub fn available(&self) -> usize {
        self.slots.available_permits()
    }
}

/// A slot taken from a [`ConnectionLimit`], released on drop.
#[derive(Debug)]
pub struct ConnectionPermit {
    _permit: OwnedSemaphorePermit,
}
