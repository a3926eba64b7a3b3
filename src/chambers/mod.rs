//! The eight chambers of a walk.
//!
//! # Data Flow
//! ```text
//! Identifier (or username for chamber 0)
//!     → chamber module (open transport, chamber-specific exchange)
//!     → net::StreamReader / codec (framing, checksums, ciphers)
//!     → ChamberPrompt returned to the walker
//! ```
//!
//! # Design Decisions
//! - Every chamber opens its own transport and drops it on return
//! - Chambers never extract identifiers; the walker does that
//! - Only chamber 6 spawns tasks

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio::net::{TcpStream, UdpSocket};

use crate::codec::CodecError;
use crate::config::TransportConfig;
use crate::net::listener::ListenerError;
use crate::net::{StreamError, StreamReader};
use crate::prompt::PromptError;

pub mod file_digest;
pub mod finale;
pub mod handshake;
pub mod http_proxy;
pub mod udp_callback;
pub mod word_lengths;
pub mod word_puzzle;
pub mod yap;

/// Position of a chamber in the walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Chamber {
    Handshake,
    UdpCallback,
    WordLengths,
    WordPuzzle,
    FileDigest,
    Yap,
    HttpProxy,
    Finale,
}

impl Chamber {
    /// All chambers in walking order.
    pub const SEQUENCE: [Chamber; 8] = [
        Chamber::Handshake,
        Chamber::UdpCallback,
        Chamber::WordLengths,
        Chamber::WordPuzzle,
        Chamber::FileDigest,
        Chamber::Yap,
        Chamber::HttpProxy,
        Chamber::Finale,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::SEQUENCE.get(index).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            Chamber::Handshake => "handshake",
            Chamber::UdpCallback => "udp_callback",
            Chamber::WordLengths => "word_lengths",
            Chamber::WordPuzzle => "word_puzzle",
            Chamber::FileDigest => "file_digest",
            Chamber::Yap => "yap",
            Chamber::HttpProxy => "http_proxy",
            Chamber::Finale => "finale",
        }
    }

    /// True for the last chamber, whose message is not a prompt.
    pub fn is_final(self) -> bool {
        self == Chamber::Finale
    }
}

impl fmt::Display for Chamber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.index(), self.name())
    }
}

/// Errors that abort a single chamber.
#[derive(Debug, Error)]
pub enum ChamberError {
    /// Connect, bind, send or receive failed.
    #[error("transport failure: {0}")]
    Transport(#[from] std::io::Error),

    /// Stream framing failed or the peer closed early.
    #[error(transparent)]
    Stream(#[from] StreamError),

    /// YAP reply rejected.
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Prompt(#[from] PromptError),

    /// No UDP reply within the configured timeout.
    #[error("no reply within {0:?}")]
    Timeout(Duration),

    /// The proxy listener could not be bound or stopped accepting.
    #[error(transparent)]
    Listener(#[from] ListenerError),
}

pub type ChamberResult<T> = Result<T, ChamberError>;

/// Open a TCP connection to a chamber and wrap it for reassembly.
pub(crate) async fn connect(
    address: &str,
    transport: &TransportConfig,
) -> ChamberResult<StreamReader<TcpStream>> {
    let stream = TcpStream::connect(address).await?;
    tracing::debug!(
        address,
        local_addr = ?stream.local_addr().ok(),
        "Connected to chamber"
    );
    Ok(StreamReader::with_chunk_size(stream, transport.read_chunk_size))
}

/// Receive one datagram, honouring the optional reply timeout.
pub(crate) async fn recv_datagram(
    socket: &UdpSocket,
    transport: &TransportConfig,
) -> ChamberResult<(Vec<u8>, std::net::SocketAddr)> {
    let mut buf = vec![0u8; transport.datagram_size];
    let received = match transport.udp_reply_timeout_secs {
        Some(secs) => {
            let limit = Duration::from_secs(secs);
            tokio::time::timeout(limit, socket.recv_from(&mut buf))
                .await
                .map_err(|_| ChamberError::Timeout(limit))??
        }
        None => socket.recv_from(&mut buf).await?,
    };

    let (len, from) = received;
    buf.truncate(len);
    tracing::debug!(bytes = len, %from, "Datagram received");
    Ok((buf, from))
}
