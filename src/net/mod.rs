//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Chamber connection (TCP)
//!     → reassembler.rs (buffer partial reads, scan tokens, keep leftovers)
//!     → chamber logic
//!
//! Proxy chamber inbound traffic
//!     → listener.rs (bind free port, accept, fetch slot budget)
//!     → connection.rs (connection IDs, in-flight tracking)
//!     → Hand off to HTTP layer
//! ```
//!
//! # Design Decisions
//! - One `StreamReader` per connection; its buffer dies with the connection
//! - Framing lives here so chambers never slice raw reads themselves

pub mod connection;
pub mod listener;
pub mod reassembler;

#[cfg(test)]
pub(crate) mod testing;

pub use reassembler::{KeyedWords, StreamError, StreamReader};
