//! HTTP handling for the proxy chamber.
//!
//! # Data Flow
//! ```text
//! Inbound TCP connection
//!     → server.rs (accept, spawn a handler per connection)
//!     → request.rs (parse head, classify fetch vs submission)
//!     → forward.rs (fetch: relay upstream response byte for byte)
//!     → server.rs (submission: acknowledge, fill the outcome slot)
//! ```
//!
//! # Design Decisions
//! - Only the request line and Content-Length are interpreted; upstream
//!   responses are relayed without parsing
//! - The first submission ends the chamber; everything else is best effort

pub mod forward;
pub mod request;
pub mod server;

pub use request::{RequestError, RequestHead, RequestKind};
pub use server::ProxyServer;
