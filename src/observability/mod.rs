//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields (chamber, identifier, peer_addr)
//!
//! Consumers:
//!     → logging.rs (fmt layer on stderr, filtered by EnvFilter)
//! ```

pub mod logging;
