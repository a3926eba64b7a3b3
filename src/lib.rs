//! Chamber walker library.
//!
//! A client that walks a fixed sequence of network chambers. Each chamber
//! speaks its own protocol and answers with a prompt whose `identifier:` line
//! unlocks the next one.

// Protocol building blocks
pub mod codec;
pub mod net;
pub mod prompt;

// Chambers and orchestration
pub mod chambers;
pub mod http;
pub mod walker;

// Cross-cutting concerns
pub mod config;
pub mod observability;

pub use chambers::{Chamber, ChamberError};
pub use config::WalkerConfig;
pub use prompt::{ChamberPrompt, Identifier};
pub use walker::{WalkError, WalkReport, Walker};
