//! Walker configuration.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (read file, deserialize with section defaults)
//!     → validation.rs (addresses, sizes, paths; all errors collected)
//!     → WalkerConfig (validated, immutable)
//!     → CLI overrides applied in main.rs
//!     → shared by reference with every chamber
//! ```
//!
//! # Design Decisions
//! - Config is immutable once the walk starts
//! - All fields have defaults so an empty file is a valid config
//! - serde rejects wrong types; validation rejects wrong values

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    EndpointConfig, FileDigestConfig, HashAlgorithm, HttpProxyConfig, IdentityConfig,
    ObservabilityConfig, PuzzleMode, TransportConfig, UdpCallbackConfig, WalkerConfig,
    WordLengthsConfig, WordPuzzleConfig,
};
