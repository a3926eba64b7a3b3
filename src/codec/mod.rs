//! Byte-level codecs used by the chambers.
//!
//! # Data Flow
//! ```text
//! identifier
//!     → yap.rs (header + base64 payload)
//!     → checksum.rs (Internet checksum over header ‖ payload)
//!     → datagram
//!
//! ciphertext words + key
//!     → cipher.rs (cyclic letter shift)
//!     → plaintext
//! ```
//!
//! # Design Decisions
//! - All codecs are pure functions over byte slices; I/O lives in `net`
//! - Validation failures are typed (`CodecError`) so the walker can report them

pub mod checksum;
pub mod cipher;
pub mod yap;

pub use checksum::checksum;
pub use cipher::decipher;

use thiserror::Error;

/// Errors raised while decoding a YAP message.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("message too short: need {required} bytes, got {actual}")]
    TooShort { required: usize, actual: usize },

    #[error("unexpected YAP message: type {kind}, code {code}")]
    UnexpectedMessage { kind: u16, code: u8 },

    #[error("checksum mismatch: header says {expected:#06x}, computed {actual:#06x}")]
    ChecksumMismatch { expected: u16, actual: u16 },

    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
}
