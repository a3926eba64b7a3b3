//! Chamber prompts and the identifiers threaded between chambers.
//!
//! Every prompt carries one line of the form `identifier:<value>`; the value
//! (trimmed) is the only input the next chamber needs.

use std::fmt;

use bytes::Bytes;
use thiserror::Error;

/// Literal that starts the identifier line of a prompt.
pub const MARKER: &[u8] = b"identifier:";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PromptError {
    #[error("malformed prompt: no line starts with \"identifier:\"")]
    MissingIdentifier,
}

/// Opaque, non-empty token produced by one chamber and consumed by the next.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier(Bytes);

impl Identifier {
    /// Wrap an identifier supplied from outside a prompt (e.g. on resume).
    /// Returns `None` if the value is empty after trimming.
    pub fn new(value: impl AsRef<[u8]>) -> Option<Self> {
        let trimmed = value.as_ref().trim_ascii();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(Bytes::copy_from_slice(trimmed)))
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// ASCII upper-cased copy of the identifier bytes.
    pub fn to_ascii_uppercase(&self) -> Vec<u8> {
        self.0.to_ascii_uppercase()
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

/// Raw bytes a chamber returned on completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChamberPrompt(Bytes);

impl ChamberPrompt {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume the prompt, yielding the identifier for the next chamber.
    pub fn into_identifier(self) -> Result<Identifier, PromptError> {
        extract_identifier(&self.0)
    }
}

impl fmt::Display for ChamberPrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

/// Find the first line starting with `identifier:` and return the rest of
/// that line, trimmed.
pub fn extract_identifier(text: &[u8]) -> Result<Identifier, PromptError> {
    text.split(|&b| b == b'\n')
        .find_map(|line| line.strip_prefix(MARKER))
        .and_then(|value| Identifier::new(value))
        .ok_or(PromptError::MissingIdentifier)
}
