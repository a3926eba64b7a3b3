//! YAP: fixed 10-byte header followed by a base64 payload.
//!
//! # Wire Format
//!
//! ```text
//! +-------------------+
//! | magic (3 bytes)   |  "YAP"
//! +-------------------+
//! | type (2)          |  u16, 0 = request, 1 = response
//! +-------------------+
//! | code (1)          |  u8, 0 = success
//! +-------------------+
//! | checksum (2)      |  u16 Internet checksum of header + payload
//! +-------------------+
//! | sequence (2)      |  u16
//! +-------------------+
//! | payload           |  base64 text, variable length
//! +-------------------+
//! ```
//!
//! All integers are big-endian. The checksum is computed over the whole
//! message with the checksum field zeroed.

use base64::prelude::*;

use super::checksum::checksum;
use super::CodecError;

/// Magic tag leading every YAP message.
pub const MAGIC: [u8; 3] = *b"YAP";

/// Size of the fixed header in bytes.
pub const HEADER_SIZE: usize = 10;

/// Message type of a request.
pub const TYPE_REQUEST: u16 = 0;

/// Message type of a response.
pub const TYPE_RESPONSE: u16 = 1;

/// Byte range of the checksum field inside the header.
const CHECKSUM_RANGE: std::ops::Range<usize> = 6..8;

/// The fixed YAP header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireHeader {
    pub magic: [u8; 3],
    pub kind: u16,
    pub code: u8,
    pub checksum: u16,
    pub sequence: u16,
}

impl WireHeader {
    /// Header for a message of the given type with a zero checksum.
    pub fn new(kind: u16, code: u8, sequence: u16) -> Self {
        Self {
            magic: MAGIC,
            kind,
            code,
            checksum: 0,
            sequence,
        }
    }

    /// Serialize into the 10-byte big-endian layout.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        out[0..3].copy_from_slice(&self.magic);
        out[3..5].copy_from_slice(&self.kind.to_be_bytes());
        out[5] = self.code;
        out[CHECKSUM_RANGE].copy_from_slice(&self.checksum.to_be_bytes());
        out[8..10].copy_from_slice(&self.sequence.to_be_bytes());
        out
    }

    /// Parse the first 10 bytes of `bytes`.
    pub fn parse(bytes: &[u8]) -> Result<Self, CodecError> {
        if bytes.len() < HEADER_SIZE {
            return Err(CodecError::TooShort {
                required: HEADER_SIZE,
                actual: bytes.len(),
            });
        }

        Ok(Self {
            magic: [bytes[0], bytes[1], bytes[2]],
            kind: u16::from_be_bytes([bytes[3], bytes[4]]),
            code: bytes[5],
            checksum: u16::from_be_bytes([bytes[6], bytes[7]]),
            sequence: u16::from_be_bytes([bytes[8], bytes[9]]),
        })
    }
}

/// Build a request message (type 0, code 0, sequence 1) carrying `payload`.
pub fn encode(payload: &[u8]) -> Vec<u8> {
    encode_message(WireHeader::new(TYPE_REQUEST, 0, 1), payload)
}

/// Build a message with an arbitrary header. The header's checksum field is
/// ignored and replaced by the computed one.
pub fn encode_message(header: WireHeader, payload: &[u8]) -> Vec<u8> {
    let encoded = BASE64_STANDARD.encode(payload);

    let mut message = Vec::with_capacity(HEADER_SIZE + encoded.len());
    message.extend_from_slice(&WireHeader { checksum: 0, ..header }.to_bytes());
    message.extend_from_slice(encoded.as_bytes());

    let sum = checksum(&message);
    message[CHECKSUM_RANGE].copy_from_slice(&sum.to_be_bytes());
    message
}

/// Validate a response message and return its decoded payload.
///
/// # Errors
/// - `CodecError::TooShort` if the message is shorter than a header
/// - `CodecError::UnexpectedMessage` unless type is response and code is 0
/// - `CodecError::ChecksumMismatch` if the recomputed checksum disagrees
/// - `CodecError::Base64` if the payload is not valid base64
pub fn decode(message: &[u8]) -> Result<Vec<u8>, CodecError> {
    let header = WireHeader::parse(message)?;

    tracing::debug!(
        kind = header.kind,
        code = header.code,
        sequence = header.sequence,
        "YAP header received"
    );

    if header.kind != TYPE_RESPONSE || header.code != 0 {
        return Err(CodecError::UnexpectedMessage {
            kind: header.kind,
            code: header.code,
        });
    }

    let mut zeroed = message.to_vec();
    zeroed[CHECKSUM_RANGE].fill(0);
    let computed = checksum(&zeroed);
    if computed != header.checksum {
        return Err(CodecError::ChecksumMismatch {
            expected: header.checksum,
            actual: computed,
        });
    }

    Ok(BASE64_STANDARD.decode(&message[HEADER_SIZE..])?)
}
