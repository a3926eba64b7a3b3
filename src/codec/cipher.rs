//! Cyclic substitution decipher.

/// Shift every ASCII letter in `bytes` forward by `shift` positions, wrapping
/// within its own case. Every other byte is copied through unchanged.
pub fn decipher(bytes: &[u8], shift: u32) -> Vec<u8> {
    let shift = (shift % 26) as u8;
    bytes.iter().map(|&b| shift_byte(b, shift)).collect()
}

fn shift_byte(b: u8, shift: u8) -> u8 {
    match b {
        b'a'..=b'z' => b'a' + (b - b'a' + shift) % 26,
        b'A'..=b'Z' => b'A' + (b - b'A' + shift) % 26,
        _ => b,
    }
}
