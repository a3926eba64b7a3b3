//! RFC 1071 Internet checksum.
//!
//! The buffer is summed as native-order 16-bit words with end-around carry,
//! complemented, and byte-swapped on little-endian hosts so the returned
//! value can be written big-endian onto the wire.

/// Compute the 16-bit ones'-complement checksum of `bytes`.
///
/// An odd trailing byte is summed as if a zero byte followed it.
pub fn checksum(bytes: &[u8]) -> u16 {
    let mut words = bytes.chunks_exact(2);
    let mut sum: u32 = words
        .by_ref()
        .map(|pair| u16::from_ne_bytes([pair[0], pair[1]]) as u32)
        .fold(0u32, |acc, word| fold_carry(acc + word));

    if let [last] = words.remainder() {
        sum = fold_carry(sum + u16::from_ne_bytes([*last, 0]) as u32);
    }

    let folded = !(fold_carry(sum) as u16);

    if cfg!(target_endian = "little") {
        folded.swap_bytes()
    } else {
        folded
    }
}

/// Add the carry bits above bit 15 back into the low word until none remain.
fn fold_carry(mut sum: u32) -> u32 {
    while sum > 0xFFFF {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }
    sum
}
