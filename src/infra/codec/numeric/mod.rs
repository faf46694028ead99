//! Fixed-width integer conversion used by every multi-byte field on the bus.
//!
//! ISO 11783 transmits numeric fields little-endian; the big-endian variants
//! exist for completeness (NAME dumps, diagnostics tooling).
//!
//! No range checking is performed: a value wider than the destination is
//! truncated to its lower `8 * n` bits.

/// Write `value` into `out` in little-endian order, `out.len()` bytes.
#[inline]
pub fn to_le(value: u64, out: &mut [u8]) {
    for (index, byte) in out.iter_mut().enumerate() {
        *byte = shifted_byte(value, index);
    }
}

/// Write `value` into `out` in big-endian order, `out.len()` bytes.
#[inline]
pub fn to_be(value: u64, out: &mut [u8]) {
    let width = out.len();
    for (index, byte) in out.iter_mut().enumerate() {
        *byte = shifted_byte(value, width - 1 - index);
    }
}

/// Array flavour of [`to_le`].
#[inline]
pub fn to_le_array<const N: usize>(value: u64) -> [u8; N] {
    let mut out = [0u8; N];
    to_le(value, &mut out);
    out
}

/// Array flavour of [`to_be`].
#[inline]
pub fn to_be_array<const N: usize>(value: u64) -> [u8; N] {
    let mut out = [0u8; N];
    to_be(value, &mut out);
    out
}

/// Rebuild an integer from little-endian bytes. Any length is accepted;
/// bytes past the eighth do not fit in a `u64` and are ignored.
#[inline]
pub fn from_le(bytes: &[u8]) -> u64 {
    bytes.iter().enumerate().fold(0u64, |acc, (index, &byte)| {
        acc | (byte as u64).checked_shl(8 * index as u32).unwrap_or(0)
    })
}

/// Rebuild an integer from big-endian bytes. Only the last eight bytes survive.
#[inline]
pub fn from_be(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .fold(0u64, |acc, &byte| (acc << 8) | byte as u64)
}

/// Read a little-endian `u16` at `offset` (two bytes).
#[inline]
pub fn le_u16(bytes: &[u8], offset: usize) -> u16 {
    from_le(&bytes[offset..offset + 2]) as u16
}

/// Read a little-endian 24-bit value at `offset` (three bytes).
#[inline]
pub fn le_u24(bytes: &[u8], offset: usize) -> u32 {
    from_le(&bytes[offset..offset + 3]) as u32
}

// Byte `index` of `value` counting from the least significant one.
#[inline]
fn shifted_byte(value: u64, index: usize) -> u8 {
    value.checked_shr(8 * index as u32).unwrap_or(0) as u8
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
