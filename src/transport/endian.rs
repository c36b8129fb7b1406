//! Byte-order normalization between host and wire representation.
//!
//! The wire format is little-endian and the conversion operates on 32-bit
//! words: any trailing bytes that do not form a complete word are left
//! unconverted. This mirrors the wire format itself, which aligns every
//! header to a 4-byte multiple.

/// Reverse the byte order of every complete 32-bit word in `buf`.
///
/// Applying this twice restores the original bytes.
pub fn swap_words(buf: &mut [u8]) {
    for word in buf.chunks_exact_mut(4) {
        word.swap(0, 3);
        word.swap(1, 2);
    }
}

/// Convert a host-order buffer to wire (little-endian) order in place.
/// A no-op on little-endian hosts.
pub fn to_wire(buf: &mut [u8]) {
    if cfg!(target_endian = "big") {
        swap_words(buf);
    }
}

/// Convert a wire-order buffer to host order in place.
///
/// The conversion is its own inverse, so this is the same word swap as
/// [`to_wire`]; the separate name keeps call sites honest about direction.
pub fn from_wire(buf: &mut [u8]) {
    to_wire(buf);
}
