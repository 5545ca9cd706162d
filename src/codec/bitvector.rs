//! Delta-header bitvector with little-endian bit order within each byte.

/// The bitvector that leads every delta packet body.
///
/// Bit `i` lives at `byte[i / 8] & (1 << (i % 8))`: bit 0 is the least
/// significant bit of the first byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitvector {
    bytes: Vec<u8>,
}

impl Bitvector {
    /// Wrap raw bitvector bytes read off the wire.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// An all-zero bitvector sized for `bit_count` bits.
    pub fn with_bit_count(bit_count: usize) -> Self {
        Self { bytes: vec![0; bit_count.div_ceil(8)] }
    }

    /// Test bit `i`. Bits beyond the byte length read as clear.
    pub fn bit(&self, i: usize) -> bool {
        self.bytes.get(i / 8).is_some_and(|byte| byte & (1 << (i % 8)) != 0)
    }

    /// Set bit `i`. Out-of-range indices are ignored.
    pub fn set_bit(&mut self, i: usize) {
        if let Some(byte) = self.bytes.get_mut(i / 8) {
            *byte |= 1 << (i % 8);
        }
    }

    /// The wire representation.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}
