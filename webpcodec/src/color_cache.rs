//! The VP8L color cache.
//!
//! A small hash table of recently coded colors. Both the decoder and the encoder insert every pixel they emit, so
//! that a color can later be coded as its index into the cache.

/// A color cache of `1 << bits` entries.
#[derive(Clone, Debug)]
pub struct ColorCache {
    colors: Box<[u32]>,
    bits: u8,
}

const HASH_MULTIPLIER: u32 = 0x1e35a7bd;

//
// ColorCache impls
//

impl ColorCache {
    /// The largest number of index bits allowed for a color cache.
    pub const MAX_BITS: u8 = 11;

    /// Construct an empty color cache with `1 << bits` entries, where `bits` is in `1..=MAX_BITS`.
    pub fn new(bits: u8) -> Self {
        assert!((1..=Self::MAX_BITS).contains(&bits), "invalid color cache bits {bits}");
        Self { colors: vec![0; 1 << bits].into_boxed_slice(), bits }
    }

    pub fn bits(&self) -> u8 {
        self.bits
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn insert(&mut self, argb: u32) {
        let index = self.hash(argb);
        self.colors[index] = argb;
    }

    /// The color at `index`, or `None` if `index` is out of bounds.
    pub fn get(&self, index: usize) -> Option<u32> {
        self.colors.get(index).copied()
    }

    /// The index of `argb`, if it is currently cached.
    pub fn lookup(&self, argb: u32) -> Option<usize> {
        let index = self.hash(argb);
        (self.colors[index] == argb).then_some(index)
    }

    fn hash(&self, argb: u32) -> usize {
        (HASH_MULTIPLIER.wrapping_mul(argb) >> (32 - u32::from(self.bits))) as usize
    }
}
