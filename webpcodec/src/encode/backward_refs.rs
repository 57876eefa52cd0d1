#![allow(missing_docs)]

//! Turning pixels into a stream of literals, color cache hits, and backward references.

use crate::color_cache::ColorCache;
use crate::context::CodecContext;
use crate::lz77;

use super::entropy::shannon_bits;
use super::hash_chain::{HashChain, Match};
use super::histogram::Histogram;

/// One coded element of an entropy-coded image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixOrCopy {
    /// A pixel coded by its four channels.
    Literal(u32),
    /// A pixel coded by its index in the color cache.
    CacheIndex(u16),
    /// A copy of `len` earlier pixels, located by the plane code `distance_code`.
    Copy { len: u32, distance_code: u32 },
}

/// Matches shorter than this are never used.
pub const MIN_LENGTH: u32 = 4;

/// The largest color cache the encoder considers.
pub const MAX_COLOR_CACHE_BITS: u8 = 10;

/// The approximate cost in bits of the prefix codes of a length and a distance.
const COPY_PREFIX_BITS: f64 = 8.0;

//
// public functions
//

/// Code `pixels` as literals and backward references, without a color cache.
pub fn compute(context: &CodecContext, pixels: &[u32], width: u32, quality: u8) -> Vec<PixOrCopy> {
    let chain = HashChain::new(pixels, width, quality);
    let literal_bits = literal_bits_per_pixel(context, pixels);

    let mut refs = Vec::with_capacity(pixels.len() / 2);
    let mut pos = 0;
    while pos < pixels.len() {
        let Match { distance, len } = chain.best_match(pos);
        if len >= MIN_LENGTH {
            let distance_code = context.distance_to_plane_code(width, distance);
            let copy_bits = COPY_PREFIX_BITS
                + f64::from(lz77::prefix_encode(len).extra_bits)
                + f64::from(lz77::prefix_encode(distance_code).extra_bits);
            if copy_bits < literal_bits * f64::from(len) {
                refs.push(PixOrCopy::Copy { len, distance_code });
                pos += len as usize;
                continue;
            }
        }
        refs.push(PixOrCopy::Literal(pixels[pos]));
        pos += 1;
    }
    refs
}

/// Recode the literals of `refs` which hit a color cache of `bits` bits as cache indices.
pub fn with_color_cache(refs: &[PixOrCopy], pixels: &[u32], bits: u8) -> Vec<PixOrCopy> {
    if bits == 0 {
        return refs.to_vec();
    }
    let mut cache = ColorCache::new(bits);
    let mut pos = 0;
    refs.iter()
        .map(|&token| match token {
            PixOrCopy::Literal(argb) => {
                pos += 1;
                match cache.lookup(argb) {
                    Some(index) => PixOrCopy::CacheIndex(index as u16),
                    None => {
                        cache.insert(argb);
                        token
                    }
                }
            }
            PixOrCopy::CacheIndex(_) => {
                pos += 1;
                token
            }
            PixOrCopy::Copy { len, .. } => {
                for &argb in &pixels[pos..pos + len as usize] {
                    cache.insert(argb);
                }
                pos += len as usize;
                token
            }
        })
        .collect()
}

/// Choose the color cache size, up to `max_bits` bits, giving the smallest estimated coded size of `refs`.
pub fn choose_color_cache_bits(context: &CodecContext, refs: &[PixOrCopy], pixels: &[u32], max_bits: u8) -> u8 {
    let mut best_bits = 0;
    let mut best_cost = Histogram::from_refs(refs, 0).estimate_bits(context);
    for bits in 1..=max_bits.min(MAX_COLOR_CACHE_BITS) {
        let cached = with_color_cache(refs, pixels, bits);
        let cost = Histogram::from_refs(&cached, bits).estimate_bits(context);
        if cost < best_cost {
            best_bits = bits;
            best_cost = cost;
        }
    }
    log::debug!("color cache bits: {best_bits}, estimated {best_cost:.0} bits");
    best_bits
}

/// The average number of bits needed to code a pixel as a literal.
fn literal_bits_per_pixel(context: &CodecContext, pixels: &[u32]) -> f64 {
    if pixels.is_empty() {
        return 0.0;
    }
    let mut histogram = Histogram::new(0);
    for &argb in pixels {
        histogram.add(PixOrCopy::Literal(argb));
    }
    let bits: f64 = [&histogram.green, &histogram.red, &histogram.blue, &histogram.alpha]
        .into_iter()
        .map(|counts| shannon_bits(context, counts))
        .sum();
    bits / pixels.len() as f64
}
