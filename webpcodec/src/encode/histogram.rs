#![allow(missing_docs)]

use crate::context::CodecContext;
use crate::lz77::{self, NUM_DISTANCE_CODES, NUM_LENGTH_CODES};
use crate::parse::lossless::NUM_LITERAL_CODES;
use crate::transform::{alpha, blue, green, red};

use super::backward_refs::PixOrCopy;
use super::entropy::prefix_coded_bits;

/// Symbol counts for the five prefix codes of one prefix code group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Histogram {
    /// Green literals, then length prefix codes, then color cache indices.
    pub green: Vec<u32>,
    pub red: Vec<u32>,
    pub blue: Vec<u32>,
    pub alpha: Vec<u32>,
    pub distance: Vec<u32>,
}

//
// Histogram impls
//

impl Histogram {
    pub fn new(color_cache_bits: u8) -> Self {
        let color_cache_len = match color_cache_bits {
            0 => 0,
            bits => 1 << bits,
        };
        let literal_len = usize::from(NUM_LITERAL_CODES);
        Self {
            green: vec![0; literal_len + usize::from(NUM_LENGTH_CODES) + color_cache_len],
            red: vec![0; literal_len],
            blue: vec![0; literal_len],
            alpha: vec![0; literal_len],
            distance: vec![0; usize::from(NUM_DISTANCE_CODES)],
        }
    }

    pub fn from_refs(refs: &[PixOrCopy], color_cache_bits: u8) -> Self {
        let mut histogram = Self::new(color_cache_bits);
        for &token in refs {
            histogram.add(token);
        }
        histogram
    }

    pub fn add(&mut self, token: PixOrCopy) {
        match token {
            PixOrCopy::Literal(argb) => {
                self.green[usize::from(green(argb))] += 1;
                self.red[usize::from(red(argb))] += 1;
                self.blue[usize::from(blue(argb))] += 1;
                self.alpha[usize::from(alpha(argb))] += 1;
            }
            PixOrCopy::CacheIndex(index) => {
                self.green[usize::from(NUM_LITERAL_CODES + NUM_LENGTH_CODES + index)] += 1;
            }
            PixOrCopy::Copy { len, distance_code } => {
                let len_code = lz77::prefix_encode(len).code;
                self.green[usize::from(NUM_LITERAL_CODES + len_code)] += 1;
                self.distance[usize::from(lz77::prefix_encode(distance_code).code)] += 1;
            }
        }
    }

    /// Estimate the coded size in bits of the counted symbols, their extra bits, and the prefix codes themselves.
    pub fn estimate_bits(&self, context: &CodecContext) -> f64 {
        let codes_bits: f64 = [&self.green, &self.red, &self.blue, &self.alpha, &self.distance]
            .into_iter()
            .map(|counts| prefix_coded_bits(context, counts))
            .sum();
        let length_counts = &self.green[usize::from(NUM_LITERAL_CODES)..][..usize::from(NUM_LENGTH_CODES)];
        codes_bits + extra_bits(length_counts) + extra_bits(&self.distance)
    }
}

/// The total number of extra bits following the LZ77 prefix codes counted in `counts`.
fn extra_bits(counts: &[u32]) -> f64 {
    counts
        .iter()
        .enumerate()
        .skip(4)
        .map(|(code, &count)| f64::from(count) * ((code as u32 - 2) >> 1) as f64)
        .sum()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn counts_tokens() {
        let refs = [
            PixOrCopy::Literal(0x80102030),
            PixOrCopy::CacheIndex(3),
            PixOrCopy::Copy { len: 5, distance_code: 121 },
        ];
        let histogram = Histogram::from_refs(&refs, 2);
        assert_eq!(histogram.green.len(), 256 + 24 + 4);
        assert_eq!(histogram.green[0x20], 1);
        assert_eq!(histogram.red[0x10], 1);
        assert_eq!(histogram.blue[0x30], 1);
        assert_eq!(histogram.alpha[0x80], 1);
        assert_eq!(histogram.green[256 + 24 + 3], 1);
        assert_eq!(histogram.green[256 + 4], 1);
        // Distance code 121 has prefix code 13.
        assert_eq!(histogram.distance[13], 1);
    }

    #[test]
    fn extra_bits_counted() {
        let context = CodecContext::new();
        let mut short = Histogram::new(0);
        short.add(PixOrCopy::Copy { len: 4, distance_code: 1 });
        let mut long = Histogram::new(0);
        long.add(PixOrCopy::Copy { len: 4000, distance_code: 100_000 });
        assert!(long.estimate_bits(&context) > short.estimate_bits(&context) + 20.0);
    }
}
