//! The process-wide codec context.

use std::sync::OnceLock;

use crate::image::Image;
use crate::lz77::{DISTANCE_MAP, NUM_PLANE_CODES};
use crate::{Config, Error};

/// Precomputed tables shared by every encode and decode call.
///
/// A context is immutable once built. [`CodecContext::get`] returns a lazily-initialized process-wide instance, which
/// is what [`decode`](crate::decode) and [`encode`](crate::encode) use; a context may also be constructed and owned
/// explicitly with [`CodecContext::new`].
#[derive(Clone, Debug)]
pub struct CodecContext {
    plane_codes: [u8; PLANE_CODE_LUT_LEN],
    n_log2_n: Box<[f64]>,
}

//
// private types
//

/// The 2-D offsets of the distance map as a `16 × 8` grid indexed by `dy * 16 + 8 - dx`.
const PLANE_CODE_LUT_LEN: usize = 16 * 8;

const NO_PLANE_CODE: u8 = u8::MAX;

const N_LOG2_N_TABLE_LEN: usize = 4096;

static CONTEXT: OnceLock<CodecContext> = OnceLock::new();

//
// CodecContext impls
//

impl CodecContext {
    /// Build a new context.
    pub fn new() -> Self {
        let mut plane_codes = [NO_PLANE_CODE; PLANE_CODE_LUT_LEN];
        for (index, &(dx, dy)) in DISTANCE_MAP.iter().enumerate() {
            plane_codes[usize::from(dy) * 16 + (8 - isize::from(dx)) as usize] = index as u8;
        }

        let n_log2_n = (0..N_LOG2_N_TABLE_LEN)
            .map(|n| match n {
                0 => 0.0,
                _ => n as f64 * (n as f64).log2(),
            })
            .collect();

        Self { plane_codes, n_log2_n }
    }

    /// The process-wide context, built on first use.
    ///
    /// Concurrent first uses block until a single initialization completes.
    pub fn get() -> &'static Self {
        CONTEXT.get_or_init(|| {
            log::debug!("initializing codec context");
            Self::new()
        })
    }

    /// Decode a WebP image.
    ///
    /// Decoding needs none of the context's tables, so this is the same as [`decode`](crate::decode).
    pub fn decode(&self, input: &[u8]) -> Result<Image, Error> {
        crate::decode(input)
    }

    /// Encode a lossless WebP image using this context.
    ///
    /// See [`encode`](crate::encode).
    pub fn encode(&self, image: &Image, config: &Config) -> Result<Vec<u8>, Error> {
        crate::encode_with_context(self, image, config)
    }

    /// The distance code of a backward reference `distance` pixels back in an image of width `width`.
    ///
    /// Short distances to nearby pixels map to one of the `1..=120` plane codes; others are offset past them.
    pub(crate) fn distance_to_plane_code(&self, width: u32, distance: u32) -> u32 {
        let (width, distance) = (i64::from(width), i64::from(distance));
        let y_offset = distance / width;
        let x_offset = distance - y_offset * width;
        let lut_index = if x_offset <= 8 && y_offset < 8 {
            Some(y_offset * 16 + 8 - x_offset)
        } else if x_offset > width - 8 && y_offset < 7 {
            Some((y_offset + 1) * 16 + 8 + (width - x_offset))
        } else {
            None
        };
        match lut_index.and_then(|index| self.plane_codes.get(index as usize)) {
            Some(&code) if code != NO_PLANE_CODE => u32::from(code) + 1,
            _ => distance as u32 + NUM_PLANE_CODES,
        }
    }

    /// `n * log2(n)`, with `0 * log2(0)` defined as zero.
    pub(crate) fn n_log2_n(&self, n: u32) -> f64 {
        match self.n_log2_n.get(n as usize) {
            Some(&value) => value,
            None => f64::from(n) * f64::from(n).log2(),
        }
    }
}

impl Default for CodecContext {
    fn default() -> Self {
        Self::new()
    }
}
