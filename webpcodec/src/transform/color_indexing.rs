//! The color indexing (palette) transform.
//!
//! Images with at most 256 colors are coded as indices into a palette, stored in the green channel. Palettes of at
//! most 16 colors bundle several indices into each coded pixel, shrinking the coded image's width.

use derive_more::Display;
use webpcodec_common::{bail_attach, Result};

use super::{green, subsample_size};
use crate::CodecError;

/// A sorted set of at most [`Palette::MAX_LEN`] distinct colors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<u32>,
}

#[derive(Clone, Copy, Debug, Display)]
#[display(fmt = "palette index `{}` at pixel `{}` >= palette size `{}`", _0, _1, _2)]
struct PaletteIndexOutOfBounds(u8, usize, usize);

//
// Palette impls
//

impl Palette {
    /// The largest palette the color indexing transform can code.
    pub const MAX_LEN: usize = 256;

    /// Collect the distinct colors of `pixels`, or `None` if there are more than [`Self::MAX_LEN`].
    pub fn from_pixels(pixels: &[u32]) -> Option<Self> {
        let mut colors = Vec::with_capacity(Self::MAX_LEN + 1);
        let mut last_pixel = None;
        for &pixel in pixels {
            if last_pixel == Some(pixel) {
                continue;
            }
            last_pixel = Some(pixel);
            if let Err(insert_idx) = colors.binary_search(&pixel) {
                if colors.len() == Self::MAX_LEN {
                    return None;
                }
                colors.insert(insert_idx, pixel);
            }
        }
        Some(Self { colors })
    }

    /// The colors of this palette, in ascending order.
    pub fn colors(&self) -> &[u32] {
        &self.colors
    }

    /// The number of colors in this palette.
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Whether this palette has no colors, which is only the case for an empty image.
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// The base 2 logarithm of the number of indices bundled into each coded pixel.
    pub fn bundle_bits(&self) -> u8 {
        bundle_bits(self.colors.len())
    }

    /// Replace every pixel with its index into this palette, bundling indices as determined by
    /// [`bundle_bits`](Self::bundle_bits). Returns the coded image, of width [`packed_width`].
    ///
    /// # Panics
    ///
    /// Panics if a pixel's color is not in the palette.
    pub fn apply(&self, pixels: &[u32], width: u32) -> Vec<u32> {
        let bundle_bits = self.bundle_bits();
        let bits_per_index = 8 >> bundle_bits;
        let packed_width = packed_width(width, bundle_bits) as usize;
        let mut packed = Vec::with_capacity(packed_width * pixels.len() / width as usize);
        for row in pixels.chunks(width as usize) {
            for bundle in row.chunks(1 << bundle_bits) {
                let mut code = 0u32;
                for (position, &pixel) in bundle.iter().enumerate() {
                    let index = self
                        .colors
                        .binary_search(&pixel)
                        .unwrap_or_else(|_| panic!("color 0x{pixel:08x} is not in the palette"));
                    code |= (index as u32) << (position * bits_per_index);
                }
                packed.push(0xff000000 | code << 8);
            }
        }
        packed
    }

    /// The palette delta-coded as a `len × 1` sub-image, each color stored as its difference from the previous one.
    pub fn to_delta_coded(&self) -> Vec<u32> {
        let mut previous = 0;
        self.colors
            .iter()
            .map(|&color| {
                let delta = super::sub_pixels(color, previous);
                previous = color;
                delta
            })
            .collect()
    }
}

/// The base 2 logarithm of the number of indices bundled into each coded pixel, for a palette of `len` colors.
pub fn bundle_bits(len: usize) -> u8 {
    match len {
        0..=2 => 3,
        3..=4 => 2,
        5..=16 => 1,
        _ => 0,
    }
}

/// The width of an image of `width` pixels after bundling `1 << bundle_bits` indices per pixel.
pub fn packed_width(width: u32, bundle_bits: u8) -> u32 {
    subsample_size(width, bundle_bits)
}

/// Undo [`Palette::to_delta_coded`] in place.
pub fn delta_decode(palette: &mut [u32]) {
    for index in 1..palette.len() {
        palette[index] = super::add_pixels(palette[index], palette[index - 1]);
    }
}

/// Expand a coded image of palette indices, of width [`packed_width`], into a `width` × `height` image.
///
/// Fails with [`CodecError::TransformDecode`] if an index is outside of `palette`.
pub fn inverse(packed: &[u32], width: u32, height: u32, palette: &[u32]) -> Result<Vec<u32>, CodecError> {
    let bundle_bits = bundle_bits(palette.len());
    let bits_per_index = 8 >> bundle_bits;
    let index_mask = (1u32 << bits_per_index) - 1;
    let packed_width = packed_width(width, bundle_bits) as usize;

    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for packed_row in packed.chunks(packed_width).take(height as usize) {
        for x in 0..width as usize {
            let code = u32::from(green(packed_row[x >> bundle_bits]));
            let position = x & ((1 << bundle_bits) - 1);
            let index = ((code >> (position * bits_per_index)) & index_mask) as u8;
            match palette.get(usize::from(index)) {
                Some(&color) => pixels.push(color),
                None => bail_attach!(
                    CodecError::TransformDecode,
                    PaletteIndexOutOfBounds(index, pixels.len(), palette.len()),
                ),
            }
        }
    }
    Ok(pixels)
}
