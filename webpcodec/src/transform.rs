//! The four reversible VP8L pixel transforms.
//!
//! Pixels are packed `0xAARRGGBB` words. Each transform is a pure function over a row-major pixel buffer: the encoder
//! calls `apply`, the decoder calls `inverse`, and the transforms present in a bitstream are undone in the reverse of
//! the order they were applied.

pub mod color;
pub mod color_indexing;
pub mod predictor;
pub mod subtract_green;

use derive_more::Display;
use num_integer::div_ceil;

pub use color::ColorTransformElement;
pub use color_indexing::Palette;
pub use predictor::PredictorMode;

/// The type of a transform, as coded in the VP8L bitstream.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, PartialOrd, Ord)]
pub enum TransformType {
    #[allow(missing_docs)]
    #[display(fmt = "predictor")]
    Predictor = 0b00,
    #[allow(missing_docs)]
    #[display(fmt = "color")]
    Color = 0b01,
    #[allow(missing_docs)]
    #[display(fmt = "subtract green")]
    SubtractGreen = 0b10,
    #[allow(missing_docs)]
    #[display(fmt = "color indexing")]
    ColorIndexing = 0b11,
}

//
// TransformType impls
//

impl TransformType {
    /// The number of distinct transform types.
    pub const COUNT: usize = 4;

    /// The transform type coded as `bits`, where only the low two bits are considered.
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0b00 => Self::Predictor,
            0b01 => Self::Color,
            0b10 => Self::SubtractGreen,
            _ => Self::ColorIndexing,
        }
    }
}

/// The number of `1 << bits` sized tiles needed to cover `size` pixels.
pub(crate) fn subsample_size(size: u32, bits: u8) -> u32 {
    div_ceil(size, 1 << bits)
}

/// Add two pixels channel-wise, modulo 256.
pub(crate) fn add_pixels(a: u32, b: u32) -> u32 {
    let alpha_green = (a & 0xff00ff00).wrapping_add(b & 0xff00ff00);
    let red_blue = (a & 0x00ff00ff).wrapping_add(b & 0x00ff00ff);
    (alpha_green & 0xff00ff00) | (red_blue & 0x00ff00ff)
}

/// Subtract two pixels channel-wise, modulo 256.
pub(crate) fn sub_pixels(a: u32, b: u32) -> u32 {
    let alpha_green = 0x00ff00ff_u32
        .wrapping_add(a & 0xff00ff00)
        .wrapping_sub(b & 0xff00ff00);
    let red_blue = 0xff00ff00_u32
        .wrapping_add(a & 0x00ff00ff)
        .wrapping_sub(b & 0x00ff00ff);
    (alpha_green & 0xff00ff00) | (red_blue & 0x00ff00ff)
}

pub(crate) fn alpha(argb: u32) -> u8 {
    (argb >> 24) as u8
}

pub(crate) fn red(argb: u32) -> u8 {
    (argb >> 16) as u8
}

pub(crate) fn green(argb: u32) -> u8 {
    (argb >> 8) as u8
}

pub(crate) fn blue(argb: u32) -> u8 {
    argb as u8
}

pub(crate) fn argb(alpha: u8, red: u8, green: u8, blue: u8) -> u32 {
    (alpha as u32) << 24 | (red as u32) << 16 | (green as u32) << 8 | blue as u32
}
