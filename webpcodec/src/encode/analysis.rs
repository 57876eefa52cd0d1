#![allow(missing_docs)]

//! Choosing which transforms to apply, and at what tile size.

use derive_more::Display;

use crate::context::CodecContext;
use crate::transform::{alpha, blue, green, red, sub_pixels, subsample_size};

use super::entropy::shannon_bits;

/// A combination of transforms the encoder can apply.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum EntropyMode {
    /// No transforms.
    #[display(fmt = "direct")]
    Direct,
    /// The predictor transform, followed by the color transform.
    #[display(fmt = "spatial")]
    Spatial,
    /// The subtract green transform.
    #[display(fmt = "subtract green")]
    SubtractGreen,
    /// The subtract green, predictor, and color transforms.
    #[display(fmt = "spatial subtract green")]
    SpatialSubtractGreen,
    /// The color indexing transform.
    #[display(fmt = "palette")]
    Palette,
}

/// The outcome of [`analyze`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Analysis {
    pub mode: EntropyMode,
    /// Whether the red and blue residuals of the chosen mode are all zero, making the color transform useless.
    pub red_and_blue_always_zero: bool,
}

pub const MIN_TRANSFORM_BITS: u8 = 2;
pub const MAX_TRANSFORM_BITS: u8 = 9;

const MIN_HISTOGRAM_BITS: u8 = 2;
const MAX_HISTOGRAM_BITS: u8 = 9;
const MAX_HISTOGRAM_IMAGE_SIZE: u32 = 2600;
const MAX_TRANSFORM_IMAGE_SIZE: u32 = 1 << 14;

/// Palettes at most this large always win, as several indices are bundled into each pixel.
const SMALL_PALETTE_LEN: usize = 16;

const PALETTE_HASH_MULTIPLIER: u64 = 0x39c5fba7;

#[derive(Clone, Copy)]
enum Channels {
    Alpha,
    Red,
    Green,
    Blue,
    AlphaPredicted,
    RedPredicted,
    GreenPredicted,
    BluePredicted,
    RedSubtractGreen,
    BlueSubtractGreen,
    RedPredictedSubtractGreen,
    BluePredictedSubtractGreen,
    PaletteHash,
}

const CHANNELS_COUNT: usize = 13;

//
// EntropyMode impls
//

impl EntropyMode {
    pub fn uses_predictor(self) -> bool {
        matches!(self, Self::Spatial | Self::SpatialSubtractGreen)
    }

    pub fn uses_subtract_green(self) -> bool {
        matches!(self, Self::SubtractGreen | Self::SpatialSubtractGreen)
    }
}

//
// public functions
//

/// Estimate which transforms code `pixels` most compactly, from the entropy of its channels after each.
///
/// `palette_len` is the size of the image's palette, if it has at most 256 colors.
pub fn analyze(
    context: &CodecContext,
    pixels: &[u32],
    width: u32,
    height: u32,
    palette_len: Option<usize>,
    transform_bits: u8,
) -> Analysis {
    if palette_len.map_or(false, |len| len <= SMALL_PALETTE_LEN) {
        return Analysis { mode: EntropyMode::Palette, red_and_blue_always_zero: true };
    }

    let mut histograms = [[0u32; 256]; CHANNELS_COUNT];
    let mut count = |channels: Channels, value: u8| histograms[channels as usize][usize::from(value)] += 1;

    let width = width as usize;
    let mut previous = pixels.first().copied().unwrap_or_default();
    for (index, &pixel) in pixels.iter().enumerate() {
        let difference = sub_pixels(pixel, previous);
        previous = pixel;
        // Repeated pixels are coded by backward references whatever the transforms.
        if difference == 0 || (index >= width && pixel == pixels[index - width]) {
            continue;
        }

        count(Channels::Alpha, alpha(pixel));
        count(Channels::Red, red(pixel));
        count(Channels::Green, green(pixel));
        count(Channels::Blue, blue(pixel));
        count(Channels::AlphaPredicted, alpha(difference));
        count(Channels::RedPredicted, red(difference));
        count(Channels::GreenPredicted, green(difference));
        count(Channels::BluePredicted, blue(difference));
        count(Channels::RedSubtractGreen, red(pixel).wrapping_sub(green(pixel)));
        count(Channels::BlueSubtractGreen, blue(pixel).wrapping_sub(green(pixel)));
        count(Channels::RedPredictedSubtractGreen, red(difference).wrapping_sub(green(difference)));
        count(Channels::BluePredictedSubtractGreen, blue(difference).wrapping_sub(green(difference)));
        count(Channels::PaletteHash, palette_hash(pixel));
    }
    // Skipping repeated pixels also skips the zero residuals they would have produced.
    for channels in [
        Channels::AlphaPredicted,
        Channels::RedPredicted,
        Channels::GreenPredicted,
        Channels::BluePredicted,
        Channels::RedPredictedSubtractGreen,
        Channels::BluePredictedSubtractGreen,
    ] {
        count(channels, 0);
    }

    let bits = histograms.map(|histogram| shannon_bits(context, &histogram));
    let bits_of = |channels: [Channels; 4]| channels.iter().map(|&channels| bits[channels as usize]).sum::<f64>();

    let tiles = f64::from(subsample_size(width as u32, transform_bits) * subsample_size(height, transform_bits));
    let mut candidates = vec![
        (
            EntropyMode::Direct,
            bits_of([Channels::Alpha, Channels::Red, Channels::Green, Channels::Blue]),
            [Channels::Red, Channels::Blue],
        ),
        (
            EntropyMode::Spatial,
            bits_of([
                Channels::AlphaPredicted,
                Channels::RedPredicted,
                Channels::GreenPredicted,
                Channels::BluePredicted,
            ]) + tiles * 14f64.log2(),
            [Channels::RedPredicted, Channels::BluePredicted],
        ),
        (
            EntropyMode::SubtractGreen,
            bits_of([Channels::Alpha, Channels::RedSubtractGreen, Channels::Green, Channels::BlueSubtractGreen]),
            [Channels::RedSubtractGreen, Channels::BlueSubtractGreen],
        ),
        (
            EntropyMode::SpatialSubtractGreen,
            bits_of([
                Channels::AlphaPredicted,
                Channels::RedPredictedSubtractGreen,
                Channels::GreenPredicted,
                Channels::BluePredictedSubtractGreen,
            ]) + tiles * 24f64.log2(),
            [Channels::RedPredictedSubtractGreen, Channels::BluePredictedSubtractGreen],
        ),
    ];
    if let Some(palette_len) = palette_len {
        candidates.push((
            EntropyMode::Palette,
            bits[Channels::PaletteHash as usize] + palette_len as f64 * 8.0,
            [Channels::Red, Channels::Blue],
        ));
    }

    let mut best = &candidates[0];
    for candidate in &candidates[1..] {
        if candidate.1 < best.1 {
            best = candidate;
        }
    }
    let (mode, best_bits, [red_channel, blue_channel]) = *best;
    let red_and_blue_always_zero = histograms[red_channel as usize][1..]
        .iter()
        .chain(&histograms[blue_channel as usize][1..])
        .all(|&count| count == 0);

    log::debug!("analysis chose {mode} mode, estimated {best_bits:.0} bits");
    Analysis { mode, red_and_blue_always_zero }
}

/// The tile size of the predictor and color transforms, for the given effort `method`.
pub fn transform_bits(width: u32, height: u32, method: u8, use_palette: bool) -> u8 {
    let base_bits: u8 = if use_palette { 9 } else { 7 };
    let histogram_bits = clamp_bits(
        width,
        height,
        base_bits.saturating_sub(method),
        MIN_HISTOGRAM_BITS,
        MAX_HISTOGRAM_BITS,
        MAX_HISTOGRAM_IMAGE_SIZE,
    );
    let max_bits = match method {
        0..=3 => 6,
        4 => 5,
        _ => 4,
    };
    clamp_bits(
        width,
        height,
        histogram_bits.min(max_bits),
        MIN_TRANSFORM_BITS,
        MAX_TRANSFORM_BITS,
        MAX_TRANSFORM_IMAGE_SIZE,
    )
}

/// Clamp `bits` to `min_bits..=max_bits`, growing it until the tile image has at most `max_image_size` tiles, then
/// shrinking it while the tile image would still be a single tile.
fn clamp_bits(width: u32, height: u32, bits: u8, min_bits: u8, max_bits: u8, max_image_size: u32) -> u8 {
    let tile_count = |bits| subsample_size(width, bits) * subsample_size(height, bits);
    let mut bits = bits.clamp(min_bits, max_bits);
    while bits < max_bits && tile_count(bits) > max_image_size {
        bits += 1;
    }
    while bits > min_bits && tile_count(bits - 1) == 1 {
        bits -= 1;
    }
    bits
}

fn palette_hash(pixel: u32) -> u8 {
    let value = u64::from(pixel) + u64::from(pixel >> 19);
    ((value.wrapping_mul(PALETTE_HASH_MULTIPLIER) & 0xffff_ffff) >> 24) as u8
}
