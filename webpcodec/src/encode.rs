//! Unstable API for encoding VP8L bitstreams.

#![allow(missing_docs)]

pub mod analysis;
pub mod backward_refs;
pub mod bitstream;
pub mod entropy;
pub mod hash_chain;
pub mod histogram;
pub mod huffman;
pub mod near_lossless;

use std::num::NonZeroU32;

use webpcodec_common::ResultExt;

use crate::context::CodecContext;
use crate::lz77::{self, NUM_LENGTH_CODES};
use crate::parse::lossless::NUM_LITERAL_CODES;
use crate::parse::{ParseChunk, ParsedChunk, Vp8lChunk};
use crate::transform::{
    self, color, color_indexing, predictor, subsample_size, subtract_green, ColorTransformElement, Palette,
    PredictorMode, TransformType,
};
use crate::{Config, Error};

use analysis::{Analysis, EntropyMode};
use backward_refs::PixOrCopy;
use bitstream::BitBufWriter;
use histogram::Histogram;

/// Encoding effort settings, clamped from a [`Config`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Effort {
    quality: u8,
    method: u8,
    near_lossless: u8,
}

/// Qualities at or below this never use a color cache.
const MAX_QUALITY_WITHOUT_COLOR_CACHE: u8 = 25;

//
// public functions
//

/// Encode `0xAARRGGBB` pixels as a complete VP8L bitstream, header included.
///
/// With methods 5 and 6, several transform combinations are encoded and the smallest output is kept.
pub fn encode_argb(
    context: &CodecContext,
    pixels: &[u32],
    width: NonZeroU32,
    height: NonZeroU32,
    config: &Config,
) -> Result<Vec<u8>, Error> {
    let effort = Effort::from(config);
    let alpha_is_used = pixels.iter().any(|&pixel| transform::alpha(pixel) != 0xff);
    let header = Vp8lChunk::new(width, height, alpha_is_used).while_writing_type()?;
    let (width, height) = (width.get(), height.get());

    let palette = Palette::from_pixels(pixels);
    let mut best: Option<Vec<u8>> = None;
    for transform_bits in tile_sizes(width, height, effort.method, palette.is_some()) {
        let analysis =
            analysis::analyze(context, pixels, width, height, palette.as_ref().map(Palette::len), transform_bits);
        for candidate in candidates(analysis, effort.method, palette.is_some()) {
            let image = ImageEncoder { context, effort, width, height, transform_bits, palette: palette.as_ref() };
            let data = image.encode(pixels, candidate)?;
            log::debug!("{} mode, transform bits {transform_bits}: {} bytes", candidate.mode, data.len());
            if best.as_ref().map_or(true, |best| data.len() < best.len()) {
                best = Some(data);
            }
        }
    }
    let data = best.unwrap_or_default();

    let mut output = Vec::with_capacity(Vp8lChunk::ENCODED_LEN as usize + data.len());
    header.put_buf(&mut output);
    output.extend_from_slice(&data);
    Ok(output)
}

/// The transform tile sizes to try. Methods 5 and 6 also try the tile size of method 4, so that they never do worse.
fn tile_sizes(width: u32, height: u32, method: u8, has_palette: bool) -> Vec<u8> {
    let bits = analysis::transform_bits(width, height, method, has_palette);
    let fallback_bits = analysis::transform_bits(width, height, 4, has_palette);
    if method >= 5 && fallback_bits != bits {
        vec![bits, fallback_bits]
    } else {
        vec![bits]
    }
}

/// The transform combinations to try, best guess first.
fn candidates(analysis: Analysis, method: u8, has_palette: bool) -> Vec<Analysis> {
    let mut guess = analysis;
    if method == 0 {
        guess.mode = match guess.mode {
            EntropyMode::Spatial => EntropyMode::Direct,
            EntropyMode::SpatialSubtractGreen => EntropyMode::SubtractGreen,
            mode => mode,
        };
    }

    let mut modes = match method {
        0..=4 => vec![],
        5 => vec![EntropyMode::SpatialSubtractGreen],
        _ => vec![
            EntropyMode::Direct,
            EntropyMode::Spatial,
            EntropyMode::SubtractGreen,
            EntropyMode::SpatialSubtractGreen,
        ],
    };
    if method >= 5 && has_palette {
        modes.push(EntropyMode::Palette);
    }

    let mut candidates = vec![guess];
    for mode in modes {
        if candidates.iter().all(|candidate| candidate.mode != mode) {
            candidates.push(Analysis { mode, red_and_blue_always_zero: false });
        }
    }
    candidates
}

//
// Effort impls
//

impl From<&Config> for Effort {
    fn from(config: &Config) -> Self {
        Self {
            quality: config.quality.min(100),
            method: config.method.min(6),
            near_lossless: config.near_lossless.min(100),
        }
    }
}

//
// ImageEncoder impls
//

/// Encodes the transforms and pixels of one image, following the VP8L header.
struct ImageEncoder<'a> {
    context: &'a CodecContext,
    effort: Effort,
    width: u32,
    height: u32,
    transform_bits: u8,
    palette: Option<&'a Palette>,
}

impl ImageEncoder<'_> {
    fn encode(&self, pixels: &[u32], analysis: Analysis) -> Result<Vec<u8>, Error> {
        let Self { width, height, .. } = *self;
        let mut writer = BitBufWriter::new();
        let mut pixels = pixels.to_vec();
        let mut coded_width = width;
        let mut max_cache_bits = backward_refs::MAX_COLOR_CACHE_BITS;

        match (analysis.mode, self.palette) {
            (EntropyMode::Palette, Some(palette)) => {
                write_transform_type(&mut writer, TransformType::ColorIndexing)?;
                writer.write(8, palette.len() as u32 - 1)?;
                self.write_sub_image(&mut writer, &palette.to_delta_coded(), palette.len() as u32)?;
                pixels = palette.apply(&pixels, width);
                coded_width = color_indexing::packed_width(width, palette.bundle_bits());
                max_cache_bits = max_cache_bits.min(floor_log2(palette.len()) + 1);
                log::info!("color indexing transform: {} colors", palette.len());
            }
            (mode, _) => {
                near_lossless::apply(&mut pixels, width, height, self.effort.near_lossless);

                if mode.uses_subtract_green() {
                    write_transform_type(&mut writer, TransformType::SubtractGreen)?;
                    subtract_green::apply(&mut pixels);
                    log::info!("subtract green transform");
                }

                if mode.uses_predictor() {
                    let bits = self.transform_bits;
                    let modes = predictor::choose_modes(&pixels, width, height, bits);
                    write_transform_type(&mut writer, TransformType::Predictor)?;
                    self.write_tile_image(&mut writer, bits, modes.iter().copied().map(PredictorMode::to_argb))?;
                    predictor::apply(&mut pixels, width, bits, &modes);
                    log::info!("predictor transform: tile bits {bits}");

                    if !analysis.red_and_blue_always_zero {
                        let elements = color::choose_elements(&pixels, width, height, bits);
                        write_transform_type(&mut writer, TransformType::Color)?;
                        let elements_argb = elements.iter().copied().map(ColorTransformElement::to_argb);
                        self.write_tile_image(&mut writer, bits, elements_argb)?;
                        color::apply(&mut pixels, width, bits, &elements);
                        log::info!("color transform: tile bits {bits}");
                    }
                }
            }
        }
        writer.write_bit(false)?;

        if self.effort.quality <= MAX_QUALITY_WITHOUT_COLOR_CACHE {
            max_cache_bits = 0;
        }
        self.write_main_image(&mut writer, &pixels, coded_width, max_cache_bits)?;
        writer.into_bytes()
    }

    /// Write the tile bits and per-tile sub-image of a predictor or color transform.
    fn write_tile_image<I>(&self, writer: &mut BitBufWriter, bits: u8, tiles: I) -> Result<(), Error>
    where
        I: Iterator<Item = u32>,
    {
        writer.write(3, u32::from(bits - analysis::MIN_TRANSFORM_BITS))?;
        let tiles: Vec<u32> = tiles.collect();
        self.write_sub_image(writer, &tiles, subsample_size(self.width, bits))
    }

    /// Write an entropy-coded sub-image carrying transform data, which has no color cache and no meta prefix codes.
    fn write_sub_image(&self, writer: &mut BitBufWriter, pixels: &[u32], width: u32) -> Result<(), Error> {
        let refs = backward_refs::compute(self.context, pixels, width, self.effort.quality);
        writer.write_bit(false)?;
        write_entropy_coded(writer, &refs, 0)
    }

    fn write_main_image(
        &self,
        writer: &mut BitBufWriter,
        pixels: &[u32],
        width: u32,
        max_cache_bits: u8,
    ) -> Result<(), Error> {
        let refs = backward_refs::compute(self.context, pixels, width, self.effort.quality);
        let cache_bits = backward_refs::choose_color_cache_bits(self.context, &refs, pixels, max_cache_bits);
        let refs = backward_refs::with_color_cache(&refs, pixels, cache_bits);

        writer.write_bit(cache_bits != 0)?;
        if cache_bits != 0 {
            writer.write(4, cache_bits.into())?;
        }
        // A single prefix code group for the whole image.
        writer.write_bit(false)?;
        write_entropy_coded(writer, &refs, cache_bits)
    }
}

fn write_transform_type(writer: &mut BitBufWriter, transform_type: TransformType) -> Result<(), Error> {
    writer.write_bit(true)?;
    writer.write(2, transform_type as u32)
}

/// Write the five prefix codes for `refs`, then `refs` themselves.
fn write_entropy_coded(writer: &mut BitBufWriter, refs: &[PixOrCopy], cache_bits: u8) -> Result<(), Error> {
    let histogram = Histogram::from_refs(refs, cache_bits);
    let green_code = huffman::write_prefix_code(writer, &histogram.green)?;
    let red_code = huffman::write_prefix_code(writer, &histogram.red)?;
    let blue_code = huffman::write_prefix_code(writer, &histogram.blue)?;
    let alpha_code = huffman::write_prefix_code(writer, &histogram.alpha)?;
    let distance_code = huffman::write_prefix_code(writer, &histogram.distance)?;
    log::debug!(
        "prefix codes: longest green {}, red {}, blue {}, alpha {}, distance {}",
        green_code.longest_code_len(),
        red_code.longest_code_len(),
        blue_code.longest_code_len(),
        alpha_code.longest_code_len(),
        distance_code.longest_code_len(),
    );

    for &token in refs {
        match token {
            PixOrCopy::Literal(argb) => {
                writer.write_huffman(&green_code, transform::green(argb).into())?;
                writer.write_huffman(&red_code, transform::red(argb).into())?;
                writer.write_huffman(&blue_code, transform::blue(argb).into())?;
                writer.write_huffman(&alpha_code, transform::alpha(argb).into())?;
            }
            PixOrCopy::CacheIndex(index) => {
                writer.write_huffman(&green_code, NUM_LITERAL_CODES + NUM_LENGTH_CODES + index)?;
            }
            PixOrCopy::Copy { len, distance_code: distance } => {
                let len = lz77::prefix_encode(len);
                writer.write_huffman(&green_code, NUM_LITERAL_CODES + len.code)?;
                writer.write(len.extra_bits, len.extra_value)?;
                let distance = lz77::prefix_encode(distance);
                writer.write_huffman(&distance_code, distance.code)?;
                writer.write(distance.extra_bits, distance.extra_value)?;
            }
        }
    }
    Ok(())
}

fn floor_log2(value: usize) -> u8 {
    (usize::BITS - 1 - value.max(1).leading_zeros()) as u8
}
