#![allow(missing_docs)]

use std::num::NonZeroU32;

use derive_more::Display;
use webpcodec_common::{ensure_attach, ensure_matches_attach, report_attach, ResultExt};

use crate::color_cache::ColorCache;
use crate::huffman::HuffmanTable;
use crate::lz77::{self, NUM_DISTANCE_CODES, NUM_LENGTH_CODES};
use crate::transform::{
    self, color, color_indexing, predictor, subsample_size, subtract_green, ColorTransformElement, PredictorMode,
    TransformType,
};
use crate::{CodecError, Error};

use super::bitstream::{BitBufReader, CanonicalHuffmanTree};

/// A fully decoded VP8L image, with all transforms undone.
#[derive(Clone, Debug)]
pub struct LosslessImage {
    width: NonZeroU32,
    height: NonZeroU32,
    pixels: Vec<u32>,
}

/// The number of literal symbols in the green, red, blue, and alpha alphabets.
pub const NUM_LITERAL_CODES: u16 = 256;

/// The order in which code length code lengths are transmitted.
pub const CODE_LENGTH_CODE_ORDER: [u8; NUM_CODE_LENGTH_CODES] =
    [17, 18, 0, 1, 2, 3, 4, 5, 16, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15];

/// The number of symbols in the code length alphabet.
pub const NUM_CODE_LENGTH_CODES: usize = 19;

//
// private types
//

#[derive(Clone, Display)]
enum Transform {
    #[display(fmt = "predictor transform: tile bits {bits}")]
    Predictor { bits: u8, modes: Vec<PredictorMode> },
    #[display(fmt = "color transform: tile bits {bits}")]
    Color { bits: u8, elements: Vec<ColorTransformElement> },
    #[display(fmt = "subtract green transform")]
    SubtractGreen,
    #[display(fmt = "color indexing transform: {} colors", "palette.len()")]
    ColorIndexing { palette: Vec<u32> },
}

/// An image coded without meta prefix codes: the sub-images carrying transform data.
struct EntropyCodedImage {
    pixels: Vec<u32>,
}

/// The main image, which may select between several prefix code groups by position.
struct SpatiallyCodedImage {
    pixels: Vec<u32>,
}

#[derive(Display)]
enum MetaPrefixCodes {
    #[display(fmt = "single meta prefix code")]
    Single,
    #[display(fmt = "multiple meta prefix codes: max code group {max_code_group}, tile bits {bits}")]
    Multiple { bits: u8, width_in_tiles: u32, max_code_group: u16, groups: Vec<u16> },
}

struct PrefixCodeGroup {
    green: CanonicalHuffmanTree,
    red: CanonicalHuffmanTree,
    blue: CanonicalHuffmanTree,
    alpha: CanonicalHuffmanTree,
    distance: CanonicalHuffmanTree,
}

struct CodeLengthPrefixCode {
    tree: CanonicalHuffmanTree,
}

#[derive(Clone, Copy, Debug, Display)]
#[display(fmt = "out-of-bounds color cache index `{_0}` >= `{_1}`")]
struct ColorCacheIndexOutOfBounds(usize, usize);

#[derive(Clone, Copy, Debug, Display)]
#[display(fmt = "invalid back-reference distance `{_0}` at pixel `{_1}`")]
struct InvalidBackRefDistance(u32, usize);

#[derive(Clone, Copy, Debug, Display)]
#[display(fmt = "invalid back-reference length `{_0}` at pixel `{_1}` with image length `{_2}`")]
struct InvalidBackRefLength(u32, usize, usize);

#[derive(Clone, Copy, Debug, Display)]
#[display(fmt = "invalid code length repetition `{_0}` at `{_1}` with alphabet size `{_2}`")]
struct InvalidCodeLengthRepetition(u32, usize, u16);

#[derive(Clone, Copy, Debug, Display)]
#[display(fmt = "invalid color cache bits `{_0}`")]
struct InvalidColorCacheBits(u8);

#[derive(Clone, Copy, Debug, Display)]
#[display(fmt = "invalid duplicate {_0} transform")]
struct InvalidDuplicateTransform(TransformType);

#[derive(Clone, Copy, Debug, Display)]
#[display(fmt = "invalid symbol count `{_0}` > `{_1}`")]
struct InvalidSymbolCount(u32, u16);

#[derive(Clone, Copy, Debug, Display)]
#[display(fmt = "symbol `{_0}` outside of alphabet of size `{_1}`")]
struct SymbolOutOfBounds(u16, u16);

#[derive(Clone, Copy, Debug, Display)]
#[display(fmt = "while parsing {_0} transform")]
struct WhileParsingTransform(TransformType);

/// Caps the up-front allocation for the decoded pixels, so that a tiny input claiming huge dimensions fails on
/// truncation before allocating the whole image.
const MAX_PREALLOCATED_PIXELS: usize = 1 << 20;

//
// LosslessImage impls
//

impl LosslessImage {
    /// Decode the transforms and entropy-coded pixels of a VP8L bitstream following its header.
    pub fn read(reader: &mut BitBufReader<'_>, width: NonZeroU32, height: NonZeroU32) -> Result<Self, Error> {
        let mut coded_width = width;
        let mut seen_transforms = [false; TransformType::COUNT];
        let mut transforms = Vec::with_capacity(TransformType::COUNT);
        while reader.read_bit()? {
            let transform_type = TransformType::from_bits(reader.read(2)?);
            ensure_attach!(
                !seen_transforms[transform_type as usize],
                CodecError::TransformDecode,
                InvalidDuplicateTransform(transform_type),
            );
            seen_transforms[transform_type as usize] = true;

            let transform = Transform::read(reader, transform_type, coded_width, height)
                .attach_printable(WhileParsingTransform(transform_type))?;
            log::info!("{transform}");

            let transform_width = coded_width;
            coded_width = transform.coded_width(coded_width);
            transforms.push((transform, transform_width));
        }

        let SpatiallyCodedImage { mut pixels } = SpatiallyCodedImage::read(reader, coded_width, height)
            .while_parsing_type()?;

        for (transform, transform_width) in transforms.iter().rev() {
            pixels = transform.inverse(pixels, *transform_width, height)?;
        }

        Ok(Self { width, height, pixels })
    }

    pub fn width(&self) -> NonZeroU32 {
        self.width
    }

    pub fn height(&self) -> NonZeroU32 {
        self.height
    }

    /// The decoded `0xAARRGGBB` pixels, row-major.
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub fn into_pixels(self) -> Vec<u32> {
        self.pixels
    }
}

//
// Transform impls
//

impl Transform {
    fn read(
        reader: &mut BitBufReader<'_>,
        transform_type: TransformType,
        width: NonZeroU32,
        height: NonZeroU32,
    ) -> Result<Self, Error> {
        match transform_type {
            TransformType::Predictor => {
                let bits = 2 + reader.read::<u8>(3)?;
                let image = EntropyCodedImage::read(reader, len_in_tiles(width, bits), len_in_tiles(height, bits))
                    .while_parsing_type()?;
                let modes = image
                    .pixels
                    .iter()
                    .map(|&pixel| PredictorMode::from_argb(pixel))
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|err| report_attach!(CodecError::TransformDecode, err))?;
                log::debug!("predictor modes: {modes:?}");
                Ok(Self::Predictor { bits, modes })
            }
            TransformType::Color => {
                let bits = 2 + reader.read::<u8>(3)?;
                let image = EntropyCodedImage::read(reader, len_in_tiles(width, bits), len_in_tiles(height, bits))
                    .while_parsing_type()?;
                let elements = image.pixels.iter().map(|&pixel| ColorTransformElement::from_argb(pixel)).collect();
                Ok(Self::Color { bits, elements })
            }
            TransformType::SubtractGreen => Ok(Self::SubtractGreen),
            TransformType::ColorIndexing => {
                let len = NonZeroU32::MIN.saturating_add(reader.read(8)?);
                let EntropyCodedImage { pixels: mut palette } =
                    EntropyCodedImage::read(reader, len, NonZeroU32::MIN).while_parsing_type()?;
                color_indexing::delta_decode(&mut palette);
                log::debug!("palette: {palette:08x?}");
                Ok(Self::ColorIndexing { palette })
            }
        }
    }

    /// The width of the image coded after this transform, given the width of the image before it.
    fn coded_width(&self, width: NonZeroU32) -> NonZeroU32 {
        match self {
            Self::ColorIndexing { palette } => {
                len_in_tiles(width, color_indexing::bundle_bits(palette.len()))
            }
            _ => width,
        }
    }

    fn inverse(&self, mut pixels: Vec<u32>, width: NonZeroU32, height: NonZeroU32) -> Result<Vec<u32>, Error> {
        match self {
            Self::Predictor { bits, modes } => predictor::inverse(&mut pixels, width.get(), *bits, modes),
            Self::Color { bits, elements } => color::inverse(&mut pixels, width.get(), *bits, elements),
            Self::SubtractGreen => subtract_green::inverse(&mut pixels),
            Self::ColorIndexing { palette } => {
                return Ok(color_indexing::inverse(&pixels, width.get(), height.get(), palette)?);
            }
        }
        Ok(pixels)
    }
}

//
// EntropyCodedImage impls
//

impl EntropyCodedImage {
    fn read(reader: &mut BitBufReader<'_>, width: NonZeroU32, height: NonZeroU32) -> Result<Self, Error> {
        let color_cache = read_color_cache(reader)?;
        let color_cache_len = color_cache.as_ref().map(ColorCache::len).unwrap_or_default();
        let codes = PrefixCodeGroup::read(reader, color_cache_len).while_parsing_type()?;
        let pixels = read_pixels(reader, width, height, color_cache, &MetaPrefixCodes::Single, &[codes])?;
        Ok(Self { pixels })
    }
}

//
// SpatiallyCodedImage impls
//

impl SpatiallyCodedImage {
    fn read(reader: &mut BitBufReader<'_>, width: NonZeroU32, height: NonZeroU32) -> Result<Self, Error> {
        let color_cache = read_color_cache(reader)?;
        let color_cache_len = color_cache.as_ref().map(ColorCache::len).unwrap_or_default();
        let meta = MetaPrefixCodes::read(reader, width, height).while_parsing_type()?;
        log::info!("{meta}");

        let groups = (0..=meta.max_code_group())
            .map(|_| PrefixCodeGroup::read(reader, color_cache_len).while_parsing_type())
            .collect::<Result<Vec<_>, _>>()?;
        let pixels = read_pixels(reader, width, height, color_cache, &meta, &groups)?;
        Ok(Self { pixels })
    }
}

//
// MetaPrefixCodes impls
//

impl MetaPrefixCodes {
    fn read(reader: &mut BitBufReader<'_>, width: NonZeroU32, height: NonZeroU32) -> Result<Self, Error> {
        if !reader.read_bit()? {
            return Ok(Self::Single);
        }
        let bits = 2 + reader.read::<u8>(3)?;
        let width_in_tiles = len_in_tiles(width, bits);
        let image = EntropyCodedImage::read(reader, width_in_tiles, len_in_tiles(height, bits)).while_parsing_type()?;
        let groups: Vec<u16> = image.pixels.iter().map(|&pixel| (pixel >> 8) as u16).collect();
        let max_code_group = groups.iter().copied().max().unwrap_or_default();
        Ok(Self::Multiple { bits, width_in_tiles: width_in_tiles.get(), max_code_group, groups })
    }

    fn max_code_group(&self) -> u16 {
        match self {
            Self::Single => 0,
            &Self::Multiple { max_code_group, .. } => max_code_group,
        }
    }

    fn group_at(&self, x: u32, y: u32) -> usize {
        match self {
            Self::Single => 0,
            Self::Multiple { bits, width_in_tiles, groups, .. } => {
                let tile = (y >> bits) * width_in_tiles + (x >> bits);
                usize::from(groups[tile as usize])
            }
        }
    }
}

//
// PrefixCodeGroup impls
//

impl PrefixCodeGroup {
    fn read(reader: &mut BitBufReader<'_>, color_cache_len: usize) -> Result<Self, Error> {
        let green_alphabet_size = NUM_LITERAL_CODES + NUM_LENGTH_CODES + color_cache_len as u16;
        Ok(Self {
            green: read_prefix_code(reader, green_alphabet_size).attach_printable("while parsing green code")?,
            red: read_prefix_code(reader, NUM_LITERAL_CODES).attach_printable("while parsing red code")?,
            blue: read_prefix_code(reader, NUM_LITERAL_CODES).attach_printable("while parsing blue code")?,
            alpha: read_prefix_code(reader, NUM_LITERAL_CODES).attach_printable("while parsing alpha code")?,
            distance: read_prefix_code(reader, NUM_DISTANCE_CODES).attach_printable("while parsing distance code")?,
        })
    }
}

//
// CodeLengthPrefixCode impls
//

impl CodeLengthPrefixCode {
    fn read(reader: &mut BitBufReader<'_>) -> Result<Self, Error> {
        let code_length_count = 4 + usize::from(reader.read::<u8>(4)?);

        let mut code_lengths = [0; NUM_CODE_LENGTH_CODES];
        for &symbol in &CODE_LENGTH_CODE_ORDER[..code_length_count] {
            code_lengths[usize::from(symbol)] = reader.read(3)?;
        }
        log::debug!("code length code lengths: {code_lengths:?}");

        let tree = CanonicalHuffmanTree::from_code_lengths(&code_lengths)
            .attach_printable("while parsing code length code")?;
        Ok(Self { tree })
    }
}

//
// private functions
//

fn len_in_tiles(len: NonZeroU32, bits: u8) -> NonZeroU32 {
    NonZeroU32::new(subsample_size(len.get(), bits)).unwrap_or(NonZeroU32::MIN)
}

fn read_color_cache(reader: &mut BitBufReader<'_>) -> Result<Option<ColorCache>, Error> {
    if !reader.read_bit()? {
        return Ok(None);
    }
    let bits = reader.read::<u8>(4)?;
    ensure_attach!(
        (1..=ColorCache::MAX_BITS).contains(&bits),
        CodecError::InvalidHuffmanTable,
        InvalidColorCacheBits(bits),
    );
    log::debug!("color cache bits: {bits}");
    Ok(Some(ColorCache::new(bits)))
}

pub(crate) fn read_prefix_code(
    reader: &mut BitBufReader<'_>,
    alphabet_size: u16,
) -> Result<CanonicalHuffmanTree, Error> {
    let mut code_lengths = vec![0u8; usize::from(alphabet_size)];

    let simple_code = reader.read_bit()?;
    if simple_code {
        let has_second_symbol = reader.read_bit()?;
        let first_symbol_bits = if reader.read_bit()? { 8 } else { 1 };
        let mut symbols = vec![reader.read::<u16>(first_symbol_bits)?];
        if has_second_symbol {
            symbols.push(reader.read::<u16>(8)?);
        }
        for symbol in symbols {
            ensure_matches_attach!(
                code_lengths.get_mut(usize::from(symbol)),
                Some(code_length),
                CodecError::InvalidHuffmanTable,
                SymbolOutOfBounds(symbol, alphabet_size),
            );
            *code_length = 1;
        }
    } else {
        let code_length_code = CodeLengthPrefixCode::read(reader)?;

        let max_tokens = if reader.read_bit()? {
            let length_bits = 2 + 2 * reader.read::<u32>(3)?;
            let max_tokens = 2 + reader.read::<u32>(length_bits)?;
            ensure_attach!(
                max_tokens <= u32::from(alphabet_size),
                CodecError::InvalidHuffmanTable,
                InvalidSymbolCount(max_tokens, alphabet_size),
            );
            max_tokens
        } else {
            u32::from(alphabet_size)
        };

        // Tokens are counted rather than symbols; lengths past the last token are zero.
        let mut symbol = 0;
        let mut last_non_zero_code_length = 8;
        for _ in 0..max_tokens {
            if symbol == code_lengths.len() {
                break;
            }
            let (code_length, repeat) = match reader.read_huffman(&code_length_code.tree)? {
                code_length @ 0..=15 => (code_length as u8, 1),
                16 => (last_non_zero_code_length, 3 + reader.read::<u32>(2)?),
                17 => (0, 3 + reader.read::<u32>(3)?),
                _ => (0, 11 + reader.read::<u32>(7)?),
            };
            let end = symbol + repeat as usize;
            ensure_attach!(
                end <= code_lengths.len(),
                CodecError::InvalidHuffmanTable,
                InvalidCodeLengthRepetition(repeat, symbol, alphabet_size),
            );
            code_lengths[symbol..end].fill(code_length);
            if code_length != 0 {
                last_non_zero_code_length = code_length;
            }
            symbol = end;
        }
    }

    log::debug!("code lengths: {code_lengths:?}");
    let table = HuffmanTable::from_code_lengths(&code_lengths)?;
    CanonicalHuffmanTree::new(&table)
}

fn read_pixels(
    reader: &mut BitBufReader<'_>,
    width: NonZeroU32,
    height: NonZeroU32,
    mut color_cache: Option<ColorCache>,
    meta: &MetaPrefixCodes,
    groups: &[PrefixCodeGroup],
) -> Result<Vec<u32>, Error> {
    let len = width.get() as usize * height.get() as usize;
    let mut pixels = Vec::with_capacity(len.min(MAX_PREALLOCATED_PIXELS));
    let (mut x, mut y) = (0, 0);
    while pixels.len() < len {
        let codes = &groups[meta.group_at(x, y)];
        let decoded_len = pixels.len();
        match reader.read_huffman(&codes.green)? {
            green @ 0..=255 => {
                let red = reader.read_huffman(&codes.red)?;
                let blue = reader.read_huffman(&codes.blue)?;
                let alpha = reader.read_huffman(&codes.alpha)?;
                pixels.push(transform::argb(alpha as u8, red as u8, green as u8, blue as u8));
            }
            symbol @ 256..=279 => {
                let copy_len = reader.read_lz77(symbol - NUM_LITERAL_CODES)?.get();
                let distance_symbol = reader.read_huffman(&codes.distance)?;
                let distance_code = reader.read_lz77(distance_symbol)?.get();
                let distance = lz77::plane_code_to_distance(width.get(), distance_code);
                ensure_attach!(
                    distance as usize <= decoded_len,
                    CodecError::InvalidBackReference,
                    InvalidBackRefDistance(distance, decoded_len),
                );
                ensure_attach!(
                    copy_len as usize <= len - decoded_len,
                    CodecError::InvalidBackReference,
                    InvalidBackRefLength(copy_len, decoded_len, len),
                );
                // Source and destination may overlap, so copy one pixel at a time.
                let start = decoded_len - distance as usize;
                for index in start..start + copy_len as usize {
                    let pixel = pixels[index];
                    pixels.push(pixel);
                }
            }
            symbol => {
                let index = usize::from(symbol - NUM_LITERAL_CODES - NUM_LENGTH_CODES);
                let color_cache_len = color_cache.as_ref().map(ColorCache::len).unwrap_or_default();
                ensure_matches_attach!(
                    color_cache.as_ref().and_then(|color_cache| color_cache.get(index)),
                    Some(pixel),
                    CodecError::InvalidHuffmanTable,
                    ColorCacheIndexOutOfBounds(index, color_cache_len),
                );
                pixels.push(pixel);
            }
        }

        if let Some(color_cache) = &mut color_cache {
            for &pixel in &pixels[decoded_len..] {
                color_cache.insert(pixel);
            }
        }
        x += (pixels.len() - decoded_len) as u32;
        y += x / width.get();
        x %= width.get();
    }
    Ok(pixels)
}

#[cfg(test)]
mod test {
    use assert_matches::assert_matches;

    use crate::encode::bitstream::BitBufWriter;

    use super::*;

    fn write_simple_code(writer: &mut BitBufWriter, symbols: &[u16]) {
        writer.write_bit(true).unwrap();
        writer.write_bit(symbols.len() == 2).unwrap();
        writer.write_bit(true).unwrap();
        for &symbol in symbols {
            writer.write(8, u32::from(symbol)).unwrap();
        }
    }

    fn write_single_distance_code(writer: &mut BitBufWriter) {
        // One-bit symbol form, symbol 0.
        writer.write(3, 0b001).unwrap();
        writer.write(1, 0).unwrap();
    }

    /// A green code with literal `0` coded as `0` and length symbol `257` (a copy of 2 pixels) coded as `1`.
    fn write_green_code_with_copy(writer: &mut BitBufWriter) {
        writer.write_bit(false).unwrap();
        // Four code length code lengths, for symbols 17, 18, 0 and 1.
        writer.write(4, 0).unwrap();
        for code_length in [0, 1, 0, 1] {
            writer.write(3, code_length).unwrap();
        }
        // Four tokens: `1`, 138 zeros, 118 zeros, `1`.
        writer.write_bit(true).unwrap();
        writer.write(3, 0).unwrap();
        writer.write(2, 2).unwrap();
        writer.write(1, 0).unwrap();
        writer.write(1, 1).unwrap();
        writer.write(7, 127).unwrap();
        writer.write(1, 1).unwrap();
        writer.write(7, 107).unwrap();
        writer.write(1, 0).unwrap();
    }

    fn write_solid_codes(writer: &mut BitBufWriter, argb: u32) {
        write_simple_code(writer, &[transform::green(argb).into()]);
        write_simple_code(writer, &[transform::red(argb).into()]);
        write_simple_code(writer, &[transform::blue(argb).into()]);
        write_simple_code(writer, &[transform::alpha(argb).into()]);
        write_single_distance_code(writer);
    }

    fn read_image(data: &[u8], width: u32, height: u32) -> Result<LosslessImage, Error> {
        let mut reader = BitBufReader::new(data);
        LosslessImage::read(
            &mut reader,
            NonZeroU32::new(width).unwrap(),
            NonZeroU32::new(height).unwrap(),
        )
    }

    fn assert_codec_error(err: Error, expected: CodecError) {
        assert_matches!(err, Error::Codec(err) => {
            assert_eq!(err.get_ref(), &expected, "{err:?}");
        });
    }

    #[test]
    fn solid_image() {
        webpcodec_common_test::init_logger();

        let mut writer = BitBufWriter::new();
        writer.write(3, 0).unwrap();
        write_solid_codes(&mut writer, 0xff108020);
        let data = writer.into_bytes().unwrap();

        let image = read_image(&data, 3, 2).unwrap();
        assert_eq!(image.pixels(), [0xff108020; 6]);
    }

    #[test]
    fn two_symbol_literal_code() {
        let mut writer = BitBufWriter::new();
        writer.write(3, 0).unwrap();
        write_simple_code(&mut writer, &[0x00]);
        write_simple_code(&mut writer, &[0x00]);
        write_simple_code(&mut writer, &[0x00]);
        write_simple_code(&mut writer, &[0x00, 0xff]);
        write_single_distance_code(&mut writer);
        for alpha_bit in [1, 0, 0, 1] {
            writer.write(1, alpha_bit).unwrap();
        }
        let data = writer.into_bytes().unwrap();

        let image = read_image(&data, 2, 2).unwrap();
        assert_eq!(image.into_pixels(), [0xff000000, 0, 0, 0xff000000]);
    }

    #[test]
    fn subtract_green_inverted() {
        let mut writer = BitBufWriter::new();
        writer.write_bit(true).unwrap();
        writer.write(2, TransformType::SubtractGreen as u32).unwrap();
        writer.write(3, 0).unwrap();
        write_solid_codes(&mut writer, 0xff108020);
        let data = writer.into_bytes().unwrap();

        let image = read_image(&data, 1, 1).unwrap();
        assert_eq!(image.pixels(), [0xff9080a0]);
    }

    #[test]
    fn palette_inverted() {
        let mut writer = BitBufWriter::new();
        writer.write_bit(true).unwrap();
        writer.write(2, TransformType::ColorIndexing as u32).unwrap();
        // Two colors, the second delta-coded against the first.
        writer.write(8, 1).unwrap();
        writer.write(1, 0).unwrap();
        write_simple_code(&mut writer, &[0x00]);
        write_simple_code(&mut writer, &[0x00, 0x01]);
        write_simple_code(&mut writer, &[0x00]);
        write_simple_code(&mut writer, &[0xff, 0x00]);
        write_single_distance_code(&mut writer);
        // Palette: 0xff000000, then delta 0x00010000. Red and alpha bits of each pixel.
        for bit in [0, 1, 1, 0] {
            writer.write(1, bit).unwrap();
        }
        // Main image: one bundled pixel holding indices 1, 0, 1.
        writer.write(3, 0).unwrap();
        write_solid_codes(&mut writer, 0xff000500);
        let data = writer.into_bytes().unwrap();

        let image = read_image(&data, 3, 1).unwrap();
        assert_eq!(image.pixels(), [0xff010000, 0xff000000, 0xff010000]);
    }

    /// Main image header selecting prefix code groups per 4x4 tile, from a meta image of `groups`, one per tile.
    fn write_meta_prefix_codes(writer: &mut BitBufWriter, groups: [u16; 2]) {
        writer.write(2, 0).unwrap();
        writer.write_bit(true).unwrap();
        writer.write(3, 0).unwrap();
        // The meta image: no color cache, group indices in red and green, one bit per pixel.
        writer.write(1, 0).unwrap();
        write_simple_code(writer, &[groups[0] & 0xff, groups[1] & 0xff]);
        write_simple_code(writer, &[groups[0] >> 8]);
        write_simple_code(writer, &[0]);
        write_simple_code(writer, &[0]);
        write_single_distance_code(writer);
        writer.write(1, 0).unwrap();
        writer.write(1, 1).unwrap();
    }

    #[test]
    fn meta_prefix_codes_select_group_per_tile() {
        webpcodec_common_test::init_logger();

        let mut writer = BitBufWriter::new();
        write_meta_prefix_codes(&mut writer, [0, 2]);
        // Group 1 is never selected, but is still coded.
        for argb in [0xff112233, 0xff445566, 0xff778899] {
            write_solid_codes(&mut writer, argb);
        }
        let data = writer.into_bytes().unwrap();

        let image = read_image(&data, 8, 4).unwrap();
        for (index, &pixel) in image.pixels().iter().enumerate() {
            let expected = if index % 8 < 4 { 0xff112233 } else { 0xff778899 };
            assert_eq!(pixel, expected, "pixel {index}");
        }
    }

    #[test]
    fn meta_prefix_code_group_missing() {
        let mut writer = BitBufWriter::new();
        write_meta_prefix_codes(&mut writer, [0, 2]);
        for argb in [0xff112233, 0xff445566] {
            write_solid_codes(&mut writer, argb);
        }
        let data = writer.into_bytes().unwrap();

        let err = read_image(&data, 8, 4).unwrap_err();
        assert_codec_error(err, CodecError::TruncatedStream);
    }

    #[test]
    fn overlapping_copy() {
        let mut writer = BitBufWriter::new();
        writer.write(3, 0).unwrap();
        write_green_code_with_copy(&mut writer);
        write_simple_code(&mut writer, &[0x12]);
        write_simple_code(&mut writer, &[0x34]);
        write_simple_code(&mut writer, &[0xff]);
        write_single_distance_code(&mut writer);
        // A literal, then a copy of two pixels at distance one.
        writer.write(1, 0).unwrap();
        writer.write(1, 1).unwrap();
        let data = writer.into_bytes().unwrap();

        let image = read_image(&data, 1, 3).unwrap();
        assert_eq!(image.pixels(), [0xff120034; 3]);
    }

    #[test]
    fn copy_before_start() {
        let mut writer = BitBufWriter::new();
        writer.write(3, 0).unwrap();
        write_green_code_with_copy(&mut writer);
        write_simple_code(&mut writer, &[0x12]);
        write_simple_code(&mut writer, &[0x34]);
        write_simple_code(&mut writer, &[0xff]);
        write_single_distance_code(&mut writer);
        // A literal, then a copy from one row up, which is before the start of the image.
        writer.write(1, 0).unwrap();
        writer.write(1, 1).unwrap();
        let data = writer.into_bytes().unwrap();

        let err = read_image(&data, 2, 2).unwrap_err();
        assert_codec_error(err, CodecError::InvalidBackReference);
    }

    #[test]
    fn copy_past_end() {
        let mut writer = BitBufWriter::new();
        writer.write(3, 0).unwrap();
        write_green_code_with_copy(&mut writer);
        write_simple_code(&mut writer, &[0x12]);
        write_simple_code(&mut writer, &[0x34]);
        write_simple_code(&mut writer, &[0xff]);
        write_single_distance_code(&mut writer);
        writer.write(1, 0).unwrap();
        writer.write(1, 1).unwrap();
        let data = writer.into_bytes().unwrap();

        let err = read_image(&data, 1, 2).unwrap_err();
        assert_codec_error(err, CodecError::InvalidBackReference);
    }

    #[test]
    fn duplicate_transform() {
        let mut writer = BitBufWriter::new();
        for _ in 0..2 {
            writer.write_bit(true).unwrap();
            writer.write(2, TransformType::SubtractGreen as u32).unwrap();
        }
        writer.write(3, 0).unwrap();
        write_solid_codes(&mut writer, 0xff000000);
        let data = writer.into_bytes().unwrap();

        let err = read_image(&data, 1, 1).unwrap_err();
        assert_codec_error(err, CodecError::TransformDecode);
    }

    #[test]
    fn invalid_predictor_mode() {
        let mut writer = BitBufWriter::new();
        writer.write_bit(true).unwrap();
        writer.write(2, TransformType::Predictor as u32).unwrap();
        writer.write(3, 0).unwrap();
        writer.write(1, 0).unwrap();
        write_solid_codes(&mut writer, 0xff000e00);
        writer.write(3, 0).unwrap();
        write_solid_codes(&mut writer, 0xff000000);
        let data = writer.into_bytes().unwrap();

        let err = read_image(&data, 1, 1).unwrap_err();
        assert_codec_error(err, CodecError::TransformDecode);
    }

    #[test]
    fn over_subscribed_code_length_code() {
        let mut writer = BitBufWriter::new();
        writer.write(3, 0).unwrap();
        writer.write_bit(false).unwrap();
        writer.write(4, 0).unwrap();
        for _ in 0..4 {
            writer.write(3, 1).unwrap();
        }
        writer.write(8, 0).unwrap();
        let data = writer.into_bytes().unwrap();

        let err = read_image(&data, 1, 1).unwrap_err();
        assert_codec_error(err, CodecError::InvalidHuffmanTable);
    }

    #[test]
    fn simple_code_symbol_out_of_range() {
        let mut writer = BitBufWriter::new();
        writer.write(3, 0).unwrap();
        write_simple_code(&mut writer, &[0]);
        write_simple_code(&mut writer, &[0]);
        write_simple_code(&mut writer, &[0]);
        write_simple_code(&mut writer, &[0]);
        write_simple_code(&mut writer, &[NUM_DISTANCE_CODES]);
        let data = writer.into_bytes().unwrap();

        let err = read_image(&data, 1, 1).unwrap_err();
        assert_codec_error(err, CodecError::InvalidHuffmanTable);
    }

    #[test]
    fn invalid_color_cache_bits() {
        let mut writer = BitBufWriter::new();
        writer.write(1, 0).unwrap();
        writer.write(1, 1).unwrap();
        writer.write(4, 12).unwrap();
        let data = writer.into_bytes().unwrap();

        let err = read_image(&data, 1, 1).unwrap_err();
        assert_codec_error(err, CodecError::InvalidHuffmanTable);
    }

    #[test]
    fn truncated() {
        let err = read_image(&[], 1, 1).unwrap_err();
        assert_codec_error(err, CodecError::TruncatedStream);
    }
}
