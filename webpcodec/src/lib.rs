#![warn(missing_docs)]

//! `webpcodec` is a lossless WebP (VP8L) encoder and decoder.
//!
//! # Usage
//!
//! The main entry points are [`decode`], which turns a WebP file held in memory into an RGBA [`Image`], and [`encode`],
//! which does the reverse given a [`Config`]. Encoding is always lossless; with [`Config::exact`] set, a round trip
//! reproduces every byte of the input image.
//!
//! ```
//! let red = webpcodec::Image::new(1, 1, vec![255, 0, 0, 255])?;
//! let webp = webpcodec::encode(&red, &webpcodec::Config::default())?;
//! assert_eq!(&webp[..4], b"RIFF");
//! assert_eq!(webpcodec::decode(&webp)?, red);
//! # Ok::<(), webpcodec::Error>(())
//! ```
//!
//! [`decode_async`], [`encode_async`], [`decode_reader`], and [`encode_writer`] wrap the in-memory API for
//! asynchronous and blocking streams.
//!
//! The [`parse`] and [`encode`](mod@encode) modules also contain a less stable and sparsely documented API which can
//! be used to parse container chunks and to work with VP8L bitstreams directly.

pub mod encode;
pub mod parse;

mod adapter;
mod color_cache;
mod context;
mod error;
mod huffman;
mod image;
mod lz77;
mod reader;
mod transform;
mod writer;

#[cfg(test)]
mod util;

use std::num::NonZeroU32;

use derive_builder::Builder;
use derive_more::Display;
use webpcodec_common::error::WhileParsingType;
use webpcodec_common::{bail_attach, ensure_attach, InputSpan, ResultExt};

use crate::error::{CodecResultExt, ExpectedChunk, WhileParsingChunk};
use crate::parse::chunk_type::{ANIM, ANMF, RIFF, VP8, VP8L, VP8X};
use crate::parse::{ChunkHeader, ParseChunk, RiffPrim, Vp8lChunk, Vp8xChunk, Vp8xFlags, WebpChunk};
use crate::reader::ChunkReader;

//
// public types
//

/// Error type returned by `webpcodec`.
pub type Error = webpcodec_common::error::Error<CodecError>;

pub use adapter::{decode_async, decode_reader, encode_async, encode_writer};
pub use context::CodecContext;
pub use error::CodecError;
pub use image::Image;
pub use webpcodec_common::Report;
pub use writer::write_container;

#[derive(Builder, Clone, Debug, PartialEq, Eq)]
#[builder(build_fn(name = "try_build", private))]
/// Configuration for the WebP encoder.
///
/// Every option has a fixed default; values outside an option's range are clamped when encoding.
pub struct Config {
    /// Encoding effort in `0..=100`, controlling how hard backward references and color caches are searched for.
    ///
    /// The output is lossless at every quality. The default is `100`.
    #[builder(default = "100")]
    pub quality: u8,

    /// Encoding method in `0..=6`, controlling transform selection.
    ///
    /// Method `0` never uses the predictor transform, and methods `5` and `6` encode several transform combinations,
    /// keeping the smallest. The default is `4`.
    #[builder(default = "4")]
    pub method: u8,

    /// Whether to encode losslessly.
    ///
    /// Only lossless encoding is supported, so `false` is logged and otherwise ignored. The default is `true`.
    #[builder(default = "true")]
    pub lossless: bool,

    /// Whether to preserve the color of fully transparent pixels.
    ///
    /// When `false`, fully transparent pixels are encoded as transparent black. The default is `false`.
    #[builder(default)]
    pub exact: bool,

    /// Near-lossless preprocessing level in `0..=100`.
    ///
    /// Levels below `100` quantize pixels away from smooth regions before encoding, trading exactness for size; `100`
    /// is exact. The default is `100`.
    #[builder(default = "100")]
    pub near_lossless: u8,

    /// Whether to use delta palettization.
    ///
    /// Accepted for compatibility, with no effect. The default is `false`.
    #[builder(default)]
    pub use_delta_palette: bool,
}

/// The kind of image data held by a WebP file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
pub enum ImageFormat {
    /// A `VP8L` lossless bitstream.
    #[display(fmt = "lossless")]
    Lossless,

    /// A `VP8 ` lossy bitstream.
    #[display(fmt = "lossy")]
    Lossy,
}

/// The image data of a WebP file located by [`parse_container`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Container<'a> {
    /// The format of [`payload`](Self::payload).
    pub format: ImageFormat,

    /// The data of the `VP8L` or `VP8 ` chunk.
    pub payload: &'a [u8],

    /// The span of the image data chunk in the input, header included.
    pub span: InputSpan,

    /// The `VP8X` chunk of an extended format file.
    pub vp8x: Option<Vp8xChunk>,
}

/// Maximum file length as permitted by WebP.
pub const MAX_FILE_LEN: u32 = u32::MAX - 2;

//
// private types
//

#[derive(Clone, Copy, Debug, Display)]
#[display(fmt = "frame dimensions `{_0}`x`{_1}` do not match canvas dimensions `{_2}`x`{_3}`")]
struct FrameDimensionsMismatch(NonZeroU32, NonZeroU32, NonZeroU32, NonZeroU32);

#[derive(Clone, Copy, Debug, Display)]
#[display(fmt = "multiple `{_0}` chunks")]
struct MultipleChunks(webpcodec_common::parse::FourCC);

//
// public functions
//

/// Force the process-wide [`CodecContext`] to be initialized now rather than on first use.
///
/// Calling this more than once, or from several threads at once, is harmless.
pub fn load() -> &'static CodecContext {
    CodecContext::get()
}

/// Decode a lossless WebP file.
///
/// See the [module-level documentation](self) for usage examples.
///
/// # Errors
///
/// If the input is not a well-formed lossless WebP file, an [`Error`] is returned. No partially decoded image is ever
/// returned.
pub fn decode(input: &[u8]) -> Result<Image, Error> {
    let Container { format, mut payload, span, vp8x } = parse_container(input)?;
    ensure_attach!(
        format == ImageFormat::Lossless,
        CodecError::UnsupportedFormat,
        "lossy image data",
        WhileParsingChunk(VP8),
    );

    let vp8l = Vp8lChunk::parse(&mut payload).while_parsing_chunk(VP8L)?;
    let (width, height) = (vp8l.width(), vp8l.height());
    if let Some(vp8x) = vp8x {
        ensure_attach!(
            (width, height) == (vp8x.canvas_width(), vp8x.canvas_height()),
            CodecError::MalformedContainer,
            FrameDimensionsMismatch(width, height, vp8x.canvas_width(), vp8x.canvas_height()),
            WhileParsingType::new::<Vp8lChunk>(),
        );
    }

    let image = vp8l.decode_image_data(payload).while_parsing_chunk(VP8L)?;
    log::info!(
        "decoded {width}x{height} image from {name} @ 0x{offset:08x}",
        name = VP8L,
        offset = span.offset,
    );
    Ok(Image::from_argb(width, height, image.pixels()))
}

/// Encode `image` as a lossless WebP file, with the given [`Config`].
///
/// See the [module-level documentation](self) for usage examples.
///
/// # Errors
///
/// If the image's dimensions are outside `1..=`[`Image::MAX_DIMENSION`] or its data does not hold exactly four bytes
/// per pixel, [`CodecError::InvalidImage`] is returned.
pub fn encode(image: &Image, config: &Config) -> Result<Vec<u8>, Error> {
    encode_with_context(CodecContext::get(), image, config)
}

/// Locate the image data of a WebP file.
///
/// Both simple and extended format files are accepted. Metadata chunks are skipped, as are any chunks following the
/// image data and any bytes following the `RIFF` chunk.
///
/// # Errors
///
/// If the input is not a RIFF file, or its chunks are truncated or out of place, [`CodecError::MalformedContainer`] is
/// returned. If the input is a RIFF file of a form other than `WEBP`, or an animated WebP file,
/// [`CodecError::UnsupportedFormat`] is returned.
pub fn parse_container(input: &[u8]) -> Result<Container<'_>, Error> {
    ensure_attach!(!input.is_empty(), CodecError::MalformedContainer, "empty input");

    let mut file_reader = ChunkReader::new(input, RIFF);
    ensure_attach!(
        file_reader.peek_header()? == Some(RIFF),
        CodecError::MalformedContainer,
        ExpectedChunk(RIFF),
    );

    // The form type is checked ahead of the RIFF size, so that other RIFF formats are reported as unsupported.
    let form_type = input.get(ChunkHeader::ENCODED_LEN as usize..).unwrap_or_default();
    let WebpChunk = WebpChunk::parse(form_type).while_parsing_chunk(RIFF)?;

    let InputSpan { offset, len } = file_reader.read_header(RIFF)?;
    let WebpChunk = file_reader.parse_data()?;

    ensure_attach!(
        len <= MAX_FILE_LEN.into(),
        CodecError::MalformedContainer,
        WhileParsingChunk(RIFF)
    );

    if file_reader.has_remaining() {
        log::warn!("ignoring {} bytes of trailing data", file_reader.remaining_len());
    }

    let mut reader = file_reader.child_reader();

    log::info!("{name} @ 0x{offset:08x}: {len} bytes", name = RIFF);

    let (name, span @ InputSpan { offset, len }) =
        reader.read_any_header().attach_printable("while parsing first chunk")?;
    let container = match name {
        VP8 => {
            log::info!("{name} @ 0x{offset:08x}: {len} bytes");
            Container { format: ImageFormat::Lossy, payload: reader.data(), span, vp8x: None }
        }
        VP8L => {
            log::info!("{name} @ 0x{offset:08x}: {len} bytes");
            Container { format: ImageFormat::Lossless, payload: reader.data(), span, vp8x: None }
        }
        VP8X => {
            let vp8x @ Vp8xChunk { flags, .. } = reader.parse_data()?;
            let (width, height) = (vp8x.canvas_width(), vp8x.canvas_height());
            log::info!("{name} @ 0x{offset:08x}: {width}x{height}, flags {flags:08b}");

            parse_extended(&mut reader, vp8x)?
        }
        _ => {
            log::info!("{name} @ 0x{offset:08x}: {len} bytes");
            bail_attach!(
                CodecError::MalformedContainer,
                "expected image data or VP8X",
                WhileParsingChunk(name),
            );
        }
    };

    // Many WebP files carry informational chunks after the image data; they are not needed for decoding.
    while reader.has_remaining() {
        match reader.read_any_header() {
            Ok((name, InputSpan { offset, len })) => log::info!("{name} @ 0x{offset:08x}: {len} bytes, ignored"),
            Err(err) => {
                log::warn!("ignoring malformed chunks after image data: {err}");
                break;
            }
        }
    }

    Ok(container)
}

//
// private functions
//

pub(crate) fn encode_with_context(context: &CodecContext, image: &Image, config: &Config) -> Result<Vec<u8>, Error> {
    let (width, height) = image.dimensions()?;
    if !config.lossless {
        log::warn!("lossy encoding is not supported, encoding losslessly");
    }

    let mut pixels = image.to_argb();
    if !config.exact {
        for pixel in &mut pixels {
            if transform::alpha(*pixel) == 0 {
                *pixel = 0;
            }
        }
    }

    let payload = encode::encode_argb(context, &pixels, width, height, config)?;
    let output = write_container(&payload)?;
    log::info!("encoded {width}x{height} image: {} bytes", output.len());
    Ok(output)
}

fn parse_extended<'a>(reader: &mut ChunkReader<'a>, vp8x: Vp8xChunk) -> Result<Container<'a>, Error> {
    ensure_attach!(
        !vp8x.flags.contains(Vp8xFlags::IS_ANIMATED),
        CodecError::UnsupportedFormat,
        "animated image",
        WhileParsingChunk(VP8X),
    );

    loop {
        ensure_attach!(reader.has_remaining(), CodecError::MalformedContainer, ExpectedChunk(VP8L));
        let (name, span @ InputSpan { offset, len }) = reader.read_any_header()?;
        log::info!("{name} @ 0x{offset:08x}: {len} bytes");
        match name {
            VP8 => return Ok(Container { format: ImageFormat::Lossy, payload: reader.data(), span, vp8x: Some(vp8x) }),
            VP8L => {
                let payload = reader.data();
                return Ok(Container { format: ImageFormat::Lossless, payload, span, vp8x: Some(vp8x) });
            }
            ANIM | ANMF => bail_attach!(CodecError::UnsupportedFormat, "animated image", WhileParsingChunk(name)),
            VP8X => bail_attach!(CodecError::MalformedContainer, MultipleChunks(name)),
            _ => {}
        }
    }
}

//
// Config impls
//

impl Config {
    /// Construct a builder for `Config`.
    ///
    /// See the documentation for [`ConfigBuilder`].
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::builder().build()
    }
}

//
// ConfigBuilder impls
//

impl ConfigBuilder {
    /// Build a new [`Config`].
    ///
    /// Building cannot fail: every field of [`Config`] carries a `#[builder(default)]`, so the generated builder never
    /// reports an uninitialized field, and no field has a validator. Options left unset take their documented default.
    pub fn build(&self) -> Config {
        self.try_build()
            .unwrap_or_else(|err| unreachable!("every config option has a default: {err}"))
    }

    /// Set an option by name from an integer value, as in a loosely-typed option set.
    ///
    /// Numeric options are clamped to their range, and boolean options are `true` for any non-zero value. Any name
    /// which is not a [`Config`] option is ignored.
    pub fn option(&mut self, name: &str, value: i64) -> &mut Self {
        let percent = value.clamp(0, 100) as u8;
        match name {
            "quality" => self.quality(percent),
            "method" => self.method(value.clamp(0, 6) as u8),
            "lossless" => self.lossless(value != 0),
            "exact" => self.exact(value != 0),
            "near_lossless" => self.near_lossless(percent),
            "use_delta_palette" => self.use_delta_palette(value != 0),
            _ => {
                log::debug!("ignoring unrecognized option `{name}` = {value}");
                self
            }
        }
    }
}

#[cfg(doctest)]
#[doc = include_str!("../README.md")]
pub mod readme {}
