#![allow(missing_docs)]

use std::num::NonZeroU32;
use std::result::Result as StdResult;

use bytes::{Buf, BufMut};
use derive_more::Display;
use webpcodec_common::parse::FourCC;
use webpcodec_common::{ensure_attach, Result};

use crate::{CodecError, Error};

use super::bitstream::BitBufReader;
use super::chunk_type::VP8L;
use super::lossless::LosslessImage;
use super::{ParseChunk, ParsedChunk};

/// The header of a VP8L bitstream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Vp8lChunk {
    width: NonZeroU32,
    height: NonZeroU32,
    /// A hint that some pixel is not fully opaque.
    pub alpha_is_used: bool,
}

//
// private types
//

#[derive(Clone, Copy, Debug, Display)]
#[display(fmt = "invalid VP8L signature `0x{_0:x}` != `0x{:x}`", "Vp8lChunk::SIGNATURE")]
struct InvalidSignature(u8);

#[derive(Clone, Copy, Debug, Display)]
#[display(fmt = "unsupported VP8L version `{_0}`")]
struct UnsupportedVersion(u8);

#[derive(Clone, Copy, Debug, Display)]
#[display(fmt = "dimensions `{_0}`x`{_1}` exceed `{}`", "Vp8lChunk::MAX_DIMENSION")]
struct DimensionsTooLarge(NonZeroU32, NonZeroU32);

const DIMENSION_BITS: u32 = 14;

//
// Vp8lChunk impls
//

impl Vp8lChunk {
    pub const SIGNATURE: u8 = 0x2f;

    /// The largest width or height a VP8L bitstream can code.
    pub const MAX_DIMENSION: u32 = 1 << DIMENSION_BITS;

    pub fn new(width: NonZeroU32, height: NonZeroU32, alpha_is_used: bool) -> Result<Self, CodecError> {
        ensure_attach!(
            width.get() <= Self::MAX_DIMENSION && height.get() <= Self::MAX_DIMENSION,
            CodecError::InvalidImage,
            DimensionsTooLarge(width, height),
        );
        Ok(Self { width, height, alpha_is_used })
    }

    pub fn width(&self) -> NonZeroU32 {
        self.width
    }

    pub fn height(&self) -> NonZeroU32 {
        self.height
    }

    /// Decode the bitstream following this header.
    pub fn decode_image_data(&self, data: &[u8]) -> StdResult<LosslessImage, Error> {
        let mut reader = BitBufReader::new(data);
        let image = LosslessImage::read(&mut reader, self.width, self.height)?;
        let unused_bytes = reader.remaining_bits() / 8;
        if unused_bytes > 0 {
            log::debug!("{unused_bytes} unused bytes after image data");
        }
        Ok(image)
    }
}

impl ParseChunk for Vp8lChunk {
    const NAME: FourCC = VP8L;

    const ENCODED_LEN: u32 = 5;

    fn parse<B: Buf>(mut buf: B) -> Result<Self, CodecError> {
        ensure_attach!(
            buf.remaining() >= Self::ENCODED_LEN as usize,
            CodecError::TruncatedStream,
            "truncated VP8L header",
        );
        let bits = buf.get_uint_le(Self::ENCODED_LEN as usize);
        let field = |offset: u32, len: u32| ((bits >> offset) & ((1 << len) - 1)) as u32;

        let signature = field(0, 8) as u8;
        ensure_attach!(
            signature == Self::SIGNATURE,
            CodecError::MalformedContainer,
            InvalidSignature(signature),
        );

        let width = NonZeroU32::MIN.saturating_add(field(8, DIMENSION_BITS));
        let height = NonZeroU32::MIN.saturating_add(field(8 + DIMENSION_BITS, DIMENSION_BITS));
        let alpha_is_used = field(8 + 2 * DIMENSION_BITS, 1) != 0;
        let version = field(9 + 2 * DIMENSION_BITS, 3) as u8;

        ensure_attach!(version == 0, CodecError::UnsupportedFormat, UnsupportedVersion(version));

        Ok(Self { width, height, alpha_is_used })
    }
}

impl ParsedChunk for Vp8lChunk {
    fn put_buf(&self, buf: &mut dyn BufMut) {
        let Self { width, height, alpha_is_used } = *self;
        let bits = u64::from(Self::SIGNATURE)
            | u64::from(width.get() - 1) << 8
            | u64::from(height.get() - 1) << (8 + DIMENSION_BITS)
            | u64::from(alpha_is_used) << (8 + 2 * DIMENSION_BITS);
        buf.put_uint_le(bits, Self::ENCODED_LEN as usize);
    }
}

#[cfg(test)]
mod test {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn header_bits() {
        let header = Vp8lChunk::parse(&[0x2f, 0x00, 0x00, 0x00, 0x00][..]).unwrap();
        assert_eq!((header.width().get(), header.height().get(), header.alpha_is_used), (1, 1, false));

        let header = Vp8lChunk::new(NonZeroU32::new(16384).unwrap(), NonZeroU32::new(3).unwrap(), true).unwrap();
        let mut out = Vec::new();
        header.put_buf(&mut out);
        assert_eq!(out, [0x2f, 0xff, 0xbf, 0x00, 0x10]);
        assert_eq!(Vp8lChunk::parse(&out[..]).unwrap(), header);
    }

    #[test]
    fn invalid_headers() {
        let parse_err = |bytes: &[u8]| Vp8lChunk::parse(bytes).unwrap_err().into_inner();
        assert_eq!(parse_err(&[0x2e, 0, 0, 0, 0]), CodecError::MalformedContainer);
        assert_eq!(parse_err(&[0x2f, 0, 0, 0, 0x20]), CodecError::UnsupportedFormat);
        assert_eq!(parse_err(&[0x2f, 0, 0]), CodecError::TruncatedStream);
    }

    #[test]
    fn dimensions_bounded() {
        let too_wide = NonZeroU32::new(Vp8lChunk::MAX_DIMENSION + 1).unwrap();
        assert_matches!(
            Vp8lChunk::new(too_wide, NonZeroU32::MIN, false).map_err(|err| err.into_inner()),
            Err(CodecError::InvalidImage)
        );
    }
}
