#![allow(missing_docs)]

use std::num::NonZeroU32;

use bytes::{Buf, BufMut};
use webpcodec_common::parse::FourCC;
use webpcodec_common::{ensure_attach, ensure_matches_attach, Result};

use crate::error::CodecResultExt;
use crate::CodecError;

use super::chunk_type::VP8X;
use super::{OneBasedU24, ParseChunk, ParsedChunk, Reserved, RiffFlags, RiffPrim};

/// The header of an extended format WebP file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Vp8xChunk {
    pub flags: Vp8xFlags,
    reserved: Reserved<3>,
    canvas_width: OneBasedU24,
    canvas_height: OneBasedU24,
}

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
    pub struct Vp8xFlags: u8 {
        const HAS_ICCP_CHUNK = 0b0010_0000;
        const HAS_ALPH_CHUNK = 0b0001_0000;
        const HAS_EXIF_CHUNK = 0b0000_1000;
        const HAS_XMP_CHUNK = 0b0000_0100;
        const IS_ANIMATED = 0b0000_0010;
    }
}

//
// Vp8xChunk impls
//

impl Vp8xChunk {
    pub fn new(flags: Vp8xFlags, canvas_width: NonZeroU32, canvas_height: NonZeroU32) -> Result<Self, CodecError> {
        ensure_matches_attach!(
            (OneBasedU24::new(canvas_width), OneBasedU24::new(canvas_height)),
            (Some(canvas_width), Some(canvas_height)),
            CodecError::InvalidImage,
            "canvas dimensions too large",
        );
        Ok(Self { flags, reserved: Reserved::default(), canvas_width, canvas_height })
    }

    pub fn canvas_width(&self) -> NonZeroU32 {
        self.canvas_width.get()
    }

    pub fn canvas_height(&self) -> NonZeroU32 {
        self.canvas_height.get()
    }
}

impl ParseChunk for Vp8xChunk {
    const NAME: FourCC = VP8X;

    const ENCODED_LEN: u32 =
        Vp8xFlags::ENCODED_LEN + Reserved::<3>::ENCODED_LEN + OneBasedU24::ENCODED_LEN + OneBasedU24::ENCODED_LEN;

    fn parse<B: Buf>(mut buf: B) -> Result<Self, CodecError> {
        let flags = Vp8xFlags::parse(&mut buf).while_parsing_field(Self::NAME, "flags")?;
        let reserved = Reserved::parse(&mut buf).while_parsing_field(Self::NAME, "reserved")?;
        let canvas_width = OneBasedU24::parse(&mut buf).while_parsing_field(Self::NAME, "canvas_width")?;
        let canvas_height = OneBasedU24::parse(&mut buf).while_parsing_field(Self::NAME, "canvas_height")?;
        ensure_attach!(
            canvas_height.get().checked_mul(canvas_width.get()).is_some(),
            CodecError::MalformedContainer,
            "canvas pixel count overflow",
        );
        Ok(Self { flags, reserved, canvas_width, canvas_height })
    }
}

impl ParsedChunk for Vp8xChunk {
    fn put_buf(&self, mut buf: &mut dyn BufMut) {
        let Self { flags, reserved, canvas_width, canvas_height } = self;
        flags.put_buf(&mut buf);
        reserved.put_buf(&mut buf);
        canvas_width.put_buf(&mut buf);
        canvas_height.put_buf(&mut buf);
    }
}

//
// Vp8xFlags impls
//

impl RiffFlags for Vp8xFlags {}

#[cfg(test)]
mod test {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn round_trip() {
        let flags = Vp8xFlags::HAS_ICCP_CHUNK | Vp8xFlags::HAS_XMP_CHUNK;
        let chunk = Vp8xChunk::new(flags, NonZeroU32::new(640).unwrap(), NonZeroU32::new(480).unwrap()).unwrap();
        let mut out = Vec::new();
        chunk.put_buf(&mut out);
        assert_eq!(out.len(), Vp8xChunk::ENCODED_LEN as usize);
        assert_eq!(out, [0x24, 0, 0, 0, 0x7f, 0x02, 0x00, 0xdf, 0x01, 0x00]);
        assert_eq!(Vp8xChunk::parse(&out[..]).unwrap(), chunk);
    }

    #[test]
    fn invalid_flags() {
        let data = [0x01, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        assert_matches!(Vp8xChunk::parse(&data[..]).map_err(|err| err.into_inner()), Err(CodecError::MalformedContainer));
        let data = [0x00, 0, 1, 0, 0, 0, 0, 0, 0, 0];
        assert_matches!(Vp8xChunk::parse(&data[..]).map_err(|err| err.into_inner()), Err(CodecError::MalformedContainer));
    }

    #[test]
    fn overflowing_canvas() {
        let data = [0x00, 0, 0, 0, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff];
        assert_matches!(Vp8xChunk::parse(&data[..]).map_err(|err| err.into_inner()), Err(CodecError::MalformedContainer));
    }
}
