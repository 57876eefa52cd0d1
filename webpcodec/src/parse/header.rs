use bytes::{Buf, BufMut};
use webpcodec_common::error::WhileParsingType;
use webpcodec_common::{ensure_attach, Result};

use crate::CodecError;

use super::{FourCC, ParseChunk, ParsedChunk, RiffPrim};

#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkHeader {
    pub name: FourCC,
    pub len: u32,
}

/// The form type following the `RIFF` chunk header.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WebpChunk;

macro_rules! chunk_type {
    ($($code:ident),+ $(,)?) => {
        #[allow(missing_docs)]
        pub mod chunk_type {
            use super::*;
            $(
                #[doc = concat!("The `", stringify!($code), "` chunk type.")]
                pub const $code: FourCC = FourCC::from_str(stringify!($code));
            )+
        }
    };
}

chunk_type!(ALPH, ANIM, ANMF, EXIF, ICCP, RIFF, VP8, VP8L, VP8X, XMP);

//
// ChunkHeader impls
//

#[allow(missing_docs)]
impl ChunkHeader {
    pub fn padded(&self) -> bool {
        // RIFF chunks are padded to an even length
        self.len % 2 == 1
    }

    /// The length of the chunk's data including its pad byte, if any.
    pub fn padded_len(&self) -> u64 {
        u64::from(self.len) + u64::from(self.padded())
    }
}

impl RiffPrim for ChunkHeader {
    const ENCODED_LEN: u32 = 8;

    fn parse<B: Buf>(mut buf: B) -> Result<Self, CodecError> {
        ensure_attach!(
            buf.remaining() >= Self::ENCODED_LEN as usize,
            CodecError::MalformedContainer,
            WhileParsingType::new::<Self>()
        );

        let name = FourCC::parse(&mut buf);
        let len = buf.get_u32_le();
        Ok(Self { name, len })
    }

    fn put_buf<B: BufMut>(&self, mut buf: B) {
        self.name.put_buf(&mut buf);
        buf.put_u32_le(self.len);
    }
}

//
// WebpChunk impls
//

#[allow(missing_docs)]
impl WebpChunk {
    pub const WEBP: FourCC = FourCC::from_str("WEBP");
}

impl ParseChunk for WebpChunk {
    const ENCODED_LEN: u32 = FourCC::ENCODED_LEN;
    const NAME: FourCC = chunk_type::RIFF;

    fn parse<B: Buf>(mut input: B) -> Result<Self, CodecError> {
        let name = <FourCC as RiffPrim>::parse(&mut input)?;

        ensure_attach!(
            name == Self::WEBP,
            CodecError::UnsupportedFormat,
            "not a WebP file",
            WhileParsingType::new::<Self>(),
        );

        Ok(Self)
    }
}

impl ParsedChunk for WebpChunk {
    fn put_buf(&self, out: &mut dyn BufMut) {
        Self::WEBP.put_buf(out);
    }
}
