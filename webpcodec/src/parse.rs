//! Unstable API for parsing WebP containers and VP8L bitstreams.

pub(crate) mod bitstream;
mod header;
mod integers;
pub(crate) mod lossless;
mod vp8l;
mod vp8x;

use bytes::{Buf, BufMut};
use webpcodec_common::Result;

use crate::CodecError;

#[allow(missing_docs)]
pub trait ParseChunk: Sized {
    const NAME: FourCC;

    const ENCODED_LEN: u32;

    fn parse<B: Buf>(buf: B) -> Result<Self, CodecError>;
}

#[allow(missing_docs)]
pub trait ParsedChunk {
    fn put_buf(&self, buf: &mut dyn BufMut);
}

pub use bitstream::{BitBufReader, CanonicalHuffmanTree};
pub use header::{chunk_type, ChunkHeader, WebpChunk};
pub use integers::{OneBasedU24, Reserved, RiffFlags, RiffPrim};
pub use lossless::LosslessImage;
pub use vp8l::Vp8lChunk;
pub use vp8x::{Vp8xChunk, Vp8xFlags};

pub use webpcodec_common::parse::FourCC;
