pub mod webp;

use std::fmt::Debug;

use bytes::BufMut;
use webpcodec_common::parse::FourCC;

use crate::parse::chunk_type::VP8X;
use crate::parse::{ChunkHeader, RiffPrim, Vp8xFlags};
use crate::{CodecError, Error};

use self::webp::{TestVp8xSpecBuilder, TestWebpBuilder};

pub fn test_vp8x() -> TestVp8xSpecBuilder {
    Default::default()
}

pub fn test_webp() -> TestWebpBuilder {
    Default::default()
}

/// The [`CodecError`] a decode or encode failed with. Panics on success or on an IO error.
pub fn codec_error<T: Debug>(result: Result<T, Error>) -> CodecError {
    match result {
        Err(Error::Codec(report)) => {
            log::info!("rejected: {report:?}");
            report.into_inner()
        }
        other => panic!("expected codec error, got {other:?}"),
    }
}

/// Append a chunk with a header declaring exactly `data.len()` bytes.
pub fn write_test_chunk(out: &mut Vec<u8>, name: FourCC, data: &[u8]) {
    ChunkHeader { name, len: data.len() as u32 }.put_buf(&mut *out);
    out.extend_from_slice(data);
    if data.len() % 2 == 1 {
        out.put_u8(0);
    }
}

/// Append a `VP8X` chunk. `width` and `height` are stored as-is, minus one, and may hold a canvas which is too large.
pub fn write_test_vp8x(out: &mut Vec<u8>, flags: Vp8xFlags, width: u32, height: u32) {
    let mut data = Vec::with_capacity(10);
    data.put_u8(flags.bits());
    data.put_bytes(0, 3);
    data.put_uint_le(width.into(), 3);
    data.put_uint_le(height.into(), 3);
    write_test_chunk(out, VP8X, &data);
}
