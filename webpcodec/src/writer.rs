use bytes::BufMut;
use webpcodec_common::ensure_attach;
use webpcodec_common::error::WhileWritingType;

use crate::parse::chunk_type::{RIFF, VP8L};
use crate::parse::{ChunkHeader, ParseChunk, ParsedChunk, RiffPrim, WebpChunk};
use crate::{CodecError, Error, MAX_FILE_LEN};

/// Wrap a VP8L bitstream in a simple format WebP file: a `RIFF` header, the `WEBP` form type, and one `VP8L` chunk.
///
/// Fails with [`CodecError::InvalidImage`] if the file would be too large for the `RIFF` size field.
pub fn write_container(payload: &[u8]) -> Result<Vec<u8>, Error> {
    let chunk_header = ChunkHeader { name: VP8L, len: payload.len().try_into().unwrap_or(u32::MAX) };
    let riff_len = u64::from(WebpChunk::ENCODED_LEN) + u64::from(ChunkHeader::ENCODED_LEN) + chunk_header.padded_len();
    ensure_attach!(
        riff_len <= u64::from(MAX_FILE_LEN),
        CodecError::InvalidImage,
        "encoded image too large for a WebP file",
        WhileWritingType::new::<WebpChunk>(),
    );
    let riff_header = ChunkHeader { name: RIFF, len: riff_len as u32 };

    let mut output = Vec::with_capacity(ChunkHeader::ENCODED_LEN as usize + riff_len as usize);
    riff_header.put_buf(&mut output);
    WebpChunk.put_buf(&mut output);
    chunk_header.put_buf(&mut output);
    output.put_slice(payload);
    if chunk_header.padded() {
        output.put_u8(0);
    }
    Ok(output)
}
