//! Stream adapters over the in-memory codec.

use std::io::{Read, Write};

use futures_util::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::{decode, encode, Config, Error, Image};

/// Decode a WebP file read to the end from an asynchronous `input`.
///
/// # Errors
///
/// If the input cannot be decoded, or an IO error occurs, an [`Error`] is returned.
pub async fn decode_async<R: AsyncRead + Unpin>(mut input: R) -> Result<Image, Error> {
    let mut data = Vec::new();
    input.read_to_end(&mut data).await?;
    decode(&data)
}

/// Encode `image` and write the WebP file to an asynchronous `output`, flushing it afterwards.
///
/// # Errors
///
/// If the image cannot be encoded, or an IO error occurs, an [`Error`] is returned.
pub async fn encode_async<W: AsyncWrite + Unpin>(image: &Image, config: &Config, mut output: W) -> Result<(), Error> {
    let data = encode(image, config)?;
    output.write_all(&data).await?;
    output.flush().await?;
    Ok(())
}

/// Decode a WebP file read to the end from `input`.
///
/// # Errors
///
/// If the input cannot be decoded, or an IO error occurs, an [`Error`] is returned.
pub fn decode_reader<R: Read>(mut input: R) -> Result<Image, Error> {
    let mut data = Vec::new();
    input.read_to_end(&mut data)?;
    decode(&data)
}

/// Encode `image` and write the WebP file to `output`, flushing it afterwards.
///
/// # Errors
///
/// If the image cannot be encoded, or an IO error occurs, an [`Error`] is returned.
pub fn encode_writer<W: Write>(image: &Image, config: &Config, mut output: W) -> Result<(), Error> {
    let data = encode(image, config)?;
    output.write_all(&data)?;
    output.flush()?;
    Ok(())
}
