use std::num::NonZeroU32;

use derive_more::Display;
use webpcodec_common::{ensure_attach, ensure_matches_attach, Result};

use crate::parse::Vp8lChunk;
use crate::transform::{alpha, argb, blue, green, red};
use crate::CodecError;

/// An RGBA image with 8 bits per channel.
#[derive(Clone, PartialEq, Eq)]
pub struct Image {
    /// The width of the image, in pixels.
    pub width: u32,

    /// The height of the image, in pixels.
    pub height: u32,

    /// The pixels of the image, row-major and top to bottom, as red, green, blue, and alpha bytes.
    pub data: Vec<u8>,
}

#[derive(Clone, Copy, Debug, Display)]
#[display(fmt = "image dimensions `{_0}`x`{_1}` outside of `1..={}`", "Image::MAX_DIMENSION")]
struct InvalidDimensions(u32, u32);

#[derive(Clone, Copy, Debug, Display)]
#[display(fmt = "pixel data length `{_0}` != `{_1}`")]
struct DataLengthMismatch(usize, u64);

const BYTES_PER_PIXEL: usize = 4;

//
// Image impls
//

impl Image {
    /// The largest supported width or height.
    pub const MAX_DIMENSION: u32 = Vp8lChunk::MAX_DIMENSION;

    /// Construct a new image, validating it with [`validate`](Self::validate).
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self, CodecError> {
        let image = Self { width, height, data };
        image.validate()?;
        Ok(image)
    }

    /// Check that the image dimensions are within `1..=`[`MAX_DIMENSION`](Self::MAX_DIMENSION) and that `data`
    /// holds exactly four bytes per pixel.
    ///
    /// Fails with [`CodecError::InvalidImage`] otherwise.
    pub fn validate(&self) -> Result<(), CodecError> {
        self.dimensions().map(drop)
    }

    /// The validated dimensions of the image.
    pub(crate) fn dimensions(&self) -> Result<(NonZeroU32, NonZeroU32), CodecError> {
        let Self { width, height, ref data } = *self;
        ensure_matches_attach!(
            (NonZeroU32::new(width), NonZeroU32::new(height)),
            (Some(nonzero_width), Some(nonzero_height)),
            CodecError::InvalidImage,
            InvalidDimensions(width, height),
        );
        ensure_attach!(
            width <= Self::MAX_DIMENSION && height <= Self::MAX_DIMENSION,
            CodecError::InvalidImage,
            InvalidDimensions(width, height),
        );
        let expected_len = u64::from(width) * u64::from(height) * BYTES_PER_PIXEL as u64;
        ensure_attach!(
            data.len() as u64 == expected_len,
            CodecError::InvalidImage,
            DataLengthMismatch(data.len(), expected_len),
        );
        Ok((nonzero_width, nonzero_height))
    }

    /// The pixels as packed `0xAARRGGBB` words.
    pub(crate) fn to_argb(&self) -> Vec<u32> {
        self.data
            .chunks_exact(BYTES_PER_PIXEL)
            .map(|rgba| argb(rgba[3], rgba[0], rgba[1], rgba[2]))
            .collect()
    }

    pub(crate) fn from_argb(width: NonZeroU32, height: NonZeroU32, pixels: &[u32]) -> Self {
        let data = pixels
            .iter()
            .flat_map(|&pixel| [red(pixel), green(pixel), blue(pixel), alpha(pixel)])
            .collect();
        Self { width: width.get(), height: height.get(), data }
    }
}

impl std::fmt::Debug for Image {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Self { width, height, data } = self;
        f.debug_struct("Image")
            .field("width", width)
            .field("height", height)
            .field("data", &format_args!("[{} bytes]", data.len()))
            .finish()
    }
}

#[cfg(test)]
mod test {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn argb_conversion() {
        let image = Image::new(2, 1, vec![1, 2, 3, 4, 0xff, 0, 0, 0x80]).unwrap();
        let pixels = image.to_argb();
        assert_eq!(pixels, [0x04010203, 0x80ff0000]);
        let (width, height) = image.dimensions().unwrap();
        assert_eq!(Image::from_argb(width, height, &pixels), image);
    }

    #[test]
    fn invalid_images() {
        let invalid = |width, height, len| Image::new(width, height, vec![0; len]).map_err(|err| err.into_inner());
        assert_matches!(invalid(0, 1, 0), Err(CodecError::InvalidImage));
        assert_matches!(invalid(1, 0, 0), Err(CodecError::InvalidImage));
        assert_matches!(invalid(16385, 1, 16385 * 4), Err(CodecError::InvalidImage));
        assert_matches!(invalid(2, 2, 15), Err(CodecError::InvalidImage));
        assert_matches!(invalid(2, 2, 17), Err(CodecError::InvalidImage));
        assert_matches!(invalid(16384, 1, 16384 * 4), Ok(_));
    }
}
