//! `webpcodec` testing library.
//!
//! This crate is separate from `webpcodec` to workaround cargo's inability to specify optional dev-dependencies (see
//! rust-lang/cargo#1596).

#[cfg(feature = "libwebp")]
pub mod libwebp;

//
// public types
//

/// An RGBA image decoded by a reference decoder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReferenceImage {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

//
// public functions
//

/// Decode `data` using `libwebp`, verifying that it cannot be decoded.
#[cfg_attr(not(feature = "libwebp"), allow(unused_variables))]
pub fn libwebp_assert_invalid(data: &[u8]) {
    #[cfg(not(feature = "libwebp"))]
    log::info!("not verifying codec output using libwebp; libwebp feature disabled");
    #[cfg(feature = "libwebp")]
    libwebp::decode(data)
        .err()
        .unwrap_or_else(|| panic!("libwebp didn't return an error"));
}

/// Decode `data` using `libwebp`, verifying that it decodes to exactly `width`x`height` RGBA pixels `expected`.
#[cfg_attr(not(feature = "libwebp"), allow(unused_variables))]
pub fn libwebp_assert_decodes_to(data: &[u8], width: u32, height: u32, expected: &[u8]) {
    #[cfg(not(feature = "libwebp"))]
    log::info!("not verifying codec output using libwebp; libwebp feature disabled");
    #[cfg(feature = "libwebp")]
    {
        let image = libwebp::decode(data).unwrap_or_else(|error| panic!("libwebp returned an error: {error}"));
        assert_eq!((image.width, image.height), (width, height), "libwebp decoded different dimensions");
        assert!(image.data == expected, "libwebp decoded different pixels");
    }
}

/// Encode RGBA pixels losslessly using `libwebp`, if available.
#[cfg_attr(not(feature = "libwebp"), allow(unused_variables))]
pub fn libwebp_encode(width: u32, height: u32, rgba: &[u8]) -> Option<Vec<u8>> {
    #[cfg(not(feature = "libwebp"))]
    {
        log::info!("not encoding with libwebp; libwebp feature disabled");
        None
    }
    #[cfg(feature = "libwebp")]
    Some(libwebp::encode_lossless(width, height, rgba).unwrap_or_else(|error| panic!("libwebp returned an error: {error}")))
}
