//! Error types returned by `webpcodec`.

use std::fmt::{Debug, Display};
use std::result::Result as StdResult;

use derive_more::Display;
use webpcodec_common::error::ReportableError;
use webpcodec_common::parse::FourCC;
use webpcodec_common::{Result, ResultExt};

use crate::Error;

/// Error type returned by the WebP codec.
///
/// While the API of this error type is currently considered unstable, it is more stably guaranteed to implement
/// [`Display`] + [`Debug`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// The input is not a well-formed RIFF file, or a chunk extends past the end of the input.
    #[error("Malformed container")]
    MalformedContainer,

    /// The input is a well-formed container holding something other than a still lossless WebP image.
    #[error("Unsupported format")]
    UnsupportedFormat,

    /// The VP8L bitstream ended before the image was fully decoded.
    #[error("Truncated stream")]
    TruncatedStream,

    /// A prefix code in the VP8L bitstream is over-subscribed, incomplete, or otherwise malformed.
    #[error("Invalid Huffman table")]
    InvalidHuffmanTable,

    /// The encoder tried to write a symbol which has no code in its prefix code.
    #[error("Unknown symbol")]
    UnknownSymbol,

    /// A backward reference points before the start of the image, or copies past its end.
    #[error("Invalid back-reference")]
    InvalidBackReference,

    /// The side data of a transform is malformed.
    #[error("Invalid transform data")]
    TransformDecode,

    /// The image passed to the encoder has invalid dimensions or a mismatched pixel buffer.
    #[error("Invalid image")]
    InvalidImage,
}

pub(crate) trait CodecResultExt: ResultExt + Sized {
    fn while_parsing_chunk(self, chunk_type: FourCC) -> Self {
        self.attach_printable(WhileParsingChunk(chunk_type))
    }

    fn while_parsing_field<T>(self, chunk_type: FourCC, field_name: T) -> Self
    where
        T: Display + Debug + Send + Sync + 'static,
    {
        self.attach_printable(WhileParsingField(chunk_type, field_name))
    }
}

#[derive(Clone, Copy, Debug, Display)]
#[display(fmt = "expected `{}` chunk", _0)]
pub(crate) struct ExpectedChunk(pub(crate) FourCC);

#[derive(Clone, Copy, Debug, Display)]
#[display(fmt = "while parsing `{}` chunk", _0)]
pub(crate) struct WhileParsingChunk(pub(crate) FourCC);

#[derive(Clone, Copy, Debug, Display)]
#[display(fmt = "while parsing `{}` chunk field `{}`", _0, _1)]
pub(crate) struct WhileParsingField<T>(pub(crate) FourCC, pub(crate) T);

impl ReportableError for CodecError {
    #[cfg(feature = "error-detail")]
    type Stack = webpcodec_common::error::ReportStack;
    #[cfg(not(feature = "error-detail"))]
    type Stack = webpcodec_common::error::NullReportStack;
}

impl<T> CodecResultExt for Result<T, CodecError> {}

impl<T> CodecResultExt for StdResult<T, Error> {}
