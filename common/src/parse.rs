//! Primitive types shared by the `webpcodec` parsers.

mod fourcc;

pub use fourcc::FourCC;
