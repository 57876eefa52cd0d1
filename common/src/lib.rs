#![warn(missing_docs)]

//! `webpcodec-common` is a common library shared by the `webpcodec` crates.

#[macro_use]
pub mod macros;

pub mod error;
pub mod parse;
pub mod util;

//
// public types
//

pub use error::{Error, Report, Result, ResultExt};

/// A pointer to a span in the given input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct InputSpan {
    /// The offset from the beginning of the input where the span begins.
    pub offset: u64,

    /// The length of the span.
    pub len: u64,
}

//
// InputSpan impls
//

impl InputSpan {
    /// Returns the offset one past the end of the span.
    pub fn end(&self) -> u64 {
        self.offset.saturating_add(self.len)
    }
}
