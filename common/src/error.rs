//! Error types returned by the codec API.
//!
//! Errors are reported as a [`Report`] wrapping a codec-specific error kind, together with a stack of attachments
//! describing what was being parsed or written when the error occurred. Whether the stack is recorded at all is chosen
//! per error kind through [`ReportableError::Stack`].

use std::any::type_name;
use std::fmt;
use std::fmt::{Debug, Display};
use std::io;
use std::panic::Location;
use std::result::Result as StdResult;

//
// public types
//

/// Error type returned by `webpcodec`.
#[derive(Debug, thiserror::Error)]
pub enum Error<E: ReportableError> {
    /// An IO error occurred while reading input from or writing output to a caller-supplied stream.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The input could not be decoded, or the image could not be encoded.
    #[error("Codec error: {0}")]
    Codec(#[from] Report<E>),
}

/// An error kind `E` along with the attachments recorded while it propagated.
///
/// The [`Display`] implementation prints only the error kind; the [`Debug`] implementation also prints where the error
/// was raised and every attachment, innermost first.
#[derive(thiserror::Error)]
#[error("{error}")]
pub struct Report<E: ReportableError> {
    #[source]
    error: E,
    stack: E::Stack,
}

/// Attachment naming the type being parsed when an error occurred.
#[derive(Clone, Copy, Debug)]
pub struct WhileParsingType(TypeName);

/// Attachment naming the type being written when an error occurred.
#[derive(Clone, Copy, Debug)]
pub struct WhileWritingType(TypeName);

/// A convenience type alias for a [`Result`](std::result::Result) containing an error wrapped by a [`Report`].
pub type Result<T, E> = StdResult<T, Report<E>>;

/// [`Report`]-related extensions for results returned while decoding or encoding.
pub trait ResultExt: Sized {
    /// Attach a [`Display`]-able type to the error [`Report`]'s stack.
    #[track_caller]
    fn attach_printable<P: Display + Send + Sync + 'static>(self, printable: P) -> Self;

    /// Attach the message "while parsing `T`" to the error [`Report`]'s stack, where `T` is the success type.
    #[track_caller]
    fn while_parsing_type(self) -> Self;

    /// Attach the message "while writing `T`" to the error [`Report`]'s stack, where `T` is the success type.
    #[track_caller]
    fn while_writing_type(self) -> Self;
}

/// An error stack recording the location an error was raised and each attachment added to it.
pub struct ReportStack {
    location: &'static Location<'static>,
    entries: Vec<ReportEntry>,
}

/// An error stack which discards everything attached to it.
#[derive(Clone, Copy, Debug)]
pub struct NullReportStack;

/// An error kind which can be wrapped in a [`Report`].
pub trait ReportableError: Display {
    /// The error stack recorded for this error kind.
    type Stack: ReportableErrorStack;
}

/// The stack of attachments of a [`Report`].
pub trait ReportableErrorStack: Display {
    /// Construct an empty stack, raised at the caller's location.
    #[track_caller]
    fn new() -> Self;

    /// Push a [`Display`]-able attachment onto the stack.
    #[track_caller]
    fn attach_printable<P: Display + Send + Sync + 'static>(self, printable: P) -> Self;
}

//
// private types
//

/// A type name printed without module paths, e.g. `Reserved<3>` for `webpcodec::parse::integers::Reserved<3>`.
#[derive(Clone, Copy, Debug)]
struct TypeName(&'static str);

struct ReportEntry {
    message: Box<dyn Display + Send + Sync + 'static>,
    location: &'static Location<'static>,
}

//
// Report impls
//

impl<E: ReportableError> Report<E> {
    /// Get a reference to the underlying error kind.
    pub fn get_ref(&self) -> &E {
        &self.error
    }

    /// Unwrap this report, returning the underlying error kind.
    pub fn into_inner(self) -> E {
        self.error
    }

    /// Push a [`Display`]-able attachment onto the stack.
    #[track_caller]
    pub fn attach_printable<P: Display + Send + Sync + 'static>(mut self, message: P) -> Self {
        self.stack = self.stack.attach_printable(message);
        self
    }
}

impl<E: ReportableError> From<E> for Report<E> {
    #[track_caller]
    fn from(error: E) -> Self {
        Self { error, stack: E::Stack::new() }
    }
}

impl<E: ReportableError> Debug for Report<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { error, stack } = self;
        write!(f, "{error}{stack}")
    }
}

//
// WhileParsingType impls
//

impl WhileParsingType {
    /// Construct a new [`WhileParsingType`] where the type described is `T`.
    pub fn new<T: ?Sized>() -> Self {
        Self(TypeName::of::<T>())
    }
}

impl Display for WhileParsingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "while parsing `{}`", self.0)
    }
}

//
// WhileWritingType impls
//

impl WhileWritingType {
    /// Construct a new [`WhileWritingType`] where the type described is `T`.
    pub fn new<T: ?Sized>() -> Self {
        Self(TypeName::of::<T>())
    }
}

impl Display for WhileWritingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "while writing `{}`", self.0)
    }
}

//
// TypeName impls
//

impl TypeName {
    fn of<T: ?Sized>() -> Self {
        Self(type_name::<T>())
    }
}

impl Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rest = self.0;
        while !rest.is_empty() {
            let path_len = rest.find(|c: char| !(c.is_alphanumeric() || c == '_' || c == ':')).unwrap_or(rest.len());
            let (path, tail) = rest.split_at(path_len);
            let name = path.rsplit("::").next().unwrap_or(path);
            f.write_str(name)?;

            let punct_len = tail.find(|c: char| c.is_alphanumeric() || c == '_' || c == ':').unwrap_or(tail.len());
            let (punct, tail) = tail.split_at(punct_len);
            f.write_str(punct)?;
            rest = tail;
        }
        Ok(())
    }
}

//
// ReportStack impls
//

impl Display for ReportStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { location, entries } = self;
        write!(f, " at {location}")?;
        for (index, ReportEntry { message, location }) in entries.iter().enumerate() {
            write!(f, "\n  {index}: {message} at {location}")?;
        }
        Ok(())
    }
}

impl ReportableErrorStack for ReportStack {
    #[track_caller]
    fn new() -> Self {
        Self { location: Location::caller(), entries: Vec::new() }
    }

    #[track_caller]
    fn attach_printable<P: Display + Send + Sync + 'static>(mut self, printable: P) -> Self {
        self.entries.push(ReportEntry { message: Box::new(printable), location: Location::caller() });
        self
    }
}

//
// NullReportStack impls
//

impl Display for NullReportStack {
    fn fmt(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Ok(())
    }
}

impl ReportableErrorStack for NullReportStack {
    fn new() -> Self {
        Self
    }

    fn attach_printable<P: Display + Send + Sync + 'static>(self, _printable: P) -> Self {
        Self
    }
}

//
// ResultExt impls
//

impl<T, E: ReportableError> ResultExt for Result<T, E> {
    #[track_caller]
    fn attach_printable<P: Display + Send + Sync + 'static>(self, printable: P) -> Self {
        match self {
            Err(err) => Err(err.attach_printable(printable)),
            ok => ok,
        }
    }

    #[track_caller]
    fn while_parsing_type(self) -> Self {
        self.attach_printable(WhileParsingType::new::<T>())
    }

    #[track_caller]
    fn while_writing_type(self) -> Self {
        self.attach_printable(WhileWritingType::new::<T>())
    }
}

impl<T, E: ReportableError> ResultExt for StdResult<T, Error<E>> {
    #[track_caller]
    fn attach_printable<P: Display + Send + Sync + 'static>(self, printable: P) -> Self {
        match self {
            Err(Error::Codec(err)) => Err(Error::Codec(err.attach_printable(printable))),
            other => other,
        }
    }

    #[track_caller]
    fn while_parsing_type(self) -> Self {
        self.attach_printable(WhileParsingType::new::<T>())
    }

    #[track_caller]
    fn while_writing_type(self) -> Self {
        self.attach_printable(WhileWritingType::new::<T>())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("bad chunk")]
    struct DetailedError;

    impl ReportableError for DetailedError {
        type Stack = ReportStack;
    }

    #[derive(Debug, thiserror::Error)]
    #[error("bad chunk")]
    struct QuietError;

    impl ReportableError for QuietError {
        type Stack = NullReportStack;
    }

    mod nested {
        pub struct Chunk<const N: usize>;
    }

    #[test]
    fn type_names_shortened() {
        assert_eq!(WhileParsingType::new::<nested::Chunk<3>>().to_string(), "while parsing `Chunk<3>`");
        assert_eq!(WhileWritingType::new::<Option<nested::Chunk<1>>>().to_string(), "while writing `Option<Chunk<1>>`");
        assert_eq!(WhileParsingType::new::<(u8, [u16; 2])>().to_string(), "while parsing `(u8, [u16; 2])`");
    }

    #[test]
    fn display_is_error_kind_only() {
        let report = report_attach!(DetailedError, "while parsing `VP8L` chunk");
        assert_eq!(report.to_string(), "bad chunk");
    }

    #[test]
    fn debug_lists_attachments_innermost_first() {
        let result: Result<u8, DetailedError> = Err(report_attach!(DetailedError, "first"));
        let report = result.attach_printable("second").while_parsing_type().unwrap_err();
        let debug = format!("{report:?}");
        let lines: Vec<&str> = debug.lines().collect();
        assert_eq!(lines.len(), 4, "{debug}");
        assert!(lines[0].starts_with("bad chunk at "), "{debug}");
        assert!(lines[1].starts_with("  0: first at "), "{debug}");
        assert!(lines[2].starts_with("  1: second at "), "{debug}");
        assert!(lines[3].starts_with("  2: while parsing `u8` at "), "{debug}");
    }

    #[test]
    fn null_stack_discards_attachments() {
        let report = report_attach!(QuietError, "first", "second");
        assert_eq!(format!("{report:?}"), "bad chunk");
    }

    #[test]
    fn io_errors_pass_through() {
        let io_result: StdResult<(), Error<DetailedError>> = Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
        assert!(matches!(io_result.while_writing_type(), Err(Error::Io(_))));

        let codec_result: StdResult<u16, Error<DetailedError>> = Err(report_attach!(DetailedError).into());
        let debug = match codec_result.while_writing_type() {
            Err(Error::Codec(report)) => format!("{report:?}"),
            other => panic!("expected codec error, got {other:?}"),
        };
        assert!(debug.contains("0: while writing `u16`"), "{debug}");
    }
}
