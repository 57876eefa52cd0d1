//! Miscellaneous helpers.

use std::io;

/// Extensions for [`io::Result`].
pub trait IoResultExt: Sized {
    /// The success type of the result.
    type Ok;

    /// Map an [`io::ErrorKind::UnexpectedEof`] error with `fun`, converting any other IO error with [`From`].
    fn map_eof<E, F>(self, fun: F) -> Result<Self::Ok, E>
    where
        E: From<io::Error>,
        F: FnOnce(io::Error) -> E;
}

//
// IoResultExt impls
//

impl<T> IoResultExt for io::Result<T> {
    type Ok = T;

    fn map_eof<E, F>(self, fun: F) -> Result<T, E>
    where
        E: From<io::Error>,
        F: FnOnce(io::Error) -> E,
    {
        match self {
            Ok(value) => Ok(value),
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => Err(fun(err)),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Debug, PartialEq, Eq)]
    enum TestError {
        Eof,
        Other(io::ErrorKind),
    }

    impl From<io::Error> for TestError {
        fn from(err: io::Error) -> Self {
            Self::Other(err.kind())
        }
    }

    #[test]
    fn map_eof_maps_only_eof() {
        let eof: io::Result<()> = Err(io::ErrorKind::UnexpectedEof.into());
        assert_eq!(eof.map_eof(|_| TestError::Eof), Err(TestError::Eof));

        let other: io::Result<()> = Err(io::ErrorKind::InvalidData.into());
        assert_eq!(other.map_eof(|_| TestError::Eof), Err(TestError::Other(io::ErrorKind::InvalidData)));

        assert_eq!(Ok::<_, io::Error>(3).map_eof(|_| TestError::Eof), Ok(3));
    }
}
