use std::error;
use std::fmt;
use std::io;
use std::result;
use std::sync::Arc;

use bstr::ByteSlice;

/// A type alias for `Result<T, pg_composite::Error>`.
pub type Result<T> = result::Result<T, Error>;

/// An error that can occur when tokenizing a composite literal.
///
/// Once a `Reader` returns an error, it keeps returning that same error
/// forever. To make that possible, an `Error` is cheap to clone: clones share
/// the same underlying `ErrorKind`.
#[derive(Clone, Debug)]
pub struct Error(Arc<ErrorKind>);

/// The specific type of an error.
#[derive(Debug)]
pub enum ErrorKind {
    /// An I/O error that occurred while reading from the underlying source.
    Io(io::Error),
    /// A byte was found where one of `expected` was required.
    ///
    /// This is reported when a literal does not open with `(`, and when a
    /// closing quote is followed by something other than `,` or `)`.
    UnexpectedByte {
        /// The byte that was found.
        got: u8,
        /// The set of bytes that would have been accepted.
        expected: Vec<u8>,
        /// The byte offset of `got` in the source.
        pos: u64,
    },
    /// The source ended where the byte `expected` was required.
    UnexpectedEof {
        /// The byte that was required.
        expected: u8,
    },
    /// The source ended inside a quoted field.
    UnterminatedQuote {
        /// The byte offset at which the source ended.
        pos: u64,
    },
    /// The source ended before the literal's closing `)` was seen.
    UnterminatedLiteral {
        /// The byte offset at which the source ended.
        pos: u64,
    },
}

impl Error {
    pub(crate) fn new(kind: ErrorKind) -> Error {
        Error(Arc::new(kind))
    }

    /// Return the specific type of this error.
    pub fn kind(&self) -> &ErrorKind {
        &self.0
    }

    /// Returns true if this is an I/O error from the underlying source.
    pub fn is_io_error(&self) -> bool {
        match *self.0 {
            ErrorKind::Io(_) => true,
            _ => false,
        }
    }

    /// Returns true if both errors are the same error value, e.g., because
    /// one was handed back again by a failed reader.
    pub fn same(&self, other: &Error) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::new(ErrorKind::Io(err))
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self.0 {
            ErrorKind::Io(ref err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self.0 {
            ErrorKind::Io(ref err) => err.fmt(f),
            ErrorKind::UnexpectedByte { got, ref expected, pos } => {
                write!(
                    f,
                    "composite parse error: byte {}: got {:?}, wanted ",
                    pos,
                    [got].as_bstr()
                )?;
                for (i, &b) in expected.iter().enumerate() {
                    if i > 0 {
                        write!(f, " or ")?;
                    }
                    write!(f, "{:?}", [b].as_bstr())?;
                }
                Ok(())
            }
            ErrorKind::UnexpectedEof { expected } => write!(
                f,
                "composite parse error: unexpected end of input, wanted {:?}",
                [expected].as_bstr()
            ),
            ErrorKind::UnterminatedQuote { pos } => write!(
                f,
                "composite parse error: byte {}: unterminated quoted field",
                pos
            ),
            ErrorKind::UnterminatedLiteral { pos } => write!(
                f,
                "composite parse error: byte {}: missing closing ')'",
                pos
            ),
        }
    }
}
