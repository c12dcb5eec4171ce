use std::fmt;
use std::io;

use crate::error::{Error, ErrorKind, Result};

pub(crate) const DEFAULT_BUF_SIZE: usize = 1024 * 64;

/// The outcome of a call to `Cursor::read_until`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Until {
    /// The delimiter was found. It is the last byte of the returned slice.
    Found,
    /// The current chunk was exhausted before the delimiter was found.
    ///
    /// The returned slice is non-empty. Callers should keep it and call
    /// `read_until` again.
    BufferFull,
    /// There is no more input. The returned slice is empty.
    Eof,
}

/// A buffered byte cursor over an arbitrary `io::Read`.
///
/// The cursor reads its source in chunks of at most `capacity` bytes. It
/// offers a single byte of lookahead through `peek` and `bump`: a byte is
/// only consumed once it has been bumped, so there is never more than one
/// byte to "put back".
pub struct Cursor<R> {
    rdr: R,
    buf: Vec<u8>,
    /// Start of unconsumed data in `buf`.
    pos: usize,
    /// End of valid data in `buf`.
    end: usize,
    /// Total number of bytes consumed.
    offset: u64,
}

impl<R: io::Read> Cursor<R> {
    /// Create a new cursor with a default buffer capacity.
    pub fn new(rdr: R) -> Cursor<R> {
        Cursor::with_capacity(DEFAULT_BUF_SIZE, rdr)
    }

    /// Create a new cursor with the given buffer capacity.
    ///
    /// A capacity of `0` is treated as `1`.
    pub fn with_capacity(capacity: usize, rdr: R) -> Cursor<R> {
        Cursor {
            rdr: rdr,
            buf: vec![0; capacity.max(1)],
            pos: 0,
            end: 0,
            offset: 0,
        }
    }

    /// Return the next byte without consuming it.
    ///
    /// `None` is returned when the source is exhausted.
    pub fn peek(&mut self) -> io::Result<Option<u8>> {
        if !self.fill()? {
            return Ok(None);
        }
        Ok(Some(self.buf[self.pos]))
    }

    /// Consume the byte most recently returned by `peek`.
    ///
    /// This panics if no byte is available, i.e., if `peek` was not called
    /// first or if it returned `None`.
    pub fn bump(&mut self) {
        assert!(self.pos < self.end, "bump without a peeked byte");
        self.pos += 1;
        self.offset += 1;
    }

    /// Read and consume a single byte.
    pub fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let b = self.peek()?;
        if b.is_some() {
            self.bump();
        }
        Ok(b)
    }

    /// Consume the next byte if and only if it is `expected`.
    ///
    /// A mismatched byte is left unconsumed.
    pub fn skip_byte(&mut self, expected: u8) -> Result<()> {
        match self.peek()? {
            None => Err(Error::new(ErrorKind::UnexpectedEof {
                expected: expected,
            })),
            Some(b) if b == expected => {
                self.bump();
                Ok(())
            }
            Some(got) => Err(Error::new(ErrorKind::UnexpectedByte {
                got: got,
                expected: vec![expected],
                pos: self.offset,
            })),
        }
    }

    /// Read up to and including the next `delim` in the current chunk.
    ///
    /// All of the returned bytes are consumed. See `Until` for what each
    /// outcome means for the returned slice.
    pub fn read_until(&mut self, delim: u8) -> io::Result<(&[u8], Until)> {
        if !self.fill()? {
            return Ok((&[], Until::Eof));
        }
        let start = self.pos;
        let (stop, until) =
            match memchr::memchr(delim, &self.buf[start..self.end]) {
                Some(i) => (start + i + 1, Until::Found),
                None => (self.end, Until::BufferFull),
            };
        self.pos = stop;
        self.offset += (stop - start) as u64;
        Ok((&self.buf[start..stop], until))
    }

    /// The number of bytes consumed from the source so far.
    pub fn position(&self) -> u64 {
        self.offset
    }

    /// Returns a reference to the underlying source.
    pub fn get_ref(&self) -> &R {
        &self.rdr
    }

    /// Returns a mutable reference to the underlying source.
    ///
    /// Reading from it directly skips whatever is still buffered.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.rdr
    }

    /// Unwraps this cursor, returning the underlying source.
    ///
    /// Any buffered but unconsumed data is lost.
    pub fn into_inner(self) -> R {
        self.rdr
    }

    /// Ensure at least one byte is buffered. Returns false at end of input.
    fn fill(&mut self) -> io::Result<bool> {
        if self.pos < self.end {
            return Ok(true);
        }
        loop {
            match self.rdr.read(&mut self.buf) {
                Ok(n) => {
                    log::trace!("cursor refilled {} bytes", n);
                    self.pos = 0;
                    self.end = n;
                    return Ok(n > 0);
                }
                Err(ref err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => return Err(err),
            }
        }
    }
}

impl<R> fmt::Debug for Cursor<R>
where
    R: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("rdr", &self.rdr)
            .field("buffered", &(self.end - self.pos))
            .field("capacity", &self.buf.len())
            .field("offset", &self.offset)
            .finish()
    }
}
