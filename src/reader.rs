use std::io;
use std::mem;

use crate::cursor::{Cursor, Until, DEFAULT_BUF_SIZE};
use crate::error::{Error, ErrorKind, Result};
use crate::record::CompositeRecord;

/// Builds a composite `Reader` with various configuration knobs.
///
/// Once a `Reader` is built, its configuration cannot be changed.
#[derive(Debug)]
pub struct ReaderBuilder {
    capacity: usize,
}

impl Default for ReaderBuilder {
    fn default() -> ReaderBuilder {
        ReaderBuilder { capacity: DEFAULT_BUF_SIZE }
    }
}

impl ReaderBuilder {
    /// Create a new builder.
    pub fn new() -> ReaderBuilder {
        ReaderBuilder::default()
    }

    /// Build a reader over the composite literal at the start of `rdr`.
    ///
    /// If the source does not start with `(`, the reader that is returned
    /// has already failed and reports why on its first call.
    pub fn from_reader<R: io::Read>(&self, rdr: R) -> Reader<R> {
        Reader::from_cursor(Cursor::with_capacity(self.capacity, rdr))
    }

    /// Set the capacity (in bytes) of the buffer used in the reader.
    ///
    /// This bounds how much of the source is read at once. It has no effect
    /// on the fields produced.
    pub fn buffer_capacity(&mut self, capacity: usize) -> &mut ReaderBuilder {
        self.capacity = capacity;
        self
    }
}

/// A single element of a composite literal, as returned by
/// `Reader::next_elem`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Elem {
    /// A field's bytes, with any quoting and escaping already resolved.
    ///
    /// A quoted empty field (`""`) is returned as an empty `Bytes`.
    Bytes(Vec<u8>),
    /// A NULL field, i.e., an empty unquoted span.
    Null,
    /// There are no more fields in the literal.
    End,
}

impl Elem {
    /// Returns true if this is the end-of-composite marker.
    pub fn is_end(&self) -> bool {
        *self == Elem::End
    }

    /// Convert this element to an optional field. `End` yields `None`.
    pub fn into_field(self) -> Option<Option<Vec<u8>>> {
        match self {
            Elem::Bytes(bytes) => Some(Some(bytes)),
            Elem::Null => Some(None),
            Elem::End => None,
        }
    }
}

#[derive(Clone, Debug)]
enum State {
    /// Just after the opening `(`.
    Start,
    /// Just after a `,`. At least one more field follows.
    Field,
    /// The closing `)` has been consumed.
    Closed,
    /// Terminal. Every call returns this error.
    Failed(Error),
}

/// A streaming tokenizer for a single composite (row) literal.
///
/// A composite literal looks like `(1,"hello, world",)`: fields separated by
/// `,` and wrapped in parentheses. Fields may be quoted with `"`, in which
/// case `""` and `\\` stand for a literal `"` and `\` respectively. An empty
/// unquoted field is NULL, which is distinct from the quoted empty field
/// `""`.
///
/// The reader pulls from its source only as much as it needs to return the
/// next field. The source is read through a fixed-size buffer, so a literal
/// need never be resident in memory all at once.
///
/// # Errors
///
/// Every error is final. Once `next_elem` has returned an error, it will
/// return that same error on every subsequent call.
///
/// # Example
///
/// ```
/// use pg_composite::{Elem, Reader};
///
/// # fn example() -> pg_composite::Result<()> {
/// let mut rdr = Reader::from_reader(&b"(1,\"hello, world\",)"[..]);
/// assert_eq!(rdr.next_elem()?, Elem::Bytes(b"1".to_vec()));
/// assert_eq!(rdr.next_elem()?, Elem::Bytes(b"hello, world".to_vec()));
/// assert_eq!(rdr.next_elem()?, Elem::Null);
/// assert_eq!(rdr.next_elem()?, Elem::End);
/// # Ok(()) }
/// # example().unwrap();
/// ```
#[derive(Debug)]
pub struct Reader<R> {
    cur: Option<Cursor<R>>,
    state: State,
    buf: Vec<u8>,
}

impl<R: io::Read> Reader<R> {
    /// Create a reader over the composite literal at the start of `rdr`,
    /// using a default configuration.
    pub fn from_reader(rdr: R) -> Reader<R> {
        ReaderBuilder::new().from_reader(rdr)
    }

    /// Create a reader from a cursor positioned just before a literal's
    /// opening `(`.
    pub fn from_cursor(mut cur: Cursor<R>) -> Reader<R> {
        match cur.skip_byte(b'(') {
            Ok(()) => {
                Reader { cur: Some(cur), state: State::Start, buf: vec![] }
            }
            Err(err) => {
                let mut rdr = Reader::from_error(err);
                rdr.cur = Some(cur);
                rdr
            }
        }
    }

    /// Create a reader that has already failed with the given error.
    ///
    /// The first call to `next_elem` returns `err`.
    pub fn from_error(err: Error) -> Reader<R> {
        log::debug!("composite reader failed: {}", err);
        Reader { cur: None, state: State::Failed(err), buf: vec![] }
    }

    /// Read the next element of the literal.
    ///
    /// This returns `Elem::End` once every field has been read, and keeps
    /// returning it after that.
    pub fn next_elem(&mut self) -> Result<Elem> {
        let res = match self.state {
            State::Failed(ref err) => return Err(err.clone()),
            State::Closed => return Ok(Elem::End),
            State::Start | State::Field => self.read_elem(),
        };
        res.map_err(|err| self.fail(err))
    }

    /// Returns an iterator over the remaining fields of the literal.
    ///
    /// NULL fields are yielded as `None`. The iterator stops after the end of
    /// the literal or after yielding the first error.
    pub fn elems(&mut self) -> Elems<R> {
        Elems { rdr: self, done: false }
    }

    /// Read every remaining field of the literal into `record`.
    ///
    /// `record` is cleared first. On error, it holds the fields read so far.
    pub fn read_record(&mut self, record: &mut CompositeRecord) -> Result<()> {
        record.clear();
        loop {
            match self.next_elem()? {
                Elem::Bytes(bytes) => record.push_field(&bytes),
                Elem::Null => record.push_null(),
                Elem::End => return Ok(()),
            }
        }
    }

    /// Returns true once the literal's closing `)` has been consumed.
    pub fn is_done(&self) -> bool {
        match self.state {
            State::Closed => true,
            _ => false,
        }
    }

    /// Returns true if this reader has failed.
    pub fn is_failed(&self) -> bool {
        match self.state {
            State::Failed(_) => true,
            _ => false,
        }
    }

    /// Returns a reference to the underlying cursor, if there is one.
    ///
    /// A reader built with `from_error` has no cursor.
    pub fn cursor(&self) -> Option<&Cursor<R>> {
        self.cur.as_ref()
    }

    /// Unwraps this reader, returning the underlying source.
    ///
    /// Any data buffered by the reader is lost.
    pub fn into_inner(self) -> Option<R> {
        self.cur.map(Cursor::into_inner)
    }

    fn fail(&mut self, err: Error) -> Error {
        log::debug!("composite reader failed: {}", err);
        self.state = State::Failed(err.clone());
        err
    }

    fn read_elem(&mut self) -> Result<Elem> {
        let cur = match self.cur {
            Some(ref mut cur) => cur,
            None => unreachable!("only a failed reader lacks a cursor"),
        };
        match cur.peek()? {
            None => Err(unterminated_literal(cur)),
            Some(b'"') => {
                cur.bump();
                let (field, state) = read_quoted(cur)?;
                self.state = state;
                Ok(Elem::Bytes(field))
            }
            Some(b',') => {
                cur.bump();
                self.state = State::Field;
                Ok(Elem::Null)
            }
            Some(b')') => {
                cur.bump();
                let trailing_null = match self.state {
                    State::Field => true,
                    _ => false,
                };
                self.state = State::Closed;
                Ok(if trailing_null { Elem::Null } else { Elem::End })
            }
            Some(_) => {
                let closed = read_unquoted(cur, &mut self.buf)?;
                self.state = if closed { State::Closed } else { State::Field };
                if self.buf.is_empty() {
                    Ok(Elem::Null)
                } else {
                    Ok(Elem::Bytes(mem::take(&mut self.buf)))
                }
            }
        }
    }
}

/// Scan an unquoted field into `buf`.
///
/// The field ends at the next `,`. If the source ends first, the field must
/// end with the literal's closing `)`, in which case this returns true.
fn read_unquoted<R: io::Read>(
    cur: &mut Cursor<R>,
    buf: &mut Vec<u8>,
) -> Result<bool> {
    buf.clear();
    loop {
        let (chunk, until) = cur.read_until(b',')?;
        buf.extend_from_slice(chunk);
        match until {
            Until::Found => {
                buf.pop();
                return Ok(false);
            }
            Until::BufferFull => {
                log::trace!("unquoted field spans chunks: {}", buf.len());
            }
            Until::Eof => {
                if buf.last() == Some(&b')') {
                    buf.pop();
                    return Ok(true);
                }
                return Err(unterminated_literal(cur));
            }
        }
    }
}

/// Decode the body of a quoted field. The opening `"` is already consumed.
///
/// On success, the delimiter following the closing quote is consumed too,
/// and the state it leaves the reader in is returned with the field.
fn read_quoted<R: io::Read>(cur: &mut Cursor<R>) -> Result<(Vec<u8>, State)> {
    let mut field = vec![];
    let mut c = next_quoted(cur)?;
    loop {
        let next = next_quoted(cur)?;
        match c {
            b'\\' | b'\'' => {
                field.push(c);
                c = if next == c { next_quoted(cur)? } else { next };
            }
            b'"' => match next {
                b'"' => {
                    field.push(b'"');
                    c = next_quoted(cur)?;
                }
                b',' => return Ok((field, State::Field)),
                b')' => return Ok((field, State::Closed)),
                got => {
                    return Err(Error::new(ErrorKind::UnexpectedByte {
                        got: got,
                        expected: b",)".to_vec(),
                        pos: cur.position() - 1,
                    }));
                }
            },
            _ => {
                field.push(c);
                c = next;
            }
        }
    }
}

fn next_quoted<R: io::Read>(cur: &mut Cursor<R>) -> Result<u8> {
    match cur.read_byte()? {
        Some(b) => Ok(b),
        None => Err(Error::new(ErrorKind::UnterminatedQuote {
            pos: cur.position(),
        })),
    }
}

fn unterminated_literal<R: io::Read>(cur: &Cursor<R>) -> Error {
    Error::new(ErrorKind::UnterminatedLiteral { pos: cur.position() })
}

/// An iterator over the remaining fields of a composite literal.
///
/// The lifetime parameter `'r` refers to the lifetime of the underlying
/// reader.
pub struct Elems<'r, R: 'r> {
    rdr: &'r mut Reader<R>,
    done: bool,
}

impl<'r, R: io::Read> Iterator for Elems<'r, R> {
    type Item = Result<Option<Vec<u8>>>;

    fn next(&mut self) -> Option<Result<Option<Vec<u8>>>> {
        if self.done {
            return None;
        }
        match self.rdr.next_elem() {
            Ok(elem) => {
                let field = elem.into_field();
                self.done = field.is_none();
                field.map(Ok)
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}
