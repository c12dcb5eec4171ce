use std::cmp;
use std::io::{self, Read};

use pg_composite::{Elem, ErrorKind, Reader, ReaderBuilder};

/// A reader that hands out its input at most `size` bytes at a time, and
/// reports an interrupted read before every chunk.
#[derive(Debug)]
struct ChunkReader<'a> {
    data: &'a [u8],
    size: usize,
    interrupt: bool,
}

impl<'a> ChunkReader<'a> {
    fn new(data: &'a [u8], size: usize) -> ChunkReader<'a> {
        ChunkReader { data: data, size: size, interrupt: true }
    }
}

impl<'a> Read for ChunkReader<'a> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.interrupt && !self.data.is_empty() {
            self.interrupt = false;
            return Err(io::Error::new(io::ErrorKind::Interrupted, "again"));
        }
        self.interrupt = true;
        let len = cmp::min(cmp::min(buf.len(), self.size), self.data.len());
        buf[..len].copy_from_slice(&self.data[..len]);
        self.data = &self.data[len..];
        Ok(len)
    }
}

/// A reader that fails once its input runs out.
struct FailingReader<'a> {
    data: &'a [u8],
}

impl<'a> Read for FailingReader<'a> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.data.is_empty() {
            let kind = io::ErrorKind::ConnectionReset;
            return Err(io::Error::new(kind, "reset"));
        }
        let n = self.data.read(buf)?;
        Ok(n)
    }
}

/// Collect every result, including the first error, as a comparable string.
fn collect<R: Read>(mut rdr: Reader<R>) -> Vec<String> {
    let mut got = vec![];
    loop {
        match rdr.next_elem() {
            Ok(Elem::End) => return got,
            Ok(Elem::Null) => got.push("NULL".to_string()),
            Ok(Elem::Bytes(bytes)) => {
                got.push(format!("{:?}", String::from_utf8_lossy(&bytes)))
            }
            Err(err) => {
                got.push(format!("error: {}", err));
                return got;
            }
        }
    }
}

const LITERALS: &[&str] = &[
    "()",
    "(,)",
    "(1,\"hello, world\",)",
    "(\"a\"\"b\")",
    "(abcdefghij,klmnopqrstuvwxyz,,\"0123456789\",)",
    "(\"\\\\\\\\\",\"''''\",\"x,y)z\")",
    "(\"(1,\"\"(2,3)\"\")\",4)",
    "(\"a\",",
    "(\"abc",
    "(1,2",
    "(\"a\"b)",
    "[1,2]",
];

#[test]
fn small_reads_do_not_change_results() {
    for literal in LITERALS {
        let expected = collect(Reader::from_reader(literal.as_bytes()));
        for size in 1..10 {
            let src = ChunkReader::new(literal.as_bytes(), size);
            let got = collect(Reader::from_reader(src));
            assert_eq!(expected, got, "{:?} in chunks of {}", literal, size);
        }
    }
}

#[test]
fn small_buffers_do_not_change_results() {
    for literal in LITERALS {
        let expected = collect(Reader::from_reader(literal.as_bytes()));
        for cap in 1..10 {
            let src = ChunkReader::new(literal.as_bytes(), 3);
            let rdr =
                ReaderBuilder::new().buffer_capacity(cap).from_reader(src);
            let got = collect(rdr);
            assert_eq!(expected, got, "{:?} with capacity {}", literal, cap);
        }
    }
}

#[test]
fn expected_fields() {
    let got = collect(Reader::from_reader(&b"(1,\"hello, world\",)"[..]));
    assert_eq!(got, vec!["\"1\"", "\"hello, world\"", "NULL"]);
}

#[test]
fn large_field_in_tiny_buffer() {
    let field = "x".repeat(10_000);
    let data = format!("({},\"{}\")", field, field);
    let mut rdr = ReaderBuilder::new()
        .buffer_capacity(16)
        .from_reader(ChunkReader::new(data.as_bytes(), 5));
    let expected = Elem::Bytes(field.into_bytes());
    assert_eq!(rdr.next_elem().unwrap(), expected);
    assert_eq!(rdr.next_elem().unwrap(), expected);
    assert_eq!(rdr.next_elem().unwrap(), Elem::End);
}

#[test]
fn io_error_is_sticky() {
    let mut rdr = Reader::from_reader(FailingReader { data: b"(1,\"ab" });
    assert_eq!(rdr.next_elem().unwrap(), Elem::Bytes(b"1".to_vec()));
    let err = rdr.next_elem().unwrap_err();
    match *err.kind() {
        ErrorKind::Io(ref err) => {
            assert_eq!(err.kind(), io::ErrorKind::ConnectionReset)
        }
        ref kind => panic!("unexpected error: {:?}", kind),
    }
    assert!(err.same(&rdr.next_elem().unwrap_err()));
}

#[test]
fn io_error_in_unquoted_field_is_sticky() {
    for &cap in &[1, 2, 3, 64] {
        let src = FailingReader { data: b"(1,23" };
        let mut rdr =
            ReaderBuilder::new().buffer_capacity(cap).from_reader(src);
        assert_eq!(rdr.next_elem().unwrap(), Elem::Bytes(b"1".to_vec()));
        let err = rdr.next_elem().unwrap_err();
        match *err.kind() {
            ErrorKind::Io(ref err) => {
                assert_eq!(err.kind(), io::ErrorKind::ConnectionReset)
            }
            ref kind => panic!("unexpected error: {:?}", kind),
        }
        assert!(rdr.is_failed());
        assert!(err.same(&rdr.next_elem().unwrap_err()));
    }
}

#[test]
fn io_error_at_construction() {
    let mut rdr = Reader::from_reader(FailingReader { data: b"" });
    assert!(rdr.is_failed());
    assert!(rdr.next_elem().unwrap_err().is_io_error());
}

#[test]
fn into_inner_returns_source() {
    let rdr = Reader::from_reader(ChunkReader::new(b"(a)", 1));
    let src = rdr.into_inner().unwrap();
    assert_eq!(src.size, 1);
}
