/*!
The `pg-composite` crate provides a streaming tokenizer for the text form of
PostgreSQL composite (row) values, along with a writer for the same format.

A composite literal is a parenthesized, comma separated list of fields, e.g.,
`(1,"hello, world",)`. Fields can be quoted, in which case doubled quotes
(`""`) and doubled backslashes (`\\`) stand for a single literal quote or
backslash. An empty unquoted field is NULL, which is distinct from the
quoted empty string `""`.

This crate only *delimits* fields. It never interprets their contents, so
converting field bytes to integers, dates or nested composites is left to
the caller.

# Example

```
use pg_composite::{CompositeRecord, Reader};

# fn example() -> pg_composite::Result<()> {
let data = &b"(42,\"a \"\"quoted\"\" word\",,\"\")"[..];
let mut record = CompositeRecord::new();
Reader::from_reader(data).read_record(&mut record)?;

assert_eq!(record.len(), 4);
assert_eq!(record.get(0), Some(Some(&b"42"[..])));
assert_eq!(record.get(1), Some(Some(&b"a \"quoted\" word"[..])));
assert_eq!(record.get(2), Some(None));
assert_eq!(record.get(3), Some(Some(&b""[..])));
# Ok(()) }
# example().unwrap();
```

# Streaming

A `Reader` pulls from any `std::io::Read` through a bounded buffer (see
`ReaderBuilder::buffer_capacity`). Fields may be arbitrarily large and may
straddle any number of buffer refills; the fields produced never depend on
the buffer size.
*/

#![deny(missing_docs)]

pub use crate::cursor::{Cursor, Until};
pub use crate::error::{Error, ErrorKind, Result};
pub use crate::reader::{Elem, Elems, Reader, ReaderBuilder};
pub use crate::record::{CompositeRecord, CompositeRecordIter};
pub use crate::writer::{QuoteStyle, Writer, WriterBuilder};

mod cursor;
mod error;
mod reader;
mod record;
mod writer;
