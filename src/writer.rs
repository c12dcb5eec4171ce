use std::io;

use crate::record::CompositeRecord;

/// The quoting style to use when writing composite literals.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum QuoteStyle {
    /// This puts quotes around every non-NULL field. Always.
    Always,
    /// This puts quotes around fields only when necessary.
    ///
    /// They are necessary when fields are empty or contain a double quote, a
    /// backslash, a comma, a parenthesis or ASCII whitespace.
    ///
    /// This is the default.
    Necessary,
}

impl Default for QuoteStyle {
    fn default() -> QuoteStyle {
        QuoteStyle::Necessary
    }
}

/// A builder for configuring a composite writer.
#[derive(Debug, Default)]
pub struct WriterBuilder {
    style: QuoteStyle,
}

impl WriterBuilder {
    /// Create a new builder for configuring a composite writer.
    pub fn new() -> WriterBuilder {
        WriterBuilder::default()
    }

    /// Build a writer that writes a single composite literal to `wtr`.
    pub fn from_writer<W: io::Write>(&self, wtr: W) -> Writer<W> {
        Writer { wtr: wtr, style: self.style, fields: 0 }
    }

    /// The quoting style to use when writing fields.
    ///
    /// By default, this is set to `QuoteStyle::Necessary`, which will only
    /// use quotes when they are necessary to preserve the integrity of data.
    pub fn quote_style(&mut self, style: QuoteStyle) -> &mut WriterBuilder {
        self.style = style;
        self
    }
}

/// A writer for a single composite (row) literal.
///
/// Fields are written one at a time. The opening `(` is written along with
/// the first field, and `finish` writes the closing `)`. Inside quotes,
/// every `"`, `\` and `'` is doubled.
///
/// A literal whose only field is NULL is written as `()`, which reads back
/// as a literal with no fields at all.
///
/// # Example
///
/// ```
/// use pg_composite::Writer;
///
/// # fn example() -> std::io::Result<()> {
/// let mut wtr = Writer::from_writer(vec![]);
/// wtr.write_field(b"1")?;
/// wtr.write_field(b"hello, world")?;
/// wtr.write_null()?;
/// let data = wtr.finish()?;
/// assert_eq!(data, b"(1,\"hello, world\",)");
/// # Ok(()) }
/// # example().unwrap();
/// ```
#[derive(Debug)]
pub struct Writer<W> {
    wtr: W,
    style: QuoteStyle,
    fields: u64,
}

impl<W: io::Write> Writer<W> {
    /// Build a writer with a default configuration.
    pub fn from_writer(wtr: W) -> Writer<W> {
        WriterBuilder::new().from_writer(wtr)
    }

    /// Write a single non-NULL field.
    pub fn write_field(&mut self, field: &[u8]) -> io::Result<()> {
        self.write_delimiter()?;
        if self.style == QuoteStyle::Always || needs_quotes(field) {
            self.write_quoted(field)
        } else {
            self.wtr.write_all(field)
        }
    }

    /// Write a single NULL field.
    pub fn write_null(&mut self) -> io::Result<()> {
        self.write_delimiter()
    }

    /// Write every field of `record`.
    pub fn write_record(&mut self, record: &CompositeRecord) -> io::Result<()> {
        for field in record {
            match field {
                Some(bytes) => self.write_field(bytes)?,
                None => self.write_null()?,
            }
        }
        Ok(())
    }

    /// Close the literal and return the underlying writer.
    pub fn finish(mut self) -> io::Result<W> {
        if self.fields == 0 {
            self.wtr.write_all(b"(")?;
        }
        self.wtr.write_all(b")")?;
        self.wtr.flush()?;
        Ok(self.wtr)
    }

    fn write_delimiter(&mut self) -> io::Result<()> {
        let delim: &[u8] = if self.fields == 0 { b"(" } else { b"," };
        self.fields += 1;
        self.wtr.write_all(delim)
    }

    fn write_quoted(&mut self, field: &[u8]) -> io::Result<()> {
        self.wtr.write_all(b"\"")?;
        let mut start = 0;
        for (i, &b) in field.iter().enumerate() {
            if b == b'"' || b == b'\\' || b == b'\'' {
                // Write up to and including this byte, then the byte again.
                self.wtr.write_all(&field[start..i + 1])?;
                start = i;
            }
        }
        self.wtr.write_all(&field[start..])?;
        self.wtr.write_all(b"\"")
    }
}

fn needs_quotes(field: &[u8]) -> bool {
    field.is_empty()
        || field.iter().any(|&b| match b {
            b'"' | b'\\' | b'(' | b')' | b',' => true,
            b => b.is_ascii_whitespace(),
        })
}

#[cfg(test)]
mod tests {
    use super::{QuoteStyle, Writer, WriterBuilder};
    use crate::reader::Reader;
    use crate::record::CompositeRecord;

    fn b(s: &str) -> &[u8] {
        s.as_bytes()
    }

    fn s(bytes: Vec<u8>) -> String {
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn no_fields() {
        let wtr = Writer::from_writer(vec![]);
        assert_eq!(s(wtr.finish().unwrap()), "()");
    }

    #[test]
    fn plain_fields() {
        let mut wtr = Writer::from_writer(vec![]);
        wtr.write_field(b("1")).unwrap();
        wtr.write_field(b("abc")).unwrap();
        assert_eq!(s(wtr.finish().unwrap()), "(1,abc)");
    }

    #[test]
    fn nulls() {
        let mut wtr = Writer::from_writer(vec![]);
        wtr.write_null().unwrap();
        wtr.write_null().unwrap();
        assert_eq!(s(wtr.finish().unwrap()), "(,)");
    }

    #[test]
    fn empty_is_quoted() {
        let mut wtr = Writer::from_writer(vec![]);
        wtr.write_field(b("")).unwrap();
        wtr.write_null().unwrap();
        assert_eq!(s(wtr.finish().unwrap()), "(\"\",)");
    }

    #[test]
    fn escapes() {
        let mut wtr = Writer::from_writer(vec![]);
        wtr.write_field(b(r#"a"b\c"#)).unwrap();
        wtr.write_field(b("x y")).unwrap();
        wtr.write_field(b("(1,2)")).unwrap();
        assert_eq!(
            s(wtr.finish().unwrap()),
            r#"("a""b\\c","x y","(1,2)")"#
        );
    }

    #[test]
    fn single_quotes_doubled_inside_quotes() {
        let mut wtr = Writer::from_writer(vec![]);
        wtr.write_field(b("it''s x")).unwrap();
        wtr.write_field(b("it's")).unwrap();
        assert_eq!(s(wtr.finish().unwrap()), r#"("it''''s x",it's)"#);
    }

    #[test]
    fn always_quote() {
        let mut wtr = WriterBuilder::new()
            .quote_style(QuoteStyle::Always)
            .from_writer(vec![]);
        wtr.write_field(b("1")).unwrap();
        wtr.write_null().unwrap();
        assert_eq!(s(wtr.finish().unwrap()), "(\"1\",)");
    }

    #[test]
    fn reads_back() {
        let fields = vec![
            Some(b("1")),
            None,
            Some(b("")),
            Some(b(r#"she said "hi\there""#)),
            Some(b("it's")),
            Some(b("it''s x")),
            Some(b("'quoted' ''twice'' '")),
            Some(b("(nested,\"row\")")),
            None,
        ];
        let record: CompositeRecord = fields.into_iter().collect();

        let mut wtr = Writer::from_writer(vec![]);
        wtr.write_record(&record).unwrap();
        let data = wtr.finish().unwrap();

        let mut got = CompositeRecord::new();
        Reader::from_reader(&data[..]).read_record(&mut got).unwrap();
        assert_eq!(record, got);
    }
}
