use std::fmt;
use std::iter::FromIterator;
use std::ops;

use bstr::ByteSlice;

/// Every field of a single composite literal, stored as raw bytes.
///
/// Field bytes are stored contiguously. Each field also carries whether it
/// is NULL, since a NULL field and an empty field both take up zero bytes.
#[derive(Clone, Eq, PartialEq)]
pub struct CompositeRecord {
    /// All non-NULL field data, stored contiguously.
    fields: Vec<u8>,
    /// The location of each field in this record.
    bounds: Bounds,
}

impl Default for CompositeRecord {
    fn default() -> CompositeRecord {
        CompositeRecord::new()
    }
}

impl CompositeRecord {
    /// Create a new empty `CompositeRecord`.
    pub fn new() -> CompositeRecord {
        CompositeRecord::with_capacity(0, 0)
    }

    /// Create a new empty record with room for `buffer` bytes of field data
    /// and `fields` fields.
    pub fn with_capacity(buffer: usize, fields: usize) -> CompositeRecord {
        CompositeRecord {
            fields: Vec::with_capacity(buffer),
            bounds: Bounds {
                ends: Vec::with_capacity(fields),
                nulls: Vec::with_capacity(fields),
            },
        }
    }

    /// Return the field at index `i`.
    ///
    /// If no field at index `i` exists, this returns `None`. If the field
    /// exists but is NULL, this returns `Some(None)`.
    pub fn get(&self, i: usize) -> Option<Option<&[u8]>> {
        self.bounds.get(i).map(|range| range.map(|r| &self.fields[r]))
    }

    /// Returns true if the field at index `i` exists and is NULL.
    pub fn is_null(&self, i: usize) -> bool {
        self.bounds.nulls.get(i).cloned().unwrap_or(false)
    }

    /// Returns true if and only if this record has no fields.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of fields in this record.
    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    /// Clear this record so that it has zero fields.
    pub fn clear(&mut self) {
        self.fields.clear();
        self.bounds.ends.clear();
        self.bounds.nulls.clear();
    }

    /// Returns an iterator over all fields in this record.
    pub fn iter(&self) -> CompositeRecordIter {
        CompositeRecordIter { r: self, i: 0 }
    }

    /// Add a new non-NULL field.
    pub fn push_field(&mut self, field: &[u8]) {
        self.fields.extend_from_slice(field);
        self.bounds.add(self.fields.len(), false);
    }

    /// Add a new NULL field.
    pub fn push_null(&mut self) {
        self.bounds.add(self.fields.len(), true);
    }
}

impl fmt::Debug for CompositeRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let fields: Vec<Option<&bstr::BStr>> =
            self.iter().map(|field| field.map(|b| b.as_bstr())).collect();
        write!(f, "CompositeRecord({:?})", fields)
    }
}

/// The bounds of fields in a single record.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
struct Bounds {
    /// The ending index of each field in `fields`.
    ends: Vec<usize>,
    /// Whether each field is NULL.
    nulls: Vec<bool>,
}

impl Bounds {
    /// Returns the bounds of field `i`. NULL fields have no range.
    fn get(&self, i: usize) -> Option<Option<ops::Range<usize>>> {
        let end = *self.ends.get(i)?;
        if self.nulls[i] {
            return Some(None);
        }
        let start = if i == 0 { 0 } else { self.ends[i - 1] };
        Some(Some(start..end))
    }

    fn len(&self) -> usize {
        self.ends.len()
    }

    fn add(&mut self, pos: usize, null: bool) {
        self.ends.push(pos);
        self.nulls.push(null);
    }
}

impl<'a> FromIterator<Option<&'a [u8]>> for CompositeRecord {
    fn from_iter<I>(iter: I) -> CompositeRecord
    where
        I: IntoIterator<Item = Option<&'a [u8]>>,
    {
        let mut record = CompositeRecord::new();
        for field in iter {
            match field {
                Some(bytes) => record.push_field(bytes),
                None => record.push_null(),
            }
        }
        record
    }
}

impl<'r> IntoIterator for &'r CompositeRecord {
    type IntoIter = CompositeRecordIter<'r>;
    type Item = Option<&'r [u8]>;

    fn into_iter(self) -> CompositeRecordIter<'r> {
        self.iter()
    }
}

/// An iterator over the fields in a composite record.
///
/// NULL fields are yielded as `None`.
pub struct CompositeRecordIter<'r> {
    r: &'r CompositeRecord,
    i: usize,
}

impl<'r> Iterator for CompositeRecordIter<'r> {
    type Item = Option<&'r [u8]>;

    fn next(&mut self) -> Option<Option<&'r [u8]>> {
        let field = self.r.get(self.i)?;
        self.i += 1;
        Some(field)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.r.len() - self.i;
        (n, Some(n))
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for CompositeRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeSeq;

        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for field in self.iter() {
            seq.serialize_element(&field.map(|b| b.as_bstr()))?;
        }
        seq.end()
    }
}
