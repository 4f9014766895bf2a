use std::fmt;
use std::io::{Read, Write};

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::Field;
use crate::common::io::{ensure_remaining, read_record};
use crate::common::Result;

/// An ordered sequence of fields, stored as one record in a page.
///
/// A tuple owns its fields and can only be moved, never implicitly copied.
///
/// ## Tuple Binary Format
///
/// ```text
/// +---------------+-----------+-----------+-----+
/// | Field Count   | Field 0   | Field 1   | ... |
/// | (4 bytes, LE) | (record)  | (record)  |     |
/// +---------------+-----------+-----------+-----+
/// ```
///
/// Field records are concatenated in insertion order with no padding.
#[derive(Debug, Default, PartialEq)]
pub struct Tuple {
    fields: Vec<Field>,
}

impl Tuple {
    /// Creates an empty tuple.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> TupleBuilder {
        TupleBuilder::default()
    }

    /// Appends a field.
    pub fn add_field(&mut self, field: impl Into<Field>) {
        self.fields.push(field.into());
    }

    /// Returns the field at the given position.
    pub fn field(&self, index: usize) -> Option<&Field> {
        self.fields.get(index)
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Returns the number of fields in this tuple.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Capacity hint: the sum of the fields' payload lengths.
    ///
    /// This leaves out the count prefix and each field's 5-byte header, so it
    /// is always smaller than `encoded_len()`. Use `encoded_len()` to plan
    /// page space.
    pub fn size(&self) -> usize {
        self.fields.iter().map(Field::data_length).sum()
    }

    /// Returns the exact serialized size of this tuple.
    pub fn encoded_len(&self) -> usize {
        4 + self.fields.iter().map(Field::encoded_len).sum::<usize>()
    }

    /// Appends the wire record to `buf`.
    pub fn encode<B: BufMut>(&self, buf: &mut B) {
        buf.put_u32_le(self.fields.len() as u32);
        for field in &self.fields {
            field.encode(buf);
        }
    }

    /// Serializes the tuple for storage.
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.encode(&mut buf);
        buf.freeze()
    }

    /// Writes the wire record to a stream.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.to_bytes())?;
        Ok(())
    }

    /// Decodes a tuple from the front of `buf`.
    /// Any failing field aborts the whole decode.
    pub fn decode<B: Buf>(buf: &mut B) -> Result<Tuple> {
        ensure_remaining(buf, 4)?;
        let count = buf.get_u32_le() as usize;

        // Every field needs at least a header, which bounds the allocation.
        let mut fields = Vec::with_capacity(count.min(buf.remaining() / 5));
        for _ in 0..count {
            fields.push(Field::decode(buf)?);
        }
        Ok(Tuple { fields })
    }

    /// Decodes a tuple from a byte slice, ignoring trailing bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Tuple> {
        let mut buf = data;
        Self::decode(&mut buf)
    }

    /// Reads a tuple record from a stream.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Tuple> {
        let mut header = [0u8; 4];
        read_record(reader, &mut header)?;
        let count = u32::from_le_bytes(header);

        let mut tuple = Tuple::new();
        for _ in 0..count {
            tuple.fields.push(Field::read_from(reader)?);
        }
        Ok(tuple)
    }
}

impl FromIterator<Field> for Tuple {
    fn from_iter<I: IntoIterator<Item = Field>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Tuple {
    type Item = Field;
    type IntoIter = std::vec::IntoIter<Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", field)?;
        }
        Ok(())
    }
}

/// Builder for constructing tuples fluently.
#[derive(Default)]
pub struct TupleBuilder {
    fields: Vec<Field>,
}

impl TupleBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends any value convertible to a field.
    pub fn field(mut self, field: impl Into<Field>) -> Self {
        self.fields.push(field.into());
        self
    }

    pub fn int(self, value: i32) -> Self {
        self.field(Field::from_int(value))
    }

    pub fn float(self, value: f32) -> Self {
        self.field(Field::from_float(value))
    }

    pub fn string(self, value: &str) -> Self {
        self.field(Field::from_string(value))
    }

    pub fn build(self) -> Tuple {
        Tuple {
            fields: self.fields,
        }
    }
}
