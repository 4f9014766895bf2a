use std::fmt;
use std::io::{Read, Write};

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::FieldType;
use crate::common::io::{ensure_remaining, read_record};
use crate::common::{Result, SlotDbError, FIELD_HEADER_SIZE};

/// A single typed scalar stored as raw payload bytes.
///
/// ## Field Binary Format
///
/// ```text
/// +----------+----------------+------------------+
/// | Type Tag | Payload Length | Payload          |
/// | (1 byte) | (4 bytes, LE)  | (length bytes)   |
/// +----------+----------------+------------------+
/// ```
///
/// - **INT / FLOAT**: payload is the 4-byte little-endian value
/// - **STRING**: payload is the string bytes plus one NUL terminator, so the
///   recorded length is `string_len + 1`
///
/// Cloning produces an independent payload buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    field_type: FieldType,
    data: Vec<u8>,
}

impl Field {
    /// Creates an INT field.
    pub fn from_int(value: i32) -> Self {
        Self {
            field_type: FieldType::Int,
            data: value.to_le_bytes().to_vec(),
        }
    }

    /// Creates a FLOAT field.
    pub fn from_float(value: f32) -> Self {
        Self {
            field_type: FieldType::Float,
            data: value.to_le_bytes().to_vec(),
        }
    }

    /// Creates a STRING field. The stored payload carries a trailing NUL.
    pub fn from_string(value: &str) -> Self {
        let mut data = Vec::with_capacity(value.len() + 1);
        data.extend_from_slice(value.as_bytes());
        data.push(0);
        Self {
            field_type: FieldType::String,
            data,
        }
    }

    /// Returns the type of this field.
    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    /// Returns the raw payload length, including a string's terminator.
    pub fn data_length(&self) -> usize {
        self.data.len()
    }

    /// Returns the raw payload bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the value of an INT field.
    pub fn as_int(&self) -> Result<i32> {
        self.fixed_payload(FieldType::Int).map(i32::from_le_bytes)
    }

    /// Returns the value of a FLOAT field.
    pub fn as_float(&self) -> Result<f32> {
        self.fixed_payload(FieldType::Float).map(f32::from_le_bytes)
    }

    /// Returns the text of a STRING field, up to the first NUL byte.
    pub fn as_str(&self) -> Result<&str> {
        if self.field_type != FieldType::String {
            return Err(self.mismatch(FieldType::String));
        }
        let end = self
            .data
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(self.data.len());
        std::str::from_utf8(&self.data[..end])
            .map_err(|e| SlotDbError::Serialization(format!("string field is not UTF-8: {}", e)))
    }

    /// Returns an owned copy of a STRING field's text.
    pub fn as_string(&self) -> Result<String> {
        self.as_str().map(str::to_string)
    }

    fn fixed_payload(&self, expected: FieldType) -> Result<[u8; 4]> {
        if self.field_type != expected {
            return Err(self.mismatch(expected));
        }
        <[u8; 4]>::try_from(self.data.as_slice()).map_err(|_| self.mismatch(expected))
    }

    fn mismatch(&self, expected: FieldType) -> SlotDbError {
        SlotDbError::TypeMismatch {
            expected,
            found: self.field_type,
            length: self.data.len(),
        }
    }

    /// Returns the exact size of this field's wire record.
    pub fn encoded_len(&self) -> usize {
        FIELD_HEADER_SIZE + self.data.len()
    }

    /// Appends the wire record to `buf`.
    pub fn encode<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(self.field_type.tag());
        buf.put_u32_le(self.data.len() as u32);
        buf.put_slice(&self.data);
    }

    /// Serializes the field to a standalone buffer.
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

    /// Decodes one field record from the front of `buf`.
    ///
    /// A record cut short fails with `Truncated`; a bad tag or a fixed-size
    /// type with a length other than 4 fails with `Serialization`.
    pub fn decode<B: Buf>(buf: &mut B) -> Result<Field> {
        ensure_remaining(buf, FIELD_HEADER_SIZE)?;
        let tag = buf.get_u8();
        let length = buf.get_u32_le() as usize;
        let field_type = FieldType::try_from(tag)?;

        match field_type {
            FieldType::Int | FieldType::Float => {
                if length != 4 {
                    return Err(SlotDbError::Serialization(format!(
                        "{} field: bad length {}",
                        field_type, length
                    )));
                }
                ensure_remaining(buf, 4)?;
                if field_type == FieldType::Int {
                    Ok(Field::from_int(buf.get_i32_le()))
                } else {
                    Ok(Field::from_float(buf.get_f32_le()))
                }
            }
            FieldType::String => {
                ensure_remaining(buf, length)?;
                let mut payload = vec![0u8; length];
                buf.copy_to_slice(&mut payload);

                let end = payload.iter().position(|&b| b == 0).unwrap_or(length);
                let text = std::str::from_utf8(&payload[..end]).map_err(|e| {
                    SlotDbError::Serialization(format!("string field is not UTF-8: {}", e))
                })?;
                Ok(Field::from_string(text))
            }
        }
    }

    /// Reads one field record from a stream.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Field> {
        let mut header = [0u8; FIELD_HEADER_SIZE];
        read_record(reader, &mut header)?;
        FieldType::try_from(header[0])?;

        let length = u32::from_le_bytes([header[1], header[2], header[3], header[4]]) as usize;
        let mut record = header.to_vec();
        let read = reader.take(length as u64).read_to_end(&mut record)?;
        if read < length {
            return Err(SlotDbError::Truncated {
                expected: length,
                available: read,
            });
        }

        Field::decode(&mut record.as_slice())
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = match self.field_type {
            FieldType::Int => self.as_int().map(|v| v.to_string()),
            FieldType::Float => self.as_float().map(|v| v.to_string()),
            FieldType::String => self.as_string(),
        };
        match rendered {
            Ok(s) => write!(f, "{}", s),
            Err(_) => write!(f, "<invalid {}>", self.field_type),
        }
    }
}

impl From<i32> for Field {
    fn from(v: i32) -> Self {
        Field::from_int(v)
    }
}

impl From<f32> for Field {
    fn from(v: f32) -> Self {
        Field::from_float(v)
    }
}

impl From<&str> for Field {
    fn from(v: &str) -> Self {
        Field::from_string(v)
    }
}

impl From<String> for Field {
    fn from(v: String) -> Self {
        Field::from_string(&v)
    }
}
