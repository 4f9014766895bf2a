use std::fmt;

use crate::common::SlotDbError;

/// The primitive types a field can hold.
/// The discriminant is the type tag written at the start of a field record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FieldType {
    /// 32-bit signed integer: 4 bytes, little-endian
    Int = 0,

    /// 32-bit floating point: 4 bytes, IEEE 754, little-endian
    Float = 1,

    /// Byte string followed by a single NUL terminator
    String = 2,
}

impl FieldType {
    /// Returns the wire tag for this type.
    pub fn tag(&self) -> u8 {
        *self as u8
    }

    /// Returns the fixed payload size in bytes, or None for strings.
    pub fn fixed_size(&self) -> Option<usize> {
        match self {
            FieldType::Int | FieldType::Float => Some(4),
            FieldType::String => None,
        }
    }

    pub fn is_fixed_size(&self) -> bool {
        self.fixed_size().is_some()
    }
}

impl TryFrom<u8> for FieldType {
    type Error = SlotDbError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        match tag {
            0 => Ok(FieldType::Int),
            1 => Ok(FieldType::Float),
            2 => Ok(FieldType::String),
            other => Err(SlotDbError::Serialization(format!(
                "unknown field type tag {}",
                other
            ))),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Int => write!(f, "INT"),
            FieldType::Float => write!(f, "FLOAT"),
            FieldType::String => write!(f, "STRING"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags() {
        assert_eq!(FieldType::Int.tag(), 0);
        assert_eq!(FieldType::Float.tag(), 1);
        assert_eq!(FieldType::String.tag(), 2);

        for ty in [FieldType::Int, FieldType::Float, FieldType::String] {
            assert_eq!(FieldType::try_from(ty.tag()).unwrap(), ty);
        }
    }

    #[test]
    fn test_unknown_tag() {
        assert!(matches!(
            FieldType::try_from(3),
            Err(SlotDbError::Serialization(_))
        ));
    }

    #[test]
    fn test_fixed_size() {
        assert_eq!(FieldType::Int.fixed_size(), Some(4));
        assert_eq!(FieldType::Float.fixed_size(), Some(4));
        assert!(!FieldType::String.is_fixed_size());
    }
}
