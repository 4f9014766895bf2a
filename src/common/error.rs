use thiserror::Error;

use super::types::{PageId, SlotId};
use crate::tuple::FieldType;

/// Coarse classification of a `SlotDbError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A typed accessor did not match the stored field
    Validation,
    /// A record could not be decoded
    Serialization,
    /// A tuple does not fit; the caller may route it elsewhere
    Capacity,
    /// A slot index or page id is out of bounds
    Range,
    /// The addressed slot holds no tuple
    NotFound,
    /// The backing file or input stream failed
    Io,
}

/// Storage engine error types
#[derive(Error, Debug)]
pub enum SlotDbError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Truncated record: expected {expected} bytes, {available} available")]
    Truncated { expected: usize, available: usize },

    #[error("Corrupted file: short read of {page_id} ({read} of {expected} bytes)")]
    CorruptedFile {
        page_id: PageId,
        read: usize,
        expected: usize,
    },

    #[error("Type mismatch: expected {expected}, found {found} with {length} payload bytes")]
    TypeMismatch {
        expected: FieldType,
        found: FieldType,
        length: usize,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Tuple too large: {size} bytes exceeds addressable maximum {max}")]
    TupleTooLarge { size: usize, max: usize },

    #[error("Page is full: all {0} slots are occupied")]
    PageFull(usize),

    #[error("Insufficient free space: tuple size {tuple_size} exceeds available {available}")]
    NoSpace { tuple_size: usize, available: usize },

    #[error("Invalid slot ID: {0}")]
    InvalidSlotId(SlotId),

    #[error("Slot {0} is empty")]
    EmptySlot(SlotId),

    #[error("Invalid page ID: {page_id}, file has {num_pages} pages")]
    InvalidPageId { page_id: PageId, num_pages: u64 },
}

impl SlotDbError {
    /// Returns the error class this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SlotDbError::Io(_) | SlotDbError::Truncated { .. } | SlotDbError::CorruptedFile { .. } => {
                ErrorKind::Io
            }
            SlotDbError::TypeMismatch { .. } => ErrorKind::Validation,
            SlotDbError::Serialization(_) => ErrorKind::Serialization,
            SlotDbError::TupleTooLarge { .. } | SlotDbError::PageFull(_) | SlotDbError::NoSpace { .. } => {
                ErrorKind::Capacity
            }
            SlotDbError::InvalidSlotId(_) | SlotDbError::InvalidPageId { .. } => ErrorKind::Range,
            SlotDbError::EmptySlot(_) => ErrorKind::NotFound,
        }
    }

    /// Capacity and lookup misses leave all state untouched and can be
    /// handled by the caller, e.g. by trying another page.
    pub fn is_recoverable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Capacity | ErrorKind::NotFound)
    }
}

pub type Result<T> = std::result::Result<T, SlotDbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(SlotDbError::PageFull(128).kind(), ErrorKind::Capacity);
        assert_eq!(
            SlotDbError::InvalidSlotId(SlotId::new(200)).kind(),
            ErrorKind::Range
        );
        assert_eq!(SlotDbError::EmptySlot(SlotId::new(0)).kind(), ErrorKind::NotFound);
        assert_eq!(
            SlotDbError::Truncated {
                expected: 4,
                available: 1
            }
            .kind(),
            ErrorKind::Io
        );
        assert_eq!(
            SlotDbError::Serialization("bad length".into()).kind(),
            ErrorKind::Serialization
        );
    }

    #[test]
    fn test_recoverable() {
        assert!(SlotDbError::NoSpace {
            tuple_size: 100,
            available: 10
        }
        .is_recoverable());
        assert!(!SlotDbError::InvalidPageId {
            page_id: PageId::new(3),
            num_pages: 1
        }
        .is_recoverable());
    }

    #[test]
    fn test_error_display() {
        let err = SlotDbError::TypeMismatch {
            expected: FieldType::Int,
            found: FieldType::String,
            length: 3,
        };
        assert_eq!(
            err.to_string(),
            "Type mismatch: expected INT, found STRING with 3 payload bytes"
        );
    }
}
