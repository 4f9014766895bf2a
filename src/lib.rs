//! SlotDB - a page-oriented storage engine core in Rust
//!
//! This crate answers how variable-length records are packed into fixed-size
//! disk pages, retrieved by slot id, and persisted durably.
//!
//! # Architecture
//!
//! The system is organized into a few small layers:
//!
//! - **Records** (`tuple`): Binary codec for typed values
//!   - `Field`: A self-describing INT, FLOAT or STRING record
//!   - `Tuple`: A counted, ordered sequence of fields
//!
//! - **Storage Layer** (`storage`): Page organization and disk I/O
//!   - `SlottedPage`: 4 KB page with a fixed slot directory, tail allocation
//!     and on-demand compaction
//!   - `StorageManager`: Reads and writes pages of a single backing file
//!
//! - **Common** (`common`): Constants, configuration, identifiers, errors and
//!   the injected `Logger`
//!
//! # Example
//!
//! ```rust,no_run
//! use slotdb::common::PageId;
//! use slotdb::storage::disk::StorageManager;
//! use slotdb::tuple::Tuple;
//!
//! // Open (or create) a page file; a fresh file has page 0 ready
//! let storage = StorageManager::open("example.dat").unwrap();
//!
//! // Load page 0 and insert a tuple
//! let mut page = storage.load(PageId::new(0)).unwrap();
//! let tuple = Tuple::builder().int(7).float(2.5).string("hi").build();
//! let slot_id = page.add_tuple(&tuple).unwrap();
//!
//! // Persist the page and read it back
//! storage.flush(PageId::new(0), &page).unwrap();
//! let reloaded = storage.load(PageId::new(0)).unwrap();
//! assert_eq!(reloaded.get_tuple(slot_id).unwrap(), tuple);
//! ```

pub mod common;
pub mod storage;
pub mod tuple;

// Re-export commonly used types at the crate root
pub use common::{PageId, Result, SlotDbError, SlotId};
