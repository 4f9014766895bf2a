use std::fmt;
use std::sync::Arc;

use crate::common::{
    default_logger, Logger, Result, SlotDbError, SlotId, INVALID_SLOT_VALUE, MAX_SLOTS,
    METADATA_SIZE, PAGE_SIZE, SLOT_SIZE,
};
use crate::tuple::Tuple;

/// Slotted page layout:
///
/// +---------------------------+  offset 0
/// | Slot[0]                   |
/// | Slot[1]                   |
/// | ...                       |
/// | Slot[MAX_SLOTS - 1]       |
/// +---------------------------+  offset METADATA_SIZE
/// | Tuple Data                |  (grows upward from METADATA_SIZE)
/// | [tuple a][tuple b] ...    |
/// |                           |
/// | Free Space                |
/// +---------------------------+  offset PAGE_SIZE
///
/// Each slot entry is SLOT_SIZE bytes:
///   - empty: u8 (0 = occupied, anything else = empty)
///   - offset: u16 LE (offset from start of page to tuple data)
///   - length: u16 LE (length of the serialized tuple)
const EMPTY_FLAG_OFFSET: usize = 0;
const SLOT_OFFSET_OFFSET: usize = 1;
const SLOT_LENGTH_OFFSET: usize = 3;

/// Represents a slot entry in the slot directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    /// Whether the slot is free (a tombstone keeps its old offset/length)
    pub empty: bool,
    /// Offset from start of page to tuple data, or `INVALID_SLOT_VALUE`
    pub offset: u16,
    /// Length of the tuple, or `INVALID_SLOT_VALUE`
    pub length: u16,
}

impl Slot {
    pub fn occupied(offset: u16, length: u16) -> Self {
        Self {
            empty: false,
            offset,
            length,
        }
    }

    pub fn empty() -> Self {
        Self {
            empty: true,
            offset: INVALID_SLOT_VALUE,
            length: INVALID_SLOT_VALUE,
        }
    }

    /// A slot is live only when it is occupied and describes a range inside
    /// the payload region. Zero-filled slots (offset 0) are never live.
    pub fn is_live(&self) -> bool {
        !self.empty
            && self.offset != INVALID_SLOT_VALUE
            && self.length != INVALID_SLOT_VALUE
            && self.offset as usize >= METADATA_SIZE
            && self.end() <= PAGE_SIZE
    }

    /// One past the last payload byte of this slot.
    pub fn end(&self) -> usize {
        self.offset as usize + self.length as usize
    }

    fn decode(bytes: &[u8]) -> Self {
        Self {
            empty: bytes[EMPTY_FLAG_OFFSET] != 0,
            offset: u16::from_le_bytes([
                bytes[SLOT_OFFSET_OFFSET],
                bytes[SLOT_OFFSET_OFFSET + 1],
            ]),
            length: u16::from_le_bytes([
                bytes[SLOT_LENGTH_OFFSET],
                bytes[SLOT_LENGTH_OFFSET + 1],
            ]),
        }
    }

    fn encode(&self, out: &mut [u8]) {
        out[EMPTY_FLAG_OFFSET] = u8::from(self.empty);
        out[SLOT_OFFSET_OFFSET..SLOT_OFFSET_OFFSET + 2].copy_from_slice(&self.offset.to_le_bytes());
        out[SLOT_LENGTH_OFFSET..SLOT_LENGTH_OFFSET + 2].copy_from_slice(&self.length.to_le_bytes());
    }
}

/// An in-memory 4 KB page holding serialized tuples addressed by slot id.
///
/// Inserts append at the tail of the payload region. When the tail has no
/// room but the page as a whole does, live tuples are compacted toward the
/// slot directory first. Deletes only tombstone the slot.
///
/// A page is not internally synchronized; each instance has a single owner.
pub struct SlottedPage {
    data: Box<[u8; PAGE_SIZE]>,
    logger: Arc<dyn Logger>,
}

impl SlottedPage {
    /// Creates an empty page that reports to the default logger.
    pub fn new() -> Self {
        Self::with_logger(default_logger())
    }

    /// Creates an empty page: zeroed payload, every slot empty.
    pub fn with_logger(logger: Arc<dyn Logger>) -> Self {
        let mut page = Self {
            data: Box::new([0u8; PAGE_SIZE]),
            logger,
        };
        for index in 0..MAX_SLOTS {
            page.set_slot(index, Slot::empty());
        }
        page
    }

    /// Wraps an existing page image, e.g. one read from disk.
    pub fn from_raw(data: Box<[u8; PAGE_SIZE]>, logger: Arc<dyn Logger>) -> Self {
        Self { data, logger }
    }

    /// Size of the slot directory at the start of the page.
    pub const fn metadata_size() -> usize {
        METADATA_SIZE
    }

    /// Returns the raw page image (exactly PAGE_SIZE bytes).
    pub fn raw_data(&self) -> &[u8; PAGE_SIZE] {
        &self.data
    }

    /// Returns the raw page image for direct modification.
    pub fn raw_data_mut(&mut self) -> &mut [u8; PAGE_SIZE] {
        &mut self.data
    }

    fn slot_at(&self, index: usize) -> Slot {
        let base = index * SLOT_SIZE;
        Slot::decode(&self.data[base..base + SLOT_SIZE])
    }

    fn set_slot(&mut self, index: usize, slot: Slot) {
        let base = index * SLOT_SIZE;
        slot.encode(&mut self.data[base..base + SLOT_SIZE]);
    }

    fn check_slot_id(slot_id: SlotId) -> Result<usize> {
        let index = slot_id.as_usize();
        if index >= MAX_SLOTS {
            return Err(SlotDbError::InvalidSlotId(slot_id));
        }
        Ok(index)
    }

    /// Gets a slot entry by slot ID.
    pub fn slot(&self, slot_id: SlotId) -> Result<Slot> {
        let index = Self::check_slot_id(slot_id)?;
        Ok(self.slot_at(index))
    }

    fn live_slots(&self) -> impl Iterator<Item = (usize, Slot)> + '_ {
        (0..MAX_SLOTS)
            .map(move |i| (i, self.slot_at(i)))
            .filter(|(_, slot)| slot.is_live())
    }

    /// Sum of the lengths of all live tuples.
    pub fn used_bytes(&self) -> usize {
        self.live_slots().map(|(_, slot)| slot.length as usize).sum()
    }

    /// Payload bytes not held by live tuples, including fragmented space.
    pub fn free_bytes(&self) -> usize {
        (PAGE_SIZE - METADATA_SIZE).saturating_sub(self.used_bytes())
    }

    /// Highest payload offset occupied by a live tuple.
    pub fn tail(&self) -> usize {
        self.live_slots()
            .map(|(_, slot)| slot.end())
            .max()
            .unwrap_or(METADATA_SIZE)
            .max(METADATA_SIZE)
    }

    /// Stores the tuple and returns its slot ID.
    ///
    /// Fails with `TupleTooLarge` if the serialized tuple cannot be addressed
    /// by a 16-bit length, `PageFull` if no slot is free, and `NoSpace` if it
    /// does not fit even after compaction. A failed insert leaves the page
    /// untouched.
    ///
    /// The slot taken is the first one that is not live. Besides empty slots
    /// this includes slots flagged occupied whose offset or length is the
    /// sentinel or points outside the payload region, since they hold no
    /// readable tuple.
    pub fn add_tuple(&mut self, tuple: &Tuple) -> Result<SlotId> {
        let serialized = tuple.to_bytes();
        let tuple_size = serialized.len();

        if tuple_size > u16::MAX as usize {
            return Err(SlotDbError::TupleTooLarge {
                size: tuple_size,
                max: u16::MAX as usize,
            });
        }

        let index = match (0..MAX_SLOTS).find(|&i| !self.slot_at(i).is_live()) {
            Some(index) => index,
            None => {
                self.logger
                    .info(&format!("reached maximum slot number ({})", MAX_SLOTS));
                return Err(SlotDbError::PageFull(MAX_SLOTS));
            }
        };

        let mut tail = self.tail();
        if tail + tuple_size > PAGE_SIZE {
            let available = self.free_bytes();
            if tuple_size > available {
                self.logger.info(&format!(
                    "no free space for tuple of {} bytes, {} bytes free",
                    tuple_size, available
                ));
                return Err(SlotDbError::NoSpace {
                    tuple_size,
                    available,
                });
            }

            self.logger.debug(&format!(
                "tail {} cannot fit {} bytes, compacting",
                tail, tuple_size
            ));
            self.compact();
            tail = self.tail();
        }
        debug_assert!(tail + tuple_size <= PAGE_SIZE);

        self.data[tail..tail + tuple_size].copy_from_slice(&serialized);
        self.set_slot(index, Slot::occupied(tail as u16, tuple_size as u16));

        Ok(SlotId::new(index as u16))
    }

    /// Moves every live tuple, in ascending offset order, into one contiguous
    /// run starting at METADATA_SIZE and zeroes the rest of the payload.
    /// Slot ids and lengths are unchanged.
    fn compact(&mut self) {
        let mut live: Vec<(usize, Slot)> = self.live_slots().collect();
        live.sort_by_key(|(_, slot)| slot.offset);

        let mut cursor = METADATA_SIZE;
        for (index, slot) in live {
            let start = slot.offset as usize;
            let length = slot.length as usize;
            if start != cursor {
                self.data.copy_within(start..start + length, cursor);
                self.set_slot(index, Slot::occupied(cursor as u16, slot.length));
            }
            cursor += length;
        }

        self.data[cursor..].fill(0);
        self.logger.info(&format!(
            "compaction finished, {} free bytes at tail",
            PAGE_SIZE - cursor
        ));
    }

    /// Marks the slot empty. Payload bytes stay where they are until a later
    /// insert triggers compaction. Deleting an empty slot is a no-op.
    pub fn delete_tuple(&mut self, slot_id: SlotId) -> Result<()> {
        let index = Self::check_slot_id(slot_id)?;
        let slot = self.slot_at(index);
        if !slot.empty {
            self.set_slot(index, Slot { empty: true, ..slot });
        }
        Ok(())
    }

    /// Decodes the tuple stored in the given slot.
    pub fn get_tuple(&self, slot_id: SlotId) -> Result<Tuple> {
        let index = Self::check_slot_id(slot_id)?;
        let slot = self.slot_at(index);
        if !slot.is_live() {
            return Err(SlotDbError::EmptySlot(slot_id));
        }

        Tuple::from_bytes(&self.data[slot.offset as usize..slot.end()])
    }

    /// Returns an iterator over all live slot IDs.
    pub fn slot_ids(&self) -> impl Iterator<Item = SlotId> + '_ {
        self.live_slots().map(|(i, _)| SlotId::new(i as u16))
    }

    /// Returns the number of live tuples.
    pub fn tuple_count(&self) -> usize {
        self.live_slots().count()
    }
}

impl Default for SlottedPage {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SlottedPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlottedPage")
            .field("tuple_count", &self.tuple_count())
            .field("tail", &self.tail())
            .field("used_bytes", &self.used_bytes())
            .field("free_bytes", &self.free_bytes())
            .finish()
    }
}

impl fmt::Display for SlottedPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "current tail: {}", self.tail())?;
        writeln!(f, "used bytes: {}", self.used_bytes())?;
        writeln!(f, "free bytes: {}", self.free_bytes())?;
        for (index, slot) in self.live_slots() {
            write!(f, "Slot {} : [{}] : [{}] ::", index, slot.offset, slot.length)?;
            match Tuple::from_bytes(&self.data[slot.offset as usize..slot.end()]) {
                Ok(tuple) => writeln!(f, " {}", tuple)?,
                Err(e) => writeln!(f, " <{}>", e)?,
            }
        }
        Ok(())
    }
}
