use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::common::io::read_full;
use crate::common::{
    default_logger, Logger, PageId, Result, SlotDbError, StorageConfig, PAGE_SIZE,
};
use crate::storage::page::SlottedPage;

/// Upper bound on zero pages written by a single `write_all` when extending.
const EXTEND_CHUNK_PAGES: u64 = 64;

/// File handle and page count, guarded together so every file operation
/// sees a consistent count.
struct FileState {
    file: File,
    num_pages: u64,
}

/// StorageManager presents a single file as a zero-based array of
/// PAGE_SIZE pages. The file has no header; its length alone determines the
/// page count.
///
/// Every operation touching the file runs under one mutex, so seek/read/write
/// sequences never interleave. There is no page cache: each `load` reads from
/// disk into a freshly allocated page.
pub struct StorageManager {
    state: Mutex<FileState>,
    /// Path to the backing file
    db_path: PathBuf,
    /// Whether to `sync_data` after each write
    sync_on_write: bool,
    logger: Arc<dyn Logger>,
}

impl StorageManager {
    /// Opens the page file at the given path, creating it if it doesn't
    /// exist. A fresh file gets one zero-filled page.
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        Self::with_config(StorageConfig::new(db_path.as_ref()), default_logger())
    }

    /// Opens the page file described by `config`, reporting to `logger`.
    pub fn with_config(config: StorageConfig, logger: Arc<dyn Logger>) -> Result<Self> {
        let file = Self::open_or_create(&config.db_path, logger.as_ref())?;

        let manager = Self {
            state: Mutex::new(FileState { file, num_pages: 0 }),
            db_path: config.db_path,
            sync_on_write: config.sync_on_write,
            logger,
        };

        let num_pages = {
            let mut state = manager.state.lock();
            manager.recompute_pages(&mut state)?;
            if state.num_pages == 0 {
                manager.append_pages(&mut state, 1)?;
            }
            state.num_pages
        };

        manager.logger.info(&format!(
            "storage manager opened '{}', pages={}",
            manager.db_path.display(),
            num_pages
        ));
        Ok(manager)
    }

    fn open_or_create(path: &Path, logger: &dyn Logger) -> Result<File> {
        let open = || OpenOptions::new().read(true).write(true).open(path);

        match open() {
            Ok(file) => Ok(file),
            Err(e) => {
                logger.info(&format!("creating '{}' ({})", path.display(), e));
                OpenOptions::new()
                    .write(true)
                    .create(true)
                    .truncate(false)
                    .open(path)?;
                Ok(open()?)
            }
        }
    }

    /// Derives the page count from the current file length.
    fn recompute_pages(&self, state: &mut FileState) -> Result<()> {
        let file_size = state.file.metadata()?.len();
        let trailing = file_size % PAGE_SIZE as u64;
        if trailing != 0 {
            self.logger.debug(&format!(
                "'{}' has {} trailing bytes past the last full page",
                self.db_path.display(),
                trailing
            ));
        }
        state.num_pages = file_size / PAGE_SIZE as u64;
        Ok(())
    }

    /// Writes `count` zero-filled pages after the last full page, in chunks
    /// of at most `EXTEND_CHUNK_PAGES`, and grows the page count by `count`.
    ///
    /// An extension whose end would not be addressable as a byte offset fails
    /// with `InvalidPageId` before anything is written.
    fn append_pages(&self, state: &mut FileState, count: u64) -> Result<()> {
        let end = state
            .num_pages
            .checked_add(count)
            .filter(|&pages| pages.checked_mul(PAGE_SIZE as u64).is_some());
        if end.is_none() {
            return Err(SlotDbError::InvalidPageId {
                page_id: PageId::new(state.num_pages.saturating_add(count).saturating_sub(1)),
                num_pages: state.num_pages,
            });
        }

        let offset = PageId::new(state.num_pages).file_offset(PAGE_SIZE);
        state.file.seek(SeekFrom::Start(offset))?;

        let zeros = vec![0u8; count.min(EXTEND_CHUNK_PAGES) as usize * PAGE_SIZE];
        let mut remaining = count;
        while remaining > 0 {
            let chunk = remaining.min(EXTEND_CHUNK_PAGES);
            state.file.write_all(&zeros[..chunk as usize * PAGE_SIZE])?;
            state.num_pages += chunk;
            remaining -= chunk;
        }
        self.persist(&mut state.file)?;

        self.logger.debug(&format!(
            "extended '{}' by {} pages to {}",
            self.db_path.display(),
            count,
            state.num_pages
        ));
        Ok(())
    }

    fn persist(&self, file: &mut File) -> Result<()> {
        file.flush()?;
        if self.sync_on_write {
            file.sync_data()?;
        }
        Ok(())
    }

    fn check_page_id(state: &FileState, page_id: PageId) -> Result<()> {
        if page_id.as_u64() >= state.num_pages {
            return Err(SlotDbError::InvalidPageId {
                page_id,
                num_pages: state.num_pages,
            });
        }
        Ok(())
    }

    /// Appends one zero-filled page and returns its ID.
    pub fn extend_one(&self) -> Result<PageId> {
        let mut state = self.state.lock();
        self.append_pages(&mut state, 1)?;
        Ok(PageId::new(state.num_pages - 1))
    }

    /// Ensures the file holds at least `page_id + 1` pages.
    pub fn extend_to(&self, page_id: PageId) -> Result<()> {
        let mut state = self.state.lock();
        let required = page_id
            .as_u64()
            .checked_add(1)
            .ok_or(SlotDbError::InvalidPageId {
                page_id,
                num_pages: state.num_pages,
            })?;
        if required <= state.num_pages {
            return Ok(());
        }
        let missing = required - state.num_pages;
        self.append_pages(&mut state, missing)
    }

    /// Reads a page from disk into a new `SlottedPage`.
    ///
    /// A short read means the file no longer matches its page count and
    /// fails with `CorruptedFile`.
    pub fn load(&self, page_id: PageId) -> Result<SlottedPage> {
        let mut state = self.state.lock();
        Self::check_page_id(&state, page_id)?;

        let mut data = Box::new([0u8; PAGE_SIZE]);
        state.file.seek(SeekFrom::Start(page_id.file_offset(PAGE_SIZE)))?;
        let read = read_full(&mut state.file, &mut data[..])?;
        if read < PAGE_SIZE {
            return Err(SlotDbError::CorruptedFile {
                page_id,
                read,
                expected: PAGE_SIZE,
            });
        }

        Ok(SlottedPage::from_raw(data, Arc::clone(&self.logger)))
    }

    /// Overwrites a page on disk with the given page image.
    pub fn flush(&self, page_id: PageId, page: &SlottedPage) -> Result<()> {
        let mut state = self.state.lock();
        Self::check_page_id(&state, page_id)?;

        state.file.seek(SeekFrom::Start(page_id.file_offset(PAGE_SIZE)))?;
        state.file.write_all(page.raw_data())?;
        self.persist(&mut state.file)
    }

    /// Returns the number of pages in the file.
    pub fn num_pages(&self) -> u64 {
        self.state.lock().num_pages
    }

    /// Returns the path to the backing file.
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Forces all written data and metadata to disk.
    pub fn sync(&self) -> Result<()> {
        let state = self.state.lock();
        state.file.sync_all()?;
        Ok(())
    }
}

impl Drop for StorageManager {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        let _ = state.file.flush();
        let _ = state.file.sync_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::testing::RecordingLogger;
    use crate::common::NullLogger;
    use tempfile::{tempdir, NamedTempFile};

    #[test]
    fn test_new_file_gets_one_page() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fresh.dat");
        let logger = Arc::new(RecordingLogger::default());

        let sm = StorageManager::with_config(StorageConfig::new(&path), logger.clone()).unwrap();
        assert_eq!(sm.num_pages(), 1);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), PAGE_SIZE as u64);
        assert!(logger.contains("creating"));
        assert!(logger.contains("pages=1"));
    }

    #[test]
    fn test_existing_empty_file_gets_one_page() {
        let temp_file = NamedTempFile::new().unwrap();
        let sm = StorageManager::open(temp_file.path()).unwrap();
        assert_eq!(sm.num_pages(), 1);
    }

    #[test]
    fn test_extend_one() {
        let temp_file = NamedTempFile::new().unwrap();
        let sm = StorageManager::open(temp_file.path()).unwrap();

        assert_eq!(sm.extend_one().unwrap(), PageId::new(1));
        assert_eq!(sm.extend_one().unwrap(), PageId::new(2));
        assert_eq!(sm.num_pages(), 3);
    }

    #[test]
    fn test_extend_to_increases_count() {
        let temp_file = NamedTempFile::new().unwrap();
        let sm = StorageManager::open(temp_file.path()).unwrap();
        sm.extend_one().unwrap();

        // From 2 pages, extending to page 4 adds 3, it does not set the count to 3
        sm.extend_to(PageId::new(4)).unwrap();
        assert_eq!(sm.num_pages(), 5);
        assert_eq!(
            std::fs::metadata(temp_file.path()).unwrap().len(),
            5 * PAGE_SIZE as u64
        );

        sm.extend_to(PageId::new(2)).unwrap();
        assert_eq!(sm.num_pages(), 5);
    }

    #[test]
    fn test_trailing_bytes_are_overwritten_on_extend() {
        let temp_file = NamedTempFile::new().unwrap();
        std::fs::write(temp_file.path(), vec![7u8; PAGE_SIZE + 100]).unwrap();

        let config = StorageConfig::builder()
            .db_path(temp_file.path())
            .sync_on_write(false)
            .build();
        let sm = StorageManager::with_config(config, Arc::new(NullLogger)).unwrap();
        assert_eq!(sm.num_pages(), 1);

        sm.extend_one().unwrap();
        assert_eq!(
            std::fs::metadata(temp_file.path()).unwrap().len(),
            2 * PAGE_SIZE as u64
        );
        let page = sm.load(PageId::new(1)).unwrap();
        assert!(page.raw_data().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_extend_to_unaddressable_page_fails() {
        let temp_file = NamedTempFile::new().unwrap();
        let sm = StorageManager::open(temp_file.path()).unwrap();

        for page_id in [u64::MAX, u64::MAX - 1, u64::MAX / PAGE_SIZE as u64] {
            assert!(matches!(
                sm.extend_to(PageId::new(page_id)),
                Err(SlotDbError::InvalidPageId { num_pages: 1, .. })
            ));
        }
        assert_eq!(sm.num_pages(), 1);
        assert_eq!(
            std::fs::metadata(temp_file.path()).unwrap().len(),
            PAGE_SIZE as u64
        );
    }

    #[test]
    fn test_extend_to_spans_several_chunks() {
        let temp_file = NamedTempFile::new().unwrap();
        let config = StorageConfig::builder()
            .db_path(temp_file.path())
            .sync_on_write(false)
            .build();
        let sm = StorageManager::with_config(config, Arc::new(NullLogger)).unwrap();

        let target = 2 * EXTEND_CHUNK_PAGES + 3;
        sm.extend_to(PageId::new(target)).unwrap();
        assert_eq!(sm.num_pages(), target + 1);
        assert_eq!(
            std::fs::metadata(temp_file.path()).unwrap().len(),
            (target + 1) * PAGE_SIZE as u64
        );
        assert_eq!(sm.load(PageId::new(target)).unwrap().tuple_count(), 0);
    }

    #[test]
    fn test_open_directory_is_io_error() {
        let dir = tempdir().unwrap();
        let logger = Arc::new(RecordingLogger::default());

        let err = StorageManager::with_config(StorageConfig::new(dir.path()), logger.clone())
            .err()
            .unwrap();
        assert_eq!(err.kind(), crate::common::ErrorKind::Io);
        assert!(!logger.contains("pages="));
    }

    #[test]
    fn test_load_short_read_is_corruption() {
        let temp_file = NamedTempFile::new().unwrap();
        let sm = StorageManager::open(temp_file.path()).unwrap();
        sm.extend_one().unwrap();

        // Shrink the file behind the manager's back
        std::fs::OpenOptions::new()
            .write(true)
            .open(temp_file.path())
            .unwrap()
            .set_len(PAGE_SIZE as u64 + 10)
            .unwrap();

        assert!(matches!(
            sm.load(PageId::new(1)),
            Err(SlotDbError::CorruptedFile { read: 10, .. })
        ));
    }

    #[test]
    fn test_out_of_range() {
        let temp_file = NamedTempFile::new().unwrap();
        let sm = StorageManager::open(temp_file.path()).unwrap();
        let page = SlottedPage::new();

        assert!(matches!(
            sm.load(PageId::new(1)),
            Err(SlotDbError::InvalidPageId { num_pages: 1, .. })
        ));
        assert!(matches!(
            sm.flush(PageId::new(1), &page),
            Err(SlotDbError::InvalidPageId { .. })
        ));
    }
}
