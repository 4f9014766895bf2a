use std::path::PathBuf;

/// Size of a page in bytes (4 KB)
pub const PAGE_SIZE: usize = 4096;

/// Number of slot entries in the directory at the start of every page
pub const MAX_SLOTS: usize = 128;

/// Size of one encoded slot entry: empty flag (1) + offset (2) + length (2)
pub const SLOT_SIZE: usize = 6;

/// Size of the slot directory; the payload region starts here
pub const METADATA_SIZE: usize = SLOT_SIZE * MAX_SLOTS;

/// Sentinel marking an undefined slot offset or length
pub const INVALID_SLOT_VALUE: u16 = 0xFFFF;

/// Size of a field record header: type tag (1) + payload length (4)
pub const FIELD_HEADER_SIZE: usize = 5;

/// Backing file used when no path is configured
pub const DEFAULT_DB_PATH: &str = "slotdb.dat";

/// Runtime options for a `StorageManager`.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Path of the backing page file
    pub db_path: PathBuf,
    /// Whether extend and flush call `sync_data` after writing
    pub sync_on_write: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            sync_on_write: true,
        }
    }
}

impl StorageConfig {
    /// Creates a config for the given file with default options.
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            ..Self::default()
        }
    }

    pub fn builder() -> StorageConfigBuilder {
        StorageConfigBuilder::default()
    }
}

/// Builder for `StorageConfig`
#[derive(Default)]
pub struct StorageConfigBuilder {
    config: StorageConfig,
}

impl StorageConfigBuilder {
    /// Set the backing file path
    pub fn db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.db_path = path.into();
        self
    }

    /// Enable or disable `sync_data` after each write
    pub fn sync_on_write(mut self, sync: bool) -> Self {
        self.config.sync_on_write = sync;
        self
    }

    pub fn build(self) -> StorageConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_layout() {
        assert_eq!(METADATA_SIZE, 768);
        assert!(METADATA_SIZE < PAGE_SIZE);
        assert!(PAGE_SIZE <= u16::MAX as usize);
    }

    #[test]
    fn test_config_builder() {
        let config = StorageConfig::builder()
            .db_path("/tmp/pages.dat")
            .sync_on_write(false)
            .build();

        assert_eq!(config.db_path, PathBuf::from("/tmp/pages.dat"));
        assert!(!config.sync_on_write);

        let default = StorageConfig::default();
        assert_eq!(default.db_path, PathBuf::from(DEFAULT_DB_PATH));
        assert!(default.sync_on_write);
    }
}
