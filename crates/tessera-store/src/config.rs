use serde::{Deserialize, Serialize};

/// Flush/sync strategy for staged value files.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// `fsync` the staged file before the rename and the directory after it.
    EveryWrite,
    /// Rely on OS page-cache buffering (fastest, least durable).
    OsDefault,
}

impl Default for SyncMode {
    fn default() -> Self {
        Self::OsDefault
    }
}

/// Configuration for directory-backed stores.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryStoreConfig {
    /// Name of the staging subdirectory inside the store directory.
    pub temp_dir: String,
    /// Sync strategy for writes.
    pub sync_mode: SyncMode,
    /// Delete files left in the staging directory by interrupted writes
    /// when the store is opened.
    pub clean_stale_temp_files: bool,
}

impl Default for DirectoryStoreConfig {
    fn default() -> Self {
        Self {
            temp_dir: ".tmp".to_string(),
            sync_mode: SyncMode::default(),
            clean_stale_temp_files: true,
        }
    }
}

impl DirectoryStoreConfig {
    /// Configuration that syncs every write to stable storage.
    pub fn durable() -> Self {
        Self {
            sync_mode: SyncMode::EveryWrite,
            ..Default::default()
        }
    }
}
