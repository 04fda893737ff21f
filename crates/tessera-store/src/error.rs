use std::path::PathBuf;

use tessera_types::SerializeError;

/// Errors from message store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store root does not exist or is not a directory.
    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// The write staging directory could not be prepared.
    #[error("cannot use temp directory {}: {reason}", path.display())]
    TempDir { path: PathBuf, reason: String },

    /// An encoded key is not usable as a file name.
    #[error("invalid key {key:?}: {reason}")]
    InvalidKey { key: String, reason: String },

    /// A file in the store directory does not decode to a key.
    #[error("cannot parse key from file name {file_name:?}: {reason}")]
    KeyParse { file_name: String, reason: String },

    /// I/O error from the underlying filesystem.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A stored value could not be encoded or decoded.
    #[error("serialization error on {}: {source}", path.display())]
    Serialization {
        path: PathBuf,
        #[source]
        source: SerializeError,
    },

    /// The store has been closed.
    #[error("store is closed")]
    Closed,

    /// A thread panicked while holding the store lock.
    #[error("store lock poisoned")]
    Poisoned,
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn serialization(path: impl Into<PathBuf>, source: SerializeError) -> Self {
        Self::Serialization {
            path: path.into(),
            source,
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
