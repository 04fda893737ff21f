//! Key/value and key/list message stores for Tessera.
//!
//! A store maps keys to [`Message`](tessera_types::Message) values (or to
//! ordered sequences of them). Every store implements [`ReadOnlyStore`], and
//! writable stores add [`ReadWriteStore`]. Bulk operations are the primitive;
//! single-key operations are derived from them.
//!
//! # Storage Backends
//!
//! - [`InMemoryStore`] -- `HashMap` behind a read/write lock, for tests and embedding
//! - [`DirectoryMessageStore`] -- one file per key holding one message
//! - [`DirectoryMessageListStore`] -- one file per key holding a message sequence
//!
//! Builder-level access is layered on top of any store by the blanket
//! extension traits in [`message`].
//!
//! # Design Rules
//!
//! 1. Values handed in or out are copies; callers never share state with the store.
//! 2. Bulk results contain only keys that are present; absence is never an error.
//! 3. Every directory write is staged in the temp directory and renamed into place.
//! 4. The key index of a directory store is built on open and authoritative afterwards.
//! 5. One process writes a given directory at a time. Readers within it share a lock.
//! 6. Failures to write, delete, or read a requested value are returned to the caller.
//!    Only the read of a value being superseded is best-effort: it is logged
//!    and the write goes ahead.

pub mod config;
pub mod directory;
pub mod directory_list;
pub mod error;
mod files;
pub mod key;
pub mod memory;
pub mod message;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use config::{DirectoryStoreConfig, SyncMode};
pub use directory::DirectoryMessageStore;
pub use directory_list::DirectoryMessageListStore;
pub use error::{StoreError, StoreResult};
pub use key::{validate_file_name, DisplayKeys, FnKeys, KeyCodec, StringKeys};
pub use memory::{InMemoryMessageListStore, InMemoryMessageStore, InMemoryStore};
pub use message::{MessageListReadOnlyStore, MessageListStore, MessageReadOnlyStore, MessageStore};
pub use traits::{ReadOnlyStore, ReadWriteStore};
