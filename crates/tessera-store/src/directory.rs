use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::io::{BufRead, Write};
use std::path::Path;

use tessera_types::{Message, SerializeResult, Serializer};

use crate::config::DirectoryStoreConfig;
use crate::error::StoreResult;
use crate::files::{FileStore, ValueEncoding};
use crate::key::KeyCodec;
use crate::traits::{ReadOnlyStore, ReadWriteStore};

/// One serialized message per file.
pub(crate) struct SingleMessage<S>(S);

impl<M, S> ValueEncoding<M> for SingleMessage<S>
where
    M: Message,
    S: Serializer,
{
    fn write(&self, out: &mut dyn Write, value: &M) -> SerializeResult<usize> {
        self.0.serialize(out, value)
    }

    fn read(&self, input: &mut dyn BufRead) -> SerializeResult<M> {
        self.0.deserialize(input, M::descriptor())
    }

    fn unreadable_previous(&self) -> Option<M> {
        None
    }

    fn name(&self) -> &'static str {
        self.0.name()
    }
}

/// `K -> M` store keeping one file per key in a directory.
///
/// Reads are served from a read-through cache under the shared lock; writes
/// stage the serialized message in the temp directory and rename it over
/// the key's file under the exclusive lock. At most one store instance
/// should write to a directory at a time, and files must not be edited by
/// hand while a store is open on it.
///
/// A put or remove over a file that cannot be read still supersedes it; the
/// key is then left out of the returned previous values.
pub struct DirectoryMessageStore<K, M, C, S> {
    inner: FileStore<K, M, C, SingleMessage<S>>,
}

impl<K, M, C, S> DirectoryMessageStore<K, M, C, S>
where
    K: Eq + Hash + Clone + Send + Sync,
    M: Message,
    C: KeyCodec<K>,
    S: Serializer,
{
    /// Open a store over an existing directory with the default config.
    pub fn open(directory: impl AsRef<Path>, codec: C, serializer: S) -> StoreResult<Self> {
        Self::open_with_config(directory, codec, serializer, DirectoryStoreConfig::default())
    }

    /// Open a store over an existing directory.
    ///
    /// Fails if `directory` is not a directory, if the temp directory cannot
    /// be created, or if any file in `directory` does not parse as a key.
    pub fn open_with_config(
        directory: impl AsRef<Path>,
        codec: C,
        serializer: S,
        config: DirectoryStoreConfig,
    ) -> StoreResult<Self> {
        let inner = FileStore::open(directory.as_ref(), codec, SingleMessage(serializer), config)?;
        Ok(Self { inner })
    }

    /// Drop the cache and the key index. Files are kept; every later call
    /// on this instance fails with [`StoreError::Closed`](crate::StoreError::Closed).
    pub fn close(&self) -> StoreResult<()> {
        self.inner.close()
    }

    pub fn directory(&self) -> &Path {
        self.inner.directory()
    }

    pub fn temp_directory(&self) -> &Path {
        self.inner.temp_directory()
    }

    pub fn config(&self) -> &DirectoryStoreConfig {
        self.inner.config()
    }
}

impl<K, M, C, S> ReadOnlyStore<K, M> for DirectoryMessageStore<K, M, C, S>
where
    K: Eq + Hash + Clone + Send + Sync,
    M: Message,
    C: KeyCodec<K>,
    S: Serializer,
{
    fn get_all(&self, keys: &[K]) -> StoreResult<HashMap<K, M>> {
        self.inner.get_all(keys)
    }

    fn contains_key(&self, key: &K) -> StoreResult<bool> {
        self.inner.contains_key(key)
    }

    fn keys(&self) -> StoreResult<HashSet<K>> {
        self.inner.keys()
    }

    fn size(&self) -> StoreResult<usize> {
        self.inner.size()
    }
}

impl<K, M, C, S> ReadWriteStore<K, M> for DirectoryMessageStore<K, M, C, S>
where
    K: Eq + Hash + Clone + Send + Sync,
    M: Message,
    C: KeyCodec<K>,
    S: Serializer,
{
    fn put_all(&self, values: HashMap<K, M>) -> StoreResult<HashMap<K, M>> {
        self.inner.put_all(values)
    }

    fn remove_all(&self, keys: &[K]) -> StoreResult<HashMap<K, M>> {
        self.inner.remove_all(keys)
    }
}

impl<K, M, C, S> std::fmt::Debug for DirectoryMessageStore<K, M, C, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryMessageStore")
            .field("directory", &self.inner.directory())
            .finish()
    }
}
