use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::io::{BufRead, Write};
use std::path::Path;

use tessera_types::{at_end_of_stream, Message, SerializeResult, Serializer};

use crate::config::DirectoryStoreConfig;
use crate::error::StoreResult;
use crate::files::{FileStore, ValueEncoding};
use crate::key::KeyCodec;
use crate::traits::{ReadOnlyStore, ReadWriteStore};

/// Messages serialized back to back; read until the stream is drained.
pub(crate) struct MessageSequence<S>(S);

impl<M, S> ValueEncoding<Vec<M>> for MessageSequence<S>
where
    M: Message,
    S: Serializer,
{
    fn write(&self, out: &mut dyn Write, value: &Vec<M>) -> SerializeResult<usize> {
        let mut written = 0;
        for message in value {
            written += self.0.serialize(out, message)?;
        }
        Ok(written)
    }

    fn read(&self, input: &mut dyn BufRead) -> SerializeResult<Vec<M>> {
        let mut messages = Vec::new();
        while !at_end_of_stream(input)? {
            messages.push(self.0.deserialize(input, M::descriptor())?);
        }
        Ok(messages)
    }

    fn unreadable_previous(&self) -> Option<Vec<M>> {
        Some(Vec::new())
    }

    fn name(&self) -> &'static str {
        self.0.name()
    }
}

/// `K -> [M]` store keeping one file per key in a directory.
///
/// Same layout, locking, and write protocol as
/// [`DirectoryMessageStore`](crate::DirectoryMessageStore); each file holds
/// the key's whole sequence as concatenated messages. A `put` replaces the
/// whole sequence.
///
/// If the previous list cannot be read during a put or remove, the write
/// still goes ahead and the key is reported as having held an empty list.
/// The results of `put_all` and `remove_all` are not exact snapshots in
/// that case.
pub struct DirectoryMessageListStore<K, M, C, S> {
    inner: FileStore<K, Vec<M>, C, MessageSequence<S>>,
}

impl<K, M, C, S> DirectoryMessageListStore<K, M, C, S>
where
    K: Eq + Hash + Clone + Send + Sync,
    M: Message,
    C: KeyCodec<K>,
    S: Serializer,
{
    pub fn open(directory: impl AsRef<Path>, codec: C, serializer: S) -> StoreResult<Self> {
        Self::open_with_config(directory, codec, serializer, DirectoryStoreConfig::default())
    }

    pub fn open_with_config(
        directory: impl AsRef<Path>,
        codec: C,
        serializer: S,
        config: DirectoryStoreConfig,
    ) -> StoreResult<Self> {
        let inner =
            FileStore::open(directory.as_ref(), codec, MessageSequence(serializer), config)?;
        Ok(Self { inner })
    }

    /// Drop the cache and the key index. Files are kept.
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

impl<K, M, C, S> ReadOnlyStore<K, Vec<M>> for DirectoryMessageListStore<K, M, C, S>
where
    K: Eq + Hash + Clone + Send + Sync,
    M: Message,
    C: KeyCodec<K>,
    S: Serializer,
{
    fn get_all(&self, keys: &[K]) -> StoreResult<HashMap<K, Vec<M>>> {
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

impl<K, M, C, S> ReadWriteStore<K, Vec<M>> for DirectoryMessageListStore<K, M, C, S>
where
    K: Eq + Hash + Clone + Send + Sync,
    M: Message,
    C: KeyCodec<K>,
    S: Serializer,
{
    fn put_all(&self, values: HashMap<K, Vec<M>>) -> StoreResult<HashMap<K, Vec<M>>> {
        self.inner.put_all(values)
    }

    fn remove_all(&self, keys: &[K]) -> StoreResult<HashMap<K, Vec<M>>> {
        self.inner.remove_all(keys)
    }
}

impl<K, M, C, S> std::fmt::Debug for DirectoryMessageListStore<K, M, C, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryMessageListStore")
            .field("directory", &self.inner.directory())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::key::StringKeys;
    use crate::message::{MessageListReadOnlyStore, MessageListStore};
    use std::fs;
    use tessera_types::test_support::{contact, Contact, ContactBuilder};
    use tessera_types::{BinarySerializer, JsonSerializer};

    type Store = DirectoryMessageListStore<String, Contact, StringKeys, BinarySerializer>;

    fn open(dir: &Path) -> Store {
        Store::open(dir, StringKeys, BinarySerializer).unwrap()
    }

    fn key(s: &str) -> String {
        s.to_string()
    }

    fn three() -> Vec<Contact> {
        vec![contact("r1", 1), contact("r2", 2), contact("r3", 3)]
    }

    #[test]
    fn list_roundtrip_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path());
        assert!(store.put(key("k"), three()).unwrap().is_none());
        assert_eq!(store.get(&key("k")).unwrap(), Some(three()));

        store.close().unwrap();
        assert_eq!(open(dir.path()).get(&key("k")).unwrap(), Some(three()));
    }

    #[test]
    fn empty_list_is_stored() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path());
        store.put(key("empty"), Vec::new()).unwrap();
        store.close().unwrap();

        let store = open(dir.path());
        assert!(store.contains_key(&key("empty")).unwrap());
        assert_eq!(store.get(&key("empty")).unwrap(), Some(Vec::new()));
    }

    #[test]
    fn caller_list_is_not_aliased() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path());
        let mut list = three();
        store.put(key("k"), list.clone()).unwrap();
        list.clear();

        let mut fetched = store.get(&key("k")).unwrap().unwrap();
        fetched.push(contact("extra", 4));
        assert_eq!(store.get(&key("k")).unwrap().unwrap().len(), 3);
    }

    #[test]
    fn builders_replace_sequence_not_append() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path());
        store.put(key("k"), three()).unwrap();

        let mut builders: Vec<ContactBuilder> = store.get_builders(&key("k")).unwrap().unwrap();
        assert_eq!(builders.len(), 3);
        builders[1].age(20);

        let previous = store.put_builders(key("k"), &builders).unwrap().unwrap();
        assert_eq!(previous.len(), 3);

        let stored = store.get(&key("k")).unwrap().unwrap();
        assert_eq!(stored.len(), 3);
        assert_eq!(stored[1].age(), 20);
        assert_eq!(stored[0], contact("r1", 1));

        store.close().unwrap();
        assert_eq!(open(dir.path()).get(&key("k")).unwrap().unwrap().len(), 3);
    }

    #[test]
    fn put_all_reports_replaced_lists() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path());

        let mut first = HashMap::new();
        first.insert(key("a"), three());
        first.insert(key("b"), vec![contact("b", 1)]);
        assert!(store.put_all(first).unwrap().is_empty());

        let mut second = HashMap::new();
        second.insert(key("a"), vec![contact("a", 9)]);
        let replaced = store.put_all(second).unwrap();
        assert_eq!(replaced.len(), 1);
        assert_eq!(replaced["a"], three());
    }

    #[test]
    fn remove_returns_previous_list() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path());
        store.put(key("k"), three()).unwrap();

        assert_eq!(store.remove(&key("k")).unwrap(), Some(three()));
        assert!(store.remove(&key("k")).unwrap().is_none());
        assert!(!dir.path().join("k").exists());
    }

    #[test]
    fn unreadable_list_is_removed_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bad"), b"not a frame").unwrap();
        let store = open(dir.path());

        let err = store.get(&key("bad")).unwrap_err();
        assert!(matches!(err, StoreError::Serialization { .. }));

        let removed = store.remove_all(&[key("bad")]).unwrap();
        assert_eq!(removed.get("bad"), Some(&Vec::new()));
        assert!(!dir.path().join("bad").exists());
        assert!(!store.contains_key(&key("bad")).unwrap());
    }

    #[test]
    fn put_supersedes_unreadable_list() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bad"), b"not a frame").unwrap();
        let store = open(dir.path());

        let replaced = store.put(key("bad"), three()).unwrap();
        assert_eq!(replaced, Some(Vec::new()));
        assert_eq!(store.get(&key("bad")).unwrap(), Some(three()));
        store.close().unwrap();

        assert_eq!(open(dir.path()).get(&key("bad")).unwrap(), Some(three()));
    }

    #[test]
    fn json_lists_are_line_per_message() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryMessageListStore::<String, Contact, _, _>::open(
            dir.path(),
            StringKeys,
            JsonSerializer,
        )
        .unwrap();
        store.put(key("k"), three()).unwrap();

        let raw = fs::read_to_string(dir.path().join("k")).unwrap();
        assert_eq!(raw.lines().count(), 3);
        assert_eq!(store.get(&key("k")).unwrap(), Some(three()));
    }

    #[test]
    fn path_separator_in_key_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path());
        let err = store.put(key("x/y"), three()).unwrap_err();
        assert!(matches!(err, StoreError::InvalidKey { .. }));
        assert!(store.keys().unwrap().is_empty());
    }
}
