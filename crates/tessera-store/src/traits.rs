use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use crate::error::StoreResult;

/// Read side of a key/value store.
///
/// All implementations must satisfy these invariants:
/// - Bulk results only contain keys that were actually found. A missing key
///   is absent from the map, never mapped to an empty placeholder.
/// - `keys()` is a snapshot, not a live view.
/// - Reads may run concurrently with each other from any number of threads.
pub trait ReadOnlyStore<K, V>: Send + Sync
where
    K: Eq + Hash + Clone,
{
    /// Look up every key in `keys`, returning only the ones present.
    fn get_all(&self, keys: &[K]) -> StoreResult<HashMap<K, V>>;

    /// Check whether a value is stored under `key`.
    fn contains_key(&self, key: &K) -> StoreResult<bool>;

    /// Snapshot of all keys currently stored.
    fn keys(&self) -> StoreResult<HashSet<K>>;

    /// Look up a single key.
    ///
    /// Returns `Ok(None)` if the key is not stored.
    fn get(&self, key: &K) -> StoreResult<Option<V>> {
        let mut found = self.get_all(std::slice::from_ref(key))?;
        Ok(found.remove(key))
    }

    /// Number of stored keys.
    fn size(&self) -> StoreResult<usize> {
        Ok(self.keys()?.len())
    }
}

/// Write side of a key/value store.
///
/// Writes are exclusive against all other reads and writes on the same
/// store, so concurrent batches apply as if one after another.
pub trait ReadWriteStore<K, V>: ReadOnlyStore<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Store every entry, replacing existing values.
    ///
    /// Returns the previous values of the keys that were replaced. Keys that
    /// were newly created are absent from the result. A failing batch is not
    /// rolled back: entries committed before the failure stay committed.
    fn put_all(&self, values: HashMap<K, V>) -> StoreResult<HashMap<K, V>>;

    /// Remove every key in `keys`.
    ///
    /// Returns the values of the keys that existed and were removed.
    fn remove_all(&self, keys: &[K]) -> StoreResult<HashMap<K, V>>;

    /// Store a single value, returning the one it replaced.
    fn put(&self, key: K, value: V) -> StoreResult<Option<V>> {
        let lookup = key.clone();
        let mut values = HashMap::with_capacity(1);
        values.insert(key, value);
        Ok(self.put_all(values)?.remove(&lookup))
    }

    /// Remove a single key, returning its value if it was stored.
    fn remove(&self, key: &K) -> StoreResult<Option<V>> {
        let mut removed = self.remove_all(std::slice::from_ref(key))?;
        Ok(removed.remove(key))
    }
}
