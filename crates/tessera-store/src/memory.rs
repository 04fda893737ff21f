use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{StoreError, StoreResult};
use crate::traits::{ReadOnlyStore, ReadWriteStore};

/// In-memory, HashMap-based store.
///
/// All values are held behind a single `RwLock`: reads share the lock, writes
/// take it exclusively. Values are cloned on the way out and moved on the way
/// in, so callers never share mutable state with the store. This is the
/// reference behaviour the directory-backed stores are held to.
pub struct InMemoryStore<K, V> {
    entries: RwLock<HashMap<K, V>>,
}

/// `K -> M` in-memory message store.
pub type InMemoryMessageStore<K, M> = InMemoryStore<K, M>;

/// `K -> [M]` in-memory message list store.
pub type InMemoryMessageListStore<K, M> = InMemoryStore<K, Vec<M>>;

impl<K, V> InMemoryStore<K, V> {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, HashMap<K, V>>> {
        self.entries.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, HashMap<K, V>>> {
        self.entries.write().map_err(|_| StoreError::Poisoned)
    }

    /// Remove every entry.
    pub fn clear(&self) -> StoreResult<()> {
        self.write()?.clear();
        Ok(())
    }
}

impl<K, V> Default for InMemoryStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> ReadOnlyStore<K, V> for InMemoryStore<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    fn get_all(&self, keys: &[K]) -> StoreResult<HashMap<K, V>> {
        let map = self.read()?;
        Ok(keys
            .iter()
            .filter_map(|key| map.get(key).map(|value| (key.clone(), value.clone())))
            .collect())
    }

    fn contains_key(&self, key: &K) -> StoreResult<bool> {
        Ok(self.read()?.contains_key(key))
    }

    fn keys(&self) -> StoreResult<HashSet<K>> {
        Ok(self.read()?.keys().cloned().collect())
    }

    fn size(&self) -> StoreResult<usize> {
        Ok(self.read()?.len())
    }
}

impl<K, V> ReadWriteStore<K, V> for InMemoryStore<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    fn put_all(&self, values: HashMap<K, V>) -> StoreResult<HashMap<K, V>> {
        let mut map = self.write()?;
        let mut replaced = HashMap::new();
        for (key, value) in values {
            if let Some(previous) = map.insert(key.clone(), value) {
                replaced.insert(key, previous);
            }
        }
        Ok(replaced)
    }

    fn remove_all(&self, keys: &[K]) -> StoreResult<HashMap<K, V>> {
        let mut map = self.write()?;
        let mut removed = HashMap::new();
        for key in keys {
            if let Some(previous) = map.remove(key) {
                removed.insert(key.clone(), previous);
            }
        }
        Ok(removed)
    }
}

impl<K, V> std::fmt::Debug for InMemoryStore<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.entries.read().map(|map| map.len()).ok();
        f.debug_struct("InMemoryStore")
            .field("entry_count", &count)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::Arc;
    use std::thread;
    use tessera_types::test_support::{contact, Contact};

    fn store() -> InMemoryMessageStore<String, Contact> {
        InMemoryMessageStore::new()
    }

    // -----------------------------------------------------------------------
    // Core CRUD
    // -----------------------------------------------------------------------

    #[test]
    fn put_then_get() {
        let store = store();
        let record = contact("ada", 36);
        assert!(store.put("1234".to_string(), record.clone()).unwrap().is_none());

        assert_eq!(store.get(&"1234".to_string()).unwrap(), Some(record));
        let keys = store.keys().unwrap();
        assert_eq!(keys.len(), 1);
        assert!(keys.contains("1234"));
    }

    #[test]
    fn get_missing_is_none() {
        let store = store();
        assert!(store.get(&"missing".to_string()).unwrap().is_none());
        assert!(!store.contains_key(&"missing".to_string()).unwrap());
    }

    #[test]
    fn put_all_returns_only_replaced() {
        let store = store();
        let r1 = contact("r1", 1);

        let mut first = HashMap::new();
        first.insert("a".to_string(), r1.clone());
        first.insert("b".to_string(), contact("r2", 2));
        assert!(store.put_all(first).unwrap().is_empty());

        let mut second = HashMap::new();
        second.insert("a".to_string(), contact("r3", 3));
        let replaced = store.put_all(second).unwrap();
        assert_eq!(replaced.len(), 1);
        assert_eq!(replaced["a"], r1);
    }

    #[test]
    fn remove_is_idempotent() {
        let store = store();
        store.put("k".to_string(), contact("k", 1)).unwrap();

        let keys = vec!["k".to_string()];
        assert_eq!(store.remove_all(&keys).unwrap().len(), 1);
        assert!(store.remove_all(&keys).unwrap().is_empty());
        assert!(store.remove_all(&keys).unwrap().is_empty());
        assert_eq!(store.size().unwrap(), 0);
    }

    #[test]
    fn keys_is_a_snapshot() {
        let store = store();
        store.put("a".to_string(), contact("a", 1)).unwrap();
        let snapshot = store.keys().unwrap();
        store.put("b".to_string(), contact("b", 2)).unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(store.keys().unwrap().len(), 2);
    }

    #[test]
    fn list_put_stores_independent_copy() {
        let store: InMemoryMessageListStore<u8, Contact> = InMemoryMessageListStore::new();
        let mut list = vec![contact("a", 1), contact("b", 2)];
        store.put(1, list.clone()).unwrap();
        list.push(contact("c", 3));

        assert_eq!(store.get(&1).unwrap().unwrap().len(), 2);
    }

    #[test]
    fn clear_and_debug() {
        let store = store();
        store.put("a".to_string(), contact("a", 1)).unwrap();
        assert!(format!("{store:?}").contains("entry_count"));
        store.clear().unwrap();
        assert_eq!(store.size().unwrap(), 0);
    }

    // -----------------------------------------------------------------------
    // Concurrent access
    // -----------------------------------------------------------------------

    #[test]
    fn concurrent_readers() {
        let store = Arc::new(store());
        for i in 0..10 {
            store.put(format!("k{i}"), contact(&format!("c{i}"), i)).unwrap();
        }

        let handles: Vec<_> = (0..50)
            .map(|t| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    let i = t % 10;
                    let found = store.get(&format!("k{i}")).unwrap().unwrap();
                    assert_eq!(found.age(), i);
                })
            })
            .collect();

        for h in handles {
            h.join().expect("reader thread should not panic");
        }
    }

    // -----------------------------------------------------------------------
    // Properties
    // -----------------------------------------------------------------------

    proptest! {
        #[test]
        fn bulk_results_never_report_absent_keys(
            present in proptest::collection::hash_set(0u16..64, 0..16),
            queried in proptest::collection::vec(0u16..64, 0..32),
        ) {
            let store: InMemoryMessageStore<u16, Contact> = InMemoryMessageStore::new();
            let initial: HashMap<u16, Contact> = present
                .iter()
                .map(|&k| (k, contact("p", u32::from(k))))
                .collect();
            prop_assert!(store.put_all(initial).unwrap().is_empty());

            let found = store.get_all(&queried).unwrap();
            prop_assert!(found.keys().all(|k| present.contains(k) && queried.contains(k)));

            let update: HashMap<u16, Contact> = queried
                .iter()
                .map(|&k| (k, contact("q", u32::from(k))))
                .collect();
            let replaced = store.put_all(update).unwrap();
            prop_assert!(replaced.keys().all(|k| present.contains(k)));
            prop_assert!(replaced.values().all(|c| c.name() == "p"));

            let removed = store.remove_all(&queried).unwrap();
            prop_assert!(removed.keys().all(|k| queried.contains(k)));
            prop_assert!(removed.values().all(|c| c.name() == "q"));
            prop_assert!(store.remove_all(&queried).unwrap().is_empty());
        }
    }
}
