//! Builder-mediated access to message stores.
//!
//! These traits layer builder semantics over any [`ReadOnlyStore`] /
//! [`ReadWriteStore`] holding messages, via blanket impls. Stores never see
//! builders: every value going in is built fresh and every value coming out
//! is mutated into a new builder, so nothing the caller can edit aliases what
//! the store holds.

use std::collections::HashMap;
use std::hash::Hash;

use tessera_types::{build_all, mutate_all, Message, MessageBuilder};

use crate::error::StoreResult;
use crate::traits::{ReadOnlyStore, ReadWriteStore};

/// Builder reads over a `K -> M` store.
pub trait MessageReadOnlyStore<K, M>: ReadOnlyStore<K, M>
where
    K: Eq + Hash + Clone,
    M: Message,
{
    /// Builder copy of the message under `key`.
    fn get_builder(&self, key: &K) -> StoreResult<Option<M::Builder>> {
        Ok(self.get(key)?.map(|message| message.mutate()))
    }

    /// Builder copies of every message found under `keys`.
    fn get_all_builders(&self, keys: &[K]) -> StoreResult<HashMap<K, M::Builder>> {
        Ok(self
            .get_all(keys)?
            .into_iter()
            .map(|(key, message)| (key, message.mutate()))
            .collect())
    }
}

impl<K, M, S> MessageReadOnlyStore<K, M> for S
where
    S: ReadOnlyStore<K, M> + ?Sized,
    K: Eq + Hash + Clone,
    M: Message,
{
}

/// Builder writes over a `K -> M` store.
pub trait MessageStore<K, M>: MessageReadOnlyStore<K, M> + ReadWriteStore<K, M>
where
    K: Eq + Hash + Clone,
    M: Message,
{
    /// Build and store `builder`, returning the replaced message as a builder.
    fn put_builder(&self, key: K, builder: &M::Builder) -> StoreResult<Option<M::Builder>> {
        Ok(self
            .put(key, builder.build())?
            .map(|previous| previous.mutate()))
    }

    /// Build and store every builder, returning replaced messages as builders.
    fn put_all_builders(
        &self,
        builders: &HashMap<K, M::Builder>,
    ) -> StoreResult<HashMap<K, M::Builder>> {
        let messages = builders
            .iter()
            .map(|(key, builder)| (key.clone(), builder.build()))
            .collect();
        Ok(self
            .put_all(messages)?
            .into_iter()
            .map(|(key, previous)| (key, previous.mutate()))
            .collect())
    }
}

impl<K, M, S> MessageStore<K, M> for S
where
    S: ReadWriteStore<K, M> + ?Sized,
    K: Eq + Hash + Clone,
    M: Message,
{
}

/// Builder reads over a `K -> [M]` store.
pub trait MessageListReadOnlyStore<K, M>: ReadOnlyStore<K, Vec<M>>
where
    K: Eq + Hash + Clone,
    M: Message,
{
    /// Builder copies of the list under `key`, in stored order.
    fn get_builders(&self, key: &K) -> StoreResult<Option<Vec<M::Builder>>> {
        Ok(self.get(key)?.map(|messages| mutate_all(&messages)))
    }

    /// Builder copies of every list found under `keys`.
    fn get_all_builder_lists(&self, keys: &[K]) -> StoreResult<HashMap<K, Vec<M::Builder>>> {
        Ok(self
            .get_all(keys)?
            .into_iter()
            .map(|(key, messages)| (key, mutate_all(&messages)))
            .collect())
    }
}

impl<K, M, S> MessageListReadOnlyStore<K, M> for S
where
    S: ReadOnlyStore<K, Vec<M>> + ?Sized,
    K: Eq + Hash + Clone,
    M: Message,
{
}

/// Builder writes over a `K -> [M]` store.
pub trait MessageListStore<K, M>: MessageListReadOnlyStore<K, M> + ReadWriteStore<K, Vec<M>>
where
    K: Eq + Hash + Clone,
    M: Message,
{
    /// Build every builder and store the list, replacing the whole sequence.
    fn put_builders(
        &self,
        key: K,
        builders: &[M::Builder],
    ) -> StoreResult<Option<Vec<M::Builder>>> {
        Ok(self
            .put(key, build_all(builders))?
            .map(|previous| mutate_all(&previous)))
    }

    /// Build and store every list, returning replaced lists as builders.
    fn put_all_builder_lists(
        &self,
        builders: &HashMap<K, Vec<M::Builder>>,
    ) -> StoreResult<HashMap<K, Vec<M::Builder>>> {
        let lists = builders
            .iter()
            .map(|(key, list)| (key.clone(), build_all(list)))
            .collect();
        Ok(self
            .put_all(lists)?
            .into_iter()
            .map(|(key, previous)| (key, mutate_all(&previous)))
            .collect())
    }
}

impl<K, M, S> MessageListStore<K, M> for S
where
    S: ReadWriteStore<K, Vec<M>> + ?Sized,
    K: Eq + Hash + Clone,
    M: Message,
{
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{InMemoryMessageListStore, InMemoryMessageStore};
    use tessera_types::test_support::{contact, Contact, ContactBuilder};

    // -----------------------------------------------------------------------
    // Single-message builders
    // -----------------------------------------------------------------------

    #[test]
    fn get_builder_absent_is_none() {
        let store: InMemoryMessageStore<String, Contact> = InMemoryMessageStore::new();
        assert!(store.get_builder(&"nobody".to_string()).unwrap().is_none());
    }

    #[test]
    fn mutating_builder_does_not_change_stored_message() {
        let store: InMemoryMessageStore<String, Contact> = InMemoryMessageStore::new();
        let key = "ada".to_string();
        store.put(key.clone(), contact("ada", 36)).unwrap();

        let mut builder: ContactBuilder = store.get_builder(&key).unwrap().unwrap();
        builder.age(99).tag("edited");
        assert_eq!(store.get(&key).unwrap().unwrap().age(), 36);

        store.put_builder(key.clone(), &builder).unwrap();
        assert_eq!(store.get(&key).unwrap().unwrap().age(), 99);
    }

    #[test]
    fn put_builder_returns_previous_as_builder() {
        let store: InMemoryMessageStore<String, Contact> = InMemoryMessageStore::new();
        let key = "k".to_string();

        let mut builder = Contact::builder();
        builder.name("first");
        assert!(store.put_builder(key.clone(), &builder).unwrap().is_none());

        builder.name("second");
        let previous = store.put_builder(key.clone(), &builder).unwrap().unwrap();
        assert_eq!(previous.current_name(), "first");

        // Editing the returned builder touches nothing stored.
        let mut previous = previous;
        previous.name("third");
        assert_eq!(store.get(&key).unwrap().unwrap().name(), "second");
    }

    #[test]
    fn bulk_builders_follow_diff_semantics() {
        let store: InMemoryMessageStore<String, Contact> = InMemoryMessageStore::new();
        store.put("a".to_string(), contact("a", 1)).unwrap();

        let mut builders = HashMap::new();
        builders.insert("a".to_string(), contact("a2", 2).mutate());
        builders.insert("b".to_string(), contact("b", 3).mutate());
        let replaced = store.put_all_builders(&builders).unwrap();
        assert_eq!(replaced.len(), 1);
        assert_eq!(replaced["a"].current_name(), "a");

        let fetched = store
            .get_all_builders(&["a".to_string(), "b".to_string(), "c".to_string()])
            .unwrap();
        assert_eq!(fetched.len(), 2);
        assert_eq!(fetched["a"].current_name(), "a2");
    }

    // -----------------------------------------------------------------------
    // List builders
    // -----------------------------------------------------------------------

    #[test]
    fn list_builders_replace_whole_sequence() {
        let store: InMemoryMessageListStore<String, Contact> = InMemoryMessageListStore::new();
        let key = "k".to_string();
        store
            .put(key.clone(), vec![contact("r1", 1), contact("r2", 2), contact("r3", 3)])
            .unwrap();

        let mut builders: Vec<ContactBuilder> = store.get_builders(&key).unwrap().unwrap();
        assert_eq!(builders.len(), 3);
        for builder in &mut builders {
            builder.tag("seen");
        }
        let previous = store.put_builders(key.clone(), &builders).unwrap().unwrap();
        assert_eq!(previous.len(), 3);

        let stored = store.get(&key).unwrap().unwrap();
        assert_eq!(stored.len(), 3);
        assert!(stored.iter().all(|c| c.tags() == ["seen".to_string()]));
        assert_eq!(stored[2].name(), "r3");
    }

    #[test]
    fn list_bulk_builders() {
        let store: InMemoryMessageListStore<u32, Contact> = InMemoryMessageListStore::new();
        let mut lists = HashMap::new();
        lists.insert(1u32, vec![contact("a", 1).mutate()]);
        lists.insert(2u32, vec![contact("b", 2).mutate(), contact("c", 3).mutate()]);
        assert!(store.put_all_builder_lists(&lists).unwrap().is_empty());

        let fetched = store.get_all_builder_lists(&[1, 2, 3]).unwrap();
        assert_eq!(fetched.len(), 2);
        assert_eq!(fetched[&2].len(), 2);
        assert_eq!(fetched[&2][1].current_name(), "c");
    }
}
