//! Brute-force search strategies.
//!
//! Each search takes a snapshot of the store's keys, loads every value with
//! one bulk read, and filters in memory. Keys removed between the snapshot
//! and the bulk read are skipped.

use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::Arc;

use tessera_store::{ReadOnlyStore, StoreResult};
use tracing::debug;

use crate::searcher::Searcher;

/// Load the whole store and keep the values `keep` accepts.
fn scan<K, V, S>(store: &S, mut keep: impl FnMut(&K, &V) -> bool) -> StoreResult<Vec<V>>
where
    K: Eq + Hash + Clone,
    S: ReadOnlyStore<K, V> + ?Sized,
{
    let keys: Vec<K> = store.keys()?.into_iter().collect();
    let values = store.get_all(&keys)?;
    let scanned = values.len();

    let matched: Vec<V> = values
        .into_iter()
        .filter(|(key, value)| keep(key, value))
        .map(|(_, value)| value)
        .collect();

    debug!(scanned, matched = matched.len(), "brute-force search");
    Ok(matched)
}

// ---------------------------------------------------------------------------
// Record predicate
// ---------------------------------------------------------------------------

/// Searcher whose query is a predicate over the stored record.
pub struct PredicateSearcher<K, V, S: ?Sized> {
    store: Arc<S>,
    _entries: PhantomData<fn() -> (K, V)>,
}

impl<K, V, S: ?Sized> PredicateSearcher<K, V, S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            _entries: PhantomData,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }
}

impl<K, V, S, F> Searcher<F, V> for PredicateSearcher<K, V, S>
where
    K: Eq + Hash + Clone,
    S: ReadOnlyStore<K, V> + ?Sized,
    F: Fn(&V) -> bool,
{
    fn search(&self, query: &F) -> StoreResult<Vec<V>> {
        scan(&*self.store, |_, value| query(value))
    }
}

impl<K, V, S: ?Sized> std::fmt::Debug for PredicateSearcher<K, V, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredicateSearcher").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Key + record predicate
// ---------------------------------------------------------------------------

/// Searcher whose query is a predicate over both key and record.
pub struct KeyPredicateSearcher<K, V, S: ?Sized> {
    store: Arc<S>,
    _entries: PhantomData<fn() -> (K, V)>,
}

impl<K, V, S: ?Sized> KeyPredicateSearcher<K, V, S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            _entries: PhantomData,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }
}

impl<K, V, S, F> Searcher<F, V> for KeyPredicateSearcher<K, V, S>
where
    K: Eq + Hash + Clone,
    S: ReadOnlyStore<K, V> + ?Sized,
    F: Fn(&K, &V) -> bool,
{
    fn search(&self, query: &F) -> StoreResult<Vec<V>> {
        scan(&*self.store, query)
    }
}

impl<K, V, S: ?Sized> std::fmt::Debug for KeyPredicateSearcher<K, V, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPredicateSearcher").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Parameterized query
// ---------------------------------------------------------------------------

type QueryFilter<Q, K, V> = Box<dyn Fn(&Q, &K, &V) -> bool + Send + Sync>;

/// Searcher with a fixed filter evaluated against a caller-supplied query.
///
/// The filter is set once at construction; each search passes the query
/// object (a compiled pattern, a range, ...) that parameterizes it.
pub struct QuerySearcher<K, V, S: ?Sized, Q> {
    store: Arc<S>,
    filter: QueryFilter<Q, K, V>,
}

impl<K, V, S: ?Sized, Q> QuerySearcher<K, V, S, Q> {
    pub fn new<F>(store: Arc<S>, filter: F) -> Self
    where
        F: Fn(&Q, &K, &V) -> bool + Send + Sync + 'static,
    {
        Self {
            store,
            filter: Box::new(filter),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }
}

impl<K, V, S, Q> Searcher<Q, V> for QuerySearcher<K, V, S, Q>
where
    K: Eq + Hash + Clone,
    S: ReadOnlyStore<K, V> + ?Sized,
{
    fn search(&self, query: &Q) -> StoreResult<Vec<V>> {
        scan(&*self.store, |key, value| (self.filter)(query, key, value))
    }
}

impl<K, V, S: ?Sized, Q> std::fmt::Debug for QuerySearcher<K, V, S, Q> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuerySearcher").finish_non_exhaustive()
    }
}
