//! Search over Tessera message stores.
//!
//! Searchers sit on top of any [`ReadOnlyStore`](tessera_store::ReadOnlyStore)
//! and only use its public read operations. Every strategy here is brute
//! force: it loads the store's full key set and filters the values in memory,
//! so each query costs time proportional to the store size. There is no
//! index.
//!
//! # Key Types
//!
//! - [`Searcher`] -- query in, matching records out
//! - [`PredicateSearcher`] -- query is a predicate over the record
//! - [`KeyPredicateSearcher`] -- query is a predicate over key and record
//! - [`QuerySearcher`] -- fixed filter applied to a caller-supplied query object

pub mod predicate;
pub mod searcher;

pub use predicate::{KeyPredicateSearcher, PredicateSearcher, QuerySearcher};
pub use searcher::Searcher;
