use tessera_store::StoreResult;

/// Evaluates a query of type `Q` and produces results of type `R`.
pub trait Searcher<Q, R> {
    /// All results matching `query`. Order is unspecified.
    fn search(&self, query: &Q) -> StoreResult<Vec<R>>;

    /// Results matching `query` as an iterator.
    fn stream(&self, query: &Q) -> StoreResult<std::vec::IntoIter<R>> {
        Ok(self.search(query)?.into_iter())
    }
}
