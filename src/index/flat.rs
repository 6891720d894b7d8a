// Flat (brute force) search
// O(N) — compares the query against every stored row
// Exact results, zero build cost; also the fallback for indexes that are
// configured but not yet built.

use crate::config::ExecutionMode;
use crate::metrics::squared_euclidean;
use crate::search::{SearchResult, TopK};
use crate::store::VectorStore;

pub fn search(store: &VectorStore, query: &[f32], k: usize, mode: ExecutionMode) -> SearchResult {
    let mut top = TopK::new(k);
    for (id, row) in store.iter_rows() {
        top.push(squared_euclidean(query, row, mode), id);
    }
    top.into_result()
}
