// VegamDb - the embeddable database value.
//
// Owns the vector store and exactly one active index strategy, and routes
// every public operation. It is a plain value with no interior locking:
// searches take &self, every mutation takes &mut self, so the borrow
// checker enforces the single-writer/multi-reader contract and a server
// front-end only needs to wrap the whole thing in an RwLock.

use std::path::Path;

use rayon::prelude::*;
use serde::Serialize;

use crate::codec;
use crate::config::ExecutionMode;
use crate::error::{Result, StoreError};
use crate::index::{
    flat, ActiveIndex, AnnoyConfig, AnnoyIndex, IndexKind, IvfConfig, IvfIndex, SearchParams,
};
use crate::search::SearchResult;
use crate::store::VectorStore;

#[derive(Debug, Clone, Default)]
pub struct VegamDb {
    pub(crate) store: VectorStore,
    pub(crate) index: ActiveIndex,
    mode: ExecutionMode,
}

impl VegamDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_parts(store: VectorStore, index: ActiveIndex) -> Self {
        VegamDb {
            store,
            index,
            mode: ExecutionMode::default(),
        }
    }

    /// Force the distance kernel onto a specific execution path. The
    /// default (`Auto`) picks SIMD when the CPU supports it.
    pub fn set_execution_mode(&mut self, mode: ExecutionMode) {
        self.mode = mode;
    }

    // ------------------------------------------------------------ ingest

    /// Append one vector, returning its ID. The first vector fixes the
    /// database dimension.
    pub fn add_vector(&mut self, vec: &[f32]) -> Result<u64> {
        let id = self.store.add(vec)?;
        Ok(id as u64)
    }

    /// Append a batch of rows; an error aborts before the first append.
    pub fn add_vector_batch(&mut self, rows: &[Vec<f32>]) -> Result<Vec<u64>> {
        let ids = self.store.add_batch(rows)?;
        Ok(ids.into_iter().map(|id| id as u64).collect())
    }

    /// Append a flattened 1-D or 2-D buffer (`shape` is `[len]` or
    /// `[rows, cols]`). Anything else fails with `InvalidShape`.
    pub fn add_array(&mut self, data: &[f32], shape: &[usize]) -> Result<Vec<u64>> {
        let ids = self.store.add_array(data, shape)?;
        Ok(ids.into_iter().map(|id| id as u64).collect())
    }

    pub fn get_vector(&self, id: u64) -> Option<&[f32]> {
        self.store.get(id as usize)
    }

    pub fn size(&self) -> u64 {
        self.store.len() as u64
    }

    pub fn dimension(&self) -> u32 {
        self.store.dim() as u32
    }

    // ------------------------------------------------------- index setup

    /// Select exact brute-force search, discarding any trained structure.
    pub fn use_flat_index(&mut self) {
        self.index = ActiveIndex::Flat;
    }

    /// Select IVF with the given clustering parameters. Until
    /// `build_index` runs, searches fall back to Flat.
    pub fn use_ivf_index(&mut self, n_clusters: usize, max_iters: usize, n_probe: usize) {
        self.use_ivf_index_with(IvfConfig {
            n_clusters,
            max_iters,
            n_probe,
            seed: None,
        });
    }

    pub fn use_ivf_index_with(&mut self, config: IvfConfig) {
        self.index = ActiveIndex::Ivf(IvfIndex::new(config));
    }

    /// Select the Annoy forest. Until `build_index` runs, searches fall
    /// back to Flat.
    pub fn use_annoy_index(&mut self, num_trees: usize, k_leaf: usize, use_priority_queue: bool) {
        self.use_annoy_index_with(AnnoyConfig {
            num_trees,
            k_leaf,
            use_priority_queue,
            seed: None,
        });
    }

    pub fn use_annoy_index_with(&mut self, config: AnnoyConfig) {
        self.index = ActiveIndex::Annoy(AnnoyIndex::new(config));
    }

    /// Train the active index over the current store contents. A no-op for
    /// Flat (and for the default state); all-or-nothing otherwise: on error
    /// the previous state stays in place.
    pub fn build_index(&mut self) -> Result<()> {
        match &mut self.index {
            ActiveIndex::None | ActiveIndex::Flat => Ok(()),
            ActiveIndex::Ivf(idx) => {
                idx.build(&self.store, self.mode)?;
                Ok(())
            }
            ActiveIndex::Annoy(idx) => {
                idx.build(&self.store);
                Ok(())
            }
        }
    }

    pub fn index_kind(&self) -> IndexKind {
        self.index.kind()
    }

    pub fn is_index_built(&self) -> bool {
        self.index.is_built()
    }

    // ------------------------------------------------------------ search

    /// k nearest neighbors of `query` with the active index's defaults.
    pub fn search(&self, query: &[f32], k: usize) -> Result<SearchResult> {
        self.search_with_params(query, k, None)
    }

    /// k nearest neighbors with per-query parameters. The params variant
    /// must match the active index kind; distances in the result are
    /// squared Euclidean, ascending, ties broken by lower ID.
    pub fn search_with_params(
        &self,
        query: &[f32],
        k: usize,
        params: Option<&SearchParams>,
    ) -> Result<SearchResult> {
        self.index.check_params(params)?;

        if self.store.is_empty() {
            return Ok(SearchResult::empty());
        }
        if query.len() != self.store.dim() {
            return Err(StoreError::DimensionMismatch {
                expected: self.store.dim(),
                actual: query.len(),
            }
            .into());
        }

        let result = match &self.index {
            ActiveIndex::None | ActiveIndex::Flat => {
                flat::search(&self.store, query, k, self.mode)
            }
            ActiveIndex::Ivf(idx) if idx.is_built() => {
                let n_probe = match params {
                    Some(SearchParams::Ivf(p)) => Some(p.n_probe),
                    _ => None,
                };
                idx.search(&self.store, query, k, n_probe, self.mode)
            }
            ActiveIndex::Annoy(idx) if idx.is_built() => {
                let annoy_params = match params {
                    Some(SearchParams::Annoy(p)) => Some(p),
                    _ => None,
                };
                idx.search(&self.store, query, k, annoy_params, self.mode)
            }
            // Configured but never built: exact scan keeps queries live
            ActiveIndex::Ivf(_) | ActiveIndex::Annoy(_) => {
                flat::search(&self.store, query, k, self.mode)
            }
        };
        Ok(result)
    }

    /// Run one query per row, in parallel. Results come back in query
    /// order.
    pub fn search_batch(&self, queries: &[Vec<f32>], k: usize) -> Result<Vec<SearchResult>> {
        queries
            .par_iter()
            .map(|query| self.search(query, k))
            .collect()
    }

    // ------------------------------------------------------- persistence

    /// Write store + active index to `path`, atomically.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        codec::save(self, path.as_ref())
    }

    /// Replace this database with the contents of `path`. On any error the
    /// current contents are left untouched. The execution mode is runtime
    /// state and survives the load.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let loaded = codec::load(path.as_ref())?;
        let mode = self.mode;
        *self = loaded;
        self.mode = mode;
        Ok(())
    }

    pub fn stats(&self) -> DbStats {
        let index_memory_bytes = match &self.index {
            ActiveIndex::None | ActiveIndex::Flat => 0,
            ActiveIndex::Ivf(idx) => idx
                .model()
                .map(|m| {
                    let centroids = m.n_clusters() * m.dim() * std::mem::size_of::<f32>();
                    let lists: usize = m
                        .buckets()
                        .iter()
                        .map(|b| b.len() * std::mem::size_of::<usize>())
                        .sum();
                    centroids + lists
                })
                .unwrap_or(0),
            ActiveIndex::Annoy(idx) => idx.memory_usage_bytes(),
        };

        DbStats {
            count: self.size(),
            dimension: self.dimension(),
            index_kind: self.index_kind(),
            index_built: self.is_index_built(),
            index_memory_bytes,
        }
    }
}

// Snapshot of the database shape, cheap to serialize for front-ends.
#[derive(Debug, Clone, Serialize)]
pub struct DbStats {
    pub count: u64,
    pub dimension: u32,
    pub index_kind: IndexKind,
    pub index_built: bool,
    pub index_memory_bytes: usize,
}
