// Per-query search parameters
// A tagged union: the variant must match the active index kind, checked by
// the dispatcher before any scan starts.

use serde::{Deserialize, Serialize};

// IVF: number of inverted lists to probe (higher = better recall, slower).
// Clamped to [1, n_clusters] at search time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IvfSearchParams {
    pub n_probe: usize,
}

// Annoy: candidate budget and traversal strategy. `None` fields fall back
// to the index configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnoySearchParams {
    // Best-first only: stop once this many candidate ids were visited.
    // Defaults to num_trees * k * 10. The greedy strategy ignores it.
    pub search_k: Option<usize>,
    pub use_priority_queue: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SearchParams {
    Ivf(IvfSearchParams),
    Annoy(AnnoySearchParams),
}

impl SearchParams {
    pub fn ivf(n_probe: usize) -> Self {
        SearchParams::Ivf(IvfSearchParams { n_probe })
    }

    pub fn annoy(search_k: Option<usize>, use_priority_queue: Option<bool>) -> Self {
        SearchParams::Annoy(AnnoySearchParams {
            search_k,
            use_priority_queue,
        })
    }

    pub(crate) fn kind_name(&self) -> &'static str {
        match self {
            SearchParams::Ivf(_) => "IVF",
            SearchParams::Annoy(_) => "Annoy",
        }
    }
}
