// Annoy forest configuration

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnoyConfig {
    // Trees in the forest; more trees = better recall, linear build cost
    pub num_trees: usize,
    // Maximum ids per leaf (larger leaves only appear on degenerate splits)
    pub k_leaf: usize,
    // Default traversal: best-first across all trees, or one greedy
    // descent per tree. Overridable per query.
    pub use_priority_queue: bool,
    // Forest seed; entropy when unset. Tree t builds from seed + t.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for AnnoyConfig {
    fn default() -> Self {
        AnnoyConfig {
            num_trees: 10,
            k_leaf: 50,
            use_priority_queue: true,
            seed: None,
        }
    }
}
