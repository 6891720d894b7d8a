// IVF index configuration

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IvfConfig {
    // Number of k-means clusters (= inverted lists)
    pub n_clusters: usize,
    // Lloyd iteration cap for the trainer
    pub max_iters: usize,
    // Lists probed per query unless overridden; clamped to [1, n_clusters]
    pub n_probe: usize,
    // Trainer seed; entropy when unset. Fixed seeds make builds reproducible.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for IvfConfig {
    fn default() -> Self {
        IvfConfig {
            n_clusters: 16,
            max_iters: 50,
            n_probe: 1,
            seed: None,
        }
    }
}
