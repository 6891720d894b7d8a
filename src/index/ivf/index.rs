// IVF (inverted file) index
// A coarse k-means quantizer splits the store into n_clusters inverted
// lists; a query scans only the n_probe lists whose centroids sit closest.
// Recall grows monotonically with n_probe: each extra probed list only
// widens the candidate set.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use crate::config::ExecutionMode;
use crate::error::IndexError;
use crate::metrics::squared_euclidean;
use crate::search::{SearchResult, TopK};
use crate::store::VectorStore;

use super::config::IvfConfig;
use super::kmeans::{KMeans, KMeansModel};

#[derive(Debug, Clone, PartialEq)]
pub struct IvfIndex {
    config: IvfConfig,
    model: Option<KMeansModel>,
}

impl IvfIndex {
    pub fn new(config: IvfConfig) -> Self {
        IvfIndex {
            config,
            model: None,
        }
    }

    pub(crate) fn from_parts(config: IvfConfig, model: KMeansModel) -> Self {
        IvfIndex {
            config,
            model: Some(model),
        }
    }

    pub fn config(&self) -> &IvfConfig {
        &self.config
    }

    pub fn is_built(&self) -> bool {
        self.model.is_some()
    }

    pub(crate) fn model(&self) -> Option<&KMeansModel> {
        self.model.as_ref()
    }

    /// Train the coarse quantizer over the whole store, replacing any
    /// previous clustering. Fails with `InsufficientData` when the store
    /// holds fewer vectors than `n_clusters`; the index stays unbuilt.
    pub fn build(&mut self, store: &VectorStore, mode: ExecutionMode) -> Result<(), IndexError> {
        let seed = self.config.seed.unwrap_or_else(rand::random);
        let mut rng = StdRng::seed_from_u64(seed);

        let trainer = KMeans::new(self.config.n_clusters, self.config.max_iters);
        let model = trainer.train(store, &mut rng, mode)?;

        debug!(
            n_clusters = self.config.n_clusters,
            points = store.len(),
            "ivf_index_built"
        );
        self.model = Some(model);
        Ok(())
    }

    /// Probe the `n_probe` nearest inverted lists. The override, when
    /// present, wins over the configured value; both are clamped to
    /// `[1, n_clusters]`.
    pub fn search(
        &self,
        store: &VectorStore,
        query: &[f32],
        k: usize,
        n_probe_override: Option<usize>,
        mode: ExecutionMode,
    ) -> SearchResult {
        let Some(model) = &self.model else {
            return SearchResult::empty();
        };

        let n_clusters = model.n_clusters();
        let n_probe = n_probe_override
            .unwrap_or(self.config.n_probe)
            .clamp(1, n_clusters);

        // Rank centroids by distance, ties to the lower index
        let mut ranked: Vec<(f32, usize)> = (0..n_clusters)
            .map(|c| (squared_euclidean(query, model.centroid(c), mode), c))
            .collect();
        ranked.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        let mut top = TopK::new(k);
        for &(_, c) in ranked.iter().take(n_probe) {
            for &id in &model.buckets()[c] {
                top.push(squared_euclidean(query, store.row(id), mode), id);
            }
        }
        top.into_result()
    }
}
