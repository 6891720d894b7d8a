// Lloyd's k-means over the vector store.
//
// The trainer is the coarse quantizer behind the IVF index, but it is a
// public type of its own: callers can train a model and read the centroids
// and assignment buckets directly.

use rand::rngs::StdRng;
use rand::Rng;
use rayon::prelude::*;
use tracing::debug;

use crate::config::ExecutionMode;
use crate::error::IndexError;
use crate::metrics::squared_euclidean;
use crate::store::VectorStore;

/// Trained model: `k` centroids plus, for each centroid, the bucket of
/// store IDs assigned to it. Every store ID lands in exactly one bucket;
/// buckets are sorted ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansModel {
    centroids: Vec<f32>,
    dim: usize,
    buckets: Vec<Vec<usize>>,
}

impl KMeansModel {
    pub(crate) fn from_parts(centroids: Vec<f32>, dim: usize, buckets: Vec<Vec<usize>>) -> Self {
        KMeansModel {
            centroids,
            dim,
            buckets,
        }
    }

    pub fn n_clusters(&self) -> usize {
        self.buckets.len()
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn centroid(&self, c: usize) -> &[f32] {
        &self.centroids[c * self.dim..(c + 1) * self.dim]
    }

    pub fn buckets(&self) -> &[Vec<usize>] {
        &self.buckets
    }

    pub(crate) fn centroids_flat(&self) -> &[f32] {
        &self.centroids
    }

    /// Index of the centroid nearest to `point`, ties to the lowest index.
    pub fn nearest_centroid(&self, point: &[f32], mode: ExecutionMode) -> usize {
        nearest(&self.centroids, self.dim, point, mode)
    }
}

fn nearest(centroids: &[f32], dim: usize, point: &[f32], mode: ExecutionMode) -> usize {
    let mut best = 0;
    let mut best_dist = f32::INFINITY;
    for (c, centroid) in centroids.chunks_exact(dim).enumerate() {
        let d = squared_euclidean(point, centroid, mode);
        // Strict less-than keeps the lowest centroid index on ties
        if d < best_dist {
            best = c;
            best_dist = d;
        }
    }
    best
}

#[derive(Debug, Clone, Copy)]
pub struct KMeans {
    pub n_clusters: usize,
    pub max_iters: usize,
}

impl KMeans {
    pub fn new(n_clusters: usize, max_iters: usize) -> Self {
        KMeans {
            n_clusters,
            max_iters,
        }
    }

    /// Run Lloyd's algorithm over the whole store.
    ///
    /// Centroids initialize from `k` distinct rows sampled without
    /// replacement; a centroid that loses all of its points re-seeds from a
    /// random row. Stops early once a full assignment round changes
    /// nothing.
    pub fn train(
        &self,
        store: &VectorStore,
        rng: &mut StdRng,
        mode: ExecutionMode,
    ) -> Result<KMeansModel, IndexError> {
        let n = store.len();
        let k = self.n_clusters;
        if k == 0 || n < k {
            return Err(IndexError::InsufficientData {
                needed: k.max(1),
                have: n,
            });
        }

        let dim = store.dim();
        let mut centroids = Vec::with_capacity(k * dim);
        for id in rand::seq::index::sample(rng, n, k) {
            centroids.extend_from_slice(store.row(id));
        }

        let mut assignments: Vec<usize> = vec![usize::MAX; n];
        let mut iters = 0;
        for _ in 0..self.max_iters {
            iters += 1;

            let next: Vec<usize> = (0..n)
                .into_par_iter()
                .map(|id| nearest(&centroids, dim, store.row(id), mode))
                .collect();

            if next == assignments {
                break;
            }
            assignments = next;

            // Update: each centroid moves to the mean of its points
            let mut sums = vec![0.0f32; k * dim];
            let mut counts = vec![0usize; k];
            for (id, &c) in assignments.iter().enumerate() {
                let row = store.row(id);
                let sum = &mut sums[c * dim..(c + 1) * dim];
                for (s, v) in sum.iter_mut().zip(row) {
                    *s += v;
                }
                counts[c] += 1;
            }

            for c in 0..k {
                let target = &mut centroids[c * dim..(c + 1) * dim];
                if counts[c] == 0 {
                    // Dead centroid: re-seed from a random row
                    target.copy_from_slice(store.row(rng.gen_range(0..n)));
                } else {
                    let count = counts[c] as f32;
                    for (t, s) in target.iter_mut().zip(&sums[c * dim..(c + 1) * dim]) {
                        *t = s / count;
                    }
                }
            }
        }

        // Final assignment pass so the buckets agree with the centroids as
        // they ended up
        let mut buckets: Vec<Vec<usize>> = vec![Vec::new(); k];
        for id in 0..n {
            buckets[nearest(&centroids, dim, store.row(id), mode)].push(id);
        }

        debug!(k, iters, points = n, "kmeans_trained");
        Ok(KMeansModel {
            centroids,
            dim,
            buckets,
        })
    }
}
