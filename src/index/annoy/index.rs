// Annoy-style random projection forest
// num_trees independent trees over the same store; a query gathers
// candidate ids from the trees, then reranks them by exact distance.
//
// Two traversals:
// - greedy: one root-to-leaf descent per tree, following the query's side
//   of every split
// - best-first: a single priority queue across all trees, expanding the
//   most ambiguous frontier (smallest |margin|) first until `search_k`
//   candidates were visited, so a near-boundary query can cross to the
//   "wrong" side of a split

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use crate::config::ExecutionMode;
use crate::metrics::squared_euclidean;
use crate::search::{SearchResult, TopK};
use crate::store::VectorStore;

use super::config::AnnoyConfig;
use super::tree::{margin, Node, Tree};
use crate::index::params::AnnoySearchParams;

#[derive(Debug, Clone, PartialEq)]
pub struct AnnoyIndex {
    config: AnnoyConfig,
    trees: Vec<Tree>,
}

impl AnnoyIndex {
    pub fn new(config: AnnoyConfig) -> Self {
        AnnoyIndex {
            config,
            trees: Vec::new(),
        }
    }

    pub(crate) fn from_parts(config: AnnoyConfig, trees: Vec<Tree>) -> Self {
        AnnoyIndex { config, trees }
    }

    pub fn config(&self) -> &AnnoyConfig {
        &self.config
    }

    pub fn is_built(&self) -> bool {
        !self.trees.is_empty()
    }

    pub(crate) fn trees(&self) -> &[Tree] {
        &self.trees
    }

    pub(crate) fn memory_usage_bytes(&self) -> usize {
        self.trees
            .iter()
            .map(|t| t.root.memory_usage_bytes())
            .sum()
    }

    /// Grow the forest, replacing any previous one. Tree `t` derives its
    /// RNG from the forest seed plus `t`, so a fixed seed reproduces the
    /// exact forest.
    pub fn build(&mut self, store: &VectorStore) {
        let seed = self.config.seed.unwrap_or_else(rand::random);
        self.trees = (0..self.config.num_trees)
            .map(|t| {
                let mut rng = StdRng::seed_from_u64(seed.wrapping_add(t as u64));
                Tree::build(store, self.config.k_leaf, &mut rng)
            })
            .collect();
        debug!(
            num_trees = self.config.num_trees,
            k_leaf = self.config.k_leaf,
            points = store.len(),
            "annoy_forest_built"
        );
    }

    pub fn search(
        &self,
        store: &VectorStore,
        query: &[f32],
        k: usize,
        params: Option<&AnnoySearchParams>,
        mode: ExecutionMode,
    ) -> SearchResult {
        let use_priority_queue = params
            .and_then(|p| p.use_priority_queue)
            .unwrap_or(self.config.use_priority_queue);

        let candidates = if use_priority_queue {
            let search_k = params
                .and_then(|p| p.search_k)
                .unwrap_or(self.config.num_trees * k * 10)
                .max(1);
            self.collect_best_first(query, search_k)
        } else {
            self.collect_greedy(query)
        };

        let mut top = TopK::new(k);
        for id in candidates {
            top.push(squared_euclidean(query, store.row(id), mode), id);
        }
        top.into_result()
    }

    // One descent per tree, union of the reached leaves.
    fn collect_greedy(&self, query: &[f32]) -> HashSet<usize> {
        let mut candidates = HashSet::new();
        for tree in &self.trees {
            let mut node = &tree.root;
            loop {
                match node {
                    Node::Leaf(ids) => {
                        candidates.extend(ids.iter().copied());
                        break;
                    }
                    Node::Split {
                        normal,
                        offset,
                        left,
                        right,
                    } => {
                        node = if margin(normal, *offset, query) < 0.0 {
                            left
                        } else {
                            right
                        };
                    }
                }
            }
        }
        candidates
    }

    // Best-first over every tree at once. Roots enter at +inf; a split
    // pushes the query's side at min(parent, |margin|) and the far side at
    // min(parent, -|margin|), so all on-path nodes drain before any far
    // side, and far sides drain in order of how close the query came to
    // the boundary.
    fn collect_best_first(&self, query: &[f32], search_k: usize) -> HashSet<usize> {
        let mut frontier = BinaryHeap::new();
        for tree in &self.trees {
            frontier.push(Frontier {
                priority: f32::INFINITY,
                node: &tree.root,
            });
        }

        let mut candidates = HashSet::new();
        while let Some(Frontier { priority, node }) = frontier.pop() {
            if candidates.len() >= search_k {
                break;
            }
            match node {
                Node::Leaf(ids) => {
                    candidates.extend(ids.iter().copied());
                }
                Node::Split {
                    normal,
                    offset,
                    left,
                    right,
                } => {
                    let m = margin(normal, *offset, query);
                    let (near, far) = if m < 0.0 {
                        (left, right)
                    } else {
                        (right, left)
                    };
                    frontier.push(Frontier {
                        priority: priority.min(m.abs()),
                        node: near,
                    });
                    frontier.push(Frontier {
                        priority: priority.min(-m.abs()),
                        node: far,
                    });
                }
            }
        }
        candidates
    }
}

struct Frontier<'a> {
    priority: f32,
    node: &'a Node,
}

impl PartialEq for Frontier<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.priority.total_cmp(&other.priority) == Ordering::Equal
    }
}

impl Eq for Frontier<'_> {}

impl PartialOrd for Frontier<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Frontier<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority.total_cmp(&other.priority)
    }
}
