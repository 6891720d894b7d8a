// A single random-projection tree.
//
// Interior nodes carry a split hyperplane (normal, offset); leaves carry an
// unordered bag of store ids. The split plane passes through the midpoint
// of two randomly chosen stored points, perpendicular to the segment
// between them.

use rand::rngs::StdRng;
use rand::Rng;

use crate::store::VectorStore;

// Sampled split pairs that map to identical vectors are re-drawn this many
// times before the node gives up and becomes a leaf.
const SPLIT_RETRIES: usize = 8;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node {
    Leaf(Vec<usize>),
    Split {
        normal: Vec<f32>,
        offset: f32,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    pub(crate) fn memory_usage_bytes(&self) -> usize {
        match self {
            Node::Leaf(ids) => std::mem::size_of::<Node>() + ids.len() * std::mem::size_of::<usize>(),
            Node::Split {
                normal,
                left,
                right,
                ..
            } => {
                std::mem::size_of::<Node>()
                    + normal.len() * std::mem::size_of::<f32>()
                    + left.memory_usage_bytes()
                    + right.memory_usage_bytes()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Tree {
    pub root: Node,
}

impl Tree {
    pub fn build(store: &VectorStore, k_leaf: usize, rng: &mut StdRng) -> Self {
        let ids: Vec<usize> = (0..store.len()).collect();
        Tree {
            root: build_node(store, ids, k_leaf, rng),
        }
    }
}

pub(crate) fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

// Signed distance of `v` from the hyperplane; negative goes left, zero and
// positive go right.
pub(crate) fn margin(normal: &[f32], offset: f32, v: &[f32]) -> f32 {
    dot(normal, v) - offset
}

fn build_node(store: &VectorStore, ids: Vec<usize>, k_leaf: usize, rng: &mut StdRng) -> Node {
    if ids.len() <= k_leaf.max(1) {
        return Node::Leaf(ids);
    }

    let Some((pa, pb)) = pick_split_pair(store, &ids, rng) else {
        // Every sampled pair coincided; no hyperplane separates anything
        return Node::Leaf(ids);
    };

    let a = store.row(pa);
    let b = store.row(pb);
    let normal: Vec<f32> = a.iter().zip(b).map(|(x, y)| x - y).collect();
    let offset: f32 = normal
        .iter()
        .zip(a.iter().zip(b))
        .map(|(n, (x, y))| n * (x + y) * 0.5)
        .sum();

    let mut left = Vec::new();
    let mut right = Vec::new();
    for &id in &ids {
        if margin(&normal, offset, store.row(id)) < 0.0 {
            left.push(id);
        } else {
            right.push(id);
        }
    }

    if left.is_empty() || right.is_empty() {
        // Degenerate split (all points on one side), keep the whole set
        return Node::Leaf(ids);
    }

    Node::Split {
        normal,
        offset,
        left: Box::new(build_node(store, left, k_leaf, rng)),
        right: Box::new(build_node(store, right, k_leaf, rng)),
    }
}

fn pick_split_pair(store: &VectorStore, ids: &[usize], rng: &mut StdRng) -> Option<(usize, usize)> {
    for _ in 0..SPLIT_RETRIES {
        let i = rng.gen_range(0..ids.len());
        let mut j = rng.gen_range(0..ids.len() - 1);
        if j >= i {
            j += 1;
        }
        let (pa, pb) = (ids[i], ids[j]);
        if store.row(pa) != store.row(pb) {
            return Some((pa, pb));
        }
    }
    None
}
