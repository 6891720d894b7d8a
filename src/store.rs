// Vector store: the single owner of the raw vector data.
//
// One contiguous row-major f32 matrix. IDs are row positions: assigned in
// insertion order, dense from zero, never reused or renumbered, so index
// structures can hold raw IDs as stable references across the store's
// lifetime. The store is append-only; replacing it wholesale (load) is the
// only other mutation.

use tracing::debug;

use crate::error::StoreError;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VectorStore {
    data: Vec<f32>,
    dim: usize,
}

impl VectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_parts(data: Vec<f32>, dim: usize) -> Self {
        VectorStore { data, dim }
    }

    // Vector length, 0 until the first insertion fixes it
    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        if self.dim == 0 {
            0
        } else {
            self.data.len() / self.dim
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, id: usize) -> Option<&[f32]> {
        if id < self.len() {
            Some(self.row(id))
        } else {
            None
        }
    }

    // Row access without the bounds check; ids held by index structures
    // are always in range (append-only store, never renumbered).
    pub(crate) fn row(&self, id: usize) -> &[f32] {
        &self.data[id * self.dim..(id + 1) * self.dim]
    }

    pub(crate) fn as_flat(&self) -> &[f32] {
        &self.data
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = (usize, &[f32])> {
        let dim = self.dim;
        self.data
            .chunks_exact(dim.max(1))
            .enumerate()
            .take(self.len())
    }

    /// Append one vector, returning its new ID.
    ///
    /// The first insertion fixes the store dimension; every later vector
    /// must match it.
    pub fn add(&mut self, vec: &[f32]) -> Result<usize, StoreError> {
        // Zero-length vectors would leave the dimension permanently unset
        if vec.is_empty() || (self.dim != 0 && vec.len() != self.dim) {
            return Err(StoreError::DimensionMismatch {
                expected: self.dim.max(1),
                actual: vec.len(),
            });
        }

        if self.dim == 0 {
            self.dim = vec.len();
        }

        let id = self.len();
        self.data.extend_from_slice(vec);
        Ok(id)
    }

    /// Append a batch of rows. Every row is dimension-checked before the
    /// first append, so an error leaves the store untouched.
    pub fn add_batch(&mut self, rows: &[Vec<f32>]) -> Result<Vec<usize>, StoreError> {
        let Some(first) = rows.first() else {
            return Ok(Vec::new());
        };

        let expected = if self.dim != 0 { self.dim } else { first.len() };
        if expected == 0 {
            return Err(StoreError::DimensionMismatch {
                expected: 1,
                actual: 0,
            });
        }
        for row in rows {
            if row.len() != expected {
                return Err(StoreError::DimensionMismatch {
                    expected,
                    actual: row.len(),
                });
            }
        }

        if self.dim == 0 {
            self.dim = expected;
        }

        let start = self.len();
        self.data.reserve(rows.len() * expected);
        for row in rows {
            self.data.extend_from_slice(row);
        }

        debug!(rows = rows.len(), dim = expected, "batch_appended");
        Ok((start..start + rows.len()).collect())
    }

    /// Append a flattened 1-D or 2-D array. This is the boundary entry for
    /// host-language buffers: the shape is validated once, then rows flow
    /// through the same append path as everything else.
    pub fn add_array(&mut self, data: &[f32], shape: &[usize]) -> Result<Vec<usize>, StoreError> {
        let (rows, cols) = match *shape {
            [len] => (1, len),
            [rows, cols] => (rows, cols),
            _ => return Err(StoreError::InvalidShape { ndim: shape.len() }),
        };

        let expected = rows * cols;
        if data.len() != expected {
            return Err(StoreError::ShapeDataMismatch {
                expected,
                actual: data.len(),
            });
        }

        if rows == 0 {
            return Ok(Vec::new());
        }
        if cols == 0 {
            return Err(StoreError::DimensionMismatch {
                expected: self.dim.max(1),
                actual: 0,
            });
        }

        if self.dim != 0 && cols != self.dim {
            return Err(StoreError::DimensionMismatch {
                expected: self.dim,
                actual: cols,
            });
        }

        if self.dim == 0 {
            self.dim = cols;
        }

        let start = self.len();
        self.data.extend_from_slice(data);
        Ok((start..start + rows).collect())
    }
}
