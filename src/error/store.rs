use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid shape: expected a 1-D or 2-D array, got {ndim} dimensions")]
    InvalidShape { ndim: usize },

    #[error("Shape/data mismatch: shape implies {expected} elements, buffer holds {actual}")]
    ShapeDataMismatch { expected: usize, actual: usize },
}

impl StoreError {
    pub fn is_recoverable(&self) -> bool {
        // All store errors are caller mistakes; the store itself is untouched.
        match self {
            Self::DimensionMismatch { .. } => true,
            Self::InvalidShape { .. } => true,
            Self::ShapeDataMismatch { .. } => true,
        }
    }
}
