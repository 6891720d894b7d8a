use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    #[error("Insufficient data: index needs {needed} vectors, store holds {have}")]
    InsufficientData { needed: usize, have: usize },

    #[error("Search params kind mismatch: active index is {expected}, params are for {got}")]
    ParamsKindMismatch {
        expected: &'static str,
        got: &'static str,
    },
}

impl IndexError {
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::InsufficientData { .. } => true,
            Self::ParamsKindMismatch { .. } => true,
        }
    }
}
