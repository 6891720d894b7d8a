use thiserror::Error;
use std::io;

pub type Result<T> = std::result::Result<T, VegamError>;

#[derive(Error, Debug)]
pub enum VegamError {
    // Store errors (dimension and shape violations)
    #[error("Store error: {0}")]
    Store(#[from] super::store::StoreError),

    // Index errors (build prerequisites, search params)
    #[error("Index error: {0}")]
    Index(#[from] super::index::IndexError),

    // Persistence errors (corrupt files, format violations)
    #[error("Codec error: {0}")]
    Codec(#[from] super::codec::CodecError),

    // IO errors outside the codec
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl VegamError {
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Store(e) => e.is_recoverable(),
            Self::Index(e) => e.is_recoverable(),
            Self::Codec(e) => e.is_recoverable(),
            Self::Io(_) => false,
        }
    }
}
