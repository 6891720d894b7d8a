use thiserror::Error;

// Every variant means the file failed validation; the database is left
// untouched. Plain filesystem failures surface as `VegamError::Io` instead.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Bad magic bytes, not a vegam database file")]
    BadMagic,

    #[error("Unsupported format version {0}")]
    UnsupportedVersion(u32),

    #[error("Unknown index kind tag {0:#04x}")]
    UnknownIndexKind(u8),

    #[error("Unknown tree node tag {0:#04x}")]
    UnknownNodeTag(u8),

    #[error("File truncated: needed {needed} more bytes at offset {offset}")]
    Truncated { offset: usize, needed: usize },

    #[error("Trailing garbage: {extra} bytes past the end of the payload")]
    TrailingBytes { extra: usize },

    #[error("Vector id {id} out of range for a store of {count} vectors")]
    IdOutOfRange { id: u64, count: u64 },
}

impl CodecError {
    pub fn is_recoverable(&self) -> bool {
        false
    }
}
