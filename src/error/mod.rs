pub mod types;
pub mod store;
pub mod index;
pub mod codec;

pub use types::{Result, VegamError};
pub use store::StoreError;
pub use index::IndexError;
pub use codec::CodecError;
