// ## Crate organization
// - Core: store, metrics, search, index (flat / ivf / annoy)
// - Persistence: codec (binary save/load format)
// - Error handling: thiserror-based Result types
//
// The database is a plain value: no singletons, no interior locking.
// Server and CLI front-ends live outside this crate and consume only the
// `VegamDb` surface.

pub mod config;
pub mod db;
pub mod error;
pub mod index;
pub mod metrics;
pub mod search;
pub mod store;

mod codec;

pub use config::ExecutionMode;
pub use db::{DbStats, VegamDb};
pub use error::{CodecError, IndexError, Result, StoreError, VegamError};
pub use index::{
    AnnoyConfig, AnnoySearchParams, IndexKind, IvfConfig, IvfSearchParams, KMeans, KMeansModel,
    SearchParams,
};
pub use search::SearchResult;
pub use store::VectorStore;
