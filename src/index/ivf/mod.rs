mod config;
mod index;
mod kmeans;

pub use config::IvfConfig;
pub use index::IvfIndex;
pub use kmeans::{KMeans, KMeansModel};
