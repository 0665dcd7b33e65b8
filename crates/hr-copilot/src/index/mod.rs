//! Vector index, its on-disk format and the shared store handle

pub mod persistence;
mod store;
mod vector_index;

pub use persistence::{IndexManifest, LoadExpectations};
pub use store::IndexStore;
pub use vector_index::{embed_chunks, DistanceMetric, Neighbor, VectorIndex};
