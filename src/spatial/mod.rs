pub mod clustering;
pub mod culling;

pub use clustering::{Cluster, ClusterResult, ClusteringEngine, MarkerRequest};
pub use culling::Culling;
