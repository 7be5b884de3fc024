//! # hikemap
//!
//! Viewport-aware clustering for a map of mountain hiking routes.
//!
//! Raw location records arrive in a projected planar coordinate system. They
//! are converted to geodetic coordinates, classified into administrative
//! regions and then clustered according to the map's zoom tier. A debounced
//! controller re-runs the clustering whenever the external map display
//! reports a viewport change.

pub mod core;
pub mod data;
pub mod input;
pub mod prelude;
#[cfg(feature = "tokio-runtime")]
pub mod runtime;
pub mod spatial;
pub mod traits;

pub use crate::core::constants;

// Re-export public API
pub use crate::core::{
    config::{MapViewOptions, ViewProfile},
    geo::{GeoBounds, GeoPoint, ProjectedPoint},
    viewport::{Viewport, ZoomTier},
};

pub use data::{
    conversion::{convert, ConversionError, Converter},
    geometry::{normalize, NormalizedGeometry, RawGeometry},
    records::{build_entities, parse_records, Entity, RawLocationRecord},
    region::{classify, Region},
};

pub use input::{
    controller::{ViewportController, TickOutcome},
    events::ViewportEvent,
};

pub use spatial::clustering::{Cluster, ClusterResult, ClusteringEngine, MarkerRequest};

pub use traits::{CenterCatalog, MapDisplay, RecordSource};

#[cfg(feature = "tokio-runtime")]
pub use runtime::{MapHandle, ViewportLoop};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, MapError>;

pub type Error = MapError;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "http")]
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Source error: {0}")]
    Source(String),
}
