//! Prelude module for common hikemap types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use hikemap::prelude::*;`

pub use crate::core::{
    config::{
        DebounceConfig, FetchConfig, MapViewOptions, MarkerSizeConfig, ViewProfile, ZoomTierConfig,
    },
    geo::{GeoBounds, GeoPoint, ProjectedPoint},
    viewport::{Viewport, ZoomTier},
};

pub use crate::data::{
    conversion::{convert, ConversionError, Converter},
    geometry::{normalize, NormalizedGeometry, RawGeometry},
    records::{build_entities, parse_records, Entity, RawLocationRecord},
    region::{classify, Region},
};

pub use crate::spatial::clustering::{Cluster, ClusterResult, ClusteringEngine, MarkerRequest};

pub use crate::input::{
    controller::{render_result, ControllerState, TickOutcome, ViewportController},
    events::{ViewportEvent, ViewportListener},
};

pub use crate::traits::{CenterCatalog, MapDisplay, NoCatalog, RecordSource, VisibleBounds};

#[cfg(feature = "tokio-runtime")]
pub use crate::data::source::JsonFileSource;

#[cfg(feature = "http")]
pub use crate::data::source::HttpRecordSource;

#[cfg(feature = "tokio-runtime")]
pub use crate::runtime::{fetch_entities, MapHandle, ViewportLoop};

pub use crate::{MapError, Result};

pub use std::{
    sync::Arc,
    time::{Duration, Instant},
};

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet};
