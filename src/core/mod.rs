pub mod config;
pub mod constants;
pub mod geo;
pub mod viewport;

pub use config::{
    DebounceConfig, FetchConfig, MapViewOptions, MarkerSizeConfig, ViewProfile, ZoomTierConfig,
};
pub use geo::{GeoBounds, GeoPoint, ProjectedPoint};
pub use viewport::{Viewport, ZoomTier};
