use crate::core::config::ZoomTierConfig;
use crate::core::geo::GeoPoint;
use crate::traits::VisibleBounds;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse classification of a zoom level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ZoomTier {
    /// Far view: one marker per region
    Clustered,
    /// Intermediate view: the dominant region is opened into individual markers
    Mixed,
    /// Close view: every visible entity gets its own marker
    Individual,
}

impl ZoomTier {
    /// Classifies a zoom level. Lower numbers are closer views.
    pub fn classify(zoom_level: i32, config: &ZoomTierConfig) -> Self {
        if zoom_level <= config.individual_max {
            ZoomTier::Individual
        } else if zoom_level <= config.mixed_max {
            ZoomTier::Mixed
        } else {
            ZoomTier::Clustered
        }
    }
}

/// What the clustering engine needs to know about the visible map: the
/// zoom level and a containment test for the visible area.
///
/// The bounds are borrowed for the duration of one clustering call; no
/// map-provider object is retained.
#[derive(Clone, Copy)]
pub struct Viewport<'a> {
    pub zoom_level: i32,
    bounds: &'a dyn VisibleBounds,
}

impl<'a> Viewport<'a> {
    pub fn new(zoom_level: i32, bounds: &'a dyn VisibleBounds) -> Self {
        Self { zoom_level, bounds }
    }

    pub fn contains(&self, point: &GeoPoint) -> bool {
        self.bounds.contains_point(point)
    }

    pub fn tier(&self, config: &ZoomTierConfig) -> ZoomTier {
        ZoomTier::classify(self.zoom_level, config)
    }
}

impl fmt::Debug for Viewport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Viewport")
            .field("zoom_level", &self.zoom_level)
            .finish_non_exhaustive()
    }
}
