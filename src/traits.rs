//! Shared trait abstractions
//!
//! These are the seams between the core and its collaborators: the visible
//! area test, the external map display, the record fetch layer and the
//! center catalog.

use crate::core::geo::{GeoBounds, GeoPoint};
use crate::data::records::RawLocationRecord;
use crate::input::events::ViewportListener;
use crate::prelude::HashMap;
use crate::spatial::clustering::MarkerRequest;
use crate::Result;
use async_trait::async_trait;

/// Containment test for the visible map area
pub trait VisibleBounds {
    fn contains_point(&self, point: &GeoPoint) -> bool;
}

impl VisibleBounds for GeoBounds {
    fn contains_point(&self, point: &GeoPoint) -> bool {
        self.contains(point)
    }
}

impl<F> VisibleBounds for F
where
    F: Fn(&GeoPoint) -> bool,
{
    fn contains_point(&self, point: &GeoPoint) -> bool {
        self(point)
    }
}

/// The external map-display service.
///
/// It owns drawing, hit-testing and pan/zoom input. The core only queries
/// the current view and hands it marker requests.
pub trait MapDisplay: Send {
    /// Current zoom level of the map
    fn zoom_level(&self) -> i32;

    /// Currently visible area
    fn visible_bounds(&self) -> GeoBounds;

    /// Registers a callback fired on every viewport change
    fn subscribe(&mut self, listener: ViewportListener);

    /// Removes every marker previously added by the core
    fn clear_markers(&mut self);

    fn add_marker(&mut self, marker: MarkerRequest);

    /// Moves the view so `bounds` is visible
    fn fit_bounds(&mut self, _bounds: GeoBounds) {}

    /// Changes the zoom level; displays report the change through their
    /// subscribed listener as usual
    fn set_zoom_level(&mut self, _zoom_level: i32) {}
}

/// Fetch layer providing the raw record set
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<RawLocationRecord>>;

    /// Human readable origin, used in logs
    fn describe(&self) -> String;
}

/// Externally maintained centers keyed by record code
pub trait CenterCatalog {
    fn center_for(&self, code: &str) -> Option<&serde_json::Value>;
}

/// Catalog with no entries
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCatalog;

impl CenterCatalog for NoCatalog {
    fn center_for(&self, _code: &str) -> Option<&serde_json::Value> {
        None
    }
}

impl CenterCatalog for HashMap<String, serde_json::Value> {
    fn center_for(&self, code: &str) -> Option<&serde_json::Value> {
        self.get(code)
    }
}

impl CenterCatalog for std::collections::HashMap<String, serde_json::Value> {
    fn center_for(&self, code: &str) -> Option<&serde_json::Value> {
        self.get(code)
    }
}
