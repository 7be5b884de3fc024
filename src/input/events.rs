use crate::data::records::Entity;
use crate::data::region::Region;
use std::time::Instant;

/// Viewport-change notification delivered by the map display
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportEvent {
    pub zoom_level: i32,
    pub at: Instant,
}

impl ViewportEvent {
    pub fn new(zoom_level: i32, at: Instant) -> Self {
        Self { zoom_level, at }
    }

    /// Stamps the notification with the current time. With the tokio
    /// runtime enabled this follows tokio's clock, so paused test time
    /// applies.
    pub fn now(zoom_level: i32) -> Self {
        #[cfg(feature = "tokio-runtime")]
        let at = tokio::time::Instant::now().into_std();
        #[cfg(not(feature = "tokio-runtime"))]
        let at = Instant::now();
        Self::new(zoom_level, at)
    }
}

/// Callback registered with [`MapDisplay::subscribe`](crate::traits::MapDisplay::subscribe)
pub type ViewportListener = Box<dyn Fn(ViewportEvent) + Send + Sync>;

/// Commands accepted by the viewport loop
#[derive(Debug)]
pub enum MapCommand {
    /// A viewport change reported by the display
    Viewport(ViewportEvent),
    /// Replaces the entity set after a (re)fetch
    Records(Vec<Entity>),
    /// Zooms into one region's members
    OpenRegion(Region),
    Shutdown,
}

impl From<ViewportEvent> for MapCommand {
    fn from(event: ViewportEvent) -> Self {
        MapCommand::Viewport(event)
    }
}
