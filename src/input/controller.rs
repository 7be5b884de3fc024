//! Debounced viewport controller
//!
//! A small state machine sitting between the display's viewport
//! notifications and the clustering engine. Time is handed in by the caller,
//! so the same machine backs the tokio loop in [`crate::runtime`] and plain
//! synchronous use.

use crate::core::config::{DebounceConfig, MarkerSizeConfig, ZoomTierConfig};
use crate::core::viewport::Viewport;
use crate::data::records::Entity;
use crate::input::events::ViewportEvent;
use crate::spatial::clustering::{Cluster, ClusterResult, ClusteringEngine};
use crate::traits::MapDisplay;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    PendingUpdate { deadline: Instant },
}

/// What happened when the controller was offered a chance to fire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Firing {
    /// Idle, or the debounce window is still open
    NotDue,
    /// Due, but the previous recomputation has not completed
    Deferred,
    /// Due, but the display is still at the last applied zoom
    Unchanged,
    /// Recompute for this zoom level, then call [`ViewportController::complete`]
    Recompute { zoom_level: i32 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Waiting,
    Deferred,
    Unchanged,
    Recomputed(ClusterResult),
}

/// Owned controller state: current phase, last applied zoom and the
/// re-entrancy guard.
#[derive(Debug, Clone)]
pub struct ViewportController {
    state: ControllerState,
    last_applied_zoom: Option<i32>,
    in_flight: bool,
    delay: Duration,
}

impl ViewportController {
    pub fn new(config: &DebounceConfig) -> Self {
        Self::with_delay(config.delay())
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            state: ControllerState::Idle,
            last_applied_zoom: None,
            in_flight: false,
            delay,
        }
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn last_applied_zoom(&self) -> Option<i32> {
        self.last_applied_zoom
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Deadline of the pending update, if any
    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            ControllerState::PendingUpdate { deadline } => Some(deadline),
            ControllerState::Idle => None,
        }
    }

    /// Feeds a viewport notification.
    ///
    /// Returns `false` when the notification was discarded. While an update
    /// is pending every notification restarts the window, so only the latest
    /// one matters.
    pub fn notify(&mut self, event: ViewportEvent) -> bool {
        if self.state == ControllerState::Idle
            && self.last_applied_zoom == Some(event.zoom_level)
        {
            log::trace!("zoom {} already applied, ignoring", event.zoom_level);
            return false;
        }

        self.state = ControllerState::PendingUpdate {
            deadline: event.at + self.delay,
        };
        true
    }

    /// Forgets the applied zoom and schedules an update at `now`.
    ///
    /// Used when the entity set is replaced.
    pub fn invalidate(&mut self, now: Instant) {
        self.last_applied_zoom = None;
        self.state = ControllerState::PendingUpdate { deadline: now };
    }

    /// Fires the pending update if its window has elapsed.
    ///
    /// `zoom_level` is the display's zoom as read at firing time.
    pub fn fire(&mut self, now: Instant, zoom_level: i32) -> Firing {
        let deadline = match self.state {
            ControllerState::Idle => return Firing::NotDue,
            ControllerState::PendingUpdate { deadline } => deadline,
        };
        if now < deadline {
            return Firing::NotDue;
        }
        if self.in_flight {
            log::debug!("recompute still running, deferring zoom {}", zoom_level);
            return Firing::Deferred;
        }

        self.state = ControllerState::Idle;
        if self.last_applied_zoom == Some(zoom_level) {
            return Firing::Unchanged;
        }
        self.last_applied_zoom = Some(zoom_level);
        self.in_flight = true;
        Firing::Recompute { zoom_level }
    }

    /// Clears the re-entrancy guard. A deferred update stays pending and
    /// fires on the next call to [`fire`](Self::fire).
    pub fn complete(&mut self) {
        self.in_flight = false;
    }

    /// Synchronous firing: reads zoom and bounds from the display at expiry
    /// and clusters inline.
    pub fn tick<D>(
        &mut self,
        now: Instant,
        display: &D,
        entities: &[Entity],
        engine: &ClusteringEngine,
    ) -> TickOutcome
    where
        D: MapDisplay + ?Sized,
    {
        match self.fire(now, display.zoom_level()) {
            Firing::NotDue => TickOutcome::Waiting,
            Firing::Deferred => TickOutcome::Deferred,
            Firing::Unchanged => TickOutcome::Unchanged,
            Firing::Recompute { zoom_level } => {
                let bounds = display.visible_bounds();
                let result = engine.cluster(entities, &Viewport::new(zoom_level, &bounds));
                self.complete();
                TickOutcome::Recomputed(result)
            }
        }
    }
}

impl Default for ViewportController {
    fn default() -> Self {
        Self::new(&DebounceConfig::default())
    }
}

/// Replaces the display's markers with the ones for `result`.
/// Returns the number of markers added.
pub fn render_result<D>(display: &mut D, result: &ClusterResult, sizing: &MarkerSizeConfig) -> usize
where
    D: MapDisplay + ?Sized,
{
    display.clear_markers();
    let markers = result.marker_requests(sizing);
    let count = markers.len();
    for marker in markers {
        display.add_marker(marker);
    }
    count
}

/// Zooms the display into a cluster's region: fits the member bounds, then
/// steps to the mixed tier so that region opens into individual markers.
pub fn drill_down<D>(display: &mut D, cluster: &Cluster, zoom: &ZoomTierConfig) -> bool
where
    D: MapDisplay + ?Sized,
{
    let Some(bounds) = cluster.member_bounds() else {
        return false;
    };
    log::debug!("opening region {} ({} members)", cluster.region, cluster.count());
    display.fit_bounds(bounds);
    display.set_zoom_level(zoom.mixed_max);
    true
}
