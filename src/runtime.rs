//! Tokio driver for the viewport controller
//!
//! [`ViewportLoop`] owns the display, the entity set and a
//! [`ViewportController`]. Viewport notifications and record refreshes reach
//! it over an unbounded channel; the debounce window is a single
//! `sleep_until` that is re-armed on every pass of the loop. Clustering runs
//! on the blocking pool and the timer is disarmed until it returns.

use crate::core::config::{MapViewOptions, MarkerSizeConfig};
use crate::core::viewport::Viewport;
use crate::data::conversion::default_converter;
use crate::data::records::{build_entities, Entity};
use crate::data::region::Region;
use crate::input::controller::{drill_down, render_result, Firing, ViewportController};
use crate::input::events::{MapCommand, ViewportEvent};
use crate::prelude::Arc;
use crate::spatial::clustering::{Cluster, ClusterResult, ClusteringEngine};
use crate::traits::{CenterCatalog, MapDisplay, RecordSource};
use crate::{MapError, Result};
use std::future;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};

/// Fetches records and turns them into entities with the shared converter
pub async fn fetch_entities<S, C>(source: &S, catalog: &C) -> Result<Vec<Entity>>
where
    S: RecordSource + ?Sized,
    C: CenterCatalog + ?Sized,
{
    let records = source.fetch().await.map_err(|err| {
        log::warn!("fetch from {} failed: {}", source.describe(), err);
        err
    })?;
    Ok(build_entities(records, catalog, default_converter()))
}

/// Sending half of a [`ViewportLoop`]
#[derive(Debug, Clone)]
pub struct MapHandle {
    tx: mpsc::UnboundedSender<MapCommand>,
}

impl MapHandle {
    /// Reports a viewport change at the current time.
    /// Returns `false` once the loop has stopped.
    pub fn notify(&self, zoom_level: i32) -> bool {
        self.send(ViewportEvent::now(zoom_level).into())
    }

    /// Replaces the loop's entity set
    pub fn replace_entities(&self, entities: Vec<Entity>) -> bool {
        self.send(MapCommand::Records(entities))
    }

    /// Zooms the display into one region, as when a cluster marker is clicked
    pub fn open_region(&self, region: Region) -> bool {
        self.send(MapCommand::OpenRegion(region))
    }

    /// Fetches from `source` and hands the result to the loop.
    /// Fails if the loop has already stopped.
    pub async fn refresh<S, C>(&self, source: &S, catalog: &C) -> Result<usize>
    where
        S: RecordSource + ?Sized,
        C: CenterCatalog + ?Sized,
    {
        let entities = fetch_entities(source, catalog).await?;
        let count = entities.len();
        if !self.replace_entities(entities) {
            return Err(MapError::Source("viewport loop stopped".into()));
        }
        Ok(count)
    }

    pub fn shutdown(&self) -> bool {
        self.send(MapCommand::Shutdown)
    }

    pub fn send(&self, command: MapCommand) -> bool {
        self.tx.send(command).is_ok()
    }
}

pub struct ViewportLoop<D: MapDisplay> {
    display: D,
    controller: ViewportController,
    engine: ClusteringEngine,
    sizing: MarkerSizeConfig,
    entities: Arc<Vec<Entity>>,
    commands: mpsc::UnboundedReceiver<MapCommand>,
}

impl<D: MapDisplay + 'static> ViewportLoop<D> {
    /// Builds the loop and subscribes it to `display`
    pub fn new(mut display: D, options: &MapViewOptions) -> (Self, MapHandle) {
        let (tx, commands) = mpsc::unbounded_channel();

        // weak, so only MapHandles keep the loop alive
        let listener_tx = tx.downgrade();
        display.subscribe(Box::new(move |event: ViewportEvent| {
            let delivered = listener_tx
                .upgrade()
                .map_or(false, |tx| tx.send(event.into()).is_ok());
            if !delivered {
                log::trace!("viewport loop gone, dropping zoom {}", event.zoom_level);
            }
        }));

        let viewport_loop = Self {
            display,
            controller: ViewportController::new(&options.debounce),
            engine: ClusteringEngine::new(options.zoom),
            sizing: options.marker.clone(),
            entities: Arc::new(Vec::new()),
            commands,
        };
        (viewport_loop, MapHandle { tx })
    }

    /// Seeds the entity set and schedules the first render
    pub fn with_entities(mut self, entities: Vec<Entity>) -> Self {
        self.entities = Arc::new(entities);
        self.controller.invalidate(now());
        self
    }

    pub fn controller(&self) -> &ViewportController {
        &self.controller
    }

    pub fn spawn(self) -> JoinHandle<D>
    where
        D: Send,
    {
        tokio::spawn(self.run())
    }

    /// Runs until [`MapHandle::shutdown`] or until every handle is dropped,
    /// then hands the display back. The display's own listener does not keep
    /// the loop alive.
    pub async fn run(mut self) -> D {
        let mut running: Option<JoinHandle<ClusterResult>> = None;

        loop {
            // disarmed while a recompute is running; a deferred update fires
            // as soon as it completes
            let deadline = match running {
                Some(_) => None,
                None => self.controller.deadline(),
            };

            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(MapCommand::Viewport(event)) => {
                        self.controller.notify(event);
                    }
                    Some(MapCommand::Records(entities)) => {
                        log::info!("entity set replaced ({} entities)", entities.len());
                        self.entities = Arc::new(entities);
                        self.controller.invalidate(now());
                    }
                    Some(MapCommand::OpenRegion(region)) => self.open_region(region),
                    Some(MapCommand::Shutdown) | None => break,
                },
                () = sleep_until(deadline) => {
                    running = self.fire();
                }
                joined = join(&mut running) => {
                    running = None;
                    self.controller.complete();
                    self.render(joined);
                }
            }
        }

        if let Some(task) = running {
            task.abort();
        }
        log::debug!("viewport loop stopped");
        self.display
    }

    fn fire(&mut self) -> Option<JoinHandle<ClusterResult>> {
        let zoom_level = self.display.zoom_level();
        match self.controller.fire(now(), zoom_level) {
            Firing::Recompute { zoom_level } => {
                let bounds = self.display.visible_bounds();
                let entities = Arc::clone(&self.entities);
                let engine = self.engine.clone();
                Some(tokio::task::spawn_blocking(move || {
                    engine.cluster(&entities, &Viewport::new(zoom_level, &bounds))
                }))
            }
            Firing::Unchanged => {
                log::debug!("zoom {} unchanged at expiry, skipping", zoom_level);
                None
            }
            Firing::NotDue | Firing::Deferred => None,
        }
    }

    fn open_region(&mut self, region: Region) {
        match Cluster::for_region(&region, &self.entities) {
            Some(cluster) => {
                drill_down(&mut self.display, &cluster, self.engine.config());
            }
            None => log::debug!("region {} has no entities to open", region),
        }
    }

    fn render(&mut self, joined: std::result::Result<ClusterResult, JoinError>) {
        match joined {
            Ok(result) => {
                let markers = render_result(&mut self.display, &result, &self.sizing);
                log::info!(
                    "rendered {} markers for {} entities at zoom {:?}",
                    markers,
                    result.entity_count(),
                    self.controller.last_applied_zoom()
                );
            }
            Err(err) => log::warn!("clustering task failed: {}", err),
        }
    }
}

fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline.into()).await,
        None => future::pending().await,
    }
}

async fn join(
    running: &mut Option<JoinHandle<ClusterResult>>,
) -> std::result::Result<ClusterResult, JoinError> {
    match running {
        Some(task) => task.await,
        None => future::pending().await,
    }
}
