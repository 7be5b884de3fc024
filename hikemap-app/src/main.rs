use anyhow::Context;
use clap::Parser;
use hikemap::{
    data::source::{HttpRecordSource, JsonFileSource},
    input::{events::ViewportListener, ViewportEvent},
    prelude::HashMap,
    runtime::fetch_entities,
    ClusterResult, ClusteringEngine, Entity, GeoBounds, MapDisplay, MapViewOptions, MarkerRequest,
    RecordSource, Viewport, ViewportLoop, ZoomTier,
};
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Headless driver for the mountain map view
#[derive(Debug, Parser)]
#[command(name = "hikemap-app")]
#[command(about = "Clusters hiking-route records for a map viewport and prints the marker requests")]
struct Cli {
    /// Records JSON file, or the backend base URL (http/https)
    #[arg(long, env = "HIKEMAP_RECORDS")]
    records: Option<String>,

    /// JSON object of externally maintained centers keyed by record code
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// JSON configuration file; missing fields take their defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Zoom level for a one-shot view
    #[arg(long, default_value_t = 7)]
    zoom: i32,

    /// Visible area as south,west,north,east (defaults to the operating window)
    #[arg(long, value_parser = parse_bounds)]
    bounds: Option<GeoBounds>,

    /// Replays zoom changes through the debounced loop, e.g. 9,8,6,5
    #[arg(long, value_delimiter = ',')]
    zoom_steps: Vec<i32>,

    /// Pause between replayed zoom changes
    #[arg(long, default_value_t = 100)]
    step_interval_ms: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let options = match &cli.config {
        Some(path) => MapViewOptions::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => MapViewOptions::default(),
    };

    let catalog: HashMap<String, Value> = match &cli.catalog {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading catalog {}", path.display()))?;
            serde_json::from_str(&raw).context("catalog must be a JSON object")?
        }
        None => HashMap::default(),
    };

    let source = record_source(cli.records.as_deref(), &options)?;
    let entities = fetch_entities(source.as_ref(), &catalog)
        .await
        .with_context(|| format!("fetching records from {}", source.describe()))?;

    let bounds = cli.bounds.unwrap_or_else(GeoBounds::operating_window);
    if cli.zoom_steps.is_empty() {
        print_view(&options, &entities, cli.zoom, bounds)
    } else {
        replay(&options, entities, bounds, &cli.zoom_steps, cli.step_interval_ms).await
    }
}

fn record_source(
    records: Option<&str>,
    options: &MapViewOptions,
) -> anyhow::Result<Box<dyn RecordSource>> {
    match records {
        Some(path) if !path.starts_with("http://") && !path.starts_with("https://") => {
            Ok(Box::new(JsonFileSource::new(path)))
        }
        url => {
            let mut fetch = options.fetch.clone();
            if let Some(base_url) = url {
                fetch.base_url = base_url.to_string();
            }
            Ok(Box::new(HttpRecordSource::new(&fetch)?))
        }
    }
}

fn parse_bounds(raw: &str) -> Result<GeoBounds, String> {
    let parts = raw
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| format!("invalid bounds: {}", err))?;
    match parts.as_slice() {
        &[south, west, north, east] if south <= north && west <= east => {
            Ok(GeoBounds::from_coords(south, west, north, east))
        }
        _ => Err("expected south,west,north,east".to_string()),
    }
}

#[derive(Serialize)]
struct ViewReport<'a> {
    zoom: i32,
    tier: ZoomTier,
    bounds: GeoBounds,
    extent: Option<GeoBounds>,
    entities: usize,
    markers: &'a [MarkerRequest],
}

fn print_view(
    options: &MapViewOptions,
    entities: &[Entity],
    zoom: i32,
    bounds: GeoBounds,
) -> anyhow::Result<()> {
    let engine = ClusteringEngine::new(options.zoom);
    let result: ClusterResult = engine.cluster(entities, &Viewport::new(zoom, &bounds));
    let markers = result.marker_requests(&options.marker);

    let report = ViewReport {
        zoom,
        tier: engine.tier(zoom),
        bounds,
        extent: result.extent(),
        entities: result.entity_count(),
        markers: &markers,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn replay(
    options: &MapViewOptions,
    entities: Vec<Entity>,
    bounds: GeoBounds,
    steps: &[i32],
    step_interval_ms: u64,
) -> anyhow::Result<()> {
    let display = ConsoleDisplay::new(steps[0], bounds);
    let (viewport_loop, handle) = ViewportLoop::new(display.clone(), options);
    let task = viewport_loop.with_entities(entities).spawn();

    for &zoom in &steps[1..] {
        tokio::time::sleep(Duration::from_millis(step_interval_ms)).await;
        display.zoom_to(zoom);
    }

    // let the last window close and the recompute land
    tokio::time::sleep(options.debounce.delay() + Duration::from_millis(250)).await;
    handle.shutdown();
    task.await.context("viewport loop panicked")?;

    log::info!("{} renders", display.renders());
    Ok(())
}

struct ConsoleState {
    zoom: i32,
    bounds: GeoBounds,
    renders: usize,
    listener: Option<ViewportListener>,
}

/// Display stand-in that prints every marker request as a JSON line
#[derive(Clone)]
struct ConsoleDisplay(Arc<Mutex<ConsoleState>>);

impl ConsoleDisplay {
    fn new(zoom: i32, bounds: GeoBounds) -> Self {
        Self(Arc::new(Mutex::new(ConsoleState {
            zoom,
            bounds,
            renders: 0,
            listener: None,
        })))
    }

    fn state(&self) -> std::sync::MutexGuard<'_, ConsoleState> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn zoom_to(&self, zoom: i32) {
        let mut state = self.state();
        state.zoom = zoom;
        log::debug!("display zoomed to {}", zoom);
        if let Some(listener) = &state.listener {
            listener(ViewportEvent::now(zoom));
        }
    }

    fn renders(&self) -> usize {
        self.state().renders
    }
}

impl MapDisplay for ConsoleDisplay {
    fn zoom_level(&self) -> i32 {
        self.state().zoom
    }

    fn visible_bounds(&self) -> GeoBounds {
        self.state().bounds
    }

    fn subscribe(&mut self, listener: ViewportListener) {
        self.state().listener = Some(listener);
    }

    fn fit_bounds(&mut self, bounds: GeoBounds) {
        self.state().bounds = bounds;
    }

    fn set_zoom_level(&mut self, zoom_level: i32) {
        self.zoom_to(zoom_level);
    }

    fn clear_markers(&mut self) {
        let mut state = self.state();
        state.renders += 1;
        println!("{}", serde_json::json!({ "render": state.renders, "zoom": state.zoom }));
    }

    fn add_marker(&mut self, marker: MarkerRequest) {
        match serde_json::to_string(&marker) {
            Ok(line) => println!("{}", line),
            Err(err) => log::warn!("could not encode marker: {}", err),
        }
    }
}
