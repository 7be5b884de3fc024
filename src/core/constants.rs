//! Core constants for the mountain map view.

/// Latitude of the projection origin (degrees).
pub const ORIGIN_LAT: f64 = 38.0;

/// Central meridian of the projection (degrees).
pub const ORIGIN_LON: f64 = 127.0;

/// False easting of the central belt in metres.
pub const FALSE_EASTING: f64 = 200_000.0;

/// False northing of the central belt in metres.
pub const FALSE_NORTHING: f64 = 600_000.0;

/// Scale factor on the central meridian.
pub const SCALE_FACTOR: f64 = 1.0;

/// GRS80 semi-major axis in metres.
pub const GRS80_SEMI_MAJOR: f64 = 6_378_137.0;

/// GRS80 inverse flattening.
pub const GRS80_INV_FLATTENING: f64 = 298.257_222_101;

/// Projected inputs with a larger magnitude are treated as corrupt.
pub const MAX_PROJECTED_MAGNITUDE: f64 = 1_000_000.0;

/// Operating region window: (south, west, north, east).
pub const OPERATING_WINDOW: (f64, f64, f64, f64) = (33.0, 124.0, 43.0, 132.0);

/// Region label used when a location string yields no administrative unit.
pub const OTHER_REGION: &str = "기타";

/// Zoom levels at or below this show every visible entity.
pub const DEFAULT_INDIVIDUAL_MAX_ZOOM: i32 = 5;

/// Zoom levels at or below this (and above the individual tier) open one region.
pub const DEFAULT_MIXED_MAX_ZOOM: i32 = 6;

/// Quiet period before a viewport change is acted upon.
pub const DEFAULT_DEBOUNCE_MS: u64 = 400;

/// Cluster marker glyph size bounds (pixels) and growth factor.
pub const CLUSTER_MARKER_BASE_SIZE: f64 = 40.0;
pub const CLUSTER_MARKER_SCALE: f64 = 6.0;
pub const CLUSTER_MARKER_MAX_SIZE: f64 = 100.0;

/// Individual marker names longer than this are truncated.
pub const MARKER_NAME_MAX_CHARS: usize = 15;

/// Default endpoint serving the record list.
pub const DEFAULT_RECORDS_PATH: &str = "/api/mountains";

/// Default request timeout for record fetches.
pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 10_000;
