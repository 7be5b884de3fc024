//! Configuration for the map view engine
//!
//! Zoom-tier thresholds, debounce timing, marker sizing and record fetching
//! are grouped into [`MapViewOptions`]. Presets are available through
//! [`ViewProfile`], and partial JSON files are accepted because every field
//! falls back to the reference defaults.

use crate::core::constants::*;
use crate::{MapError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ViewProfile {
    /// Values observed in the reference behavior
    #[default]
    Reference,
    /// Shorter debounce and wider individual tier for small datasets
    Responsive,
    Custom(MapViewOptions),
}

impl ViewProfile {
    pub fn resolve(&self) -> MapViewOptions {
        match self {
            Self::Reference => MapViewOptions::default(),
            Self::Responsive => MapViewOptions {
                zoom: ZoomTierConfig {
                    individual_max: 6,
                    mixed_max: 7,
                },
                debounce: DebounceConfig { delay_ms: 150 },
                ..MapViewOptions::default()
            },
            Self::Custom(options) => options.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MapViewOptions {
    pub zoom: ZoomTierConfig,
    pub debounce: DebounceConfig,
    pub marker: MarkerSizeConfig,
    pub fetch: FetchConfig,
}

impl MapViewOptions {
    /// Parses options from JSON; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let options: MapViewOptions = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        self.zoom.validate()?;
        if self.debounce.delay_ms == 0 {
            return Err(MapError::Config("debounce delay must be positive".into()));
        }
        self.marker.validate()
    }
}

/// Zoom thresholds. Lower zoom numbers are closer views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomTierConfig {
    /// Zoom levels `<=` this render every visible entity
    pub individual_max: i32,
    /// Zoom levels `<=` this (and above `individual_max`) open the dominant region
    pub mixed_max: i32,
}

impl Default for ZoomTierConfig {
    fn default() -> Self {
        Self {
            individual_max: DEFAULT_INDIVIDUAL_MAX_ZOOM,
            mixed_max: DEFAULT_MIXED_MAX_ZOOM,
        }
    }
}

impl ZoomTierConfig {
    pub fn validate(&self) -> Result<()> {
        if self.individual_max >= self.mixed_max {
            return Err(MapError::Config(format!(
                "individual zoom threshold ({}) must be below mixed threshold ({})",
                self.individual_max, self.mixed_max
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebounceConfig {
    pub delay_ms: u64,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            delay_ms: DEFAULT_DEBOUNCE_MS,
        }
    }
}

impl DebounceConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// Sizing of marker glyphs handed to the display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerSizeConfig {
    pub base_size: f64,
    pub scale_factor: f64,
    pub max_size: f64,
    pub name_max_chars: usize,
}

impl Default for MarkerSizeConfig {
    fn default() -> Self {
        Self {
            base_size: CLUSTER_MARKER_BASE_SIZE,
            scale_factor: CLUSTER_MARKER_SCALE,
            max_size: CLUSTER_MARKER_MAX_SIZE,
            name_max_chars: MARKER_NAME_MAX_CHARS,
        }
    }
}

impl MarkerSizeConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.base_size > 0.0 && self.scale_factor >= 0.0 && self.max_size >= self.base_size)
        {
            return Err(MapError::Config(format!(
                "invalid marker sizing: base {} scale {} max {}",
                self.base_size, self.scale_factor, self.max_size
            )));
        }
        Ok(())
    }

    /// `min(base + sqrt(count) * scale, max)`
    pub fn cluster_size(&self, count: usize) -> f64 {
        (self.base_size + (count as f64).sqrt() * self.scale_factor).min(self.max_size)
    }

    pub fn label_font_size(count: usize) -> u32 {
        match count {
            0..=9 => 12,
            10..=99 => 14,
            _ => 16,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub base_url: String,
    pub records_path: String,
    pub timeout_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            records_path: DEFAULT_RECORDS_PATH.to_string(),
            timeout_ms: DEFAULT_FETCH_TIMEOUT_MS,
        }
    }
}

impl FetchConfig {
    pub fn records_url(&self) -> String {
        format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            self.records_path
        )
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference() {
        let options = ViewProfile::Reference.resolve();
        assert_eq!(options.zoom.individual_max, 5);
        assert_eq!(options.zoom.mixed_max, 6);
        assert_eq!(options.debounce.delay(), Duration::from_millis(400));
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let options = MapViewOptions::from_json_str(r#"{ "debounce": { "delay_ms": 250 } }"#)
            .unwrap();
        assert_eq!(options.debounce.delay_ms, 250);
        assert_eq!(options.zoom, ZoomTierConfig::default());
        assert_eq!(options.fetch.records_path, "/api/mountains");
    }

    #[test]
    fn test_rejects_inverted_thresholds() {
        let err = MapViewOptions::from_json_str(
            r#"{ "zoom": { "individual_max": 6, "mixed_max": 6 } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, MapError::Config(_)));
    }

    #[test]
    fn test_cluster_size_is_capped_and_monotonic() {
        let marker = MarkerSizeConfig::default();
        assert_eq!(marker.cluster_size(1), 46.0);
        assert!(marker.cluster_size(10) < marker.cluster_size(11));
        assert_eq!(marker.cluster_size(10_000), 100.0);
    }

    #[test]
    fn test_label_font_size() {
        assert_eq!(MarkerSizeConfig::label_font_size(9), 12);
        assert_eq!(MarkerSizeConfig::label_font_size(42), 14);
        assert_eq!(MarkerSizeConfig::label_font_size(100), 16);
    }

    #[test]
    fn test_records_url() {
        let fetch = FetchConfig {
            base_url: "https://example.org/".into(),
            ..FetchConfig::default()
        };
        assert_eq!(fetch.records_url(), "https://example.org/api/mountains");
    }
}
