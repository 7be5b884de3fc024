//! Administrative region labels derived from free-text locations.
//!
//! Korean address strings lead with the province or metropolitan-city name,
//! so the first whitespace-separated token is the region.

use crate::core::constants::OTHER_REGION;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Administrative-unit label used to group entities
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Region(String);

impl Region {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// The reserved bucket for entities without an extractable region
    pub fn other() -> Self {
        Self(OTHER_REGION.to_string())
    }

    pub fn is_other(&self) -> bool {
        self.0 == OTHER_REGION
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Classifies a location string. Never fails: empty or missing text maps to
/// [`Region::other`].
pub fn classify(location: Option<&str>) -> Region {
    location
        .and_then(|text| text.split_whitespace().next())
        .map(Region::new)
        .unwrap_or_else(Region::other)
}
