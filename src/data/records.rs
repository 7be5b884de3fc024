//! Raw location records and their resolution into positioned entities.
//!
//! Records come from a schemaless store, so a center may live under several
//! field names and shapes. [`resolve_position`] probes them in a fixed order
//! and falls back to the centroid of the record's geometry.

use crate::core::geo::GeoPoint;
use crate::data::conversion::Converter;
use crate::data::geometry::normalize_value;
use crate::data::number_from;
use crate::data::region::{classify, Region};
use crate::prelude::{Arc, HashSet};
use crate::traits::CenterCatalog;
use crate::{MapError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A record as delivered by the fetch layer. Read-only to the core.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawLocationRecord {
    #[serde(default, deserialize_with = "code_from_any")]
    pub code: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center: Option<Value>,
    #[serde(default, rename = "MNTN_CTR", skip_serializing_if = "Option::is_none")]
    pub mntn_ctr: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lng: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Value>,
}

/// Codes arrive as strings or numbers
fn code_from_any<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

impl RawLocationRecord {
    pub fn new(code: impl Into<String>, name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: Some(name.into()),
            location: Some(location.into()),
            ..Default::default()
        }
    }

    pub fn with_center(mut self, center: Value) -> Self {
        self.center = Some(center);
        self
    }

    pub fn with_geometry(mut self, geometry: Value) -> Self {
        self.geometry = Some(geometry);
        self
    }

    /// Name shown on markers; falls back to a code-based label
    pub fn display_name(&self) -> String {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("산 (코드: {})", self.code),
        }
    }
}

/// Parses a fetch payload: either `{ "mountains": [...] }` or a bare array.
/// Individual records that fail to decode are skipped.
pub fn parse_records(json: &str) -> Result<Vec<RawLocationRecord>> {
    let items = match serde_json::from_str::<Value>(json)? {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("mountains") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(MapError::Source(
                    "payload has no `mountains` array".to_string(),
                ))
            }
        },
        _ => return Err(MapError::Source("unexpected payload shape".to_string())),
    };

    let total = items.len();
    let records: Vec<RawLocationRecord> = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(record) => Some(record),
            Err(e) => {
                log::debug!("skipping undecodable record: {}", e);
                None
            }
        })
        .collect();

    if records.len() < total {
        log::warn!("decoded {} of {} records", records.len(), total);
    }
    Ok(records)
}

/// Where a resolved position came from, in probe order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CenterSource {
    Center,
    MntnCtr,
    Coordinates,
    LatLon,
    Catalog,
    Geometry,
}

/// Reads `{lat, lon|lng}` or `[lat, lon, ...]`
fn center_from_value(value: &Value) -> Option<GeoPoint> {
    let (lat, lon) = match value {
        Value::Object(map) => (
            map.get("lat")?,
            map.get("lon").or_else(|| map.get("lng"))?,
        ),
        Value::Array(items) if items.len() >= 2 => (&items[0], &items[1]),
        _ => return None,
    };
    GeoPoint::checked(number_from(lat)?, number_from(lon)?)
}

/// Probes every center candidate in priority order and reports the first
/// well-formed, in-range one together with its source.
pub fn resolve_center<C>(
    record: &RawLocationRecord,
    catalog: &C,
    converter: &Converter,
) -> Option<(GeoPoint, CenterSource)>
where
    C: CenterCatalog + ?Sized,
{
    let explicit = [
        (record.center.as_ref(), CenterSource::Center),
        (record.mntn_ctr.as_ref(), CenterSource::MntnCtr),
        (record.coordinates.as_ref(), CenterSource::Coordinates),
    ];
    for (candidate, source) in explicit {
        if let Some(point) = candidate.and_then(center_from_value) {
            return Some((point, source));
        }
    }

    let top_level = record
        .lat
        .as_ref()
        .and_then(number_from)
        .zip(record.lon.as_ref().or(record.lng.as_ref()).and_then(number_from))
        .and_then(|(lat, lon)| GeoPoint::checked(lat, lon));
    if let Some(point) = top_level {
        return Some((point, CenterSource::LatLon));
    }

    if !record.code.is_empty() {
        if let Some(point) = catalog.center_for(&record.code).and_then(center_from_value) {
            return Some((point, CenterSource::Catalog));
        }
    }

    record
        .geometry
        .as_ref()
        .and_then(|geometry| normalize_value(geometry, converter))
        .and_then(|geometry| geometry.centroid())
        .map(|point| (point, CenterSource::Geometry))
}

/// Resolves a record's position, `None` when it cannot be placed on the map
pub fn resolve_position<C>(
    record: &RawLocationRecord,
    catalog: &C,
    converter: &Converter,
) -> Option<GeoPoint>
where
    C: CenterCatalog + ?Sized,
{
    resolve_center(record, catalog, converter).map(|(point, _)| point)
}

/// A record with a resolved position
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub record: Arc<RawLocationRecord>,
    pub position: GeoPoint,
    pub region: Region,
}

impl Entity {
    pub fn new(record: impl Into<Arc<RawLocationRecord>>, position: GeoPoint) -> Self {
        let record = record.into();
        let region = classify(record.location.as_deref());
        Self {
            record,
            position,
            region,
        }
    }

    pub fn code(&self) -> &str {
        &self.record.code
    }
}

/// Builds the entity set from a fetched record list.
///
/// Records without a resolvable position are excluded. When several records
/// share a non-empty code, the first one wins.
pub fn build_entities<C>(
    records: Vec<RawLocationRecord>,
    catalog: &C,
    converter: &Converter,
) -> Vec<Entity>
where
    C: CenterCatalog + ?Sized,
{
    let total = records.len();
    let mut seen: HashSet<String> = HashSet::default();
    let mut duplicates = 0usize;
    let mut unresolved = 0usize;
    let mut entities = Vec::with_capacity(total);

    for record in records {
        if !record.code.is_empty() && !seen.insert(record.code.clone()) {
            duplicates += 1;
            continue;
        }

        match resolve_center(&record, catalog, converter) {
            Some((position, source)) => {
                log::trace!("record {} positioned from {:?}", record.code, source);
                entities.push(Entity::new(record, position));
            }
            None => {
                log::debug!(
                    "record {} ({}) has no usable position",
                    record.code,
                    record.display_name()
                );
                unresolved += 1;
            }
        }
    }

    log::info!(
        "built {} entities from {} records ({} unresolved, {} duplicate codes)",
        entities.len(),
        total,
        unresolved,
        duplicates
    );
    entities
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::HashMap;
    use crate::traits::NoCatalog;
    use serde_json::json;

    fn record(value: Value) -> RawLocationRecord {
        serde_json::from_value(value).unwrap()
    }

    fn resolve(value: Value) -> Option<(GeoPoint, CenterSource)> {
        resolve_center(&record(value), &NoCatalog, &Converter::default())
    }

    #[test]
    fn test_center_object() {
        let (point, source) = resolve(json!({ "code": "1", "center": { "lat": 37.5, "lon": 127.1 } })).unwrap();
        assert_eq!(point, GeoPoint::new(37.5, 127.1));
        assert_eq!(source, CenterSource::Center);
    }

    #[test]
    fn test_center_array_and_numeric_strings() {
        let (point, _) = resolve(json!({ "code": 2, "center": ["35.1", "129.04"] })).unwrap();
        assert_eq!(point, GeoPoint::new(35.1, 129.04));
    }

    #[test]
    fn test_invalid_center_falls_through() {
        let (point, source) = resolve(json!({
            "code": "3",
            "center": { "lat": 137.0, "lon": 127.0 },
            "MNTN_CTR": [36.0, 128.0]
        }))
        .unwrap();
        assert_eq!(point, GeoPoint::new(36.0, 128.0));
        assert_eq!(source, CenterSource::MntnCtr);
    }

    #[test]
    fn test_coordinates_and_top_level_fields() {
        let (_, source) = resolve(json!({ "coordinates": { "lat": 36.5, "lng": 127.5 } })).unwrap();
        assert_eq!(source, CenterSource::Coordinates);

        let (point, source) = resolve(json!({ "lat": 36.5, "lng": 127.5 })).unwrap();
        assert_eq!(point, GeoPoint::new(36.5, 127.5));
        assert_eq!(source, CenterSource::LatLon);

        assert!(resolve(json!({ "lat": 36.5 })).is_none());
    }

    #[test]
    fn test_catalog_fallback() {
        let mut catalog: HashMap<String, Value> = HashMap::default();
        catalog.insert("431502001".into(), json!({ "lat": 35.134, "lon": 126.988 }));

        let rec = record(json!({ "code": "431502001", "name": "무등산", "center": null }));
        let (point, source) = resolve_center(&rec, &catalog, &Converter::default()).unwrap();
        assert_eq!(point, GeoPoint::new(35.134, 126.988));
        assert_eq!(source, CenterSource::Catalog);
    }

    #[test]
    fn test_geometry_fallback() {
        let (point, source) = resolve(json!({
            "code": "5",
            "geometry": { "paths": [[[200000.0, 600000.0], [200000.0, 600000.0]]] }
        }))
        .unwrap();
        assert_eq!(source, CenterSource::Geometry);
        assert!((point.lat - 38.0).abs() < 1e-6);
        assert!((point.lon - 127.0).abs() < 1e-6);
    }

    #[test]
    fn test_unresolvable_record() {
        assert!(resolve(json!({ "code": "6", "center": "somewhere" })).is_none());
        assert!(resolve(json!({ "code": "7", "geometry": { "x": 9.0e7, "y": 0 } })).is_none());
    }

    #[test]
    fn test_build_entities_drops_unresolved_and_duplicates() {
        let records = vec![
            RawLocationRecord::new("a", "북한산", "서울 강북구").with_center(json!([37.66, 126.98])),
            RawLocationRecord::new("a", "북한산 중복", "서울 강북구").with_center(json!([37.0, 127.0])),
            RawLocationRecord::new("b", "이름없음", "경기 가평군"),
            RawLocationRecord::new("c", "설악산", "").with_center(json!([38.12, 128.46])),
        ];
        let entities = build_entities(records, &NoCatalog, &Converter::default());

        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].record.display_name(), "북한산");
        assert_eq!(entities[0].region.as_str(), "서울");
        assert!(entities[1].region.is_other());
    }

    #[test]
    fn test_parse_records_envelopes() {
        let wrapped = r#"{ "mountains": [ { "code": 1, "name": "a" }, { "code": "2", "location": 5 } ] }"#;
        let records = parse_records(wrapped).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].code, "1");

        let bare = r#"[ { "code": "x", "center": [37, 127] } ]"#;
        assert_eq!(parse_records(bare).unwrap().len(), 1);

        assert!(matches!(parse_records(r#"{ "items": [] }"#), Err(MapError::Source(_))));
        assert!(matches!(parse_records("not json"), Err(MapError::Serialization(_))));
    }

    #[test]
    fn test_display_name_fallback() {
        let rec = record(json!({ "code": "99", "name": "  " }));
        assert_eq!(rec.display_name(), "산 (코드: 99)");
    }
}
