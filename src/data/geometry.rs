//! Normalizes heterogeneous raw geometry records into a canonical shape.
//!
//! Raw records carry projected coordinates in one of three layouts: a single
//! `{ "x", "y" }` point, a bare polyline (`[[x, y, z?], ...]`), or a
//! `{ "paths": [[[x, y], ...], ...] }` collection of polylines. Every vertex
//! goes through the [`Converter`]; vertices that fail are dropped from their
//! path and paths left empty are dropped from the geometry.

use crate::core::geo::GeoPoint;
use crate::data::conversion::Converter;
use crate::data::number_from;
use geo::Centroid;
use serde::Serialize;
use serde_json::Value;

/// Raw geometry in projected coordinates
#[derive(Debug, Clone, PartialEq)]
pub enum RawGeometry {
    Point { x: f64, y: f64 },
    Polyline(Vec<[f64; 2]>),
    MultiPolyline(Vec<Vec<[f64; 2]>>),
}

impl RawGeometry {
    /// Reads a raw geometry from JSON. Unrecognized shapes yield `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Object(map) => {
                if let Some(paths) = map.get("paths").and_then(Value::as_array) {
                    return Some(RawGeometry::MultiPolyline(
                        paths.iter().filter_map(read_path).collect(),
                    ));
                }
                let x = map.get("x").and_then(number_from)?;
                let y = map.get("y").and_then(number_from)?;
                Some(RawGeometry::Point { x, y })
            }
            Value::Array(items) => match items.first() {
                // [[[x, y], ...], ...]
                Some(Value::Array(inner)) if matches!(inner.first(), Some(Value::Array(_))) => {
                    Some(RawGeometry::MultiPolyline(
                        items.iter().filter_map(read_path).collect(),
                    ))
                }
                Some(Value::Array(_)) => read_path(value).map(RawGeometry::Polyline),
                _ => None,
            },
            _ => None,
        }
    }
}

/// Reads one path; vertices with fewer than two components are skipped,
/// non-numeric components become NaN and are rejected by the converter.
fn read_path(value: &Value) -> Option<Vec<[f64; 2]>> {
    let vertices = value.as_array()?;
    Some(
        vertices
            .iter()
            .filter_map(Value::as_array)
            .filter(|vertex| vertex.len() >= 2)
            .map(|vertex| {
                [
                    number_from(&vertex[0]).unwrap_or(f64::NAN),
                    number_from(&vertex[1]).unwrap_or(f64::NAN),
                ]
            })
            .collect(),
    )
}

/// Canonical geodetic geometry
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum NormalizedGeometry {
    Point(GeoPoint),
    LineString(Vec<GeoPoint>),
    MultiLineString(Vec<Vec<GeoPoint>>),
}

impl NormalizedGeometry {
    /// Converts into `geo_types` (x = longitude, y = latitude)
    pub fn to_geo_types(&self) -> geo_types::Geometry<f64> {
        fn line(points: &[GeoPoint]) -> geo_types::LineString<f64> {
            points
                .iter()
                .map(|p| geo_types::Coord::from(*p))
                .collect::<Vec<_>>()
                .into()
        }

        match self {
            NormalizedGeometry::Point(p) => geo_types::Geometry::Point((*p).into()),
            NormalizedGeometry::LineString(points) => {
                geo_types::Geometry::LineString(line(points))
            }
            NormalizedGeometry::MultiLineString(paths) => geo_types::Geometry::MultiLineString(
                geo_types::MultiLineString::new(paths.iter().map(|p| line(p)).collect()),
            ),
        }
    }

    /// Length-weighted centroid; for degenerate lines the mean of the vertices
    pub fn centroid(&self) -> Option<GeoPoint> {
        self.to_geo_types()
            .centroid()
            .map(GeoPoint::from)
            .filter(GeoPoint::is_valid)
            .or_else(|| GeoPoint::mean(self.points()))
    }

    /// Every vertex in path order
    pub fn points(&self) -> Box<dyn Iterator<Item = &GeoPoint> + '_> {
        match self {
            NormalizedGeometry::Point(p) => Box::new(std::iter::once(p)),
            NormalizedGeometry::LineString(points) => Box::new(points.iter()),
            NormalizedGeometry::MultiLineString(paths) => Box::new(paths.iter().flatten()),
        }
    }
}

/// Normalizes a raw geometry. Never panics; returns `None` when nothing
/// survives conversion.
pub fn normalize(raw: &RawGeometry, converter: &Converter) -> Option<NormalizedGeometry> {
    match raw {
        RawGeometry::Point { x, y } => match converter.convert(*x, *y) {
            Ok(point) => Some(NormalizedGeometry::Point(point)),
            Err(e) => {
                log::debug!("dropping point geometry: {}", e);
                None
            }
        },
        RawGeometry::Polyline(path) => {
            convert_path(path, converter).map(NormalizedGeometry::LineString)
        }
        RawGeometry::MultiPolyline(paths) => {
            let mut converted: Vec<Vec<GeoPoint>> = paths
                .iter()
                .filter_map(|path| convert_path(path, converter))
                .collect();

            match converted.len() {
                0 => None,
                1 => converted.pop().map(NormalizedGeometry::LineString),
                _ => Some(NormalizedGeometry::MultiLineString(converted)),
            }
        }
    }
}

/// Reads and normalizes a JSON geometry in one step
pub fn normalize_value(value: &Value, converter: &Converter) -> Option<NormalizedGeometry> {
    RawGeometry::from_value(value).and_then(|raw| normalize(&raw, converter))
}

fn convert_path(path: &[[f64; 2]], converter: &Converter) -> Option<Vec<GeoPoint>> {
    let converted: Vec<GeoPoint> = path
        .iter()
        .filter_map(|[x, y]| converter.convert(*x, *y).ok())
        .collect();

    let dropped = path.len() - converted.len();
    if dropped > 0 {
        log::debug!("dropped {} of {} path vertices", dropped, path.len());
    }

    (!converted.is_empty()).then_some(converted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn converter() -> Converter {
        Converter::default()
    }

    #[test]
    fn test_point_geometry() {
        let geometry = normalize_value(&json!({ "x": 200000.0, "y": 600000.0 }), &converter());
        match geometry {
            Some(NormalizedGeometry::Point(p)) => {
                assert!((p.lat - 38.0).abs() < 1e-9);
                assert!((p.lon - 127.0).abs() < 1e-9);
            }
            other => panic!("expected point, got {:?}", other),
        }
    }

    #[test]
    fn test_failed_point_is_none() {
        assert!(normalize_value(&json!({ "x": 5.0e7, "y": 600000.0 }), &converter()).is_none());
    }

    #[test]
    fn test_single_path_becomes_line_string() {
        let raw = json!({ "paths": [[[200000.0, 600000.0, 120.5], [200100.0, 600100.0, 130.0]]] });
        match normalize_value(&raw, &converter()) {
            Some(NormalizedGeometry::LineString(points)) => assert_eq!(points.len(), 2),
            other => panic!("expected line string, got {:?}", other),
        }
    }

    #[test]
    fn test_bare_polyline() {
        let raw = json!([[200000.0, 600000.0], [200050.0, "600050"]]);
        match normalize_value(&raw, &converter()) {
            Some(NormalizedGeometry::LineString(points)) => assert_eq!(points.len(), 2),
            other => panic!("expected line string, got {:?}", other),
        }
    }

    #[test]
    fn test_failed_vertices_are_dropped_not_the_path() {
        let raw = json!({ "paths": [[
            [200000.0, 600000.0],
            ["bad", 600000.0],
            [9.0e6, 600000.0],
            [200100.0, 600100.0],
            [1.0]
        ]] });
        match normalize_value(&raw, &converter()) {
            Some(NormalizedGeometry::LineString(points)) => assert_eq!(points.len(), 2),
            other => panic!("expected line string, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_paths_are_dropped() {
        let raw = json!({ "paths": [
            [[9.0e6, 0.0]],
            [[200000.0, 600000.0], [200100.0, 600000.0]],
            [[210000.0, 610000.0]]
        ] });
        match normalize_value(&raw, &converter()) {
            Some(NormalizedGeometry::MultiLineString(paths)) => {
                assert_eq!(paths.len(), 2);
                assert_eq!(paths[0].len(), 2);
            }
            other => panic!("expected multi line string, got {:?}", other),
        }

        let all_bad = json!({ "paths": [[[9.0e6, 0.0]], []] });
        assert!(normalize_value(&all_bad, &converter()).is_none());
    }

    #[test]
    fn test_unrecognized_shapes() {
        assert!(normalize_value(&json!("LINESTRING(1 2)"), &converter()).is_none());
        assert!(normalize_value(&json!({ "rings": [] }), &converter()).is_none());
        assert!(normalize_value(&json!(null), &converter()).is_none());
    }

    #[test]
    fn test_line_centroid() {
        let geometry = NormalizedGeometry::LineString(vec![
            GeoPoint::new(37.0, 127.0),
            GeoPoint::new(37.0, 128.0),
        ]);
        let centroid = geometry.centroid().unwrap();
        assert!((centroid.lat - 37.0).abs() < 1e-9);
        assert!((centroid.lon - 127.5).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_line_centroid() {
        let p = GeoPoint::new(37.2, 127.3);
        let geometry = NormalizedGeometry::LineString(vec![p, p]);
        let centroid = geometry.centroid().unwrap();
        assert!((centroid.lat - p.lat).abs() < 1e-9);
        assert!((centroid.lon - p.lon).abs() < 1e-9);
    }
}
