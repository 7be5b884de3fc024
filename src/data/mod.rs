pub mod conversion;
pub mod geometry;
pub mod records;
pub mod region;
#[cfg(feature = "tokio-runtime")]
pub mod source;

pub use conversion::{convert, default_converter, ConversionError, Converter, Ellipsoid, TransverseMercator};
pub use geometry::{normalize, normalize_value, NormalizedGeometry, RawGeometry};
pub use records::{build_entities, parse_records, resolve_position, CenterSource, Entity, RawLocationRecord};
pub use region::{classify, Region};

use serde_json::Value;

/// Reads a number from a JSON number or a numeric string
pub(crate) fn number_from(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}
