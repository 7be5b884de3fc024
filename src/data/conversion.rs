//! Projected survey coordinates to geodetic latitude/longitude.
//!
//! The source system is a transverse Mercator belt on the GRS80 ellipsoid.
//! Both directions use the Krüger n-series (fourth order), which stays well
//! below a millimetre across the belt.

use crate::core::constants::*;
use crate::core::geo::{GeoBounds, GeoPoint, ProjectedPoint};
use once_cell::sync::Lazy;

static DEFAULT_CONVERTER: Lazy<Converter> = Lazy::new(Converter::default);

/// Converts a projected coordinate with the default central-belt converter
pub fn convert(x: f64, y: f64) -> Result<GeoPoint, ConversionError> {
    DEFAULT_CONVERTER.convert(x, y)
}

/// Shared central-belt converter
pub fn default_converter() -> &'static Converter {
    &DEFAULT_CONVERTER
}

/// Errors that can occur during coordinate conversion
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum ConversionError {
    #[error("Invalid projected input: ({x}, {y})")]
    InvalidInput { x: f64, y: f64 },
    #[error("Converted point ({lat}, {lon}) lies outside the operating region")]
    OutOfRegion { lat: f64, lon: f64 },
}

/// Reference ellipsoid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipsoid {
    pub semi_major: f64,
    pub inverse_flattening: f64,
}

impl Ellipsoid {
    pub const GRS80: Ellipsoid = Ellipsoid {
        semi_major: GRS80_SEMI_MAJOR,
        inverse_flattening: GRS80_INV_FLATTENING,
    };

    pub fn flattening(&self) -> f64 {
        1.0 / self.inverse_flattening
    }

    /// First eccentricity
    pub fn eccentricity(&self) -> f64 {
        let f = self.flattening();
        (f * (2.0 - f)).sqrt()
    }
}

/// Transverse Mercator projection parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransverseMercator {
    /// Latitude of origin in degrees
    pub origin_lat: f64,
    /// Central meridian in degrees
    pub origin_lon: f64,
    pub scale_factor: f64,
    pub false_easting: f64,
    pub false_northing: f64,
    pub ellipsoid: Ellipsoid,
}

impl TransverseMercator {
    /// Central belt: origin 38°N 127°E, 200 km false easting, 600 km false northing
    pub const CENTRAL_BELT: TransverseMercator = TransverseMercator {
        origin_lat: ORIGIN_LAT,
        origin_lon: ORIGIN_LON,
        scale_factor: SCALE_FACTOR,
        false_easting: FALSE_EASTING,
        false_northing: FALSE_NORTHING,
        ellipsoid: Ellipsoid::GRS80,
    };
}

impl Default for TransverseMercator {
    fn default() -> Self {
        Self::CENTRAL_BELT
    }
}

/// Krüger series coefficients derived from the ellipsoid
#[derive(Debug, Clone, Copy)]
struct KrugerSeries {
    eccentricity: f64,
    /// Rectifying radius
    radius: f64,
    alpha: [f64; 4],
    beta: [f64; 4],
    delta: [f64; 4],
}

impl KrugerSeries {
    fn new(ellipsoid: &Ellipsoid) -> Self {
        let f = ellipsoid.flattening();
        let n = f / (2.0 - f);
        let n2 = n * n;
        let n3 = n2 * n;
        let n4 = n3 * n;

        Self {
            eccentricity: ellipsoid.eccentricity(),
            radius: ellipsoid.semi_major / (1.0 + n) * (1.0 + n2 / 4.0 + n4 / 64.0),
            alpha: [
                n / 2.0 - 2.0 * n2 / 3.0 + 5.0 * n3 / 16.0 + 41.0 * n4 / 180.0,
                13.0 * n2 / 48.0 - 3.0 * n3 / 5.0 + 557.0 * n4 / 1440.0,
                61.0 * n3 / 240.0 - 103.0 * n4 / 140.0,
                49561.0 * n4 / 161_280.0,
            ],
            beta: [
                n / 2.0 - 2.0 * n2 / 3.0 + 37.0 * n3 / 96.0 - n4 / 360.0,
                n2 / 48.0 + n3 / 15.0 - 437.0 * n4 / 1440.0,
                17.0 * n3 / 480.0 - 37.0 * n4 / 840.0,
                4397.0 * n4 / 161_280.0,
            ],
            delta: [
                2.0 * n - 2.0 * n2 / 3.0 - 2.0 * n3 + 116.0 * n4 / 45.0,
                7.0 * n2 / 3.0 - 8.0 * n3 / 5.0 - 227.0 * n4 / 45.0,
                56.0 * n3 / 15.0 - 136.0 * n4 / 35.0,
                4279.0 * n4 / 630.0,
            ],
        }
    }

    /// Conformal latitude parameter `tan(chi)` for a geodetic latitude
    fn conformal_tan(&self, lat_rad: f64) -> f64 {
        let e = self.eccentricity;
        let sin_lat = lat_rad.sin();
        (sin_lat.atanh() - e * (e * sin_lat).atanh()).sinh()
    }

    /// Normalized (xi, eta) for a latitude and a longitude offset from the central meridian
    fn forward(&self, lat_rad: f64, dlon_rad: f64) -> (f64, f64) {
        let t = self.conformal_tan(lat_rad);
        let xi_p = t.atan2(dlon_rad.cos());
        let eta_p = (dlon_rad.sin() / (1.0 + t * t).sqrt()).atanh();

        let mut xi = xi_p;
        let mut eta = eta_p;
        for (j, a) in self.alpha.iter().enumerate() {
            let k = 2.0 * (j as f64 + 1.0);
            xi += a * (k * xi_p).sin() * (k * eta_p).cosh();
            eta += a * (k * xi_p).cos() * (k * eta_p).sinh();
        }
        (xi, eta)
    }

    /// Latitude and longitude offset (radians) for normalized (xi, eta)
    fn inverse(&self, xi: f64, eta: f64) -> (f64, f64) {
        let mut xi_p = xi;
        let mut eta_p = eta;
        for (j, b) in self.beta.iter().enumerate() {
            let k = 2.0 * (j as f64 + 1.0);
            xi_p -= b * (k * xi).sin() * (k * eta).cosh();
            eta_p -= b * (k * xi).cos() * (k * eta).sinh();
        }

        let chi = (xi_p.sin() / eta_p.cosh()).asin();
        let mut lat = chi;
        for (j, d) in self.delta.iter().enumerate() {
            let k = 2.0 * (j as f64 + 1.0);
            lat += d * (k * chi).sin();
        }

        let dlon = eta_p.sinh().atan2(xi_p.cos());
        (lat, dlon)
    }
}

/// Projected-to-geodetic converter with input and output sanity bounds.
///
/// Stateless after construction; safe to share across threads.
#[derive(Debug, Clone)]
pub struct Converter {
    projection: TransverseMercator,
    series: KrugerSeries,
    /// Meridian arc from the equator to the origin latitude, scaled by k0
    origin_northing: f64,
    window: GeoBounds,
    max_magnitude: f64,
}

impl Converter {
    pub fn new(projection: TransverseMercator) -> Self {
        let series = KrugerSeries::new(&projection.ellipsoid);
        let (xi0, _) = series.forward(projection.origin_lat.to_radians(), 0.0);
        let origin_northing = projection.scale_factor * series.radius * xi0;

        Self {
            projection,
            series,
            origin_northing,
            window: GeoBounds::operating_window(),
            max_magnitude: MAX_PROJECTED_MAGNITUDE,
        }
    }

    /// Replaces the output validity window
    pub fn with_window(mut self, window: GeoBounds) -> Self {
        self.window = window;
        self
    }

    pub fn projection(&self) -> &TransverseMercator {
        &self.projection
    }

    /// Converts a projected coordinate to a geodetic point.
    ///
    /// Negative eastings are offsets from the false-easting baseline.
    pub fn convert(&self, x: f64, y: f64) -> Result<GeoPoint, ConversionError> {
        if !x.is_finite()
            || !y.is_finite()
            || x.abs() > self.max_magnitude
            || y.abs() > self.max_magnitude
        {
            return Err(ConversionError::InvalidInput { x, y });
        }

        let easting = if x < 0.0 {
            self.projection.false_easting + x
        } else {
            x
        };

        let point = self.unproject(ProjectedPoint::new(easting, y));
        if !point.is_valid() || !self.window.contains(&point) {
            return Err(ConversionError::OutOfRegion {
                lat: point.lat,
                lon: point.lon,
            });
        }
        Ok(point)
    }

    /// Inverse projection without any validation
    pub fn unproject(&self, point: ProjectedPoint) -> GeoPoint {
        let p = &self.projection;
        let scale = p.scale_factor * self.series.radius;
        let xi = (point.y - p.false_northing + self.origin_northing) / scale;
        let eta = (point.x - p.false_easting) / scale;

        let (lat, dlon) = self.series.inverse(xi, eta);
        GeoPoint::new(lat.to_degrees(), p.origin_lon + dlon.to_degrees())
    }

    /// Forward projection of a geodetic point
    pub fn project(&self, point: GeoPoint) -> ProjectedPoint {
        let p = &self.projection;
        let scale = p.scale_factor * self.series.radius;
        let (xi, eta) = self
            .series
            .forward(point.lat.to_radians(), (point.lon - p.origin_lon).to_radians());

        ProjectedPoint::new(
            p.false_easting + scale * eta,
            p.false_northing + scale * xi - self.origin_northing,
        )
    }
}

impl Default for Converter {
    fn default() -> Self {
        Self::new(TransverseMercator::CENTRAL_BELT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_maps_to_false_origin() {
        let point = convert(200_000.0, 600_000.0).unwrap();
        assert!((point.lat - 38.0).abs() < 1e-9);
        assert!((point.lon - 127.0).abs() < 1e-9);
    }

    #[test]
    fn test_round_trip_within_tolerance() {
        let converter = Converter::default();
        let samples = [
            (200_000.0, 600_000.0),
            (150_000.0, 450_000.0),
            (260_000.0, 520_000.0),
            (120_000.0, 300_000.0),
            (310_000.0, 700_000.0),
            (185_432.7, 551_901.3),
        ];

        for (x, y) in samples {
            let geo = converter.convert(x, y).unwrap();
            let back = converter.project(geo);
            let error = back.distance_to(&ProjectedPoint::new(x, y));
            assert!(error < 0.01, "({x}, {y}) round-tripped with {error} m error");
        }
    }

    #[test]
    fn test_known_location_projects_near_expected() {
        let converter = Converter::default();
        // Seoul city hall
        let projected = converter.project(GeoPoint::new(37.5665, 126.9780));
        assert!((197_500.0..198_600.0).contains(&projected.x), "x = {}", projected.x);
        assert!((551_400.0..552_400.0).contains(&projected.y), "y = {}", projected.y);
    }

    #[test]
    fn test_negative_easting_is_offset_from_baseline() {
        let offset = convert(-50_000.0, 600_000.0).unwrap();
        let direct = convert(150_000.0, 600_000.0).unwrap();
        assert_eq!(offset, direct);
        assert!(offset.in_operating_region());
        assert!(offset.lon < 127.0);
    }

    #[test]
    fn test_rejects_corrupt_input() {
        assert!(matches!(
            convert(2_000_000.0, 600_000.0),
            Err(ConversionError::InvalidInput { .. })
        ));
        assert!(matches!(
            convert(f64::NAN, 600_000.0),
            Err(ConversionError::InvalidInput { .. })
        ));
        assert!(matches!(
            convert(200_000.0, f64::INFINITY),
            Err(ConversionError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_rejects_out_of_region_output() {
        // ~600 km south of the origin
        assert!(matches!(
            convert(200_000.0, 0.0),
            Err(ConversionError::OutOfRegion { .. })
        ));
        // ~700 km east of the central meridian
        assert!(matches!(
            convert(900_000.0, 600_000.0),
            Err(ConversionError::OutOfRegion { .. })
        ));
    }

    #[test]
    fn test_custom_window() {
        let narrow = Converter::default()
            .with_window(GeoBounds::from_coords(37.9, 126.9, 38.1, 127.1));
        assert!(narrow.convert(200_000.0, 600_000.0).is_ok());
        assert!(matches!(
            narrow.convert(150_000.0, 600_000.0),
            Err(ConversionError::OutOfRegion { .. })
        ));
    }
}
