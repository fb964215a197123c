//! Geographic point types and the planar metre ↔ degree conversion.
//! All coordinate math uses f64 for precision.
use serde::{Deserialize, Serialize};

use crate::error::GridError;

/// Mean Earth radius in metres used by the equirectangular approximation.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Latitudes beyond this are rejected; the cos(lat) correction blows up
/// toward the poles.
pub const MAX_ABS_LATITUDE: f64 = 85.0;

/// A point on the Earth's surface in geographic coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees, -90 to +90.
    pub lat: f64,
    /// Longitude in degrees, -180 to +180.
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Reject inputs outside the supported domain: non-finite values and
    /// latitudes too close to the poles.
    pub fn validate(self) -> Result<Self, GridError> {
        if !self.lat.is_finite() || !self.lon.is_finite() {
            return Err(GridError::NonFiniteCoordinate { lat: self.lat, lon: self.lon });
        }
        if self.lat.abs() > MAX_ABS_LATITUDE {
            return Err(GridError::PolarLatitude { lat: self.lat });
        }
        Ok(self)
    }

    /// Offset this point by `(east_m, north_m)` metres.
    ///
    /// Equirectangular: latitude delta = north / R, longitude delta =
    /// east / (R·cos(lat)). The reference latitude is `self.lat`, so the error
    /// grows with the offset distance and toward the poles.
    pub fn offset_m(self, east_m: f64, north_m: f64) -> Self {
        let dlat = (north_m / EARTH_RADIUS_M).to_degrees();
        let dlon = (east_m / (EARTH_RADIUS_M * self.lat.to_radians().cos())).to_degrees();
        Self { lat: self.lat + dlat, lon: self.lon + dlon }
    }

    /// Planar `(east_m, north_m)` displacement from `origin` to `self`,
    /// the inverse of [`GeoPoint::offset_m`].
    pub fn planar_offset_from(self, origin: GeoPoint) -> (f64, f64) {
        let north = (self.lat - origin.lat).to_radians() * EARTH_RADIUS_M;
        let east = (self.lon - origin.lon).to_radians() * EARTH_RADIUS_M * origin.lat.to_radians().cos();
        (east, north)
    }

    /// Planar distance in metres between `self` and `origin`.
    pub fn planar_distance_m(self, origin: GeoPoint) -> f64 {
        let (e, n) = self.planar_offset_from(origin);
        e.hypot(n)
    }
}

/// One vertex of a rendered polygon ring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundaryPoint {
    pub lat: f64,
    pub lon: f64,
    /// Extrusion altitude in metres.
    pub altitude: f64,
}

impl BoundaryPoint {
    pub fn new(lat: f64, lon: f64, altitude: f64) -> Self {
        Self { lat, lon, altitude }
    }

    pub fn at_ground(p: GeoPoint) -> Self {
        Self { lat: p.lat, lon: p.lon, altitude: 0.0 }
    }

    pub fn with_altitude(self, altitude: f64) -> Self {
        Self { altitude, ..self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_roundtrip_within_tolerance() {
        let mut rng_state: u64 = 42;
        for _ in 0..1000 {
            // LCG for deterministic pseudo-random
            rng_state = rng_state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let lat = (rng_state as f64 / u64::MAX as f64) * 160.0 - 80.0;
            rng_state = rng_state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let east = (rng_state as f64 / u64::MAX as f64) * 20_000.0 - 10_000.0;

            let origin = GeoPoint::new(lat, 12.0);
            let moved = origin.offset_m(east, -east * 0.5);
            let (e, n) = moved.planar_offset_from(origin);
            assert!((e - east).abs() < 1e-6, "east {e} vs {east}");
            assert!((n + east * 0.5).abs() < 1e-6, "north {n}");
        }
    }

    #[test]
    fn one_degree_of_latitude_is_about_111km() {
        let a = GeoPoint::new(0.0, 0.0);
        let b = a.offset_m(0.0, 111_195.0);
        assert!((b.lat - 1.0).abs() < 1e-3);
    }

    #[test]
    fn validate_rejects_non_finite_and_polar() {
        assert!(GeoPoint::new(f64::NAN, 0.0).validate().is_err());
        assert!(GeoPoint::new(0.0, f64::INFINITY).validate().is_err());
        assert!(matches!(
            GeoPoint::new(89.0, 0.0).validate(),
            Err(GridError::PolarLatitude { .. })
        ));
        assert!(GeoPoint::new(-33.9, 18.4).validate().is_ok());
    }
}
