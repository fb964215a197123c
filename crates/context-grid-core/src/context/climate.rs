//! Latitude-band climate baselines.
//!
//! Temperature follows a smooth equator-to-pole decline; precipitation uses
//! Earth-like zonal bands:
//!   - ITCZ equatorial peak  (0–10°)
//!   - Subtropical arid belt (≈25–35°)
//!   - Temperate westerlies  (≈45–55°)
//!   - Polar minimum         (>65°)
use serde::{Deserialize, Serialize};

use super::land_use::LandUse;

/// Temperature index 0 ↔ −10 °C, 100 ↔ +40 °C.
const TEMP_INDEX_MIN_C: f64 = -10.0;
const TEMP_INDEX_SPAN_C: f64 = 50.0;
/// Precipitation index 100 ↔ 3000 mm/yr.
const PRECIP_INDEX_MAX_MM: f64 = 3000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LatitudeBand {
    Tropical,
    Subtropical,
    Temperate,
    Polar,
}

impl LatitudeBand {
    pub fn of(lat_deg: f64) -> Self {
        let a = lat_deg.abs();
        if a < 23.5 {
            LatitudeBand::Tropical
        } else if a < 35.0 {
            LatitudeBand::Subtropical
        } else if a < 66.5 {
            LatitudeBand::Temperate
        } else {
            LatitudeBand::Polar
        }
    }
}

/// Mean annual surface temperature in °C for `lat_deg`.
pub fn baseline_temperature_c(lat_deg: f64) -> f64 {
    let a = lat_deg.abs();
    27.5 - 0.25 * a - 0.004 * a * a
}

/// Urban heat-island offset in °C.
pub fn heat_island_c(lu: LandUse) -> f64 {
    match lu {
        LandUse::Urban => 2.5,
        LandUse::Suburban => 1.0,
        LandUse::Rural => 0.0,
        LandUse::Waterbody => -0.5,
    }
}

/// Latitudinal mean annual precipitation in mm/yr.
pub fn zonal_precipitation_mm(lat_deg: f64) -> f64 {
    let lat_abs = lat_deg.abs();

    // ITCZ: Gaussian peak centred on equator, σ ≈ 12°.
    let equatorial = 2200.0 * (-lat_abs * lat_abs / 288.0_f64).exp();

    // Subtropical arid belt: negative Gaussian centred at 28°, σ ≈ 8°.
    let subtropical_arid = -800.0 * (-(lat_abs - 28.0).powi(2) / 128.0_f64).exp();

    // Temperate westerlies: secondary peak centred at 50°, σ ≈ 15°.
    let temperate = 600.0 * (-(lat_abs - 50.0).powi(2) / 450.0_f64).exp();

    let polar_base = 200.0_f64;

    (equatorial + subtropical_arid + temperate + polar_base).max(80.0)
}

pub fn temperature_index(temp_c: f64) -> f64 {
    ((temp_c - TEMP_INDEX_MIN_C) / TEMP_INDEX_SPAN_C * 100.0).clamp(0.0, 100.0)
}

/// Index points per °C of warming.
pub fn temperature_index_per_c() -> f64 {
    100.0 / TEMP_INDEX_SPAN_C
}

pub fn precipitation_index(mm: f64) -> f64 {
    (mm / PRECIP_INDEX_MAX_MM * 100.0).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equator_is_warmer_than_poles() {
        assert!(baseline_temperature_c(0.0) > baseline_temperature_c(45.0));
        assert!(baseline_temperature_c(45.0) > baseline_temperature_c(75.0));
    }

    #[test]
    fn urban_cells_run_hotter() {
        let base = baseline_temperature_c(40.0);
        let urban = temperature_index(base + heat_island_c(LandUse::Urban));
        let rural = temperature_index(base + heat_island_c(LandUse::Rural));
        assert!(urban > rural);
    }

    #[test]
    fn subtropical_drier_than_equatorial() {
        assert!(zonal_precipitation_mm(28.0) < zonal_precipitation_mm(5.0));
    }

    #[test]
    fn symmetric_about_equator() {
        for lat in [10.0_f64, 30.0, 50.0, 70.0] {
            assert!((zonal_precipitation_mm(lat) - zonal_precipitation_mm(-lat)).abs() < 1e-9);
            assert!((baseline_temperature_c(lat) - baseline_temperature_c(-lat)).abs() < 1e-9);
        }
    }

    #[test]
    fn indices_are_clamped() {
        assert_eq!(temperature_index(-40.0), 0.0);
        assert_eq!(temperature_index(60.0), 100.0);
        assert_eq!(precipitation_index(9000.0), 100.0);
    }

    #[test]
    fn latitude_bands() {
        assert_eq!(LatitudeBand::of(-5.0), LatitudeBand::Tropical);
        assert_eq!(LatitudeBand::of(30.0), LatitudeBand::Subtropical);
        assert_eq!(LatitudeBand::of(-51.5), LatitudeBand::Temperate);
        assert_eq!(LatitudeBand::of(70.0), LatitudeBand::Polar);
    }
}
