//! Per-cell context tensor synthesis.
//!
//! A deterministic stand-in for elevation, land-cover and population lookups.
//! Everything here is a pure function of `(point, grid_center, scale)`;
//! swapping the body of [`ContextSynthesizer::synthesize`] for real geodata
//! leaves the rest of the pipeline untouched.
//!
//! Pipeline:
//!   distance from center → macro/micro trig noise → water test →
//!   urbanization → land use → per-class attributes → climate baseline.

pub mod climate;
pub mod land_use;
pub mod noise;
pub mod scenario;

use serde::{Deserialize, Serialize};

use crate::coords::GeoPoint;
use crate::grid::Scale;

use climate::LatitudeBand;
use land_use::{class_ranges, classify, in_range, water_feature, LandUse, WaterFeature, OCEAN_THRESHOLD, RIVER_BAND};
use self::noise::{TrigFbm, UnitPerlin};

/// Metres per degree of latitude on the reference sphere.
const METERS_PER_DEGREE: f64 = 111_195.0;
/// Macro features span roughly this many hex cells.
const MACRO_WAVELENGTH_CELLS: f64 = 8.0;
const MICRO_WAVELENGTH_CELLS: f64 = 3.0;
/// Macro-noise distance above the ocean threshold still counted as coast.
const COASTAL_BAND: f64 = 0.15;
/// Micro-noise distance beyond the river band still counted as riparian.
const RIPARIAN_BAND: f64 = 0.08;

const JITTER_SEED: u32 = 0x0C17;
const DETAIL_SEED: u32 = 0x5EED;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Climate {
    pub temperature: f64,
    pub precipitation: f64,
    pub extreme_events: f64,
    pub band: LatitudeBand,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Geography {
    /// Metres above sea level; the one un-normalised field.
    pub elevation_m: f64,
    pub land_use: LandUse,
    /// Proximity to open water, 100 = ocean cell.
    pub coastal: f64,
    /// Proximity to a river channel, 100 = river cell.
    pub water_body: f64,
    pub water_feature: Option<WaterFeature>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Socio {
    pub pop_density: f64,
    pub gdp_index: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Infrastructure {
    pub road_density: f64,
    pub water_access: f64,
}

impl Infrastructure {
    /// Single infrastructure index: mean of road density and water access.
    pub fn index(&self) -> f64 {
        (self.road_density + self.water_access) / 2.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vulnerability {
    pub social_index: f64,
    pub governance: f64,
}

/// Five dimension groups, each field on [0, 100] except `elevation_m`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextTensor {
    pub climate: Climate,
    pub geography: Geography,
    pub socio: Socio,
    pub infrastructure: Infrastructure,
    pub vulnerability: Vulnerability,
    /// Data confidence loss on [0, 1]; grows with distance from the grid
    /// center. Drives color opacity.
    pub uncertainty: f64,
}

impl ContextTensor {
    pub fn land_use(&self) -> LandUse {
        self.geography.land_use
    }
}

/// Holds the noise sources; build once per grid and reuse for every cell.
pub struct ContextSynthesizer {
    macro_field: TrigFbm,
    micro_field: TrigFbm,
    jitter: UnitPerlin,
    detail: UnitPerlin,
}

impl ContextSynthesizer {
    pub fn new() -> Self {
        Self {
            macro_field: TrigFbm::macro_field(),
            micro_field: TrigFbm::micro_field(),
            jitter: UnitPerlin::new(JITTER_SEED),
            detail: UnitPerlin::new(DETAIL_SEED),
        }
    }

    /// Synthesize the tensor for the cell centred at `point`.
    pub fn synthesize(&self, point: GeoPoint, grid_center: GeoPoint, scale: Scale) -> ContextTensor {
        let params = scale.params();

        // ── Scale-normalised distance ───────────────────────────────────────
        let norm_dist = point.planar_distance_m(grid_center) / params.half_extent_m();

        // ── Noise fields (absolute coordinates, so neighbouring grids agree) ─
        let cells_per_degree = METERS_PER_DEGREE / params.radius_m;
        let u = point.lon * point.lat.to_radians().cos() * cells_per_degree;
        let v = point.lat * cells_per_degree;
        let macro_n = self.macro_field.sample(u / MACRO_WAVELENGTH_CELLS, v / MACRO_WAVELENGTH_CELLS);
        let micro_n = self.micro_field.sample(u / MICRO_WAVELENGTH_CELLS, v / MICRO_WAVELENGTH_CELLS);
        let jitter = self.jitter.sample(u * 0.21, v * 0.21);
        let detail = |k: f64| self.detail.sample(u * 0.37 + k * 17.0, v * 0.37 - k * 11.0);

        // ── Land use ────────────────────────────────────────────────────────
        let water = water_feature(macro_n, micro_n);
        let urbanization = 0.75 * (1.0 - norm_dist).clamp(0.0, 1.0) + 0.25 * jitter;
        let land_use = classify(water, urbanization);

        // ── Geography ───────────────────────────────────────────────────────
        let coastal = match water {
            Some(WaterFeature::Ocean) => 100.0,
            _ => 100.0 * (1.0 - (macro_n - OCEAN_THRESHOLD) / COASTAL_BAND).clamp(0.0, 1.0),
        };
        let water_body = match water {
            Some(WaterFeature::River) => 100.0,
            _ => 100.0 * (1.0 - ((micro_n - 0.5).abs() - RIVER_BAND) / RIPARIAN_BAND).clamp(0.0, 1.0),
        };
        let elevation_m = match water {
            Some(_) => 0.0,
            None => 5.0 + (macro_n - OCEAN_THRESHOLD) / (1.0 - OCEAN_THRESHOLD) * 600.0 + micro_n * 30.0,
        };

        // ── Socio-economic + infrastructure ─────────────────────────────────
        let ranges = class_ranges(land_use);
        let pop_density = in_range(ranges.pop_density, detail(1.0));
        let gdp_index = in_range(ranges.gdp_index, detail(2.0));
        let road_density = in_range(ranges.road_density, detail(3.0));
        let water_access = in_range(ranges.water_access, detail(4.0));
        let social_index = (100.0 - gdp_index * 0.6 - detail(5.0) * 10.0).clamp(0.0, 100.0);
        let governance = (40.0 + gdp_index * 0.4 + detail(6.0) * 15.0).clamp(0.0, 100.0);

        // ── Climate ─────────────────────────────────────────────────────────
        let band = LatitudeBand::of(point.lat);
        let temp_c = climate::baseline_temperature_c(point.lat)
            + climate::heat_island_c(land_use)
            + (micro_n - 0.5) * 2.0;
        let temperature = climate::temperature_index(temp_c);
        let precip_mm = climate::zonal_precipitation_mm(point.lat) * (0.9 + 0.2 * macro_n);
        let precipitation = climate::precipitation_index(precip_mm);
        let tropical_bonus = if band == LatitudeBand::Tropical { 20.0 } else { 0.0 };
        let extreme_events = (20.0 + tropical_bonus + coastal * 0.3 + micro_n * 20.0).clamp(0.0, 100.0);

        ContextTensor {
            climate: Climate { temperature, precipitation, extreme_events, band },
            geography: Geography { elevation_m, land_use, coastal, water_body, water_feature: water },
            socio: Socio { pop_density, gdp_index },
            infrastructure: Infrastructure { road_density, water_access },
            vulnerability: Vulnerability { social_index, governance },
            uncertainty: norm_dist.clamp(0.0, 1.0),
        }
    }
}

impl Default for ContextSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

/// One-shot convenience over [`ContextSynthesizer::synthesize`].
pub fn synthesize(point: GeoPoint, grid_center: GeoPoint, scale: Scale) -> ContextTensor {
    ContextSynthesizer::new().synthesize(point, grid_center, scale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::generate;

    fn tensors(center: GeoPoint, scale: Scale) -> Vec<ContextTensor> {
        let s = ContextSynthesizer::new();
        generate(center, scale)
            .unwrap()
            .points
            .into_iter()
            .map(|p| s.synthesize(p, center, scale))
            .collect()
    }

    #[test]
    fn identical_inputs_give_bit_identical_tensors() {
        let c = GeoPoint::new(-6.2088, 106.8456);
        let p = c.offset_m(1200.0, -800.0);
        let a = synthesize(p, c, Scale::City);
        let b = ContextSynthesizer::new().synthesize(p, c, Scale::City);
        assert_eq!(a, b);
        assert_eq!(a.climate.temperature.to_bits(), b.climate.temperature.to_bits());
        assert_eq!(a.socio.pop_density.to_bits(), b.socio.pop_density.to_bits());
    }

    #[test]
    fn normalised_fields_stay_in_range() {
        for t in tensors(GeoPoint::new(35.68, 139.69), Scale::City) {
            for v in [
                t.climate.temperature,
                t.climate.precipitation,
                t.climate.extreme_events,
                t.geography.coastal,
                t.geography.water_body,
                t.socio.pop_density,
                t.socio.gdp_index,
                t.infrastructure.road_density,
                t.infrastructure.water_access,
                t.vulnerability.social_index,
                t.vulnerability.governance,
            ] {
                assert!((0.0..=100.0).contains(&v), "field {v} out of [0, 100]");
            }
            assert!((0.0..=1.0).contains(&t.uncertainty));
            assert!(t.geography.elevation_m >= 0.0);
        }
    }

    #[test]
    fn waterbody_cells_are_flat_and_unpopulated() {
        let all = tensors(GeoPoint::new(-33.9249, 18.4241), Scale::Region);
        for t in all.iter().filter(|t| t.land_use() == LandUse::Waterbody) {
            assert_eq!(t.geography.elevation_m, 0.0);
            assert_eq!(t.socio.pop_density, 0.0);
            assert!(t.geography.water_feature.is_some());
        }
    }

    #[test]
    fn center_is_more_urban_than_edge() {
        let c = GeoPoint::new(51.5074, -0.1278);
        let s = ContextSynthesizer::new();
        let pts = generate(c, Scale::City).unwrap().points;
        let urban_share = |near: bool| {
            let sel: Vec<_> = pts
                .iter()
                .filter(|p| (p.planar_distance_m(c) < 2500.0) == near)
                .map(|&p| s.synthesize(p, c, Scale::City))
                .filter(|t| t.land_use() != LandUse::Waterbody)
                .collect();
            sel.iter().filter(|t| t.land_use() == LandUse::Urban).count() as f64 / sel.len().max(1) as f64
        };
        assert!(urban_share(true) > urban_share(false));
    }

    #[test]
    fn tensor_depends_on_grid_center() {
        let p = GeoPoint::new(40.7128, -74.0060);
        let near = synthesize(p, p, Scale::City);
        let far = synthesize(p, p.offset_m(20_000.0, 0.0), Scale::City);
        assert!(near.uncertainty < far.uncertainty);
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let c = GeoPoint::new(19.07, 72.88);
        let json = serde_json::to_string(&synthesize(c, c, Scale::Neighborhood)).unwrap();
        assert!(json.contains("\"popDensity\""));
        assert!(json.contains("\"landUse\""));
    }
}
