//! Land-use classification and per-class attribute ranges.
use serde::{Deserialize, Serialize};

/// Macro-noise below this is open water.
pub const OCEAN_THRESHOLD: f64 = 0.30;
/// Micro-noise within this distance of 0.5 is a river channel.
pub const RIVER_BAND: f64 = 0.012;
pub const URBAN_THRESHOLD: f64 = 0.62;
pub const SUBURBAN_THRESHOLD: f64 = 0.38;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LandUse {
    Urban,
    Suburban,
    Rural,
    Waterbody,
}

impl LandUse {
    pub const ALL: [LandUse; 4] = [LandUse::Urban, LandUse::Suburban, LandUse::Rural, LandUse::Waterbody];

    pub fn as_str(self) -> &'static str {
        match self {
            LandUse::Urban => "urban",
            LandUse::Suburban => "suburban",
            LandUse::Rural => "rural",
            LandUse::Waterbody => "waterbody",
        }
    }
}

impl std::str::FromStr for LandUse {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LandUse::ALL
            .into_iter()
            .find(|lu| lu.as_str().eq_ignore_ascii_case(s.trim()))
            .or_else(|| s.trim().eq_ignore_ascii_case("water").then_some(LandUse::Waterbody))
            .ok_or_else(|| format!("unknown land use `{s}`"))
    }
}

/// Which water test fired, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaterFeature {
    Ocean,
    River,
}

/// Ocean first, then river.
pub fn water_feature(macro_noise: f64, micro_noise: f64) -> Option<WaterFeature> {
    if macro_noise < OCEAN_THRESHOLD {
        Some(WaterFeature::Ocean)
    } else if (micro_noise - 0.5).abs() < RIVER_BAND {
        Some(WaterFeature::River)
    } else {
        None
    }
}

/// First match wins: Waterbody > Urban > Suburban > Rural.
pub fn classify(water: Option<WaterFeature>, urbanization: f64) -> LandUse {
    if water.is_some() {
        LandUse::Waterbody
    } else if urbanization >= URBAN_THRESHOLD {
        LandUse::Urban
    } else if urbanization >= SUBURBAN_THRESHOLD {
        LandUse::Suburban
    } else {
        LandUse::Rural
    }
}

/// Base `(lo, hi)` ranges on [0, 100] for the noise-perturbed attributes.
#[derive(Debug, Clone, Copy)]
pub struct ClassRanges {
    pub pop_density: (f64, f64),
    pub gdp_index: (f64, f64),
    pub road_density: (f64, f64),
    pub water_access: (f64, f64),
}

pub fn class_ranges(lu: LandUse) -> ClassRanges {
    match lu {
        LandUse::Urban => ClassRanges {
            pop_density:  (65.0, 100.0),
            gdp_index:    (55.0, 90.0),
            road_density: (70.0, 95.0),
            water_access: (75.0, 98.0),
        },
        LandUse::Suburban => ClassRanges {
            pop_density:  (30.0, 65.0),
            gdp_index:    (45.0, 75.0),
            road_density: (40.0, 70.0),
            water_access: (60.0, 85.0),
        },
        LandUse::Rural => ClassRanges {
            pop_density:  (3.0, 25.0),
            gdp_index:    (20.0, 50.0),
            road_density: (8.0, 30.0),
            water_access: (25.0, 60.0),
        },
        LandUse::Waterbody => ClassRanges {
            pop_density:  (0.0, 0.0),
            gdp_index:    (0.0, 0.0),
            road_density: (0.0, 5.0),
            water_access: (0.0, 10.0),
        },
    }
}

/// Place `t ∈ [0, 1]` within `range`.
#[inline]
pub fn in_range(range: (f64, f64), t: f64) -> f64 {
    range.0 + (range.1 - range.0) * t.clamp(0.0, 1.0)
}
