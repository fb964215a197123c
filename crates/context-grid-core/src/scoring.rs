//! Hazard / exposure / vulnerability / total-risk aggregation.
//!
//! Global invariants enforced:
//! - Scores are a pure function of the tensor
//! - total_risk ∈ [0, 100]
//! - Waterbody cells always report the configured constant
use serde::{Deserialize, Serialize};

use crate::config::RiskConfig;
use crate::context::climate::LatitudeBand;
use crate::context::land_use::LandUse;
use crate::context::ContextTensor;

const HAZARD_BASE: f64 = 30.0;
const COASTAL_BONUS: f64 = 25.0;
const RIVER_BONUS: f64 = 15.0;
const URBAN_BONUS: f64 = 10.0;
const TROPICAL_BONUS: f64 = 10.0;
/// Coastal / water-body proximity at which the bonus applies.
const PROXIMITY_THRESHOLD: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskScores {
    pub hazard: f64,
    pub exposure: f64,
    pub vulnerability: f64,
    pub total_risk: f64,
}

/// Risk band classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskBand {
    Low,      // < 30
    Moderate, // 30-50
    High,     // 50-70
    Severe,   // >= 70
}

impl RiskBand {
    pub fn of(total_risk: f64) -> Self {
        if total_risk >= 70.0 {
            RiskBand::Severe
        } else if total_risk >= 50.0 {
            RiskBand::High
        } else if total_risk >= 30.0 {
            RiskBand::Moderate
        } else {
            RiskBand::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskBand::Low => "low",
            RiskBand::Moderate => "moderate",
            RiskBand::High => "high",
            RiskBand::Severe => "severe",
        }
    }
}

/// Fixed bonuses on top of a base of 30.
pub fn hazard(tensor: &ContextTensor) -> f64 {
    let g = &tensor.geography;
    let mut h = HAZARD_BASE;
    if g.coastal >= PROXIMITY_THRESHOLD {
        h += COASTAL_BONUS;
    }
    if g.water_body >= PROXIMITY_THRESHOLD {
        h += RIVER_BONUS;
    }
    if g.land_use == LandUse::Urban {
        h += URBAN_BONUS;
    }
    if tensor.climate.band == LatitudeBand::Tropical {
        h += TROPICAL_BONUS;
    }
    h.min(100.0)
}

/// Mean of population density and the infrastructure index.
pub fn exposure(tensor: &ContextTensor) -> f64 {
    (tensor.socio.pop_density + tensor.infrastructure.index()) / 2.0
}

/// Poorer infrastructure means higher vulnerability, floored at 10.
pub fn vulnerability(tensor: &ContextTensor) -> f64 {
    (100.0 - tensor.infrastructure.index() * 0.7).max(10.0)
}

/// `min(100, (h·e·v / normalizer)^exponent · 100)`.
pub fn total_risk(hazard: f64, exposure: f64, vulnerability: f64, cfg: &RiskConfig) -> f64 {
    let product = (hazard * exposure * vulnerability).max(0.0) / cfg.product_normalizer;
    (product.powf(cfg.exponent) * 100.0).clamp(0.0, 100.0)
}

/// Score `tensor`. The Waterbody override is applied after the formula.
pub fn score(tensor: &ContextTensor, cfg: &RiskConfig) -> RiskScores {
    let h = hazard(tensor);
    let e = exposure(tensor);
    let v = vulnerability(tensor);
    let total = match tensor.land_use() {
        LandUse::Waterbody => cfg.waterbody_risk,
        _ => total_risk(h, e, v, cfg),
    };
    RiskScores { hazard: h, exposure: e, vulnerability: v, total_risk: total }
}
