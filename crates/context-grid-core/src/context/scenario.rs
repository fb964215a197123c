//! Emissions-scenario projection of the climate dimension group.
use serde::{Deserialize, Serialize};

use super::climate::temperature_index_per_c;
use super::ContextTensor;

/// Shared socioeconomic pathway driving the projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scenario {
    #[serde(rename = "SSP1-2.6")]
    Ssp126,
    #[serde(rename = "SSP2-4.5")]
    Ssp245,
    #[serde(rename = "SSP5-8.5")]
    Ssp585,
}

impl Scenario {
    /// Warming rate in °C per decade.
    pub fn warming_per_decade_c(self) -> f64 {
        match self {
            Scenario::Ssp126 => 0.10,
            Scenario::Ssp245 => 0.25,
            Scenario::Ssp585 => 0.45,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Scenario::Ssp126 => "SSP1-2.6",
            Scenario::Ssp245 => "SSP2-4.5",
            Scenario::Ssp585 => "SSP5-8.5",
        }
    }
}

impl std::str::FromStr for Scenario {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm: String = s.chars().filter(|c| c.is_ascii_alphanumeric()).collect::<String>().to_ascii_lowercase();
        match norm.as_str() {
            "ssp126" | "low" => Ok(Scenario::Ssp126),
            "ssp245" | "medium" | "moderate" => Ok(Scenario::Ssp245),
            "ssp585" | "high" => Ok(Scenario::Ssp585),
            _ => Err(format!("unknown scenario `{s}`")),
        }
    }
}

/// Projected warming in °C after `year_offset` years. Negative offsets
/// (hindcasts) are treated as zero.
pub fn projected_warming_c(scenario: Scenario, year_offset: i32) -> f64 {
    scenario.warming_per_decade_c() * year_offset.max(0) as f64 / 10.0
}

/// Shift the climate group of `tensor` for `scenario` at `year_offset`.
/// Pure; non-climate groups are untouched.
pub fn project(tensor: &ContextTensor, scenario: Scenario, year_offset: i32) -> ContextTensor {
    let warming = projected_warming_c(scenario, year_offset);
    let mut out = tensor.clone();
    out.climate.temperature = (out.climate.temperature + warming * temperature_index_per_c()).clamp(0.0, 100.0);
    out.climate.extreme_events = (out.climate.extreme_events + warming * 6.0).clamp(0.0, 100.0);
    // ~2% more precipitation intensity per °C.
    out.climate.precipitation = (out.climate.precipitation * (1.0 + 0.02 * warming)).clamp(0.0, 100.0);
    out
}
