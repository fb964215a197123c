//! Engine configuration.
//!
//! Loaded from `engine_config.json` with support for an environment variable
//! override. Every section falls back to its defaults field by field.

use std::{
    env, fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use serde::Deserialize;
use thiserror::Error;

pub const BUILTIN_ENGINE_CONFIG: &str = include_str!("data/engine_config.json");
pub const CONFIG_PATH_ENV: &str = "CONTEXT_GRID_CONFIG";

/// Root configuration for the grid engine.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub color: ColorConfig,
    pub risk: RiskConfig,
    pub animation: AnimationConfig,
    pub extrusion: ExtrusionConfig,
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    /// Score at which the diverging scale switches from the low to the high ramp.
    pub breakpoint: f64,
    pub base_alpha: f64,
    /// Apply the sigmoid pre-warp inside each ramp segment.
    pub sigmoid: bool,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self { breakpoint: 50.0, base_alpha: 0.85, sigmoid: false }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Divisor applied to hazard·exposure·vulnerability before the power law.
    pub product_normalizer: f64,
    pub exponent: f64,
    /// Fixed total risk reported for every Waterbody cell.
    pub waterbody_risk: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self { product_normalizer: 10_000.0, exponent: 0.6, waterbody_risk: 5.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    pub duration_ms: f64,
    pub stagger_ms: f64,
    /// Recolor-only transitions (layer switches).
    pub color_duration_ms: f64,
    pub color_stagger_ms: f64,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self { duration_ms: 1200.0, stagger_ms: 4.0, color_duration_ms: 500.0, color_stagger_ms: 1.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExtrusionConfig {
    pub meters_per_risk_point: f64,
    /// Floor for extruded land cells so low-risk cells stay visible.
    pub min_height_m: f64,
}

impl Default for ExtrusionConfig {
    fn default() -> Self {
        Self { meters_per_risk_point: 30.0, min_height_m: 10.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub base_year: i32,
    /// Cells above this total risk count toward affected population.
    pub affected_risk_threshold: f64,
    /// People per km² represented by pop_density = 100.
    pub max_density_per_km2: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self { base_year: 2025, affected_risk_threshold: 50.0, max_density_per_km2: 20_000.0 }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read engine config from {path}: {source}")]
    Io {
        #[source]
        source: io::Error,
        path: PathBuf,
    },
    #[error("failed to parse engine config: {source}")]
    Parse {
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid engine config: {0}")]
    Invalid(String),
}

impl EngineConfig {
    pub fn builtin() -> Arc<Self> {
        // The builtin JSON ships with the crate and is covered by tests.
        Arc::new(Self::from_json_str(BUILTIN_ENGINE_CONFIG).unwrap_or_default())
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|source| ConfigError::Parse { source })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            source,
            path: path.to_path_buf(),
        })?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=100.0).contains(&self.color.breakpoint) {
            return Err(ConfigError::Invalid(format!(
                "color.breakpoint must be within [0, 100], got {}",
                self.color.breakpoint
            )));
        }
        if !(0.0..=1.0).contains(&self.color.base_alpha) {
            return Err(ConfigError::Invalid(format!(
                "color.base_alpha must be within [0, 1], got {}",
                self.color.base_alpha
            )));
        }
        let risk = &self.risk;
        if !(risk.product_normalizer.is_finite() && risk.product_normalizer > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "risk.product_normalizer must be finite and positive, got {}",
                risk.product_normalizer
            )));
        }
        if !(risk.exponent.is_finite() && risk.exponent > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "risk.exponent must be finite and positive, got {}",
                risk.exponent
            )));
        }
        if !(0.0..=100.0).contains(&risk.waterbody_risk) {
            return Err(ConfigError::Invalid(format!(
                "risk.waterbody_risk must be within [0, 100], got {}",
                risk.waterbody_risk
            )));
        }
        let anim = &self.animation;
        if !(anim.duration_ms.is_finite() && anim.duration_ms > 0.0)
            || !(anim.color_duration_ms.is_finite() && anim.color_duration_ms > 0.0)
        {
            return Err(ConfigError::Invalid("animation durations must be finite and positive".into()));
        }
        if !(anim.stagger_ms.is_finite() && anim.stagger_ms >= 0.0)
            || !(anim.color_stagger_ms.is_finite() && anim.color_stagger_ms >= 0.0)
        {
            return Err(ConfigError::Invalid("animation staggers must be finite and non-negative".into()));
        }
        if anim.color_stagger_ms > anim.stagger_ms {
            return Err(ConfigError::Invalid(format!(
                "animation.color_stagger_ms ({}) must not exceed animation.stagger_ms ({})",
                anim.color_stagger_ms, anim.stagger_ms
            )));
        }
        Ok(())
    }
}

/// Load the engine configuration from `CONTEXT_GRID_CONFIG`, falling back to
/// the builtin JSON. Returns the config and the path it was read from.
pub fn load_engine_config_from_env() -> (Arc<EngineConfig>, Option<PathBuf>) {
    let Some(path) = env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from) else {
        tracing::info!(target: "context_grid::config", "engine_config.loaded=builtin");
        return (EngineConfig::builtin(), None);
    };

    match EngineConfig::from_file(&path) {
        Ok(config) => {
            tracing::info!(
                target: "context_grid::config",
                path = %path.display(),
                "engine_config.loaded=file"
            );
            (Arc::new(config), Some(path))
        }
        Err(err) => {
            tracing::warn!(
                target: "context_grid::config",
                path = %path.display(),
                error = %err,
                "engine_config.load_failed"
            );
            (EngineConfig::builtin(), None)
        }
    }
}
