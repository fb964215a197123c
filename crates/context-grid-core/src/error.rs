//! Error taxonomy for the grid engine.
//!
//! Only [`GridError`] ever reaches callers of the analysis pipeline. The
//! render-handle and color-parse errors are recovered locally inside the
//! animation scheduler.

use thiserror::Error;

/// Errors returned by the analysis pipeline.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GridError {
    #[error("coordinate is not finite: lat={lat}, lon={lon}")]
    NonFiniteCoordinate { lat: f64, lon: f64 },
    #[error("latitude {lat} is outside the supported domain (|lat| <= 85)")]
    PolarLatitude { lat: f64 },
    #[error("hex radius must be positive and finite, got {radius_m}")]
    InvalidRadius { radius_m: f64 },
    #[error("unknown region `{0}`")]
    UnknownRegion(String),
}

impl GridError {
    /// True for the invalid-geographic-input family.
    pub fn is_domain_input(&self) -> bool {
        !matches!(self, GridError::UnknownRegion(_))
    }
}

/// Applying state to a render handle failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RenderHandleError {
    #[error("polygon handle {0} is detached")]
    Detached(u64),
    #[error("polygon handle {id} rejected update: {reason}")]
    Rejected { id: u64, reason: String },
}

/// A color string did not match `rgba(R, G, B[, A])` or `#rrggbb`/`#rgb`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("cannot parse color `{input}`: {reason}")]
pub struct ColorParseError {
    pub input: String,
    pub reason: &'static str,
}

impl ColorParseError {
    pub(crate) fn new(input: &str, reason: &'static str) -> Self {
        Self { input: input.to_string(), reason }
    }
}
