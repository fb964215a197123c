//! Geospatial context-tensor grid engine.
//!
//! Tessellates a region into hexagonal cells, synthesizes a deterministic
//! context tensor per cell, scores it, maps scores to colors and drives a
//! staggered animation of caller-owned polygon handles toward the result.
//!
//! Pipeline (leaves first):
//!   grid → context → scoring → {actions, color, analysis} → animation

pub mod actions;
pub mod analysis;
pub mod animation;
pub mod color;
pub mod config;
pub mod context;
pub mod coords;
pub mod engine;
pub mod error;
pub mod grid;
pub mod region;
pub mod scoring;

pub use analysis::{GridAnalysis, HexCell};
pub use config::EngineConfig;
pub use coords::{BoundaryPoint, GeoPoint};
pub use engine::{AnalysisOutcome, AnalysisRequest, GridEngine};
pub use error::GridError;
pub use grid::Scale;
