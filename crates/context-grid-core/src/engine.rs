//! Request orchestration: resolve → tessellate → synthesize → project →
//! score → select → aggregate.
//!
//! Per-cell work is pure and runs on rayon when the `threading` feature is
//! enabled. The engine holds no per-request state.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::actions;
use crate::analysis::{global_stats, GridAnalysis, HexCell};
use crate::animation::VisualState;
use crate::color::{ColorLayer, ColorMapper, Rgba};
use crate::config::{load_engine_config_from_env, EngineConfig};
use crate::context::land_use::LandUse;
use crate::context::scenario::{self, Scenario};
use crate::context::ContextSynthesizer;
use crate::coords::GeoPoint;
use crate::error::GridError;
use crate::grid::{self, Scale};
use crate::region::RegionResolver;
use crate::scoring;

fn default_scenario() -> Scenario {
    Scenario::Ssp245
}

fn default_scale() -> Scale {
    Scale::City
}

/// One analysis request as received from a chat tool call or the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub region_name: String,
    #[serde(default)]
    pub year_offset: i32,
    #[serde(default = "default_scenario")]
    pub scenario: Scenario,
    #[serde(default = "default_scale")]
    pub scale: Scale,
}

impl AnalysisRequest {
    pub fn new(region_name: impl Into<String>) -> Self {
        Self {
            region_name: region_name.into(),
            year_offset: 0,
            scenario: default_scenario(),
            scale: default_scale(),
        }
    }

    pub fn with_scale(mut self, scale: Scale) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_scenario(mut self, scenario: Scenario, year_offset: i32) -> Self {
        self.scenario = scenario;
        self.year_offset = year_offset;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisOutcome {
    pub analysis: GridAnalysis,
    pub digest: String,
    /// Visual target per cell, index-aligned with `analysis.cells`.
    pub targets: Vec<VisualState>,
}

pub struct GridEngine {
    config: Arc<EngineConfig>,
    synthesizer: ContextSynthesizer,
    colors: ColorMapper,
}

impl Default for GridEngine {
    fn default() -> Self {
        Self::new(EngineConfig::builtin())
    }
}

impl GridEngine {
    pub fn new(config: Arc<EngineConfig>) -> Self {
        let colors = ColorMapper::new(config.color.clone());
        Self { config, synthesizer: ContextSynthesizer::new(), colors }
    }

    /// Engine configured from `CONTEXT_GRID_CONFIG`, falling back to builtin.
    pub fn from_env() -> Self {
        let (config, _) = load_engine_config_from_env();
        Self::new(config)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn color_mapper(&self) -> &ColorMapper {
        &self.colors
    }

    /// Full pipeline for a named region.
    pub fn analyze(&self, request: &AnalysisRequest, resolver: &dyn RegionResolver) -> Result<AnalysisOutcome, GridError> {
        let center = resolver.resolve(&request.region_name)?;
        self.outcome_at(center, request)
    }

    /// Analysis plus digest and risk-layer targets for a resolved center.
    pub fn outcome_at(&self, center: GeoPoint, request: &AnalysisRequest) -> Result<AnalysisOutcome, GridError> {
        let analysis = self.analyze_at(request.region_name.trim(), center, request)?;
        let digest = analysis.digest();
        let targets = self.targets(&analysis, ColorLayer::Risk);
        Ok(AnalysisOutcome { analysis, digest, targets })
    }

    /// Pipeline for an already-resolved grid center.
    pub fn analyze_at(&self, region_name: &str, center: GeoPoint, request: &AnalysisRequest) -> Result<GridAnalysis, GridError> {
        let center = center.validate()?;
        let scale = request.scale;
        let tess = grid::generate(center, scale)?;
        let cols = 2 * scale.params().grid_width + 1;

        let build = |(i, &point): (usize, &GeoPoint)| self.build_cell(i, point, center, cols, tess.hex_radius_m, request);

        #[cfg(feature = "threading")]
        let cells: Result<Vec<HexCell>, GridError> = {
            use rayon::prelude::*;
            tess.points.par_iter().enumerate().map(build).collect()
        };
        #[cfg(not(feature = "threading"))]
        let cells: Result<Vec<HexCell>, GridError> = tess.points.iter().enumerate().map(build).collect();
        let cells = cells?;

        let global_stats = global_stats(&cells, tess.hex_radius_m, &self.config.analysis);
        tracing::info!(
            target: "context_grid::engine",
            region = %region_name,
            scale = scale.as_str(),
            scenario = request.scenario.label(),
            cells = cells.len(),
            avg_risk = global_stats.avg_risk,
            affected_population = global_stats.affected_population,
            "analysis.completed"
        );

        Ok(GridAnalysis {
            region_name: region_name.to_string(),
            scenario: request.scenario,
            year: self.config.analysis.base_year.saturating_add(request.year_offset),
            year_offset: request.year_offset,
            scale,
            cells,
            grid_center: center,
            hex_radius_m: tess.hex_radius_m,
            global_stats,
        })
    }

    fn build_cell(
        &self,
        index: usize,
        point: GeoPoint,
        center: GeoPoint,
        cols: i32,
        radius_m: f64,
        request: &AnalysisRequest,
    ) -> Result<HexCell, GridError> {
        let p = request.scale.params();
        let row = index as i32 / cols - p.grid_height;
        let col = index as i32 % cols - p.grid_width;

        let base = self.synthesizer.synthesize(point, center, request.scale);
        let tensor = scenario::project(&base, request.scenario, request.year_offset);
        let scores = scoring::score(&tensor, &self.config.risk);
        let actions = actions::select(&tensor, &scores);
        let boundary = grid::boundary_of(point, radius_m)?;

        Ok(HexCell { id: HexCell::lattice_id(row, col), center: point, boundary, tensor, scores, actions })
    }

    /// Extrusion height in metres. Waterbody cells stay flat.
    pub fn extrusion_height(&self, cell: &HexCell) -> f64 {
        if cell.land_use() == LandUse::Waterbody {
            return 0.0;
        }
        let e = &self.config.extrusion;
        (cell.scores.total_risk * e.meters_per_risk_point).max(e.min_height_m)
    }

    pub fn cell_color(&self, cell: &HexCell, layer: ColorLayer) -> Rgba {
        self.colors.color_for(layer.value(&cell.scores), cell.land_use(), cell.tensor.uncertainty)
    }

    pub fn target_for(&self, cell: &HexCell, layer: ColorLayer) -> VisualState {
        VisualState { height_m: self.extrusion_height(cell), color: self.cell_color(cell, layer) }
    }

    pub fn targets(&self, analysis: &GridAnalysis, layer: ColorLayer) -> Vec<VisualState> {
        analysis.cells.iter().map(|c| self.target_for(c, layer)).collect()
    }

    /// Colors for a layer switch, index-aligned with `analysis.cells`.
    pub fn layer_colors(&self, analysis: &GridAnalysis, layer: ColorLayer) -> Vec<Rgba> {
        analysis.cells.iter().map(|c| self.cell_color(c, layer)).collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::color::WATER;
    use crate::region::StaticRegionTable;
    use approx::assert_abs_diff_eq;

    fn engine() -> GridEngine {
        GridEngine::default()
    }

    #[test]
    fn city_analysis_end_to_end() {
        let out = engine()
            .analyze(&AnalysisRequest::new("London"), &StaticRegionTable::builtin())
            .unwrap();
        let a = &out.analysis;
        assert_eq!(a.cells.len(), 525);
        assert_eq!(out.targets.len(), 525);
        assert_eq!(a.hex_radius_m, 500.0);
        assert_eq!(a.year, 2025);
        assert!(!out.digest.is_empty());

        let ids: HashSet<&str> = a.cells.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids.len(), a.cells.len());
        assert!(a.cell("hex_0_0").is_some());
        assert!(a.cell("hex_-10_-12").is_some());
        assert!(a.cell("hex_10_12").is_some());

        for cell in &a.cells {
            assert_eq!(cell.boundary[0], cell.boundary[6]);
            assert!((0.0..=100.0).contains(&cell.scores.total_risk));
            assert!(cell.actions.len() <= 3);
            if cell.land_use() == LandUse::Waterbody {
                assert_eq!(cell.scores.total_risk, 5.0);
            }
        }
    }

    #[test]
    fn center_cell_sits_on_the_grid_center() {
        let e = engine();
        let c = GeoPoint::new(6.5244, 3.3792);
        let a = e.analyze_at("Lagos", c, &AnalysisRequest::new("Lagos").with_scale(Scale::Neighborhood)).unwrap();
        let center = a.cell("hex_0_0").unwrap();
        assert_abs_diff_eq!(center.center.lat, c.lat, epsilon = 1e-12);
        assert_abs_diff_eq!(center.center.lon, c.lon, epsilon = 1e-12);
    }

    #[test]
    fn analysis_is_deterministic() {
        let table = StaticRegionTable::builtin();
        let req = AnalysisRequest::new("Jakarta").with_scenario(Scenario::Ssp585, 25);
        let a = engine().analyze(&req, &table).unwrap();
        let b = engine().analyze(&req, &table).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn unknown_region_and_bad_center_are_rejected() {
        let e = engine();
        let err = e.analyze(&AnalysisRequest::new("Atlantis"), &StaticRegionTable::builtin()).unwrap_err();
        assert!(matches!(err, GridError::UnknownRegion(_)));

        let polar = e.analyze_at("Pole", GeoPoint::new(89.0, 0.0), &AnalysisRequest::new("Pole"));
        assert!(matches!(polar, Err(GridError::PolarLatitude { .. })));
        let nan = e.analyze_at("Nowhere", GeoPoint::new(f64::NAN, 0.0), &AnalysisRequest::new("Nowhere"));
        assert!(nan.unwrap_err().is_domain_input());
    }

    #[test]
    fn scenario_warms_the_climate_group() {
        let e = engine();
        let c = GeoPoint::new(23.8103, 90.4125);
        let base = e.analyze_at("Dhaka", c, &AnalysisRequest::new("Dhaka")).unwrap();
        let req = AnalysisRequest::new("Dhaka").with_scenario(Scenario::Ssp585, 50);
        let hot = e.analyze_at("Dhaka", c, &req).unwrap();
        assert_eq!(hot.year, 2075);
        for (b, h) in base.cells.iter().zip(&hot.cells) {
            assert!(h.tensor.climate.temperature >= b.tensor.climate.temperature);
            assert_eq!(b.land_use(), h.land_use());
        }
    }

    #[test]
    fn visual_targets_follow_risk_and_land_use() {
        let e = engine();
        let out = e.analyze(&AnalysisRequest::new("Mumbai"), &StaticRegionTable::builtin()).unwrap();
        let ext = &e.config().extrusion;
        for (cell, t) in out.analysis.cells.iter().zip(&out.targets) {
            if cell.land_use() == LandUse::Waterbody {
                assert_eq!(t.height_m, 0.0);
                assert_eq!((t.color.r, t.color.g, t.color.b), (WATER.r, WATER.g, WATER.b));
            } else {
                assert!(t.height_m >= ext.min_height_m);
                let raw = cell.scores.total_risk * ext.meters_per_risk_point;
                if raw >= ext.min_height_m {
                    assert_abs_diff_eq!(t.height_m, raw, epsilon = 1e-9);
                }
            }
            assert!(t.color.a > 0.0 && t.color.a <= e.config().color.base_alpha + 1e-12);
        }
    }

    #[test]
    fn layer_colors_align_with_cells() {
        let e = engine();
        let a = e
            .analyze_at("Miami", GeoPoint::new(25.7617, -80.1918), &AnalysisRequest::new("Miami").with_scale(Scale::Region))
            .unwrap();
        let hazard = e.layer_colors(&a, ColorLayer::Hazard);
        assert_eq!(hazard.len(), a.cells.len());
        assert_eq!(hazard[0], e.cell_color(&a.cells[0], ColorLayer::Hazard));
    }

    #[test]
    fn extreme_year_offset_saturates() {
        let e = engine();
        let c = GeoPoint::new(-1.2921, 36.8219);
        let req = AnalysisRequest::new("Nairobi").with_scale(Scale::Neighborhood).with_scenario(Scenario::Ssp585, i32::MAX);
        let a = e.analyze_at("Nairobi", c, &req).unwrap();
        assert_eq!(a.year, i32::MAX);
        assert_eq!(a.year_offset, i32::MAX);
        for cell in &a.cells {
            assert!((0.0..=100.0).contains(&cell.tensor.climate.temperature));
            assert!((0.0..=100.0).contains(&cell.scores.total_risk));
        }

        let req: AnalysisRequest = serde_json::from_str(r#"{"regionName":"Nairobi","yearOffset":2147483600}"#).unwrap();
        let a = e.analyze_at("Nairobi", c, &req.with_scale(Scale::Neighborhood)).unwrap();
        assert_eq!(a.year, i32::MAX);
    }

    #[test]
    fn request_json_uses_defaults() {
        let req: AnalysisRequest = serde_json::from_str(r#"{"regionName":"Tokyo"}"#).unwrap();
        assert_eq!(req, AnalysisRequest::new("Tokyo"));
        let req: AnalysisRequest =
            serde_json::from_str(r#"{"regionName":"Tokyo","yearOffset":30,"scenario":"SSP5-8.5","scale":"region"}"#).unwrap();
        assert_eq!(req.scenario, Scenario::Ssp585);
        assert_eq!(req.scale, Scale::Region);
        assert_eq!(req.year_offset, 30);
    }
}
