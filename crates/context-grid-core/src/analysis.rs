//! Analysis result model and region-wide aggregation.
//!
//! A [`GridAnalysis`] is built once per request and replaced wholesale by the
//! next one. Cells are immutable; rendering state lives in the animation
//! scheduler.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::actions::{self, ActionId};
use crate::config::AnalysisConfig;
use crate::context::land_use::LandUse;
use crate::context::scenario::{projected_warming_c, Scenario};
use crate::context::ContextTensor;
use crate::coords::{BoundaryPoint, GeoPoint};
use crate::grid::Scale;
use crate::scoring::{RiskBand, RiskScores};

/// Actions named in the digest.
const DIGEST_TOP_ACTIONS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HexCell {
    /// `hex_{row}_{col}` in lattice coordinates; stable for a given scale.
    pub id: String,
    pub center: GeoPoint,
    /// Closed ring, first vertex repeated last.
    pub boundary: [BoundaryPoint; 7],
    pub tensor: ContextTensor,
    pub scores: RiskScores,
    pub actions: Vec<ActionId>,
}

impl HexCell {
    pub fn lattice_id(row: i32, col: i32) -> String {
        format!("hex_{row}_{col}")
    }

    pub fn land_use(&self) -> LandUse {
        self.tensor.land_use()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LandUseCounts {
    pub urban: usize,
    pub suburban: usize,
    pub rural: usize,
    pub waterbody: usize,
}

impl LandUseCounts {
    pub fn tally<'a>(cells: impl IntoIterator<Item = &'a HexCell>) -> Self {
        let mut c = Self::default();
        for cell in cells {
            match cell.land_use() {
                LandUse::Urban => c.urban += 1,
                LandUse::Suburban => c.suburban += 1,
                LandUse::Rural => c.rural += 1,
                LandUse::Waterbody => c.waterbody += 1,
            }
        }
        c
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalStats {
    pub avg_risk: f64,
    pub max_risk: f64,
    /// People living in cells at or above the affected-risk threshold.
    pub affected_population: u64,
    /// Summed cost of every selected action, millions of USD.
    pub total_cost: f64,
    pub land_use: LandUseCounts,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridAnalysis {
    pub region_name: String,
    pub scenario: Scenario,
    pub year: i32,
    /// Years past the base year the climate was projected to.
    pub year_offset: i32,
    pub scale: Scale,
    pub cells: Vec<HexCell>,
    pub grid_center: GeoPoint,
    pub hex_radius_m: f64,
    pub global_stats: GlobalStats,
}

/// Area of a regular hexagon with circumradius `radius_m`, in km².
pub fn cell_area_km2(radius_m: f64) -> f64 {
    1.5 * 3f64.sqrt() * radius_m * radius_m / 1.0e6
}

pub fn global_stats(cells: &[HexCell], hex_radius_m: f64, cfg: &AnalysisConfig) -> GlobalStats {
    let area = cell_area_km2(hex_radius_m);
    let mut sum = 0.0;
    let mut max = 0.0f64;
    let mut affected = 0.0;
    let mut cost = 0.0;

    for cell in cells {
        let risk = cell.scores.total_risk;
        sum += risk;
        max = max.max(risk);
        if risk >= cfg.affected_risk_threshold {
            affected += cell.tensor.socio.pop_density / 100.0 * cfg.max_density_per_km2 * area;
        }
        cost += actions::total_cost_musd(&cell.actions);
    }

    GlobalStats {
        avg_risk: if cells.is_empty() { 0.0 } else { sum / cells.len() as f64 },
        max_risk: max,
        affected_population: affected.round() as u64,
        total_cost: cost,
        land_use: LandUseCounts::tally(cells),
    }
}

impl GridAnalysis {
    pub fn cell(&self, id: &str) -> Option<&HexCell> {
        self.cells.iter().find(|c| c.id == id)
    }

    /// Most frequently selected actions, ties broken by catalog order.
    pub fn top_actions(&self, n: usize) -> Vec<(ActionId, usize)> {
        let mut counts: BTreeMap<ActionId, usize> = BTreeMap::new();
        for id in self.cells.iter().flat_map(|c| c.actions.iter()) {
            *counts.entry(*id).or_default() += 1;
        }
        let mut ranked: Vec<(ActionId, usize)> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(n);
        ranked
    }

    /// Plain-language summary for chat surfaces and the CLI.
    pub fn digest(&self) -> String {
        let s = &self.global_stats;
        let lu = s.land_use;
        let mut out = String::new();

        let _ = write!(
            out,
            "{} ({} scale, {} cells) under {} in {}",
            self.region_name,
            self.scale.as_str(),
            self.cells.len(),
            self.scenario.label(),
            self.year,
        );
        let warming = projected_warming_c(self.scenario, self.year_offset);
        if warming > 0.0 {
            let _ = write!(out, " (+{warming:.1} °C projected)");
        }
        let _ = writeln!(
            out,
            ": average risk {:.1} ({}), peak {:.1}.",
            s.avg_risk,
            RiskBand::of(s.avg_risk).as_str(),
            s.max_risk,
        );
        let _ = writeln!(
            out,
            "Land use: {} urban, {} suburban, {} rural, {} water.",
            lu.urban, lu.suburban, lu.rural, lu.waterbody,
        );
        let _ = writeln!(
            out,
            "About {} people live in high-risk cells.",
            group_thousands(s.affected_population),
        );

        let top = self.top_actions(DIGEST_TOP_ACTIONS);
        if top.is_empty() {
            let _ = write!(out, "No adaptation actions recommended.");
        } else {
            let names: Vec<String> = top
                .iter()
                .map(|(id, n)| format!("{} ({n} cells)", id.item().title))
                .collect();
            let _ = write!(
                out,
                "Top actions: {}. Estimated cost ${:.0}M.",
                names.join(", "),
                s.total_cost,
            );
        }
        out
    }
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::synthesize;
    use crate::grid::boundary_of;
    use approx::assert_abs_diff_eq;

    fn cell(id: &str, land_use: LandUse, total_risk: f64, pop: f64, actions: Vec<ActionId>) -> HexCell {
        let c = GeoPoint::new(13.7563, 100.5018);
        let mut tensor = synthesize(c, c, Scale::City);
        tensor.geography.land_use = land_use;
        tensor.socio.pop_density = pop;
        HexCell {
            id: id.to_string(),
            center: c,
            boundary: boundary_of(c, 500.0).unwrap(),
            tensor,
            scores: RiskScores { hazard: 50.0, exposure: 50.0, vulnerability: 50.0, total_risk },
            actions,
        }
    }

    fn analysis(cells: Vec<HexCell>) -> GridAnalysis {
        let global_stats = global_stats(&cells, 500.0, &AnalysisConfig::default());
        GridAnalysis {
            region_name: "Bangkok".into(),
            scenario: Scenario::Ssp245,
            year: 2055,
            year_offset: 30,
            scale: Scale::City,
            cells,
            grid_center: GeoPoint::new(13.7563, 100.5018),
            hex_radius_m: 500.0,
            global_stats,
        }
    }

    #[test]
    fn hexagon_area() {
        // 500 m circumradius ≈ 0.6495 km².
        assert_abs_diff_eq!(cell_area_km2(500.0), 0.649_519, epsilon = 1e-6);
    }

    #[test]
    fn stats_average_threshold_and_cost() {
        let cells = vec![
            cell("a", LandUse::Urban, 80.0, 50.0, vec![ActionId::CoastalDefense, ActionId::CoolRoofs]),
            cell("b", LandUse::Rural, 20.0, 90.0, vec![ActionId::Agroforestry]),
            cell("c", LandUse::Waterbody, 5.0, 0.0, vec![]),
        ];
        let s = global_stats(&cells, 500.0, &AnalysisConfig::default());
        assert_abs_diff_eq!(s.avg_risk, 35.0, epsilon = 1e-9);
        assert_abs_diff_eq!(s.max_risk, 80.0, epsilon = 1e-9);
        // Only cell "a" clears the threshold: 0.5 · 20 000 · 0.6495 km².
        let expected = (0.5 * 20_000.0 * cell_area_km2(500.0)).round() as u64;
        assert_eq!(s.affected_population, expected);
        let cost = ActionId::CoastalDefense.item().cost_musd
            + ActionId::CoolRoofs.item().cost_musd
            + ActionId::Agroforestry.item().cost_musd;
        assert_abs_diff_eq!(s.total_cost, cost, epsilon = 1e-9);
        assert_eq!(s.land_use, LandUseCounts { urban: 1, suburban: 0, rural: 1, waterbody: 1 });
    }

    #[test]
    fn empty_grid_has_zero_stats() {
        let s = global_stats(&[], 150.0, &AnalysisConfig::default());
        assert_eq!(s.avg_risk, 0.0);
        assert_eq!(s.affected_population, 0);
        assert_eq!(s.total_cost, 0.0);
    }

    #[test]
    fn top_actions_rank_by_frequency_then_catalog_order() {
        let a = analysis(vec![
            cell("a", LandUse::Urban, 80.0, 50.0, vec![ActionId::CoolRoofs, ActionId::UrbanFloodDrainage]),
            cell("b", LandUse::Urban, 75.0, 50.0, vec![ActionId::CoolRoofs]),
            cell("c", LandUse::Rural, 30.0, 10.0, vec![ActionId::Agroforestry]),
        ]);
        let top = a.top_actions(3);
        assert_eq!(top[0], (ActionId::CoolRoofs, 2));
        assert_eq!(top[1], (ActionId::UrbanFloodDrainage, 1));
        assert_eq!(top[2], (ActionId::Agroforestry, 1));
    }

    #[test]
    fn digest_mentions_region_scenario_and_actions() {
        let a = analysis(vec![
            cell("a", LandUse::Urban, 80.0, 50.0, vec![ActionId::CoolRoofs]),
            cell("b", LandUse::Waterbody, 5.0, 0.0, vec![ActionId::FloodManagement]),
        ]);
        let d = a.digest();
        assert!(d.starts_with("Bangkok (city scale, 2 cells) under SSP2-4.5 in 2055"));
        assert!(d.contains("+0.8 °C projected"), "{d}");
        assert!(d.contains("1 urban"));
        assert!(d.contains("1 water"));
        assert!(d.contains(ActionId::CoolRoofs.item().title));
        assert!(a.cell("b").is_some());
        assert!(a.cell("zz").is_none());
    }

    #[test]
    fn thousands_grouping() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1_000), "1,000");
        assert_eq!(group_thousands(12_345_678), "12,345,678");
    }

    #[test]
    fn analysis_serializes_camel_case() {
        let a = analysis(vec![cell("a", LandUse::Rural, 10.0, 5.0, vec![])]);
        let json = serde_json::to_value(&a).unwrap();
        assert!(json.get("regionName").is_some());
        assert!(json["globalStats"].get("affectedPopulation").is_some());
        assert_eq!(json["cells"][0]["boundary"].as_array().unwrap().len(), 7);
        let back: GridAnalysis = serde_json::from_value(json).unwrap();
        assert_eq!(back.cells[0].id, "a");
        assert_eq!(back.scenario, Scenario::Ssp245);
    }
}
