//! Fixed action catalog and the rule table that assigns actions to cells.
//!
//! Rules are evaluated in order and are deliberately non-optimizing:
//!   1. Waterbody          → waterway transport + flood management (stop)
//!   2. total_risk > 70    → coastal defense + urban flood drainage
//!   3. Rural / Urban      → the land-use specific pair
//! Results are deduplicated in first-seen order and capped at three.
use serde::{Deserialize, Serialize};

use crate::context::land_use::LandUse;
use crate::context::ContextTensor;
use crate::scoring::RiskScores;

pub const MAX_ACTIONS_PER_CELL: usize = 3;
const HIGH_RISK_THRESHOLD: f64 = 70.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionId {
    WaterwayTransport,
    FloodManagement,
    CoastalDefense,
    UrbanFloodDrainage,
    CoolRoofs,
    Agroforestry,
    SoilWaterConservation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    Mitigation,
    Adaptation,
}

/// Catalog entry. Read-only reference data; cells store [`ActionId`]s.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionItem {
    pub id: ActionId,
    pub icon: &'static str,
    pub title: &'static str,
    pub measures: &'static [&'static str],
    /// Indicative capital cost per cell, millions of USD.
    pub cost_musd: f64,
    pub timeline: &'static str,
    pub kind: ActionKind,
}

pub static CATALOG: [ActionItem; 7] = [
    ActionItem {
        id: ActionId::WaterwayTransport,
        icon: "⛴",
        title: "Climate-resilient waterway transport",
        measures: &["Floating jetties", "Flood-rated ferry terminals", "Channel depth monitoring"],
        cost_musd: 4.0,
        timeline: "2-4 years",
        kind: ActionKind::Adaptation,
    },
    ActionItem {
        id: ActionId::FloodManagement,
        icon: "🌊",
        title: "Integrated flood management",
        measures: &["Retention basins", "Controlled floodplains", "Early-warning gauges"],
        cost_musd: 6.5,
        timeline: "3-5 years",
        kind: ActionKind::Adaptation,
    },
    ActionItem {
        id: ActionId::CoastalDefense,
        icon: "🛡",
        title: "Coastal defense",
        measures: &["Sea walls", "Mangrove restoration", "Dune reinforcement"],
        cost_musd: 12.0,
        timeline: "5-8 years",
        kind: ActionKind::Adaptation,
    },
    ActionItem {
        id: ActionId::UrbanFloodDrainage,
        icon: "🏙",
        title: "Urban flood drainage",
        measures: &["Storm-drain upsizing", "Permeable paving", "Bioswales"],
        cost_musd: 8.0,
        timeline: "3-6 years",
        kind: ActionKind::Adaptation,
    },
    ActionItem {
        id: ActionId::CoolRoofs,
        icon: "🏠",
        title: "Cool roofs and urban greening",
        measures: &["Reflective roofing", "Street trees", "Green corridors"],
        cost_musd: 2.5,
        timeline: "1-3 years",
        kind: ActionKind::Mitigation,
    },
    ActionItem {
        id: ActionId::Agroforestry,
        icon: "🌳",
        title: "Agroforestry",
        measures: &["Shade-tree intercropping", "Windbreaks", "Carbon-sequestering orchards"],
        cost_musd: 1.2,
        timeline: "3-7 years",
        kind: ActionKind::Mitigation,
    },
    ActionItem {
        id: ActionId::SoilWaterConservation,
        icon: "💧",
        title: "Soil and water conservation",
        measures: &["Contour bunds", "Drip irrigation", "Rainwater harvesting"],
        cost_musd: 0.8,
        timeline: "1-2 years",
        kind: ActionKind::Adaptation,
    },
];

impl ActionId {
    pub fn item(self) -> &'static ActionItem {
        // CATALOG is declared in enum order.
        &CATALOG[self as usize]
    }
}

fn rule_pairs(tensor: &ContextTensor, scores: &RiskScores) -> Vec<[ActionId; 2]> {
    let mut pairs = Vec::with_capacity(2);
    if tensor.land_use() == LandUse::Waterbody {
        pairs.push([ActionId::WaterwayTransport, ActionId::FloodManagement]);
        return pairs;
    }
    if scores.total_risk > HIGH_RISK_THRESHOLD {
        pairs.push([ActionId::CoastalDefense, ActionId::UrbanFloodDrainage]);
    }
    match tensor.land_use() {
        LandUse::Rural => pairs.push([ActionId::Agroforestry, ActionId::SoilWaterConservation]),
        LandUse::Urban => pairs.push([ActionId::UrbanFloodDrainage, ActionId::CoolRoofs]),
        LandUse::Suburban | LandUse::Waterbody => {}
    }
    pairs
}

/// Select up to three deduplicated actions for a cell.
pub fn select(tensor: &ContextTensor, scores: &RiskScores) -> Vec<ActionId> {
    let mut out: Vec<ActionId> = Vec::with_capacity(MAX_ACTIONS_PER_CELL);
    for id in rule_pairs(tensor, scores).into_iter().flatten() {
        if out.len() == MAX_ACTIONS_PER_CELL {
            break;
        }
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}

/// Summed indicative cost of `ids`, millions of USD.
pub fn total_cost_musd(ids: &[ActionId]) -> f64 {
    ids.iter().map(|id| id.item().cost_musd).sum()
}
