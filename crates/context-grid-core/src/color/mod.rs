//! Score → color mapping.
//!
//! Pipeline for one cell:
//!   1. Diverging ramp around the breakpoint (low→mid below, mid→high above)
//!   2. Land-use tint (Waterbody overrides everything)
//!   3. Alpha from base alpha and data uncertainty
//!
//! Ramp interpolation is per-channel sRGB so each channel stays monotonic in
//! the score. The Lab path in [`lab`] is used where blends must look even.

pub mod blend;
pub mod lab;
pub mod parse;

use serde::{Deserialize, Serialize};

use crate::config::ColorConfig;
use crate::context::land_use::LandUse;
use crate::scoring::RiskScores;

/// An sRGB color with straight (non-premultiplied) alpha in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn with_alpha(self, a: f64) -> Self {
        Self { a: a.clamp(0.0, 1.0), ..self }
    }

    /// Fully transparent black: the state of a handle that was never painted.
    pub const TRANSPARENT: Rgba = Rgba { r: 0, g: 0, b: 0, a: 0.0 };

    /// Substituted for color strings that fail to parse.
    pub const NEUTRAL: Rgba = Rgba::rgb(128, 128, 128);

    /// Per-channel linear interpolation in sRGB space, alpha included.
    pub fn lerp(self, to: Rgba, t: f64) -> Rgba {
        let ch = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round().clamp(0.0, 255.0) as u8;
        Rgba {
            r: ch(self.r, to.r),
            g: ch(self.g, to.g),
            b: ch(self.b, to.b),
            a: (self.a + (to.a - self.a) * t).clamp(0.0, 1.0),
        }
    }

    /// Shift channels by signed deltas, saturating at 0 and 255.
    pub fn nudge(self, dr: i16, dg: i16, db: i16) -> Rgba {
        let ch = |c: u8, d: i16| (c as i16 + d).clamp(0, 255) as u8;
        Rgba { r: ch(self.r, dr), g: ch(self.g, dg), b: ch(self.b, db), a: self.a }
    }
}

// ── Palette ──────────────────────────────────────────────────────────────────

/// Red rises and green falls monotonically across LOW → MID → HIGH.
pub const LOW: Rgba = Rgba::rgb(40, 220, 120);
pub const MID: Rgba = Rgba::rgb(250, 210, 60);
pub const HIGH: Rgba = Rgba::rgb(255, 30, 30);
pub const WATER: Rgba = Rgba::rgb(52, 120, 196);

/// Tint strength in sRGB channel units.
const TINT_DELTA: i16 = 14;

// ── Diverging ramp ───────────────────────────────────────────────────────────

fn sigmoid(t: f64) -> f64 {
    1.0 / (1.0 + (-2.0 * t).exp())
}

/// Sigmoid pre-warp on a segment parameter `t ∈ [0, 1]`.
///
/// `t` is centred to [−1, 1], passed through `1/(1+e^{−2t})` and renormalised,
/// so 0 ↦ 0 and 1 ↦ 1: the warp never changes which segment applies.
pub fn sigmoid_warp(t: f64) -> f64 {
    let lo = sigmoid(-1.0);
    let hi = sigmoid(1.0);
    ((sigmoid(2.0 * t.clamp(0.0, 1.0) - 1.0) - lo) / (hi - lo)).clamp(0.0, 1.0)
}

/// Map `score ∈ [0, 100]` onto the two-ramp palette split at `breakpoint`.
pub fn diverging(score: f64, breakpoint: f64, warp: bool) -> Rgba {
    let s = score.clamp(0.0, 100.0);
    let bp = breakpoint.clamp(0.0, 100.0);
    let shape = |t: f64| if warp { sigmoid_warp(t) } else { t };
    if s <= bp {
        let t = if bp > 0.0 { s / bp } else { 1.0 };
        LOW.lerp(MID, shape(t))
    } else {
        let t = (s - bp) / (100.0 - bp);
        MID.lerp(HIGH, shape(t))
    }
}

/// Land-use tint. Waterbody replaces the ramp color outright.
pub fn tint(color: Rgba, land_use: LandUse) -> Rgba {
    match land_use {
        LandUse::Waterbody => WATER.with_alpha(color.a),
        LandUse::Urban => color.nudge(TINT_DELTA, 0, -TINT_DELTA),
        LandUse::Rural => color.nudge(-TINT_DELTA, 0, TINT_DELTA),
        LandUse::Suburban => color,
    }
}

/// `base_alpha · (1 − uncertainty · 0.5)`.
pub fn alpha_for(base_alpha: f64, uncertainty: f64) -> f64 {
    (base_alpha * (1.0 - uncertainty.clamp(0.0, 1.0) * 0.5)).clamp(0.0, 1.0)
}

/// Which score a recolor pass paints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorLayer {
    Risk,
    Hazard,
    Exposure,
    Vulnerability,
}

impl ColorLayer {
    pub fn value(self, scores: &RiskScores) -> f64 {
        match self {
            ColorLayer::Risk => scores.total_risk,
            ColorLayer::Hazard => scores.hazard,
            ColorLayer::Exposure => scores.exposure,
            ColorLayer::Vulnerability => scores.vulnerability,
        }
    }
}

impl std::str::FromStr for ColorLayer {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "risk" | "total" => Ok(ColorLayer::Risk),
            "hazard" => Ok(ColorLayer::Hazard),
            "exposure" => Ok(ColorLayer::Exposure),
            "vulnerability" => Ok(ColorLayer::Vulnerability),
            other => Err(format!("unknown color layer `{other}`")),
        }
    }
}

/// Applies [`ColorConfig`] to scores.
#[derive(Debug, Clone, Default)]
pub struct ColorMapper {
    cfg: ColorConfig,
}

impl ColorMapper {
    pub fn new(cfg: ColorConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &ColorConfig {
        &self.cfg
    }

    /// Full per-cell mapping: ramp, tint, alpha.
    pub fn color_for(&self, score: f64, land_use: LandUse, uncertainty: f64) -> Rgba {
        let ramp = diverging(score, self.cfg.breakpoint, self.cfg.sigmoid);
        tint(ramp, land_use).with_alpha(alpha_for(self.cfg.base_alpha, uncertainty))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ramp_hits_anchor_colors() {
        assert_eq!(diverging(0.0, 50.0, false), LOW);
        assert_eq!(diverging(50.0, 50.0, false), MID);
        assert_eq!(diverging(100.0, 50.0, false), HIGH);
    }

    #[test]
    fn red_rises_and_green_falls_with_score() {
        for warp in [false, true] {
            for bp in [30.0, 50.0, 65.0] {
                let mut prev = diverging(0.0, bp, warp);
                for i in 1..=200 {
                    let c = diverging(i as f64 * 0.5, bp, warp);
                    assert!(c.r >= prev.r, "red fell at score {} (bp {bp}, warp {warp})", i as f64 * 0.5);
                    assert!(c.g <= prev.g, "green rose at score {} (bp {bp}, warp {warp})", i as f64 * 0.5);
                    prev = c;
                }
            }
        }
    }

    #[test]
    fn sigmoid_warp_preserves_segment_endpoints() {
        assert!(sigmoid_warp(0.0).abs() < 1e-12);
        assert!((sigmoid_warp(1.0) - 1.0).abs() < 1e-12);
        assert!((sigmoid_warp(0.5) - 0.5).abs() < 1e-12);
        assert_eq!(diverging(50.0, 50.0, true), MID);
    }

    #[test]
    fn sigmoid_warp_is_monotonic() {
        let mut prev = sigmoid_warp(0.0);
        for i in 1..=100 {
            let v = sigmoid_warp(i as f64 / 100.0);
            assert!(v >= prev);
            prev = v;
        }
    }

    #[test]
    fn waterbody_overrides_ramp() {
        let m = ColorMapper::default();
        let a = m.color_for(5.0, LandUse::Waterbody, 0.0);
        let b = m.color_for(99.0, LandUse::Waterbody, 0.0);
        assert_eq!((a.r, a.g, a.b), (WATER.r, WATER.g, WATER.b));
        assert_eq!(a, b);
    }

    #[test]
    fn urban_is_warmer_and_rural_cooler_than_suburban() {
        let m = ColorMapper::default();
        let sub = m.color_for(40.0, LandUse::Suburban, 0.0);
        let urb = m.color_for(40.0, LandUse::Urban, 0.0);
        let rur = m.color_for(40.0, LandUse::Rural, 0.0);
        assert!(urb.r >= sub.r && urb.b <= sub.b);
        assert!(rur.r <= sub.r && rur.b >= sub.b);
    }

    #[test]
    fn alpha_drops_with_uncertainty() {
        assert!((alpha_for(0.8, 0.0) - 0.8).abs() < 1e-12);
        assert!((alpha_for(0.8, 1.0) - 0.4).abs() < 1e-12);
        let m = ColorMapper::default();
        assert!(m.color_for(50.0, LandUse::Rural, 0.9).a < m.color_for(50.0, LandUse::Rural, 0.1).a);
    }

    #[test]
    fn layer_selects_score() {
        let s = RiskScores { hazard: 1.0, exposure: 2.0, vulnerability: 3.0, total_risk: 4.0 };
        assert_eq!(ColorLayer::Hazard.value(&s), 1.0);
        assert_eq!(ColorLayer::Risk.value(&s), 4.0);
        assert_eq!("Exposure".parse::<ColorLayer>().unwrap(), ColorLayer::Exposure);
    }
}
