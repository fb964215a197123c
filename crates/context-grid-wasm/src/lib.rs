//! Browser bindings for the grid engine.
//!
//! Polygons handed to [`GridAnimator`] are plain JS objects exposing `id`
//! (number), `outerCoordinates` (array of `{lat, lon, altitude}`) and
//! `fillColor` (`rgba(...)` string), the shape of a 3D map polygon element.

use js_sys::{Array, Reflect};
use serde::Serialize;
use wasm_bindgen::prelude::*;

use context_grid_core::animation::{AnimationEntry, AnimationScheduler, ColorEntry, HandleId, PolygonHandle, VisualState};
use context_grid_core::color::parse::parse_color_or_neutral;
use context_grid_core::color::ColorMapper;
use context_grid_core::context::land_use::LandUse;
use context_grid_core::error::RenderHandleError;
use context_grid_core::region::StaticRegionTable;
use context_grid_core::{AnalysisOutcome, AnalysisRequest, BoundaryPoint, EngineConfig, GeoPoint, GridEngine};

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&format!("Serialization failed: {e}")))
}

fn run_analysis(request_json: &str, center: Option<GeoPoint>) -> Result<AnalysisOutcome, String> {
    let request: AnalysisRequest =
        serde_json::from_str(request_json).map_err(|e| format!("Invalid request: {e}"))?;
    let engine = GridEngine::default();
    match center {
        Some(center) => engine.outcome_at(center, &request),
        None => engine.analyze(&request, &StaticRegionTable::builtin()),
    }
    .map_err(|e| e.to_string())
}

/// Pair handles with fill strings. Unparseable strings become the neutral
/// color so one bad entry does not reject the batch.
fn color_entries<H>(handles: Vec<H>, colors: Vec<String>) -> Result<Vec<ColorEntry<H>>, String> {
    if handles.len() != colors.len() {
        return Err("polygons and colors differ in length".into());
    }
    Ok(handles
        .into_iter()
        .zip(colors)
        .map(|(handle, text)| ColorEntry { handle, color: parse_color_or_neutral(&text) })
        .collect())
}

fn color_text(score: f64, land_use: &str, uncertainty: f64) -> Result<String, String> {
    let land_use: LandUse = land_use.parse()?;
    Ok(ColorMapper::default().color_for(score, land_use, uncertainty).to_string())
}

/// Analyze a region known to the builtin table.
/// `request_json`: `{"regionName", "yearOffset"?, "scenario"?, "scale"?}`.
#[wasm_bindgen]
pub fn analyze(request_json: &str) -> Result<JsValue, JsValue> {
    let outcome = run_analysis(request_json, None).map_err(|e| JsValue::from_str(&e))?;
    to_js(&outcome)
}

/// Analyze around a center the host already geocoded.
#[wasm_bindgen(js_name = analyzeAt)]
pub fn analyze_at(request_json: &str, lat: f64, lon: f64) -> Result<JsValue, JsValue> {
    let outcome = run_analysis(request_json, Some(GeoPoint::new(lat, lon))).map_err(|e| JsValue::from_str(&e))?;
    to_js(&outcome)
}

/// `rgba(...)` fill for a score on the default diverging scale.
#[wasm_bindgen(js_name = colorFor)]
pub fn color_for(score: f64, land_use: &str, uncertainty: f64) -> Result<String, JsValue> {
    color_text(score, land_use, uncertainty).map_err(|e| JsValue::from_str(&e))
}

// ── Polygon handles ──────────────────────────────────────────────────────────

struct JsPolygon {
    id: u64,
    obj: JsValue,
}

impl JsPolygon {
    fn wrap(obj: JsValue) -> Result<Self, JsValue> {
        let id = Reflect::get(&obj, &JsValue::from_str("id"))?
            .as_f64()
            .ok_or_else(|| JsValue::from_str("polygon is missing a numeric `id`"))?;
        Ok(Self { id: id as u64, obj })
    }

    fn rejected(&self, reason: impl ToString) -> RenderHandleError {
        RenderHandleError::Rejected { id: self.id, reason: reason.to_string() }
    }

    fn get(&self, key: &str) -> Result<JsValue, RenderHandleError> {
        let v = Reflect::get(&self.obj, &JsValue::from_str(key)).map_err(|_| RenderHandleError::Detached(self.id))?;
        if v.is_undefined() {
            return Err(self.rejected(format!("`{key}` is undefined")));
        }
        Ok(v)
    }

    fn set(&self, key: &str, value: &JsValue) -> Result<(), RenderHandleError> {
        match Reflect::set(&self.obj, &JsValue::from_str(key), value) {
            Ok(true) => Ok(()),
            Ok(false) => Err(self.rejected(format!("`{key}` is read-only"))),
            Err(_) => Err(RenderHandleError::Detached(self.id)),
        }
    }
}

impl PolygonHandle for JsPolygon {
    fn id(&self) -> HandleId {
        HandleId(self.id)
    }

    fn outer_coordinates(&self) -> Result<Vec<BoundaryPoint>, RenderHandleError> {
        serde_wasm_bindgen::from_value(self.get("outerCoordinates")?).map_err(|e| self.rejected(e))
    }

    fn set_outer_coordinates(&self, ring: Vec<BoundaryPoint>) -> Result<(), RenderHandleError> {
        let value = to_js(&ring).map_err(|_| self.rejected("ring is not serializable"))?;
        self.set("outerCoordinates", &value)
    }

    fn fill_color(&self) -> Result<String, RenderHandleError> {
        self.get("fillColor")?
            .as_string()
            .ok_or_else(|| self.rejected("`fillColor` is not a string"))
    }

    fn set_fill_color(&self, color: &str) -> Result<(), RenderHandleError> {
        self.set("fillColor", &JsValue::from_str(color))
    }
}

fn wrap_all(polygons: &Array) -> Result<Vec<JsPolygon>, JsValue> {
    polygons.iter().map(JsPolygon::wrap).collect()
}

/// Frame-driven animator. Call `tick(performance.now())` from
/// `requestAnimationFrame` while it returns true.
#[wasm_bindgen]
pub struct GridAnimator {
    scheduler: AnimationScheduler<JsPolygon>,
}

impl Default for GridAnimator {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl GridAnimator {
    #[wasm_bindgen(constructor)]
    pub fn new() -> GridAnimator {
        GridAnimator { scheduler: AnimationScheduler::new(EngineConfig::builtin().animation.clone()) }
    }

    /// `targets`: array of `{heightM, color: {r, g, b, a}}`, index-aligned
    /// with `polygons`, as returned in `analyze(...).targets`.
    pub fn animate(&mut self, now_ms: f64, polygons: Array, targets: JsValue) -> Result<bool, JsValue> {
        let targets: Vec<VisualState> = serde_wasm_bindgen::from_value(targets)?;
        let handles = wrap_all(&polygons)?;
        if handles.len() != targets.len() {
            return Err(JsValue::from_str("polygons and targets differ in length"));
        }
        let entries = handles
            .into_iter()
            .zip(targets)
            .map(|(handle, target)| AnimationEntry { handle, target })
            .collect();
        Ok(self.scheduler.animate_batch(now_ms, entries))
    }

    /// Recolor in place; `colors` are `rgba(...)` strings. Unparseable
    /// entries fade to the neutral gray.
    pub fn recolor(&mut self, now_ms: f64, polygons: Array, colors: JsValue) -> Result<bool, JsValue> {
        let colors: Vec<String> = serde_wasm_bindgen::from_value(colors)?;
        let entries = color_entries(wrap_all(&polygons)?, colors).map_err(|e| JsValue::from_str(&e))?;
        Ok(self.scheduler.animate_color_transition(now_ms, entries))
    }

    /// Advance one frame; returns whether another frame is needed.
    pub fn tick(&mut self, now_ms: f64) -> bool {
        self.scheduler.tick(now_ms).needs_next_frame
    }

    pub fn stop(&mut self) {
        self.scheduler.stop();
    }

    #[wasm_bindgen(getter)]
    pub fn active(&self) -> usize {
        self.scheduler.active_len()
    }
}
