//! Staggered, interruptible animation of caller-owned polygon handles.
//!
//! The scheduler never owns a frame loop. The host calls [`AnimationScheduler::tick`]
//! from its frame callback and keeps scheduling frames while the report asks for
//! one. Per handle the state machine is Idle → Animating → Completed; a new
//! request for an Animating handle restarts it from its current interpolated
//! state, so the last request always wins.
//!
//! A handle whose reads or writes fail is dropped from the active set on its
//! own. Other entries keep animating.

pub mod easing;

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::color::parse::parse_color_or_neutral;
use crate::color::Rgba;
use crate::config::AnimationConfig;
use crate::coords::BoundaryPoint;
use crate::error::RenderHandleError;

pub use easing::Easing;

/// Stable identity of a renderer polygon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HandleId(pub u64);

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Opaque capability over one rendered polygon.
///
/// Methods take `&self`: handles are shared with the host (typically an
/// `Rc` or a JS object reference) and mutate through interior state.
pub trait PolygonHandle {
    fn id(&self) -> HandleId;
    fn outer_coordinates(&self) -> Result<Vec<BoundaryPoint>, RenderHandleError>;
    fn set_outer_coordinates(&self, ring: Vec<BoundaryPoint>) -> Result<(), RenderHandleError>;
    /// Fill as `rgba(R, G, B[, A])` text.
    fn fill_color(&self) -> Result<String, RenderHandleError>;
    fn set_fill_color(&self, color: &str) -> Result<(), RenderHandleError>;
}

/// What a handle shows: extrusion height and fill (alpha included).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualState {
    pub height_m: f64,
    pub color: Rgba,
}

impl VisualState {
    /// Flat and invisible: the start state of a handle that cannot be read.
    pub const GROUND: VisualState = VisualState { height_m: 0.0, color: Rgba::TRANSPARENT };

    pub fn lerp(self, to: VisualState, t: f64) -> VisualState {
        VisualState {
            height_m: self.height_m + (to.height_m - self.height_m) * t,
            color: self.color.lerp(to.color, t),
        }
    }
}

/// One element of a batch: a handle and the state it should reach.
pub struct AnimationEntry<H> {
    pub handle: H,
    pub target: VisualState,
}

/// One element of a recolor batch; height is held where it is.
pub struct ColorEntry<H> {
    pub handle: H,
    pub color: Rgba,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Animating,
    Completed,
}

/// Outcome of one [`AnimationScheduler::tick`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// False once the active set is empty; the host stops its frame loop.
    pub needs_next_frame: bool,
    /// Handles that reached their target this tick, sorted.
    pub completed: Vec<HandleId>,
    /// Handles removed after a read or write failed, sorted.
    pub dropped: Vec<HandleId>,
}

struct ActiveEntry<H> {
    handle: H,
    /// Ground ring the height is applied to. Empty until successfully read.
    ring: Vec<BoundaryPoint>,
    start: VisualState,
    target: VisualState,
    current: VisualState,
    start_ms: f64,
    duration_ms: f64,
}

impl<H> ActiveEntry<H> {
    fn progress(&self, now_ms: f64) -> f64 {
        if self.duration_ms <= 0.0 {
            return if now_ms >= self.start_ms { 1.0 } else { 0.0 };
        }
        ((now_ms - self.start_ms) / self.duration_ms).clamp(0.0, 1.0)
    }
}

fn apply<H: PolygonHandle>(entry: &mut ActiveEntry<H>, state: VisualState) -> Result<(), RenderHandleError> {
    if entry.ring.is_empty() {
        entry.ring = entry.handle.outer_coordinates()?;
    }
    if !entry.ring.is_empty() {
        let ring = entry.ring.iter().map(|p| p.with_altitude(state.height_m)).collect();
        entry.handle.set_outer_coordinates(ring)?;
    }
    entry.handle.set_fill_color(&state.color.to_string())
}

pub struct AnimationScheduler<H: PolygonHandle> {
    cfg: AnimationConfig,
    easing: Easing,
    active: HashMap<HandleId, ActiveEntry<H>>,
    completed: HashSet<HandleId>,
}

impl<H: PolygonHandle> AnimationScheduler<H> {
    pub fn new(cfg: AnimationConfig) -> Self {
        Self { cfg, easing: Easing::default(), active: HashMap::new(), completed: HashSet::new() }
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn config(&self) -> &AnimationConfig {
        &self.cfg
    }

    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    /// Handles that finished since the last batch started.
    pub fn completed_len(&self) -> usize {
        self.completed.len()
    }

    pub fn phase(&self, id: HandleId) -> Phase {
        if self.active.contains_key(&id) {
            Phase::Animating
        } else if self.completed.contains(&id) {
            Phase::Completed
        } else {
            Phase::Idle
        }
    }

    /// Progress in [0, 1] of an Animating handle; `None` otherwise.
    pub fn progress(&self, id: HandleId, now_ms: f64) -> Option<f64> {
        self.active.get(&id).map(|e| e.progress(now_ms))
    }

    /// Return a Completed handle to Idle.
    pub fn forget(&mut self, id: HandleId) {
        self.completed.remove(&id);
    }

    /// Start state and ground ring for `handle`: the live interpolated state if
    /// it is animating, else what the handle currently shows, else ground.
    fn capture(&self, handle: &H) -> (VisualState, Vec<BoundaryPoint>) {
        let id = handle.id();
        if let Some(active) = self.active.get(&id) {
            return (active.current, active.ring.clone());
        }

        let ring = match handle.outer_coordinates() {
            Ok(ring) => ring,
            Err(err) => {
                tracing::debug!(target: "context_grid::animation", handle = %id, error = %err, "capture.ring_unreadable");
                Vec::new()
            }
        };
        let color = match handle.fill_color() {
            Ok(text) => parse_color_or_neutral(&text),
            Err(err) => {
                tracing::debug!(target: "context_grid::animation", handle = %id, error = %err, "capture.fill_unreadable");
                VisualState::GROUND.color
            }
        };
        let height_m = ring.first().map_or(VisualState::GROUND.height_m, |p| p.altitude);
        (VisualState { height_m, color }, ring)
    }

    fn schedule(&mut self, handle: H, start: VisualState, ring: Vec<BoundaryPoint>, target: VisualState, start_ms: f64, duration_ms: f64) {
        let id = handle.id();
        self.completed.remove(&id);
        self.active.insert(
            id,
            ActiveEntry { handle, ring, start, target, current: start, start_ms, duration_ms },
        );
    }

    /// Animate each entry toward its target; entry `i` starts at
    /// `now_ms + i · stagger_ms`. Returns whether the host should run frames.
    /// Handles completed by earlier batches return to Idle.
    pub fn animate_batch(&mut self, now_ms: f64, entries: Vec<AnimationEntry<H>>) -> bool {
        let n = entries.len();
        self.completed.clear();
        for (i, entry) in entries.into_iter().enumerate() {
            let (start, ring) = self.capture(&entry.handle);
            let start_ms = now_ms + i as f64 * self.cfg.stagger_ms;
            self.schedule(entry.handle, start, ring, entry.target, start_ms, self.cfg.duration_ms);
        }
        tracing::debug!(target: "context_grid::animation", entries = n, active = self.active.len(), "batch.scheduled");
        !self.active.is_empty()
    }

    /// Recolor without moving: height stays at its current value, timing uses
    /// the shorter color duration and stagger.
    pub fn animate_color_transition(&mut self, now_ms: f64, entries: Vec<ColorEntry<H>>) -> bool {
        let n = entries.len();
        self.completed.clear();
        for (i, entry) in entries.into_iter().enumerate() {
            let (start, ring) = self.capture(&entry.handle);
            let target = VisualState { height_m: start.height_m, color: entry.color };
            let start_ms = now_ms + i as f64 * self.cfg.color_stagger_ms;
            self.schedule(entry.handle, start, ring, target, start_ms, self.cfg.color_duration_ms);
        }
        tracing::debug!(target: "context_grid::animation", entries = n, active = self.active.len(), "recolor.scheduled");
        !self.active.is_empty()
    }

    /// Advance every active entry to `now_ms`.
    pub fn tick(&mut self, now_ms: f64) -> TickReport {
        let mut report = TickReport::default();
        let easing = self.easing;

        for (id, entry) in self.active.iter_mut() {
            if now_ms < entry.start_ms {
                continue;
            }
            let progress = entry.progress(now_ms);
            let state = if progress >= 1.0 {
                entry.target
            } else {
                entry.start.lerp(entry.target, easing.apply(progress))
            };
            match apply(entry, state) {
                Ok(()) => {
                    entry.current = state;
                    if progress >= 1.0 {
                        report.completed.push(*id);
                    }
                }
                Err(err) => {
                    tracing::warn!(target: "context_grid::animation", handle = %id, error = %err, "entry.dropped");
                    report.dropped.push(*id);
                }
            }
        }

        for id in &report.completed {
            self.active.remove(id);
            self.completed.insert(*id);
        }
        for id in &report.dropped {
            self.active.remove(id);
        }
        report.completed.sort_unstable();
        report.dropped.sort_unstable();
        report.needs_next_frame = !self.active.is_empty();
        report
    }

    /// Clear every entry immediately. Nothing is reported as completed and
    /// every handle returns to Idle.
    pub fn stop(&mut self) {
        let n = self.active.len();
        self.active.clear();
        self.completed.clear();
        if n > 0 {
            tracing::debug!(target: "context_grid::animation", cleared = n, "scheduler.stopped");
        }
    }
}
