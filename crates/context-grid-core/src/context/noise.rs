//! Deterministic trigonometric noise fields.
//!
//! Octave sum of sin/cos products: amplitude halves and frequency doubles per
//! octave. No permutation tables and no RNG, so the same coordinates give
//! bit-identical output on every platform with IEEE-754 `sin`/`cos`.
use noise::{NoiseFn, Perlin};

/// Per-octave phase offsets; keep the octaves decorrelated.
const PHASES: [f64; 6] = [0.0, 1.618, 2.718, 4.669, 5.359, 0.577];

pub struct TrigFbm {
    pub octaves: u32,
    /// Field-specific phase shift; distinct fields at the same point differ.
    pub phase: f64,
}

impl TrigFbm {
    /// Two-octave, low-frequency field: coastlines and elevation.
    pub fn macro_field() -> Self {
        Self { octaves: 2, phase: 0.0 }
    }

    /// Four-octave, high-frequency field: rivers and local texture.
    pub fn micro_field() -> Self {
        Self { octaves: 4, phase: 3.3 }
    }

    /// Evaluate at `(x, y)` in noise-space, normalised to [0, 1].
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        let mut value = 0.0f64;
        let mut total = 0.0f64;
        let mut amp = 1.0f64;
        let mut freq = 1.0f64;
        for i in 0..self.octaves as usize {
            let ph = PHASES[i % PHASES.len()] + self.phase;
            let a = (x * freq * 1.7 + ph).sin() * (y * freq * 1.3 + ph * 0.7).cos();
            let b = ((x + y) * freq * 0.9 + ph * 1.3).cos() * ((x - y) * freq * 0.6 - ph).sin();
            value += amp * (0.6 * a + 0.4 * b);
            total += amp;
            amp *= 0.5;
            freq *= 2.0;
        }
        if total == 0.0 {
            return 0.5;
        }
        ((value / total + 1.0) * 0.5).clamp(0.0, 1.0)
    }
}

/// Seeded Perlin remapped to [0, 1]. Used for the urbanization jitter and
/// per-attribute perturbations.
pub struct UnitPerlin {
    perlin: Perlin,
}

impl UnitPerlin {
    pub fn new(seed: u32) -> Self {
        Self { perlin: Perlin::new(seed) }
    }

    pub fn sample(&self, x: f64, y: f64) -> f64 {
        // Perlin has a lattice zero at integer coordinates; nudge off it.
        let v = self.perlin.get([x + 0.317, y + 0.711]);
        ((v + 1.0) * 0.5).clamp(0.0, 1.0)
    }
}
