//! Blending helpers over already-mapped colors. Pure; all blending goes
//! through Lab.
use super::lab::{mix_perceptual, Lab};
use super::Rgba;

/// Smoothstep on [0, 1].
fn smoothstep(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Color at `distance` from a cell center: `center` at 0, `edge` at `radius`
/// and beyond, smoothstep falloff in between.
pub fn radial_blend(center: Rgba, edge: Rgba, distance: f64, radius: f64) -> Rgba {
    if radius <= 0.0 || !radius.is_finite() {
        return edge;
    }
    mix_perceptual(center, edge, smoothstep(distance / radius))
}

/// Pull `own` toward the Lab mean of `neighbors` by `weight ∈ [0, 1]`.
pub fn blend_neighbors(own: Rgba, neighbors: &[Rgba], weight: f64) -> Rgba {
    if neighbors.is_empty() {
        return own;
    }
    let n = neighbors.len() as f64;
    let (mut l, mut a, mut b, mut alpha) = (0.0, 0.0, 0.0, 0.0);
    for c in neighbors {
        let lab = Lab::from_rgba(*c);
        l += lab.l;
        a += lab.a;
        b += lab.b;
        alpha += c.a;
    }
    let mean = Lab { l: l / n, a: a / n, b: b / n }.to_rgba(alpha / n);
    mix_perceptual(own, mean, weight)
}

/// Smooth a whole layer: `neighbors[i]` lists the indices adjacent to cell `i`.
pub fn smooth_layer(colors: &[Rgba], neighbors: &[Vec<usize>], weight: f64) -> Vec<Rgba> {
    colors
        .iter()
        .enumerate()
        .map(|(i, &own)| {
            let adj: Vec<Rgba> = neighbors
                .get(i)
                .map(|idx| idx.iter().filter_map(|&j| colors.get(j).copied()).collect())
                .unwrap_or_default();
            blend_neighbors(own, &adj, weight)
        })
        .collect()
}
