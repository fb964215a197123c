//! Diagnostic visualizer: renders one PNG per color layer of a grid analysis
//! to data/debug/. Cells are drawn on the planar lattice, softened toward
//! their neighbours and outlined.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rayon::prelude::*;

use context_grid_core::color::blend::{radial_blend, smooth_layer};
use context_grid_core::color::{ColorLayer, Rgba};
use context_grid_core::context::scenario::Scenario;
use context_grid_core::grid::{neighbor_indices, Scale, ScaleParams};
use context_grid_core::region::StaticRegionTable;
use context_grid_core::{AnalysisRequest, GridEngine};

const BACKGROUND: [u8; 3] = [18, 22, 30];
const OUTLINE: [u8; 3] = [10, 10, 14];
const LAYERS: [(ColorLayer, &str); 4] = [
    (ColorLayer::Risk, "risk"),
    (ColorLayer::Hazard, "hazard"),
    (ColorLayer::Exposure, "exposure"),
    (ColorLayer::Vulnerability, "vulnerability"),
];

#[derive(Parser, Debug)]
#[command(name = "visualize", about = "Render grid analysis layers to PNG")]
struct Args {
    /// Region name from the builtin table.
    #[arg(default_value = "Bangkok")]
    region: String,

    #[arg(short, long, default_value = "city")]
    scale: Scale,

    #[arg(long, default_value = "SSP2-4.5")]
    scenario: Scenario,

    #[arg(short, long, default_value_t = 0)]
    year_offset: i32,

    /// Output image width in pixels; height follows the grid aspect.
    #[arg(short, long, default_value_t = 1024)]
    width: u32,

    /// Pull of each cell's rim toward its neighbours' mean color, 0–1.
    #[arg(long, default_value_t = 0.5)]
    smooth: f64,

    #[arg(short, long, default_value = "data/debug")]
    out: PathBuf,
}

// ── Lattice geometry ─────────────────────────────────────────────────────────

/// Pixel ↔ metre mapping over the grid's planar extent.
struct Frame {
    min_x: f64,
    max_y: f64,
    m_per_px: f64,
    width: u32,
    height: u32,
}

impl Frame {
    fn new(p: &ScaleParams, width: u32) -> Self {
        let half_w = p.grid_width as f64 * p.dx() + p.dx();
        let half_h = p.grid_height as f64 * p.dy() + p.radius_m;
        let m_per_px = 2.0 * half_w / width as f64;
        let height = (2.0 * half_h / m_per_px).ceil() as u32;
        Self { min_x: -half_w, max_y: half_h, m_per_px, width, height }
    }

    fn to_metres(&self, col: u32, row: u32) -> (f64, f64) {
        (
            self.min_x + (col as f64 + 0.5) * self.m_per_px,
            self.max_y - (row as f64 + 0.5) * self.m_per_px,
        )
    }
}

/// Lattice cell containing `(x, y)` with the offset from its center.
fn locate(x: f64, y: f64, p: &ScaleParams) -> Option<(usize, f64, f64)> {
    let cols = 2 * p.grid_width + 1;
    let r0 = (y / p.dy()).round() as i32;
    let mut best: Option<(usize, f64, f64, f64)> = None;
    for r in (r0 - 1)..=(r0 + 1) {
        if r.abs() > p.grid_height {
            continue;
        }
        let shift = if r.abs() % 2 == 1 { p.dx() / 2.0 } else { 0.0 };
        let q0 = ((x - shift) / p.dx()).round() as i32;
        for q in (q0 - 1)..=(q0 + 1) {
            if q.abs() > p.grid_width {
                continue;
            }
            let (ox, oy) = (x - (q as f64 * p.dx() + shift), y - r as f64 * p.dy());
            let d2 = ox * ox + oy * oy;
            if best.map_or(true, |b| d2 < b.3) {
                let idx = ((r + p.grid_height) * cols + (q + p.grid_width)) as usize;
                best = Some((idx, ox, oy, d2));
            }
        }
    }
    best.map(|(i, ox, oy, _)| (i, ox, oy))
}

/// Signed distance (metres) inside a pointy-top hexagon of circumradius `r`;
/// negative outside.
fn hex_margin(ox: f64, oy: f64, r: f64) -> f64 {
    let (ax, ay) = (ox.abs(), oy.abs());
    let half_sqrt3 = 3f64.sqrt() / 2.0;
    let side = r * half_sqrt3 - ax;
    let slant = (r - ay - ax / 3f64.sqrt()) * half_sqrt3;
    side.min(slant)
}

fn composite(c: Rgba) -> [u8; 3] {
    let mix = |fg: u8, bg: u8| (fg as f64 * c.a + bg as f64 * (1.0 - c.a)).round() as u8;
    [mix(c.r, BACKGROUND[0]), mix(c.g, BACKGROUND[1]), mix(c.b, BACKGROUND[2])]
}

fn render(frame: &Frame, p: &ScaleParams, centers: &[Rgba], rims: &[Rgba]) -> image::RgbImage {
    let outline_m = 1.2 * frame.m_per_px;
    let rows: Vec<Vec<[u8; 3]>> = (0..frame.height)
        .into_par_iter()
        .map(|row| {
            (0..frame.width)
                .map(|col| {
                    let (x, y) = frame.to_metres(col, row);
                    match locate(x, y, p) {
                        Some((i, ox, oy)) => {
                            let margin = hex_margin(ox, oy, p.radius_m);
                            if margin < 0.0 {
                                BACKGROUND
                            } else if margin < outline_m {
                                OUTLINE
                            } else {
                                let d = (ox * ox + oy * oy).sqrt();
                                composite(radial_blend(centers[i], rims[i], d, p.radius_m))
                            }
                        }
                        None => BACKGROUND,
                    }
                })
                .collect()
        })
        .collect();

    let mut img = image::RgbImage::new(frame.width, frame.height);
    for (row, pixels) in rows.iter().enumerate() {
        for (col, px) in pixels.iter().enumerate() {
            img.put_pixel(col as u32, row as u32, image::Rgb(*px));
        }
    }
    img
}

// ── Entry point ──────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let args = Args::parse();
    let engine = GridEngine::from_env();
    let request = AnalysisRequest::new(args.region.clone())
        .with_scale(args.scale)
        .with_scenario(args.scenario, args.year_offset);

    println!("Analyzing {} ({} scale)…", request.region_name, args.scale.as_str());
    let outcome = engine
        .analyze(&request, &StaticRegionTable::builtin())
        .with_context(|| format!("analyzing `{}`", request.region_name))?;
    println!("{}", outcome.digest);

    let p = args.scale.params();
    let frame = Frame::new(&p, args.width);
    let neighbors = neighbor_indices(args.scale);
    fs::create_dir_all(&args.out).with_context(|| format!("creating {}", args.out.display()))?;

    let slug = request.region_name.to_lowercase().replace(' ', "_");
    for (layer, name) in LAYERS {
        let centers = engine.layer_colors(&outcome.analysis, layer);
        let rims = smooth_layer(&centers, &neighbors, args.smooth.clamp(0.0, 1.0));
        let img = render(&frame, &p, &centers, &rims);

        let path = args.out.join(format!("{slug}_{}_{name}.png", args.scale.as_str()));
        img.save(&path).with_context(|| format!("writing {}", path.display()))?;
        println!("Wrote {}", path.display());
    }

    println!("Done.");
    Ok(())
}
