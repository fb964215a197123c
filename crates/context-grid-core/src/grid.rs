//! Hexagonal tessellation on a brick-offset lattice.
//!
//! The lattice is planar: offsets are laid out in metres around the grid
//! center and converted to degrees with the equirectangular approximation in
//! [`crate::coords`]. Acceptable at neighborhood and city scale; at region
//! scale the outer rows drift measurably from true hexagons.

use serde::{Deserialize, Serialize};

use crate::coords::{BoundaryPoint, GeoPoint};
use crate::error::GridError;

/// Analysis scale. Selects hex radius and lattice half-extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scale {
    Neighborhood,
    City,
    Region,
}

impl Scale {
    pub fn params(self) -> ScaleParams {
        match self {
            Scale::Neighborhood => ScaleParams { radius_m: 150.0, grid_width: 10, grid_height: 8 },
            Scale::City         => ScaleParams { radius_m: 500.0, grid_width: 12, grid_height: 10 },
            Scale::Region       => ScaleParams { radius_m: 2500.0, grid_width: 9, grid_height: 7 },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Scale::Neighborhood => "neighborhood",
            Scale::City => "city",
            Scale::Region => "region",
        }
    }
}

impl std::str::FromStr for Scale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "neighborhood" | "neighbourhood" => Ok(Scale::Neighborhood),
            "city" => Ok(Scale::City),
            "region" => Ok(Scale::Region),
            other => Err(format!("unknown scale `{other}`")),
        }
    }
}

/// Lattice constants for one [`Scale`].
///
/// `grid_width`/`grid_height` are half-extents: columns run over
/// `[-grid_width, grid_width]`, rows over `[-grid_height, grid_height]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScaleParams {
    pub radius_m: f64,
    pub grid_width: i32,
    pub grid_height: i32,
}

impl ScaleParams {
    /// Horizontal center spacing: radius·√3.
    pub fn dx(&self) -> f64 {
        self.radius_m * 3f64.sqrt()
    }

    /// Vertical center spacing: radius·1.5.
    pub fn dy(&self) -> f64 {
        self.radius_m * 1.5
    }

    /// Total number of lattice points.
    pub fn point_count(&self) -> usize {
        ((2 * self.grid_width + 1) * (2 * self.grid_height + 1)) as usize
    }

    /// Distance in metres from the center to the farthest lattice row/column,
    /// used to normalise per-cell distances into roughly [0, 1].
    pub fn half_extent_m(&self) -> f64 {
        let x = self.grid_width as f64 * self.dx() + self.dx() / 2.0;
        let y = self.grid_height as f64 * self.dy();
        x.max(y)
    }
}

/// Output of [`generate`].
#[derive(Debug, Clone, PartialEq)]
pub struct Tessellation {
    /// Cell centers, row-major from the southernmost row.
    pub points: Vec<GeoPoint>,
    pub hex_radius_m: f64,
}

/// Lay out the cell centers for `scale` around `center`.
///
/// Row r ∈ [−H, H], column q ∈ [−W, W]; odd rows (by |r|) shift east by
/// half a column.
pub fn generate(center: GeoPoint, scale: Scale) -> Result<Tessellation, GridError> {
    let center = center.validate()?;
    let p = scale.params();
    let (dx, dy) = (p.dx(), p.dy());

    let mut points = Vec::with_capacity(p.point_count());
    for r in -p.grid_height..=p.grid_height {
        let shift = if r.abs() % 2 == 1 { dx / 2.0 } else { 0.0 };
        for q in -p.grid_width..=p.grid_width {
            let x = q as f64 * dx + shift;
            let y = r as f64 * dy;
            points.push(center.offset_m(x, y));
        }
    }

    Ok(Tessellation { points, hex_radius_m: p.radius_m })
}

/// Adjacency lists for the points produced by [`generate`] at `scale`.
///
/// Even rows (by |r|) touch columns q−1 and q of the rows above and below;
/// shifted odd rows touch q and q+1.
pub fn neighbor_indices(scale: Scale) -> Vec<Vec<usize>> {
    let p = scale.params();
    let cols = 2 * p.grid_width + 1;
    let index = |r: i32, q: i32| -> Option<usize> {
        if r.abs() > p.grid_height || q.abs() > p.grid_width {
            return None;
        }
        Some(((r + p.grid_height) * cols + (q + p.grid_width)) as usize)
    };

    let mut out = Vec::with_capacity(p.point_count());
    for r in -p.grid_height..=p.grid_height {
        let (lo, hi) = if r.abs() % 2 == 1 { (0, 1) } else { (-1, 0) };
        for q in -p.grid_width..=p.grid_width {
            let candidates = [
                (r, q - 1),
                (r, q + 1),
                (r - 1, q + lo),
                (r - 1, q + hi),
                (r + 1, q + lo),
                (r + 1, q + hi),
            ];
            out.push(candidates.iter().filter_map(|&(rr, qq)| index(rr, qq)).collect());
        }
    }
    out
}

/// Closed pointy-top hexagon ring around `center`: six vertices at 60°
/// increments starting at −30°, with vertex 0 repeated at the end.
pub fn boundary_of(center: GeoPoint, radius_m: f64) -> Result<[BoundaryPoint; 7], GridError> {
    let center = center.validate()?;
    if !radius_m.is_finite() || radius_m <= 0.0 {
        return Err(GridError::InvalidRadius { radius_m });
    }

    let mut ring = [BoundaryPoint::at_ground(center); 7];
    for (i, vertex) in ring.iter_mut().take(6).enumerate() {
        let angle = (60.0 * i as f64 - 30.0).to_radians();
        let p = center.offset_m(radius_m * angle.cos(), radius_m * angle.sin());
        *vertex = BoundaryPoint::at_ground(p);
    }
    ring[6] = ring[0];
    Ok(ring)
}
