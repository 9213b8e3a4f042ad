//! # Corner-Seeded Fractal Grid
//!
//! Midpoint-displacement ("diamond-square") generation of an `(N+1)×(N+1)` height
//! grid from four seeded corner values.
//!
//! ## Algorithm
//!
//! The grid is refined level by level. Each level holds a set of rectangular
//! regions, starting with the whole grid:
//!
//! 1. **Diamond step**: every region at least two cells wide and tall gets its center
//!    set to the average of its four corners plus a random displacement.
//! 2. **Square step**: every edge midpoint that is not yet known is set to the average
//!    of its two edge endpoints and the centers on either side of the edge, plus the
//!    same displacement.
//! 3. Each region is split at its midpoints and the next level begins with the
//!    displacement amplitude multiplied by `decay`.
//!
//! Refinement stops once every region is one cell across, at which point every grid
//! point is known. Sides that are not powers of two are split unevenly.
//!
//! ## Boundary Policy
//!
//! Neighbors are **clamped**, never wrapped. An edge midpoint on the border of the grid
//! has no center on its outer side; that neighbor is dropped and the average is taken
//! over the neighbors that exist inside the grid.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TerrainError};

use super::NoiseField;

/// Tunables for the fractal grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiamondSquareParams {
    /// Largest absolute displacement applied at depth 0.
    pub max_displacement: f32,
    /// Factor applied to the displacement amplitude at each deeper level.
    pub decay: f32,
    /// Seed of the displacement random source.
    pub seed: u64,
}

impl Default for DiamondSquareParams {
    fn default() -> Self {
        DiamondSquareParams {
            max_displacement: 1.0,
            decay: 0.5,
            seed: 0,
        }
    }
}

impl DiamondSquareParams {
    /// Displacement amplitude used at the given recursion depth.
    pub fn amplitude_at(&self, depth: u32) -> f32 {
        self.max_displacement * self.decay.powi(depth as i32)
    }
}

/// The four seeded corner values of a grid.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GridCorners {
    /// Value at row 0, column 0
    pub top_left: f32,
    /// Value at row 0, column N
    pub top_right: f32,
    /// Value at row N, column 0
    pub bottom_left: f32,
    /// Value at row N, column N
    pub bottom_right: f32,
}

impl GridCorners {
    /// All four corners set to the same value.
    pub fn uniform(value: f32) -> Self {
        GridCorners {
            top_left: value,
            top_right: value,
            bottom_left: value,
            bottom_right: value,
        }
    }

    /// Seeds corners from single-octave noise at the world-space corners of a square
    /// window of `size` blocks whose top-left corner is `(x0, z0)`.
    ///
    /// Rows run along +Z and columns along +X.
    pub fn from_noise(field: &NoiseField, x0: i64, z0: i64, size: usize) -> Self {
        let x1 = x0 + size as i64;
        let z1 = z0 + size as i64;
        GridCorners {
            top_left: field.corner_sample(x0, z0),
            top_right: field.corner_sample(x1, z0),
            bottom_left: field.corner_sample(x0, z1),
            bottom_right: field.corner_sample(x1, z1),
        }
    }
}

/// A square grid of `(size + 1)²` height values stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightGrid {
    size: usize,
    values: Vec<f32>,
}

impl HeightGrid {
    fn zeroed(size: usize) -> Self {
        HeightGrid {
            size,
            values: vec![0.0; (size + 1) * (size + 1)],
        }
    }

    /// Number of cells along each side (`N`).
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of points along each side (`N + 1`).
    pub fn side(&self) -> usize {
        self.size + 1
    }

    /// Value at `(row, col)`, or `None` when out of bounds.
    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row > self.size || col > self.size {
            return None;
        }
        Some(self.values[self.index(row, col)])
    }

    /// Rows of the grid, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
        self.values.chunks(self.side())
    }

    /// The four corner values of the grid.
    pub fn corners(&self) -> GridCorners {
        let n = self.size;
        GridCorners {
            top_left: self.values[self.index(0, 0)],
            top_right: self.values[self.index(0, n)],
            bottom_left: self.values[self.index(n, 0)],
            bottom_right: self.values[self.index(n, n)],
        }
    }

    fn index(&self, row: usize, col: usize) -> usize {
        row * self.side() + col
    }
}

/// A rectangular region of the grid, inclusive on all four edges.
#[derive(Debug, Clone, Copy)]
struct Region {
    x0: usize,
    z0: usize,
    x1: usize,
    z1: usize,
}

impl Region {
    fn mid_x(&self) -> Option<usize> {
        (self.x1 - self.x0 >= 2).then(|| self.x0 + (self.x1 - self.x0) / 2)
    }

    fn mid_z(&self) -> Option<usize> {
        (self.z1 - self.z0 >= 2).then(|| self.z0 + (self.z1 - self.z0) / 2)
    }

    fn split(&self) -> Vec<Region> {
        let xs = match self.mid_x() {
            Some(mx) => vec![(self.x0, mx), (mx, self.x1)],
            None => vec![(self.x0, self.x1)],
        };
        let zs = match self.mid_z() {
            Some(mz) => vec![(self.z0, mz), (mz, self.z1)],
            None => vec![(self.z0, self.z1)],
        };
        if xs.len() == 1 && zs.len() == 1 {
            return Vec::new();
        }

        let mut regions = Vec::with_capacity(xs.len() * zs.len());
        for &(z0, z1) in &zs {
            for &(x0, x1) in &xs {
                regions.push(Region { x0, z0, x1, z1 });
            }
        }
        regions
    }
}

/// Working state of one diamond-square run.
struct Refinement {
    grid: HeightGrid,
    known: Vec<bool>,
    rng: fastrand::Rng,
}

impl Refinement {
    fn is_known(&self, row: i64, col: i64) -> bool {
        let n = self.grid.size as i64;
        if row < 0 || col < 0 || row > n || col > n {
            return false;
        }
        self.known[self.grid.index(row as usize, col as usize)]
    }

    fn value(&self, row: usize, col: usize) -> f32 {
        self.grid.values[self.grid.index(row, col)]
    }

    fn set(&mut self, row: usize, col: usize, value: f32) {
        let index = self.grid.index(row, col);
        self.grid.values[index] = value;
        self.known[index] = true;
    }

    fn displacement(&mut self, amplitude: f32) -> f32 {
        (self.rng.f32() * 2.0 - 1.0) * amplitude
    }

    /// Averages the known points among `candidates`; out-of-grid points are dropped.
    fn clamped_average(&self, candidates: &[(i64, i64)]) -> f32 {
        let mut sum = 0.0;
        let mut count = 0;
        for &(row, col) in candidates {
            if self.is_known(row, col) {
                sum += self.value(row as usize, col as usize);
                count += 1;
            }
        }
        if count == 0 {
            0.0
        } else {
            sum / count as f32
        }
    }

    fn diamond_step(&mut self, region: &Region, amplitude: f32) {
        let (Some(mx), Some(mz)) = (region.mid_x(), region.mid_z()) else {
            return;
        };
        let average = (self.value(region.z0, region.x0)
            + self.value(region.z0, region.x1)
            + self.value(region.z1, region.x0)
            + self.value(region.z1, region.x1))
            / 4.0;
        let value = average + self.displacement(amplitude);
        self.set(mz, mx, value);
    }

    fn square_step(&mut self, region: &Region, amplitude: f32) {
        if let Some(mx) = region.mid_x() {
            let reach = region.mid_z().map(|mz| (mz - region.z0) as i64);
            for row in [region.z0, region.z1] {
                self.edge_midpoint(row, mx, (row, region.x0), (row, region.x1), reach, true, amplitude);
            }
        }
        if let Some(mz) = region.mid_z() {
            let reach = region.mid_x().map(|mx| (mx - region.x0) as i64);
            for col in [region.x0, region.x1] {
                self.edge_midpoint(mz, col, (region.z0, col), (region.z1, col), reach, false, amplitude);
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn edge_midpoint(
        &mut self,
        row: usize,
        col: usize,
        end_a: (usize, usize),
        end_b: (usize, usize),
        reach: Option<i64>,
        horizontal_edge: bool,
        amplitude: f32,
    ) {
        if self.is_known(row as i64, col as i64) {
            return;
        }

        let (r, c) = (row as i64, col as i64);
        let mut candidates = vec![
            (end_a.0 as i64, end_a.1 as i64),
            (end_b.0 as i64, end_b.1 as i64),
        ];
        if let Some(d) = reach {
            if horizontal_edge {
                candidates.push((r - d, c));
                candidates.push((r + d, c));
            } else {
                candidates.push((r, c - d));
                candidates.push((r, c + d));
            }
        }

        let value = self.clamped_average(&candidates) + self.displacement(amplitude);
        self.set(row, col, value);
    }
}

/// Runs the corner-seeded fractal grid algorithm on an `(size+1)×(size+1)` grid.
///
/// The four corners of the result are exactly the seeded `corners`. Every other point
/// is derived by midpoint displacement whose amplitude starts at
/// `params.max_displacement` and shrinks by `params.decay` per level. The result is
/// deterministic for a given `params.seed`.
///
/// # Errors
/// Returns `TerrainError::EmptyGrid` when `size` is zero.
///
/// # Examples
///
/// ```
/// use voxel_terrain::voxels::noise::{diamond_square, DiamondSquareParams, GridCorners};
///
/// let grid = diamond_square(4, GridCorners::uniform(1.0), &DiamondSquareParams::default()).unwrap();
/// assert_eq!(grid.side(), 5);
/// assert_eq!(grid.corners(), GridCorners::uniform(1.0));
/// ```
pub fn diamond_square(
    size: usize,
    corners: GridCorners,
    params: &DiamondSquareParams,
) -> Result<HeightGrid> {
    if size == 0 {
        return Err(TerrainError::EmptyGrid);
    }

    let grid = HeightGrid::zeroed(size);
    let known = vec![false; grid.values.len()];
    let mut state = Refinement {
        grid,
        known,
        rng: fastrand::Rng::with_seed(params.seed),
    };

    state.set(0, 0, corners.top_left);
    state.set(0, size, corners.top_right);
    state.set(size, 0, corners.bottom_left);
    state.set(size, size, corners.bottom_right);

    let mut regions = vec![Region {
        x0: 0,
        z0: 0,
        x1: size,
        z1: size,
    }];
    let mut depth = 0;

    while !regions.is_empty() {
        let amplitude = params.amplitude_at(depth);
        for region in &regions {
            state.diamond_step(region, amplitude);
        }
        for region in &regions {
            state.square_step(region, amplitude);
        }
        regions = regions.iter().flat_map(Region::split).collect();
        depth += 1;
    }

    Ok(state.grid)
}
