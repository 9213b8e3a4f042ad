//! # Noise Field
//!
//! Deterministic height sampling from world coordinates.
//!
//! The primary generator sums three octaves of 2D simplex noise, normalizes the
//! sum to `[0, 1]` and quantizes it into one of seventeen integer height levels.
//! A second, single-octave perlin source is used to seed the corners of the
//! fractal grid (see `diamond_square`).

use noise::{NoiseFn, Perlin, Simplex};

/// Octaves of the primary height generator as `(frequency, weight)` pairs.
pub const HEIGHT_OCTAVES: [(f64, f64); 3] = [(0.01, 1.0), (0.02, 0.5), (0.04, 0.25)];

/// Width of one quantized height level in normalized noise space (1/16).
pub const HEIGHT_STEP: f64 = 0.0625;

/// Highest height level a column can have. Levels range over `0..=MAX_HEIGHT_LEVEL`.
pub const MAX_HEIGHT_LEVEL: u32 = 16;

/// Frequency of the single-octave corner sampler.
pub const CORNER_FREQUENCY: f64 = 0.01;

/// A seeded, deterministic scalar height field.
///
/// The seed is fixed at construction. Every sampling method is a pure function of
/// `(x, z, seed)`, so two fields built with the same seed always agree.
///
/// # Examples
///
/// ```
/// use voxel_terrain::voxels::noise::NoiseField;
///
/// let a = NoiseField::new(42);
/// let b = NoiseField::new(42);
/// assert_eq!(a.height_level(10, 10), b.height_level(10, 10));
/// assert!(a.height_level(10, 10) <= 16);
/// ```
#[derive(Clone)]
pub struct NoiseField {
    seed: u32,
    simplex: Simplex,
    perlin: Perlin,
}

impl NoiseField {
    /// Creates a noise field with a fixed seed.
    pub fn new(seed: u32) -> Self {
        NoiseField {
            seed,
            simplex: Simplex::new(seed),
            perlin: Perlin::new(seed),
        }
    }

    /// Creates a noise field seeded from the process-wide random source.
    pub fn from_entropy() -> Self {
        Self::new(fastrand::u32(..))
    }

    /// The seed this field was constructed with.
    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Raw three-octave sum at a world position. Nominally in `[-1.75, 1.75]`.
    pub fn octave_sum(&self, x: f64, z: f64) -> f64 {
        HEIGHT_OCTAVES
            .iter()
            .map(|&(frequency, weight)| weight * self.simplex.get([frequency * x, frequency * z]))
            .sum()
    }

    /// Height level of the column at world position `(x, z)`.
    ///
    /// The octave sum is normalized with `k = (1 + sum) / 2` and quantized to
    /// `round(k / HEIGHT_STEP)`. The layered sum can overshoot `[-1, 1]`, so the
    /// level is clamped to `0..=MAX_HEIGHT_LEVEL`.
    pub fn height_level(&self, x: i64, z: i64) -> u32 {
        let k = (1.0 + self.octave_sum(x as f64, z as f64)) / 2.0;
        let level = (k / HEIGHT_STEP).round();
        level.clamp(0.0, MAX_HEIGHT_LEVEL as f64) as u32
    }

    /// Single-octave sample used to seed fractal grid corners. In `[-1, 1]`.
    pub fn corner_sample(&self, x: i64, z: i64) -> f32 {
        self.perlin
            .get([CORNER_FREQUENCY * x as f64, CORNER_FREQUENCY * z as f64])
            .clamp(-1.0, 1.0) as f32
    }
}

impl std::fmt::Debug for NoiseField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoiseField").field("seed", &self.seed).finish()
    }
}
