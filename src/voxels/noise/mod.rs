//! # Terrain Noise
//!
//! Height sources for terrain generation:
//!
//! * [`NoiseField`] - layered coherent noise quantized into integer height levels
//! * [`diamond_square`] - corner-seeded fractal grid built by midpoint displacement

mod diamond_square;
mod noise_field;

pub use diamond_square::{diamond_square, DiamondSquareParams, GridCorners, HeightGrid};
pub use noise_field::{
    NoiseField, CORNER_FREQUENCY, HEIGHT_OCTAVES, HEIGHT_STEP, MAX_HEIGHT_LEVEL,
};
