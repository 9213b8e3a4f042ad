//! # Voxel Terrain Data
//!
//! This module contains the voxel data model and the height sources it is built from.
//!
//! ## Architecture
//!
//! * **Noise**: Deterministic height sampling and the corner-seeded fractal grid
//! * **Block**: Block types and the unit-cube face template
//! * **Chunk**: Fixed-size squares of terrain columns, built once and never modified
//!
//! ## Thread Safety
//!
//! Everything here is immutable after construction. Chunks are shared between the
//! generation worker and the consumer thread behind `Arc` without further locking.

pub mod block;
pub mod chunk;
pub mod noise;
