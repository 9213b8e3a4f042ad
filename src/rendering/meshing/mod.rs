//! Mesh generation for terrain chunks.
//!
//! Converts a chunk's voxels into the flat position, UV and index arrays handed to
//! the mesh upload boundary.
//!
//! # Usage
//! ```
//! use std::sync::Arc;
//! use cgmath::Point3;
//! use voxel_terrain::{
//!     rendering::meshing::ChunkMesh,
//!     voxels::{chunk::Chunk, noise::NoiseField},
//! };
//!
//! let chunk = Arc::new(Chunk::generate(Point3::new(0, 0, 0), 4, &NoiseField::new(0)));
//! let mesh = ChunkMesh::build(&chunk);
//! assert_eq!(mesh.indices().len(), 16 * 6 * 6);
//! ```

mod chunk_mesh;

pub use chunk_mesh::*;
