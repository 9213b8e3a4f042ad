//! # Chunk Module
//!
//! This module provides the `Chunk` and `Voxel` types: a fixed-size square of terrain
//! columns built once from sampled heights and never modified afterwards.
//!
//! ## Layout
//!
//! A chunk of side `chunk_size` holds exactly `chunk_size²` voxels, one per `(i, j)`
//! column, ordered with `i` (local X) outer and `j` (local Z) inner. A voxel's local
//! position is `(i, height, j)` where `height` is the column's height level.
//!
//! Chunks are identified by their world-space origin, which is always a multiple of
//! `chunk_size` on X and Z and zero on Y.

use cgmath::{Point3, Vector3};

pub use chunk_creation::ChunkCreationIterator;

use super::{block::block_type::BlockType, noise::NoiseField};

mod chunk_creation;

/// World-space origin of a chunk. Unique per chunk.
pub type ChunkOrigin = Point3<i32>;

/// A single discrete block inside a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Voxel {
    /// Position within the chunk: `(i, height, j)`
    pub position: Point3<i32>,
    /// What the block is made of
    pub block_type: BlockType,
}

/// A fixed-size, immutable square of terrain columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    origin: ChunkOrigin,
    chunk_size: u32,
    voxels: Vec<Voxel>,
}

impl Chunk {
    /// Builds the chunk at `origin` by sampling one height per column from `field`.
    ///
    /// Every column gets a single DIRT voxel at its height level.
    ///
    /// # Examples
    ///
    /// ```
    /// use cgmath::Point3;
    /// use voxel_terrain::voxels::{chunk::Chunk, noise::NoiseField};
    ///
    /// let chunk = Chunk::generate(Point3::new(-16, 0, 0), 16, &NoiseField::new(1));
    /// assert_eq!(chunk.voxels().len(), 256);
    /// ```
    pub fn generate(origin: ChunkOrigin, chunk_size: u32, field: &NoiseField) -> Self {
        let mut cci = ChunkCreationIterator::new(origin, chunk_size);

        while let Some((x, z)) = cci.next_column() {
            cci.push_column(field.height_level(x, z), BlockType::DIRT);
        }

        cci.return_chunk()
    }

    /// Origin of the chunk for the grid cell `(cell_x, cell_z)`.
    ///
    /// # Returns
    /// `None` when the origin does not fit in world coordinates.
    pub fn origin_of_cell(cell_x: i64, cell_z: i64, chunk_size: u32) -> Option<ChunkOrigin> {
        let axis = |cell: i64| {
            cell.checked_mul(chunk_size as i64)
                .and_then(|coordinate| i32::try_from(coordinate).ok())
        };
        Some(Point3::new(axis(cell_x)?, 0, axis(cell_z)?))
    }

    /// World-space origin of the chunk.
    pub fn origin(&self) -> ChunkOrigin {
        self.origin
    }

    /// Origin as a real-valued vector, for placing renderables.
    pub fn origin_vector(&self) -> Vector3<f32> {
        Vector3::new(
            self.origin.x as f32,
            self.origin.y as f32,
            self.origin.z as f32,
        )
    }

    /// Side length of the chunk in blocks.
    pub fn chunk_size(&self) -> u32 {
        self.chunk_size
    }

    /// All voxels of the chunk in scan order.
    pub fn voxels(&self) -> &[Voxel] {
        &self.voxels
    }

    /// The voxel of column `(i, j)`, or `None` outside the chunk.
    pub fn column(&self, i: u32, j: u32) -> Option<&Voxel> {
        if i >= self.chunk_size || j >= self.chunk_size {
            return None;
        }
        self.voxels
            .get(i as usize * self.chunk_size as usize + j as usize)
    }
}
