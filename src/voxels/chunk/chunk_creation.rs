//! # Chunk Creation Module
//!
//! A builder that fills a chunk one terrain column at a time, in scan order.
//!
//! Columns are visited with `i` (local X) as the outer loop and `j` (local Z) as the
//! inner loop. Each column contributes exactly one voxel, placed at the sampled height.

use cgmath::Point3;

use crate::voxels::block::block_type::BlockType;

use super::{Chunk, Voxel};

/// A builder for creating and populating a chunk column by column.
///
/// The builder tracks the current `(i, j)` column so callers only supply heights.
/// Pushing more columns than the chunk holds is ignored.
pub struct ChunkCreationIterator {
    /// World-space origin of the chunk being created
    origin: Point3<i32>,
    /// Side length of the chunk in blocks
    chunk_size: u32,
    /// Voxels pushed so far, in scan order
    voxels: Vec<Voxel>,
    /// Current local X column (0..chunk_size)
    local_i: u32,
    /// Current local Z column (0..chunk_size)
    local_j: u32,
}

impl ChunkCreationIterator {
    /// Creates a new builder for a chunk at `origin`.
    pub fn new(origin: Point3<i32>, chunk_size: u32) -> Self {
        ChunkCreationIterator {
            origin,
            chunk_size,
            voxels: Vec::with_capacity(chunk_size as usize * chunk_size as usize),
            local_i: 0,
            local_j: 0,
        }
    }

    /// World-space `(x, z)` of the column the next push will fill, or `None` when full.
    pub fn next_column(&self) -> Option<(i64, i64)> {
        if self.is_full() {
            return None;
        }
        Some((
            self.origin.x as i64 + self.local_i as i64,
            self.origin.z as i64 + self.local_j as i64,
        ))
    }

    /// Whether every column has been filled.
    pub fn is_full(&self) -> bool {
        self.local_i >= self.chunk_size
    }

    /// Places a voxel of `block_type` at `height` in the current column and advances.
    pub fn push_column(&mut self, height: u32, block_type: BlockType) {
        if self.is_full() {
            return;
        }

        self.voxels.push(Voxel {
            position: Point3::new(self.local_i as i32, height as i32, self.local_j as i32),
            block_type,
        });

        self.local_j += 1;
        if self.local_j == self.chunk_size {
            self.local_j = 0;
            self.local_i += 1;
        }
    }

    /// Finalizes the chunk.
    pub fn return_chunk(self) -> Chunk {
        Chunk {
            origin: self.origin,
            chunk_size: self.chunk_size,
            voxels: self.voxels,
        }
    }
}
