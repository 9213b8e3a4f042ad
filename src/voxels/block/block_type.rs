//! # Block Type Module
//!
//! This module defines the different types of blocks a terrain voxel can hold.

/// Enumerates all possible block types in the terrain.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BlockType {
    /// An air block, which is non-solid and transparent.
    AIR,

    /// A basic dirt block. Every generated terrain column is a dirt block.
    DIRT,

    /// A grass block with different textures on top and sides.
    GRASS,
}

impl BlockType {
    /// Whether the block occupies space and produces geometry.
    pub fn is_solid(self) -> bool {
        self != BlockType::AIR
    }
}
