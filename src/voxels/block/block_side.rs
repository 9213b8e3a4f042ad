//! # Block Side Module
//!
//! This module defines the six faces of a voxel block and the fixed unit-cube
//! template each face contributes to a chunk mesh.

/// Represents the six possible faces of a voxel block.
///
/// The order is: [FRONT, BACK, TOP, BOTTOM, LEFT, RIGHT]
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug)]
pub enum BlockSide {
    /// The front face (facing positive Z)
    FRONT = 0,

    /// The back face (facing negative Z)
    BACK = 1,

    /// The top face (facing positive Y)
    TOP = 2,

    /// The bottom face (facing negative Y)
    BOTTOM = 3,

    /// The left face (facing negative X)
    LEFT = 4,

    /// The right face (facing positive X)
    RIGHT = 5,
}

/// Half the side length of the unit cube; cube vertices sit at `±HALF_EXTENT`.
const HALF_EXTENT: f32 = 0.5;

impl BlockSide {
    /// Returns an array containing all six block faces in a consistent order.
    pub fn all() -> [BlockSide; 6] {
        [
            BlockSide::FRONT,
            BlockSide::BACK,
            BlockSide::TOP,
            BlockSide::BOTTOM,
            BlockSide::LEFT,
            BlockSide::RIGHT,
        ]
    }

    /// The four corners of this face on a unit cube centered at the origin.
    ///
    /// Corners are listed upper-left, lower-left, lower-right, upper-right as seen
    /// from outside the cube, so `[0, 1, 2, 2, 3, 0]` yields two counter-clockwise
    /// triangles.
    pub fn corners(self) -> [[f32; 3]; 4] {
        let h = HALF_EXTENT;
        match self {
            BlockSide::FRONT => [[-h, h, h], [-h, -h, h], [h, -h, h], [h, h, h]],
            BlockSide::BACK => [[h, h, -h], [h, -h, -h], [-h, -h, -h], [-h, h, -h]],
            BlockSide::TOP => [[-h, h, -h], [-h, h, h], [h, h, h], [h, h, -h]],
            BlockSide::BOTTOM => [[-h, -h, h], [-h, -h, -h], [h, -h, -h], [h, -h, h]],
            BlockSide::LEFT => [[-h, h, -h], [-h, -h, -h], [-h, -h, h], [-h, h, h]],
            BlockSide::RIGHT => [[h, h, h], [h, -h, h], [h, -h, -h], [h, h, -h]],
        }
    }
}
