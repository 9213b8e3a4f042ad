//! Flat vertex, UV and index arrays for one chunk.

use std::sync::{Arc, Weak};

use crate::voxels::{
    block::block_side::BlockSide,
    chunk::{Chunk, ChunkOrigin, Voxel},
};

/// Texture coordinates of a face's four corners, in the corner order of
/// [`BlockSide::corners`]: upper-left, lower-left, lower-right, upper-right.
pub const FACE_UVS: [[f32; 2]; 4] = [[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [1.0, 0.0]];

/// Vertices emitted per face. Vertices are never shared between faces so each face
/// can be textured independently.
pub const VERTICES_PER_FACE: usize = 4;

/// Indices emitted per face (two triangles).
pub const INDICES_PER_FACE: usize = 6;

/// Renderable geometry derived from exactly one chunk.
///
/// The arrays are laid out for direct upload: `positions` holds `x, y, z` triples,
/// `uvs` holds `u, v` pairs, and `indices` refers to vertices by position in those
/// arrays. The mesh keeps a non-owning reference to its chunk.
#[derive(Debug, Clone)]
pub struct ChunkMesh {
    chunk: Weak<Chunk>,
    origin: ChunkOrigin,
    positions: Vec<f32>,
    uvs: Vec<f32>,
    indices: Vec<u32>,
}

impl ChunkMesh {
    /// Builds cube geometry for every solid voxel of `chunk`.
    ///
    /// Each voxel emits the six faces of the unit-cube template, translated by the
    /// voxel's local position plus the chunk origin.
    pub fn build(chunk: &Arc<Chunk>) -> Self {
        let solid = chunk
            .voxels()
            .iter()
            .filter(|voxel| voxel.block_type.is_solid())
            .count();
        let faces = solid * BlockSide::all().len();

        let mut mesh = ChunkMesh {
            chunk: Arc::downgrade(chunk),
            origin: chunk.origin(),
            positions: Vec::with_capacity(faces * VERTICES_PER_FACE * 3),
            uvs: Vec::with_capacity(faces * VERTICES_PER_FACE * 2),
            indices: Vec::with_capacity(faces * INDICES_PER_FACE),
        };

        let offset = chunk.origin_vector();
        let mut num_faces_generated = 0;
        for voxel in chunk.voxels() {
            if !voxel.block_type.is_solid() {
                continue;
            }
            for side in BlockSide::all() {
                mesh.push_face(voxel, side, [offset.x, offset.y, offset.z]);
                mesh.indices
                    .extend_from_slice(&Self::generate_face_indices(num_faces_generated));
                num_faces_generated += 1;
            }
        }

        mesh
    }

    fn push_face(&mut self, voxel: &Voxel, side: BlockSide, origin: [f32; 3]) {
        let local = [
            voxel.position.x as f32,
            voxel.position.y as f32,
            voxel.position.z as f32,
        ];
        for (corner, uv) in side.corners().iter().zip(FACE_UVS.iter()) {
            for axis in 0..3 {
                self.positions.push(corner[axis] + local[axis] + origin[axis]);
            }
            self.uvs.extend_from_slice(uv);
        }
    }

    /// Index data for a face, offset past the vertices of previously generated faces.
    pub fn generate_face_indices(num_faces_generated: u32) -> [u32; INDICES_PER_FACE] {
        let base = num_faces_generated * VERTICES_PER_FACE as u32;
        [base, base + 1, base + 2, base + 2, base + 3, base]
    }

    /// Vertex positions as flat `x, y, z` triples.
    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    /// Texture coordinates as flat `u, v` pairs.
    pub fn uvs(&self) -> &[f32] {
        &self.uvs
    }

    /// Triangle indices into the vertex arrays.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Number of vertices in the mesh.
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Origin of the chunk the mesh was built from.
    pub fn origin(&self) -> ChunkOrigin {
        self.origin
    }

    /// The chunk the mesh was built from, if it is still alive.
    pub fn chunk(&self) -> Option<Arc<Chunk>> {
        self.chunk.upgrade()
    }
}

#[cfg(test)]
mod tests {
    use cgmath::Point3;

    use super::*;
    use crate::voxels::noise::NoiseField;

    fn chunk(origin: Point3<i32>, size: u32) -> Arc<Chunk> {
        Arc::new(Chunk::generate(origin, size, &NoiseField::new(4)))
    }

    #[test]
    fn test_array_lengths() {
        let chunk = chunk(Point3::new(0, 0, 0), 16);
        let mesh = ChunkMesh::build(&chunk);

        let faces = 256 * 6;
        assert_eq!(mesh.vertex_count(), faces * VERTICES_PER_FACE);
        assert_eq!(mesh.positions().len(), faces * VERTICES_PER_FACE * 3);
        assert_eq!(mesh.uvs().len(), faces * VERTICES_PER_FACE * 2);
        assert_eq!(mesh.indices().len(), faces * INDICES_PER_FACE);
    }

    #[test]
    fn test_indices_in_bounds() {
        let mesh = ChunkMesh::build(&chunk(Point3::new(16, 0, 16), 4));
        let vertex_count = mesh.vertex_count() as u32;
        assert!(mesh.indices().iter().all(|&i| i < vertex_count));
        assert_eq!(*mesh.indices().iter().max().unwrap(), vertex_count - 1);
    }

    #[test]
    fn test_first_vertex_is_translated() {
        let origin = Point3::new(-16, 0, 32);
        let chunk = chunk(origin, 2);
        let mesh = ChunkMesh::build(&chunk);

        let voxel = chunk.voxels()[0];
        let corner = BlockSide::FRONT.corners()[0];
        let expected = [
            corner[0] + voxel.position.x as f32 + origin.x as f32,
            corner[1] + voxel.position.y as f32,
            corner[2] + voxel.position.z as f32 + origin.z as f32,
        ];
        assert_eq!(&mesh.positions()[0..3], &expected);
        assert_eq!(&mesh.uvs()[0..2], &FACE_UVS[0]);
    }

    #[test]
    fn test_back_reference_is_non_owning() {
        let chunk = chunk(Point3::new(0, 0, 0), 2);
        let mesh = ChunkMesh::build(&chunk);

        assert_eq!(mesh.chunk().unwrap().origin(), chunk.origin());
        drop(chunk);
        assert!(mesh.chunk().is_none());
        assert_eq!(mesh.origin(), Point3::new(0, 0, 0));
    }

    #[test]
    fn test_face_indices() {
        assert_eq!(ChunkMesh::generate_face_indices(0), [0, 1, 2, 2, 3, 0]);
        assert_eq!(ChunkMesh::generate_face_indices(2), [8, 9, 10, 10, 11, 8]);
    }
}
