//! # Mesh Upload Boundary
//!
//! The terrain subsystem never talks to a graphics API directly. Finished meshes and
//! the block texture go through the [`MeshUploader`] trait, which returns opaque
//! handles that entities and the renderer refer to.
//!
//! [`CpuUploader`] is a headless implementation: it validates mesh arrays, decodes
//! textures with the `image` crate and keeps byte accounting, without a GPU. It backs
//! the demo loop and the tests.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use crate::error::{Result, TerrainError};

/// Opaque identifier of an uploaded texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

/// Opaque handle of an uploaded model.
///
/// Two handles are equal exactly when they refer to the same uploaded model, which
/// makes the handle usable as a draw-batching key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModelHandle {
    /// Identifier assigned by the uploader
    pub id: u32,
    /// Number of indices to draw
    pub vertex_count: u32,
    /// Texture bound to the model, if any
    pub texture: Option<TextureId>,
}

impl ModelHandle {
    /// Returns the same model with `texture` bound to it.
    pub fn with_texture(self, texture: Option<TextureId>) -> Self {
        ModelHandle { texture, ..self }
    }
}

/// The external mesh and texture upload interface.
pub trait MeshUploader {
    /// Uploads a mesh. `uvs` is empty for untextured (wireframe) models.
    fn upload_model(&mut self, positions: &[f32], uvs: &[f32], indices: &[u32]) -> Result<ModelHandle>;

    /// Uploads the image at `path` as a texture.
    ///
    /// # Errors
    /// `TerrainError::ImageLoad` when the image is missing or corrupt.
    fn upload_texture(&mut self, path: &Path) -> Result<TextureId>;
}

/// Record of one texture held by a [`CpuUploader`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureRecord {
    /// Where the texture was loaded from
    pub path: PathBuf,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

/// Headless uploader that keeps mesh data on the CPU.
#[derive(Debug, Default)]
pub struct CpuUploader {
    next_model_id: u32,
    next_texture_id: u32,
    textures: HashMap<TextureId, TextureRecord>,
    uploaded_bytes: usize,
}

impl CpuUploader {
    /// Creates an empty uploader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of models uploaded so far.
    pub fn model_count(&self) -> u32 {
        self.next_model_id
    }

    /// Total bytes of vertex and index data accepted so far.
    pub fn uploaded_bytes(&self) -> usize {
        self.uploaded_bytes
    }

    /// Metadata of an uploaded texture.
    pub fn texture(&self, id: TextureId) -> Option<&TextureRecord> {
        self.textures.get(&id)
    }
}

impl MeshUploader for CpuUploader {
    fn upload_model(&mut self, positions: &[f32], uvs: &[f32], indices: &[u32]) -> Result<ModelHandle> {
        if positions.len() % 3 != 0 {
            return Err(TerrainError::MeshUpload(format!(
                "position array length {} is not a multiple of 3",
                positions.len()
            )));
        }
        let vertices = positions.len() / 3;
        if !uvs.is_empty() && uvs.len() != vertices * 2 {
            return Err(TerrainError::MeshUpload(format!(
                "{} uv values for {} vertices",
                uvs.len(),
                vertices
            )));
        }
        if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertices) {
            return Err(TerrainError::MeshUpload(format!(
                "index {} out of range for {} vertices",
                index, vertices
            )));
        }

        self.uploaded_bytes += bytemuck::cast_slice::<f32, u8>(positions).len()
            + bytemuck::cast_slice::<f32, u8>(uvs).len()
            + bytemuck::cast_slice::<u32, u8>(indices).len();

        let id = self.next_model_id;
        self.next_model_id += 1;
        Ok(ModelHandle {
            id,
            vertex_count: indices.len() as u32,
            texture: None,
        })
    }

    fn upload_texture(&mut self, path: &Path) -> Result<TextureId> {
        let image = image::open(path).map_err(|source| TerrainError::ImageLoad {
            path: path.to_path_buf(),
            source,
        })?;
        let rgba = image.to_rgba8();
        self.uploaded_bytes += rgba.as_raw().len();

        let id = TextureId(self.next_texture_id);
        self.next_texture_id += 1;
        self.textures.insert(
            id,
            TextureRecord {
                path: path.to_path_buf(),
                width: rgba.width(),
                height: rgba.height(),
            },
        );
        log::debug!("Loaded texture {} as {:?}", path.display(), id);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("voxel-terrain-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_model_ids_are_sequential() {
        let mut uploader = CpuUploader::new();
        let positions = [0.0; 9];
        let a = uploader.upload_model(&positions, &[], &[0, 1, 2]).unwrap();
        let b = uploader.upload_model(&positions, &[0.0; 6], &[2, 1, 0]).unwrap();

        assert_eq!(a.id, 0);
        assert_eq!(b.id, 1);
        assert_eq!(a.vertex_count, 3);
        assert_eq!(uploader.model_count(), 2);
        assert_eq!(uploader.uploaded_bytes(), 36 + 12 + 36 + 24 + 12);
    }

    #[test]
    fn test_rejects_bad_index() {
        let mut uploader = CpuUploader::new();
        let result = uploader.upload_model(&[0.0; 6], &[], &[0, 1, 2]);
        assert!(matches!(result, Err(TerrainError::MeshUpload(_))));
    }

    #[test]
    fn test_rejects_mismatched_uvs() {
        let mut uploader = CpuUploader::new();
        let result = uploader.upload_model(&[0.0; 6], &[0.0; 3], &[0, 1]);
        assert!(matches!(result, Err(TerrainError::MeshUpload(_))));
    }

    #[test]
    fn test_missing_texture_is_image_load_error() {
        let mut uploader = CpuUploader::new();
        let result = uploader.upload_texture(Path::new("does/not/exist.png"));
        assert!(matches!(result, Err(TerrainError::ImageLoad { .. })));
    }

    #[test]
    fn test_corrupt_texture_is_image_load_error() {
        let path = scratch_path("corrupt.png");
        std::fs::write(&path, b"definitely not a png").unwrap();

        let mut uploader = CpuUploader::new();
        let result = uploader.upload_texture(&path);
        std::fs::remove_file(&path).ok();

        assert!(matches!(result, Err(TerrainError::ImageLoad { .. })));
    }

    #[test]
    fn test_texture_upload() {
        let path = scratch_path("dirt.png");
        image::RgbaImage::from_pixel(4, 2, image::Rgba([120, 80, 40, 255]))
            .save(&path)
            .unwrap();

        let mut uploader = CpuUploader::new();
        let id = uploader.upload_texture(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let record = uploader.texture(id).unwrap();
        assert_eq!((record.width, record.height), (4, 2));
        assert_eq!(uploader.uploaded_bytes(), 4 * 2 * 4);
    }

    #[test]
    fn test_with_texture() {
        let handle = ModelHandle {
            id: 3,
            vertex_count: 6,
            texture: None,
        };
        assert_eq!(handle.with_texture(Some(TextureId(1))).texture, Some(TextureId(1)));
    }
}
