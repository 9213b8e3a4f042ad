//! # Terrain Configuration
//!
//! World parameters passed to [`crate::terrain::TerrainManager::new`]. A configuration
//! can be built in code, starting from [`TerrainConfig::default`], or deserialized from
//! JSON. Missing JSON fields fall back to their defaults.
//!
//! ```
//! use voxel_terrain::config::TerrainConfig;
//!
//! let config = TerrainConfig::from_json_str(r#"{ "chunks_per_axis": 4, "seed": 7 }"#).unwrap();
//! assert_eq!(config.size(), 64);
//! assert_eq!(config.seed, Some(7));
//! ```

use std::path::{Path, PathBuf};

use cgmath::Point3;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Result, TerrainError},
    voxels::noise::DiamondSquareParams,
};

/// Default number of finished chunks the hand-off channel holds before the
/// generation worker backs off.
pub const DEFAULT_PENDING_CAPACITY: usize = 64;

/// Largest accepted chunk side length in blocks.
pub const MAX_CHUNK_SIZE: u32 = 1024;

/// Largest accepted scan window side length in blocks. The fractal grid built over
/// the window holds `(size + 1)^2` values.
pub const MAX_WINDOW_SIZE: u32 = 4096;

/// Largest camera coordinate magnitude on X and Z that maps onto chunk origins.
pub const MAX_WORLD_COORDINATE: f32 = i32::MAX as f32;

/// Whether `camera` is finite and its horizontal coordinates lie within
/// [`MAX_WORLD_COORDINATE`].
pub fn camera_in_range(camera: Point3<f32>) -> bool {
    camera.y.is_finite()
        && [camera.x, camera.z]
            .iter()
            .all(|c| c.is_finite() && c.abs() <= MAX_WORLD_COORDINATE)
}

/// Configuration of a terrain manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Chunks along each axis of the scan window
    pub chunks_per_axis: u32,
    /// Side length of every chunk in blocks
    pub chunk_size: u32,
    /// Reserved. Not read by generation.
    pub plain: bool,
    /// Upload meshes without UVs or texture
    pub wireframe: bool,
    /// Initial camera position
    pub cam_pos: [f32; 3],
    /// Noise seed. Drawn from a random source when absent.
    pub seed: Option<u32>,
    /// Capacity of the channel between the generation worker and `update()`
    pub pending_capacity: usize,
    /// Texture shared by all textured terrain entities
    pub texture_path: PathBuf,
    /// Tunables of the corner-seeded fractal grid
    pub diamond_square: DiamondSquareParams,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        TerrainConfig {
            chunks_per_axis: 8,
            chunk_size: 16,
            plain: false,
            wireframe: false,
            cam_pos: [0.0, 0.0, 0.0],
            seed: None,
            pending_capacity: DEFAULT_PENDING_CAPACITY,
            texture_path: PathBuf::from("textures/dirt.png"),
            diamond_square: DiamondSquareParams::default(),
        }
    }
}

impl TerrainConfig {
    /// Parses and validates a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: TerrainConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| TerrainError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&json)?;
        log::info!("Loaded terrain configuration from {}", path.display());
        Ok(config)
    }

    /// Checks every value against its allowed range.
    ///
    /// # Errors
    /// `TerrainError::InvalidConfig` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.chunks_per_axis == 0 {
            return Err(TerrainError::InvalidConfig("chunks_per_axis must be > 0".into()));
        }
        if self.chunk_size == 0 {
            return Err(TerrainError::InvalidConfig("chunk_size must be > 0".into()));
        }
        if self.chunk_size > MAX_CHUNK_SIZE {
            return Err(TerrainError::InvalidConfig(format!(
                "chunk_size must be <= {}",
                MAX_CHUNK_SIZE
            )));
        }
        if (self.chunks_per_axis as u64) * (self.chunk_size as u64) > MAX_WINDOW_SIZE as u64 {
            return Err(TerrainError::InvalidConfig(format!(
                "chunks_per_axis * chunk_size must be <= {}",
                MAX_WINDOW_SIZE
            )));
        }
        if self.pending_capacity == 0 {
            return Err(TerrainError::InvalidConfig("pending_capacity must be > 0".into()));
        }
        if !camera_in_range(self.cam_point()) {
            return Err(TerrainError::InvalidConfig(
                "cam_pos must be finite and within world coordinates".into(),
            ));
        }

        let params = &self.diamond_square;
        if !(params.max_displacement >= 0.0 && params.max_displacement.is_finite()) {
            return Err(TerrainError::InvalidConfig(
                "diamond_square.max_displacement must be a finite value >= 0".into(),
            ));
        }
        if !(params.decay > 0.0 && params.decay <= 1.0) {
            return Err(TerrainError::InvalidConfig(
                "diamond_square.decay must be in (0, 1]".into(),
            ));
        }
        Ok(())
    }

    /// Side length of the scan window in blocks: `chunks_per_axis * chunk_size`.
    pub fn size(&self) -> u32 {
        self.chunks_per_axis * self.chunk_size
    }

    /// Initial camera position as a point.
    pub fn cam_point(&self) -> Point3<f32> {
        Point3::new(self.cam_pos[0], self.cam_pos[1], self.cam_pos[2])
    }
}
