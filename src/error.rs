//! # Error Types
//!
//! A single error enum covers every fallible boundary of the terrain subsystem.
//! Noise sampling, chunk construction and mesh building are pure and never fail;
//! errors only arise from configuration, the upload boundary, grid parameters and
//! worker thread creation.

use std::{io, path::PathBuf};

use thiserror::Error;

/// Errors produced by the terrain subsystem.
#[derive(Debug, Error)]
pub enum TerrainError {
    /// A configuration value is out of its allowed range.
    #[error("invalid terrain configuration: {0}")]
    InvalidConfig(String),

    /// A configuration file could not be read.
    #[error("failed to read configuration file {path}")]
    ConfigIo {
        /// The file that was being read
        path: PathBuf,
        /// The underlying I/O failure
        #[source]
        source: io::Error,
    },

    /// A configuration document is not valid JSON for `TerrainConfig`.
    #[error("failed to parse terrain configuration")]
    ConfigParse(#[from] serde_json::Error),

    /// A texture image is missing or corrupt.
    #[error("image file {path} not loaded")]
    ImageLoad {
        /// The image that failed to load
        path: PathBuf,
        /// The decoder or I/O failure
        #[source]
        source: image::ImageError,
    },

    /// The mesh upload boundary rejected a mesh.
    #[error("mesh upload failed: {0}")]
    MeshUpload(String),

    /// A fractal grid was requested with a side length of zero.
    #[error("fractal grid size must be at least 1")]
    EmptyGrid,

    /// The generation worker thread could not be spawned.
    #[error("failed to spawn terrain generation worker")]
    WorkerSpawn(#[source] io::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TerrainError>;
