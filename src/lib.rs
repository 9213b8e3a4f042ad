#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Voxel Terrain
//!
//! Procedural generation of an unbounded voxel terrain around a moving camera.
//!
//! A background worker scans the square of chunk cells around the camera, samples
//! layered noise into chunks of voxel columns and builds a mesh for each. The consumer
//! (render-loop) thread promotes one finished chunk per frame into a renderable entity
//! and queries the entities near the camera, batched by model.
//!
//! ## Key Modules
//!
//! * `config` - World parameters and JSON loading
//! * `core` - Shared-state primitives used across threads
//! * `error` - The crate's error type
//! * `voxels` - Noise sources, block types and chunks
//! * `rendering` - Chunk meshing, the upload boundary, entities and draw batches
//! * `terrain` - Generator, background worker and the `TerrainManager`
//!
//! ## Usage
//!
//! ```rust
//! use cgmath::Point3;
//! use voxel_terrain::{config::TerrainConfig, rendering::upload::CpuUploader, terrain::TerrainManager};
//!
//! let mut terrain = TerrainManager::new(TerrainConfig::default(), CpuUploader::new()).unwrap();
//! terrain.spawn_worker().unwrap();
//!
//! for frame in 0..10 {
//!     terrain.update(Point3::new(frame as f32, 0.0, 0.0));
//!     for (model, entities) in terrain.get_terrain().iter() {
//!         // one batched draw per model
//!         let _ = (model, entities.len());
//!     }
//! }
//! terrain.shutdown();
//! ```
//!
//! GPU resources, shaders, windowing and the draw loop are outside this crate; they
//! connect through [`rendering::upload::MeshUploader`] and the batches returned by
//! [`terrain::TerrainManager::get_terrain`].

use std::{thread, time::Duration};

use cgmath::Point3;
use log::info;

use config::TerrainConfig;
use error::Result;
use rendering::upload::CpuUploader;
use terrain::TerrainManager;

pub mod config;
pub mod core;
pub mod error;
pub mod rendering;
pub mod terrain;
pub mod voxels;

/// Frames simulated by the headless demo.
pub const DEMO_FRAMES: u32 = 240;

/// Camera travel along X per demo frame, in blocks.
pub const DEMO_CAMERA_SPEED: f32 = 0.5;

const DEMO_FRAME_TIME: Duration = Duration::from_millis(16);

/// Initializes the `env_logger` backend, writing to stdout and filtered by `RUST_LOG`.
///
/// Calling it more than once has no effect.
pub fn init_logging() {
    let mut log_builder = env_logger::Builder::new();
    let _ = log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .try_init();
}

/// Headless demo: flies a camera along X over generated terrain.
///
/// Reads an optional JSON configuration path from the first command-line argument.
/// Meshes go to a [`CpuUploader`], so no GPU is needed.
///
/// # Errors
/// Configuration errors and worker spawn failures.
pub fn run() -> Result<()> {
    init_logging();
    info!("Logger initialized");

    let config = match std::env::args().nth(1) {
        Some(path) => TerrainConfig::load(path)?,
        None => TerrainConfig::default(),
    };
    let start = config.cam_point();

    let mut terrain = TerrainManager::new(config, CpuUploader::new())?;
    terrain.spawn_worker()?;

    for frame in 0..DEMO_FRAMES {
        let camera = Point3::new(start.x + frame as f32 * DEMO_CAMERA_SPEED, start.y, start.z);
        terrain.update(camera);
        let batches = terrain.get_terrain();

        if frame % 60 == 0 {
            info!(
                "Frame {}: camera x {:.1}, {} visible entities in {} batches, {:?}",
                frame,
                camera.x,
                batches.entity_count(),
                batches.len(),
                terrain.stats()
            );
        }
        thread::sleep(DEMO_FRAME_TIME);
    }

    terrain.shutdown();
    info!(
        "Demo finished: {:?}, {} bytes uploaded",
        terrain.stats(),
        terrain.uploader().uploaded_bytes()
    );
    Ok(())
}
