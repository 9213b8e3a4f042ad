//! # Terrain Manager
//!
//! The consumer half of the terrain pipeline and the subsystem's public face.
//!
//! A [`TerrainManager`] owns the [`ChunkGenerator`], the receiving end of its
//! hand-off channel, the optional background [`GenerationWorker`], and everything
//! the consumer thread builds from generated chunks: the chunk list, the promoted
//! meshes and the entity list.
//!
//! ## Per-frame Use
//!
//! ```
//! use cgmath::Point3;
//! use voxel_terrain::{config::TerrainConfig, rendering::upload::CpuUploader, terrain::TerrainManager};
//!
//! let config = TerrainConfig { chunks_per_axis: 2, seed: Some(1), ..TerrainConfig::default() };
//! let mut terrain = TerrainManager::new(config, CpuUploader::new()).unwrap();
//! terrain.generate_terrain();
//!
//! for _ in 0..4 {
//!     terrain.update(Point3::new(0.0, 20.0, 0.0));
//! }
//! assert_eq!(terrain.get_terrain().entity_count(), 4);
//! ```
//!
//! `update` promotes at most one generated chunk per call: its mesh is uploaded,
//! and one entity is created at the chunk origin. Upload failures are logged and
//! never stop the consumer. A chunk whose mesh failed to upload is dropped from the
//! generated-set, so a later scan builds it again.

use std::sync::{
    mpsc::{sync_channel, Receiver, TryRecvError},
    Arc,
};

use cgmath::Point3;

use crate::{
    config::{camera_in_range, TerrainConfig},
    error::Result,
    rendering::{
        entity::{Entity, EntityBatches},
        meshing::ChunkMesh,
        upload::{MeshUploader, TextureId},
    },
    voxels::{
        chunk::{Chunk, ChunkOrigin},
        noise::{diamond_square, GridCorners, HeightGrid, NoiseField},
    },
};

use super::{
    generator::{ChunkGenerator, GeneratedChunk},
    worker::GenerationWorker,
};

/// Name of the background generation thread.
pub const WORKER_THREAD_NAME: &str = "terrain-generation";

/// Counters describing the state of a terrain manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TerrainStats {
    /// Chunks in the generated-set
    pub generated_chunks: usize,
    /// Chunks generated but not yet promoted
    pub pending_meshes: usize,
    /// Chunks promoted by `update`
    pub promoted: usize,
    /// Promotions whose mesh upload failed
    pub failed_uploads: usize,
    /// Times the generation loop panicked and was restarted
    pub worker_restarts: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SharedTexture {
    Unloaded,
    Loaded(TextureId),
    Failed,
}

/// Generates terrain around a moving camera and turns it into renderable entities.
pub struct TerrainManager<U: MeshUploader> {
    config: TerrainConfig,
    generator: ChunkGenerator,
    receiver: Receiver<GeneratedChunk>,
    worker: Option<GenerationWorker>,
    uploader: U,
    texture: SharedTexture,
    wireframe: bool,
    chunks: Vec<Arc<Chunk>>,
    meshes: Vec<ChunkMesh>,
    entities: Vec<Entity>,
    promoted: usize,
    failed_uploads: usize,
}

impl<U: MeshUploader> TerrainManager<U> {
    /// Creates a manager. No chunk is generated until [`Self::generate_terrain`] runs
    /// or a worker is started with [`Self::spawn_worker`].
    ///
    /// # Arguments
    /// * `config` - World parameters. A missing seed is drawn from a random source.
    /// * `uploader` - The mesh and texture upload boundary
    ///
    /// # Errors
    /// `TerrainError::InvalidConfig` when `config` fails validation.
    pub fn new(config: TerrainConfig, uploader: U) -> Result<Self> {
        config.validate()?;

        let field = match config.seed {
            Some(seed) => NoiseField::new(seed),
            None => NoiseField::from_entropy(),
        };
        let (sender, receiver) = sync_channel(config.pending_capacity);
        let generator = ChunkGenerator::new(
            field,
            config.chunks_per_axis,
            config.chunk_size,
            config.cam_point(),
            sender,
        );

        log::info!(
            "Terrain manager created: seed {}, {}x{} chunks of {} blocks, wireframe {}",
            generator.field().seed(),
            config.chunks_per_axis,
            config.chunks_per_axis,
            config.chunk_size,
            config.wireframe
        );

        Ok(TerrainManager {
            wireframe: config.wireframe,
            config,
            generator,
            receiver,
            worker: None,
            uploader,
            texture: SharedTexture::Unloaded,
            chunks: Vec::new(),
            meshes: Vec::new(),
            entities: Vec::new(),
            promoted: 0,
            failed_uploads: 0,
        })
    }

    /// Starts the background generation loop on a dedicated thread.
    ///
    /// Does nothing if a worker is already running. After [`Self::stop_loop`] a new
    /// worker exits immediately.
    ///
    /// # Errors
    /// `TerrainError::WorkerSpawn` when the thread cannot be created.
    pub fn spawn_worker(&mut self) -> Result<()> {
        if self.worker.is_some() {
            log::warn!("Terrain generation worker already running");
            return Ok(());
        }
        let generator = self.generator.clone();
        let worker = GenerationWorker::spawn(WORKER_THREAD_NAME, self.generator.stop_flag(), move || {
            generator.run()
        })?;
        self.worker = Some(worker);
        Ok(())
    }

    /// Runs one scan on the calling thread.
    ///
    /// Generates every chunk of the window around the current camera that is not
    /// generated yet. Stops early if the hand-off channel fills up; the remaining
    /// cells are generated by a later call.
    ///
    /// # Returns
    /// The number of chunks generated.
    pub fn generate_terrain(&self) -> usize {
        self.generator.try_generate_terrain()
    }

    /// Builds the corner-seeded fractal height grid for the window centered on the
    /// current camera.
    ///
    /// The grid has `size + 1` points per side. Its corners are single-octave noise
    /// samples at the window's world-space corners, from `(cx - size/2, cz - size/2)`
    /// to `(cx + size/2, cz + size/2)`.
    pub fn generate_terrain_diamond_square(&self) -> Result<HeightGrid> {
        let camera = self.generator.camera();
        let size = self.config.size();
        let half = size as f64 / 2.0;
        let x0 = (camera.x as f64 - half).floor() as i64;
        let z0 = (camera.z as f64 - half).floor() as i64;

        let corners = GridCorners::from_noise(self.generator.field(), x0, z0, size as usize);
        diamond_square(size as usize, corners, &self.config.diamond_square)
    }

    /// Per-frame consumer step.
    ///
    /// Stores `cam_pos` for the generator, then promotes at most one generated chunk.
    /// Never blocks. A non-finite position, or one outside world coordinates, is
    /// ignored and the previous camera is kept.
    pub fn update(&mut self, cam_pos: Point3<f32>) {
        if camera_in_range(cam_pos) {
            self.generator.set_camera(cam_pos);
        } else {
            log::warn!("Ignoring camera position {:?} outside world coordinates", cam_pos);
        }

        match self.receiver.try_recv() {
            Ok(generated) => {
                self.generator.mark_received();
                self.promote(generated);
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => {
                log::warn!("Terrain generator disconnected");
            }
        }
    }

    fn promote(&mut self, generated: GeneratedChunk) {
        let GeneratedChunk { chunk, mesh } = generated;
        let uvs: &[f32] = if self.wireframe { &[] } else { mesh.uvs() };

        match self.uploader.upload_model(mesh.positions(), uvs, mesh.indices()) {
            Ok(model) => {
                let texture = if self.wireframe { None } else { self.shared_texture() };
                let origin = chunk.origin_vector();
                let entity = Entity::new(
                    model.with_texture(texture),
                    Point3::new(origin.x, origin.y, origin.z),
                );
                log::debug!(
                    "Promoted chunk at {:?} as model {} ({} indices)",
                    chunk.origin(),
                    model.id,
                    model.vertex_count
                );
                self.entities.push(entity);
                self.chunks.push(chunk);
                self.meshes.push(mesh);
            }
            Err(err) => {
                log::error!("Chunk at {:?} will be regenerated: {}", chunk.origin(), err);
                self.generator.forget(chunk.origin());
                self.failed_uploads += 1;
            }
        }
        self.promoted += 1;
    }

    fn shared_texture(&mut self) -> Option<TextureId> {
        match self.texture {
            SharedTexture::Loaded(id) => Some(id),
            SharedTexture::Failed => None,
            SharedTexture::Unloaded => match self.uploader.upload_texture(&self.config.texture_path) {
                Ok(id) => {
                    self.texture = SharedTexture::Loaded(id);
                    Some(id)
                }
                Err(err) => {
                    log::warn!("{}; terrain entities will be untextured", err);
                    self.texture = SharedTexture::Failed;
                    None
                }
            },
        }
    }

    /// Groups every entity near the camera by model.
    ///
    /// An entity is included when both horizontal distances to the camera are at most
    /// `size / 2` (integer division, inclusive). The batches are rebuilt on every call.
    pub fn get_terrain(&self) -> EntityBatches {
        let camera = self.generator.camera();
        let half_extent = (self.config.size() / 2) as f32;
        self.entities
            .iter()
            .filter(|entity| entity.within(camera, half_extent))
            .copied()
            .collect()
    }

    /// Requests the background loop to stop. Takes effect before the next chunk.
    ///
    /// Scans run through [`Self::generate_terrain`] are not affected.
    pub fn stop_loop(&self) {
        self.generator.request_stop();
    }

    /// Stops the background loop and waits for its thread to exit.
    pub fn shutdown(&mut self) {
        self.stop_loop();
        if let Some(mut worker) = self.worker.take() {
            worker.join();
        }
    }

    /// Switches wireframe mode for subsequent promotions.
    pub fn set_wireframe(&mut self, wireframe: bool) {
        self.wireframe = wireframe;
    }

    /// Whether promotions upload untextured wireframe models.
    pub fn wireframe(&self) -> bool {
        self.wireframe
    }

    /// Current counters.
    pub fn stats(&self) -> TerrainStats {
        TerrainStats {
            generated_chunks: self.generator.generated_count(),
            pending_meshes: self.generator.pending(),
            promoted: self.promoted,
            failed_uploads: self.failed_uploads,
            worker_restarts: self.worker.as_ref().map_or(0, GenerationWorker::restarts),
        }
    }

    /// Whether the chunk at `origin` has been generated.
    pub fn is_generated(&self, origin: ChunkOrigin) -> bool {
        self.generator.is_generated(origin)
    }

    /// Current camera position.
    pub fn camera(&self) -> Point3<f32> {
        self.generator.camera()
    }

    /// Noise seed in use.
    pub fn seed(&self) -> u32 {
        self.generator.field().seed()
    }

    /// Number of promotions, failed uploads included; the position of the pending
    /// cursor.
    pub fn promoted(&self) -> usize {
        self.promoted
    }

    /// Chunks promoted with an uploaded model, in promotion order.
    pub fn chunks(&self) -> &[Arc<Chunk>] {
        &self.chunks
    }

    /// Meshes of [`Self::chunks`], in the same order.
    pub fn meshes(&self) -> &[ChunkMesh] {
        &self.meshes
    }

    /// Every entity created so far, in promotion order.
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// The configuration the manager was created with.
    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }

    /// The upload boundary.
    pub fn uploader(&self) -> &U {
        &self.uploader
    }
}

impl<U: MeshUploader> Drop for TerrainManager<U> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use super::*;
    use crate::{
        error::TerrainError,
        rendering::upload::{CpuUploader, ModelHandle},
    };

    fn config(chunks_per_axis: u32, chunk_size: u32) -> TerrainConfig {
        TerrainConfig {
            chunks_per_axis,
            chunk_size,
            seed: Some(17),
            texture_path: PathBuf::from("no/such/texture.png"),
            ..TerrainConfig::default()
        }
    }

    fn manager(chunks_per_axis: u32, chunk_size: u32) -> TerrainManager<CpuUploader> {
        TerrainManager::new(config(chunks_per_axis, chunk_size), CpuUploader::new()).unwrap()
    }

    /// Accepts textures, rejects every mesh.
    #[derive(Default)]
    struct RejectingUploader {
        model_attempts: usize,
    }

    impl MeshUploader for RejectingUploader {
        fn upload_model(&mut self, _: &[f32], _: &[f32], _: &[u32]) -> Result<ModelHandle> {
            self.model_attempts += 1;
            Err(TerrainError::MeshUpload("device lost".into()))
        }

        fn upload_texture(&mut self, _: &Path) -> Result<TextureId> {
            Ok(TextureId(0))
        }
    }

    /// Rejects the first mesh, accepts everything after.
    #[derive(Default)]
    struct FailOnceUploader {
        model_attempts: u32,
    }

    impl MeshUploader for FailOnceUploader {
        fn upload_model(&mut self, _: &[f32], _: &[f32], indices: &[u32]) -> Result<ModelHandle> {
            self.model_attempts += 1;
            if self.model_attempts == 1 {
                return Err(TerrainError::MeshUpload("staging buffer busy".into()));
            }
            Ok(ModelHandle {
                id: self.model_attempts,
                vertex_count: indices.len() as u32,
                texture: None,
            })
        }

        fn upload_texture(&mut self, _: &Path) -> Result<TextureId> {
            Ok(TextureId(0))
        }
    }

    /// Records what each upload carried.
    #[derive(Default)]
    struct RecordingUploader {
        uv_lengths: Vec<usize>,
        texture_loads: usize,
    }

    impl MeshUploader for RecordingUploader {
        fn upload_model(&mut self, _: &[f32], uvs: &[f32], indices: &[u32]) -> Result<ModelHandle> {
            self.uv_lengths.push(uvs.len());
            Ok(ModelHandle {
                id: self.uv_lengths.len() as u32 - 1,
                vertex_count: indices.len() as u32,
                texture: None,
            })
        }

        fn upload_texture(&mut self, _: &Path) -> Result<TextureId> {
            self.texture_loads += 1;
            Ok(TextureId(9))
        }
    }

    #[test]
    fn test_first_scan_fills_window() {
        let terrain = manager(2, 16);

        assert_eq!(terrain.generate_terrain(), 4);
        for origin in [
            Point3::new(-16, 0, -16),
            Point3::new(-16, 0, 0),
            Point3::new(0, 0, -16),
            Point3::new(0, 0, 0),
        ] {
            assert!(terrain.is_generated(origin), "{:?} missing", origin);
        }
        assert_eq!(terrain.stats().pending_meshes, 4);
    }

    #[test]
    fn test_chunks_have_one_voxel_per_column() {
        let mut terrain = manager(2, 16);
        terrain.generate_terrain();
        for _ in 0..4 {
            terrain.update(Point3::new(0.0, 0.0, 0.0));
        }

        assert_eq!(terrain.chunks().len(), 4);
        assert!(terrain.chunks().iter().all(|chunk| chunk.voxels().len() == 256));
    }

    #[test]
    fn test_unmoved_camera_generates_nothing_new() {
        let terrain = manager(2, 16);
        terrain.generate_terrain();
        assert_eq!(terrain.generate_terrain(), 0);
        assert_eq!(terrain.stats().generated_chunks, 4);
    }

    #[test]
    fn test_camera_move_generates_leading_edge() {
        let mut terrain = manager(2, 16);
        terrain.generate_terrain();

        terrain.update(Point3::new(16.0, 0.0, 0.0));
        assert_eq!(terrain.generate_terrain(), 2);
        assert!(terrain.is_generated(Point3::new(16, 0, -16)));
        assert!(terrain.is_generated(Point3::new(16, 0, 0)));
        assert_eq!(terrain.stats().generated_chunks, 6);
    }

    #[test]
    fn test_update_without_pending_is_noop() {
        let mut terrain = manager(2, 16);
        terrain.update(Point3::new(3.0, 0.0, 3.0));

        assert_eq!(terrain.entities().len(), 0);
        assert_eq!(terrain.promoted(), 0);
        assert_eq!(terrain.camera(), Point3::new(3.0, 0.0, 3.0));
    }

    #[test]
    fn test_one_promotion_per_update() {
        let mut terrain = manager(3, 8);
        assert_eq!(terrain.generate_terrain(), 9);

        for k in 1..=5 {
            terrain.update(Point3::new(0.0, 0.0, 0.0));
            assert_eq!(terrain.entities().len(), k);
        }
        assert_eq!(terrain.stats().pending_meshes, 4);
        assert_eq!(terrain.uploader().model_count(), 5);
    }

    #[test]
    fn test_entities_sit_at_chunk_origins() {
        let mut terrain = manager(2, 16);
        terrain.generate_terrain();
        for _ in 0..4 {
            terrain.update(Point3::new(0.0, 0.0, 0.0));
        }

        for (entity, chunk) in terrain.entities().iter().zip(terrain.chunks()) {
            let origin = chunk.origin();
            assert_eq!(
                entity.position,
                Point3::new(origin.x as f32, origin.y as f32, origin.z as f32)
            );
            assert_eq!(entity.scale, 1.0);
        }
    }

    #[test]
    fn test_spatial_filter_is_inclusive() {
        let mut terrain = manager(2, 16);
        terrain.generate_terrain();
        for _ in 0..4 {
            terrain.update(Point3::new(0.0, 0.0, 0.0));
        }
        // size / 2 = 16: chunks at x = -16 sit exactly on the boundary.
        assert_eq!(terrain.get_terrain().entity_count(), 4);

        let camera = Point3::new(16.0, 0.0, 0.0);
        terrain.update(camera);
        let batches = terrain.get_terrain();
        assert_eq!(batches.entity_count(), 2);
        assert!(batches
            .iter()
            .flat_map(|(_, entities)| entities)
            .all(|entity| entity.within(camera, 16.0)));
    }

    #[test]
    fn test_missing_texture_degrades_entities() {
        let mut terrain = manager(2, 16);
        terrain.generate_terrain();
        terrain.update(Point3::new(0.0, 0.0, 0.0));
        terrain.update(Point3::new(0.0, 0.0, 0.0));

        assert_eq!(terrain.entities().len(), 2);
        assert!(terrain.entities().iter().all(|entity| entity.model.texture.is_none()));
        assert_eq!(terrain.stats().failed_uploads, 0);
    }

    #[test]
    fn test_texture_uploaded_once() {
        let mut terrain = TerrainManager::new(config(2, 16), RecordingUploader::default()).unwrap();
        terrain.generate_terrain();
        for _ in 0..4 {
            terrain.update(Point3::new(0.0, 0.0, 0.0));
        }

        assert_eq!(terrain.uploader().texture_loads, 1);
        assert!(terrain
            .entities()
            .iter()
            .all(|entity| entity.model.texture == Some(TextureId(9))));
    }

    #[test]
    fn test_failed_mesh_upload_advances_cursor() {
        let mut terrain = TerrainManager::new(config(2, 16), RejectingUploader::default()).unwrap();
        terrain.generate_terrain();
        terrain.update(Point3::new(0.0, 0.0, 0.0));
        terrain.update(Point3::new(0.0, 0.0, 0.0));

        let stats = terrain.stats();
        assert_eq!(stats.promoted, 2);
        assert_eq!(stats.failed_uploads, 2);
        assert_eq!(stats.pending_meshes, 2);
        assert!(terrain.entities().is_empty());
        assert!(terrain.chunks().is_empty());
        assert!(terrain.get_terrain().is_empty());
        assert_eq!(terrain.uploader().model_attempts, 2);
        assert_eq!(stats.generated_chunks, 2);
    }

    #[test]
    fn test_failed_mesh_upload_is_regenerated() {
        let mut terrain = TerrainManager::new(config(2, 16), FailOnceUploader::default()).unwrap();
        let camera = Point3::new(0.0, 0.0, 0.0);
        assert_eq!(terrain.generate_terrain(), 4);
        for _ in 0..4 {
            terrain.update(camera);
        }
        assert_eq!(terrain.entities().len(), 3);
        assert!(!terrain.is_generated(Point3::new(-16, 0, -16)));

        assert_eq!(terrain.generate_terrain(), 1);
        terrain.update(camera);

        assert_eq!(terrain.entities().len(), 4);
        assert_eq!(terrain.chunks().len(), 4);
        assert_eq!(terrain.get_terrain().entity_count(), 4);
        assert_eq!(terrain.stats().failed_uploads, 1);
        assert_eq!(terrain.promoted(), 5);
        assert!(terrain.is_generated(Point3::new(-16, 0, -16)));
    }

    #[test]
    fn test_stop_loop_leaves_manual_scans_working() {
        let terrain = manager(2, 16);
        terrain.stop_loop();

        assert_eq!(terrain.generate_terrain(), 4);
        assert_eq!(terrain.stats().generated_chunks, 4);
    }

    #[test]
    fn test_out_of_range_camera_ignored() {
        let mut terrain = manager(2, 16);
        let camera = Point3::new(8.0, 0.0, -8.0);
        terrain.update(camera);

        terrain.update(Point3::new(f32::NAN, 0.0, 0.0));
        assert_eq!(terrain.camera(), camera);
        terrain.update(Point3::new(3.0e9, 0.0, 0.0));
        assert_eq!(terrain.camera(), camera);
        terrain.update(Point3::new(0.0, 0.0, f32::NEG_INFINITY));
        assert_eq!(terrain.camera(), camera);

        assert_eq!(terrain.generate_terrain(), 4);
    }

    #[test]
    fn test_spatial_filter_uses_integer_half_size() {
        let mut terrain = manager(3, 11);
        assert_eq!(terrain.generate_terrain(), 9);
        for _ in 0..9 {
            terrain.update(Point3::new(0.0, 0.0, 0.0));
        }
        // size 33 gives a half extent of 16, not 16.5.
        terrain.update(Point3::new(16.0, 0.0, 0.0));
        assert_eq!(terrain.get_terrain().entity_count(), 2);
        terrain.update(Point3::new(16.5, 0.0, 0.0));
        assert_eq!(terrain.get_terrain().entity_count(), 0);
    }

    #[test]
    fn test_wireframe_uploads_without_uvs() {
        let mut terrain = TerrainManager::new(config(2, 4), RecordingUploader::default()).unwrap();
        terrain.generate_terrain();

        terrain.update(Point3::new(0.0, 0.0, 0.0));
        terrain.set_wireframe(true);
        terrain.update(Point3::new(0.0, 0.0, 0.0));

        let uploader = terrain.uploader();
        assert!(uploader.uv_lengths[0] > 0);
        assert_eq!(uploader.uv_lengths[1], 0);
        assert_eq!(terrain.entities()[1].model.texture, None);
        assert!(terrain.wireframe());
    }

    #[test]
    fn test_full_channel_defers_cells() {
        let mut config = config(3, 8);
        config.pending_capacity = 4;
        let mut terrain = TerrainManager::new(config, CpuUploader::new()).unwrap();

        assert_eq!(terrain.generate_terrain(), 4);
        terrain.update(Point3::new(0.0, 0.0, 0.0));
        assert_eq!(terrain.generate_terrain(), 1);
        assert_eq!(terrain.stats().generated_chunks, 5);
    }

    #[test]
    fn test_diamond_square_grid() {
        let terrain = manager(2, 16);
        let grid = terrain.generate_terrain_diamond_square().unwrap();

        assert_eq!(grid.side(), 33);
        let field = NoiseField::new(17);
        assert_eq!(grid.corners(), GridCorners::from_noise(&field, -16, -16, 32));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result = TerrainManager::new(config(0, 16), CpuUploader::new());
        assert!(matches!(result, Err(TerrainError::InvalidConfig(_))));
    }

    #[test]
    fn test_seed_is_fixed() {
        let terrain = manager(1, 4);
        assert_eq!(terrain.seed(), 17);
    }
}
