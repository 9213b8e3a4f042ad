use std::{
    path::{Path, PathBuf},
    thread,
    time::{Duration, Instant},
};

use cgmath::Point3;
use voxel_terrain::{
    config::TerrainConfig,
    error::{Result, TerrainError},
    rendering::upload::{CpuUploader, MeshUploader, ModelHandle, TextureId},
    terrain::TerrainManager,
};

fn config(chunks_per_axis: u32, chunk_size: u32) -> TerrainConfig {
    TerrainConfig {
        chunks_per_axis,
        chunk_size,
        seed: Some(2024),
        pending_capacity: 4,
        texture_path: PathBuf::from("missing/dirt.png"),
        ..TerrainConfig::default()
    }
}

/// Calls `update` each "frame" until `done` holds or five seconds pass.
fn drive<U: MeshUploader>(
    terrain: &mut TerrainManager<U>,
    camera: Point3<f32>,
    done: impl Fn(&TerrainManager<U>) -> bool,
) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        terrain.update(camera);
        if done(terrain) {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    false
}

#[test]
fn worker_fills_window_through_bounded_channel() {
    let mut terrain = TerrainManager::new(config(4, 8), CpuUploader::new()).unwrap();
    terrain.spawn_worker().unwrap();

    let camera = Point3::new(0.0, 30.0, 0.0);
    assert!(drive(&mut terrain, camera, |t| t.promoted() == 16));

    let stats = terrain.stats();
    assert_eq!(stats.generated_chunks, 16);
    assert_eq!(stats.pending_meshes, 0);
    assert_eq!(stats.failed_uploads, 0);
    assert_eq!(stats.worker_restarts, 0);
    assert_eq!(terrain.get_terrain().entity_count(), 16);

    terrain.shutdown();
}

#[test]
fn worker_follows_camera() {
    let mut terrain = TerrainManager::new(config(2, 16), CpuUploader::new()).unwrap();
    terrain.spawn_worker().unwrap();

    assert!(drive(&mut terrain, Point3::new(0.0, 0.0, 0.0), |t| t.promoted() == 4));
    assert!(drive(&mut terrain, Point3::new(32.0, 0.0, 0.0), |t| t.promoted() == 8));
    terrain.shutdown();

    for x in [-16, 0, 16, 32] {
        for z in [-16, 0] {
            assert!(terrain.is_generated(Point3::new(x, 0, z)));
        }
    }
    let visible = terrain.get_terrain();
    assert_eq!(visible.entity_count(), 4);
    assert!(visible
        .iter()
        .flat_map(|(_, entities)| entities)
        .all(|entity| entity.position.x >= 16.0));
}

#[test]
fn stop_loop_ends_generation() {
    let mut terrain = TerrainManager::new(config(8, 4), CpuUploader::new()).unwrap();
    terrain.spawn_worker().unwrap();
    terrain.stop_loop();
    terrain.shutdown();

    let generated = terrain.stats().generated_chunks;
    thread::sleep(Duration::from_millis(20));
    assert_eq!(terrain.stats().generated_chunks, generated);
    assert!(generated <= 4);
}

/// Fails every other mesh upload and every texture load.
#[derive(Default)]
struct FlakyUploader {
    calls: u32,
}

impl MeshUploader for FlakyUploader {
    fn upload_model(&mut self, _: &[f32], _: &[f32], indices: &[u32]) -> Result<ModelHandle> {
        self.calls += 1;
        if self.calls % 2 == 0 {
            return Err(TerrainError::MeshUpload("out of buffer space".into()));
        }
        Ok(ModelHandle {
            id: self.calls,
            vertex_count: indices.len() as u32,
            texture: None,
        })
    }

    fn upload_texture(&mut self, path: &Path) -> Result<TextureId> {
        CpuUploader::new().upload_texture(path)
    }
}

#[test]
fn failed_uploads_are_retried() {
    let mut terrain = TerrainManager::new(config(2, 8), FlakyUploader::default()).unwrap();
    terrain.spawn_worker().unwrap();

    let camera = Point3::new(0.0, 0.0, 0.0);
    assert!(drive(&mut terrain, camera, |t| t.promoted() == 4));
    assert_eq!(terrain.stats().failed_uploads, 2);
    assert_eq!(terrain.entities().len(), 2);

    // rejected chunks are regenerated by the worker and promoted again
    assert!(drive(&mut terrain, camera, |t| t.entities().len() == 4));
    terrain.shutdown();

    let stats = terrain.stats();
    assert_eq!(stats.failed_uploads, 3);
    assert_eq!(stats.promoted, 7);
    assert_eq!(stats.generated_chunks, 4);
    assert_eq!(terrain.get_terrain().entity_count(), 4);
    assert!(terrain
        .entities()
        .iter()
        .all(|entity| entity.model.texture.is_none()));
}
