//! # Chunk Generator
//!
//! The producer half of the terrain pipeline. A [`ChunkGenerator`] scans the window
//! of chunk cells around the camera, builds a chunk and its mesh for every cell not
//! generated yet, and hands both to the consumer over a bounded channel.
//!
//! ## Hand-off
//!
//! Finished work travels as [`GeneratedChunk`] values over a
//! `std::sync::mpsc::sync_channel`. When the channel is full the background loop
//! backs off and retries, checking the stop flag between attempts, so it never
//! blocks a shutdown. A scan run on the consumer thread instead stops at a full
//! channel and leaves the remaining cells for the next scan.
//!
//! ## Cancellation
//!
//! The background loop checks the stop flag before every chunk, so a stop request
//! waits for at most one chunk build. Scans run on the consumer thread ignore the flag.

use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        mpsc::{SyncSender, TrySendError},
        Arc,
    },
    thread,
    time::Duration,
};

use cgmath::Point3;

use crate::{
    core::MtResource,
    rendering::meshing::ChunkMesh,
    voxels::{
        chunk::{Chunk, ChunkOrigin},
        noise::NoiseField,
    },
};

/// Pause between attempts to hand a chunk to a full channel.
const FULL_CHANNEL_BACKOFF: Duration = Duration::from_millis(1);

/// Pause after a scan that found nothing new to generate.
const IDLE_BACKOFF: Duration = Duration::from_millis(2);

/// A chunk and its mesh, ready for promotion.
#[derive(Debug)]
pub struct GeneratedChunk {
    /// The chunk. The consumer takes ownership on promotion.
    pub chunk: Arc<Chunk>,
    /// Mesh built from `chunk`
    pub mesh: ChunkMesh,
}

/// The square of chunk-grid cells considered by one scan.
///
/// The window spans `cells_per_axis` cells on X and Z, starting at the cell holding
/// `camera - size / 2`, where `size = cells_per_axis * chunk_size`. Cell indices use
/// floor division so windows tile the grid on both sides of zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanWindow {
    /// Cell index of the first column of cells
    pub start_cell_x: i64,
    /// Cell index of the first row of cells
    pub start_cell_z: i64,
    /// Cells along each axis
    pub cells_per_axis: u32,
    /// Side length of a cell in blocks
    pub chunk_size: u32,
}

impl ScanWindow {
    /// The window centered on `camera`.
    pub fn around(camera: Point3<f32>, cells_per_axis: u32, chunk_size: u32) -> Self {
        let half = (cells_per_axis as f64 * chunk_size as f64) / 2.0;
        let cell = |coordinate: f32| ((coordinate as f64 - half) / chunk_size as f64).floor() as i64;
        ScanWindow {
            start_cell_x: cell(camera.x),
            start_cell_z: cell(camera.z),
            cells_per_axis,
            chunk_size,
        }
    }

    /// Origins of every cell in scan order: X outer, Z inner.
    ///
    /// Cells whose origin does not fit in world coordinates are skipped.
    pub fn origins(&self) -> impl Iterator<Item = ChunkOrigin> {
        let window = *self;
        (0..window.cells_per_axis as i64).flat_map(move |a| {
            (0..window.cells_per_axis as i64).filter_map(move |b| {
                Chunk::origin_of_cell(
                    window.start_cell_x.saturating_add(a),
                    window.start_cell_z.saturating_add(b),
                    window.chunk_size,
                )
            })
        })
    }

    /// Whether the cell at `origin` lies inside the window.
    pub fn contains(&self, origin: ChunkOrigin) -> bool {
        let size = self.chunk_size as i64;
        let end = self.cells_per_axis as i64;
        let (x, z) = (origin.x as i64, origin.z as i64);
        origin.y == 0
            && x.rem_euclid(size) == 0
            && z.rem_euclid(size) == 0
            && (0..end).contains(&(x.div_euclid(size) - self.start_cell_x))
            && (0..end).contains(&(z.div_euclid(size) - self.start_cell_z))
    }
}

/// Whether a scan waits on a full channel or gives up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FullChannel {
    Wait,
    Stop,
}

/// Builds chunks around the camera and hands them to the consumer.
///
/// Cloning a generator yields another handle to the same generated-set, camera,
/// stop flag and channel.
#[derive(Clone)]
pub struct ChunkGenerator {
    field: NoiseField,
    chunks_per_axis: u32,
    chunk_size: u32,
    generated: MtResource<HashSet<ChunkOrigin>>,
    camera: MtResource<Point3<f32>>,
    stop_flag: Arc<AtomicBool>,
    pending: Arc<AtomicUsize>,
    sender: SyncSender<GeneratedChunk>,
}

impl ChunkGenerator {
    /// Creates a generator that sends finished chunks through `sender`.
    ///
    /// # Arguments
    /// * `field` - Height source, fixed for the generator's lifetime
    /// * `chunks_per_axis` - Cells along each axis of the scan window
    /// * `chunk_size` - Side length of every chunk
    /// * `camera` - Initial camera position
    /// * `sender` - Producer end of the hand-off channel
    pub fn new(
        field: NoiseField,
        chunks_per_axis: u32,
        chunk_size: u32,
        camera: Point3<f32>,
        sender: SyncSender<GeneratedChunk>,
    ) -> Self {
        ChunkGenerator {
            field,
            chunks_per_axis,
            chunk_size,
            generated: MtResource::new(HashSet::new()),
            camera: MtResource::new(camera),
            stop_flag: Arc::new(AtomicBool::new(false)),
            pending: Arc::new(AtomicUsize::new(0)),
            sender,
        }
    }

    /// The height source.
    pub fn field(&self) -> &NoiseField {
        &self.field
    }

    /// Current camera position.
    pub fn camera(&self) -> Point3<f32> {
        self.camera.snapshot()
    }

    /// Moves the camera. The next scan re-centers on the new position.
    pub fn set_camera(&self, camera: Point3<f32>) {
        self.camera.replace(camera);
    }

    /// The stop flag shared with the background loop.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.stop_flag.clone()
    }

    /// Requests the background loop to stop.
    pub fn request_stop(&self) {
        self.stop_flag.store(true, Ordering::Release);
    }

    /// Whether a stop was requested.
    pub fn is_stopped(&self) -> bool {
        self.stop_flag.load(Ordering::Acquire)
    }

    /// Number of chunks generated so far.
    pub fn generated_count(&self) -> usize {
        self.generated.get().len()
    }

    /// Whether the chunk at `origin` has been generated.
    pub fn is_generated(&self, origin: ChunkOrigin) -> bool {
        self.generated.get().contains(&origin)
    }

    /// Removes `origin` from the generated-set so a later scan builds it again.
    ///
    /// # Returns
    /// Whether `origin` was marked as generated.
    pub fn forget(&self, origin: ChunkOrigin) -> bool {
        self.generated.get_mut().remove(&origin)
    }

    /// Chunks sent but not yet received by the consumer.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    /// Records that the consumer received one chunk.
    pub fn mark_received(&self) {
        let _ = self
            .pending
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| Some(n.saturating_sub(1)));
    }

    /// The scan window around the current camera position.
    pub fn scan_window(&self) -> ScanWindow {
        ScanWindow::around(self.camera(), self.chunks_per_axis, self.chunk_size)
    }

    /// Runs one scan, waiting for room whenever the channel is full.
    ///
    /// # Returns
    /// The number of chunks generated and handed off.
    pub fn generate_terrain(&self) -> usize {
        self.scan(FullChannel::Wait)
    }

    /// Runs one scan that stops at the first full channel instead of waiting.
    ///
    /// Cells left unscanned stay ungenerated and are picked up by a later scan. Use this
    /// from the thread that drains the channel. The stop flag is not consulted, since it
    /// only governs the background loop.
    pub fn try_generate_terrain(&self) -> usize {
        self.scan(FullChannel::Stop)
    }

    /// Background loop: scans until a stop is requested.
    pub fn run(&self) {
        log::info!(
            "Terrain generation loop running (seed {}, {}x{} chunks of {})",
            self.field.seed(),
            self.chunks_per_axis,
            self.chunks_per_axis,
            self.chunk_size
        );
        while !self.is_stopped() {
            if self.generate_terrain() == 0 {
                thread::sleep(IDLE_BACKOFF);
            }
        }
        log::info!("Terrain generation loop stopped");
    }

    fn scan(&self, on_full: FullChannel) -> usize {
        let window = self.scan_window();
        let mut count = 0;

        for origin in window.origins() {
            if on_full == FullChannel::Wait && self.is_stopped() {
                break;
            }
            if self.is_generated(origin) {
                continue;
            }

            let chunk = Arc::new(Chunk::generate(origin, self.chunk_size, &self.field));
            let mesh = ChunkMesh::build(&chunk);
            if !self.generated.get_mut().insert(origin) {
                continue;
            }

            if !self.hand_off(GeneratedChunk { chunk, mesh }, on_full) {
                self.generated.get_mut().remove(&origin);
                break;
            }
            count += 1;
        }

        if count > 0 {
            log::debug!(
                "Generated {} chunks in window starting at cell ({}, {})",
                count,
                window.start_cell_x,
                window.start_cell_z
            );
        }
        count
    }

    fn hand_off(&self, generated: GeneratedChunk, on_full: FullChannel) -> bool {
        self.pending.fetch_add(1, Ordering::AcqRel);
        let mut item = generated;
        loop {
            match self.sender.try_send(item) {
                Ok(()) => return true,
                Err(TrySendError::Full(returned)) => {
                    if on_full == FullChannel::Stop || self.is_stopped() {
                        break;
                    }
                    item = returned;
                    thread::sleep(FULL_CHANNEL_BACKOFF);
                }
                Err(TrySendError::Disconnected(_)) => {
                    log::warn!("Terrain consumer disconnected, dropping generated chunk");
                    self.request_stop();
                    break;
                }
            }
        }
        self.mark_received();
        false
    }
}
