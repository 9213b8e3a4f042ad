//! # Terrain Management
//!
//! The scan-generate-promote pipeline.
//!
//! ## Architecture
//!
//! * **Generator**: the producer. Scans the window of chunk cells around the camera and
//!   builds chunks and meshes for cells not generated yet.
//! * **Worker**: a supervised background thread that runs the generator's loop.
//! * **Manager**: the consumer. Receives generated chunks, promotes one per frame into
//!   an entity, and answers per-frame batch queries.
//!
//! ## Thread Model
//!
//! Two threads take part: the generation worker and the consumer (render-loop) thread.
//! They share the generated-set and the camera position through `MtResource`, and
//! finished chunks travel from producer to consumer over a bounded channel. Nothing
//! else is shared.
//!
//! Chunks are generated in scan order and promoted in arrival order. Chunks are never
//! evicted.

pub mod generator;
pub mod manager;
pub mod worker;

pub use generator::{ChunkGenerator, GeneratedChunk, ScanWindow};
pub use manager::{TerrainManager, TerrainStats};
pub use worker::GenerationWorker;
