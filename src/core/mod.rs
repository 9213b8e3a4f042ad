//! # Core Module
//!
//! Concurrency primitives shared by the terrain subsystem.
//!
//! ## Key Components
//! - `MtResource`: Thread-safe reference-counted resource with read-write locking
//!
//! ## Usage
//! ```rust
//! use voxel_terrain::core::MtResource;
//!
//! let camera = MtResource::new([0.0f32, 0.0, 0.0]);
//! camera.get_mut()[0] = 16.0;
//! assert_eq!(camera.snapshot()[0], 16.0);
//! ```

pub mod mt_resource;

pub use mt_resource::MtResource;
