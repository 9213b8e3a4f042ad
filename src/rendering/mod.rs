//! # Rendering Boundary
//!
//! Everything between a finished chunk and the external renderer:
//!
//! * **Meshing**: flat position, UV and index arrays built from a chunk
//! * **Upload**: the [`upload::MeshUploader`] boundary that turns arrays into model handles
//! * **Entity**: positioned model instances and per-model draw batches
//!
//! GPU resource management, shaders and draw calls live outside this crate.

pub mod entity;
pub mod meshing;
pub mod upload;
