//! # Block Module
//!
//! Block type definitions and block face geometry.

pub mod block_side;
pub mod block_type;
