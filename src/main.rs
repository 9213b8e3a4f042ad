//! # Voxel Terrain Demo Entry Point
//!
//! Runs the headless terrain demo from the library's `run()` function.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info cargo run --release -- [terrain.json]
//! ```

fn main() {
    if let Err(err) = voxel_terrain::run() {
        log::error!("{}", err);
        std::process::exit(1);
    }
}
