// src/scheduler/mod.rs
// Adaptive work pacing: tile grids for static-camera convergence, downsampled
// preview resolution for camera motion. Both are pure per-frame feedback loops.
// RELEVANT FILES:src/scheduler/tile.rs,src/scheduler/preview.rs,src/pipeline/state.rs

pub mod preview;
pub mod tile;

pub use preview::PreviewResolution;
pub use tile::{TileDescriptor, TileScheduler};
