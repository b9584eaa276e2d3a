//! Progressive GPU path tracer for static triangle-mesh scenes.
//! Rust: wgpu 0.19. Converges an image over many frames while adaptive tile
//! and resolution controllers keep each frame inside a latency budget.
//!
//! The crate splits into a spatial-index side (extract triangles, build a
//! SAH BVH, flatten it for iterative GPU traversal, optionally on a
//! background thread) and an orchestration side (double-buffered render
//! targets, stratified sampling, temporal/spatial denoise sequencing and
//! tone-mapped presentation). The shading and filter kernels themselves are
//! external collaborators behind the traits in [`pipeline::kernels`].

pub mod accel;
pub mod camera;
pub mod config;
pub mod environment;
pub mod error;
pub mod geometry;
pub mod gpu;
pub mod lights;
pub mod material;
pub mod pipeline;
pub mod sampler;
pub mod scheduler;

pub use accel::{AsyncBvhBuilder, BuildMode, BvhTask, FlattenedBvh};
pub use camera::{Camera, Lens};
pub use config::{RendererOptions, ReprojectFactors, SpatialFactors, ToneMapping};
pub use environment::{Environment, EnvironmentData, EnvironmentMap};
pub use error::{RenderError, RenderResult};
pub use geometry::Geometry;
pub use gpu::{DeviceTier, RenderContext};
pub use lights::{Light, LightBuffer};
pub use material::{Material, MaterialBuffer, Workflow};
pub use pipeline::kernels::RenderKernels;
pub use pipeline::{RenderPipeline, SceneDescription};
