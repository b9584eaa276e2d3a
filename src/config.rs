// src/config.rs
// Renderer configuration surface: pass toggles, tone-mapping operator and denoise tunables.
// This file exists to hold the serializable options hosts hand to the pipeline at construction.
// RELEVANT FILES:src/pipeline/state.rs,src/pipeline/kernels.rs,src/pipeline/mod.rs

use serde::{Deserialize, Serialize};

/// Supported bounce range; values outside are clamped, never rejected
pub const MIN_BOUNCES: u32 = 2;
pub const MAX_BOUNCES: u32 = 8;

/// Tone-mapping operator applied before presentation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToneMapping {
    Linear,
    AcesFilmic,
    Reinhard,
    Cineon,
}

impl ToneMapping {
    /// Stable operator index handed to the tone-map kernel
    pub fn kernel_index(self) -> u32 {
        match self {
            ToneMapping::Linear => 0,
            ToneMapping::AcesFilmic => 1,
            ToneMapping::Reinhard => 2,
            ToneMapping::Cineon => 3,
        }
    }
}

/// Blend factors for the temporal reprojection pass
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReprojectFactors {
    pub color_blend_factor: f32,
    pub moment_blend_factor: f32,
}

impl Default for ReprojectFactors {
    fn default() -> Self {
        Self {
            color_blend_factor: 0.2,
            moment_blend_factor: 0.2,
        }
    }
}

/// Edge-stopping factors for the spatial denoise pass
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpatialFactors {
    pub color_factor: f32,
    pub normal_factor: f32,
    pub position_factor: f32,
}

impl Default for SpatialFactors {
    fn default() -> Self {
        Self {
            color_factor: 0.5,
            normal_factor: 0.2,
            position_factor: 0.35,
        }
    }
}

/// Renderer options recognized by the pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RendererOptions {
    /// Global illumination bounces, clamped to [MIN_BOUNCES, MAX_BOUNCES]
    pub bounces: u32,
    pub tone_mapping: ToneMapping,
    /// Master denoise switch; the temporal/spatial toggles below only take
    /// effect while this is on
    pub enable_denoise: bool,
    pub enable_temporal_denoise: bool,
    pub enable_spatial_denoise: bool,
    /// Render a downsampled preview instead of restarting accumulation
    /// while the camera moves
    pub moving_downsampling: bool,
    /// Tiled progressive accumulation (`draw`) vs. one full-resolution
    /// sample per call (`full_draw`)
    pub use_tile_render: bool,
    /// Offload the BVH build to a background thread
    pub use_background_build: bool,
    pub reproject: ReprojectFactors,
    pub spatial: SpatialFactors,
}

impl Default for RendererOptions {
    fn default() -> Self {
        Self {
            bounces: 2,
            tone_mapping: ToneMapping::Linear,
            enable_denoise: false,
            enable_temporal_denoise: true,
            enable_spatial_denoise: true,
            moving_downsampling: false,
            use_tile_render: false,
            use_background_build: true,
            reproject: ReprojectFactors::default(),
            spatial: SpatialFactors::default(),
        }
    }
}

impl RendererOptions {
    pub fn clamped_bounces(&self) -> u32 {
        self.bounces.clamp(MIN_BOUNCES, MAX_BOUNCES)
    }

    /// Whether any denoise pass runs this frame
    pub fn denoise_active(&self) -> bool {
        self.enable_denoise && (self.enable_temporal_denoise || self.enable_spatial_denoise)
    }
}
