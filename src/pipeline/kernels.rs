// src/pipeline/kernels.rs
// Seams for the external compute kernels: integration, auxiliary-buffer generation,
// temporal reprojection, spatial denoise, tone map and anti-aliasing.
// The orchestrator sequences these and wires buffers; the filter/shading math lives behind the traits.
// RELEVANT FILES:src/pipeline/mod.rs,src/pipeline/targets.rs,src/pipeline/state.rs

use glam::Vec2;

use crate::camera::Camera;
use crate::config::{ReprojectFactors, SpatialFactors, ToneMapping};
use crate::environment::Environment;
use crate::geometry::GeometryBuffers;
use crate::lights::LightBuffer;
use crate::material::MaterialBuffer;

/// Scene-lifetime resources bound once per build
pub struct SceneResources {
    /// Flattened BVH records, uploaded
    pub bvh: wgpu::Buffer,
    /// BVH buffer length in four-float texels
    pub bvh_texel_count: u32,
    /// Longest root-to-leaf path of the flattened BVH. The integration
    /// kernel must provision its fixed traversal stack with at least this
    /// many slots.
    pub traversal_depth: u32,
    pub geometry: GeometryBuffers,
    pub lights: LightBuffer,
    pub materials: MaterialBuffer,
    pub environment: Environment,
}

/// Per-sample uniforms handed to the integration kernel
pub struct FrameUniforms<'a> {
    pub camera: Camera,
    /// Concatenated stratified sample vector in the declared per-bounce
    /// dimension layout
    pub sample_vector: &'a [f32],
    pub strata_count: u32,
    /// Sub-pixel jitter in UV units; zero when denoising
    pub jitter: [f32; 2],
    /// Monotonic sample index within the current convergence run
    pub sample_index: u32,
    pub render_width: u32,
    pub render_height: u32,
}

/// Scissor region for one unit of integration work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Attachment roles for the integration kernel
pub struct TraceTargets<'a> {
    /// HDR accumulation buffer; the kernel adds one sample's radiance
    /// (additive blend is part of its contract)
    pub accumulation: &'a wgpu::TextureView,
    /// Current G-buffer position target, for depth-of-field style feedback
    pub position: &'a wgpu::TextureView,
}

/// Path-integration kernel: one invocation accumulates one sample over the
/// given region. Deterministic for identical inputs.
pub trait TraceKernel {
    fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32);
    /// Rebind scene-lifetime buffers after a (re)build
    fn bind_scene(&mut self, device: &wgpu::Device, scene: &SceneResources);
    fn set_camera(&mut self, queue: &wgpu::Queue, camera: &Camera);
    /// Upload the per-sample uniforms before tracing
    fn begin_sample(&mut self, queue: &wgpu::Queue, frame: &FrameUniforms);
    fn trace(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        region: TileRegion,
        targets: &TraceTargets,
    );
}

/// Auxiliary-buffer generation (rasterized positions/normals/ids)
pub trait GBufferKernel {
    fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32);
    fn bind_scene(&mut self, device: &wgpu::Device, scene: &SceneResources);
    fn set_camera(&mut self, queue: &wgpu::Queue, camera: &Camera);
    fn render(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        targets: &crate::pipeline::targets::GBufferTargets,
    );
}

/// Buffer roles consumed and produced by temporal reprojection
pub struct ReprojectInputs<'a> {
    pub light: &'a wgpu::TextureView,
    pub position: &'a wgpu::TextureView,
    pub face_normal: &'a wgpu::TextureView,
    pub previous_light: &'a wgpu::TextureView,
    pub previous_position: &'a wgpu::TextureView,
    pub previous_face_normal: &'a wgpu::TextureView,
    pub previous_moment_variance: &'a wgpu::TextureView,
    /// Blended color output
    pub out_color: &'a wgpu::TextureView,
    /// Updated moment/variance/history-length output
    pub out_moment_variance: &'a wgpu::TextureView,
}

/// Temporal reprojection kernel
pub trait ReprojectKernel {
    fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32);
    /// View-projection of the camera the history buffers were rendered with
    fn set_history_camera(&mut self, queue: &wgpu::Queue, camera: &Camera);
    fn set_factors(&mut self, factors: ReprojectFactors);
    fn reproject(&mut self, encoder: &mut wgpu::CommandEncoder, inputs: ReprojectInputs);
}

/// Buffer roles for the spatial (edge-aware blur) denoise pass
pub struct SpatialInputs<'a> {
    pub light: &'a wgpu::TextureView,
    /// Moment/variance from the temporal pass; `None` when temporal
    /// denoising is disabled
    pub moment_variance: Option<&'a wgpu::TextureView>,
    pub gbuffer_position: &'a wgpu::TextureView,
    pub gbuffer_normal: &'a wgpu::TextureView,
    pub gbuffer_face_normal: &'a wgpu::TextureView,
}

/// Spatial denoise kernel; iterates internally (owns its scratch pair) and
/// returns the view holding the final iteration
pub trait SpatialDenoiseKernel {
    fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32);
    fn set_factors(&mut self, factors: SpatialFactors);
    fn denoise<'a>(
        &'a mut self,
        encoder: &mut wgpu::CommandEncoder,
        inputs: SpatialInputs,
    ) -> &'a wgpu::TextureView;
}

/// Tone mapping to the presentation target, or to an internal intermediate
/// when anti-aliasing follows
pub trait ToneMapKernel {
    fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32);
    fn set_operator(&mut self, operator: ToneMapping);
    /// `light_scale` < 1 upsamples a low-res preview to the full frame
    fn present(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        light: &wgpu::TextureView,
        light_scale: Vec2,
        target: &wgpu::TextureView,
    );
    fn to_intermediate<'a>(
        &'a mut self,
        encoder: &mut wgpu::CommandEncoder,
        light: &wgpu::TextureView,
        light_scale: Vec2,
    ) -> &'a wgpu::TextureView;
}

/// Post anti-aliasing over the tone-mapped image
pub trait FxaaKernel {
    fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32);
    fn apply(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        light: &wgpu::TextureView,
        target: &wgpu::TextureView,
    );
}

/// The full kernel set the orchestrator sequences
pub struct RenderKernels {
    pub trace: Box<dyn TraceKernel>,
    pub gbuffer: Box<dyn GBufferKernel>,
    pub reproject: Box<dyn ReprojectKernel>,
    pub spatial: Box<dyn SpatialDenoiseKernel>,
    pub tone_map: Box<dyn ToneMapKernel>,
    /// Optional; when absent, spatial-denoise output is presented without AA
    pub fxaa: Option<Box<dyn FxaaKernel>>,
}
