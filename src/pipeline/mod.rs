// src/pipeline/mod.rs
// Pipeline orchestrator: owns every render target, sequences the external kernels
// per the frame planner's decisions and manages scene build / buffer lifetimes.
// All GPU command issuance happens synchronously on the caller's thread; the only
// cross-thread traffic is the background BVH channel.
// RELEVANT FILES:src/pipeline/state.rs,src/pipeline/targets.rs,src/pipeline/kernels.rs

pub mod kernels;
pub mod state;
pub mod targets;

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use glam::{Vec2, Vec3};
use log::warn;

use crate::accel::{AsyncBvhBuilder, BuildMode, BvhTask};
use crate::camera::Camera;
use crate::config::{RendererOptions, ReprojectFactors, SpatialFactors, ToneMapping};
use crate::environment::{Environment, EnvironmentMap};
use crate::error::{RenderError, RenderResult};
use crate::geometry::Geometry;
use crate::gpu::{align_copy_bpr, RenderContext};
use crate::lights::{Light, LightBuffer};
use crate::material::{Material, MaterialBuffer};
use crate::sampler::stratified::SimpleRng;
use crate::sampler::{sampling_dimensions, StratifiedSamplerCombined};

use kernels::{
    FrameUniforms, RenderKernels, ReprojectInputs, SceneResources, SpatialInputs, TileRegion,
    TraceTargets,
};
use state::{
    CameraUpdate, DenoiseChain, FinishFrame, FrameAction, FramePlanner, FullFrameAction,
    FullFrameStep, PreviewStep, SeedAction, TileStep, STRATIFIED_STRATA,
};
use targets::RenderTargets;

/// Scene inputs handed to `build_scene`
pub struct SceneDescription {
    pub geometry: Geometry,
    pub lights: Vec<Light>,
    pub materials: Vec<Material>,
    pub environment: Option<EnvironmentMap>,
    /// Flat background used when no environment map is given or its
    /// encoding is rejected
    pub background_color: Vec3,
}

/// Which buffer the temporal pass treats as last frame's shaded result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HistoryRef {
    Accumulation,
    /// Physical reprojection slot index; survives ping-pong swaps
    Reproject(usize),
}

/// Wall-clock frame timer feeding the adaptive controllers
struct FrameClock {
    last: Option<Instant>,
}

impl FrameClock {
    fn new() -> Self {
        Self { last: None }
    }

    fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let elapsed = self
            .last
            .map(|last| now.duration_since(last).as_secs_f32() * 1000.0)
            .unwrap_or(0.0);
        self.last = Some(now);
        elapsed
    }

    fn restart(&mut self) {
        self.last = None;
    }
}

/// Scene-lifetime CPU/GPU data staged while the BVH build resolves
struct StagedScene {
    geometry_buffers: crate::geometry::GeometryBuffers,
    lights: LightBuffer,
    materials: MaterialBuffer,
    environment: Environment,
}

/// Progressive rendering pipeline. Single-threaded per frame tick: exactly
/// one writer issues GPU commands, so double-buffered state needs no locks.
pub struct RenderPipeline {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    planner: FramePlanner,
    kernels: RenderKernels,
    targets: Option<RenderTargets>,
    scene: Option<SceneResources>,
    staged: Option<StagedScene>,
    bvh_builder: AsyncBvhBuilder,
    pending_build: Option<BvhTask>,
    sampler: Option<StratifiedSamplerCombined>,
    strata_count: u32,
    current_camera: Camera,
    history: HistoryRef,
    clock: FrameClock,
    rng: SimpleRng,
    seed_counter: u64,
    full_sample_callback: Option<Box<dyn FnMut(u32)>>,
}

impl RenderPipeline {
    pub fn new(ctx: &RenderContext, kernels: RenderKernels, options: RendererOptions) -> Self {
        let tier = ctx.tier();
        Self {
            device: Arc::clone(&ctx.device),
            queue: Arc::clone(&ctx.queue),
            planner: FramePlanner::new(options, tier),
            kernels,
            targets: None,
            scene: None,
            staged: None,
            bvh_builder: AsyncBvhBuilder::new(),
            pending_build: None,
            sampler: None,
            strata_count: 1,
            current_camera: Camera::default(),
            history: HistoryRef::Accumulation,
            clock: FrameClock::new(),
            rng: SimpleRng::new(0x6c75_6365),
            seed_counter: 0,
            full_sample_callback: None,
        }
    }

    /// Host callback fired once per completed full-resolution sample
    pub fn on_full_sample(&mut self, callback: impl FnMut(u32) + 'static) {
        self.full_sample_callback = Some(Box::new(callback));
    }

    pub fn samples_rendered(&self) -> u32 {
        self.planner.samples_rendered()
    }

    pub fn is_ready(&self) -> bool {
        self.planner.is_ready()
    }

    pub fn options(&self) -> &RendererOptions {
        self.planner.options()
    }

    /// Allocate (or reallocate) every render target and resize the kernels
    /// and adaptive controllers
    pub fn set_size(&mut self, width: u32, height: u32) {
        let width = width.max(1);
        let height = height.max(1);

        self.targets = Some(RenderTargets::new(&self.device, width, height));
        self.kernels.trace.resize(&self.device, width, height);
        self.kernels.gbuffer.resize(&self.device, width, height);
        self.kernels.reproject.resize(&self.device, width, height);
        self.kernels.spatial.resize(&self.device, width, height);
        self.kernels.tone_map.resize(&self.device, width, height);
        if let Some(fxaa) = self.kernels.fxaa.as_mut() {
            fxaa.resize(&self.device, width, height);
        }

        self.planner.set_size(width, height);
        self.history = HistoryRef::Accumulation;
        self.clock.restart();
        self.update_ready();
    }

    /// Restart accumulation (host toggled an option mid-run)
    pub fn reset(&mut self) {
        self.planner.reset();
        if let Some(targets) = &self.targets {
            let mut encoder = self
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("reset-encoder"),
                });
            targets.clear_history(&mut encoder);
            self.queue.submit([encoder.finish()]);
        }
        self.history = HistoryRef::Accumulation;
    }

    pub fn set_tone_mapping(&mut self, tone_mapping: ToneMapping) {
        self.planner.options_mut().tone_mapping = tone_mapping;
        self.kernels.tone_map.set_operator(tone_mapping);
    }

    pub fn set_bounces(&mut self, bounces: u32) {
        self.planner.options_mut().bounces = bounces;
        // dimension layout changed; the next reseed rebuilds the decks
        self.sampler = None;
    }

    pub fn set_denoise_enabled(&mut self, enabled: bool) {
        self.planner.options_mut().enable_denoise = enabled;
    }

    pub fn set_temporal_denoise_enabled(&mut self, enabled: bool) {
        self.planner.options_mut().enable_temporal_denoise = enabled;
    }

    pub fn set_spatial_denoise_enabled(&mut self, enabled: bool) {
        self.planner.options_mut().enable_spatial_denoise = enabled;
    }

    pub fn set_moving_downsampling(&mut self, enabled: bool) {
        self.planner.options_mut().moving_downsampling = enabled;
    }

    pub fn set_reproject_factors(&mut self, factors: ReprojectFactors) {
        self.planner.options_mut().reproject = factors;
        self.kernels.reproject.set_factors(factors);
    }

    pub fn set_spatial_factors(&mut self, factors: SpatialFactors) {
        self.planner.options_mut().spatial = factors;
        self.kernels.spatial.set_factors(factors);
    }

    /// Stage scene data and kick the spatial-index build. With background
    /// builds enabled this returns once the build thread is running; call
    /// `poll_build` (or just keep drawing) until the pipeline reports ready.
    pub fn build_scene(&mut self, scene: SceneDescription) -> Result<()> {
        self.planner.set_ready(false);
        self.scene = None;

        scene
            .geometry
            .validate()
            .context("scene geometry rejected")?;

        let geometry_buffers = scene.geometry.upload(&self.device);
        let environment = scene
            .environment
            .as_ref()
            .map(|map| map.prepare_or_fallback(scene.background_color))
            .unwrap_or(Environment::Constant(scene.background_color));

        self.staged = Some(StagedScene {
            geometry_buffers,
            lights: LightBuffer::pack(&scene.lights),
            materials: MaterialBuffer::pack(&scene.materials),
            environment,
        });

        let mode = if self.planner.options().use_background_build {
            BuildMode::Background
        } else {
            BuildMode::Blocking
        };
        let task = self
            .bvh_builder
            .build(scene.geometry, mode)
            .context("failed to start BVH build")?;
        self.pending_build = Some(task);

        if mode == BuildMode::Blocking {
            self.poll_build().context("blocking BVH build failed")?;
        }
        Ok(())
    }

    /// Integrate a finished background build. Returns true once the scene
    /// is resolved; a build failure surfaces here and leaves the previous
    /// scene (if any) untouched.
    pub fn poll_build(&mut self) -> RenderResult<bool> {
        let Some(task) = self.pending_build.as_mut() else {
            return Ok(self.scene.is_some());
        };

        match task.try_resolve() {
            None => Ok(false),
            Some(Err(e)) => {
                self.pending_build = None;
                Err(e)
            }
            Some(Ok(flattened)) => {
                self.pending_build = None;
                let staged = self
                    .staged
                    .take()
                    .ok_or_else(|| RenderError::build("BVH resolved without staged scene data"))?;

                let scene = SceneResources {
                    bvh: flattened.upload(&self.device),
                    bvh_texel_count: flattened.count,
                    traversal_depth: flattened.max_depth,
                    geometry: staged.geometry_buffers,
                    lights: staged.lights,
                    materials: staged.materials,
                    environment: staged.environment,
                };

                self.kernels.trace.bind_scene(&self.device, &scene);
                self.kernels.gbuffer.bind_scene(&self.device, &scene);
                self.scene = Some(scene);
                self.update_ready();
                Ok(true)
            }
        }
    }

    /// Per-tick entry: tiled progressive accumulation when
    /// `use_tile_render` is set, one full-resolution sample otherwise
    pub fn render(&mut self, camera: &Camera) {
        if self.planner.options().use_tile_render {
            self.draw(camera);
        } else {
            self.full_draw(camera);
        }
    }

    /// Tiled progressive mode: one adaptive tile of one sample per call
    pub fn draw(&mut self, camera: &Camera) {
        if !camera_is_finite(camera) {
            warn!("draw skipped: camera contains non-finite values");
            return;
        }
        self.poll_build_quietly();
        let elapsed = self.clock.tick();

        match self.planner.plan_draw(camera, elapsed) {
            FrameAction::NotReady => {}
            FrameAction::WarmUp(update) => self.apply_cameras(&update),
            FrameAction::Tile(step) => self.execute_tile(step),
            FrameAction::Preview(step) => self.execute_preview(step),
        }
    }

    /// Full-frame mode: one full-resolution sample per call
    pub fn full_draw(&mut self, camera: &Camera) {
        if !camera_is_finite(camera) {
            warn!("full_draw skipped: camera contains non-finite values");
            return;
        }
        self.poll_build_quietly();
        let elapsed = self.clock.tick();

        match self.planner.plan_full_draw(camera, elapsed) {
            FullFrameAction::NotReady => {}
            FullFrameAction::Preview { swap_buffers, step } => {
                if swap_buffers {
                    self.swap_frame_buffers();
                }
                self.execute_preview(step);
            }
            FullFrameAction::Full { swap_buffers, step } => {
                if swap_buffers {
                    self.swap_frame_buffers();
                }
                self.execute_full(step);
            }
        }
    }

    /// Tone-mapped presentation target, for hosts that blit instead of
    /// reading back
    pub fn presentation_view(&self) -> Option<&wgpu::TextureView> {
        self.targets.as_ref().map(|t| &t.present.view)
    }

    /// Read the presentation target back as tightly packed RGBA8
    pub fn read_presented(&self) -> RenderResult<Vec<u8>> {
        let targets = self
            .targets
            .as_ref()
            .ok_or_else(|| RenderError::readback("no targets allocated"))?;
        let (width, height) = (targets.width, targets.height);

        let row_bytes = width * 8; // rgba16f
        let padded_bpr = align_copy_bpr(row_bytes);
        let read_size = padded_bpr as u64 * height as u64;
        let read_buf = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("present-read"),
            size: read_size,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("present-read-encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture: &targets.present.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &read_buf,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_bpr),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit([encoder.finish()]);

        let slice = read_buf.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |res| {
            let _ = tx.send(res);
        });
        self.device.poll(wgpu::Maintain::Wait);
        rx.recv()
            .map_err(|_| RenderError::readback("map_async channel closed"))?
            .map_err(|e| RenderError::readback(format!("map_async failed: {e:?}")))?;
        let data = slice.get_mapped_range();

        let mut out = vec![0u8; width as usize * height as usize * 4];
        let src_stride = padded_bpr as usize;
        let dst_stride = width as usize * 4;
        for y in 0..height as usize {
            let row = &data[y * src_stride..y * src_stride + width as usize * 8];
            for x in 0..width as usize {
                let o = x * 8;
                let channel = |i: usize| {
                    half::f16::from_bits(u16::from_le_bytes([row[o + 2 * i], row[o + 2 * i + 1]]))
                        .to_f32()
                };
                let ix = y * dst_stride + x * 4;
                out[ix] = (channel(0).clamp(0.0, 1.0) * 255.0 + 0.5) as u8;
                out[ix + 1] = (channel(1).clamp(0.0, 1.0) * 255.0 + 0.5) as u8;
                out[ix + 2] = (channel(2).clamp(0.0, 1.0) * 255.0 + 0.5) as u8;
                out[ix + 3] = 255;
            }
        }

        drop(data);
        read_buf.unmap();
        Ok(out)
    }

    // ---------- frame execution ----------

    fn execute_tile(&mut self, step: TileStep) {
        if let Some(update) = &step.cameras {
            self.apply_cameras(update);
        }
        let Some((width, height)) = self.target_size() else {
            return;
        };

        if let Some(seed) = step.begin_pass {
            self.apply_seed(seed, width, height, true);
        }
        if step.anchor_history {
            let camera = self.current_camera;
            self.kernels
                .reproject
                .set_history_camera(&self.queue, &camera);
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("tile-encoder"),
            });
        {
            let targets = self.targets.as_ref().unwrap();
            if step.clear_accumulation {
                targets.accumulation.clear(&mut encoder);
            }
            if step.begin_pass.is_some() {
                self.kernels
                    .gbuffer
                    .render(&mut encoder, targets.gbuffer.front());
            }
            self.kernels.trace.trace(
                &mut encoder,
                TileRegion {
                    x: step.tile.x,
                    y: step.tile.y,
                    width: step.tile.width,
                    height: step.tile.height,
                },
                &TraceTargets {
                    accumulation: &targets.accumulation.view,
                    position: &targets.gbuffer.front().position.view,
                },
            );
            if step.present_intermediate {
                self.kernels.tone_map.present(
                    &mut encoder,
                    &targets.accumulation.view,
                    Vec2::ONE,
                    &targets.present.view,
                );
            }
        }

        if let Some(finish) = &step.finish {
            match finish.denoise {
                Some(chain) => {
                    let _ = self.encode_denoise(&mut encoder, chain);
                }
                None => self.encode_present_accumulation(&mut encoder),
            }
        }

        self.queue.submit([encoder.finish()]);

        if let Some(finish) = step.finish {
            self.finish_frame(&finish);
        }
    }

    fn execute_full(&mut self, step: FullFrameStep) {
        self.apply_cameras(&step.cameras);
        let Some((width, height)) = self.target_size() else {
            return;
        };

        self.apply_seed(step.seed, width, height, true);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("full-frame-encoder"),
            });
        {
            let targets = self.targets.as_ref().unwrap();
            if step.clear_accumulation {
                targets.accumulation.clear(&mut encoder);
            }
            self.kernels
                .gbuffer
                .render(&mut encoder, targets.gbuffer.front());
            self.kernels.trace.trace(
                &mut encoder,
                TileRegion {
                    x: 0,
                    y: 0,
                    width,
                    height,
                },
                &TraceTargets {
                    accumulation: &targets.accumulation.view,
                    position: &targets.gbuffer.front().position.view,
                },
            );
        }

        match step.denoise {
            Some(chain) => {
                self.history = self.encode_denoise(&mut encoder, chain);
            }
            None => {
                self.encode_present_accumulation(&mut encoder);
                self.history = HistoryRef::Accumulation;
            }
        }

        self.queue.submit([encoder.finish()]);

        if step.count_sample {
            self.fire_sample_callback();
        }
    }

    fn execute_preview(&mut self, step: PreviewStep) {
        if let Some(update) = &step.cameras {
            self.apply_cameras(update);
        }
        if self.target_size().is_none() {
            return;
        }

        // previews never jitter
        self.apply_seed(step.seed, step.render_width, step.render_height, false);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("preview-encoder"),
            });
        {
            let targets = self.targets.as_ref().unwrap();
            self.kernels.trace.trace(
                &mut encoder,
                TileRegion {
                    x: 0,
                    y: 0,
                    width: step.render_width.min(targets.width),
                    height: step.render_height.min(targets.height),
                },
                &TraceTargets {
                    accumulation: &targets.accumulation.view,
                    position: &targets.gbuffer.front().position.view,
                },
            );
            // upscale the low-res corner back to the full frame, then drop it
            self.kernels.tone_map.present(
                &mut encoder,
                &targets.accumulation.view,
                step.scale,
                &targets.present.view,
            );
            targets.accumulation.clear(&mut encoder);
        }

        self.queue.submit([encoder.finish()]);
        self.history = HistoryRef::Accumulation;
    }

    /// Tone map the raw accumulation into the presentation target
    fn encode_present_accumulation(&mut self, encoder: &mut wgpu::CommandEncoder) {
        let targets = self.targets.as_ref().unwrap();
        self.kernels.tone_map.present(
            encoder,
            &targets.accumulation.view,
            Vec2::ONE,
            &targets.present.view,
        );
    }

    /// Encode the denoise chain; returns the history source the next
    /// temporal pass should read as "previous light"
    fn encode_denoise(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        chain: DenoiseChain,
    ) -> HistoryRef {
        let targets = self.targets.as_ref().unwrap();
        let kernels = &mut self.kernels;

        if chain.temporal {
            let previous_light = match self.history {
                HistoryRef::Accumulation => &targets.accumulation.view,
                HistoryRef::Reproject(slot) => &targets.reproject.get(slot).color.view,
            };
            kernels.reproject.reproject(
                encoder,
                ReprojectInputs {
                    light: &targets.accumulation.view,
                    position: &targets.gbuffer.front().position.view,
                    face_normal: &targets.gbuffer.front().face_normal.view,
                    previous_light,
                    previous_position: &targets.gbuffer.back().position.view,
                    previous_face_normal: &targets.gbuffer.back().face_normal.view,
                    previous_moment_variance: &targets.reproject.back().moment_variance.view,
                    out_color: &targets.reproject.front().color.view,
                    out_moment_variance: &targets.reproject.front().moment_variance.view,
                },
            );
        }

        let (light, moment_variance, history) = if chain.temporal {
            (
                &targets.reproject.front().color.view,
                Some(&targets.reproject.back().moment_variance.view),
                HistoryRef::Reproject(targets.reproject.front_index()),
            )
        } else {
            (&targets.accumulation.view, None, HistoryRef::Accumulation)
        };

        if chain.spatial {
            let denoised = kernels.spatial.denoise(
                encoder,
                SpatialInputs {
                    light,
                    moment_variance,
                    gbuffer_position: &targets.gbuffer.front().position.view,
                    gbuffer_normal: &targets.gbuffer.front().normal.view,
                    gbuffer_face_normal: &targets.gbuffer.front().face_normal.view,
                },
            );
            present_antialiased(
                kernels.tone_map.as_mut(),
                kernels.fxaa.as_deref_mut(),
                encoder,
                denoised,
                &targets.present.view,
            );
        } else {
            present_antialiased(
                kernels.tone_map.as_mut(),
                kernels.fxaa.as_deref_mut(),
                encoder,
                light,
                &targets.present.view,
            );
        }

        history
    }

    // ---------- helpers ----------

    fn finish_frame(&mut self, finish: &FinishFrame) {
        if finish.swap_buffers {
            self.swap_frame_buffers();
        }
        // tiled history always re-anchors to the accumulation buffer
        self.history = HistoryRef::Accumulation;
        if finish.count_sample {
            self.fire_sample_callback();
        }
    }

    fn target_size(&self) -> Option<(u32, u32)> {
        self.targets.as_ref().map(|t| (t.width, t.height))
    }

    fn poll_build_quietly(&mut self) {
        if let Err(e) = self.poll_build() {
            warn!("background BVH build failed: {e}");
        }
    }

    fn update_ready(&mut self) {
        let ready = self.scene.is_some() && self.targets.is_some();
        self.planner.set_ready(ready);
    }

    fn apply_cameras(&mut self, update: &CameraUpdate) {
        self.current_camera = update.camera;
        self.kernels.trace.set_camera(&self.queue, &update.camera);
        self.kernels.gbuffer.set_camera(&self.queue, &update.camera);
        self.kernels
            .reproject
            .set_history_camera(&self.queue, &update.history_camera);
    }

    /// Reseed/advance the sampler per the plan and push this sample's
    /// uniforms to the integration kernel
    fn apply_seed(&mut self, action: SeedAction, width: u32, height: u32, allow_jitter: bool) {
        match action {
            SeedAction::BeginUniform => self.set_strata_count(1),
            SeedAction::SwitchStratified => self.set_strata_count(STRATIFIED_STRATA),
            SeedAction::Advance => self.ensure_sampler(),
        }

        let use_jitter = allow_jitter && !self.planner.options().enable_denoise;
        let jitter = if use_jitter {
            [
                (self.rng.next_f32() - 0.5) / width as f32,
                (self.rng.next_f32() - 0.5) / height as f32,
            ]
        } else {
            [0.0, 0.0]
        };

        let sample_index = self.planner.samples_rendered();
        let camera = self.current_camera;
        let strata_count = self.strata_count;
        let sampler = self.sampler.as_mut().expect("sampler initialized above");
        let frame = FrameUniforms {
            camera,
            sample_vector: sampler.next(),
            strata_count,
            jitter,
            sample_index,
            render_width: width,
            render_height: height,
        };
        self.kernels.trace.begin_sample(&self.queue, &frame);
    }

    /// Rebuild the stratified decks only when the strata count actually
    /// changes; otherwise just restart the cycle
    fn set_strata_count(&mut self, count: u32) {
        let needs_rebuild = match &self.sampler {
            None => true,
            Some(s) => count > 1 && s.strata_count() != count,
        };
        self.strata_count = count;
        if needs_rebuild {
            self.rebuild_sampler(count);
        } else if let Some(sampler) = self.sampler.as_mut() {
            sampler.restart();
        }
    }

    fn ensure_sampler(&mut self) {
        if self.sampler.is_none() {
            self.rebuild_sampler(self.strata_count);
        }
    }

    fn rebuild_sampler(&mut self, strata_count: u32) {
        let dims = sampling_dimensions(self.planner.options().clamped_bounces());
        self.seed_counter += 1;
        self.sampler = Some(StratifiedSamplerCombined::new(
            strata_count,
            &dims,
            0x9e3779b97f4a7c15 ^ self.seed_counter,
        ));
    }

    fn swap_frame_buffers(&mut self) {
        if let Some(targets) = self.targets.as_mut() {
            targets.gbuffer.swap();
            targets.reproject.swap();
        }
    }

    fn fire_sample_callback(&mut self) {
        let count = self.planner.samples_rendered();
        if let Some(callback) = self.full_sample_callback.as_mut() {
            callback(count);
        }
    }
}

/// Tone map through the intermediate + FXAA when available, straight to the
/// presentation target otherwise
fn present_antialiased(
    tone_map: &mut dyn kernels::ToneMapKernel,
    fxaa: Option<&mut (dyn kernels::FxaaKernel + 'static)>,
    encoder: &mut wgpu::CommandEncoder,
    light: &wgpu::TextureView,
    present: &wgpu::TextureView,
) {
    match fxaa {
        Some(fxaa) => {
            let tone_mapped = tone_map.to_intermediate(encoder, light, Vec2::ONE);
            fxaa.apply(encoder, tone_mapped, present);
        }
        None => {
            tone_map.present(encoder, light, Vec2::ONE, present);
        }
    }
}

fn camera_is_finite(camera: &Camera) -> bool {
    camera.transform.is_finite() && camera.aspect.is_finite() && camera.fov_y_degrees.is_finite()
}
