// src/pipeline/state.rs
// Denoise state machine / frame planner: decides which passes run each frame.
// Pure decision logic over the adaptive controllers; owns no GPU state, so every
// branch of the orchestration is testable without a device.
// RELEVANT FILES:src/pipeline/mod.rs,src/scheduler/tile.rs,src/scheduler/preview.rs

use glam::Vec2;
use log::debug;

use crate::camera::Camera;
use crate::config::RendererOptions;
use crate::gpu::DeviceTier;
use crate::scheduler::{PreviewResolution, TileDescriptor, TileScheduler};

/// Samples rendered with plain uniform noise before switching to the
/// stratified generator
pub const NUM_UNIFORM_SAMPLES: u32 = 4;

/// Strata count used once stratified sampling kicks in
pub const STRATIFIED_STRATA: u32 = 6;

/// How the sampler is (re)seeded at the start of a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedAction {
    /// Fresh convergence run: fall back to a single uniform stratum
    BeginUniform,
    /// Enough uniform samples accumulated: rebuild with stratified decks
    SwitchStratified,
    /// Mid-run: draw the next sample vector
    Advance,
}

/// Camera uniforms to push before drawing: the pose for this frame and the
/// pose the history buffers were rendered with
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraUpdate {
    pub camera: Camera,
    pub history_camera: Camera,
}

/// Which denoise passes run at the end of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DenoiseChain {
    pub temporal: bool,
    pub spatial: bool,
}

/// End-of-frame work: denoise + present, swap both ping-pong pairs, count
/// the completed sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FinishFrame {
    /// `None` presents the raw accumulation tone-mapped
    pub denoise: Option<DenoiseChain>,
    pub swap_buffers: bool,
    pub count_sample: bool,
}

/// One tile-mode step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileStep {
    pub cameras: Option<CameraUpdate>,
    pub tile: TileDescriptor,
    /// Clear the accumulation buffer before adding this sample
    pub clear_accumulation: bool,
    /// Re-anchor the reprojection history camera to the current pose
    pub anchor_history: bool,
    /// Present-tile work at the start of a pass: reseed + G-buffer render
    pub begin_pass: Option<SeedAction>,
    /// Tone map the partial accumulation so the host sees progress
    pub present_intermediate: bool,
    pub finish: Option<FinishFrame>,
}

/// One downsampled preview step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewStep {
    pub cameras: Option<CameraUpdate>,
    pub seed: SeedAction,
    pub render_width: u32,
    pub render_height: u32,
    pub scale: Vec2,
}

/// Planned work for a tiled-progressive `draw` call
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameAction {
    /// Scene not built yet; nothing to do
    NotReady,
    /// First frame after a resize/build: push cameras, render nothing
    WarmUp(CameraUpdate),
    Tile(TileStep),
    Preview(PreviewStep),
}

/// One full-frame-mode sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FullFrameStep {
    pub cameras: CameraUpdate,
    pub clear_accumulation: bool,
    pub seed: SeedAction,
    pub denoise: Option<DenoiseChain>,
    pub count_sample: bool,
}

/// Planned work for a `full_draw` call
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FullFrameAction {
    NotReady,
    /// Buffers were swapped up front; then the camera moved with
    /// downsampling enabled, so only a preview renders
    Preview { swap_buffers: bool, step: PreviewStep },
    Full { swap_buffers: bool, step: FullFrameStep },
}

/// Frame planner and denoise state machine. Decides, per frame, which passes
/// run, what gets cleared, when the ping-pong pairs swap and when the sample
/// counter advances; the executor applies the plan to GPU resources.
pub struct FramePlanner {
    options: RendererOptions,
    ready: bool,
    first_frame: bool,
    sample_count: u32,
    last_camera: Option<Camera>,
    tiles: TileScheduler,
    preview: PreviewResolution,
}

impl FramePlanner {
    pub fn new(options: RendererOptions, tier: DeviceTier) -> Self {
        Self {
            options,
            ready: false,
            first_frame: true,
            sample_count: 0,
            last_camera: None,
            tiles: TileScheduler::new(tier),
            preview: PreviewResolution::new(tier),
        }
    }

    pub fn options(&self) -> &RendererOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut RendererOptions {
        &mut self.options
    }

    /// Monotonic count of completed full-resolution samples in the current
    /// convergence run
    pub fn samples_rendered(&self) -> u32 {
        self.sample_count
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Scene resolved and targets allocated
    pub fn set_ready(&mut self, ready: bool) {
        self.ready = ready;
    }

    pub fn set_size(&mut self, width: u32, height: u32) {
        self.tiles.set_size(width, height);
        self.preview.set_size(width, height);
        self.first_frame = true;
        self.sample_count = 0;
    }

    /// Restart accumulation without touching cameras (option changes)
    pub fn reset(&mut self) {
        self.sample_count = 0;
        self.tiles.reset();
    }

    /// Plan one tiled-progressive frame
    pub fn plan_draw(&mut self, camera: &Camera, elapsed_ms: f32) -> FrameAction {
        if !self.ready {
            debug!("draw ignored: pipeline not ready");
            return FrameAction::NotReady;
        }

        let moved = self
            .last_camera
            .map_or(true, |last| !last.approx_eq(camera));

        if !moved {
            return FrameAction::Tile(self.tile_step(None, elapsed_ms, false));
        }

        let cameras = self.update_cameras(camera);

        let action = if self.first_frame {
            self.first_frame = false;
            FrameAction::WarmUp(cameras)
        } else if self.options.moving_downsampling {
            FrameAction::Preview(self.preview_step(Some(cameras), elapsed_ms))
        } else {
            FrameAction::Tile(self.tile_step(Some(cameras), elapsed_ms, true))
        };

        // The cleared accumulation lands on the next pass's first tile
        self.sample_count = 0;
        self.tiles.reset();
        action
    }

    /// Plan one full-frame sample
    pub fn plan_full_draw(&mut self, camera: &Camera, elapsed_ms: f32) -> FullFrameAction {
        if !self.ready {
            debug!("full_draw ignored: pipeline not ready");
            return FullFrameAction::NotReady;
        }

        // The current frame writes into what was the back buffer
        let swap_buffers = true;

        let moved = self
            .last_camera
            .map_or(true, |last| !last.approx_eq(camera));

        let mut clear_accumulation = false;
        if !moved {
            self.sample_count += 1;
        } else if self.options.moving_downsampling {
            let cameras = self.update_cameras(camera);
            self.sample_count = 0;
            return FullFrameAction::Preview {
                swap_buffers,
                step: self.preview_step(Some(cameras), elapsed_ms),
            };
        } else {
            // previous frame may have been a preview image
            self.sample_count = 0;
            clear_accumulation = true;
        }

        let cameras = self.update_cameras(camera);
        let seed = self.seed_action();
        self.first_frame = false;

        FullFrameAction::Full {
            swap_buffers,
            step: FullFrameStep {
                cameras,
                clear_accumulation,
                seed,
                denoise: self.denoise_chain(),
                count_sample: true,
            },
        }
    }

    fn update_cameras(&mut self, camera: &Camera) -> CameraUpdate {
        let history_camera = self.last_camera.unwrap_or(*camera);
        self.last_camera = Some(*camera);
        CameraUpdate {
            camera: *camera,
            history_camera,
        }
    }

    fn tile_step(
        &mut self,
        cameras: Option<CameraUpdate>,
        elapsed_ms: f32,
        present_while_drawing: bool,
    ) -> TileStep {
        let tile = self.tiles.next_tile(elapsed_ms);

        let fresh_run = self.sample_count == 0;
        let begin_pass = tile.is_first_tile.then(|| self.seed_action());

        let finish = tile.is_last_tile.then(|| FinishFrame {
            denoise: self.denoise_chain(),
            swap_buffers: true,
            count_sample: true,
        });
        if finish.is_some() {
            self.sample_count += 1;
        }

        TileStep {
            cameras,
            tile,
            clear_accumulation: tile.is_first_tile && fresh_run,
            anchor_history: tile.is_first_tile && fresh_run,
            begin_pass,
            present_intermediate: present_while_drawing && !tile.is_last_tile,
            finish,
        }
    }

    fn preview_step(&mut self, cameras: Option<CameraUpdate>, elapsed_ms: f32) -> PreviewStep {
        self.preview.adjust(elapsed_ms);
        PreviewStep {
            cameras,
            seed: self.seed_action(),
            render_width: self.preview.render_width(),
            render_height: self.preview.render_height(),
            scale: self.preview.scale(),
        }
    }

    fn seed_action(&self) -> SeedAction {
        if self.sample_count == 0 {
            SeedAction::BeginUniform
        } else if self.sample_count == NUM_UNIFORM_SAMPLES {
            SeedAction::SwitchStratified
        } else {
            SeedAction::Advance
        }
    }

    fn denoise_chain(&self) -> Option<DenoiseChain> {
        self.options.denoise_active().then(|| DenoiseChain {
            temporal: self.options.enable_temporal_denoise,
            spatial: self.options.enable_spatial_denoise,
        })
    }
}
