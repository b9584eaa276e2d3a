// src/scheduler/preview.rs
// Adaptive preview resolution - a global downsample scale for fast feedback while the camera moves.
// Same feedback-control shape as the tile scheduler, applied to whole-frame pixel count.
// RELEVANT FILES:src/scheduler/tile.rs,src/pipeline/state.rs,src/pipeline/mod.rs

use glam::Vec2;

use crate::gpu::DeviceTier;

/// Target whole-frame cost in milliseconds while moving
const DESIRED_MS_PER_FRAME: f32 = 20.0;

/// Feedback gain for the pixels-per-frame budget
const ADJUST_STRENGTH: f32 = 600.0;

/// Lower clamp for the preview pixel budget
const MIN_PIXELS_PER_FRAME: f32 = 8192.0;

/// Derives a downsampled render resolution from a running pixels-per-frame
/// budget. Only consulted while the camera is actively moving.
pub struct PreviewResolution {
    full_width: u32,
    full_height: u32,
    render_width: u32,
    render_height: u32,
    pixels_per_frame: f32,
    scale: Vec2,
}

impl PreviewResolution {
    pub fn new(tier: DeviceTier) -> Self {
        Self {
            full_width: 0,
            full_height: 0,
            render_width: 1,
            render_height: 1,
            pixels_per_frame: tier.pixels_per_frame_estimate(),
            scale: Vec2::ONE,
        }
    }

    pub fn set_size(&mut self, width: u32, height: u32) {
        self.full_width = width.max(1);
        self.full_height = height.max(1);
        self.calc_dimensions();
    }

    /// Feed the previous frame's cost into the control loop
    pub fn adjust(&mut self, elapsed_frame_ms: f32) {
        if !elapsed_frame_ms.is_finite() || elapsed_frame_ms <= 0.0 {
            return;
        }
        self.pixels_per_frame += ADJUST_STRENGTH * (DESIRED_MS_PER_FRAME - elapsed_frame_ms);
        let full = (self.full_width * self.full_height) as f32;
        self.pixels_per_frame = self
            .pixels_per_frame
            .clamp(MIN_PIXELS_PER_FRAME.min(full), full);
        self.calc_dimensions();
    }

    pub fn render_width(&self) -> u32 {
        self.render_width
    }

    pub fn render_height(&self) -> u32 {
        self.render_height
    }

    /// Ratio of preview resolution to full resolution, used to upscale the
    /// low-res result back to the full frame
    pub fn scale(&self) -> Vec2 {
        self.scale
    }

    fn calc_dimensions(&mut self) {
        let aspect_ratio = self.full_width as f32 / self.full_height as f32;
        let w = (self.pixels_per_frame * aspect_ratio)
            .sqrt()
            .clamp(1.0, self.full_width as f32)
            .round();
        let h = (w / aspect_ratio).clamp(1.0, self.full_height as f32).round();
        self.render_width = w as u32;
        self.render_height = h as u32;
        self.scale = Vec2::new(
            self.render_width as f32 / self.full_width as f32,
            self.render_height as f32 / self.full_height as f32,
        );
    }
}
