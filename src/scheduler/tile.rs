// src/scheduler/tile.rs
// Adaptive tile scheduler - paces per-tile work toward a target frame time.
// This file exists to partition the frame into a tile grid whose size self-corrects from frame timings.
// RELEVANT FILES:src/gpu.rs,src/scheduler/preview.rs,src/pipeline/state.rs

use crate::gpu::DeviceTier;

/// Target per-tile cost in milliseconds
const DESIRED_MS_PER_TILE: f32 = 21.0;

/// Feedback gain; higher converges faster at the cost of frame-rate dips
const ADJUST_STRENGTH: f32 = 5000.0;

/// Lower clamp for the tile pixel budget
const MIN_PIXELS_PER_TILE: f32 = 8192.0;

/// One rectangular unit of progressive work. Recomputed on every call;
/// always clipped to the frame, never overlapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileDescriptor {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub is_first_tile: bool,
    pub is_last_tile: bool,
}

/// Paces tiled accumulation. Keeps a running pixels-per-tile budget seeded
/// from the device tier; every completed grid pass nudges the budget toward
/// the 21 ms per-tile target and requantizes the grid.
pub struct TileScheduler {
    width: u32,
    height: u32,
    pixels_per_tile: f32,
    tile_width: u32,
    tile_height: u32,
    columns: u32,
    rows: u32,
    num_tiles: u32,
    current_tile: i64,
    /// None right after a reset, so a stale frame time never feeds the loop
    total_elapsed_ms: Option<f32>,
}

impl TileScheduler {
    pub fn new(tier: DeviceTier) -> Self {
        let mut scheduler = Self {
            width: 0,
            height: 0,
            pixels_per_tile: tier.pixels_per_tile_estimate(),
            tile_width: 1,
            tile_height: 1,
            columns: 1,
            rows: 1,
            num_tiles: 1,
            current_tile: -1,
            total_elapsed_ms: None,
        };
        scheduler.reset();
        scheduler
    }

    pub fn set_size(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
        self.reset();
        self.calc_tile_dimensions();
    }

    /// Force the next `next_tile` call to start a fresh pass with no stale
    /// elapsed-time contribution
    pub fn reset(&mut self) {
        self.current_tile = -1;
        self.total_elapsed_ms = None;
    }

    pub fn num_tiles(&self) -> u32 {
        self.num_tiles
    }

    pub fn pixels_per_tile(&self) -> f32 {
        self.pixels_per_tile
    }

    /// Advance the tile cursor. `elapsed_frame_ms` is the previous frame's
    /// cost; each time the cursor wraps to tile 0 the accumulated cost of
    /// the completed pass adjusts the budget.
    pub fn next_tile(&mut self, elapsed_frame_ms: f32) -> TileDescriptor {
        self.current_tile += 1;
        if let Some(total) = self.total_elapsed_ms.as_mut() {
            *total += elapsed_frame_ms;
        }

        if self.current_tile % self.num_tiles as i64 == 0 {
            if let Some(total) = self.total_elapsed_ms {
                self.update_pixels_per_tile(total);
                self.calc_tile_dimensions();
            }
            self.total_elapsed_ms = Some(0.0);
            self.current_tile = 0;
        }

        let tile = self.current_tile as u32;
        let col = tile % self.columns;
        let row = (tile / self.columns) % self.rows;

        let x = col * self.tile_width;
        let y = row * self.tile_height;

        TileDescriptor {
            x,
            y,
            width: self.tile_width.min(self.width - x),
            height: self.tile_height.min(self.height - y),
            is_first_tile: tile == 0,
            is_last_tile: tile == self.num_tiles - 1,
        }
    }

    fn update_pixels_per_tile(&mut self, total_elapsed_ms: f32) {
        let ms_per_tile = total_elapsed_ms / self.num_tiles as f32;
        let error = DESIRED_MS_PER_TILE - ms_per_tile;

        // sqrt damps the occasional stutter without stalling convergence
        self.pixels_per_tile += ADJUST_STRENGTH * error.signum() * error.abs().sqrt();
        let full = (self.width * self.height) as f32;
        self.pixels_per_tile = self.pixels_per_tile.clamp(MIN_PIXELS_PER_TILE.min(full), full);
    }

    fn calc_tile_dimensions(&mut self) {
        let width = self.width as f32;
        let height = self.height as f32;
        let aspect_ratio = width / height;

        // quantize the tile width so columns evenly divide the frame
        let ideal = (self.pixels_per_tile * aspect_ratio).sqrt();
        let columns_est = (width / ideal).round().max(1.0);
        self.tile_width = (width / columns_est).ceil() as u32;
        self.tile_height = ((self.tile_width as f32) / aspect_ratio).ceil() as u32;
        self.tile_width = self.tile_width.clamp(1, self.width);
        self.tile_height = self.tile_height.clamp(1, self.height);

        self.columns = (self.width + self.tile_width - 1) / self.tile_width;
        self.rows = (self.height + self.tile_height - 1) / self.tile_height;
        self.num_tiles = self.columns * self.rows;
    }
}
