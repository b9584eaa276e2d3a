// src/gpu.rs
// GPU device context and capability tiers for the lucent renderer.
// This file exists to acquire the wgpu device once and classify adapter limits for the adaptive controllers.
// RELEVANT FILES:src/scheduler/tile.rs,src/scheduler/preview.rs,src/pipeline/mod.rs

use std::sync::Arc;

use crate::error::{RenderError, RenderResult};

/// Shared GPU context. Created once by the host and passed by reference to
/// every consumer; the renderer keeps no ambient global state.
pub struct RenderContext {
    pub device: Arc<wgpu::Device>,
    pub queue: Arc<wgpu::Queue>,
    pub adapter: wgpu::Adapter,
}

impl RenderContext {
    /// Acquire a high-performance adapter and device.
    pub fn new() -> RenderResult<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| RenderError::device("no suitable GPU adapter"))?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults(),
                label: Some("lucent-device"),
            },
            None,
        ))
        .map_err(|e| RenderError::device(format!("request_device failed: {e}")))?;

        Ok(Self {
            device: Arc::new(device),
            queue: Arc::new(queue),
            adapter,
        })
    }

    /// Classify this device into a coarse performance tier.
    pub fn tier(&self) -> DeviceTier {
        DeviceTier::from_max_dimension(self.device.limits().max_texture_dimension_2d)
    }
}

/// Coarse device-capability tier derived from the maximum render target
/// dimension. Seeds the initial pixel budgets of the adaptive controllers;
/// the budgets self-correct from frame timings afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceTier {
    Low,
    Medium,
    High,
}

impl DeviceTier {
    pub fn from_max_dimension(max_dimension: u32) -> Self {
        if max_dimension <= 8192 {
            DeviceTier::Low
        } else if max_dimension <= 16384 {
            DeviceTier::Medium
        } else {
            DeviceTier::High
        }
    }

    /// Initial pixels-per-tile budget for the tile scheduler.
    pub fn pixels_per_tile_estimate(self) -> f32 {
        match self {
            DeviceTier::Low => 200_000.0,
            DeviceTier::Medium => 400_000.0,
            DeviceTier::High => 600_000.0,
        }
    }

    /// Initial pixels-per-frame budget for the preview resolution controller.
    pub fn pixels_per_frame_estimate(self) -> f32 {
        match self {
            DeviceTier::Low => 80_000.0,
            DeviceTier::Medium => 150_000.0,
            DeviceTier::High => 400_000.0,
        }
    }
}

/// Align to WebGPU's required bytes-per-row for copies.
#[inline]
pub fn align_copy_bpr(unpadded: u32) -> u32 {
    let a = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    ((unpadded + a - 1) / a) * a
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_from_limits() {
        assert_eq!(DeviceTier::from_max_dimension(4096), DeviceTier::Low);
        assert_eq!(DeviceTier::from_max_dimension(8192), DeviceTier::Low);
        assert_eq!(DeviceTier::from_max_dimension(16384), DeviceTier::Medium);
        assert_eq!(DeviceTier::from_max_dimension(32768), DeviceTier::High);
    }

    #[test]
    fn copy_row_alignment() {
        assert_eq!(align_copy_bpr(1), wgpu::COPY_BYTES_PER_ROW_ALIGNMENT);
        assert_eq!(align_copy_bpr(256), 256);
        assert_eq!(align_copy_bpr(257), 512);
    }
}
