// src/camera.rs
// Camera description consumed by the integration kernel and the pose-change detection.
// This file exists to define the world transform + projection parameters and their tolerance compare.
// RELEVANT FILES:src/pipeline/state.rs,src/pipeline/kernels.rs,src/pipeline/mod.rs

use glam::Mat4;

/// Tolerance for pose comparison; any larger difference counts as movement
/// and triggers the reset/preview branch.
pub const CAMERA_POSE_EPS: f32 = 1e-5;

/// Thin-lens parameters for depth of field
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lens {
    pub aperture: f32,
    pub focus: f32,
}

/// Perspective camera pose. The transform is the camera-to-world matrix;
/// projection is described by aspect ratio and vertical field of view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub transform: Mat4,
    pub aspect: f32,
    pub fov_y_degrees: f32,
    pub lens: Option<Lens>,
}

impl Camera {
    pub fn new(transform: Mat4, aspect: f32, fov_y_degrees: f32) -> Self {
        Self {
            transform,
            aspect,
            fov_y_degrees,
            lens: None,
        }
    }

    pub fn with_lens(mut self, aperture: f32, focus: f32) -> Self {
        self.lens = Some(Lens { aperture, focus });
        self
    }

    /// Pose equality within tolerance: the 16 transform elements plus the
    /// projection parameters. Lens settings don't count as movement.
    pub fn approx_eq(&self, other: &Camera) -> bool {
        let a = self.transform.to_cols_array();
        let b = other.transform.to_cols_array();
        a.iter()
            .zip(b.iter())
            .all(|(x, y)| (x - y).abs() <= CAMERA_POSE_EPS)
            && (self.aspect - other.aspect).abs() <= CAMERA_POSE_EPS
            && (self.fov_y_degrees - other.fov_y_degrees).abs() <= CAMERA_POSE_EPS
    }

    /// Projection scale factor the integration kernel expects:
    /// `0.5 / tan(fov_y / 2)`
    pub fn fov_scale(&self) -> f32 {
        0.5 / (0.5 * self.fov_y_degrees.to_radians()).tan()
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY, 1.0, 65.0)
    }
}
