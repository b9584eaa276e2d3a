// src/lights.rs
// Closed set of analytic light kinds and their packed GPU layout.
// This file exists to merge the scene's lights into the flat arrays the integration kernel samples.
// RELEVANT FILES:src/pipeline/kernels.rs,src/material.rs,src/pipeline/mod.rs

use glam::Vec3;

/// Analytic light. Each kind carries only its relevant fields; consumers
/// dispatch by exhaustive match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Light {
    /// Oriented rectangle described by width/height and a look-at target
    Rect {
        position: Vec3,
        target: Vec3,
        width: f32,
        height: f32,
        emission: Vec3,
        visible: bool,
    },
    /// Parallelogram spanned by two explicit corner points
    Quad {
        position: Vec3,
        v1: Vec3,
        v2: Vec3,
        emission: Vec3,
        visible: bool,
    },
    SphereArea {
        position: Vec3,
        radius: f32,
        emission: Vec3,
        visible: bool,
    },
    Directional {
        position: Vec3,
        target: Vec3,
        emission: Vec3,
        visible: bool,
    },
    Point {
        position: Vec3,
        emission: Vec3,
        visible: bool,
    },
}

impl Light {
    /// Stable kind index used inside the packed `params` stream
    pub fn kind_index(&self) -> u32 {
        match self {
            Light::Rect { .. } => 0,
            Light::Quad { .. } => 1,
            Light::SphereArea { .. } => 2,
            Light::Directional { .. } => 3,
            Light::Point { .. } => 4,
        }
    }
}

/// Flat light arrays in the layout the integration kernel binds: positions,
/// emissions and edge vectors as vec3 streams, plus an interleaved
/// `(radius, area, kind, visible)` parameter stream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LightBuffer {
    pub count: u32,
    pub position: Vec<f32>,
    pub emission: Vec<f32>,
    pub p1: Vec<f32>,
    pub p2: Vec<f32>,
    pub params: Vec<f32>,
}

impl LightBuffer {
    pub fn pack(lights: &[Light]) -> Self {
        let mut buffer = LightBuffer {
            count: lights.len() as u32,
            ..Default::default()
        };

        for light in lights {
            let (position, p1, p2, radius, area, emission, visible) = match *light {
                Light::Rect {
                    position,
                    target,
                    width,
                    height,
                    emission,
                    visible,
                } => {
                    let (corner, edge1, edge2) = rect_corners(position, target, width, height);
                    let area = edge1.cross(edge2).length();
                    (corner, edge1, edge2, 0.0, area, emission, visible)
                }
                Light::Quad {
                    position,
                    v1,
                    v2,
                    emission,
                    visible,
                } => {
                    let p1 = v1 - position;
                    let p2 = v2 - position;
                    let area = p1.cross(p2).length();
                    (position, p1, p2, 0.0, area, emission, visible)
                }
                Light::SphereArea {
                    position,
                    radius,
                    emission,
                    visible,
                } => {
                    let area = 4.0 * std::f32::consts::PI * radius * radius;
                    (position, Vec3::ZERO, Vec3::ZERO, radius, area, emission, visible)
                }
                Light::Directional {
                    position,
                    target,
                    emission,
                    visible,
                } => (position, target, Vec3::ZERO, 0.0, 0.0, emission, visible),
                Light::Point {
                    position,
                    emission,
                    visible,
                } => (position, Vec3::ZERO, Vec3::ZERO, 0.0, 0.0, emission, visible),
            };

            buffer.position.extend_from_slice(&position.to_array());
            buffer.emission.extend_from_slice(&emission.to_array());
            buffer.p1.extend_from_slice(&p1.to_array());
            buffer.p2.extend_from_slice(&p2.to_array());
            buffer.params.extend_from_slice(&[
                radius,
                area,
                light.kind_index() as f32,
                visible as u32 as f32,
            ]);
        }

        buffer
    }
}

/// Derive the anchor corner and edge vectors of a rect light facing its
/// target, matching the plane-geometry derivation the kernel expects
fn rect_corners(position: Vec3, target: Vec3, width: f32, height: f32) -> (Vec3, Vec3, Vec3) {
    let forward = (target - position).normalize_or_zero();
    let forward = if forward == Vec3::ZERO { Vec3::NEG_Z } else { forward };
    let reference = if forward.x.abs() < 0.999 { Vec3::X } else { Vec3::Y };
    let up = forward.cross(reference).normalize();
    let right = up.cross(forward);

    let half_w = right * (width * 0.5);
    let half_h = up * (height * 0.5);
    let corner = position - half_w - half_h;
    (corner, half_w * 2.0, half_h * 2.0)
}
