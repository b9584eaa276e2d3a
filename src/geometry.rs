// src/geometry.rs
// Merged triangle-soup input consumed by the primitive extractor and the integration kernel.
// This file exists to define the flat geometry contract and validate it before any build work starts.
// RELEVANT FILES:src/accel/extract.rs,src/accel/background.rs,src/pipeline/mod.rs

use wgpu::util::DeviceExt;

use crate::error::{RenderError, RenderResult};

/// Flat merged-mesh geometry. Produced by mesh-merging logic outside this
/// crate; positions/normals/uvs are indexed per vertex, `indices` holds three
/// entries per triangle, and `material_mesh_index` carries a
/// (material, instance) pair per vertex.
#[derive(Debug, Clone, Default)]
pub struct Geometry {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
    pub material_mesh_index: Vec<[u32; 2]>,
}

impl Geometry {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Reject geometry missing the attributes the tracer requires. Runs
    /// before BVH construction; the builder itself never sees bad input.
    pub fn validate(&self) -> RenderResult<()> {
        if self.positions.is_empty() {
            return Err(RenderError::malformed_geometry("no position data"));
        }
        if self.indices.is_empty() {
            return Err(RenderError::malformed_geometry("no index data"));
        }
        if self.indices.len() % 3 != 0 {
            return Err(RenderError::malformed_geometry(format!(
                "index count {} is not a multiple of 3",
                self.indices.len()
            )));
        }
        if self.normals.len() != self.positions.len() {
            return Err(RenderError::malformed_geometry(format!(
                "normal count {} does not match vertex count {}",
                self.normals.len(),
                self.positions.len()
            )));
        }
        if self.material_mesh_index.len() != self.positions.len() {
            return Err(RenderError::malformed_geometry(format!(
                "material index count {} does not match vertex count {}",
                self.material_mesh_index.len(),
                self.positions.len()
            )));
        }
        let vertex_count = self.positions.len() as u32;
        if let Some(&bad) = self.indices.iter().find(|&&i| i >= vertex_count) {
            return Err(RenderError::malformed_geometry(format!(
                "index {bad} out of range for {vertex_count} vertices"
            )));
        }
        Ok(())
    }

    /// Upload the vertex streams the integration kernel binds. UVs may be
    /// absent; an empty stream still gets a (minimal) buffer so bind groups
    /// stay uniform.
    pub fn upload(&self, device: &wgpu::Device) -> GeometryBuffers {
        GeometryBuffers {
            positions: create_storage(device, "geometry-positions", flatten3(&self.positions)),
            normals: create_storage(device, "geometry-normals", flatten3(&self.normals)),
            uvs: create_storage(device, "geometry-uvs", flatten2(&self.uvs)),
            indices: create_storage_u32(device, "geometry-indices", &self.indices),
            triangle_count: self.triangle_count() as u32,
        }
    }
}

/// GPU-resident geometry streams
pub struct GeometryBuffers {
    pub positions: wgpu::Buffer,
    pub normals: wgpu::Buffer,
    pub uvs: wgpu::Buffer,
    pub indices: wgpu::Buffer,
    pub triangle_count: u32,
}

fn flatten3(data: &[[f32; 3]]) -> Vec<f32> {
    data.iter().flat_map(|v| v.iter().copied()).collect()
}

fn flatten2(data: &[[f32; 2]]) -> Vec<f32> {
    data.iter().flat_map(|v| v.iter().copied()).collect()
}

fn create_storage(device: &wgpu::Device, label: &str, mut data: Vec<f32>) -> wgpu::Buffer {
    if data.is_empty() {
        data.push(0.0);
    }
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::cast_slice(&data),
        usage: wgpu::BufferUsages::STORAGE,
    })
}

fn create_storage_u32(device: &wgpu::Device, label: &str, data: &[u32]) -> wgpu::Buffer {
    let mut data = data.to_vec();
    if data.is_empty() {
        data.push(0);
    }
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::cast_slice(&data),
        usage: wgpu::BufferUsages::STORAGE,
    })
}
