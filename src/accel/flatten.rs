// src/accel/flatten.rs
// Serializes the BVH tree into the flat, index-addressable buffer the GPU traversal consumes.
// This file exists to encode leaf/interior records depth-first with backpatched second-child offsets.
// RELEVANT FILES:src/accel/sah.rs,src/accel/types.rs,src/pipeline/kernels.rs

use wgpu::util::DeviceExt;

use crate::accel::types::{Aabb, BvhNode, SplitAxis};

/// Number of 32-bit words per record
pub const RECORD_WORDS: usize = 8;

/// Flattened BVH ready for GPU upload. The buffer is a contiguous array of
/// 8-word records in depth-first order: an interior node's first child
/// immediately follows it and its second-child slot holds the offset of the
/// other subtree in four-float texel units. Leaf nodes emit one record per
/// contained primitive; the negated sibling count in the fourth word
/// distinguishes leaf records from interior records, whose fourth word is
/// the (non-negative) split axis.
pub struct FlattenedBvh {
    /// Raw record words; floats and signed integers share the buffer bit-for-bit
    pub buffer: Vec<u32>,
    /// Longest root-to-leaf path (root counts as 1). Traversal stacks on the
    /// consumer side must be provisioned with at least this many slots.
    pub max_depth: u32,
    /// Buffer length in four-float texels (two texels per record)
    pub count: u32,
}

impl FlattenedBvh {
    pub fn record_count(&self) -> usize {
        self.buffer.len() / RECORD_WORDS
    }

    /// Decode one record; used by consistency checks and tests
    pub fn record(&self, record_index: usize) -> FlatRecord {
        let base = record_index * RECORD_WORDS;
        let w = &self.buffer[base..base + RECORD_WORDS];
        let tag = w[3] as i32;
        if tag >= 0 {
            FlatRecord::Interior {
                bounds: Aabb::new(
                    [
                        f32::from_bits(w[0]),
                        f32::from_bits(w[1]),
                        f32::from_bits(w[2]),
                    ],
                    [
                        f32::from_bits(w[4]),
                        f32::from_bits(w[5]),
                        f32::from_bits(w[6]),
                    ],
                ),
                axis: SplitAxis::from_index(tag as usize),
                second_child_texel: w[7],
            }
        } else {
            FlatRecord::LeafPrimitive {
                indices: [w[0], w[1], w[2]],
                sibling_count: (-tag) as u32,
                face_normal: [
                    f32::from_bits(w[4]),
                    f32::from_bits(w[5]),
                    f32::from_bits(w[6]),
                ],
                material_index: w[7],
            }
        }
    }

    /// Upload as a read-only storage buffer
    pub fn upload(&self, device: &wgpu::Device) -> wgpu::Buffer {
        device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("bvh-records"),
            contents: bytemuck::cast_slice(&self.buffer),
            usage: wgpu::BufferUsages::STORAGE,
        })
    }
}

/// Decoded view of one flattened record
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FlatRecord {
    Interior {
        bounds: Aabb,
        axis: SplitAxis,
        /// Start of the second child's record, in four-float texels
        second_child_texel: u32,
    },
    LeafPrimitive {
        indices: [u32; 3],
        /// Number of primitives sharing this leaf (including this one)
        sibling_count: u32,
        face_normal: [f32; 3],
        material_index: u32,
    },
}

/// Pre-order flatten of a built tree
pub fn flatten(root: &BvhNode) -> FlattenedBvh {
    let mut buffer: Vec<u32> = Vec::new();
    let mut max_depth = 1u32;
    emit(root, 1, &mut buffer, &mut max_depth);

    let count = (buffer.len() / 4) as u32;
    FlattenedBvh {
        buffer,
        max_depth,
        count,
    }
}

fn emit(node: &BvhNode, depth: u32, buffer: &mut Vec<u32>, max_depth: &mut u32) {
    *max_depth = (*max_depth).max(depth);

    match node {
        BvhNode::Leaf { primitives, .. } => {
            let sibling_count = primitives.len() as i32;
            for p in primitives {
                buffer.push(p.indices[0]);
                buffer.push(p.indices[1]);
                buffer.push(p.indices[2]);
                buffer.push((-sibling_count) as u32);
                buffer.push(p.face_normal[0].to_bits());
                buffer.push(p.face_normal[1].to_bits());
                buffer.push(p.face_normal[2].to_bits());
                buffer.push(p.material_index);
            }
        }
        BvhNode::Interior {
            children,
            axis,
            bounds,
        } => {
            buffer.push(bounds.min[0].to_bits());
            buffer.push(bounds.min[1].to_bits());
            buffer.push(bounds.min[2].to_bits());
            buffer.push(axis.index() as u32);
            buffer.push(bounds.max[0].to_bits());
            buffer.push(bounds.max[1].to_bits());
            buffer.push(bounds.max[2].to_bits());
            let patch_slot = buffer.len();
            buffer.push(0);

            emit(&children[0], depth + 1, buffer, max_depth);
            buffer[patch_slot] = (buffer.len() / 4) as u32;
            emit(&children[1], depth + 1, buffer, max_depth);
        }
    }
}
