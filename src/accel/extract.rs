// src/accel/extract.rs
// Primitive extractor - converts the merged triangle buffer into per-triangle build records.
// This file exists to turn flat geometry streams into the PrimitiveInfo array the SAH builder partitions.
// RELEVANT FILES:src/geometry.rs,src/accel/types.rs,src/accel/sah.rs

use crate::accel::types::{Aabb, PrimitiveInfo};
use crate::error::RenderResult;
use crate::geometry::Geometry;

/// Build one PrimitiveInfo per triangle: bounds, centroid, face normal and
/// the material tag carried into leaf records. Malformed input is rejected
/// here, before the builder runs.
pub fn extract_primitives(geometry: &Geometry) -> RenderResult<Vec<PrimitiveInfo>> {
    geometry.validate()?;

    let mut primitives = Vec::with_capacity(geometry.triangle_count());

    for tri in geometry.indices.chunks_exact(3) {
        let (i0, i1, i2) = (tri[0], tri[1], tri[2]);
        let v0 = geometry.positions[i0 as usize];
        let v1 = geometry.positions[i1 as usize];
        let v2 = geometry.positions[i2 as usize];

        let mut bounds = Aabb::empty();
        bounds.expand_point(v0);
        bounds.expand_point(v1);
        bounds.expand_point(v2);

        let e1 = sub(v1, v0);
        let e2 = sub(v2, v0);

        primitives.push(PrimitiveInfo {
            bounds,
            centroid: bounds.center(),
            indices: [i0, i1, i2],
            face_normal: normalize(cross(e1, e2)),
            material_index: geometry.material_mesh_index[i0 as usize][0],
        });
    }

    Ok(primitives)
}

#[inline]
fn sub(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[inline]
fn cross(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

#[inline]
fn normalize(v: [f32; 3]) -> [f32; 3] {
    let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if len == 0.0 {
        return v;
    }
    [v[0] / len, v[1] / len, v[2] / len]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_bounds_and_normal() {
        let geometry = Geometry {
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            normals: vec![[0.0, 0.0, 1.0]; 3],
            uvs: vec![[0.0, 0.0]; 3],
            indices: vec![0, 1, 2],
            material_mesh_index: vec![[3, 0]; 3],
        };

        let prims = extract_primitives(&geometry).unwrap();
        assert_eq!(prims.len(), 1);

        let p = &prims[0];
        assert_eq!(p.bounds.min, [0.0, 0.0, 0.0]);
        assert_eq!(p.bounds.max, [1.0, 1.0, 0.0]);
        assert_eq!(p.centroid, [0.5, 0.5, 0.0]);
        assert_eq!(p.face_normal, [0.0, 0.0, 1.0]);
        assert_eq!(p.material_index, 3);
        assert_eq!(p.indices, [0, 1, 2]);
    }

    #[test]
    fn winding_flips_normal() {
        let geometry = Geometry {
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            normals: vec![[0.0, 0.0, 1.0]; 3],
            uvs: vec![[0.0, 0.0]; 3],
            indices: vec![0, 2, 1],
            material_mesh_index: vec![[0, 0]; 3],
        };

        let prims = extract_primitives(&geometry).unwrap();
        assert_eq!(prims[0].face_normal, [0.0, 0.0, -1.0]);
    }
}
