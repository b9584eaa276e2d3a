// src/accel/sah.rs
// Recursive surface-area-heuristic BVH builder over a primitive range.
// This file exists to partition the primitive array in place and produce the binary node tree.
// RELEVANT FILES:src/accel/types.rs,src/accel/extract.rs,src/accel/flatten.rs

use crate::accel::types::{Aabb, BvhNode, PrimitiveInfo, SplitAxis};

/// Number of equal-width buckets evaluated along the split axis
const BUCKET_COUNT: usize = 12;

/// Fixed traversal cost added to every candidate split
const TRAVERSAL_COST: f32 = 0.1;

/// Recursion cap; at this depth a range terminates as one flat leaf.
/// Prevents pathological recursion on adversarial inputs.
const MAX_BUILD_DEPTH: u32 = 64;

/// Small-range threshold below which an exact median split is cheaper than
/// the bucketed SAH sweep
const MEDIAN_SPLIT_THRESHOLD: usize = 4;

/// Per-bucket tally for the SAH sweep
#[derive(Clone, Copy, Default)]
struct Bucket {
    bounds: Aabb,
    count: usize,
}

/// Build a BVH over the whole primitive slice. Permutes the slice in place;
/// the only allocation is the node tree itself.
pub fn build(primitives: &mut [PrimitiveInfo]) -> BvhNode {
    debug_assert!(!primitives.is_empty());
    let end = primitives.len();
    build_range(primitives, 0, end, 1)
}

fn build_range(primitives: &mut [PrimitiveInfo], start: usize, end: usize, depth: u32) -> BvhNode {
    let mut bounds = Aabb::empty();
    for p in &primitives[start..end] {
        bounds.union(&p.bounds);
    }

    let count = end - start;
    if count == 1 || depth >= MAX_BUILD_DEPTH {
        return make_leaf(primitives, start, end, bounds);
    }

    let mut centroid_bounds = Aabb::empty();
    for p in &primitives[start..end] {
        centroid_bounds.expand_point(p.centroid);
    }

    let axis = widest_axis(&centroid_bounds);
    let ax = axis.index();

    let mid;
    if count <= MEDIAN_SPLIT_THRESHOLD {
        // Exact median via partial selection reorder; equivalent to
        // nth-element on the chosen axis.
        mid = (start + end) / 2;
        select_median(primitives, start, end, mid, ax);
    } else if centroid_bounds.max[ax] == centroid_bounds.min[ax] {
        // All centroids coincide on the split axis; nothing to gain from
        // splitting further.
        return make_leaf(primitives, start, end, bounds);
    } else {
        let mut buckets = [Bucket::default(); BUCKET_COUNT];
        for p in &primitives[start..end] {
            let b = bucket_index(&centroid_bounds, ax, p.centroid);
            buckets[b].count += 1;
            buckets[b].bounds.union(&p.bounds);
        }

        // Evaluate every boundary between adjacent buckets
        let total_area = bounds.surface_area();
        let mut best_cost = f32::INFINITY;
        let mut best_boundary = 0;
        for boundary in 0..BUCKET_COUNT - 1 {
            let mut left = Aabb::empty();
            let mut right = Aabb::empty();
            let mut left_count = 0usize;
            let mut right_count = 0usize;
            for b in buckets.iter().take(boundary + 1) {
                left.union(&b.bounds);
                left_count += b.count;
            }
            for b in buckets.iter().skip(boundary + 1) {
                right.union(&b.bounds);
                right_count += b.count;
            }
            let cost = TRAVERSAL_COST
                + (left_count as f32 * left.surface_area()
                    + right_count as f32 * right.surface_area())
                    / total_area;
            if cost < best_cost {
                best_cost = cost;
                best_boundary = boundary;
            }
        }

        mid = partition(primitives, start, end, |p| {
            bucket_index(&centroid_bounds, ax, p.centroid) <= best_boundary
        });
        // The extreme buckets are both occupied (centroid bounds are tight),
        // so the partition point is strictly interior.
        debug_assert!(mid > start && mid < end);
    }

    let child0 = build_range(primitives, start, mid, depth + 1);
    let child1 = build_range(primitives, mid, end, depth + 1);
    let bounds = Aabb::union_of(child0.bounds(), child1.bounds());

    BvhNode::Interior {
        children: Box::new([child0, child1]),
        axis,
        bounds,
    }
}

fn make_leaf(primitives: &[PrimitiveInfo], start: usize, end: usize, bounds: Aabb) -> BvhNode {
    BvhNode::Leaf {
        primitives: primitives[start..end].to_vec(),
        bounds,
    }
}

fn widest_axis(centroid_bounds: &Aabb) -> SplitAxis {
    let e = centroid_bounds.extent();
    if e[0] > e[2] {
        if e[0] > e[1] {
            SplitAxis::X
        } else {
            SplitAxis::Y
        }
    } else if e[2] > e[1] {
        SplitAxis::Z
    } else {
        SplitAxis::Y
    }
}

/// Normalized centroid offset quantized into a bucket index, with the
/// upper-edge value clamped into the last bucket
fn bucket_index(centroid_bounds: &Aabb, axis: usize, centroid: [f32; 3]) -> usize {
    let span = centroid_bounds.max[axis] - centroid_bounds.min[axis];
    let mut offset = centroid[axis] - centroid_bounds.min[axis];
    if span > 0.0 {
        offset /= span;
    }
    ((BUCKET_COUNT as f32 * offset) as usize).min(BUCKET_COUNT - 1)
}

/// Partial selection reorder: after this call every element of
/// `[start, mid]` is <= every element of `(mid, end)` on the given axis.
fn select_median(primitives: &mut [PrimitiveInfo], start: usize, end: usize, mid: usize, axis: usize) {
    for i in start..=mid.min(end - 1) {
        let mut smallest = i;
        for j in i + 1..end {
            if primitives[j].centroid[axis] < primitives[smallest].centroid[axis] {
                smallest = j;
            }
        }
        primitives.swap(i, smallest);
    }
}

/// In-place partition over explicit index ranges; returns the first index of
/// the second group
fn partition<F>(primitives: &mut [PrimitiveInfo], mut first: usize, mut last: usize, pred: F) -> usize
where
    F: Fn(&PrimitiveInfo) -> bool,
{
    loop {
        loop {
            if first == last {
                return first;
            }
            if !pred(&primitives[first]) {
                break;
            }
            first += 1;
        }
        loop {
            last -= 1;
            if first == last {
                return first;
            }
            if pred(&primitives[last]) {
                break;
            }
        }
        primitives.swap(first, last);
        first += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accel::extract::extract_primitives;
    use crate::geometry::Geometry;

    fn unit_quad() -> Geometry {
        Geometry {
            positions: vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
            ],
            normals: vec![[0.0, 0.0, 1.0]; 4],
            uvs: vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
            indices: vec![0, 1, 2, 0, 2, 3],
            material_mesh_index: vec![[0, 0]; 4],
        }
    }

    fn leaf_count(node: &BvhNode) -> usize {
        match node {
            BvhNode::Leaf { .. } => 1,
            BvhNode::Interior { children, .. } => {
                leaf_count(&children[0]) + leaf_count(&children[1])
            }
        }
    }

    #[test]
    fn single_triangle_builds_leaf() {
        let geometry = Geometry {
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            normals: vec![[0.0, 0.0, 1.0]; 3],
            uvs: vec![[0.0, 0.0]; 3],
            indices: vec![0, 1, 2],
            material_mesh_index: vec![[0, 0]; 3],
        };
        let mut prims = extract_primitives(&geometry).unwrap();
        let root = build(&mut prims);

        assert!(root.is_leaf());
        assert_eq!(root.depth(), 1);
        assert_eq!(root.primitive_count(), 1);
    }

    #[test]
    fn quad_splits_into_two_leaves() {
        let mut prims = extract_primitives(&unit_quad()).unwrap();
        let root = build(&mut prims);

        match &root {
            BvhNode::Interior { children, bounds, .. } => {
                assert!(children[0].is_leaf());
                assert!(children[1].is_leaf());
                assert_eq!(bounds.min, [0.0, 0.0, 0.0]);
                assert_eq!(bounds.max, [1.0, 1.0, 0.0]);
            }
            BvhNode::Leaf { .. } => panic!("expected interior root for two triangles"),
        }
        assert_eq!(leaf_count(&root), 2);
    }

    #[test]
    fn coincident_centroids_terminate_as_leaf() {
        // Six triangles with identical bounds and centroids; the bucketed
        // path cannot separate them and must fall back to one leaf.
        let tri = |_: usize| PrimitiveInfo {
            bounds: Aabb::new([0.0; 3], [1.0; 3]),
            centroid: [0.5; 3],
            indices: [0, 1, 2],
            face_normal: [0.0, 0.0, 1.0],
            material_index: 0,
        };
        let mut prims: Vec<PrimitiveInfo> = (0..6).map(tri).collect();
        let root = build(&mut prims);
        assert!(root.is_leaf());
        assert_eq!(root.primitive_count(), 6);
    }

    #[test]
    fn every_primitive_lands_in_exactly_one_leaf() {
        // 32 triangles spread along x; each keeps a distinct index triple so
        // leaf membership can be recovered afterwards.
        let mut positions = Vec::new();
        let mut indices = Vec::new();
        for t in 0..32u32 {
            let x = t as f32 * 1.5;
            positions.push([x, 0.0, 0.0]);
            positions.push([x + 1.0, 0.0, 0.0]);
            positions.push([x, 1.0, (t % 5) as f32 * 0.1]);
            indices.extend_from_slice(&[3 * t, 3 * t + 1, 3 * t + 2]);
        }
        let n = positions.len();
        let geometry = Geometry {
            positions,
            normals: vec![[0.0, 0.0, 1.0]; n],
            uvs: vec![[0.0, 0.0]; n],
            indices,
            material_mesh_index: vec![[0, 0]; n],
        };

        let mut prims = extract_primitives(&geometry).unwrap();
        let root = build(&mut prims);

        let mut seen = Vec::new();
        fn collect(node: &BvhNode, seen: &mut Vec<u32>) {
            match node {
                BvhNode::Leaf { primitives, .. } => {
                    seen.extend(primitives.iter().map(|p| p.indices[0] / 3));
                }
                BvhNode::Interior { children, .. } => {
                    collect(&children[0], seen);
                    collect(&children[1], seen);
                }
            }
        }
        collect(&root, &mut seen);

        seen.sort_unstable();
        let expected: Vec<u32> = (0..32).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn root_bounds_close_over_all_primitives() {
        let mut positions = Vec::new();
        let mut indices = Vec::new();
        for t in 0..17u32 {
            let x = (t as f32 * 0.7).sin() * 10.0;
            let y = (t as f32 * 1.3).cos() * 5.0;
            let z = t as f32 * 0.25;
            positions.push([x, y, z]);
            positions.push([x + 0.5, y, z]);
            positions.push([x, y + 0.5, z]);
            indices.extend_from_slice(&[3 * t, 3 * t + 1, 3 * t + 2]);
        }
        let n = positions.len();
        let geometry = Geometry {
            positions: positions.clone(),
            normals: vec![[0.0, 0.0, 1.0]; n],
            uvs: vec![[0.0, 0.0]; n],
            indices,
            material_mesh_index: vec![[0, 0]; n],
        };

        let mut prims = extract_primitives(&geometry).unwrap();
        let mut expected = Aabb::empty();
        for p in &prims {
            expected.union(&p.bounds);
        }

        let root = build(&mut prims);
        assert_eq!(*root.bounds(), expected);
    }
}
