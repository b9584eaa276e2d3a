// tests/test_bvh_build.rs
// BVH construction tests: bounds closure, partition completeness and the small-scene shapes.
// RELEVANT FILES:src/accel/sah.rs,src/accel/extract.rs,src/accel/types.rs

use lucent::accel::types::BvhNode;
use lucent::accel::{build, extract_primitives};
use lucent::geometry::Geometry;

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

fn grid_of_triangles(count: u32) -> Geometry {
    // spread triangles over a wavy 3D band so splits happen on every axis
    let mut positions = Vec::new();
    let mut indices = Vec::new();
    for t in 0..count {
        let x = (t % 8) as f32 * 2.0;
        let y = (t / 8) as f32 * 1.5;
        let z = (t as f32 * 0.37).sin() * 4.0;
        positions.push([x, y, z]);
        positions.push([x + 1.0, y, z]);
        positions.push([x, y + 1.0, z + 0.2]);
        indices.extend_from_slice(&[3 * t, 3 * t + 1, 3 * t + 2]);
    }
    let n = positions.len();
    Geometry {
        positions,
        normals: vec![[0.0, 0.0, 1.0]; n],
        uvs: vec![[0.0, 0.0]; n],
        indices,
        material_mesh_index: vec![[0, 0]; n],
    }
}

fn collect_leaf_triangles(node: &BvhNode, out: &mut Vec<[u32; 3]>) {
    match node {
        BvhNode::Leaf { primitives, .. } => out.extend(primitives.iter().map(|p| p.indices)),
        BvhNode::Interior { children, .. } => {
            collect_leaf_triangles(&children[0], out);
            collect_leaf_triangles(&children[1], out);
        }
    }
}

#[test]
fn single_triangle_is_a_leaf_with_depth_one() {
    // Scenario: the smallest possible scene must not grow interior nodes
    let geometry = Geometry {
        positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        normals: vec![[0.0, 0.0, 1.0]; 3],
        uvs: vec![[0.0, 0.0]; 3],
        indices: vec![0, 1, 2],
        material_mesh_index: vec![[0, 0]; 3],
    };

    let mut prims = extract_primitives(&geometry).expect("extraction should succeed");
    let root = build(&mut prims);

    assert!(root.is_leaf(), "single triangle must build a bare leaf");
    assert_eq!(root.depth(), 1);
}

#[test]
fn quad_builds_interior_with_two_leaves() {
    // Scenario: two triangles sharing an edge split into exactly two leaves
    let mut prims = extract_primitives(&unit_quad()).expect("extraction should succeed");
    let root = build(&mut prims);

    let BvhNode::Interior { children, bounds, .. } = &root else {
        panic!("two separable triangles must produce an interior root");
    };
    assert!(children[0].is_leaf());
    assert!(children[1].is_leaf());
    assert_eq!(children[0].primitive_count(), 1);
    assert_eq!(children[1].primitive_count(), 1);
    assert_eq!(bounds.min, [0.0, 0.0, 0.0]);
    assert_eq!(bounds.max, [1.0, 1.0, 0.0]);
}

#[test]
fn root_bounds_equal_union_of_primitive_bounds() {
    let geometry = grid_of_triangles(64);
    let mut prims = extract_primitives(&geometry).expect("extraction should succeed");

    let mut expected = lucent::accel::Aabb::empty();
    for p in &prims {
        expected.union(&p.bounds);
    }

    let root = build(&mut prims);
    let bounds = root.bounds();
    for i in 0..3 {
        assert!((bounds.min[i] - expected.min[i]).abs() < 1e-6);
        assert!((bounds.max[i] - expected.max[i]).abs() < 1e-6);
    }
}

#[test]
fn every_primitive_appears_in_exactly_one_leaf() {
    let geometry = grid_of_triangles(100);
    let mut prims = extract_primitives(&geometry).expect("extraction should succeed");
    let expected_count = prims.len();
    let root = build(&mut prims);

    let mut triangles = Vec::new();
    collect_leaf_triangles(&root, &mut triangles);
    assert_eq!(triangles.len(), expected_count);

    triangles.sort_unstable();
    triangles.dedup();
    assert_eq!(
        triangles.len(),
        expected_count,
        "a primitive landed in more than one leaf"
    );
}

#[test]
fn interior_bounds_contain_children_everywhere() {
    fn check(node: &BvhNode) {
        if let BvhNode::Interior { children, bounds, .. } = node {
            assert!(bounds.contains(children[0].bounds()));
            assert!(bounds.contains(children[1].bounds()));
            check(&children[0]);
            check(&children[1]);
        }
    }
    let geometry = grid_of_triangles(200);
    let mut prims = extract_primitives(&geometry).expect("extraction should succeed");
    check(&build(&mut prims));
}

#[test]
fn malformed_geometry_never_reaches_the_builder() {
    let mut geometry = unit_quad();
    geometry.normals.pop();
    assert!(matches!(
        extract_primitives(&geometry),
        Err(lucent::RenderError::MalformedGeometry(_))
    ));
}
