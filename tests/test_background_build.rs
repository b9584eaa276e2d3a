// tests/test_background_build.rs
// Background offload tests: single in-flight enforcement and sync/async interchangeability.
// RELEVANT FILES:src/accel/background.rs,src/accel/mod.rs,src/error.rs

use std::time::Duration;

use lucent::accel::{AsyncBvhBuilder, BuildMode};
use lucent::geometry::Geometry;
use lucent::RenderError;

fn big_scene() -> Geometry {
    // large enough that a background build stays in flight for a moment
    let count = 60_000u32;
    let mut positions = Vec::new();
    let mut indices = Vec::new();
    for t in 0..count {
        let x = (t as f32 * 0.917).fract() * 100.0;
        let y = (t as f32 * 0.371).fract() * 60.0;
        let z = (t as f32 * 0.613).fract() * 40.0;
        positions.push([x, y, z]);
        positions.push([x + 0.5, y, z]);
        positions.push([x, y + 0.5, z]);
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

fn small_scene() -> Geometry {
    Geometry {
        positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        normals: vec![[0.0, 0.0, 1.0]; 3],
        uvs: vec![[0.0, 0.0]; 3],
        indices: vec![0, 1, 2],
        material_mesh_index: vec![[0, 0]; 3],
    }
}

#[test]
fn second_concurrent_build_fails_fast() {
    // Scenario: a second build requested while one is unresolved must
    // reject synchronously, not queue
    let builder = AsyncBvhBuilder::new();

    let task = builder
        .build(big_scene(), BuildMode::Background)
        .expect("first build should start");

    let second = builder.build(small_scene(), BuildMode::Background);
    match second {
        Err(RenderError::BuildInProgress) => {}
        Err(other) => panic!("expected BuildInProgress, got {other:?}"),
        Ok(_) => {
            // The first build may already have resolved on a fast machine;
            // in that case the invariant was never violated. Distinguish by
            // checking the first task.
            panic!("second build accepted while the first was issued immediately before");
        }
    }

    let flattened = task.wait().expect("first build should resolve");
    assert!(flattened.record_count() > 0);
    assert!(!builder.is_building());
}

#[test]
fn builder_accepts_a_new_build_after_resolution() {
    let builder = AsyncBvhBuilder::new();

    let first = builder
        .build(small_scene(), BuildMode::Background)
        .expect("build should start")
        .wait()
        .expect("build should resolve");

    // wait() consumed the result, but the flag clears on the worker side;
    // give the store a beat on slow schedulers
    for _ in 0..100 {
        if !builder.is_building() {
            break;
        }
        std::thread::sleep(Duration::from_millis(1));
    }

    let second = builder
        .build(small_scene(), BuildMode::Background)
        .expect("builder must accept a new build once idle")
        .wait()
        .expect("second build should resolve");

    assert_eq!(first.buffer, second.buffer);
}

#[test]
fn blocking_and_background_paths_are_interchangeable() {
    let builder = AsyncBvhBuilder::new();
    let geometry = big_scene();

    let blocking = builder
        .build(geometry.clone(), BuildMode::Blocking)
        .expect("blocking build should start")
        .wait()
        .expect("blocking build should resolve");

    let background = builder
        .build(geometry, BuildMode::Background)
        .expect("background build should start")
        .wait()
        .expect("background build should resolve");

    assert_eq!(blocking.max_depth, background.max_depth);
    assert_eq!(blocking.count, background.count);
    assert_eq!(blocking.buffer, background.buffer);
}

#[test]
fn try_resolve_polls_without_blocking() {
    let builder = AsyncBvhBuilder::new();
    let mut task = builder
        .build(big_scene(), BuildMode::Background)
        .expect("build should start");

    // poll until resolution; every intermediate poll returns None
    let result = loop {
        match task.try_resolve() {
            None => std::thread::sleep(Duration::from_millis(1)),
            Some(result) => break result,
        }
    };
    assert!(result.is_ok());
}

#[test]
fn build_failure_propagates_and_releases_the_flag() {
    let builder = AsyncBvhBuilder::new();
    let mut bad = small_scene();
    bad.indices = vec![0, 1]; // ragged

    let result = builder
        .build(bad, BuildMode::Background)
        .expect("build should start")
        .wait();
    assert!(matches!(result, Err(RenderError::MalformedGeometry(_))));

    // the builder must be usable again
    for _ in 0..100 {
        if !builder.is_building() {
            break;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    assert!(builder
        .build(small_scene(), BuildMode::Blocking)
        .is_ok());
}
