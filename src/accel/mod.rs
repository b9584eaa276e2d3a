// src/accel/mod.rs
// Acceleration structure module for lucent - SAH construction, flattening and background offload.
// This module turns a static triangle soup into the GPU-traversable flat BVH buffer.
// RELEVANT FILES:src/accel/sah.rs,src/accel/flatten.rs,src/accel/background.rs

pub mod background;
pub mod extract;
pub mod flatten;
pub mod sah;
pub mod types;

pub use background::{AsyncBvhBuilder, BuildMode, BvhTask};
pub use extract::extract_primitives;
pub use flatten::{flatten, FlatRecord, FlattenedBvh};
pub use sah::build;
pub use types::{Aabb, BvhNode, PrimitiveInfo, SplitAxis};

use crate::error::RenderResult;
use crate::geometry::Geometry;

/// Full index build: extract primitives, build the SAH tree, flatten it.
/// The intermediate tree and primitive array are discarded on return.
pub fn build_flattened_bvh(geometry: &Geometry) -> RenderResult<FlattenedBvh> {
    let mut primitives = extract_primitives(geometry)?;
    let root = sah::build(&mut primitives);
    Ok(flatten::flatten(&root))
}
