// src/accel/background.rs
// Background offload for the BVH build - geometry in, flattened-buffer-or-error out over a channel.
// This file exists to keep scene builds off the frame thread while enforcing the single-in-flight invariant.
// RELEVANT FILES:src/accel/mod.rs,src/accel/flatten.rs,src/pipeline/mod.rs

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use crate::accel::flatten::FlattenedBvh;
use crate::accel::build_flattened_bvh;
use crate::error::{RenderError, RenderResult};
use crate::geometry::Geometry;

/// Where the build runs. Both modes resolve through the same task interface
/// so callers never special-case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    /// Run on a spawned build thread
    Background,
    /// Run inline on the calling thread; the returned task is already resolved
    Blocking,
}

/// Handle to an in-flight (or already finished) build
pub struct BvhTask {
    receiver: mpsc::Receiver<RenderResult<FlattenedBvh>>,
    resolved: Option<RenderResult<FlattenedBvh>>,
}

impl BvhTask {
    fn pending(receiver: mpsc::Receiver<RenderResult<FlattenedBvh>>) -> Self {
        Self {
            receiver,
            resolved: None,
        }
    }

    fn completed(result: RenderResult<FlattenedBvh>) -> Self {
        // Dummy channel keeps the two construction paths structurally identical
        let (_tx, rx) = mpsc::channel();
        Self {
            receiver: rx,
            resolved: Some(result),
        }
    }

    /// Non-blocking poll. Returns `None` while the build is still running.
    pub fn try_resolve(&mut self) -> Option<RenderResult<FlattenedBvh>> {
        if let Some(result) = self.resolved.take() {
            return Some(result);
        }
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(mpsc::TryRecvError::Empty) => None,
            Err(mpsc::TryRecvError::Disconnected) => {
                Some(Err(RenderError::build("build thread vanished")))
            }
        }
    }

    /// Block until the build resolves
    pub fn wait(mut self) -> RenderResult<FlattenedBvh> {
        if let Some(result) = self.resolved.take() {
            return result;
        }
        self.receiver
            .recv()
            .unwrap_or_else(|_| Err(RenderError::build("build thread vanished")))
    }
}

/// Asynchronous BVH builder. At most one build may be in flight; a second
/// request fails fast with `BuildInProgress` rather than queuing.
pub struct AsyncBvhBuilder {
    in_flight: Arc<AtomicBool>,
}

impl AsyncBvhBuilder {
    pub fn new() -> Self {
        Self {
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_building(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Start a build. The geometry moves into the task; there is no
    /// mid-build cancellation - a rebuild simply discards the previous
    /// result once the new one resolves.
    pub fn build(&self, geometry: Geometry, mode: BuildMode) -> RenderResult<BvhTask> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(RenderError::BuildInProgress);
        }

        match mode {
            BuildMode::Blocking => {
                let result = run_build(&geometry);
                self.in_flight.store(false, Ordering::Release);
                Ok(BvhTask::completed(result))
            }
            BuildMode::Background => {
                let (sender, receiver) = mpsc::channel();
                let flag = Arc::clone(&self.in_flight);
                thread::Builder::new()
                    .name("lucent-bvh-build".into())
                    .spawn(move || {
                        let result = run_build(&geometry);
                        flag.store(false, Ordering::Release);
                        // A dropped receiver means the caller abandoned the
                        // build; nothing to report.
                        let _ = sender.send(result);
                    })
                    .map_err(|e| {
                        self.in_flight.store(false, Ordering::Release);
                        RenderError::build(format!("failed to spawn build thread: {e}"))
                    })?;
                Ok(BvhTask::pending(receiver))
            }
        }
    }
}

impl Default for AsyncBvhBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn run_build(geometry: &Geometry) -> RenderResult<FlattenedBvh> {
    match catch_unwind(AssertUnwindSafe(|| build_flattened_bvh(geometry))) {
        Ok(result) => result,
        Err(panic) => {
            let msg = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".into());
            Err(RenderError::build(format!("build thread panicked: {msg}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Geometry {
        Geometry {
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            normals: vec![[0.0, 0.0, 1.0]; 3],
            uvs: vec![[0.0, 0.0]; 3],
            indices: vec![0, 1, 2],
            material_mesh_index: vec![[0, 0]; 3],
        }
    }

    #[test]
    fn blocking_and_background_builds_agree() {
        let builder = AsyncBvhBuilder::new();

        let sync = builder
            .build(triangle(), BuildMode::Blocking)
            .unwrap()
            .wait()
            .unwrap();
        let background = builder
            .build(triangle(), BuildMode::Background)
            .unwrap()
            .wait()
            .unwrap();

        assert_eq!(sync.buffer, background.buffer);
        assert_eq!(sync.max_depth, background.max_depth);
        assert_eq!(sync.count, background.count);
    }

    #[test]
    fn malformed_geometry_rejects_through_task() {
        let builder = AsyncBvhBuilder::new();
        let mut bad = triangle();
        bad.positions.clear();

        let result = builder
            .build(bad, BuildMode::Blocking)
            .unwrap()
            .wait();
        assert!(matches!(result, Err(RenderError::MalformedGeometry(_))));
        // The failed build must release the in-flight flag
        assert!(!builder.is_building());
    }
}
