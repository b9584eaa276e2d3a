// src/pipeline/targets.rs
// Render target ownership: the HDR accumulation buffer and the double-buffered G-buffer /
// reprojection pairs. Pairs are modeled as a 2-element array plus a toggling index.
// RELEVANT FILES:src/pipeline/mod.rs,src/pipeline/kernels.rs,src/pipeline/state.rs

/// Two buffered copies with an explicit front index. A pass reads the back
/// copy (previous frame) while writing the front copy (current frame); the
/// roles swap exactly once per frame boundary. Swapped, never copied.
pub struct PingPong<T> {
    pair: [T; 2],
    front: usize,
}

impl<T> PingPong<T> {
    pub fn new(a: T, b: T) -> Self {
        Self { pair: [a, b], front: 0 }
    }

    pub fn front(&self) -> &T {
        &self.pair[self.front]
    }

    pub fn back(&self) -> &T {
        &self.pair[1 - self.front]
    }

    pub fn front_index(&self) -> usize {
        self.front
    }

    pub fn get(&self, index: usize) -> &T {
        &self.pair[index]
    }

    pub fn swap(&mut self) {
        self.front = 1 - self.front;
    }
}

/// One render-attachable color texture plus its default view
pub struct ColorTarget {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub format: wgpu::TextureFormat,
}

impl ColorTarget {
    pub fn new(
        device: &wgpu::Device,
        label: &str,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
        extra_usage: wgpu::TextureUsages,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | extra_usage,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture,
            view,
            format,
        }
    }

    /// Clear to transparent black via a bare render pass; avoids requiring
    /// the optional clear-texture device feature
    pub fn clear(&self, encoder: &mut wgpu::CommandEncoder) {
        let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("clear-target"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &self.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
    }
}

/// Auxiliary per-pixel geometric data feeding the denoise passes
pub struct GBufferTargets {
    pub position: ColorTarget,
    pub normal: ColorTarget,
    pub face_normal: ColorTarget,
}

impl GBufferTargets {
    fn new(device: &wgpu::Device, label: &str, width: u32, height: u32) -> Self {
        Self {
            position: ColorTarget::new(
                device,
                &format!("{label}-position"),
                width,
                height,
                wgpu::TextureFormat::Rgba32Float,
                wgpu::TextureUsages::empty(),
            ),
            normal: ColorTarget::new(
                device,
                &format!("{label}-normal"),
                width,
                height,
                wgpu::TextureFormat::Rgba16Float,
                wgpu::TextureUsages::empty(),
            ),
            face_normal: ColorTarget::new(
                device,
                &format!("{label}-face-normal"),
                width,
                height,
                wgpu::TextureFormat::Rgba32Float,
                wgpu::TextureUsages::empty(),
            ),
        }
    }

    pub fn clear(&self, encoder: &mut wgpu::CommandEncoder) {
        self.position.clear(encoder);
        self.normal.clear(encoder);
        self.face_normal.clear(encoder);
    }
}

/// Temporal reprojection output pair: blended color plus
/// moment/variance/history-length data
pub struct ReprojectTargets {
    pub color: ColorTarget,
    pub moment_variance: ColorTarget,
}

impl ReprojectTargets {
    fn new(device: &wgpu::Device, label: &str, width: u32, height: u32) -> Self {
        Self {
            color: ColorTarget::new(
                device,
                &format!("{label}-color"),
                width,
                height,
                wgpu::TextureFormat::Rgba32Float,
                wgpu::TextureUsages::empty(),
            ),
            moment_variance: ColorTarget::new(
                device,
                &format!("{label}-moment-variance"),
                width,
                height,
                wgpu::TextureFormat::Rgba32Float,
                wgpu::TextureUsages::empty(),
            ),
        }
    }

    pub fn clear(&self, encoder: &mut wgpu::CommandEncoder) {
        self.color.clear(encoder);
        self.moment_variance.clear(encoder);
    }
}

/// Every render target the orchestrator owns. Allocated on `set_size`,
/// exclusively held here; passes receive borrowed views only.
pub struct RenderTargets {
    pub width: u32,
    pub height: u32,
    /// HDR accumulation buffer; persists across the samples of one
    /// convergence run
    pub accumulation: ColorTarget,
    pub gbuffer: PingPong<GBufferTargets>,
    pub reproject: PingPong<ReprojectTargets>,
    /// Tone-mapped presentation target
    pub present: ColorTarget,
}

impl RenderTargets {
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            accumulation: ColorTarget::new(
                device,
                "hdr-accumulation",
                width,
                height,
                wgpu::TextureFormat::Rgba32Float,
                wgpu::TextureUsages::empty(),
            ),
            gbuffer: PingPong::new(
                GBufferTargets::new(device, "gbuffer-0", width, height),
                GBufferTargets::new(device, "gbuffer-1", width, height),
            ),
            reproject: PingPong::new(
                ReprojectTargets::new(device, "reproject-0", width, height),
                ReprojectTargets::new(device, "reproject-1", width, height),
            ),
            present: ColorTarget::new(
                device,
                "present",
                width,
                height,
                wgpu::TextureFormat::Rgba16Float,
                wgpu::TextureUsages::COPY_SRC,
            ),
        }
    }

    /// Clear accumulation history and both reprojection copies (camera jumps,
    /// option changes)
    pub fn clear_history(&self, encoder: &mut wgpu::CommandEncoder) {
        self.accumulation.clear(encoder);
        self.reproject.front().clear(encoder);
        self.reproject.back().clear(encoder);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ping_pong_roles_toggle() {
        let mut pair = PingPong::new("a", "b");
        assert_eq!(*pair.front(), "a");
        assert_eq!(*pair.back(), "b");

        pair.swap();
        assert_eq!(*pair.front(), "b");
        assert_eq!(*pair.back(), "a");

        pair.swap();
        assert_eq!(*pair.front(), "a");
        assert_eq!(pair.front_index(), 0);
    }

    #[test]
    fn ping_pong_physical_slots_are_stable() {
        let mut pair = PingPong::new(10, 20);
        let slot = pair.front_index();
        pair.swap();
        // the value did not move; only the role changed
        assert_eq!(*pair.get(slot), 10);
        assert_eq!(*pair.back(), 10);
    }
}
