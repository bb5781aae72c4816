//! Offscreen targets and viewport handles.

use scenepick_core::{PickError, PickResult, TargetDescriptor};

use super::WgpuBackend;

/// Color format of every offscreen target.
pub const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
/// Depth format of targets created with a depth attachment.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;

/// An offscreen color target with an optional depth attachment.
pub struct GpuTarget {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub depth: Option<(wgpu::Texture, wgpu::TextureView)>,
    pub width: u32,
    pub height: u32,
}

impl GpuTarget {
    /// Depth view, if the target has one.
    pub fn depth_view(&self) -> Option<&wgpu::TextureView> {
        self.depth.as_ref().map(|(_, view)| view)
    }
}

/// The host's render surface, borrowed for the selection overlay.
///
/// Build one per frame from the swapchain view. The format must be
/// renderable; pipelines are cached per format.
#[derive(Clone)]
pub struct ViewportTarget {
    pub view: wgpu::TextureView,
    pub format: wgpu::TextureFormat,
    pub width: u32,
    pub height: u32,
}

impl ViewportTarget {
    pub fn new(
        view: wgpu::TextureView,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            view,
            format,
            width,
            height,
        }
    }

    /// Wraps an offscreen target, e.g. for headless rendering.
    pub fn from_target(target: &GpuTarget) -> Self {
        Self::new(target.view.clone(), TARGET_FORMAT, target.width, target.height)
    }
}

impl WgpuBackend {
    /// Creates an offscreen target inside a validation error scope.
    pub(crate) fn create_gpu_target(&self, desc: &TargetDescriptor) -> PickResult<GpuTarget> {
        let max = self.device.limits().max_texture_dimension_2d;
        if desc.width > max || desc.height > max {
            return Err(PickError::TargetCreationFailed {
                width: desc.width,
                height: desc.height,
                reason: format!("exceeds the device limit of {max}"),
            });
        }

        let size = wgpu::Extent3d {
            width: desc.width,
            height: desc.height,
            depth_or_array_layers: 1,
        };

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(desc.label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TARGET_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let depth = desc.depth.then(|| {
            let depth_texture = self.device.create_texture(&wgpu::TextureDescriptor {
                label: Some(desc.label),
                size,
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: DEPTH_FORMAT,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                view_formats: &[],
            });
            let depth_view = depth_texture.create_view(&wgpu::TextureViewDescriptor::default());
            (depth_texture, depth_view)
        });

        if let Some(error) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(PickError::TargetCreationFailed {
                width: desc.width,
                height: desc.height,
                reason: error.to_string(),
            });
        }

        Ok(GpuTarget {
            texture,
            view,
            depth,
            width: desc.width,
            height: desc.height,
        })
    }
}
