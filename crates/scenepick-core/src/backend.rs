//! Graphics boundary.
//!
//! The passes in this crate never touch a GPU API directly. They drive a
//! [`RenderBackend`], which owns pipelines, meshes, and the command stream.
//! `scenepick-render` implements it on wgpu; tests implement it on CPU
//! canvases.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};

use crate::camera::CameraView;
use crate::color::ColorKey;
use crate::error::PickResult;
use crate::hud::HudInstance;
use crate::scene::MeshId;

/// Flat-color materials the passes draw with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdMaterial {
    /// Writes the object color with depth testing. Used by picking.
    PickingId,
    /// Writes the object color without depth. Used for the selection mask.
    SelectionMask,
    /// Instanced camera-facing icons for HUD entities.
    HudBillboard,
}

impl IdMaterial {
    /// Material name for diagnostics.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            IdMaterial::PickingId => "picking_id",
            IdMaterial::SelectionMask => "selection_mask",
            IdMaterial::HudBillboard => "hud_billboard",
        }
    }
}

/// Parameters for an offscreen target.
///
/// Targets are always `Rgba8Unorm` so a texel reads back as four bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetDescriptor {
    /// Debug label.
    pub label: &'static str,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Whether the target has a depth attachment.
    pub depth: bool,
}

/// Where a pass renders to.
pub enum PassTarget<'a, T, V> {
    /// A target created with [`RenderBackend::create_target`].
    Offscreen(&'a T),
    /// The host's viewport.
    Viewport(&'a V),
}

/// How a pass treats existing contents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoadMode {
    /// Clear color and depth first.
    Clear(Vec4),
    /// Keep existing contents.
    Load,
}

/// A rectangle of pixels, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRegion {
    /// Left column.
    pub x: u32,
    /// Top row.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl PixelRegion {
    /// A single pixel.
    #[must_use]
    pub fn pixel(x: u32, y: u32) -> Self {
        Self {
            x,
            y,
            width: 1,
            height: 1,
        }
    }

    /// Square of side `2 * radius + 1` around `(x, y)`, clipped to a
    /// `width` x `height` target. `None` if the center is outside.
    #[must_use]
    pub fn around(x: u32, y: u32, radius: u32, width: u32, height: u32) -> Option<Self> {
        if x >= width || y >= height {
            return None;
        }
        let x0 = x.saturating_sub(radius);
        let y0 = y.saturating_sub(radius);
        let x1 = x.saturating_add(radius).min(width - 1);
        let y1 = y.saturating_add(radius).min(height - 1);
        Some(Self {
            x: x0,
            y: y0,
            width: x1 - x0 + 1,
            height: y1 - y0 + 1,
        })
    }

    /// Number of pixels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Whether the region covers no pixels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Whether the region lies inside a `width` x `height` target.
    #[must_use]
    pub fn fits(&self, width: u32, height: u32) -> bool {
        self.x.checked_add(self.width).is_some_and(|r| r <= width)
            && self.y.checked_add(self.height).is_some_and(|b| b <= height)
    }
}

/// Per-pass camera constants (224 bytes).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct CameraUniforms {
    pub view: [[f32; 4]; 4],
    pub proj: [[f32; 4]; 4],
    pub view_proj: [[f32; 4]; 4],
    /// `[width, height, 1 / width, 1 / height]`.
    pub viewport: [f32; 4],
    /// `x`: HUD icon half size in world units.
    pub params: [f32; 4],
}

impl CameraUniforms {
    /// Packs a camera view.
    #[must_use]
    pub fn new(camera: &CameraView, hud_icon_size: f32) -> Self {
        let w = camera.width.max(1) as f32;
        let h = camera.height.max(1) as f32;
        Self {
            view: camera.view.to_cols_array_2d(),
            proj: camera.projection.to_cols_array_2d(),
            view_proj: camera.view_projection().to_cols_array_2d(),
            viewport: [w, h, 1.0 / w, 1.0 / h],
            params: [hud_icon_size, 0.0, 0.0, 0.0],
        }
    }
}

/// Per-draw constants (80 bytes).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ObjectConstants {
    pub world: [[f32; 4]; 4],
    pub color: [f32; 4],
}

impl ObjectConstants {
    /// Constants for a draw in an arbitrary flat color.
    #[must_use]
    pub fn new(world: &Mat4, color: Vec4) -> Self {
        Self {
            world: world.to_cols_array_2d(),
            color: color.to_array(),
        }
    }

    /// Constants for a draw in an identity color.
    #[must_use]
    pub fn with_key(world: &Mat4, key: ColorKey) -> Self {
        Self::new(world, key.to_vec4())
    }
}

/// One direction of the separable blur (32 bytes).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct BlurParams {
    /// Unit step direction, `[1, 0]` or `[0, 1]`.
    pub direction: [f32; 2],
    /// `1 / size` of the source texture.
    pub texel_size: [f32; 2],
    /// Tap spacing in source texels.
    pub radius: f32,
    pub _padding: [f32; 3],
}

impl BlurParams {
    /// Horizontal blur of a `width` x `height` source.
    #[must_use]
    pub fn horizontal(width: u32, height: u32, radius: f32) -> Self {
        Self::along([1.0, 0.0], width, height, radius)
    }

    /// Vertical blur of a `width` x `height` source.
    #[must_use]
    pub fn vertical(width: u32, height: u32, radius: f32) -> Self {
        Self::along([0.0, 1.0], width, height, radius)
    }

    fn along(direction: [f32; 2], width: u32, height: u32, radius: f32) -> Self {
        Self {
            direction,
            texel_size: [1.0 / width.max(1) as f32, 1.0 / height.max(1) as f32],
            radius,
            _padding: [0.0; 3],
        }
    }
}

/// Outline composite constants (16 bytes).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct OutlineParams {
    /// Multiplier applied to `blurred - sharp`.
    pub intensity: f32,
    pub _padding: [f32; 3],
}

impl OutlineParams {
    #[must_use]
    pub fn new(intensity: f32) -> Self {
        Self {
            intensity,
            _padding: [0.0; 3],
        }
    }
}

/// The graphics operations the picking and selection passes need.
///
/// Calls follow a strict shape: `begin_pass`, any number of `set_material`
/// and draws, `end_pass`. `blur`, `composite_outline`, and `read_pixels`
/// are only issued between passes.
pub trait RenderBackend {
    /// An offscreen color target, with optional depth.
    type Target;
    /// The host surface the selection overlay is composited onto.
    type Viewport;

    /// Allocates an offscreen target.
    fn create_target(&mut self, desc: &TargetDescriptor) -> PickResult<Self::Target>;

    /// Begins a render pass.
    fn begin_pass(
        &mut self,
        target: PassTarget<'_, Self::Target, Self::Viewport>,
        camera: &CameraUniforms,
        load: LoadMode,
    ) -> PickResult<()>;

    /// Binds a material for subsequent draws.
    fn set_material(&mut self, material: IdMaterial) -> PickResult<()>;

    /// Draws a mesh with the bound material.
    fn draw_mesh(&mut self, mesh: MeshId, constants: &ObjectConstants) -> PickResult<()>;

    /// Draws up to [`crate::hud::MAX_HUD_INSTANCED_BLOCK`] HUD instances in
    /// one instanced call.
    fn draw_hud_instances(&mut self, instances: &[HudInstance]) -> PickResult<()>;

    /// Ends the current pass and submits its work.
    fn end_pass(&mut self) -> PickResult<()>;

    /// One direction of a separable Gaussian blur from `src` into `dst`.
    fn blur(
        &mut self,
        src: &Self::Target,
        dst: &Self::Target,
        params: &BlurParams,
    ) -> PickResult<()>;

    /// Blends `max(blurred - mask, 0) * intensity` onto the viewport.
    fn composite_outline(
        &mut self,
        mask: &Self::Target,
        blurred: &Self::Target,
        viewport: &Self::Viewport,
        params: &OutlineParams,
    ) -> PickResult<()>;

    /// Reads raw RGBA8 texels, row-major from the region's top-left.
    fn read_pixels(
        &mut self,
        target: &Self::Target,
        region: PixelRegion,
    ) -> PickResult<Vec<[u8; 4]>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_sizes() {
        assert_eq!(std::mem::size_of::<CameraUniforms>(), 224);
        assert_eq!(std::mem::size_of::<ObjectConstants>(), 80);
        assert_eq!(std::mem::size_of::<BlurParams>(), 32);
        assert_eq!(std::mem::size_of::<OutlineParams>(), 16);
    }

    #[test]
    fn test_region_around_clips() {
        let region = PixelRegion::around(1, 1, 3, 10, 10).expect("center inside");
        assert_eq!(region, PixelRegion { x: 0, y: 0, width: 5, height: 5 });
        let edge = PixelRegion::around(9, 9, 2, 10, 10).expect("center inside");
        assert_eq!(edge, PixelRegion { x: 7, y: 7, width: 3, height: 3 });
        assert!(PixelRegion::around(10, 0, 1, 10, 10).is_none());
    }

    #[test]
    fn test_region_fits() {
        assert!(PixelRegion::pixel(9, 9).fits(10, 10));
        assert!(!PixelRegion::pixel(10, 9).fits(10, 10));
        assert!(!PixelRegion { x: u32::MAX, y: 0, width: 2, height: 1 }.fits(10, 10));
    }

    #[test]
    fn test_camera_uniforms_viewport() {
        let camera = CameraView::new(Mat4::IDENTITY, Mat4::IDENTITY, 200, 100);
        let uniforms = CameraUniforms::new(&camera, 0.25);
        assert_eq!(uniforms.viewport, [200.0, 100.0, 0.005, 0.01]);
        assert_eq!(uniforms.params[0], 0.25);
    }
}
