//! HUD billboard instances and batched submission.
//!
//! Lights, cameras, and audio objects have no geometry. They are drawn as
//! camera-facing icons, one instance per entity, submitted in blocks no larger
//! than the instance uniform array the HUD shader declares.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Quat, Vec3, Vec4};

use crate::backend::RenderBackend;
use crate::color::ColorKey;
use crate::error::PickResult;
use crate::scene::HudKind;

/// Maximum number of HUD instances per draw call.
pub const MAX_HUD_INSTANCED_BLOCK: usize = 32;

/// One HUD billboard instance (96 bytes, std140 compatible).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct HudInstance {
    /// World transform with scale removed.
    pub transform: [[f32; 4]; 4],
    /// Flat color written by the icon.
    pub color: [f32; 4],
    /// [`HudKind::tag`] of the entity.
    pub kind: u32,
    pub _padding: [u32; 3],
}

impl HudInstance {
    /// Builds an instance, stripping scale from `world` so icons keep a
    /// constant size.
    #[must_use]
    pub fn new(world: &Mat4, color: Vec4, kind: HudKind) -> Self {
        let (_, rotation, translation) = world.to_scale_rotation_translation();
        let unscaled = Mat4::from_rotation_translation(rotation, translation);
        Self {
            transform: unscaled.to_cols_array_2d(),
            color: color.to_array(),
            kind: kind.tag(),
            _padding: [0; 3],
        }
    }

    /// Builds an instance that draws in an identity color.
    #[must_use]
    pub fn with_key(world: &Mat4, key: ColorKey, kind: HudKind) -> Self {
        Self::new(world, key.to_vec4(), kind)
    }

    /// World position of the icon.
    #[must_use]
    pub fn position(&self) -> Vec3 {
        Vec3::from_slice(&self.transform[3][..3])
    }

    /// Rotation of the icon.
    #[must_use]
    pub fn rotation(&self) -> Quat {
        Quat::from_mat4(&Mat4::from_cols_array_2d(&self.transform))
    }
}

/// Number of draw calls needed for `count` instances.
#[must_use]
pub fn batch_count(count: usize) -> usize {
    count.div_ceil(MAX_HUD_INSTANCED_BLOCK)
}

/// Submits `instances` in consecutive blocks of at most
/// [`MAX_HUD_INSTANCED_BLOCK`], preserving order.
///
/// Returns the number of draw calls issued. An empty list issues none. If a
/// block fails, the error is returned and later blocks are not submitted.
pub fn flush_hud_batch<B: RenderBackend>(
    backend: &mut B,
    instances: &[HudInstance],
) -> PickResult<usize> {
    let mut draws = 0;
    for block in instances.chunks(MAX_HUD_INSTANCED_BLOCK) {
        backend.draw_hud_instances(block)?;
        draws += 1;
    }
    Ok(draws)
}
