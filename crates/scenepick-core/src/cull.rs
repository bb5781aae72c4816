//! Per-entity frustum culling.
//!
//! Renderables are tested with their transformed bounds. HUD entities have no
//! geometry, so they get a synthetic sphere of `base_radius * factor` around
//! their world position; icons stay visible slightly past the frustum edge
//! instead of popping when their center leaves it.

use glam::Mat4;

use crate::camera::Frustum;
use crate::options::{CullFactors, PickingOptions};
use crate::scene::{HudKind, Visual};

/// Stateless visibility predicate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrustumCuller {
    /// Synthetic sphere radius for HUD entities.
    pub base_radius: f32,
    /// Per-kind radius multipliers.
    pub factors: CullFactors,
}

impl Default for FrustumCuller {
    fn default() -> Self {
        Self::from_options(&PickingOptions::default())
    }
}

impl FrustumCuller {
    /// Creates a culler from explicit settings.
    #[must_use]
    pub fn new(base_radius: f32, factors: CullFactors) -> Self {
        Self {
            base_radius,
            factors,
        }
    }

    /// Creates a culler from pass options.
    #[must_use]
    pub fn from_options(options: &PickingOptions) -> Self {
        Self::new(options.hud_base_radius, options.cull_factors)
    }

    /// Culling radius used for a HUD kind.
    #[must_use]
    pub fn hud_radius(&self, kind: HudKind) -> f32 {
        self.base_radius * self.factors.get(kind)
    }

    /// Whether an entity with the given world transform and visual is
    /// inside the frustum.
    ///
    /// The boundary is inclusive: a HUD entity whose center lies exactly
    /// `hud_radius` outside a plane is visible.
    #[must_use]
    pub fn is_visible(&self, frustum: &Frustum, world: &Mat4, visual: &Visual) -> bool {
        match visual {
            Visual::Renderable { bounds, .. } => {
                frustum.intersects_aabb(&bounds.transformed(world))
            }
            Visual::Hud(kind) => {
                let center = world.w_axis.truncate();
                frustum.intersects_sphere(center, self.hud_radius(*kind))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::camera::Aabb;
    use crate::scene::MeshId;

    /// Orthographic box [-10, 10] x [-10, 10], looking down -Z.
    fn ortho_frustum() -> Frustum {
        Frustum::from_view_projection(Mat4::orthographic_rh(-10.0, 10.0, -10.0, 10.0, 0.1, 100.0))
    }

    fn hud_at(x: f32) -> Mat4 {
        Mat4::from_translation(Vec3::new(x, 0.0, -50.0))
    }

    #[test]
    fn test_hud_boundary_is_inclusive() {
        let culler = FrustumCuller::new(0.5, CullFactors {
            light: 4.0,
            ..CullFactors::default()
        });
        let frustum = ortho_frustum();
        // Radius is 0.5 * 4 = 2; the left plane sits at x = -10.
        assert!(culler.is_visible(&frustum, &hud_at(-12.0), &Visual::LIGHT));
        assert!(!culler.is_visible(&frustum, &hud_at(-12.001), &Visual::LIGHT));
    }

    #[test]
    fn test_factor_scales_radius() {
        let frustum = ortho_frustum();
        let culler = FrustumCuller::new(0.5, CullFactors {
            audio_source: 1.0,
            camera: 10.0,
            ..CullFactors::default()
        });
        let outside = hud_at(-13.0);
        assert!(!culler.is_visible(&frustum, &outside, &Visual::AUDIO_SOURCE));
        assert!(culler.is_visible(&frustum, &outside, &Visual::CAMERA));
    }

    #[test]
    fn test_renderable_uses_bounds() {
        let frustum = ortho_frustum();
        let culler = FrustumCuller::default();
        let visual = Visual::Renderable {
            mesh: MeshId(1),
            bounds: Aabb::from_center_half_extents(Vec3::ZERO, Vec3::splat(1.0)),
        };
        // Box spans [-12, -10] in x: touches the plane.
        assert!(culler.is_visible(&frustum, &hud_at(-11.0), &visual));
        assert!(!culler.is_visible(&frustum, &hud_at(-11.5), &visual));
        // Scaled up, the same position is visible again.
        let scaled = hud_at(-11.5) * Mat4::from_scale(Vec3::splat(4.0));
        assert!(culler.is_visible(&frustum, &scaled, &visual));
    }

    #[test]
    fn test_behind_camera_is_culled() {
        let frustum = ortho_frustum();
        let culler = FrustumCuller::default();
        let behind = Mat4::from_translation(Vec3::new(0.0, 0.0, 10.0));
        assert!(!culler.is_visible(&frustum, &behind, &Visual::AUDIO_LISTENER));
    }
}
