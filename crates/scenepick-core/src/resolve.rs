//! Mapping read-back texels to entities.

use std::sync::Arc;

use glam::Vec4;

use crate::backend::PixelRegion;
use crate::color::{color_distance_squared, texel_to_color, ColorKey};
use crate::options::DEFAULT_FALLBACK_TOLERANCE;
use crate::registry::ColorRegistry;
use crate::scene::SceneEntity;

/// Resolves texels against a registry: exact key first, then the closest
/// designated color within `tolerance`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelResolver {
    /// Squared RGB distance accepted by the fallback match.
    pub tolerance: f32,
}

impl Default for PixelResolver {
    fn default() -> Self {
        Self::new(DEFAULT_FALLBACK_TOLERANCE)
    }
}

impl PixelResolver {
    #[must_use]
    pub fn new(tolerance: f32) -> Self {
        Self { tolerance }
    }

    /// Whether a sample is indistinguishable from the cleared background.
    #[must_use]
    pub fn is_background(&self, color: Vec4) -> bool {
        color_distance_squared(color, Vec4::ZERO) <= self.tolerance
    }

    /// Resolves one texel.
    pub fn resolve<E: SceneEntity>(
        &self,
        registry: &ColorRegistry<E>,
        texel: [u8; 4],
    ) -> Option<Arc<E>> {
        if let Some(entity) = registry.resolve(ColorKey::from_rgba8(texel)) {
            return Some(entity);
        }
        let color = texel_to_color(texel);
        if self.is_background(color) {
            return None;
        }
        registry.find_nearest(color, self.tolerance)
    }

    /// Resolves the hit closest to `(cx, cy)` among the texels of `region`.
    ///
    /// Ties keep row-major order.
    pub fn resolve_nearest<E: SceneEntity>(
        &self,
        registry: &ColorRegistry<E>,
        texels: &[[u8; 4]],
        region: PixelRegion,
        cx: u32,
        cy: u32,
    ) -> Option<Arc<E>> {
        let mut order: Vec<(u64, usize)> = (0..texels.len().min(region.len()))
            .map(|i| {
                let x = region.x + (i as u32 % region.width);
                let y = region.y + (i as u32 / region.width);
                let dx = u64::from(x.abs_diff(cx));
                let dy = u64::from(y.abs_diff(cy));
                (dx * dx + dy * dy, i)
            })
            .collect();
        order.sort_unstable();
        order
            .into_iter()
            .filter(|&(_, i)| texels[i] != [0; 4])
            .find_map(|(_, i)| self.resolve(registry, texels[i]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SceneNode;

    fn registered(color: ColorKey) -> (ColorRegistry<SceneNode>, Arc<SceneNode>) {
        let entity = SceneNode::group("e").with_color(color).into_shared();
        let mut registry = ColorRegistry::new();
        registry.get_or_assign_color(&entity, 0.0);
        (registry, entity)
    }

    #[test]
    fn test_exact_match() {
        let color = ColorKey::from_index(0x0012_3456);
        let (registry, entity) = registered(color);
        let hit = PixelResolver::default().resolve(&registry, color.to_rgba8());
        assert!(hit.is_some_and(|h| Arc::ptr_eq(&h, &entity)));
    }

    #[test]
    fn test_background_is_empty() {
        let (registry, _entity) = registered(ColorKey::from_rgba8([1, 0, 0, 255]));
        let resolver = PixelResolver::default();
        assert!(resolver.resolve(&registry, [0, 0, 0, 0]).is_none());
        // Near-black without an exact match stays background.
        assert!(resolver.resolve(&registry, [1, 0, 0, 0]).is_none());
    }

    #[test]
    fn test_fallback_tolerates_drift() {
        let color = ColorKey::from_rgba8([120, 40, 200, 255]);
        let (registry, entity) = registered(color);
        let resolver = PixelResolver::default();
        let hit = resolver.resolve(&registry, [121, 41, 199, 255]);
        assert!(hit.is_some_and(|h| Arc::ptr_eq(&h, &entity)));
        assert!(resolver.resolve(&registry, [150, 40, 200, 255]).is_none());
    }

    #[test]
    fn test_zero_tolerance_disables_fallback() {
        let color = ColorKey::from_rgba8([120, 40, 200, 255]);
        let (registry, _entity) = registered(color);
        assert!(PixelResolver::new(0.0)
            .resolve(&registry, [121, 40, 200, 255])
            .is_none());
    }

    #[test]
    fn test_resolve_nearest_prefers_center() {
        let near = SceneNode::group("near").into_shared();
        let far = SceneNode::group("far").into_shared();
        let mut registry = ColorRegistry::new();
        registry.get_or_assign_color(&near, 0.0);
        registry.get_or_assign_color(&far, 0.0);

        // 3x3 region around (1, 1): `far` in the corner, `near` next to the center.
        let mut texels = vec![[0u8; 4]; 9];
        texels[0] = far.pick_color().to_rgba8();
        texels[5] = near.pick_color().to_rgba8();
        let region = PixelRegion { x: 0, y: 0, width: 3, height: 3 };
        let hit = PixelResolver::default().resolve_nearest(&registry, &texels, region, 1, 1);
        assert!(hit.is_some_and(|h| Arc::ptr_eq(&h, &near)));
    }
}
