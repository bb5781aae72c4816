//! Depth-first scene traversal.
//!
//! [`Traversal`] walks the hierarchy lazily and yields one [`Visit`] per
//! visible entity that has a visual. It assigns identity colors as it goes,
//! so a color is always registered before any draw that uses it. What to do
//! with a visit (draw now, or collect a HUD instance) is up to the consumer.

use std::sync::Arc;

use glam::Mat4;

use crate::camera::Frustum;
use crate::color::ColorKey;
use crate::cull::FrustumCuller;
use crate::registry::ColorRegistry;
use crate::scene::{HudKind, MeshId, SceneEntity, Visual};

/// What the consumer should do for a visited entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitAction {
    /// Draw a mesh with the current ID-encoding material.
    Draw {
        /// The mesh to draw.
        mesh: MeshId,
    },
    /// Add a HUD billboard instance.
    Hud(HudKind),
}

/// A visible entity, its color, and the action to take.
#[derive(Debug)]
pub struct Visit<E> {
    /// The visited entity.
    pub entity: Arc<E>,
    /// Identity color from the registry.
    pub color: ColorKey,
    /// World transform at visit time.
    pub world: Mat4,
    /// What to draw.
    pub action: VisitAction,
}

/// Statistics gathered while traversing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraversalStats {
    /// Entities popped from the stack.
    pub visited: usize,
    /// Entities with a visual that failed the frustum test.
    pub culled: usize,
    /// Entities yielded to the consumer.
    pub yielded: usize,
}

/// Lazy parent-before-children walk over a scene hierarchy.
pub struct Traversal<'a, E: SceneEntity> {
    stack: Vec<Arc<E>>,
    registry: &'a mut ColorRegistry<E>,
    culler: &'a FrustumCuller,
    frustum: Frustum,
    now: f64,
    stats: TraversalStats,
}

impl<'a, E: SceneEntity> Traversal<'a, E> {
    /// Starts a traversal at `root`.
    pub fn new(
        root: &Arc<E>,
        registry: &'a mut ColorRegistry<E>,
        culler: &'a FrustumCuller,
        frustum: Frustum,
        now: f64,
    ) -> Self {
        Self {
            stack: vec![Arc::clone(root)],
            registry,
            culler,
            frustum,
            now,
            stats: TraversalStats::default(),
        }
    }

    /// Statistics so far.
    pub fn stats(&self) -> TraversalStats {
        self.stats
    }
}

impl<E: SceneEntity> Iterator for Traversal<'_, E> {
    type Item = Visit<E>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(entity) = self.stack.pop() {
            self.stats.visited += 1;

            // Children are pushed in reverse so siblings come out in
            // container order. They are walked whether or not the parent
            // itself is visible.
            let children = entity.children();
            self.stack.extend(children.into_iter().rev());

            let Some(visual) = entity.visual() else {
                continue;
            };
            let color = self.registry.get_or_assign_color(&entity, self.now);
            let world = entity.world_transform();

            if !self.culler.is_visible(&self.frustum, &world, &visual) {
                self.stats.culled += 1;
                continue;
            }

            let action = match visual {
                Visual::Renderable { mesh, .. } => VisitAction::Draw { mesh },
                Visual::Hud(kind) => VisitAction::Hud(kind),
            };
            self.stats.yielded += 1;
            return Some(Visit {
                entity,
                color,
                world,
                action,
            });
        }
        None
    }
}
