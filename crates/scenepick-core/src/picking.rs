//! The picking pass.
//!
//! Renders every visible entity into an offscreen target with its identity
//! color, then answers "what is under this pixel" by reading the target back
//! and resolving the texel through the pass's color registry.

use std::sync::Arc;
use std::time::Instant;

use glam::Vec4;

use crate::backend::{
    CameraUniforms, IdMaterial, LoadMode, ObjectConstants, PassTarget, PixelRegion,
    RenderBackend,
};
use crate::camera::CameraView;
use crate::color::texel_to_color;
use crate::cull::FrustumCuller;
use crate::error::PickResult;
use crate::hud::{flush_hud_batch, HudInstance};
use crate::options::PickingOptions;
use crate::registry::ColorRegistry;
use crate::resolve::PixelResolver;
use crate::scene::SceneEntity;
use crate::surface::RenderSurface;
use crate::traverse::{Traversal, VisitAction};

/// Counters from one completed pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassStats {
    /// Meshes drawn.
    pub meshes: usize,
    /// HUD instances submitted.
    pub hud_instances: usize,
    /// Instanced HUD draw calls.
    pub hud_draws: usize,
    /// Entities rejected by the frustum test.
    pub culled: usize,
    /// Registry entries removed after the pass.
    pub evicted: usize,
}

/// Offscreen ID-color pass plus the registry that decodes it.
pub struct PickingPass<B: RenderBackend, E: SceneEntity> {
    options: PickingOptions,
    culler: FrustumCuller,
    resolver: PixelResolver,
    registry: ColorRegistry<E>,
    surface: RenderSurface<B::Target>,
    epoch: Instant,
    computed: bool,
    ready: bool,
}

impl<B: RenderBackend, E: SceneEntity> Default for PickingPass<B, E> {
    fn default() -> Self {
        Self::new(PickingOptions::default())
    }
}

impl<B: RenderBackend, E: SceneEntity> PickingPass<B, E> {
    /// Creates a pass. No GPU resources are allocated until the first
    /// [`compute_picking`](Self::compute_picking).
    pub fn new(options: PickingOptions) -> Self {
        let options = options.sanitized();
        Self {
            culler: FrustumCuller::from_options(&options),
            resolver: PixelResolver::new(options.fallback_tolerance),
            options,
            registry: ColorRegistry::new(),
            surface: RenderSurface::new("picking", true),
            epoch: Instant::now(),
            computed: false,
            ready: false,
        }
    }

    /// Current options.
    pub fn options(&self) -> &PickingOptions {
        &self.options
    }

    /// Replaces the options.
    pub fn set_options(&mut self, options: PickingOptions) {
        let options = options.sanitized();
        self.culler = FrustumCuller::from_options(&options);
        self.resolver = PixelResolver::new(options.fallback_tolerance);
        self.options = options;
    }

    /// The pass's color registry.
    pub fn registry(&self) -> &ColorRegistry<E> {
        &self.registry
    }

    /// Size of the picking target, if one exists.
    pub fn size(&self) -> Option<(u32, u32)> {
        self.surface.size()
    }

    /// The picking target of the last successful pass.
    pub fn target(&self) -> Option<&B::Target> {
        if self.ready {
            self.surface.target()
        } else {
            None
        }
    }

    /// Whether the last pass completed and its target can be sampled.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Renders the scene into the picking target at `width` x `height`,
    /// using the wall clock for registry timestamps.
    pub fn compute_picking(
        &mut self,
        backend: &mut B,
        camera: &CameraView,
        width: u32,
        height: u32,
        root: &Arc<E>,
    ) -> Option<PassStats> {
        let now = self.epoch.elapsed().as_secs_f64();
        self.compute_picking_at(backend, camera, width, height, root, now)
    }

    /// Same as [`compute_picking`](Self::compute_picking) with an explicit
    /// timestamp in seconds.
    ///
    /// Failures are logged and leave the pass without a valid target; later
    /// picks return nothing until a pass succeeds.
    pub fn compute_picking_at(
        &mut self,
        backend: &mut B,
        camera: &CameraView,
        width: u32,
        height: u32,
        root: &Arc<E>,
        now: f64,
    ) -> Option<PassStats> {
        self.computed = true;
        self.ready = false;

        let target = match self.surface.ensure(backend, width, height) {
            Ok(target) => target,
            Err(e) => {
                log::warn!("picking pass skipped: {e}");
                return None;
            }
        };

        let camera = camera.with_viewport(width, height);
        let uniforms = CameraUniforms::new(&camera, self.options.hud_icon_size);
        if let Err(e) = backend.begin_pass(
            PassTarget::Offscreen(target),
            &uniforms,
            LoadMode::Clear(Vec4::ZERO),
        ) {
            log::warn!("picking pass skipped: {e}");
            return None;
        }

        let traversal = Traversal::new(
            root,
            &mut self.registry,
            &self.culler,
            camera.frustum(),
            now,
        );
        let recorded = record_id_pass(backend, traversal);
        let ended = backend.end_pass();

        let mut stats = match recorded.and_then(|stats| ended.map(|()| stats)) {
            Ok(stats) => stats,
            Err(e) => {
                log::warn!("picking pass failed: {e}");
                return None;
            }
        };

        stats.evicted = self.registry.sweep(now, self.options.eviction_ttl);
        self.ready = true;
        log::debug!(
            "picking pass: {} meshes, {} hud instances in {} draws, {} culled, {} evicted",
            stats.meshes,
            stats.hud_instances,
            stats.hud_draws,
            stats.culled,
            stats.evicted
        );
        Some(stats)
    }

    /// Color of the picking target at a pixel, or transparent black when
    /// there is nothing to sample.
    pub fn get_color_at(&self, backend: &mut B, x: u32, y: u32) -> Vec4 {
        self.read_texel(backend, x, y).map_or(Vec4::ZERO, texel_to_color)
    }

    /// Entity under a pixel.
    pub fn get_entity_at(&self, backend: &mut B, x: u32, y: u32) -> Option<Arc<E>> {
        let texel = self.read_texel(backend, x, y)?;
        self.resolver.resolve(&self.registry, texel)
    }

    /// Entity closest to a pixel within a square of `radius` pixels.
    pub fn get_entity_near(
        &self,
        backend: &mut B,
        x: u32,
        y: u32,
        radius: u32,
    ) -> Option<Arc<E>> {
        let (target, (width, height)) = self.sample_target()?;
        let region = PixelRegion::around(x, y, radius, width, height)?;
        let texels = read_or_log(backend, target, region)?;
        self.resolver
            .resolve_nearest(&self.registry, &texels, region, x, y)
    }

    /// Drops the target and forgets all registered entities.
    pub fn clear(&mut self) {
        self.registry.clear();
        self.surface.release();
        self.computed = false;
        self.ready = false;
    }

    fn sample_target(&self) -> Option<(&B::Target, (u32, u32))> {
        debug_assert!(self.computed, "picking queried before compute_picking");
        if !self.ready {
            return None;
        }
        Some((self.surface.target()?, self.surface.size()?))
    }

    fn read_texel(&self, backend: &mut B, x: u32, y: u32) -> Option<[u8; 4]> {
        let (target, (width, height)) = self.sample_target()?;
        if x >= width || y >= height {
            return None;
        }
        read_or_log(backend, target, PixelRegion::pixel(x, y))?
            .first()
            .copied()
    }
}

fn read_or_log<B: RenderBackend>(
    backend: &mut B,
    target: &B::Target,
    region: PixelRegion,
) -> Option<Vec<[u8; 4]>> {
    match backend.read_pixels(target, region) {
        Ok(texels) => Some(texels),
        Err(e) => {
            log::warn!("picking read-back failed: {e}");
            None
        }
    }
}

/// Draws every visit with the ID material, then flushes the collected HUD
/// instances.
fn record_id_pass<B, E>(backend: &mut B, mut traversal: Traversal<'_, E>) -> PickResult<PassStats>
where
    B: RenderBackend,
    E: SceneEntity,
{
    backend.set_material(IdMaterial::PickingId)?;

    let mut stats = PassStats::default();
    let mut hud = Vec::new();
    for visit in traversal.by_ref() {
        match visit.action {
            VisitAction::Draw { mesh } => {
                let constants = ObjectConstants::with_key(&visit.world, visit.color);
                match backend.draw_mesh(mesh, &constants) {
                    Ok(()) => stats.meshes += 1,
                    Err(e) => log::warn!("skipping '{}': {e}", visit.entity.name()),
                }
            }
            VisitAction::Hud(kind) => {
                hud.push(HudInstance::with_key(&visit.world, visit.color, kind));
            }
        }
    }
    stats.culled = traversal.stats().culled;

    if !hud.is_empty() {
        backend.set_material(IdMaterial::HudBillboard)?;
        stats.hud_draws = flush_hud_batch(backend, &hud)?;
        stats.hud_instances = hud.len();
    }
    Ok(stats)
}
