//! The selection highlight pass.
//!
//! Highlighted renderables are drawn flat into a mask, the mask is blurred
//! on downsampled targets, and the difference between the blurred and sharp
//! masks is blended onto the viewport as an outline. Highlighted HUD entities
//! are then drawn as tinted billboards directly on the viewport.

use std::sync::Arc;
use std::time::Instant;

use glam::Vec4;

use crate::backend::{
    BlurParams, CameraUniforms, IdMaterial, LoadMode, ObjectConstants, OutlineParams,
    PassTarget, RenderBackend,
};
use crate::camera::CameraView;
use crate::cull::FrustumCuller;
use crate::error::PickResult;
use crate::hud::{flush_hud_batch, HudInstance};
use crate::options::{PickingOptions, SelectionStyle};
use crate::registry::ColorRegistry;
use crate::scene::{Highlight, MeshId, SceneEntity};
use crate::surface::RenderSurface;
use crate::traverse::{Traversal, VisitAction};

/// Counters from one selection pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionStats {
    /// Highlighted meshes drawn into the mask.
    pub meshes: usize,
    /// Whether the blur and composite steps ran.
    pub outlined: bool,
    /// Highlighted HUD instances drawn.
    pub hud_instances: usize,
    /// Instanced HUD draw calls.
    pub hud_draws: usize,
}

/// Outline and HUD highlight renderer.
pub struct SelectionPass<B: RenderBackend, E: SceneEntity> {
    options: PickingOptions,
    culler: FrustumCuller,
    registry: ColorRegistry<E>,
    mask: RenderSurface<B::Target>,
    blur_a: RenderSurface<B::Target>,
    blur_b: RenderSurface<B::Target>,
    epoch: Instant,
}

impl<B: RenderBackend, E: SceneEntity> Default for SelectionPass<B, E> {
    fn default() -> Self {
        Self::new(PickingOptions::default())
    }
}

impl<B: RenderBackend, E: SceneEntity> SelectionPass<B, E> {
    pub fn new(options: PickingOptions) -> Self {
        let options = options.sanitized();
        Self {
            culler: FrustumCuller::from_options(&options),
            options,
            registry: ColorRegistry::new(),
            mask: RenderSurface::new("selection_mask", false),
            blur_a: RenderSurface::new("selection_blur_a", false),
            blur_b: RenderSurface::new("selection_blur_b", false),
            epoch: Instant::now(),
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
        self.options = options;
    }

    /// The pass's color registry.
    pub fn registry(&self) -> &ColorRegistry<E> {
        &self.registry
    }

    /// Size of the mask target, if one exists.
    pub fn mask_size(&self) -> Option<(u32, u32)> {
        self.mask.size()
    }

    /// Size of the downsampled blur targets, if they exist.
    pub fn blur_size(&self) -> Option<(u32, u32)> {
        self.blur_b.size()
    }

    /// Draws outlines for highlighted renderables and tinted billboards for
    /// highlighted HUD entities onto `viewport`.
    ///
    /// The viewport size is taken from `camera`. Returns `None` if the pass
    /// failed; the failure is logged.
    pub fn render_selection_highlight(
        &mut self,
        backend: &mut B,
        camera: &CameraView,
        viewport: &B::Viewport,
        root: &Arc<E>,
    ) -> Option<SelectionStats> {
        let style = self.options.selection;
        let uniforms = CameraUniforms::new(camera, self.options.hud_icon_size);

        let mut meshes: Vec<(MeshId, ObjectConstants)> = Vec::new();
        let mut hud: Vec<HudInstance> = Vec::new();
        let now = self.epoch.elapsed().as_secs_f64();
        let traversal = Traversal::new(
            root,
            &mut self.registry,
            &self.culler,
            camera.frustum(),
            now,
        );
        for visit in traversal {
            let Some(color) = highlight_color(&style, visit.entity.highlight()) else {
                continue;
            };
            match visit.action {
                VisitAction::Draw { mesh } => {
                    meshes.push((mesh, ObjectConstants::new(&visit.world, color)));
                }
                VisitAction::Hud(kind) => hud.push(HudInstance::new(&visit.world, color, kind)),
            }
        }
        self.registry.retain_live();

        let mut stats = SelectionStats::default();
        if !meshes.is_empty() {
            match self.draw_outline(backend, camera, viewport, &uniforms, &meshes) {
                Ok(drawn) => {
                    stats.meshes = drawn;
                    stats.outlined = true;
                }
                Err(e) => {
                    log::warn!("selection outline skipped: {e}");
                    return None;
                }
            }
        }

        if !hud.is_empty() {
            match draw_hud_overlay(backend, viewport, &uniforms, &hud) {
                Ok(draws) => {
                    stats.hud_instances = hud.len();
                    stats.hud_draws = draws;
                }
                Err(e) => {
                    log::warn!("selection HUD overlay skipped: {e}");
                    return None;
                }
            }
        }

        log::debug!(
            "selection pass: {} meshes (outlined: {}), {} hud instances in {} draws",
            stats.meshes,
            stats.outlined,
            stats.hud_instances,
            stats.hud_draws
        );
        Some(stats)
    }

    /// Drops all targets and registry entries.
    pub fn clear(&mut self) {
        self.registry.clear();
        self.mask.release();
        self.blur_a.release();
        self.blur_b.release();
    }

    fn draw_outline(
        &mut self,
        backend: &mut B,
        camera: &CameraView,
        viewport: &B::Viewport,
        uniforms: &CameraUniforms,
        meshes: &[(MeshId, ObjectConstants)],
    ) -> PickResult<usize> {
        let (width, height) = (camera.width, camera.height);
        let downsample = self.options.selection.blur_downsample.max(1);
        let (blur_w, blur_h) = ((width / downsample).max(1), (height / downsample).max(1));
        let radius = self.options.selection.blur_radius;

        let mask = self.mask.ensure(backend, width, height)?;
        let blur_a = self.blur_a.ensure(backend, blur_w, blur_h)?;
        let blur_b = self.blur_b.ensure(backend, blur_w, blur_h)?;

        backend.begin_pass(
            PassTarget::Offscreen(mask),
            uniforms,
            LoadMode::Clear(Vec4::ZERO),
        )?;
        let drawn = draw_meshes(backend, meshes);
        backend.end_pass()?;
        let drawn = drawn?;

        backend.blur(mask, blur_a, &BlurParams::horizontal(width, height, radius))?;
        backend.blur(blur_a, blur_b, &BlurParams::vertical(blur_w, blur_h, radius))?;
        backend.composite_outline(
            mask,
            blur_b,
            viewport,
            &OutlineParams::new(self.options.selection.outline_intensity),
        )?;
        Ok(drawn)
    }
}

fn highlight_color(style: &SelectionStyle, highlight: Highlight) -> Option<Vec4> {
    match highlight {
        Highlight::None => None,
        Highlight::Hovered => Some(style.hovered_color),
        Highlight::Selected => Some(style.selected_color),
    }
}

fn draw_meshes<B: RenderBackend>(
    backend: &mut B,
    meshes: &[(MeshId, ObjectConstants)],
) -> PickResult<usize> {
    backend.set_material(IdMaterial::SelectionMask)?;
    let mut drawn = 0;
    for (mesh, constants) in meshes {
        match backend.draw_mesh(*mesh, constants) {
            Ok(()) => drawn += 1,
            Err(e) => log::warn!("skipping highlighted mesh {}: {e}", mesh.0),
        }
    }
    Ok(drawn)
}

fn draw_hud_overlay<B: RenderBackend>(
    backend: &mut B,
    viewport: &B::Viewport,
    uniforms: &CameraUniforms,
    hud: &[HudInstance],
) -> PickResult<usize> {
    backend.begin_pass(PassTarget::Viewport(viewport), uniforms, LoadMode::Load)?;
    let drawn = backend
        .set_material(IdMaterial::HudBillboard)
        .and_then(|()| flush_hud_batch(backend, hud));
    backend.end_pass()?;
    drawn
}

