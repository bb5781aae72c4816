//! Picking and selection highlighting for one editor viewport.

use std::path::Path;
use std::sync::Arc;

use glam::{Vec3, Vec4};
use scenepick_core::{
    CameraView, MeshId, PassStats, PickingOptions, PickingPass, SceneEntity, SceneNode,
    SelectionPass, SelectionStats,
};
use scenepick_render::{RenderError, ViewportTarget, WgpuBackend};

use crate::error::{Result, ScenepickError};

/// Bundles a [`WgpuBackend`] with one picking pass and one selection pass.
///
/// The two passes keep separate color registries: the picking registry
/// ages entries out over time, the selection registry only drops entities
/// that were destroyed.
pub struct EditorPicking<E: SceneEntity> {
    backend: WgpuBackend,
    picking: PickingPass<WgpuBackend, E>,
    selection: SelectionPass<WgpuBackend, E>,
}

impl<E: SceneEntity> EditorPicking<E> {
    /// Wraps an existing backend.
    pub fn new(backend: WgpuBackend, options: PickingOptions) -> Self {
        Self {
            backend,
            picking: PickingPass::new(options.clone()),
            selection: SelectionPass::new(options),
        }
    }

    /// Shares the host editor's device.
    pub fn with_device(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self::new(WgpuBackend::new(device, queue), PickingOptions::default())
    }

    /// Creates its own device with no window.
    pub fn headless(options: PickingOptions) -> Result<Self> {
        let backend = pollster::block_on(WgpuBackend::new_headless())?;
        Ok(Self::new(backend, options))
    }

    pub fn backend(&self) -> &WgpuBackend {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut WgpuBackend {
        &mut self.backend
    }

    /// The picking pass.
    pub fn picking(&self) -> &PickingPass<WgpuBackend, E> {
        &self.picking
    }

    /// The selection pass.
    pub fn selection(&self) -> &SelectionPass<WgpuBackend, E> {
        &self.selection
    }

    /// Options shared by both passes.
    pub fn options(&self) -> &PickingOptions {
        self.picking.options()
    }

    /// Replaces the options of both passes.
    pub fn set_options(&mut self, options: PickingOptions) {
        self.picking.set_options(options.clone());
        self.selection.set_options(options);
    }

    /// Uploads a triangle mesh for the ID passes.
    pub fn upload_mesh(&mut self, positions: &[Vec3], indices: &[u32]) -> Result<MeshId> {
        Ok(self.backend.upload_mesh(positions, indices)?)
    }

    /// Uploads a mesh and returns a scene node that draws it, with bounds
    /// computed from the positions.
    pub fn mesh_node(
        &mut self,
        name: impl Into<String>,
        positions: &[Vec3],
        indices: &[u32],
    ) -> Result<SceneNode> {
        let mesh = self.upload_mesh(positions, indices)?;
        let bounds = self.backend.mesh_bounds(mesh).ok_or_else(|| {
            RenderError::InvalidMesh(format!("mesh {} vanished after upload", mesh.0))
        })?;
        Ok(SceneNode::mesh(name, mesh, bounds))
    }

    /// Frees a mesh. Returns whether it existed.
    pub fn remove_mesh(&mut self, mesh: MeshId) -> bool {
        self.backend.remove_mesh(mesh)
    }

    /// Renders the picking target for the current view.
    pub fn compute_picking(
        &mut self,
        camera: &CameraView,
        width: u32,
        height: u32,
        root: &Arc<E>,
    ) -> Option<PassStats> {
        self.picking
            .compute_picking(&mut self.backend, camera, width, height, root)
    }

    /// Picking target color at a pixel.
    pub fn get_color_at(&mut self, x: u32, y: u32) -> Vec4 {
        self.picking.get_color_at(&mut self.backend, x, y)
    }

    /// Entity under a pixel.
    pub fn get_entity_at(&mut self, x: u32, y: u32) -> Option<Arc<E>> {
        self.picking.get_entity_at(&mut self.backend, x, y)
    }

    /// Entity closest to a pixel within `radius` pixels.
    pub fn get_entity_near(&mut self, x: u32, y: u32, radius: u32) -> Option<Arc<E>> {
        self.picking
            .get_entity_near(&mut self.backend, x, y, radius)
    }

    /// Draws outlines and HUD highlights for highlighted entities onto
    /// `viewport`.
    pub fn render_selection_highlight(
        &mut self,
        camera: &CameraView,
        viewport: &ViewportTarget,
        root: &Arc<E>,
    ) -> Option<SelectionStats> {
        self.selection
            .render_selection_highlight(&mut self.backend, camera, viewport, root)
    }

    /// Writes the current picking target to an image file.
    pub fn save_picking_target(&self, path: impl AsRef<Path>) -> Result<()> {
        let target = self.picking.target().ok_or(ScenepickError::NotComputed)?;
        self.backend.save_target(target, path)?;
        Ok(())
    }

    /// Releases both passes' targets and registries. Meshes stay uploaded.
    pub fn clear(&mut self) {
        self.picking.clear();
        self.selection.clear();
        log::debug!("cleared picking and selection state");
    }
}
