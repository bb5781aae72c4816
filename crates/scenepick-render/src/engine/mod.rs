//! The wgpu picking backend.

mod pick;
mod pipelines;
mod postprocessing;
mod rendering;
mod textures;

use std::collections::HashMap;

use bytemuck::Zeroable;
use glam::Vec3;
use wgpu::util::DeviceExt;

use scenepick_core::{
    Aabb, BlurParams, CameraUniforms, HudInstance, IdMaterial, LoadMode, MeshId, ObjectConstants,
    OutlineParams, PassTarget, PickError, PickResult, PixelRegion, RenderBackend,
    TargetDescriptor, MAX_HUD_INSTANCED_BLOCK,
};

use crate::buffer::DynamicUniforms;
use crate::error::{RenderError, RenderResult};
use crate::mesh::GpuMesh;
use crate::outline_pass::OutlinePass;

use pipelines::{check_material, IdLayouts, PipelineKey, HUD_BLOCK_SIZE};
use rendering::{DrawCommand, PassRecording};

pub use textures::{GpuTarget, ViewportTarget, DEPTH_FORMAT, TARGET_FORMAT};

/// Object slots allocated up front; the buffer grows on demand.
const INITIAL_OBJECT_SLOTS: u64 = 64;
const INITIAL_HUD_BLOCKS: u64 = 4;

/// [`RenderBackend`] on a wgpu device.
///
/// Owns the mesh store, the ID-material pipelines (built lazily per target
/// format), and the blur and outline post-processing.
pub struct WgpuBackend {
    /// The wgpu device.
    pub device: wgpu::Device,
    /// The wgpu queue.
    pub queue: wgpu::Queue,
    pub(crate) layouts: IdLayouts,
    pub(crate) camera_buffer: wgpu::Buffer,
    pub(crate) camera_bind_group: wgpu::BindGroup,
    pub(crate) objects: DynamicUniforms,
    pub(crate) hud_blocks: DynamicUniforms,
    pub(crate) pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
    pub(crate) outline: OutlinePass,
    pub(crate) meshes: HashMap<MeshId, GpuMesh>,
    next_mesh: u64,
    frame: Option<PassRecording>,
}

impl WgpuBackend {
    /// Creates a backend on an existing device, typically the host editor's.
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        let layouts = IdLayouts::new(&device);

        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("camera uniforms"),
            contents: bytemuck::bytes_of(&CameraUniforms::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("camera bind group"),
            layout: &layouts.camera,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let objects = DynamicUniforms::new(
            &device,
            &layouts.object,
            "object uniforms",
            std::mem::size_of::<ObjectConstants>() as u64,
            INITIAL_OBJECT_SLOTS,
        );
        let hud_blocks = DynamicUniforms::new(
            &device,
            &layouts.hud,
            "hud instance blocks",
            HUD_BLOCK_SIZE,
            INITIAL_HUD_BLOCKS,
        );
        let outline = OutlinePass::new(&device);

        Self {
            device,
            queue,
            layouts,
            camera_buffer,
            camera_bind_group,
            objects,
            hud_blocks,
            pipelines: HashMap::new(),
            outline,
            meshes: HashMap::new(),
            next_mesh: 1,
            frame: None,
        }
    }

    /// Creates a backend on its own device, with no window.
    pub async fn new_headless() -> RenderResult<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..wgpu::InstanceDescriptor::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|_| RenderError::AdapterCreationFailed)?;
        log::info!("headless adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("scenepick device (headless)"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::default(),
                experimental_features: wgpu::ExperimentalFeatures::default(),
            })
            .await?;

        Ok(Self::new(device, queue))
    }

    /// Uploads a triangle mesh and returns its handle.
    pub fn upload_mesh(&mut self, positions: &[Vec3], indices: &[u32]) -> RenderResult<MeshId> {
        let id = MeshId(self.next_mesh);
        let mesh = GpuMesh::upload(&self.device, &format!("mesh {}", id.0), positions, indices)?;
        self.next_mesh += 1;
        self.meshes.insert(id, mesh);
        Ok(id)
    }

    /// Local-space bounds of an uploaded mesh.
    pub fn mesh_bounds(&self, id: MeshId) -> Option<Aabb> {
        self.meshes.get(&id).map(|mesh| mesh.bounds)
    }

    /// Frees a mesh. Returns whether it existed.
    pub fn remove_mesh(&mut self, id: MeshId) -> bool {
        self.meshes.remove(&id).is_some()
    }

    /// Number of uploaded meshes.
    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    /// Whether a pass is open.
    pub fn is_recording(&self) -> bool {
        self.frame.is_some()
    }

    fn frame_mut(&mut self) -> PickResult<&mut PassRecording> {
        self.frame.as_mut().ok_or(PickError::NoActivePass)
    }
}

impl RenderBackend for WgpuBackend {
    type Target = GpuTarget;
    type Viewport = ViewportTarget;

    fn create_target(&mut self, desc: &TargetDescriptor) -> PickResult<GpuTarget> {
        self.create_gpu_target(desc)
    }

    fn begin_pass(
        &mut self,
        target: PassTarget<'_, GpuTarget, ViewportTarget>,
        camera: &CameraUniforms,
        load: LoadMode,
    ) -> PickResult<()> {
        if self.frame.is_some() {
            return Err(PickError::Backend("a render pass is already open".into()));
        }
        let recording = match target {
            PassTarget::Offscreen(target) => PassRecording::new(
                "offscreen id pass",
                target.view.clone(),
                target.depth_view().cloned(),
                TARGET_FORMAT,
                *camera,
                load,
            ),
            PassTarget::Viewport(viewport) => PassRecording::new(
                "viewport overlay pass",
                viewport.view.clone(),
                None,
                viewport.format,
                *camera,
                load,
            ),
        };
        self.frame = Some(recording);
        Ok(())
    }

    fn set_material(&mut self, material: IdMaterial) -> PickResult<()> {
        let frame = self.frame.as_ref().ok_or(PickError::NoActivePass)?;
        let key = frame.key(material);
        check_material(material, key.depth)?;
        self.ensure_pipeline(key)?;

        let frame = self.frame_mut()?;
        frame.material = Some(material);
        frame.commands.push(DrawCommand::Bind(key));
        Ok(())
    }

    fn draw_mesh(&mut self, mesh: MeshId, constants: &ObjectConstants) -> PickResult<()> {
        let uploaded = self.meshes.contains_key(&mesh);
        let frame = self.frame_mut()?;
        match frame.material {
            Some(IdMaterial::PickingId | IdMaterial::SelectionMask) => {}
            Some(material) => {
                return Err(PickError::UnsupportedMaterial {
                    material: material.name(),
                    target: "mesh draws",
                })
            }
            None => return Err(PickError::Backend("mesh drawn before set_material".into())),
        }
        if !uploaded {
            return Err(PickError::Backend(format!("mesh {} is not uploaded", mesh.0)));
        }
        frame.push_mesh(mesh, *constants);
        Ok(())
    }

    fn draw_hud_instances(&mut self, instances: &[HudInstance]) -> PickResult<()> {
        let frame = self.frame_mut()?;
        if frame.material != Some(IdMaterial::HudBillboard) {
            return Err(PickError::MissingMaterial(IdMaterial::HudBillboard.name()));
        }
        if instances.len() > MAX_HUD_INSTANCED_BLOCK {
            return Err(PickError::Backend(format!(
                "{} HUD instances exceed the block size of {MAX_HUD_INSTANCED_BLOCK}",
                instances.len()
            )));
        }
        if !instances.is_empty() {
            frame.push_hud(instances);
        }
        Ok(())
    }

    fn end_pass(&mut self) -> PickResult<()> {
        let recording = self.frame.take().ok_or(PickError::NoActivePass)?;
        self.submit_recording(recording)
    }

    fn blur(&mut self, src: &GpuTarget, dst: &GpuTarget, params: &BlurParams) -> PickResult<()> {
        if self.frame.is_some() {
            return Err(PickError::Backend("blur issued inside a render pass".into()));
        }
        self.encode_blur(src, dst, params)
    }

    fn composite_outline(
        &mut self,
        mask: &GpuTarget,
        blurred: &GpuTarget,
        viewport: &ViewportTarget,
        params: &OutlineParams,
    ) -> PickResult<()> {
        if self.frame.is_some() {
            return Err(PickError::Backend("composite issued inside a render pass".into()));
        }
        self.encode_outline(mask, blurred, viewport, params)
    }

    fn read_pixels(&mut self, target: &GpuTarget, region: PixelRegion) -> PickResult<Vec<[u8; 4]>> {
        self.read_region(target, region)
    }
}
