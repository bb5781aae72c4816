//! Bind group layouts and lazily built ID-material pipelines.

use std::num::NonZeroU64;

use scenepick_core::{
    CameraUniforms, HudInstance, IdMaterial, ObjectConstants, PickError, PickResult,
    MAX_HUD_INSTANCED_BLOCK,
};

use super::textures::DEPTH_FORMAT;
use super::WgpuBackend;
use crate::mesh::MeshVertex;

/// Byte size of one HUD instance block.
pub const HUD_BLOCK_SIZE: u64 =
    (std::mem::size_of::<HudInstance>() * MAX_HUD_INSTANCED_BLOCK) as u64;

/// Identifies a pipeline variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineKey {
    pub material: IdMaterial,
    pub format: wgpu::TextureFormat,
    pub depth: bool,
}

/// Layouts shared by every ID pipeline.
pub(crate) struct IdLayouts {
    /// Group 0: camera uniforms.
    pub camera: wgpu::BindGroupLayout,
    /// Group 1 for meshes: one [`ObjectConstants`] slot, dynamic offset.
    pub object: wgpu::BindGroupLayout,
    /// Group 1 for HUD: one instance block, dynamic offset.
    pub hud: wgpu::BindGroupLayout,
}

fn uniform_layout(
    device: &wgpu::Device,
    label: &str,
    size: u64,
    dynamic: bool,
) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: dynamic,
                min_binding_size: NonZeroU64::new(size),
            },
            count: None,
        }],
    })
}

impl IdLayouts {
    pub fn new(device: &wgpu::Device) -> Self {
        Self {
            camera: uniform_layout(
                device,
                "camera bind group layout",
                std::mem::size_of::<CameraUniforms>() as u64,
                false,
            ),
            object: uniform_layout(
                device,
                "object bind group layout",
                std::mem::size_of::<ObjectConstants>() as u64,
                true,
            ),
            hud: uniform_layout(device, "hud block bind group layout", HUD_BLOCK_SIZE, true),
        }
    }
}

/// Checks that `material` can render into a target with the given depth.
pub(crate) fn check_material(material: IdMaterial, depth: bool) -> PickResult<()> {
    match (material, depth) {
        (IdMaterial::PickingId, false) => Err(PickError::UnsupportedMaterial {
            material: material.name(),
            target: "a target without depth",
        }),
        (IdMaterial::SelectionMask, true) => Err(PickError::UnsupportedMaterial {
            material: material.name(),
            target: "a target with depth",
        }),
        _ => Ok(()),
    }
}

impl WgpuBackend {
    /// Builds the pipeline for `key` unless it is cached.
    pub(crate) fn ensure_pipeline(&mut self, key: PipelineKey) -> PickResult<()> {
        if self.pipelines.contains_key(&key) {
            return Ok(());
        }
        let pipeline = self.build_pipeline(key)?;
        log::debug!(
            "built {} pipeline for {:?} (depth: {})",
            key.material.name(),
            key.format,
            key.depth
        );
        self.pipelines.insert(key, pipeline);
        Ok(())
    }

    fn build_pipeline(&self, key: PipelineKey) -> PickResult<wgpu::RenderPipeline> {
        let (source, group1, label) = match key.material {
            IdMaterial::PickingId | IdMaterial::SelectionMask => (
                include_str!("../shaders/id.wgsl"),
                &self.layouts.object,
                key.material.name(),
            ),
            IdMaterial::HudBillboard => (
                include_str!("../shaders/hud.wgsl"),
                &self.layouts.hud,
                key.material.name(),
            ),
        };

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let shader = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            });

        let pipeline_layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(label),
                bind_group_layouts: &[&self.layouts.camera, group1],
                push_constant_ranges: &[],
            });

        let vertex_buffers = match key.material {
            IdMaterial::HudBillboard => Vec::new(),
            _ => vec![MeshVertex::layout()],
        };

        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &vertex_buffers,
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: key.format,
                        // Identity colors must reach the target unmodified
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: key.depth.then_some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            });

        match pollster::block_on(self.device.pop_error_scope()) {
            Some(error) => {
                log::error!("{label} pipeline rejected: {error}");
                Err(PickError::MissingMaterial(key.material.name()))
            }
            None => Ok(pipeline),
        }
    }
}
