//! Pass recording and replay.
//!
//! Draws between `begin_pass` and `end_pass` are recorded rather than
//! encoded, so all per-draw uniforms can be uploaded in one write before the
//! render pass borrows the buffers.

use scenepick_core::{
    CameraUniforms, HudInstance, IdMaterial, LoadMode, MeshId, ObjectConstants, PickError,
    PickResult,
};

use super::pipelines::PipelineKey;
use super::WgpuBackend;

/// One recorded draw-stream entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum DrawCommand {
    Bind(PipelineKey),
    Mesh { mesh: MeshId, slot: usize },
    Hud { block: usize, count: u32 },
}

/// Everything needed to encode one render pass.
pub(crate) struct PassRecording {
    pub label: &'static str,
    pub color: wgpu::TextureView,
    pub depth: Option<wgpu::TextureView>,
    pub format: wgpu::TextureFormat,
    pub camera: CameraUniforms,
    pub load: LoadMode,
    pub material: Option<IdMaterial>,
    pub commands: Vec<DrawCommand>,
    pub objects: Vec<ObjectConstants>,
    pub hud_blocks: Vec<Vec<HudInstance>>,
}

impl PassRecording {
    pub fn new(
        label: &'static str,
        color: wgpu::TextureView,
        depth: Option<wgpu::TextureView>,
        format: wgpu::TextureFormat,
        camera: CameraUniforms,
        load: LoadMode,
    ) -> Self {
        Self {
            label,
            color,
            depth,
            format,
            camera,
            load,
            material: None,
            commands: Vec::new(),
            objects: Vec::new(),
            hud_blocks: Vec::new(),
        }
    }

    /// Pipeline key for `material` on this pass's attachments.
    pub fn key(&self, material: IdMaterial) -> PipelineKey {
        PipelineKey {
            material,
            format: self.format,
            depth: self.depth.is_some(),
        }
    }

    pub fn push_mesh(&mut self, mesh: MeshId, constants: ObjectConstants) {
        let slot = self.objects.len();
        self.objects.push(constants);
        self.commands.push(DrawCommand::Mesh { mesh, slot });
    }

    pub fn push_hud(&mut self, instances: &[HudInstance]) {
        let block = self.hud_blocks.len();
        self.hud_blocks.push(instances.to_vec());
        self.commands.push(DrawCommand::Hud {
            block,
            count: instances.len() as u32,
        });
    }
}

/// Color and depth load operations for a pass.
fn load_ops(load: LoadMode) -> (wgpu::LoadOp<wgpu::Color>, wgpu::LoadOp<f32>) {
    match load {
        LoadMode::Clear(c) => (
            wgpu::LoadOp::Clear(wgpu::Color {
                r: f64::from(c.x),
                g: f64::from(c.y),
                b: f64::from(c.z),
                a: f64::from(c.w),
            }),
            wgpu::LoadOp::Clear(1.0),
        ),
        LoadMode::Load => (wgpu::LoadOp::Load, wgpu::LoadOp::Load),
    }
}

impl WgpuBackend {
    /// Uploads a recording's uniforms, encodes it, and submits.
    pub(crate) fn submit_recording(&mut self, recording: PassRecording) -> PickResult<()> {
        self.queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::bytes_of(&recording.camera),
        );
        let object_slots: Vec<&[u8]> = recording.objects.iter().map(bytemuck::bytes_of).collect();
        self.objects
            .upload(&self.device, &self.queue, &self.layouts.object, &object_slots);
        let hud_slots: Vec<&[u8]> = recording
            .hud_blocks
            .iter()
            .map(|block| bytemuck::cast_slice(block.as_slice()))
            .collect();
        self.hud_blocks
            .upload(&self.device, &self.queue, &self.layouts.hud, &hud_slots);

        let missing = recording.commands.iter().find_map(|command| match command {
            DrawCommand::Bind(key) if !self.pipelines.contains_key(key) => Some(key.material),
            _ => None,
        });
        if let Some(material) = missing {
            return Err(PickError::MissingMaterial(material.name()));
        }

        let (color_load, depth_load) = load_ops(recording.load);

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some(recording.label),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(recording.label),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &recording.color,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: color_load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: recording.depth.as_ref().map(|view| {
                    wgpu::RenderPassDepthStencilAttachment {
                        view,
                        depth_ops: Some(wgpu::Operations {
                            load: depth_load,
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }
                }),
                ..Default::default()
            });
            render_pass.set_bind_group(0, &self.camera_bind_group, &[]);

            for command in &recording.commands {
                match command {
                    DrawCommand::Bind(key) => {
                        if let Some(pipeline) = self.pipelines.get(key) {
                            render_pass.set_pipeline(pipeline);
                        }
                    }
                    DrawCommand::Mesh { mesh, slot } => {
                        // Presence was checked when the draw was recorded
                        let Some(gpu) = self.meshes.get(mesh) else {
                            continue;
                        };
                        render_pass.set_bind_group(
                            1,
                            self.objects.bind_group(),
                            &[self.objects.offset(*slot)],
                        );
                        render_pass.set_vertex_buffer(0, gpu.vertex_buffer.slice(..));
                        render_pass.set_index_buffer(
                            gpu.index_buffer.slice(..),
                            wgpu::IndexFormat::Uint32,
                        );
                        render_pass.draw_indexed(0..gpu.index_count, 0, 0..1);
                    }
                    DrawCommand::Hud { block, count } => {
                        render_pass.set_bind_group(
                            1,
                            self.hud_blocks.bind_group(),
                            &[self.hud_blocks.offset(*block)],
                        );
                        // Six vertices per quad, one instance per icon
                        render_pass.draw(0..6, 0..*count);
                    }
                }
            }
        }
        self.queue.submit(std::iter::once(encoder.finish()));

        match pollster::block_on(self.device.pop_error_scope()) {
            Some(error) => Err(PickError::Backend(format!("{}: {error}", recording.label))),
            None => Ok(()),
        }
    }
}
