//! Submission of the blur and outline post-processing passes.

use scenepick_core::{BlurParams, OutlineParams, PickError, PickResult};

use super::textures::{GpuTarget, ViewportTarget};
use super::WgpuBackend;

impl WgpuBackend {
    /// Runs one blur direction and submits it.
    pub(crate) fn encode_blur(
        &mut self,
        src: &GpuTarget,
        dst: &GpuTarget,
        params: &BlurParams,
    ) -> PickResult<()> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Blur Encoder"),
            });
        self.outline
            .blur(&self.device, &mut encoder, &src.view, &dst.view, params);
        self.queue.submit(std::iter::once(encoder.finish()));
        self.pop_scope("blur")
    }

    /// Composites the outline onto the viewport and submits it.
    pub(crate) fn encode_outline(
        &mut self,
        mask: &GpuTarget,
        blurred: &GpuTarget,
        viewport: &ViewportTarget,
        params: &OutlineParams,
    ) -> PickResult<()> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Outline Encoder"),
            });
        self.outline.composite(
            &self.device,
            &mut encoder,
            &mask.view,
            &blurred.view,
            &viewport.view,
            viewport.format,
            params,
        );
        self.queue.submit(std::iter::once(encoder.finish()));
        self.pop_scope("outline")
    }

    fn pop_scope(&self, label: &str) -> PickResult<()> {
        match pollster::block_on(self.device.pop_error_scope()) {
            Some(error) => Err(PickError::Backend(format!("{label}: {error}"))),
            None => Ok(()),
        }
    }
}
