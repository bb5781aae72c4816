//! Pixel read-back from offscreen targets.

use scenepick_core::{PickError, PickResult, PixelRegion};

use super::textures::GpuTarget;
use super::WgpuBackend;
use crate::buffer::align_to;

/// Bytes per row of a staging copy `width` texels wide.
pub(crate) fn padded_bytes_per_row(width: u32) -> u32 {
    align_to(
        u64::from(width) * 4,
        u64::from(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT),
    ) as u32
}

/// Drops row padding from mapped staging data.
pub(crate) fn unpad_rows(data: &[u8], width: u32, height: u32, padded: u32) -> Vec<[u8; 4]> {
    let row_bytes = width as usize * 4;
    let mut texels = Vec::with_capacity(width as usize * height as usize);
    for row in data.chunks(padded as usize).take(height as usize) {
        texels.extend(
            row[..row_bytes]
                .chunks_exact(4)
                .map(|t| [t[0], t[1], t[2], t[3]]),
        );
    }
    texels
}

impl WgpuBackend {
    /// Copies `region` of `target` to a staging buffer and maps it.
    ///
    /// Blocks until the GPU has finished all submitted work.
    pub(crate) fn read_region(
        &self,
        target: &GpuTarget,
        region: PixelRegion,
    ) -> PickResult<Vec<[u8; 4]>> {
        if region.is_empty() {
            return Ok(Vec::new());
        }
        if !region.fits(target.width, target.height) {
            return Err(PickError::OutOfBounds {
                x: region.x,
                y: region.y,
                width: region.width,
                height: region.height,
                target_width: target.width,
                target_height: target.height,
            });
        }

        let padded = padded_bytes_per_row(region.width);
        let staging_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Pick Staging Buffer"),
            size: u64::from(padded) * u64::from(region.height),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Pick Readback Encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &target.texture,
                mip_level: 0,
                origin: wgpu::Origin3d {
                    x: region.x,
                    y: region.y,
                    z: 0,
                },
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &staging_buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded),
                    rows_per_image: Some(region.height),
                },
            },
            wgpu::Extent3d {
                width: region.width,
                height: region.height,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        let buffer_slice = staging_buffer.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });

        self.device
            .poll(wgpu::PollType::wait_indefinitely())
            .map_err(|e| PickError::ReadbackFailed(e.to_string()))?;
        rx.recv()
            .map_err(|e| PickError::ReadbackFailed(e.to_string()))?
            .map_err(|e| PickError::ReadbackFailed(e.to_string()))?;

        let data = buffer_slice.get_mapped_range();
        let texels = unpad_rows(&data, region.width, region.height, padded);
        drop(data);
        staging_buffer.unmap();

        Ok(texels)
    }
}
