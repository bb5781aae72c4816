//! Debug dumps of offscreen targets.
//!
//! Picking and mask targets are `Rgba8Unorm`, so texels are written as is.
//! Useful to inspect what the ID pass actually rendered.

use image::{ImageBuffer, Rgba};
use std::path::Path;

use scenepick_core::PixelRegion;

use crate::engine::{GpuTarget, WgpuBackend};
use crate::error::{RenderError, RenderResult};

fn to_image(
    texels: &[[u8; 4]],
    width: u32,
    height: u32,
) -> RenderResult<ImageBuffer<Rgba<u8>, Vec<u8>>> {
    let data: Vec<u8> = texels.iter().flatten().copied().collect();
    // wgpu uses top-left origin, so no vertical flip needed
    ImageBuffer::from_raw(width, height, data).ok_or(RenderError::InvalidImageData)
}

/// Saves RGBA texels to an image file (`.png`, `.jpg`, `.jpeg`).
pub fn save_image(
    path: impl AsRef<Path>,
    texels: &[[u8; 4]],
    width: u32,
    height: u32,
) -> RenderResult<()> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    let img = to_image(texels, width, height)?;
    match extension.as_str() {
        "png" => img.save_with_format(path, image::ImageFormat::Png)?,
        "jpg" | "jpeg" => {
            let rgb_img = image::DynamicImage::ImageRgba8(img).to_rgb8();
            rgb_img.save_with_format(path, image::ImageFormat::Jpeg)?;
        }
        _ => return Err(RenderError::UnsupportedFormat(extension)),
    }
    Ok(())
}

/// Encodes RGBA texels as PNG in memory.
pub fn encode_png(texels: &[[u8; 4]], width: u32, height: u32) -> RenderResult<Vec<u8>> {
    let img = to_image(texels, width, height)?;
    let mut buffer = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buffer, image::ImageFormat::Png)?;
    Ok(buffer.into_inner())
}

impl WgpuBackend {
    /// Reads back a whole target.
    pub fn read_target(&self, target: &GpuTarget) -> RenderResult<Vec<[u8; 4]>> {
        let region = PixelRegion {
            x: 0,
            y: 0,
            width: target.width,
            height: target.height,
        };
        Ok(self.read_region(target, region)?)
    }

    /// Writes a target to an image file.
    pub fn save_target(&self, target: &GpuTarget, path: impl AsRef<Path>) -> RenderResult<()> {
        let path = path.as_ref();
        let texels = self.read_target(target)?;
        save_image(path, &texels, target.width, target.height)?;
        log::info!(
            "saved {}x{} target to {}",
            target.width,
            target.height,
            path.display()
        );
        Ok(())
    }
}
