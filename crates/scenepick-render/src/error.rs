//! Rendering error types.

use scenepick_core::PickError;
use thiserror::Error;

/// Errors that can occur in the wgpu backend.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Failed to create wgpu adapter.
    #[error("failed to create graphics adapter")]
    AdapterCreationFailed,

    /// Failed to create wgpu device.
    #[error("failed to create graphics device: {0}")]
    DeviceCreationFailed(#[from] wgpu::RequestDeviceError),

    /// Mesh data was rejected.
    #[error("invalid mesh: {0}")]
    InvalidMesh(String),

    /// Image encoding error.
    #[error("image encoding error: {0}")]
    ImageError(#[from] image::ImageError),

    /// Unsupported image format for debug dumps.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// Pixel data does not match the image size.
    #[error("invalid image data")]
    InvalidImageData,

    /// Error reported by the picking core.
    #[error(transparent)]
    Pick(#[from] PickError),
}

/// A specialized Result type for rendering operations.
pub type RenderResult<T> = std::result::Result<T, RenderError>;

impl From<RenderError> for PickError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::Pick(inner) => inner,
            other => PickError::Backend(other.to_string()),
        }
    }
}
