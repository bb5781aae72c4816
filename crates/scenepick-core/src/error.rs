//! Error types for scenepick.

use thiserror::Error;

/// The main error type for picking and selection operations.
///
/// Errors never cross the public pass API: passes log them and skip the
/// frame. They surface only from backend implementations and option loading.
#[derive(Error, Debug)]
pub enum PickError {
    /// A render target could not be created.
    #[error("render target creation failed ({width}x{height}): {reason}")]
    TargetCreationFailed {
        width: u32,
        height: u32,
        reason: String,
    },

    /// Requested target size has a zero dimension.
    #[error("render target size must be non-zero, got {width}x{height}")]
    EmptyTarget { width: u32, height: u32 },

    /// A material/pipeline needed by the pass is not available.
    #[error("material '{0}' is not available")]
    MissingMaterial(&'static str),

    /// The material cannot be used with the requested pass target.
    #[error("material '{material}' cannot render into {target}")]
    UnsupportedMaterial {
        material: &'static str,
        target: &'static str,
    },

    /// A draw was issued outside of `begin_pass`/`end_pass`.
    #[error("no render pass is active")]
    NoActivePass,

    /// Pixel read-back failed.
    #[error("pixel read-back failed: {0}")]
    ReadbackFailed(String),

    /// Read-back region is outside the target.
    #[error("read region ({x}, {y}) {width}x{height} is outside the {target_width}x{target_height} target")]
    OutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        target_width: u32,
        target_height: u32,
    },

    /// Generic backend failure.
    #[error("backend error: {0}")]
    Backend(String),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// A specialized Result type for picking operations.
pub type PickResult<T> = std::result::Result<T, PickError>;
