//! Error type of the facade.

use scenepick_core::PickError;
use scenepick_render::RenderError;
use thiserror::Error;

/// Errors returned by [`crate::EditorPicking`] setup and debugging helpers.
///
/// Picking and highlighting themselves never fail loudly; they log and
/// return `None`.
#[derive(Error, Debug)]
pub enum ScenepickError {
    /// wgpu device, mesh, or image failure.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// Failure reported by a pass or the backend trait.
    #[error(transparent)]
    Pick(#[from] PickError),

    /// No picking pass has completed yet.
    #[error("no picking target; call compute_picking first")]
    NotComputed,
}

/// A specialized Result type for the facade.
pub type Result<T> = std::result::Result<T, ScenepickError>;
