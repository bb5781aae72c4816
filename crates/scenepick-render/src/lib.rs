//! wgpu backend for scenepick.
//!
//! [`WgpuBackend`] implements [`scenepick_core::RenderBackend`]:
//! - ID-encoding and HUD billboard pipelines, built lazily per target format
//! - Separable blur and outline composite for the selection highlight
//! - Pixel read-back from offscreen targets
//! - Mesh storage keyed by [`scenepick_core::MeshId`]

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
// GPU byte sizes and offsets move between usize, u64 and u32
#![allow(clippy::cast_possible_truncation)]

pub mod buffer;
pub mod engine;
pub mod error;
pub mod mesh;
pub mod outline_pass;
pub mod snapshot;

pub use engine::{GpuTarget, ViewportTarget, WgpuBackend, DEPTH_FORMAT, TARGET_FORMAT};
pub use error::{RenderError, RenderResult};
pub use mesh::{GpuMesh, MeshVertex};
pub use outline_pass::OutlinePass;
pub use snapshot::{encode_png, save_image};
