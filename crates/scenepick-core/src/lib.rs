//! Core of scenepick: GPU object picking and selection highlighting for a
//! scene editor.
//!
//! This crate is independent of any graphics API:
//! - [`ColorRegistry`] maps identity colors back to weakly held entities
//! - [`Traversal`] walks a [`SceneEntity`] hierarchy with frustum culling
//! - [`PickingPass`] and [`SelectionPass`] drive a [`RenderBackend`]
//! - [`PickingOptions`] holds tunables, loadable from JSON

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]
// Pixel math converts between u32 sizes and f32 coordinates throughout
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

pub mod backend;
pub mod camera;
pub mod color;
pub mod cull;
pub mod error;
pub mod hud;
pub mod options;
pub mod picking;
pub mod registry;
pub mod resolve;
pub mod scene;
pub mod selection;
pub mod surface;
pub mod traverse;

pub use backend::{
    BlurParams, CameraUniforms, IdMaterial, LoadMode, ObjectConstants, OutlineParams,
    PassTarget, PixelRegion, RenderBackend, TargetDescriptor,
};
pub use camera::{Aabb, CameraView, Frustum, Plane};
pub use color::ColorKey;
pub use cull::FrustumCuller;
pub use error::{PickError, PickResult};
pub use hud::{flush_hud_batch, HudInstance, MAX_HUD_INSTANCED_BLOCK};
pub use options::{CullFactors, PickingOptions, SelectionStyle};
pub use picking::{PassStats, PickingPass};
pub use registry::{ColorRegistry, RegistryEntry, EVICTION_TTL};
pub use resolve::PixelResolver;
pub use scene::{Highlight, HudKind, MeshId, SceneEntity, SceneNode, Visual};
pub use selection::{SelectionPass, SelectionStats};
pub use surface::{RenderSurface, SurfaceState};
pub use traverse::{Traversal, TraversalStats, Visit, VisitAction};

// Re-export glam types for convenience
pub use glam::{Mat4, Vec2, Vec3, Vec4};
