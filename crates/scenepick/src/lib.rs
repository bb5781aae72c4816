//! scenepick: GPU object picking and selection highlighting for scene
//! editors.
//!
//! The scene is rendered into an offscreen target where every entity is
//! drawn in its own flat color. Reading a pixel back and looking the color up
//! in a registry tells which entity is under the cursor. A second pass draws
//! blurred outlines around selected and hovered meshes and tinted icons for
//! lights, cameras and audio objects.
//!
//! # Quick Start
//!
//! ```no_run
//! use scenepick::*;
//!
//! fn main() -> Result<()> {
//!     init_logging();
//!     let mut picking = EditorPicking::<SceneNode>::headless(PickingOptions::default())?;
//!
//!     let positions = [Vec3::ZERO, Vec3::X, Vec3::Y];
//!     let root = SceneNode::group("root").into_shared();
//!     root.add_child(picking.mesh_node("triangle", &positions, &[0, 1, 2])?.into_shared());
//!
//!     let camera = CameraView::look_at_perspective(
//!         Vec3::new(0.0, 0.0, 5.0),
//!         Vec3::ZERO,
//!         60.0_f32.to_radians(),
//!         0.1,
//!         100.0,
//!         800,
//!         600,
//!     );
//!     picking.compute_picking(&camera, 800, 600, &root);
//!     if let Some(entity) = picking.get_entity_at(400, 300) {
//!         println!("picked {}", entity.name());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Crates
//!
//! - `scenepick-core`: registry, culling, traversal, and the passes over the
//!   [`RenderBackend`] trait
//! - `scenepick-render`: the wgpu [`WgpuBackend`]

#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

mod editor;
mod error;
mod init;

pub use editor::EditorPicking;
pub use error::{Result, ScenepickError};
pub use init::init_logging;

// Re-export core types
pub use scenepick_core::{
    Aabb, CameraView, ColorKey, ColorRegistry, CullFactors, Highlight, HudKind, IdMaterial,
    MeshId, PassStats, PickError, PickingOptions, PickingPass, RenderBackend, SceneEntity,
    SceneNode, SelectionPass, SelectionStats, SelectionStyle, TargetDescriptor, Visual,
    MAX_HUD_INSTANCED_BLOCK,
};

// Re-export render types
pub use scenepick_render::{GpuTarget, RenderError, ViewportTarget, WgpuBackend};

pub use glam::{Mat4, Vec2, Vec3, Vec4};
