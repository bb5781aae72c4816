//! Scene seam.
//!
//! The scene graph itself belongs to the host editor. Picking only needs a
//! hierarchy it can walk, a world transform, a per-entity visual capability,
//! the entity's own identity color, and its current highlight state. The
//! [`SceneEntity`] trait captures exactly that; [`SceneNode`] is a small
//! reference implementation used by tests and simple hosts.

use std::sync::{Arc, RwLock};

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::camera::Aabb;
use crate::color::ColorKey;

/// Opaque handle to a mesh owned by the render backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MeshId(pub u64);

/// Non-geometric entity kinds drawn as HUD billboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HudKind {
    /// A light source.
    Light,
    /// A camera.
    Camera,
    /// An audio listener.
    AudioListener,
    /// An audio emitter.
    AudioSource,
}

impl HudKind {
    /// All HUD kinds, in tag order.
    pub const ALL: [HudKind; 4] = [
        HudKind::Light,
        HudKind::Camera,
        HudKind::AudioListener,
        HudKind::AudioSource,
    ];

    /// Type tag written into the instance record; the HUD shader picks the
    /// icon shape from it.
    #[must_use]
    pub fn tag(self) -> u32 {
        match self {
            HudKind::Light => 0,
            HudKind::Camera => 1,
            HudKind::AudioListener => 2,
            HudKind::AudioSource => 3,
        }
    }

    /// Display name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            HudKind::Light => "light",
            HudKind::Camera => "camera",
            HudKind::AudioListener => "audio listener",
            HudKind::AudioSource => "audio source",
        }
    }
}

/// What an entity looks like to the picking and selection passes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Visual {
    /// Mesh geometry with local-space bounds.
    Renderable {
        /// Mesh drawn with the ID-encoding material.
        mesh: MeshId,
        /// Bounds in the entity's local space.
        bounds: Aabb,
    },
    /// Icon-only entity drawn as a HUD billboard.
    Hud(HudKind),
}

impl Visual {
    /// Shorthand for a light billboard.
    pub const LIGHT: Visual = Visual::Hud(HudKind::Light);
    /// Shorthand for a camera billboard.
    pub const CAMERA: Visual = Visual::Hud(HudKind::Camera);
    /// Shorthand for an audio listener billboard.
    pub const AUDIO_LISTENER: Visual = Visual::Hud(HudKind::AudioListener);
    /// Shorthand for an audio source billboard.
    pub const AUDIO_SOURCE: Visual = Visual::Hud(HudKind::AudioSource);
}

/// Editor highlight state of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Highlight {
    /// Not highlighted.
    #[default]
    None,
    /// Under the cursor.
    Hovered,
    /// Part of the current selection.
    Selected,
}

/// An entity in the host's scene hierarchy.
///
/// Entities are shared through `Arc`; the picking registry only ever keeps
/// `Weak` references, so destroying an entity needs no notification.
pub trait SceneEntity: Send + Sync + Sized {
    /// Child entities, in container order.
    fn children(&self) -> Vec<Arc<Self>>;

    /// World transform of the entity.
    fn world_transform(&self) -> Mat4;

    /// The entity's visual capability, if it has one.
    fn visual(&self) -> Option<Visual>;

    /// The entity's designated identity color. Must not change over the
    /// entity's lifetime.
    fn pick_color(&self) -> ColorKey;

    /// Current highlight state.
    fn highlight(&self) -> Highlight {
        Highlight::None
    }

    /// Name for diagnostics.
    fn name(&self) -> &str {
        ""
    }
}

/// A minimal thread-safe scene node.
///
/// Transforms are stored world-space; hosts that keep local transforms can
/// implement [`SceneEntity`] on their own type instead.
#[derive(Debug)]
pub struct SceneNode {
    name: String,
    visual: Option<Visual>,
    color: ColorKey,
    transform: RwLock<Mat4>,
    children: RwLock<Vec<Arc<SceneNode>>>,
    highlight: RwLock<Highlight>,
}

impl SceneNode {
    /// Creates a node with identity transform and a freshly allocated color.
    pub fn new(name: impl Into<String>, visual: Option<Visual>) -> Self {
        Self {
            name: name.into(),
            visual,
            color: ColorKey::allocate(),
            transform: RwLock::new(Mat4::IDENTITY),
            children: RwLock::new(Vec::new()),
            highlight: RwLock::new(Highlight::None),
        }
    }

    /// Creates a node without a visual (a grouping node).
    pub fn group(name: impl Into<String>) -> Self {
        Self::new(name, None)
    }

    /// Creates a renderable node.
    pub fn mesh(name: impl Into<String>, mesh: MeshId, bounds: Aabb) -> Self {
        Self::new(name, Some(Visual::Renderable { mesh, bounds }))
    }

    /// Creates a HUD node.
    pub fn hud(name: impl Into<String>, kind: HudKind) -> Self {
        Self::new(name, Some(Visual::Hud(kind)))
    }

    /// Sets the world transform.
    #[must_use]
    pub fn with_transform(self, transform: Mat4) -> Self {
        self.set_transform(transform);
        self
    }

    /// Places the node at a world position.
    #[must_use]
    pub fn at(self, position: Vec3) -> Self {
        self.with_transform(Mat4::from_translation(position))
    }

    /// Overrides the designated color. Intended for tests that need a known
    /// color.
    #[must_use]
    pub fn with_color(mut self, color: ColorKey) -> Self {
        self.color = color;
        self
    }

    /// Wraps the node in an `Arc`.
    #[must_use]
    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Appends a child.
    pub fn add_child(&self, child: Arc<SceneNode>) {
        if let Ok(mut children) = self.children.write() {
            children.push(child);
        }
    }

    /// Removes a child by identity. Returns whether it was present.
    pub fn remove_child(&self, child: &Arc<SceneNode>) -> bool {
        let Ok(mut children) = self.children.write() else {
            return false;
        };
        let before = children.len();
        children.retain(|c| !Arc::ptr_eq(c, child));
        children.len() != before
    }

    /// Sets the world transform.
    pub fn set_transform(&self, transform: Mat4) {
        if let Ok(mut t) = self.transform.write() {
            *t = transform;
        }
    }

    /// Sets the highlight state.
    pub fn set_highlight(&self, highlight: Highlight) {
        if let Ok(mut h) = self.highlight.write() {
            *h = highlight;
        }
    }
}

impl SceneEntity for SceneNode {
    fn children(&self) -> Vec<Arc<Self>> {
        self.children
            .read()
            .map(|c| c.clone())
            .unwrap_or_default()
    }

    fn world_transform(&self) -> Mat4 {
        self.transform
            .read()
            .map_or(Mat4::IDENTITY, |t| *t)
    }

    fn visual(&self) -> Option<Visual> {
        self.visual
    }

    fn pick_color(&self) -> ColorKey {
        self.color
    }

    fn highlight(&self) -> Highlight {
        self.highlight.read().map_or(Highlight::None, |h| *h)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
