//! Configuration options for picking and selection.

use glam::Vec4;
use serde::{Deserialize, Serialize};

use crate::error::PickResult;
use crate::registry::EVICTION_TTL;
use crate::scene::HudKind;

/// Default squared-distance tolerance of the fallback color match.
pub const DEFAULT_FALLBACK_TOLERANCE: f32 = 1e-3;

/// Options shared by the picking and selection passes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickingOptions {
    /// Seconds an unvisited registry entry survives the post-pick sweep.
    pub eviction_ttl: f64,

    /// Squared RGB distance accepted by the fallback color match.
    pub fallback_tolerance: f32,

    /// Radius of the synthetic culling sphere for HUD entities, before the
    /// per-kind factor.
    pub hud_base_radius: f32,

    /// World-space half size of a HUD billboard.
    pub hud_icon_size: f32,

    /// Per-kind multipliers of `hud_base_radius`.
    pub cull_factors: CullFactors,

    /// Selection outline appearance.
    pub selection: SelectionStyle,
}

impl Default for PickingOptions {
    fn default() -> Self {
        Self {
            eviction_ttl: EVICTION_TTL,
            fallback_tolerance: DEFAULT_FALLBACK_TOLERANCE,
            hud_base_radius: 0.5,
            hud_icon_size: 0.35,
            cull_factors: CullFactors::default(),
            selection: SelectionStyle::default(),
        }
    }
}

impl PickingOptions {
    /// Parses options from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> PickResult<Self> {
        let options: Self = serde_json::from_str(json)?;
        Ok(options.sanitized())
    }

    /// Serializes options to pretty-printed JSON.
    pub fn to_json(&self) -> PickResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Returns a copy with out-of-range values clamped.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        if !self.eviction_ttl.is_finite() || self.eviction_ttl < 0.0 {
            self.eviction_ttl = EVICTION_TTL;
        }
        if !self.fallback_tolerance.is_finite() || self.fallback_tolerance < 0.0 {
            self.fallback_tolerance = DEFAULT_FALLBACK_TOLERANCE;
        }
        self.hud_base_radius = self.hud_base_radius.max(0.0);
        self.hud_icon_size = self.hud_icon_size.max(0.0);
        for kind in HudKind::ALL {
            let factor = self.cull_factors.get(kind);
            if !factor.is_finite() || factor < 0.0 {
                self.cull_factors.set(kind, 1.0);
            }
        }
        self.selection.blur_downsample = self.selection.blur_downsample.clamp(1, 8);
        self.selection.blur_radius = self.selection.blur_radius.max(0.0);
        self.selection.outline_intensity = self.selection.outline_intensity.max(0.0);
        self
    }
}

/// Per-kind cull distance factors for HUD entities.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CullFactors {
    /// Lights.
    pub light: f32,
    /// Cameras.
    pub camera: f32,
    /// Audio listeners.
    pub audio_listener: f32,
    /// Audio sources.
    pub audio_source: f32,
}

impl Default for CullFactors {
    fn default() -> Self {
        Self {
            light: 4.0,
            camera: 4.0,
            audio_listener: 2.0,
            audio_source: 2.0,
        }
    }
}

impl CullFactors {
    /// Factor for a kind.
    #[must_use]
    pub fn get(&self, kind: HudKind) -> f32 {
        match kind {
            HudKind::Light => self.light,
            HudKind::Camera => self.camera,
            HudKind::AudioListener => self.audio_listener,
            HudKind::AudioSource => self.audio_source,
        }
    }

    /// Sets the factor for a kind.
    pub fn set(&mut self, kind: HudKind, factor: f32) {
        match kind {
            HudKind::Light => self.light = factor,
            HudKind::Camera => self.camera = factor,
            HudKind::AudioListener => self.audio_listener = factor,
            HudKind::AudioSource => self.audio_source = factor,
        }
    }
}

/// Colors and blur settings of the selection outline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionStyle {
    /// Color of selected entities.
    pub selected_color: Vec4,
    /// Color of hovered entities.
    pub hovered_color: Vec4,
    /// Multiplier applied to the blurred-minus-sharp mask.
    pub outline_intensity: f32,
    /// Downsampling factor of the blur targets.
    pub blur_downsample: u32,
    /// Blur kernel spacing in texels of the downsampled target.
    pub blur_radius: f32,
}

impl Default for SelectionStyle {
    fn default() -> Self {
        Self {
            selected_color: Vec4::new(1.0, 0.55, 0.0, 1.0),
            hovered_color: Vec4::new(0.3, 0.75, 1.0, 1.0),
            outline_intensity: 4.0,
            blur_downsample: 2,
            blur_radius: 1.0,
        }
    }
}
