//! Color registry mapping identity colors back to scene entities.
//!
//! Entries hold only `Weak` references. A destroyed entity simply stops
//! resolving; its entry lingers until the eviction sweep drops it.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use glam::Vec4;

use crate::color::{color_distance_squared, ColorKey};
use crate::scene::SceneEntity;

/// Default time-to-live for registry entries, in seconds.
pub const EVICTION_TTL: f64 = 10.0;

/// Identity of an entity: the address of its shared allocation.
///
/// The registry keeps a `Weak` to every entity it tracks, which keeps the
/// allocation (not the value) alive, so the address cannot be reused by a
/// different entity while the entry exists.
type EntityAddress = usize;

fn address_of<E>(entity: &Arc<E>) -> EntityAddress {
    Arc::as_ptr(entity).cast::<()>() as usize
}

/// One registered entity.
#[derive(Debug)]
pub struct RegistryEntry<E> {
    /// The entity's identity color.
    pub color: ColorKey,
    /// Non-owning reference to the entity.
    pub entity: Weak<E>,
    /// Last time the entity was visited, in seconds.
    pub last_used: f64,
}

impl<E> RegistryEntry<E> {
    /// Whether the entity still exists.
    pub fn is_live(&self) -> bool {
        self.entity.strong_count() > 0
    }
}

/// Maps identity colors to weakly held entities.
#[derive(Debug)]
pub struct ColorRegistry<E> {
    by_color: HashMap<ColorKey, RegistryEntry<E>>,
    by_entity: HashMap<EntityAddress, ColorKey>,
}

impl<E> Default for ColorRegistry<E> {
    fn default() -> Self {
        Self {
            by_color: HashMap::new(),
            by_entity: HashMap::new(),
        }
    }
}

impl<E: SceneEntity> ColorRegistry<E> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the entity's color, registering it on first encounter.
    ///
    /// Always refreshes the entry's last-used time.
    pub fn get_or_assign_color(&mut self, entity: &Arc<E>, now: f64) -> ColorKey {
        let address = address_of(entity);
        if let Some(&color) = self.by_entity.get(&address) {
            if let Some(entry) = self.by_color.get_mut(&color) {
                entry.last_used = now;
                return color;
            }
        }

        let color = entity.pick_color();
        if let Some(previous) = self.by_color.get(&color) {
            // Two entities designated the same color. The newer one wins.
            log::debug!(
                "color {:#010x} reassigned from a {} entity to '{}'",
                color.0,
                if previous.is_live() { "live" } else { "dead" },
                entity.name()
            );
            self.by_entity.retain(|_, c| *c != color);
        }
        self.by_color.insert(
            color,
            RegistryEntry {
                color,
                entity: Arc::downgrade(entity),
                last_used: now,
            },
        );
        self.by_entity.insert(address, color);
        color
    }

    /// Exact lookup. Returns `None` if the color is unknown or the entity
    /// was destroyed.
    pub fn resolve(&self, color: ColorKey) -> Option<Arc<E>> {
        self.by_color.get(&color)?.entity.upgrade()
    }

    /// Linear scan for the live entity whose designated color is closest to
    /// `color`, within `tolerance` squared RGB distance.
    ///
    /// When several entities are within tolerance the closest one wins, not
    /// the first one scanned. Equal distances go to the smaller key, so the
    /// result does not depend on map iteration order.
    pub fn find_nearest(&self, color: Vec4, tolerance: f32) -> Option<Arc<E>> {
        let mut best: Option<(f32, ColorKey, Arc<E>)> = None;
        for (&key, entry) in &self.by_color {
            let Some(entity) = entry.entity.upgrade() else {
                continue;
            };
            let distance = color_distance_squared(key.to_vec4(), color);
            if distance > tolerance {
                continue;
            }
            let is_better = best
                .as_ref()
                .is_none_or(|(d, k, _)| distance < *d || (distance == *d && key < *k));
            if is_better {
                best = Some((distance, key, entity));
            }
        }
        best.map(|(_, _, entity)| entity)
    }

    /// Removes entries unused for longer than `ttl` seconds.
    ///
    /// Returns the number of entries removed.
    pub fn sweep(&mut self, now: f64, ttl: f64) -> usize {
        self.retain(|entry| now - entry.last_used <= ttl)
    }

    /// Removes entries whose entity has been destroyed.
    pub fn retain_live(&mut self) -> usize {
        self.retain(RegistryEntry::is_live)
    }

    fn retain(&mut self, mut keep: impl FnMut(&RegistryEntry<E>) -> bool) -> usize {
        let before = self.by_color.len();
        self.by_color.retain(|_, entry| keep(entry));
        let by_color = &self.by_color;
        self.by_entity.retain(|_, color| by_color.contains_key(color));
        before - self.by_color.len()
    }

    /// Whether the entity has an entry.
    pub fn contains(&self, entity: &Arc<E>) -> bool {
        self.by_entity.contains_key(&address_of(entity))
    }

    /// The entry for a color, if any.
    pub fn entry(&self, color: ColorKey) -> Option<&RegistryEntry<E>> {
        self.by_color.get(&color)
    }

    /// Number of entries, live or not.
    pub fn len(&self) -> usize {
        self.by_color.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.by_color.is_empty()
    }

    /// Removes all entries.
    pub fn clear(&mut self) {
        self.by_color.clear();
        self.by_entity.clear();
    }
}
