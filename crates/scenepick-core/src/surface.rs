//! Lazily sized offscreen targets.

use crate::backend::{RenderBackend, TargetDescriptor};
use crate::error::{PickError, PickResult};

/// Whether a surface matches the requested size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceState {
    /// No target, or a target of a different size.
    Stale,
    /// A target of the requested size exists.
    Fresh,
}

/// An offscreen target owned by a single pass, recreated whenever the
/// requested size changes.
#[derive(Debug)]
pub struct RenderSurface<T> {
    label: &'static str,
    depth: bool,
    width: u32,
    height: u32,
    target: Option<T>,
}

impl<T> RenderSurface<T> {
    /// Creates an empty surface.
    pub fn new(label: &'static str, depth: bool) -> Self {
        Self {
            label,
            depth,
            width: 0,
            height: 0,
            target: None,
        }
    }

    /// State relative to a requested size.
    pub fn state(&self, width: u32, height: u32) -> SurfaceState {
        if self.target.is_some() && self.width == width && self.height == height {
            SurfaceState::Fresh
        } else {
            SurfaceState::Stale
        }
    }

    /// Returns the target, (re)creating it first if it is stale.
    ///
    /// On failure the surface is left empty.
    pub fn ensure<B>(&mut self, backend: &mut B, width: u32, height: u32) -> PickResult<&T>
    where
        B: RenderBackend<Target = T>,
    {
        if self.state(width, height) == SurfaceState::Stale {
            self.release();
            if width == 0 || height == 0 {
                return Err(PickError::EmptyTarget { width, height });
            }
            let target = backend.create_target(&TargetDescriptor {
                label: self.label,
                width,
                height,
                depth: self.depth,
            })?;
            log::debug!("created {} target {}x{}", self.label, width, height);
            self.width = width;
            self.height = height;
            self.target = Some(target);
        }
        self.target
            .as_ref()
            .ok_or(PickError::EmptyTarget { width, height })
    }

    /// The current target, if any.
    pub fn target(&self) -> Option<&T> {
        self.target.as_ref()
    }

    /// Size of the current target, if any.
    pub fn size(&self) -> Option<(u32, u32)> {
        self.target.as_ref().map(|_| (self.width, self.height))
    }

    /// Drops the target.
    pub fn release(&mut self) {
        self.target = None;
        self.width = 0;
        self.height = 0;
    }
}
