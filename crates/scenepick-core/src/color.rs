//! Identity colors.
//!
//! Every pickable entity owns a designated color. The picking pass renders the
//! entity with that flat color, and a read-back pixel is quantized back into a
//! [`ColorKey`] to find the entity again.
//!
//! Designated colors come from a monotonic serial number. The serial is mixed
//! with an odd multiplier modulo 2^18 and split into three 6-bit channel
//! values, each placed at `4 * v + 2`. Consequences:
//! - consecutive entities get unrelated colors
//! - any two designated colors differ by at least 4 steps in some channel,
//!   so a texel drifted by one step never equals another entity's key
//! - colors too close to black are skipped so drift cannot make an entity
//!   look like background
//!
//! A is always 255 for entities. The all-zero key is the cleared background.

use std::sync::atomic::{AtomicU32, Ordering};

use glam::Vec4;
use serde::{Deserialize, Serialize};

use crate::options::DEFAULT_FALLBACK_TOLERANCE;

/// Largest index that fits in the 24-bit RGB encoding.
pub const MAX_COLOR_INDEX: u32 = 0x00FF_FFFF;

/// Number of distinct designated colors before serials wrap.
pub const DESIGNATED_COLORS: u32 = 1 << 18;

const SERIAL_MASK: u32 = DESIGNATED_COLORS - 1;
const SERIAL_MIX: u32 = 0x0001_9E37;

/// Squared RGB distance from black below which a designated color is skipped.
/// Twice the default fallback radius.
const MIN_BACKGROUND_DISTANCE: f32 = 4.0 * DEFAULT_FALLBACK_TOLERANCE;

/// Next serial handed out by [`ColorKey::allocate`].
static NEXT_SERIAL: AtomicU32 = AtomicU32::new(1);

/// A packed 32-bit RGBA color used as an identity key.
///
/// The packing matches the byte order of an `Rgba8Unorm` texel read as a
/// little-endian `u32`, so `ColorKey::from_rgba8(texel)` is a plain cast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct ColorKey(pub u32);

impl ColorKey {
    /// The background key (transparent black).
    pub const NONE: ColorKey = ColorKey(0);

    /// Allocates a fresh identity color from the process-wide counter.
    ///
    /// Serials that map to near-black colors are skipped. Colors stay
    /// distinct for the first [`DESIGNATED_COLORS`] allocations of a session.
    pub fn allocate() -> Self {
        loop {
            let serial = NEXT_SERIAL.fetch_add(1, Ordering::Relaxed) & SERIAL_MASK;
            let key = Self::designated(serial);
            if key.is_clear_of_background() {
                return key;
            }
        }
    }

    /// The designated color of a serial number. Injective on
    /// `0..DESIGNATED_COLORS`.
    #[must_use]
    pub fn designated(serial: u32) -> Self {
        let mixed = serial.wrapping_mul(SERIAL_MIX) & SERIAL_MASK;
        let channel = |shift: u32| ((mixed >> shift) & 0x3F) as u8 * 4 + 2;
        Self::from_rgba8([channel(0), channel(6), channel(12), 255])
    }

    /// Whether this color is far enough from black to survive drift without
    /// reading as background.
    #[must_use]
    pub fn is_clear_of_background(self) -> bool {
        color_distance_squared(self.to_vec4(), Vec4::ZERO) > MIN_BACKGROUND_DISTANCE
    }

    /// Encodes an index into an opaque identity color.
    #[must_use]
    pub fn from_index(index: u32) -> Self {
        Self((index & MAX_COLOR_INDEX) | 0xFF00_0000)
    }

    /// Decodes the 24-bit index of this color.
    #[must_use]
    pub fn index(self) -> u32 {
        self.0 & MAX_COLOR_INDEX
    }

    /// Packs four 8-bit channels.
    #[must_use]
    pub fn from_rgba8(rgba: [u8; 4]) -> Self {
        Self(u32::from_le_bytes(rgba))
    }

    /// Unpacks into four 8-bit channels.
    #[must_use]
    pub fn to_rgba8(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }

    /// Quantizes a normalized float color into a key.
    ///
    /// Channels are clamped to `[0, 1]` and rounded to the nearest 8-bit value.
    #[must_use]
    pub fn quantize(color: Vec4) -> Self {
        let c = color.clamp(Vec4::ZERO, Vec4::ONE) * 255.0;
        Self::from_rgba8([
            c.x.round() as u8,
            c.y.round() as u8,
            c.z.round() as u8,
            c.w.round() as u8,
        ])
    }

    /// Returns the normalized float color.
    #[must_use]
    pub fn to_vec4(self) -> Vec4 {
        let [r, g, b, a] = self.to_rgba8();
        Vec4::new(
            f32::from(r),
            f32::from(g),
            f32::from(b),
            f32::from(a),
        ) / 255.0
    }

    /// Returns true for the cleared background.
    #[must_use]
    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

/// Converts raw texel bytes into a normalized color.
#[must_use]
pub fn texel_to_color(texel: [u8; 4]) -> Vec4 {
    ColorKey::from_rgba8(texel).to_vec4()
}

/// Squared RGB distance between two colors.
///
/// Alpha is ignored: identity colors are always opaque and the background is
/// always cleared to zero, so the RGB channels carry all of the identity.
#[must_use]
pub fn color_distance_squared(a: Vec4, b: Vec4) -> f32 {
    a.truncate().distance_squared(b.truncate())
}
