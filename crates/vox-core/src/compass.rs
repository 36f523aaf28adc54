//! 32-point compass mapping for positional playback.
//!
//! Game code addresses the soundscape with a compass index (0-31, 11.25°
//! per step) and a scalar distance. The sink wants a listener-relative
//! Cartesian offset; this module converts between the two. There is no
//! elevation component.

use core::f32::consts::TAU;

/// Number of compass points around the listener.
pub const COMPASS_POINTS: u8 = 32;

/// Mask reducing an arbitrary integer angle to a compass index.
pub const COMPASS_MASK: i32 = COMPASS_POINTS as i32 - 1;

/// Convert a compass index and distance to a listener-relative 2D offset.
///
/// Index 0 points along +x, index 8 along +y. Distance is passed through
/// unclamped; range limiting is the sink's distance model, not ours.
pub fn angle_to_offset(angle: u8, distance: f32) -> (f32, f32) {
    let theta = (angle & COMPASS_MASK as u8) as f32 * (TAU / COMPASS_POINTS as f32);
    (distance * libm::cosf(theta), distance * libm::sinf(theta))
}
