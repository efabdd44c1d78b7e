//! Q16.16 Fixed-Point Arithmetic
//!
//! Deterministic fixed-point math for the platformer simulation.
//! Every pixel coordinate, velocity and acceleration inside a tick is a
//! `Fixed`; floats only show up when building render snapshots.
//!
//! ## Format: Q16.16
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Bit Layout: Q16.16 (32-bit signed integer)                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │  [S][IIIIIIIIIIIIIIII][FFFFFFFFFFFFFFFF]                    │
//! │   │  └──── 16 bits ────┘└──── 16 bits ────┘                 │
//! │   └─ Sign bit                                               │
//! │                                                             │
//! │  Range: -32768.0 to +32767.99998 px                         │
//! │  Precision: 1/65536 px                                      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! A level must fit inside the positive range, which caps a 32 px tile
//! grid at roughly 1000 columns. The parser rejects anything larger.

/// Q16.16 fixed-point number stored as i32.
/// 16 bits integer, 16 bits fractional.
pub type Fixed = i32;

/// Number of fractional bits (16)
pub const FIXED_SCALE: i32 = 16;

/// 1.0 in fixed-point (65536)
pub const FIXED_ONE: Fixed = 1 << FIXED_SCALE;

/// 0.5 in fixed-point (32768)
pub const FIXED_HALF: Fixed = FIXED_ONE >> 1;

/// Largest whole pixel value representable as `Fixed`.
pub const MAX_PIXEL: i64 = (i32::MAX >> FIXED_SCALE) as i64;

/// Pixels kept free past the right and bottom edges of the largest level,
/// for the kill plane and for actors that leave the grid.
pub const LEVEL_HEADROOM: i64 = 1024;

// =============================================================================
// PHYSICS CONSTANTS (per tick, at 60 Hz)
// =============================================================================

/// Horizontal run speed: 4 px/tick
pub const RUN_SPEED: Fixed = 4 * FIXED_ONE;

/// Jump impulse: -13 px/tick (negative is up)
pub const JUMP_IMPULSE: Fixed = -13 * FIXED_ONE;

/// Gravity: 0.6 px/tick² = floor(0.6 * 65536)
pub const GRAVITY: Fixed = 39321;

/// Terminal fall speed: 20 px/tick
pub const TERMINAL_FALL_SPEED: Fixed = 20 * FIXED_ONE;

/// Knockback impulse after a non-forced hit: -8 px/tick
pub const KNOCKBACK_IMPULSE: Fixed = -8 * FIXED_ONE;

/// Bounce impulse after stomping an enemy: -8 px/tick
pub const STOMP_BOUNCE: Fixed = -8 * FIXED_ONE;

/// Patrol enemy speed: 1 px/tick
pub const PATROL_SPEED: Fixed = FIXED_ONE;

// =============================================================================
// CONVERSIONS
// =============================================================================

/// Convert a compile-time float to fixed-point.
///
/// # Warning
/// Only use at compile-time or initialization. NEVER in tick loop.
///
/// # Example
/// ```
/// use tilestep::core::fixed::{to_fixed, FIXED_ONE};
/// const MY_VALUE: i32 = to_fixed(2.5);
/// assert_eq!(MY_VALUE, FIXED_ONE * 2 + FIXED_ONE / 2);
/// ```
#[inline]
pub const fn to_fixed(f: f64) -> Fixed {
    (f * (FIXED_ONE as f64)) as Fixed
}

/// Convert whole pixels to fixed-point.
#[inline]
pub const fn from_int(px: i32) -> Fixed {
    px << FIXED_SCALE
}

/// Whole-pixel part of a fixed-point value (floors toward negative infinity).
#[inline]
pub const fn to_int(f: Fixed) -> i32 {
    f >> FIXED_SCALE
}

/// Convert fixed-point to float for display/rendering.
///
/// # Warning
/// Only use for visual output. NEVER use result in game logic.
#[inline]
pub fn to_float(f: Fixed) -> f32 {
    f as f32 / FIXED_ONE as f32
}

/// Halve a fixed-point value, truncating toward zero.
#[inline]
pub const fn fixed_half(f: Fixed) -> Fixed {
    f / 2
}

/// Add with saturation so a runaway value can never wrap sign.
#[inline]
pub fn fixed_add(a: Fixed, b: Fixed) -> Fixed {
    a.saturating_add(b)
}

/// Clamp a fixed-point number to a range.
#[inline]
pub fn fixed_clamp(value: Fixed, min: Fixed, max: Fixed) -> Fixed {
    value.max(min).min(max)
}

// =============================================================================
// TESTS
// =============================================================================
