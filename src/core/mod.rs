//! Core deterministic primitives.
//!
//! Fixed-point numbers, pixel-space geometry and state hashing. Nothing in
//! here knows about tiles, actors or sessions.

pub mod fixed;
pub mod geom;
pub mod hash;

// Re-export core types
pub use fixed::{Fixed, FIXED_ONE, FIXED_HALF, FIXED_SCALE};
pub use geom::{Point, Rect};
pub use hash::{StateHash, compute_state_hash};
