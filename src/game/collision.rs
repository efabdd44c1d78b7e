//! Collision Resolution
//!
//! Axis-separated box resolution against static solids. Players and
//! enemies share the same resolver; X is always resolved fully before Y.

use crate::core::fixed::Fixed;
use crate::core::geom::Rect;

/// Movement axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

/// Output of one axis pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AxisResolution {
    /// Box after movement and corrections
    pub rect: Rect,
    /// Velocity component after corrections
    pub velocity: Fixed,
    /// Set only by a downward Y correction this pass
    pub grounded: bool,
}

/// Move `rect` by `velocity` along `axis` and push it out of `solids`.
///
/// X corrections keep the velocity. Y corrections zero it; a downward one
/// also reports `grounded`.
pub fn resolve_axis(rect: Rect, velocity: Fixed, solids: &[Rect], axis: Axis) -> AxisResolution {
    let moved = match axis {
        Axis::X => rect.translated(velocity, 0),
        Axis::Y => rect.translated(0, velocity),
    };
    push_out(moved, velocity, solids, axis)
}

/// Correct an already-moved `rect` against `solids`.
///
/// Solids are visited in slice order and each correction is applied before
/// the next overlap test. The direction of every correction follows the
/// sign of `velocity` on entry, so a zeroed Y velocity still resolves the
/// remaining overlaps the same way.
pub fn push_out(rect: Rect, velocity: Fixed, solids: &[Rect], axis: Axis) -> AxisResolution {
    let mut rect = rect;
    let mut out_velocity = velocity;
    let mut grounded = false;

    for solid in solids {
        if !rect.overlaps(solid) {
            continue;
        }
        match axis {
            Axis::X if velocity > 0 => rect.set_right(solid.left()),
            Axis::X if velocity < 0 => rect.x = solid.right(),
            Axis::Y if velocity > 0 => {
                rect.set_bottom(solid.top());
                out_velocity = 0;
                grounded = true;
            }
            Axis::Y if velocity < 0 => {
                rect.y = solid.bottom();
                out_velocity = 0;
            }
            _ => {}
        }
    }

    AxisResolution {
        rect,
        velocity: out_velocity,
        grounded,
    }
}

/// Whether `rect` overlaps any of `others`.
#[inline]
pub fn overlaps_any(rect: &Rect, others: &[Rect]) -> bool {
    others.iter().any(|other| rect.overlaps(other))
}
