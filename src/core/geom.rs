//! Fixed-Point Geometry
//!
//! Axis-aligned rectangles and points in pixel space. Y grows downward,
//! matching tile-grid row order.

use std::fmt;
use serde::{Serialize, Deserialize};

use super::fixed::{Fixed, from_int, fixed_half, to_float};

/// A point in pixel space.
///
/// Ordered by `(x, y)` so sets of points iterate deterministically.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate (Q16.16)
    pub x: Fixed,
    /// Y coordinate (Q16.16)
    pub y: Fixed,
}

impl Point {
    /// Create from fixed-point components.
    #[inline]
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    /// Create from whole pixels.
    #[inline]
    pub const fn from_ints(x: i32, y: i32) -> Self {
        Self { x: from_int(x), y: from_int(y) }
    }

    /// Convert to floats for display.
    pub fn to_floats(self) -> (f32, f32) {
        (to_float(self.x), to_float(self.y))
    }
}

impl fmt::Debug for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (x, y) = self.to_floats();
        write!(f, "Point({:.2}, {:.2})", x, y)
    }
}

/// Axis-aligned box `{x, y, w, h}` in pixel space.
///
/// Used for every solid, hazard and trigger region, and for actor bodies.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge
    pub x: Fixed,
    /// Top edge
    pub y: Fixed,
    /// Width
    pub w: Fixed,
    /// Height
    pub h: Fixed,
}

impl Rect {
    /// Create from fixed-point components.
    #[inline]
    pub const fn new(x: Fixed, y: Fixed, w: Fixed, h: Fixed) -> Self {
        Self { x, y, w, h }
    }

    /// Create from whole pixels.
    #[inline]
    pub const fn from_ints(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self::new(from_int(x), from_int(y), from_int(w), from_int(h))
    }

    /// Box of size `w x h` with its top-left corner at `origin`.
    #[inline]
    pub const fn at(origin: Point, w: Fixed, h: Fixed) -> Self {
        Self::new(origin.x, origin.y, w, h)
    }

    /// Box of size `w x h` centred on `center`.
    #[inline]
    pub fn centered(center: Point, w: Fixed, h: Fixed) -> Self {
        Self::new(center.x - fixed_half(w), center.y - fixed_half(h), w, h)
    }

    #[inline]
    pub fn left(&self) -> Fixed {
        self.x
    }

    #[inline]
    pub fn top(&self) -> Fixed {
        self.y
    }

    #[inline]
    pub fn right(&self) -> Fixed {
        self.x.saturating_add(self.w)
    }

    #[inline]
    pub fn bottom(&self) -> Fixed {
        self.y.saturating_add(self.h)
    }

    #[inline]
    pub fn center_x(&self) -> Fixed {
        self.x + fixed_half(self.w)
    }

    #[inline]
    pub fn center_y(&self) -> Fixed {
        self.y + fixed_half(self.h)
    }

    /// Top-left corner.
    #[inline]
    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Move so the right edge sits at `x`.
    #[inline]
    pub fn set_right(&mut self, x: Fixed) {
        self.x = x - self.w;
    }

    /// Move so the bottom edge sits at `y`.
    #[inline]
    pub fn set_bottom(&mut self, y: Fixed) {
        self.y = y - self.h;
    }

    /// Move so the top-left corner sits at `origin`.
    #[inline]
    pub fn set_origin(&mut self, origin: Point) {
        self.x = origin.x;
        self.y = origin.y;
    }

    /// Copy shifted by `(dx, dy)`, saturating at the fixed-point range.
    #[inline]
    pub fn translated(&self, dx: Fixed, dy: Fixed) -> Self {
        Self::new(self.x.saturating_add(dx), self.y.saturating_add(dy), self.w, self.h)
    }

    /// Grow (or shrink, with negative deltas) around the centre.
    ///
    /// `dw`/`dh` are total size changes; each side moves by half.
    pub fn inflated(&self, dw: Fixed, dh: Fixed) -> Self {
        let w = (self.w + dw).max(0);
        let h = (self.h + dh).max(0);
        Self::new(
            self.x - fixed_half(w - self.w),
            self.y - fixed_half(h - self.h),
            w,
            h,
        )
    }

    /// Strict overlap test: boxes that only share an edge do not overlap.
    #[inline]
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    /// Convert to `[x, y, w, h]` floats for display.
    pub fn to_floats(&self) -> [f32; 4] {
        [to_float(self.x), to_float(self.y), to_float(self.w), to_float(self.h)]
    }
}

impl fmt::Debug for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [x, y, w, h] = self.to_floats();
        write!(f, "Rect({:.2}, {:.2}, {:.2}x{:.2})", x, y, w, h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixed::{FIXED_HALF, FIXED_ONE};

    #[test]
    fn test_edges() {
        let r = Rect::from_ints(32, 64, 20, 30);
        assert_eq!(r.right(), from_int(52));
        assert_eq!(r.bottom(), from_int(94));
        assert_eq!(r.center_x(), from_int(42));
        assert_eq!(r.center_y(), from_int(79));
    }

    #[test]
    fn test_touching_edges_do_not_overlap() {
        let a = Rect::from_ints(0, 0, 32, 32);
        let right = Rect::from_ints(32, 0, 32, 32);
        let below = Rect::from_ints(0, 32, 32, 32);
        assert!(!a.overlaps(&right));
        assert!(!a.overlaps(&below));

        let nudged = below.translated(0, -FIXED_ONE / 100);
        assert!(a.overlaps(&nudged));
    }

    #[test]
    fn test_inflated_shrinks_around_center() {
        let pit = Rect::from_ints(64, 96, 32, 32);
        let inset = pit.inflated(from_int(-10), from_int(-10));
        assert_eq!(inset, Rect::from_ints(69, 101, 22, 22));
        assert_eq!(inset.center_x(), pit.center_x());
    }

    #[test]
    fn test_inflated_never_negative() {
        let tiny = Rect::from_ints(0, 0, 4, 4);
        let gone = tiny.inflated(from_int(-10), from_int(-10));
        assert_eq!(gone.w, 0);
        assert_eq!(gone.h, 0);
    }

    #[test]
    fn test_centered() {
        let pickup = Rect::centered(Point::from_ints(48, 48), from_int(20), from_int(20));
        assert_eq!(pickup, Rect::from_ints(38, 38, 20, 20));

        let odd = Rect::centered(Point::new(FIXED_HALF, 0), FIXED_ONE, FIXED_ONE);
        assert_eq!(odd.x, 0);
    }

    #[test]
    fn test_edge_setters() {
        let mut r = Rect::from_ints(0, 0, 20, 30);
        r.set_right(from_int(64));
        r.set_bottom(from_int(96));
        assert_eq!(r.origin(), Point::from_ints(44, 66));
    }

    #[test]
    fn test_edges_saturate() {
        let far = Rect::new(i32::MAX - FIXED_ONE, 0, from_int(20), from_int(30));
        assert_eq!(far.right(), i32::MAX);
        assert_eq!(far.translated(from_int(20), 0).x, i32::MAX);
    }

    #[test]
    fn test_point_ordering() {
        let a = Point::from_ints(10, 50);
        let b = Point::from_ints(20, 0);
        let c = Point::from_ints(10, 60);
        assert!(a < b);
        assert!(a < c);
        assert!(c < b);
    }
}
