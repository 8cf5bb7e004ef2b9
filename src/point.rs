use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

/// Integer position or offset on the corner lattice. Cells are addressed by
/// their top-left corner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0, y: 0 };

    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn scale(self, s: i32) -> Self {
        Self::new(self.x * s, self.y * s)
    }

    /// Component-wise sign, each of -1, 0 or 1.
    #[inline]
    pub fn signum(self) -> Self {
        Self::new(self.x.signum(), self.y.signum())
    }

    /// `(x, y)` as indices, or None if either is negative.
    #[inline]
    pub fn to_index(self) -> Option<(usize, usize)> {
        Some((usize::try_from(self.x).ok()?, usize::try_from(self.y).ok()?))
    }

    #[inline]
    pub fn as_vec2(self) -> Vec2 {
        Vec2::new(self.x as f64, self.y as f64)
    }
}

impl Add for Point {
    type Output = Point;

    #[inline]
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    #[inline]
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for Point {
    type Output = Point;

    #[inline]
    fn neg(self) -> Point {
        Point::new(-self.x, -self.y)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Real-valued 2-D vector for cell-local geometry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn scale(self, s: f64) -> Self {
        Self::new(self.x * s, self.y * s)
    }

    /// Linear interpolation from `a` (t = 0) to `b` (t = 1).
    #[inline]
    pub fn lerp(a: Vec2, b: Vec2, t: f64) -> Vec2 {
        (b - a).scale(t) + a
    }

    /// Per-axis inverse of `lerp`. Axes where `a == b` yield a non-finite
    /// component.
    #[inline]
    pub fn inverse_lerp(a: Vec2, b: Vec2, p: Vec2) -> Vec2 {
        let d = b - a;
        let o = p - a;
        Vec2::new(o.x / d.x, o.y / d.y)
    }

    /// Moves `p` away from center `c` by factor `s`.
    #[inline]
    pub fn scale_away_from(c: Vec2, p: Vec2, s: f64) -> Vec2 {
        (p - c).scale(s) + c
    }

    #[inline]
    pub fn distance_sqr(a: Vec2, b: Vec2) -> f64 {
        let d = a - b;
        d.x * d.x + d.y * d.y
    }

    #[inline]
    pub fn distance(a: Vec2, b: Vec2) -> f64 {
        Self::distance_sqr(a, b).sqrt()
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    #[inline]
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    #[inline]
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;

    #[inline]
    fn mul(self, rhs: f64) -> Vec2 {
        self.scale(rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_arithmetic_returns_new_values() {
        let a = Point::new(2, -3);
        let b = Point::new(1, 1);
        assert_eq!(a + b, Point::new(3, -2));
        assert_eq!(a - b, Point::new(1, -4));
        assert_eq!(a.scale(2), Point::new(4, -6));
        assert_eq!(a.signum(), Point::new(1, -1));
        assert_eq!(a, Point::new(2, -3));
    }

    #[test]
    fn negative_points_have_no_index() {
        assert_eq!(Point::new(-1, 0).to_index(), None);
        assert_eq!(Point::new(3, 4).to_index(), Some((3, 4)));
    }

    #[test]
    fn vec2_lerp_and_inverse() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(2.0, 4.0);
        let mid = Vec2::lerp(a, b, 0.25);
        assert_eq!(mid, Vec2::new(0.5, 1.0));
        assert_eq!(Vec2::inverse_lerp(a, b, mid), Vec2::new(0.25, 0.25));
        assert_eq!(Vec2::distance(a, Vec2::new(3.0, 4.0)), 5.0);
    }

    #[test]
    fn scale_away_from_center() {
        let c = Vec2::new(1.0, 1.0);
        let p = Vec2::new(2.0, 1.0);
        assert_eq!(Vec2::scale_away_from(c, p, 3.0), Vec2::new(4.0, 1.0));
    }
}
