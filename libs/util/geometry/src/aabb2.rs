// This file is part of Neon.
//
// Neon is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// Neon is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with Neon.  If not, see <http://www.gnu.org/licenses/>.
use nalgebra::Point2;

/// An axis-aligned rectangle in world space.
///
/// Overlap and containment tests are closed on all edges. The `owns` test is
/// half-open on both axes (lo inclusive, hi exclusive) so that a tiling of
/// rectangles assigns every point to exactly one owner; a point exactly on a
/// shared edge belongs to the higher-coordinate rectangle.
#[derive(Clone, Copy, Debug)]
pub struct Aabb2 {
    lo: Point2<f64>,
    hi: Point2<f64>,
}

impl Aabb2 {
    pub fn from_bounds(lo: Point2<f64>, hi: Point2<f64>) -> Self {
        debug_assert!(lo.x <= hi.x);
        debug_assert!(lo.y <= hi.y);
        Self { lo, hi }
    }

    pub fn from_center_extent(center: Point2<f64>, width: f64, height: f64) -> Self {
        debug_assert!(width >= 0.0);
        debug_assert!(height >= 0.0);
        Self {
            lo: Point2::new(center.x - width / 2.0, center.y - height / 2.0),
            hi: Point2::new(center.x + width / 2.0, center.y + height / 2.0),
        }
    }

    pub fn lo(&self) -> &Point2<f64> {
        &self.lo
    }

    pub fn hi(&self) -> &Point2<f64> {
        &self.hi
    }

    pub fn left(&self) -> f64 {
        self.lo.x
    }

    pub fn right(&self) -> f64 {
        self.hi.x
    }

    pub fn bottom(&self) -> f64 {
        self.lo.y
    }

    pub fn top(&self) -> f64 {
        self.hi.y
    }

    pub fn width(&self) -> f64 {
        self.hi.x - self.lo.x
    }

    pub fn height(&self) -> f64 {
        self.hi.y - self.lo.y
    }

    pub fn center(&self) -> Point2<f64> {
        Point2::new(
            (self.lo.x + self.hi.x) / 2.0,
            (self.lo.y + self.hi.y) / 2.0,
        )
    }

    pub fn contains(&self, p: Point2<f64>) -> bool {
        p.x >= self.lo.x && p.x <= self.hi.x && p.y >= self.lo.y && p.y <= self.hi.y
    }

    /// Half-open ownership test; exactly one rectangle of a tiling owns any
    /// given point.
    pub fn owns(&self, p: Point2<f64>) -> bool {
        p.x >= self.lo.x && p.x < self.hi.x && p.y >= self.lo.y && p.y < self.hi.y
    }

    pub fn overlaps(&self, other: &Self) -> bool {
        self.lo.x <= other.hi.x
            && self.hi.x >= other.lo.x
            && self.lo.y <= other.hi.y
            && self.hi.y >= other.lo.y
    }

    /// Grow every edge outward by `margin`.
    pub fn inflate(&self, margin: f64) -> Self {
        debug_assert!(margin >= 0.0);
        Self {
            lo: Point2::new(self.lo.x - margin, self.lo.y - margin),
            hi: Point2::new(self.hi.x + margin, self.hi.y + margin),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_contains() {
        let b = Aabb2::from_bounds(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0));
        assert!(b.contains(Point2::new(0.5, 0.5)));
        assert!(b.contains(Point2::new(1.0, 1.0)));
        assert!(!b.contains(Point2::new(0.0, -1.0)));
        assert!(!b.contains(Point2::new(-1.0, 0.0)));
        assert!(!b.contains(Point2::new(2.0, 0.0)));
        assert!(!b.contains(Point2::new(0.0, 2.0)));
    }

    #[test]
    fn test_ownership_is_half_open() {
        let a = Aabb2::from_bounds(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0));
        let b = Aabb2::from_bounds(Point2::new(1.0, 0.0), Point2::new(2.0, 1.0));
        let edge = Point2::new(1.0, 0.5);
        assert!(!a.owns(edge));
        assert!(b.owns(edge));
    }

    #[test]
    fn test_overlaps() {
        let a = Aabb2::from_bounds(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0));
        let b = Aabb2::from_bounds(Point2::new(0.5, 0.5), Point2::new(3.0, 3.0));
        assert!(a.overlaps(&b));
        let c = Aabb2::from_bounds(Point2::new(2.0, 2.0), Point2::new(3.0, 3.0));
        assert!(!a.overlaps(&c));
        // Edge contact counts as overlap.
        let d = Aabb2::from_bounds(Point2::new(1.0, 0.0), Point2::new(2.0, 1.0));
        assert!(a.overlaps(&d));
    }

    #[test]
    fn test_center_extent_round_trip() {
        let b = Aabb2::from_center_extent(Point2::new(3.0, -2.0), 4.0, 6.0);
        assert_abs_diff_eq!(b.left(), 1.0);
        assert_abs_diff_eq!(b.right(), 5.0);
        assert_abs_diff_eq!(b.bottom(), -5.0);
        assert_abs_diff_eq!(b.top(), 1.0);
        assert_abs_diff_eq!(b.center().x, 3.0);
        assert_abs_diff_eq!(b.center().y, -2.0);
    }

    #[test]
    fn test_inflate() {
        let b = Aabb2::from_bounds(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0)).inflate(0.5);
        assert_abs_diff_eq!(b.left(), -0.5);
        assert_abs_diff_eq!(b.top(), 1.5);
    }
}
