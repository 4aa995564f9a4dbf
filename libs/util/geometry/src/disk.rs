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
use crate::Aabb2;
use nalgebra::Point2;

#[derive(Clone, Copy, Debug)]
pub struct Disk {
    center: Point2<f64>,
    radius: f64,
}

impl Disk {
    pub fn new(center: Point2<f64>, radius: f64) -> Self {
        debug_assert!(radius >= 0.0);
        Self { center, radius }
    }

    pub fn center(&self) -> &Point2<f64> {
        &self.center
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Closed containment; points exactly on the rim are inside.
    pub fn contains(&self, p: Point2<f64>) -> bool {
        (p - self.center).norm_squared() <= self.radius * self.radius
    }

    /// The tightest rectangle covering the disk.
    pub fn bounding_box(&self) -> Aabb2 {
        Aabb2::from_center_extent(self.center, self.radius * 2.0, self.radius * 2.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_contains() {
        let d = Disk::new(Point2::origin(), 10.0);
        assert!(d.contains(Point2::new(0.0, 0.0)));
        assert!(d.contains(Point2::new(10.0, 0.0)));
        assert!(d.contains(Point2::new(6.0, 8.0)));
        assert!(!d.contains(Point2::new(6.0, 8.1)));
    }

    #[test]
    fn test_bounding_box_covers_rim() {
        let d = Disk::new(Point2::new(1.0, -1.0), 5.0);
        let b = d.bounding_box();
        assert!(b.contains(Point2::new(6.0, -1.0)));
        assert!(b.contains(Point2::new(-4.0, 4.0)));
        assert!(!b.contains(Point2::new(6.1, -1.0)));
    }
}
