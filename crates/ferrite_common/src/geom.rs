//! Integer database-unit geometry.
//!
//! All placement coordinates are stored as database units ([`Dbu`]); the
//! design declares how many of them make up one micron.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A length or coordinate in database units.
pub type Dbu = i64;

/// A location on the placement plane.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: Dbu,
    /// Vertical coordinate.
    pub y: Dbu,
}

impl Point {
    /// Creates a point.
    pub const fn new(x: Dbu, y: Dbu) -> Self {
        Self { x, y }
    }

    /// Manhattan distance to `other`.
    pub fn manhattan(self, other: Point) -> Dbu {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// An axis-aligned rectangle with inclusive lower-left and upper-right corners.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Lower-left x.
    pub xl: Dbu,
    /// Lower-left y.
    pub yl: Dbu,
    /// Upper-right x.
    pub xh: Dbu,
    /// Upper-right y.
    pub yh: Dbu,
}

impl Rect {
    /// Creates a rectangle, normalizing the corner order.
    pub fn new(x0: Dbu, y0: Dbu, x1: Dbu, y1: Dbu) -> Self {
        Self {
            xl: x0.min(x1),
            yl: y0.min(y1),
            xh: x0.max(x1),
            yh: y0.max(y1),
        }
    }

    /// Rectangle anchored at `origin` with the given size.
    pub fn from_origin(origin: Point, width: Dbu, height: Dbu) -> Self {
        Self::new(origin.x, origin.y, origin.x + width, origin.y + height)
    }

    /// Horizontal extent.
    pub fn width(&self) -> Dbu {
        self.xh - self.xl
    }

    /// Vertical extent.
    pub fn height(&self) -> Dbu {
        self.yh - self.yl
    }

    /// Half perimeter, the classic wire-length estimate for a bounding box.
    pub fn half_perimeter(&self) -> Dbu {
        self.width() + self.height()
    }

    /// Geometric center, rounded toward the lower-left.
    pub fn center(&self) -> Point {
        Point::new((self.xl + self.xh) / 2, (self.yl + self.yh) / 2)
    }

    /// Returns `true` if `p` lies inside or on the boundary.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.xl && p.x <= self.xh && p.y >= self.yl && p.y <= self.yh
    }

    /// Grows the rectangle to include `p`.
    pub fn merge_point(&mut self, p: Point) {
        self.xl = self.xl.min(p.x);
        self.yl = self.yl.min(p.y);
        self.xh = self.xh.max(p.x);
        self.yh = self.yh.max(p.y);
    }

    /// Bounding box of a set of points, or `None` when the set is empty.
    pub fn bounding<I: IntoIterator<Item = Point>>(points: I) -> Option<Rect> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bbox = Rect::new(first.x, first.y, first.x, first.y);
        for p in iter {
            bbox.merge_point(p);
        }
        Some(bbox)
    }

    /// Moves `origin` so a box of `width` x `height` anchored there lies
    /// inside this rectangle. Returns the clamped origin.
    pub fn clamp_origin(&self, origin: Point, width: Dbu, height: Dbu) -> Point {
        let max_x = (self.xh - width).max(self.xl);
        let max_y = (self.yh - height).max(self.yl);
        Point::new(origin.x.clamp(self.xl, max_x), origin.y.clamp(self.yl, max_y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manhattan_distance() {
        assert_eq!(Point::new(0, 0).manhattan(Point::new(3, -4)), 7);
    }

    #[test]
    fn rect_normalizes_corners() {
        let r = Rect::new(10, 20, 0, 5);
        assert_eq!((r.xl, r.yl, r.xh, r.yh), (0, 5, 10, 20));
        assert_eq!(r.half_perimeter(), 25);
    }

    #[test]
    fn bounding_box_of_points() {
        let bbox = Rect::bounding([Point::new(5, 1), Point::new(-2, 7), Point::new(3, 3)]).unwrap();
        assert_eq!(bbox, Rect::new(-2, 1, 5, 7));
        assert!(Rect::bounding(Vec::<Point>::new()).is_none());
    }

    #[test]
    fn clamp_origin_keeps_box_inside() {
        let core = Rect::new(0, 0, 100, 100);
        assert_eq!(core.clamp_origin(Point::new(-5, 50), 10, 10), Point::new(0, 50));
        assert_eq!(core.clamp_origin(Point::new(95, 120), 10, 10), Point::new(90, 90));
        assert_eq!(core.clamp_origin(Point::new(20, 30), 10, 10), Point::new(20, 30));
    }
}
