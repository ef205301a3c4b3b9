//! Axis-aligned bounds of point sets

use crate::record::{Point3f, Vector3f};
use crate::table::{PointSet, VertexTable};

/// Smallest axis range used when every point shares a coordinate
pub const MIN_RANGE: f32 = 1e-6;

/// An axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Point3f,
    pub max: Point3f,
}

impl BoundingBox {
    /// Compute the bounds of a set of points; empty input gives a box at the origin
    pub fn from_points<'a, I>(points: I) -> Self
    where
        I: IntoIterator<Item = &'a Point3f>,
    {
        let mut iter = points.into_iter();
        let Some(first) = iter.next() else {
            return Self {
                min: Point3f::origin(),
                max: Point3f::origin(),
            };
        };

        let mut min = *first;
        let mut max = *first;
        for p in iter {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            min.z = min.z.min(p.z);

            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
            max.z = max.z.max(p.z);
        }

        Self { min, max }
    }

    /// Midpoint of the box
    pub fn center(&self) -> Point3f {
        nalgebra::center(&self.min, &self.max)
    }

    /// Per-axis extent, with zero extents replaced by [`MIN_RANGE`]
    pub fn extents(&self) -> Vector3f {
        (self.max - self.min).map(|r| if r > MIN_RANGE { r } else { MIN_RANGE })
    }

    /// Half of the largest axis extent, never zero
    pub fn max_half_range(&self) -> f32 {
        self.extents().max() / 2.0
    }
}

/// Objects with spatial bounds
pub trait Bounded {
    /// Get the bounding box of the object
    fn bounding_box(&self) -> BoundingBox;

    /// Get the center point of the object
    fn center(&self) -> Point3f {
        self.bounding_box().center()
    }
}

impl Bounded for PointSet {
    fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(&self.positions)
    }
}

impl Bounded for VertexTable {
    fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(self.records.iter().map(|r| &r.position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_bounds_and_center() {
        let points = PointSet::from_positions(vec![
            Point3f::new(-1.0, 0.0, 2.0),
            Point3f::new(3.0, 4.0, 2.0),
            Point3f::new(1.0, -2.0, 6.0),
        ]);
        let bounds = points.bounding_box();
        assert_eq!(bounds.min, Point3f::new(-1.0, -2.0, 2.0));
        assert_eq!(bounds.max, Point3f::new(3.0, 4.0, 6.0));
        assert_eq!(points.center(), Point3f::new(1.0, 1.0, 4.0));
        assert_relative_eq!(bounds.max_half_range(), 3.0);
    }

    #[test]
    fn test_degenerate_extents_are_guarded() {
        let points = vec![Point3f::new(5.0, 5.0, 5.0); 4];
        let bounds = BoundingBox::from_points(&points);
        let extents = bounds.extents();
        assert_eq!(extents, Vector3f::new(MIN_RANGE, MIN_RANGE, MIN_RANGE));
        assert!(bounds.max_half_range() > 0.0);
    }

    #[test]
    fn test_empty_bounds() {
        let bounds = BoundingBox::from_points(&Vec::<Point3f>::new());
        assert_eq!(bounds.center(), Point3f::origin());
    }
}
