//! Axis limits of a 3D plot

use meshcloud_core::{BoundingBox, Error, Point3f, Result, Vector3f, MIN_RANGE};

/// The visible region of a 3D scatter.
///
/// The box is drawn with a 1:1:1 aspect, so every axis is normalised to the
/// unit cube centred on the origin regardless of its data range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBox {
    pub min: Point3f,
    pub max: Point3f,
}

fn check_zoom(zoom: f32) -> Result<()> {
    if zoom.is_finite() && zoom > 0.0 {
        Ok(())
    } else {
        Err(Error::Visualization(format!("zoom must be positive, got {zoom}")))
    }
}

impl ViewBox {
    /// Equal half-range on every axis: half the largest data range divided
    /// by `zoom`, centred on each axis midpoint. `zoom < 1` zooms out.
    pub fn equal_aspect(bounds: &BoundingBox, zoom: f32) -> Result<Self> {
        check_zoom(zoom)?;
        let center = bounds.center();
        let half = bounds.max_half_range() / zoom;
        let half = Vector3f::repeat(half);
        Ok(Self {
            min: center - half,
            max: center + half,
        })
    }

    /// Box for the settling animation: x and y as [`ViewBox::equal_aspect`],
    /// z spans `[mid - half, mid + 2 * half / zoom]` where `half` is half
    /// the largest data range, leaving headroom above the cloud.
    pub fn settling(bounds: &BoundingBox, zoom: f32) -> Result<Self> {
        let mut view = Self::equal_aspect(bounds, zoom)?;
        let half = bounds.max_half_range();
        let mid_z = bounds.center().z;
        view.min.z = mid_z - half;
        view.max.z = mid_z + 2.0 * half / zoom;
        Ok(view)
    }

    /// Per-axis size of the box, never zero
    pub fn extents(&self) -> Vector3f {
        (self.max - self.min).map(|r| r.max(MIN_RANGE))
    }

    /// Map a data point into the unit cube `[-0.5, 0.5]^3`
    pub fn normalize(&self, p: &Point3f) -> Point3f {
        let extents = self.extents();
        let offset = p - self.min;
        Point3f::new(
            offset.x / extents.x - 0.5,
            offset.y / extents.y - 0.5,
            offset.z / extents.z - 0.5,
        )
    }

    /// Evenly spaced tick values along one axis, ends included
    pub fn ticks(&self, axis: usize, count: usize) -> Vec<f32> {
        let (lo, hi) = (self.min[axis], self.max[axis]);
        match count {
            0 => Vec::new(),
            1 => vec![(lo + hi) / 2.0],
            _ => (0..count)
                .map(|i| lo + (hi - lo) * i as f32 / (count - 1) as f32)
                .collect(),
        }
    }

    /// The eight corners in normalised coordinates
    pub fn unit_corners() -> [Point3f; 8] {
        let mut corners = [Point3f::origin(); 8];
        for (i, corner) in corners.iter_mut().enumerate() {
            let pick = |bit: usize| if i & (1 << bit) != 0 { 0.5 } else { -0.5 };
            *corner = Point3f::new(pick(0), pick(1), pick(2));
        }
        corners
    }

    /// Corner index pairs forming the twelve box edges
    pub fn unit_edges() -> Vec<(usize, usize)> {
        let mut edges = Vec::with_capacity(12);
        for a in 0..8usize {
            for bit in 0..3 {
                let b = a | (1 << bit);
                if b != a {
                    edges.push((a, b));
                }
            }
        }
        edges
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn bounds() -> BoundingBox {
        BoundingBox {
            min: Point3f::new(0.0, -1.0, 2.0),
            max: Point3f::new(4.0, 1.0, 4.0),
        }
    }

    #[test]
    fn test_equal_aspect_box() {
        let view = ViewBox::equal_aspect(&bounds(), 0.5).unwrap();
        // largest range 4, half 2, zoomed out to 4
        assert_relative_eq!(view.min, Point3f::new(-2.0, -4.0, -1.0));
        assert_relative_eq!(view.max, Point3f::new(6.0, 4.0, 7.0));
    }

    #[test]
    fn test_settling_box_has_headroom() {
        let view = ViewBox::settling(&bounds(), 0.5).unwrap();
        assert_relative_eq!(view.min.z, 1.0);
        assert_relative_eq!(view.max.z, 11.0);
        assert_relative_eq!(view.min.x, -2.0);
        assert_relative_eq!(view.max.y, 4.0);
    }

    #[test]
    fn test_degenerate_bounds() {
        let flat = BoundingBox {
            min: Point3f::new(1.0, 1.0, 1.0),
            max: Point3f::new(1.0, 1.0, 1.0),
        };
        let view = ViewBox::equal_aspect(&flat, 1.0).unwrap();
        assert!(view.extents().iter().all(|e| *e > 0.0));
        let p = view.normalize(&Point3f::new(1.0, 1.0, 1.0));
        assert!(p.iter().all(|c| c.is_finite()));
    }

    #[test]
    fn test_invalid_zoom() {
        assert!(ViewBox::equal_aspect(&bounds(), 0.0).is_err());
        assert!(ViewBox::settling(&bounds(), -1.0).is_err());
    }

    #[test]
    fn test_normalize_and_ticks() {
        let view = ViewBox::equal_aspect(&bounds(), 1.0).unwrap();
        assert_relative_eq!(view.normalize(&view.min), Point3f::new(-0.5, -0.5, -0.5));
        assert_relative_eq!(view.normalize(&bounds().center()), Point3f::origin());

        let ticks = view.ticks(0, 5);
        assert_eq!(ticks.len(), 5);
        assert_relative_eq!(ticks[0], view.min.x);
        assert_relative_eq!(ticks[4], view.max.x);
    }

    #[test]
    fn test_unit_box_geometry() {
        let edges = ViewBox::unit_edges();
        assert_eq!(edges.len(), 12);
        let corners = ViewBox::unit_corners();
        for (a, b) in edges {
            assert_relative_eq!((corners[a] - corners[b]).norm(), 1.0);
        }
    }
}
