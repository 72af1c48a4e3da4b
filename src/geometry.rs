//! Axis-aligned bounding rectangles (MBRs).
//!
//! The rectangle is the unit of space the partitioner subdivides. Containment
//! is half-open on the max edges so that a quad split produces four disjoint
//! children whose union is exactly the parent.

use crate::error::{IndexError, Result};
use geo::Point;
use serde::{Deserialize, Serialize};

/// An immutable axis-aligned bounding rectangle.
///
/// Invariant: `min_x <= max_x` and `min_y <= max_y`. Construction through
/// [`BoundingRect::new`] fails with [`IndexError::InvalidBounds`] otherwise;
/// the bounds are never silently clamped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingRect {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
}

impl BoundingRect {
    /// Create a rectangle from min/max corners.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::InvalidBounds`] if `min > max` on either axis.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Result<Self> {
        if min_x > max_x || min_y > max_y {
            return Err(IndexError::InvalidBounds {
                min_x,
                min_y,
                max_x,
                max_y,
            });
        }
        Ok(Self {
            min_x,
            min_y,
            max_x,
            max_y,
        })
    }

    /// Construct without validation. Internal use only, for children of an
    /// already-valid rectangle.
    pub(crate) fn new_unchecked(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        debug_assert!(min_x <= max_x && min_y <= max_y);
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Compute the minimum bounding rectangle of a point set.
    ///
    /// Returns `None` for an empty iterator.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Point>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (mut min_x, mut min_y) = (first.x(), first.y());
        let (mut max_x, mut max_y) = (first.x(), first.y());
        for p in iter {
            min_x = min_x.min(p.x());
            min_y = min_y.min(p.y());
            max_x = max_x.max(p.x());
            max_y = max_y.max(p.y());
        }
        Some(Self {
            min_x,
            min_y,
            max_x,
            max_y,
        })
    }

    pub fn min_x(&self) -> f64 {
        self.min_x
    }

    pub fn min_y(&self) -> f64 {
        self.min_y
    }

    pub fn max_x(&self) -> f64 {
        self.max_x
    }

    pub fn max_y(&self) -> f64 {
        self.max_y
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center_x(&self) -> f64 {
        (self.min_x + self.max_x) / 2.0
    }

    pub fn center_y(&self) -> f64 {
        (self.min_y + self.max_y) / 2.0
    }

    /// Center of the rectangle as a point.
    pub fn center(&self) -> Point {
        Point::new(self.center_x(), self.center_y())
    }

    /// Half-open containment: `min_x <= x < max_x && min_y <= y < max_y`.
    ///
    /// A point exactly on a max edge is *not* contained; the neighbor
    /// rectangle that starts at that edge owns it.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x < self.max_x && y >= self.min_y && y < self.max_y
    }

    /// Split into four equal quadrants at the arithmetic center.
    ///
    /// Order is `[bottom-left, bottom-right, top-left, top-right]`. The
    /// union of the children equals the parent and their interiors are
    /// disjoint under the half-open containment rule.
    pub fn quad_split(&self) -> [BoundingRect; 4] {
        let mid_x = self.center_x();
        let mid_y = self.center_y();
        [
            Self::new_unchecked(self.min_x, self.min_y, mid_x, mid_y),
            Self::new_unchecked(mid_x, self.min_y, self.max_x, mid_y),
            Self::new_unchecked(self.min_x, mid_y, mid_x, self.max_y),
            Self::new_unchecked(mid_x, mid_y, self.max_x, self.max_y),
        ]
    }

    /// A copy grown by `epsilon` on the max edges.
    ///
    /// Useful for callers who want points sitting exactly on the global max
    /// boundary to fall inside the half-open extent (see
    /// [`BoundaryMode`](crate::types::BoundaryMode) for the built-in
    /// alternative).
    pub fn expanded_by(&self, epsilon: f64) -> Self {
        Self {
            min_x: self.min_x,
            min_y: self.min_y,
            max_x: self.max_x + epsilon,
            max_y: self.max_y + epsilon,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_inverted_bounds() {
        assert!(BoundingRect::new(1.0, 0.0, 0.0, 1.0).is_err());
        assert!(BoundingRect::new(0.0, 1.0, 1.0, 0.0).is_err());
        assert!(BoundingRect::new(0.0, 0.0, 0.0, 0.0).is_ok());
    }

    #[test]
    fn test_derived_properties() {
        let rect = BoundingRect::new(-2.0, 0.0, 2.0, 8.0).unwrap();
        assert_eq!(rect.width(), 4.0);
        assert_eq!(rect.height(), 8.0);
        assert_eq!(rect.center_x(), 0.0);
        assert_eq!(rect.center_y(), 4.0);
    }

    #[test]
    fn test_contains_is_half_open() {
        let rect = BoundingRect::new(0.0, 0.0, 1.0, 1.0).unwrap();
        assert!(rect.contains(0.0, 0.0));
        assert!(rect.contains(0.5, 0.999));
        assert!(!rect.contains(1.0, 0.5));
        assert!(!rect.contains(0.5, 1.0));
    }

    #[test]
    fn test_quad_split_covers_parent_disjointly() {
        let rect = BoundingRect::new(0.0, 0.0, 4.0, 4.0).unwrap();
        let quads = rect.quad_split();

        assert_eq!(quads[0], BoundingRect::new(0.0, 0.0, 2.0, 2.0).unwrap());
        assert_eq!(quads[1], BoundingRect::new(2.0, 0.0, 4.0, 2.0).unwrap());
        assert_eq!(quads[2], BoundingRect::new(0.0, 2.0, 2.0, 4.0).unwrap());
        assert_eq!(quads[3], BoundingRect::new(2.0, 2.0, 4.0, 4.0).unwrap());

        // Every interior point lands in exactly one quadrant, including
        // points on the internal split lines.
        for &(x, y) in &[(1.0, 1.0), (2.0, 2.0), (2.0, 0.0), (0.0, 2.0), (3.9, 3.9)] {
            let owners = quads.iter().filter(|q| q.contains(x, y)).count();
            assert_eq!(owners, 1, "point ({x}, {y}) owned by {owners} quadrants");
        }
    }

    #[test]
    fn test_quad_split_non_integer_center() {
        let rect = BoundingRect::new(0.0, 0.0, 1.0, 3.0).unwrap();
        let quads = rect.quad_split();
        assert_eq!(quads[0].max_x(), 0.5);
        assert_eq!(quads[0].max_y(), 1.5);
    }

    #[test]
    fn test_from_points() {
        let points = vec![
            Point::new(1.0, 5.0),
            Point::new(-3.0, 2.0),
            Point::new(4.0, -1.0),
        ];
        let rect = BoundingRect::from_points(points).unwrap();
        assert_eq!(rect.min_x(), -3.0);
        assert_eq!(rect.min_y(), -1.0);
        assert_eq!(rect.max_x(), 4.0);
        assert_eq!(rect.max_y(), 5.0);

        assert!(BoundingRect::from_points(std::iter::empty()).is_none());
    }

    #[test]
    fn test_expanded_by() {
        let rect = BoundingRect::new(0.0, 0.0, 8.0, 8.0).unwrap();
        let grown = rect.expanded_by(1e-9);
        assert!(grown.contains(8.0, 8.0));
        assert!(!rect.contains(8.0, 8.0));
    }
}
