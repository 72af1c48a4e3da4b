//! Density-driven non-uniform quad-tree partitioning.
//!
//! The partitioner recursively splits a bounding rectangle into quadrants
//! until each cell's aggregate density drops to the configured threshold or
//! the recursion reaches the maximum depth. The recursion is expressed as a
//! call stack producing a flat leaf list; no tree structure is retained.

use crate::error::{IndexError, Result};
use crate::geometry::BoundingRect;
use crate::hilbert::grid_coordinate;
use crate::types::{BoundaryMode, SpatialPoint};

/// A scalar "spatial weight" of a record set, used to decide whether a cell
/// stops subdividing.
///
/// Any non-negative function that is additive over disjoint unions is a
/// valid metric: point count, trajectory length, weighted density. Closures
/// implement the trait directly.
pub trait DensityMetric {
    fn measure(&self, records: &[SpatialPoint]) -> f64;
}

impl<F> DensityMetric for F
where
    F: Fn(&[SpatialPoint]) -> f64,
{
    fn measure(&self, records: &[SpatialPoint]) -> f64 {
        self(records)
    }
}

/// The default density metric: one unit of weight per record.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointCount;

impl DensityMetric for PointCount {
    fn measure(&self, records: &[SpatialPoint]) -> f64 {
        records.len() as f64
    }
}

/// A leaf cell of the non-uniform partition.
///
/// Carries its rectangle, the records it contains, the depth at which the
/// recursion stopped, and its row/column in the global virtual grid. Hilbert
/// codes are attached later by the registry as a separate pure transform;
/// the subspace itself is never mutated after creation.
#[derive(Debug, Clone)]
pub struct Subspace {
    rect: BoundingRect,
    records: Vec<SpatialPoint>,
    depth: u8,
    row: u32,
    col: u32,
}

impl Subspace {
    pub fn rect(&self) -> &BoundingRect {
        &self.rect
    }

    pub fn records(&self) -> &[SpatialPoint] {
        &self.records
    }

    /// Consume the subspace, yielding its records.
    pub fn into_records(self) -> Vec<SpatialPoint> {
        self.records
    }

    /// Partition depth at which this leaf was emitted.
    pub fn depth(&self) -> u8 {
        self.depth
    }

    /// Grid row (y) in the global virtual grid.
    pub fn row(&self) -> u32 {
        self.row
    }

    /// Grid column (x) in the global virtual grid.
    pub fn col(&self) -> u32 {
        self.col
    }
}

/// Result of partitioning one batch.
#[derive(Debug, Clone, Default)]
pub struct PartitionOutcome {
    /// Leaf cells, in recursion (bottom-left first) order.
    pub leaves: Vec<Subspace>,
    /// Records excluded because the global extent does not contain them.
    /// Under [`BoundaryMode::HalfOpen`] this includes points sitting exactly
    /// on the global max X/Y edge.
    pub dropped: Vec<SpatialPoint>,
}

impl PartitionOutcome {
    pub fn dropped_count(&self) -> usize {
        self.dropped.len()
    }
}

/// Recursive non-uniform partitioner over a global extent.
///
/// # Example
///
/// ```rust
/// use sthilbert::{BoundingRect, Partitioner, SpatialPoint};
///
/// let extent = BoundingRect::new(0.0, 0.0, 8.0, 8.0)?;
/// let partitioner = Partitioner::new(1.0, 3)?;
/// let points = vec![
///     SpatialPoint::new(0.5, 0.5, 0, "a"),
///     SpatialPoint::new(6.5, 6.5, 0, "b"),
/// ];
/// let outcome = partitioner.partition(points, &extent)?;
/// assert_eq!(outcome.leaves.len(), 2);
/// # Ok::<(), sthilbert::IndexError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Partitioner<M = PointCount> {
    theta: f64,
    max_depth: u8,
    boundary: BoundaryMode,
    metric: M,
}

impl Partitioner<PointCount> {
    /// Create a partitioner with the point-count metric.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Configuration`] for a non-positive threshold or
    /// a depth outside `[1, 31]`.
    pub fn new(theta: f64, max_depth: u8) -> Result<Self> {
        Self::with_metric(theta, max_depth, PointCount)
    }
}

impl<M: DensityMetric> Partitioner<M> {
    /// Create a partitioner with a custom density metric.
    pub fn with_metric(theta: f64, max_depth: u8, metric: M) -> Result<Self> {
        if !theta.is_finite() || theta <= 0.0 {
            return Err(IndexError::Configuration(format!(
                "density threshold must be a positive finite number, got {theta}"
            )));
        }
        if max_depth == 0 || max_depth > 31 {
            return Err(IndexError::Configuration(format!(
                "max depth must be in [1, 31], got {max_depth}"
            )));
        }
        Ok(Self {
            theta,
            max_depth,
            boundary: BoundaryMode::default(),
            metric,
        })
    }

    /// Set the global upper-boundary treatment.
    pub fn with_boundary(mut self, boundary: BoundaryMode) -> Self {
        self.boundary = boundary;
        self
    }

    /// Grid order D: the virtual grid has side `2^D`.
    pub fn max_depth(&self) -> u8 {
        self.max_depth
    }

    /// Side length of the virtual grid.
    pub fn grid_side(&self) -> u32 {
        1u32 << self.max_depth
    }

    /// Partition a record batch over the global extent into minimal cells.
    ///
    /// Every record the extent contains ends up in exactly one leaf. Records
    /// outside the extent are diverted to [`PartitionOutcome::dropped`] and
    /// logged, never silently discarded.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::DegenerateExtent`] unless the extent has
    /// strictly positive width and height.
    pub fn partition(
        &self,
        records: Vec<SpatialPoint>,
        extent: &BoundingRect,
    ) -> Result<PartitionOutcome> {
        if extent.width() <= 0.0 || extent.height() <= 0.0 {
            return Err(IndexError::DegenerateExtent {
                width: extent.width(),
                height: extent.height(),
            });
        }

        let (contained, dropped): (Vec<_>, Vec<_>) = records
            .into_iter()
            .partition(|r| self.quadrant_contains(extent, extent, r.x(), r.y()));
        if !dropped.is_empty() {
            log::warn!(
                "excluded {} record(s) outside the global extent from partitioning",
                dropped.len()
            );
        }

        let mut leaves = Vec::new();
        if !contained.is_empty() {
            self.recurse(contained, *extent, 0, extent, &mut leaves);
        }
        Ok(PartitionOutcome { leaves, dropped })
    }

    fn recurse(
        &self,
        records: Vec<SpatialPoint>,
        rect: BoundingRect,
        depth: u8,
        global: &BoundingRect,
        leaves: &mut Vec<Subspace>,
    ) {
        if self.metric.measure(&records) <= self.theta || depth == self.max_depth {
            leaves.push(self.emit_leaf(records, rect, depth, global));
            return;
        }

        let quads = rect.quad_split();
        let mut buckets: [Vec<SpatialPoint>; 4] = Default::default();
        for record in records {
            // The parent contains the record and the quadrants tile the
            // parent, so exactly one quadrant accepts it.
            let owner = quads
                .iter()
                .position(|q| self.quadrant_contains(q, global, record.x(), record.y()));
            match owner {
                Some(i) => buckets[i].push(record),
                None => unreachable!("quadrants tile the parent rectangle"),
            }
        }

        for (bucket, quad) in buckets.into_iter().zip(quads) {
            if !bucket.is_empty() {
                self.recurse(bucket, quad, depth + 1, global, leaves);
            }
        }
    }

    fn emit_leaf(
        &self,
        records: Vec<SpatialPoint>,
        rect: BoundingRect,
        depth: u8,
        global: &BoundingRect,
    ) -> Subspace {
        let side = self.grid_side();
        // Grid coordinates are a function of the leaf center and the global
        // extent only, independent of the recursion path.
        let col = grid_coordinate(rect.center_x(), global.min_x(), global.max_x(), side);
        let row = grid_coordinate(rect.center_y(), global.min_y(), global.max_y(), side);
        Subspace {
            rect,
            records,
            depth,
            row,
            col,
        }
    }

    /// Half-open containment, except that under
    /// [`BoundaryMode::InclusiveMax`] a max edge coinciding with the global
    /// extent's max edge also accepts the coordinate sitting exactly on it.
    fn quadrant_contains(
        &self,
        rect: &BoundingRect,
        global: &BoundingRect,
        x: f64,
        y: f64,
    ) -> bool {
        let inclusive = self.boundary == BoundaryMode::InclusiveMax;
        let x_ok = x >= rect.min_x()
            && (x < rect.max_x() || (inclusive && x == rect.max_x() && x == global.max_x()));
        let y_ok = y >= rect.min_y()
            && (y < rect.max_y() || (inclusive && y == rect.max_y() && y == global.max_y()));
        x_ok && y_ok
    }
}
