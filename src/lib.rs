//! Composite spatio-temporal indexing with density-adaptive partitioning and
//! Hilbert-curve ordering.
//!
//! Records are grouped into temporal buckets, each bucket's spatial extent is
//! recursively split until local density falls below a threshold, leaf cells
//! are linearized along a Hilbert curve, and every record is stored under a
//! lexicographically ordered `<time-bin>::<hilbert-code>` key.
//!
//! ```rust
//! use sthilbert::{BoundingRect, IndexConfig, SpatialPoint, StIndex};
//!
//! let config = IndexConfig::default()
//!     .with_density_threshold(4.0)
//!     .with_max_depth(6);
//! let index = StIndex::new(config)?;
//!
//! let extent = BoundingRect::new(-180.0, -90.0, 180.0, 90.0)?;
//! let records = vec![
//!     SpatialPoint::new(-74.0060, 40.7128, 1_640_995_200_000, "NYC"),
//!     SpatialPoint::new(2.3522, 48.8566, 1_640_995_200_000, "Paris"),
//! ];
//! let stats = index.build(records, &extent)?;
//! assert_eq!(stats.records_indexed, 2);
//! # Ok::<(), sthilbert::IndexError>(())
//! ```

pub mod error;
pub mod geometry;
pub mod hilbert;
pub mod index;
pub mod partition;
pub mod registry;
pub mod temporal;
pub mod types;

pub use error::{IndexError, Result};

pub use geometry::BoundingRect;

pub use geo::Point;

pub use types::{BoundaryMode, IndexConfig, SpatialPoint, Trajectory};

pub use hilbert::{code_to_xy, grid_coordinate, xy_to_code};

pub use partition::{DensityMetric, PartitionOutcome, Partitioner, PointCount, Subspace};

pub use registry::{CodedSubspace, encode_subspaces};

pub use temporal::{MultiScaleTimeKey, TimeBinEncoder};

pub use index::{BuildStats, IndexTable, MemoryTable, RecordSet, StIndex, composite_key};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{IndexError, Result};

    pub use crate::{BoundingRect, Point};

    pub use crate::{BoundaryMode, IndexConfig, SpatialPoint, Trajectory};

    pub use crate::{IndexTable, MemoryTable, StIndex};

    pub use crate::{MultiScaleTimeKey, TimeBinEncoder};
}
