//! Composite spatio-temporal key assembly.
//!
//! This is the thin external-facing layer: it groups records by numeric
//! time-bin id, partitions and orders each bucket spatially, and hands
//! `(composite key, record)` pairs to an ordered key-value table. Keys sort
//! byte-lexicographically in `(time bin, hilbert code)` order, so a range
//! scan over keys is a scan over time-then-space locality.

use crate::error::{IndexError, Result};
use crate::geometry::BoundingRect;
use crate::partition::Partitioner;
use crate::registry::encode_subspaces;
use crate::temporal::TimeBinEncoder;
use crate::types::{IndexConfig, SpatialPoint, Trajectory};
use bytes::Bytes;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::ops::Bound;

/// Records stored under one composite key. Distinct records can
/// legitimately collide on the same minimal cell and time bin.
pub type RecordSet = SmallVec<[SpatialPoint; 2]>;

/// Render the composite key `<time-bin-id>::<hilbert-code>`.
///
/// Both fields are zero-padded to 20 digits, wide enough for any `i64` or
/// `u64` value, so the byte-lexicographic order of keys equals the
/// `(time_bin, hilbert_code)` tuple order. The time bin must be
/// non-negative; the build paths reject records that would produce a
/// negative bin before reaching this point.
pub fn composite_key(time_bin: i64, hilbert_code: u64) -> String {
    debug_assert!(time_bin >= 0, "negative time bins cannot be key-encoded");
    format!("{time_bin:020}::{hilbert_code:020}")
}

/// An ordered key-value sink for composite keys.
///
/// Keys are appended, not overwritten: the core does not guarantee key
/// uniqueness, so the table keeps every record stored under a key. The
/// primary read contract is an inclusive range scan over the
/// lexicographically ordered key space.
pub trait IndexTable {
    /// Store a record under a key, keeping earlier records for that key.
    fn append(&mut self, key: Bytes, record: SpatialPoint) -> Result<()>;

    /// Scan keys in `[start, end]` in ascending byte order.
    fn range_scan(&self, start: &[u8], end: &[u8]) -> Result<Vec<(Bytes, RecordSet)>>;

    /// Number of distinct keys.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory index table backed by an ordered map.
#[derive(Debug, Clone, Default)]
pub struct MemoryTable {
    entries: BTreeMap<Bytes, RecordSet>,
}

impl MemoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// All entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&Bytes, &RecordSet)> {
        self.entries.iter()
    }

    /// Total number of stored records across all keys.
    pub fn record_count(&self) -> usize {
        self.entries.values().map(|set| set.len()).sum()
    }
}

impl IndexTable for MemoryTable {
    fn append(&mut self, key: Bytes, record: SpatialPoint) -> Result<()> {
        self.entries.entry(key).or_default().push(record);
        Ok(())
    }

    fn range_scan(&self, start: &[u8], end: &[u8]) -> Result<Vec<(Bytes, RecordSet)>> {
        // An inverted range contains no keys.
        if start > end {
            return Ok(Vec::new());
        }
        let start = Bytes::copy_from_slice(start);
        let end = Bytes::copy_from_slice(end);
        Ok(self
            .entries
            .range((Bound::Included(start), Bound::Included(end)))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Statistics from one index build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildStats {
    /// Records written to the table.
    pub records_indexed: usize,
    /// Records excluded because the global extent does not contain them.
    pub records_dropped: usize,
    /// Temporal buckets processed.
    pub buckets: usize,
    /// Leaf subspaces produced across all buckets.
    pub subspaces: usize,
}

/// Batch builder for the composite spatio-temporal index.
///
/// Owns the configured partitioner and time-bin encoder plus an internal
/// in-memory table; batches can also be driven into any external
/// [`IndexTable`].
///
/// # Example
///
/// ```rust
/// use sthilbert::{BoundingRect, IndexConfig, SpatialPoint, StIndex};
///
/// let config = IndexConfig::default()
///     .with_density_threshold(1.0)
///     .with_max_depth(3);
/// let index = StIndex::new(config)?;
///
/// let extent = BoundingRect::new(0.0, 0.0, 8.0, 8.0)?;
/// let records = vec![
///     SpatialPoint::new(0.5, 0.5, 0, "a"),
///     SpatialPoint::new(6.5, 6.5, 0, "b"),
/// ];
/// let stats = index.build(records, &extent)?;
/// assert_eq!(stats.records_indexed, 2);
/// # Ok::<(), sthilbert::IndexError>(())
/// ```
pub struct StIndex {
    config: IndexConfig,
    partitioner: Partitioner,
    bins: TimeBinEncoder,
    table: RwLock<MemoryTable>,
}

impl StIndex {
    /// Create an index builder from a validated configuration.
    pub fn new(config: IndexConfig) -> Result<Self> {
        config.validate()?;
        let partitioner = Partitioner::new(config.density_threshold, config.max_depth)?
            .with_boundary(config.boundary);
        let bins = TimeBinEncoder::new(config.period_ms, config.max_span)?;
        Ok(Self {
            config,
            partitioner,
            bins,
            table: RwLock::new(MemoryTable::new()),
        })
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Index a batch of point records into the internal table.
    pub fn build(&self, records: Vec<SpatialPoint>, extent: &BoundingRect) -> Result<BuildStats> {
        let mut table = self.table.write();
        self.build_into(records, extent, &mut *table)
    }

    /// Index a batch of point records into an external table.
    ///
    /// Each record's bucket is the zero-span bin of its own timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::InvalidTimestamp`] for a record whose
    /// timestamp maps to a negative bin (the key encoding assumes bins
    /// from the epoch forward), [`IndexError::DegenerateExtent`] for a
    /// zero-area extent, plus any error the table reports.
    pub fn build_into(
        &self,
        records: Vec<SpatialPoint>,
        extent: &BoundingRect,
        table: &mut dyn IndexTable,
    ) -> Result<BuildStats> {
        let mut buckets: FxHashMap<i64, Vec<SpatialPoint>> = FxHashMap::default();
        for record in records {
            let bin = self.bins.encode_timestamp(record.timestamp_ms);
            if bin < 0 {
                return Err(IndexError::InvalidTimestamp(record.timestamp_ms));
            }
            buckets.entry(bin).or_default().push(record);
        }
        self.build_buckets(buckets, extent, table)
    }

    /// Index whole trajectories into the internal table.
    pub fn build_trajectories(
        &self,
        trajectories: Vec<Trajectory>,
        extent: &BoundingRect,
    ) -> Result<BuildStats> {
        let mut table = self.table.write();
        self.build_trajectories_into(trajectories, extent, &mut *table)
    }

    /// Index whole trajectories into an external table.
    ///
    /// A trajectory's bin id is computed once from its cached
    /// `[start, end]` span; all of its points are indexed under that bin.
    /// Points without an owning trajectory id inherit the trajectory's.
    pub fn build_trajectories_into(
        &self,
        trajectories: Vec<Trajectory>,
        extent: &BoundingRect,
        table: &mut dyn IndexTable,
    ) -> Result<BuildStats> {
        let mut buckets: FxHashMap<i64, Vec<SpatialPoint>> = FxHashMap::default();
        for trajectory in trajectories {
            let bin = self.bins.encode_trajectory(&trajectory);
            if bin < 0 {
                return Err(IndexError::InvalidTimestamp(trajectory.start_ms()));
            }
            let id = trajectory.id().to_string();
            let bucket = buckets.entry(bin).or_default();
            for mut point in trajectory.into_points() {
                if point.trajectory_id.is_none() {
                    point.trajectory_id = Some(id.clone());
                }
                bucket.push(point);
            }
        }
        self.build_buckets(buckets, extent, table)
    }

    fn build_buckets(
        &self,
        buckets: FxHashMap<i64, Vec<SpatialPoint>>,
        extent: &BoundingRect,
        table: &mut dyn IndexTable,
    ) -> Result<BuildStats> {
        let mut stats = BuildStats::default();

        // Process buckets in bin order so table appends and logs are
        // deterministic across runs.
        let mut buckets: Vec<_> = buckets.into_iter().collect();
        buckets.sort_by_key(|(bin, _)| *bin);

        for (bin, bucket) in buckets {
            let outcome = self.partitioner.partition(bucket, extent)?;
            let dropped = outcome.dropped_count();
            stats.records_dropped += dropped;

            let coded = encode_subspaces(outcome.leaves, self.config.max_depth)?;
            stats.subspaces += coded.len();
            log::debug!(
                "bucket {}: {} subspace(s), {} record(s) dropped",
                bin,
                coded.len(),
                dropped
            );

            for cell in coded {
                let key = Bytes::from(composite_key(bin, cell.code));
                for record in cell.subspace.into_records() {
                    table.append(key.clone(), record)?;
                    stats.records_indexed += 1;
                }
            }
            stats.buckets += 1;
        }
        Ok(stats)
    }

    /// Inclusive range scan over the internal table.
    pub fn range_scan(&self, start: &[u8], end: &[u8]) -> Result<Vec<(Bytes, RecordSet)>> {
        self.table.read().range_scan(start, end)
    }

    /// Number of distinct composite keys in the internal table.
    pub fn key_count(&self) -> usize {
        self.table.read().len()
    }

    /// Total records stored in the internal table.
    pub fn record_count(&self) -> usize {
        self.table.read().record_count()
    }
}
