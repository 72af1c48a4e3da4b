//! Record types and index configuration.
//!
//! This module provides the positioned record types consumed by the
//! partitioner and the serializable configuration that drives index builds.

use crate::error::{IndexError, Result};
use crate::geometry::BoundingRect;
use bytes::Bytes;
use geo::Point;
use serde::de::Error;
use serde::{Deserialize, Serialize};

/// A positioned record: a point in space with an event timestamp, an opaque
/// payload, and optional foreign identifiers.
///
/// Timestamps are UTC epoch milliseconds so that every caller sees a single
/// canonical ordering. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialPoint {
    /// Position (longitude `x`, latitude `y`).
    pub point: Point,
    /// Event timestamp in UTC epoch milliseconds.
    pub timestamp_ms: i64,
    /// Opaque payload carried through to the index table.
    pub payload: Bytes,
    /// Owning trajectory, if any.
    pub trajectory_id: Option<String>,
    /// Point-of-interest identifier, if any.
    pub poi_id: Option<String>,
    /// User identifier, if any.
    pub user_id: Option<String>,
}

impl SpatialPoint {
    /// Create a bare record with no foreign identifiers.
    pub fn new(x: f64, y: f64, timestamp_ms: i64, payload: impl Into<Bytes>) -> Self {
        Self {
            point: Point::new(x, y),
            timestamp_ms,
            payload: payload.into(),
            trajectory_id: None,
            poi_id: None,
            user_id: None,
        }
    }

    /// Attach an owning trajectory identifier.
    pub fn with_trajectory_id(mut self, id: impl Into<String>) -> Self {
        self.trajectory_id = Some(id.into());
        self
    }

    /// Attach a point-of-interest identifier.
    pub fn with_poi_id(mut self, id: impl Into<String>) -> Self {
        self.poi_id = Some(id.into());
        self
    }

    /// Attach a user identifier.
    pub fn with_user_id(mut self, id: impl Into<String>) -> Self {
        self.user_id = Some(id.into());
        self
    }

    pub fn x(&self) -> f64 {
        self.point.x()
    }

    pub fn y(&self) -> f64 {
        self.point.y()
    }
}

/// An ordered, non-empty sequence of points sharing an identifier.
///
/// The bounding rectangle and time span are computed once at construction
/// and cached; the point sequence is not mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    id: String,
    points: Vec<SpatialPoint>,
    rect: BoundingRect,
    start_ms: i64,
    end_ms: i64,
}

impl Trajectory {
    /// Build a trajectory from its points.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::EmptyTrajectory`] if `points` is empty.
    pub fn new(id: impl Into<String>, points: Vec<SpatialPoint>) -> Result<Self> {
        let id = id.into();
        let rect = BoundingRect::from_points(points.iter().map(|p| p.point))
            .ok_or_else(|| IndexError::EmptyTrajectory(id.clone()))?;
        let start_ms = points.iter().map(|p| p.timestamp_ms).min().unwrap_or(0);
        let end_ms = points.iter().map(|p| p.timestamp_ms).max().unwrap_or(0);
        Ok(Self {
            id,
            points,
            rect,
            start_ms,
            end_ms,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn points(&self) -> &[SpatialPoint] {
        &self.points
    }

    /// Consume the trajectory, yielding its points.
    pub fn into_points(self) -> Vec<SpatialPoint> {
        self.points
    }

    /// Minimum bounding rectangle over all points.
    pub fn bounding_rect(&self) -> &BoundingRect {
        &self.rect
    }

    pub fn start_ms(&self) -> i64 {
        self.start_ms
    }

    pub fn end_ms(&self) -> i64 {
        self.end_ms
    }

    /// Number of points; the default density proxy for partitioning.
    pub fn point_count(&self) -> usize {
        self.points.len()
    }
}

/// How the partitioner treats points sitting exactly on the global extent's
/// max X or Y edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryMode {
    /// Strict half-open containment everywhere. Points exactly on the global
    /// max edge belong to no cell; they are diverted to the dropped set and
    /// counted. This is the default.
    #[default]
    HalfOpen,
    /// The global extent's own max edges are inclusive: a point on the max
    /// X/Y boundary belongs to the cell owning that edge.
    InclusiveMax,
}

/// Configuration for index construction.
///
/// Serializable so it can be loaded from JSON alongside the rest of an
/// application's settings.
///
/// # Example
///
/// ```rust
/// use sthilbert::IndexConfig;
///
/// let json = r#"{
///     "density_threshold": 8.0,
///     "max_depth": 10,
///     "period_ms": 1800000,
///     "max_span": 48,
///     "boundary": "inclusive_max"
/// }"#;
/// let config = IndexConfig::from_json(json).unwrap();
/// assert_eq!(config.max_depth, 10);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Density threshold θ: a cell with aggregate density at or below this
    /// value stops subdividing.
    #[serde(default = "IndexConfig::default_density_threshold")]
    pub density_threshold: f64,

    /// Maximum partition depth D; the virtual grid has side `2^D`.
    #[serde(default = "IndexConfig::default_max_depth")]
    pub max_depth: u8,

    /// Time-period length P in milliseconds (default: 30 minutes).
    #[serde(default = "IndexConfig::default_period_ms")]
    pub period_ms: i64,

    /// Maximum time-bin span N in periods (default: 48, one day of
    /// 30-minute periods).
    #[serde(default = "IndexConfig::default_max_span")]
    pub max_span: i64,

    /// Treatment of the global extent's upper boundary.
    #[serde(default)]
    pub boundary: BoundaryMode,
}

impl IndexConfig {
    const fn default_density_threshold() -> f64 {
        16.0
    }

    const fn default_max_depth() -> u8 {
        8
    }

    const fn default_period_ms() -> i64 {
        30 * 60 * 1000
    }

    const fn default_max_span() -> i64 {
        48
    }

    pub fn with_density_threshold(mut self, theta: f64) -> Self {
        self.density_threshold = theta;
        self
    }

    pub fn with_max_depth(mut self, depth: u8) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_period_ms(mut self, period_ms: i64) -> Self {
        self.period_ms = period_ms;
        self
    }

    pub fn with_max_span(mut self, max_span: i64) -> Self {
        self.max_span = max_span;
        self
    }

    pub fn with_boundary(mut self, boundary: BoundaryMode) -> Self {
        self.boundary = boundary;
        self
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Configuration`] for a non-positive threshold,
    /// depth, period, or span, or a depth that would overflow the grid.
    pub fn validate(&self) -> Result<()> {
        if !self.density_threshold.is_finite() || self.density_threshold <= 0.0 {
            return Err(IndexError::Configuration(format!(
                "density threshold must be a positive finite number, got {}",
                self.density_threshold
            )));
        }
        if self.max_depth == 0 {
            return Err(IndexError::Configuration(
                "max depth must be at least 1".to_string(),
            ));
        }
        if self.max_depth > 31 {
            return Err(IndexError::Configuration(format!(
                "max depth {} exceeds the supported grid order of 31",
                self.max_depth
            )));
        }
        if self.period_ms <= 0 {
            return Err(IndexError::Configuration(format!(
                "period length must be positive, got {} ms",
                self.period_ms
            )));
        }
        if self.max_span <= 0 {
            return Err(IndexError::Configuration(format!(
                "max span must be positive, got {}",
                self.max_span
            )));
        }
        Ok(())
    }

    /// Load configuration from a JSON string, validating the result.
    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        let config: IndexConfig = serde_json::from_str(json)?;
        if let Err(e) = config.validate() {
            return Err(Error::custom(e.to_string()));
        }
        Ok(config)
    }

    /// Save configuration as a JSON string.
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            density_threshold: Self::default_density_threshold(),
            max_depth: Self::default_max_depth(),
            period_ms: Self::default_period_ms(),
            max_span: Self::default_max_span(),
            boundary: BoundaryMode::default(),
        }
    }
}
