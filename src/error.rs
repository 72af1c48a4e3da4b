//! Error types for index construction and encoding.

use thiserror::Error;

/// Errors raised by the spatio-temporal index core.
///
/// All failures are local and synchronous: the core performs no I/O, so
/// nothing is retried internally. Callers driving batches decide whether to
/// retry or exclude the offending input.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndexError {
    /// A rectangle was constructed with `min > max` on an axis.
    #[error("invalid bounds: min ({min_x}, {min_y}) exceeds max ({max_x}, {max_y})")]
    InvalidBounds {
        min_x: f64,
        min_y: f64,
        max_x: f64,
        max_y: f64,
    },

    /// The global extent has zero width or height and cannot host a grid.
    #[error("degenerate extent: width {width} and height {height} must both be positive")]
    DegenerateExtent { width: f64, height: f64 },

    /// Grid inputs outside `[0, side - 1]`, or a side that is not a power of two.
    #[error("invalid grid coordinate ({x}, {y}) for grid side {side}")]
    InvalidGridCoordinate { x: u32, y: u32, side: u32 },

    /// A curve distance outside `[0, side^2 - 1]` passed to the decoder.
    #[error("hilbert code {code} out of range for grid side {side}")]
    InvalidHilbertCode { code: u64, side: u32 },

    /// A non-positive threshold, depth, period, or span.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A timestamp the temporal encoders cannot represent (e.g. pre-epoch
    /// input to the calendar-based key scheme).
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(i64),

    /// A trajectory with no points.
    #[error("trajectory '{0}' has no points")]
    EmptyTrajectory(String),
}

/// Result type alias for index operations.
pub type Result<T> = std::result::Result<T, IndexError>;
