//! Iterative Hilbert curve encoding over a virtual `2^D x 2^D` grid.
//!
//! The encoder maps integer grid coordinates to the distance along a Hilbert
//! space-filling curve, bit-serially from the most significant level down.
//! At each level the 2-bit quadrant digit is appended to the running
//! distance, then the remaining low-order coordinate bits are rotated and
//! reflected into the canonical orientation so the same rule applies at the
//! next level. Consecutive distances land on edge-adjacent grid cells, which
//! is the locality property the composite key relies on.

use crate::error::{IndexError, Result};

/// Map a real coordinate into `[0, side - 1]` against a reference interval.
///
/// Floor-based bucketing so a coordinate maps to the cell whose low edge it
/// sits on. The result is clamped to the grid's valid range; the clamp is
/// intentional and handles coordinates exactly at `max`. A degenerate
/// interval maps everything to cell 0.
pub fn grid_coordinate(coord: f64, min: f64, max: f64, side: u32) -> u32 {
    if side == 0 || max - min <= 0.0 {
        return 0;
    }
    let normalized = (coord - min) / (max - min) * f64::from(side);
    let cell = normalized.floor();
    if cell < 0.0 {
        0
    } else if cell >= f64::from(side) {
        side - 1
    } else {
        cell as u32
    }
}

/// Encode grid coordinates as a Hilbert curve distance.
///
/// `side` is the grid side length `2^order`; the result is a
/// `2 * order`-bit unsigned integer. Identical inputs always produce the
/// identical distance.
///
/// # Errors
///
/// Returns [`IndexError::InvalidGridCoordinate`] if `side` is not a power of
/// two or either coordinate lies outside `[0, side - 1]`. Out-of-range
/// inputs never wrap.
pub fn xy_to_code(x: u32, y: u32, side: u32) -> Result<u64> {
    validate_grid(x, y, side)?;

    let (mut x, mut y) = (x, y);
    let mut d: u64 = 0;
    let mut s = side >> 1;
    while s > 0 {
        let rx = u32::from(x & s > 0);
        let ry = u32::from(y & s > 0);
        // Quadrant digit for this level, appended as the next 2 bits of d.
        d += u64::from(s) * u64::from(s) * u64::from((3 * rx) ^ ry);
        rotate(side, &mut x, &mut y, rx, ry);
        s >>= 1;
    }
    Ok(d)
}

/// Decode a Hilbert curve distance back to grid coordinates.
///
/// Inverse of [`xy_to_code`] for the same `side`.
///
/// # Errors
///
/// Returns [`IndexError::InvalidGridCoordinate`] if `side` is not a power of
/// two, or [`IndexError::InvalidHilbertCode`] if `code >= side^2`.
pub fn code_to_xy(code: u64, side: u32) -> Result<(u32, u32)> {
    if !side.is_power_of_two() {
        return Err(IndexError::InvalidGridCoordinate { x: 0, y: 0, side });
    }
    if code >= u64::from(side) * u64::from(side) {
        return Err(IndexError::InvalidHilbertCode { code, side });
    }

    let (mut x, mut y) = (0u32, 0u32);
    let mut t = code;
    let mut s = 1u32;
    while s < side {
        let rx = 1 & (t >> 1) as u32;
        let ry = 1 & (t as u32 ^ rx);
        rotate(s, &mut x, &mut y, rx, ry);
        x += s * rx;
        y += s * ry;
        t >>= 2;
        s <<= 1;
    }
    Ok((x, y))
}

/// Rotate/reflect a quadrant into the canonical orientation.
///
/// When the level's y-bit is clear the quadrant is entered sideways: reflect
/// about the anti-diagonal for the right-hand quadrant, then swap the axes.
fn rotate(n: u32, x: &mut u32, y: &mut u32, rx: u32, ry: u32) {
    if ry == 0 {
        if rx == 1 {
            *x = n - 1 - *x;
            *y = n - 1 - *y;
        }
        std::mem::swap(x, y);
    }
}

fn validate_grid(x: u32, y: u32, side: u32) -> Result<()> {
    if !side.is_power_of_two() || x >= side || y >= side {
        return Err(IndexError::InvalidGridCoordinate { x, y, side });
    }
    Ok(())
}
