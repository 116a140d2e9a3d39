//! A region: two inclusive corners bounding a capture or placement volume.
//!
//! Unlike the teacher's `Region`, which owns a dense voxel buffer, this
//! `Region` is a pure value type — it only describes *where*, never *what*.
//! Piece splitting and capture produce the payload separately (see
//! [`crate::builder`]).

use crate::error::{LseError, Result};
use serde::{Deserialize, Serialize};

/// Signed-integer ceiling division. `i32::div_ceil` is still gated behind the
/// unstable `int_roundings` feature on stable Rust; this mirrors its exact
/// semantics (quotient rounded toward positive infinity).
fn div_ceil_i32(lhs: i32, rhs: i32) -> i32 {
    let d = lhs / rhs;
    let r = lhs % rhs;
    if (r > 0 && rhs > 0) || (r < 0 && rhs < 0) {
        d + 1
    } else {
        d
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    min: (i32, i32, i32),
    max: (i32, i32, i32),
}

impl Region {
    /// Normalizes the two corners so `min <= max` on every axis.
    pub fn from_corners(a: (i32, i32, i32), b: (i32, i32, i32)) -> Self {
        Region {
            min: (a.0.min(b.0), a.1.min(b.1), a.2.min(b.2)),
            max: (a.0.max(b.0), a.1.max(b.1), a.2.max(b.2)),
        }
    }

    pub fn min(&self) -> (i32, i32, i32) {
        self.min
    }

    pub fn max(&self) -> (i32, i32, i32) {
        self.max
    }

    pub fn size(&self) -> (i32, i32, i32) {
        (
            self.max.0 - self.min.0 + 1,
            self.max.1 - self.min.1 + 1,
            self.max.2 - self.min.2 + 1,
        )
    }

    pub fn volume(&self) -> i64 {
        let (sx, sy, sz) = self.size();
        sx as i64 * sy as i64 * sz as i64
    }

    pub fn contains(&self, pos: (i32, i32, i32)) -> bool {
        pos.0 >= self.min.0
            && pos.0 <= self.max.0
            && pos.1 >= self.min.1
            && pos.1 <= self.max.1
            && pos.2 >= self.min.2
            && pos.2 <= self.max.2
    }

    /// Fails with [`LseError::OversizedPiece`] if any axis exceeds `limit`.
    pub fn validate_single_piece_size(&self, limit: i32) -> Result<()> {
        let (sx, sy, sz) = self.size();
        for size in [sx, sy, sz] {
            if size > limit {
                return Err(LseError::OversizedPiece { size, limit });
            }
        }
        Ok(())
    }

    /// Splits this region into a grid of sub-regions no larger than
    /// `piece_size_x`/`piece_size_z` on X/Z respectively (Y is never split —
    /// vertical extent is assumed to already fit within the piece-size cube
    /// per spec.md §4.3). Remainder pieces land on the far edge of each
    /// axis, so pieces are not all the same size when the region doesn't
    /// divide evenly.
    pub fn split_into_grid(&self, piece_size_x: i32, piece_size_z: i32) -> Vec<((i32, i32, i32), Region)> {
        let (sx, _sy, sz) = self.size();
        let cols = div_ceil_i32(sx, piece_size_x);
        let rows = div_ceil_i32(sz, piece_size_z);

        let mut pieces = Vec::with_capacity((cols * rows) as usize);
        for gx in 0..cols {
            for gz in 0..rows {
                let x0 = self.min.0 + gx * piece_size_x;
                let x1 = (x0 + piece_size_x - 1).min(self.max.0);
                let z0 = self.min.2 + gz * piece_size_z;
                let z1 = (z0 + piece_size_z - 1).min(self.max.2);
                let piece = Region::from_corners((x0, self.min.1, z0), (x1, self.max.1, z1));
                pieces.push(((gx, 0, gz), piece));
            }
        }
        pieces
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corners_normalize_regardless_of_order() {
        let r = Region::from_corners((5, 5, 5), (0, 10, -5));
        assert_eq!(r.min(), (0, 5, -5));
        assert_eq!(r.max(), (5, 10, 5));
    }

    #[test]
    fn size_and_volume() {
        let r = Region::from_corners((0, 0, 0), (9, 9, 9));
        assert_eq!(r.size(), (10, 10, 10));
        assert_eq!(r.volume(), 1000);
    }

    #[test]
    fn single_piece_validation_rejects_oversized_axis() {
        let r = Region::from_corners((0, 0, 0), (48, 10, 10));
        assert!(r.validate_single_piece_size(48).is_err());
        let r2 = Region::from_corners((0, 0, 0), (47, 10, 10));
        assert!(r2.validate_single_piece_size(48).is_ok());
    }

    #[test]
    fn grid_split_covers_region_with_remainder_pieces() {
        let r = Region::from_corners((0, 0, 0), (100, 10, 49));
        let pieces = r.split_into_grid(48, 48);
        // 101 wide -> 3 columns (48, 48, 5); 50 deep -> 2 rows (48, 2)
        assert_eq!(pieces.len(), 6);
        let total_volume: i64 = pieces.iter().map(|(_, p)| p.volume()).sum();
        assert_eq!(total_volume, r.volume());
    }
}
