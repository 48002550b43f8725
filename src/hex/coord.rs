//! Cube hex coordinates for flat-topped hexagons
//!
//! A coordinate is the triple (i, j, k) with i + j + k = 0. Only (i, j) are
//! stored; k is always derived so the invariant cannot be broken.

use serde::{Deserialize, Serialize};

/// Flat-topped hex squish factor, sqrt(3) / 2
pub const HEX_SQUISH: f64 = 0.866_025_403_784_438_6;

/// Canonical neighbor offsets in (i, j), ordered by angle 30°, 90°, ..., 330°
pub const NEIGHBOR_OFFSETS: [(i32, i32); 6] = [(1, 0), (0, 1), (-1, 1), (-1, 0), (0, -1), (1, -1)];

/// Cube hex coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HexCoordinate {
    pub i: i32,
    pub j: i32,
}

impl HexCoordinate {
    pub const fn new(i: i32, j: i32) -> Self {
        Self { i, j }
    }

    /// Build from a full cube triple, rejecting triples that do not sum to zero
    pub fn from_cube(i: i32, j: i32, k: i32) -> Option<Self> {
        (i + j + k == 0).then_some(Self { i, j })
    }

    pub fn k(&self) -> i32 {
        -self.i - self.j
    }

    pub fn to_cube(&self) -> (i32, i32, i32) {
        (self.i, self.j, self.k())
    }

    /// Cartesian projection of the hex center
    pub fn cartesian(&self) -> (f64, f64) {
        let i = self.i as f64;
        let j = self.j as f64;
        (1.5 * i, 2.0 * HEX_SQUISH * j + HEX_SQUISH * i)
    }

    /// Nearest hex to a cartesian point (inverse of `cartesian`)
    pub fn from_cartesian(x: f64, y: f64) -> Self {
        let i = x / 1.5;
        let j = (y - HEX_SQUISH * i) / (2.0 * HEX_SQUISH);
        round_cube(i, j, -i - j)
    }

    /// |i| + |j| + |k|, twice the distance to the origin
    pub fn magnitude(&self) -> i32 {
        self.i.abs() + self.j.abs() + self.k().abs()
    }

    /// Distance in hex steps
    pub fn distance(&self, other: &HexCoordinate) -> i32 {
        let di = (self.i - other.i).abs();
        let dj = (self.j - other.j).abs();
        let dk = (self.k() - other.k()).abs();
        (di + dj + dk) / 2
    }

    /// The 6 adjacent coordinates in canonical angular order
    pub fn neighbors(&self) -> [HexCoordinate; 6] {
        NEIGHBOR_OFFSETS.map(|(di, dj)| HexCoordinate::new(self.i + di, self.j + dj))
    }
}

/// Round fractional cube coordinates to the nearest valid hex.
///
/// The axis with the largest rounding error is recomputed from the other two
/// so that i + j + k = 0 holds exactly.
pub fn round_cube(i: f64, j: f64, k: f64) -> HexCoordinate {
    let mut ri = i.round();
    let mut rj = j.round();
    let rk = k.round();

    let i_diff = (ri - i).abs();
    let j_diff = (rj - j).abs();
    let k_diff = (rk - k).abs();

    if i_diff > j_diff && i_diff > k_diff {
        ri = -rj - rk;
    } else if j_diff > k_diff {
        rj = -ri - rk;
    }
    // Otherwise k absorbs the error and is implied by (i, j).

    HexCoordinate::new(ri as i32, rj as i32)
}
