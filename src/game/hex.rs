//! Offset hex coordinates (odd-r) for the bubble field.
//!
//! Based on Red Blob Games' guide:
//! https://www.redblobgames.com/grids/hexagons/
//!
//! "Pointy-top" hexes with "odd-r" offset coordinates: every odd row is
//! shifted right by half a cell, giving the brick-wall layout of a bubble
//! shooter. Field space has its origin at the top-left corner of the
//! ceiling, x grows to the right and y grows downward toward the shooter.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

pub(super) fn plugin(app: &mut App) {
    app.register_type::<HexCoord>();
}

/// Square root of 3, used frequently in hex math.
pub const SQRT_3: f32 = 1.732_050_8;

/// The outer radius of each cell in pixels (center to vertex).
pub const HEX_SIZE: f32 = 20.0;

/// Horizontal distance between two cell centers in the same row.
pub const CELL_WIDTH: f32 = HEX_SIZE * SQRT_3;

/// Vertical distance between two rows.
pub const ROW_HEIGHT: f32 = HEX_SIZE * 1.5;

/// A cell of the bubble grid in odd-r offset coordinates.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Reflect, Serialize, Deserialize,
)]
pub struct HexCoord {
    /// Row, 0 is the anchored ceiling row.
    pub row: i32,
    /// Column, increases to the right.
    pub col: i32,
}

impl HexCoord {
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    #[inline]
    pub const fn is_odd_row(&self) -> bool {
        self.row & 1 == 1
    }

    /// All 6 neighbouring cells, occupied or not.
    ///
    /// Horizontal neighbours are always `col ± 1`; the diagonal ones depend
    /// on row parity because odd rows are shifted right.
    pub fn neighbors(&self) -> [HexCoord; 6] {
        let (r, c) = (self.row, self.col);
        if self.is_odd_row() {
            [
                HexCoord::new(r, c + 1),     // East
                HexCoord::new(r - 1, c + 1), // Northeast
                HexCoord::new(r - 1, c),     // Northwest
                HexCoord::new(r, c - 1),     // West
                HexCoord::new(r + 1, c),     // Southwest
                HexCoord::new(r + 1, c + 1), // Southeast
            ]
        } else {
            [
                HexCoord::new(r, c + 1),     // East
                HexCoord::new(r - 1, c),     // Northeast
                HexCoord::new(r - 1, c - 1), // Northwest
                HexCoord::new(r, c - 1),     // West
                HexCoord::new(r + 1, c - 1), // Southwest
                HexCoord::new(r + 1, c),     // Southeast
            ]
        }
    }

    /// Cube coordinates `(x, y, z)` with `x + y + z = 0`.
    fn to_cube(self) -> (i32, i32, i32) {
        let x = self.col - (self.row - (self.row & 1)) / 2;
        let z = self.row;
        (x, -x - z, z)
    }

    /// Number of steps between two cells.
    pub fn distance(&self, other: HexCoord) -> i32 {
        let (ax, ay, az) = self.to_cube();
        let (bx, by, bz) = other.to_cube();
        ((ax - bx).abs() + (ay - by).abs() + (az - bz).abs()) / 2
    }

    /// Center of this cell in field space.
    pub fn to_pixel(&self) -> Vec2 {
        let row_offset = if self.is_odd_row() { 0.5 } else { 0.0 };
        let x = CELL_WIDTH * (self.col as f32 + 0.5 + row_offset);
        let y = HEX_SIZE + ROW_HEIGHT * self.row as f32;
        Vec2::new(x, y)
    }

    /// The cell whose center is nearest to a field-space position.
    ///
    /// Row first, then the column with the parity correction.
    pub fn from_pixel(pos: Vec2) -> Self {
        let row = ((pos.y - HEX_SIZE) / ROW_HEIGHT).round() as i32;
        let row_offset = if row & 1 == 1 { 0.5 } else { 0.0 };
        let col = (pos.x / CELL_WIDTH - 0.5 - row_offset).round() as i32;
        Self { row, col }
    }
}

impl std::fmt::Display for HexCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neighbors_are_adjacent() {
        for coord in [HexCoord::new(2, 3), HexCoord::new(3, 3)] {
            for n in coord.neighbors() {
                assert_eq!(coord.distance(n), 1, "{coord} -> {n}");
            }
        }
    }

    #[test]
    fn test_neighbors_are_symmetric() {
        let coord = HexCoord::new(5, 4);
        for n in coord.neighbors() {
            assert!(n.neighbors().contains(&coord));
        }
    }

    #[test]
    fn test_vertical_neighbors_alternate_by_parity() {
        let even = HexCoord::new(2, 3).neighbors();
        assert!(even.contains(&HexCoord::new(1, 2)));
        assert!(even.contains(&HexCoord::new(1, 3)));

        let odd = HexCoord::new(3, 3).neighbors();
        assert!(odd.contains(&HexCoord::new(2, 3)));
        assert!(odd.contains(&HexCoord::new(2, 4)));
    }

    #[test]
    fn test_pixel_roundtrip() {
        for original in [HexCoord::new(2, 5), HexCoord::new(3, 3), HexCoord::new(0, 0)] {
            assert_eq!(HexCoord::from_pixel(original.to_pixel()), original);
        }
    }

    #[test]
    fn test_distance_two_rings() {
        let center = HexCoord::new(4, 4);
        assert_eq!(center.distance(center), 0);
        assert_eq!(center.distance(HexCoord::new(4, 6)), 2);
        assert_eq!(center.distance(HexCoord::new(2, 4)), 2);
    }
}
