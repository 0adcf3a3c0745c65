//! The hexagonal grid that holds all bubbles.
//!
//! Sparse storage: only occupied cells are stored. The map is ordered so
//! that iteration, and therefore a seeded replay of a level, is
//! deterministic.

use bevy::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use thiserror::Error;

use super::{
    bubble::{Bubble, BubbleColor},
    hex::HexCoord,
};

pub(super) fn plugin(app: &mut App) {
    app.register_type::<GridBounds>();
}

/// Errors raised by grid mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("cell {0} is already occupied")]
    OccupiedCell(HexCoord),
    #[error("cell {0} is empty")]
    EmptyCell(HexCoord),
    #[error("cell {0} is outside the playfield")]
    OutOfBounds(HexCoord),
}

/// The playable area: `columns` cells wide and `rows` rows deep.
///
/// The last row is the danger row, a bubble settling there overflows the
/// board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub struct GridBounds {
    pub columns: i32,
    pub rows: i32,
}

impl Default for GridBounds {
    fn default() -> Self {
        Self {
            columns: 11,
            rows: 12,
        }
    }
}

impl GridBounds {
    pub const fn new(columns: i32, rows: i32) -> Self {
        Self { columns, rows }
    }

    pub fn contains(&self, coord: HexCoord) -> bool {
        (0..self.columns).contains(&coord.col) && (0..self.rows).contains(&coord.row)
    }

    /// Iterate over all valid cells, row by row.
    pub fn iter(&self) -> impl Iterator<Item = HexCoord> + use<> {
        let (columns, rows) = (self.columns, self.rows);
        (0..rows).flat_map(move |row| (0..columns).map(move |col| HexCoord::new(row, col)))
    }

    /// X position of the right wall in field space; the left wall is at 0.
    ///
    /// Odd rows stick out half a cell, so the field is half a cell wider
    /// than the columns alone.
    pub fn right_wall(&self) -> f32 {
        super::hex::CELL_WIDTH * (self.columns as f32 + 0.5)
    }
}

/// The bubble grid of one level.
#[derive(Debug, Clone, Default)]
pub struct BubbleGrid {
    bubbles: BTreeMap<HexCoord, Bubble>,
    bounds: GridBounds,
}

impl BubbleGrid {
    pub fn new(bounds: GridBounds) -> Self {
        Self {
            bubbles: BTreeMap::new(),
            bounds,
        }
    }

    /// A grid holding the given cells. Cells outside `bounds` are skipped
    /// and a repeated cell keeps its last color.
    pub fn from_cells(
        bounds: GridBounds,
        cells: impl IntoIterator<Item = (HexCoord, BubbleColor)>,
    ) -> Self {
        let bubbles = cells
            .into_iter()
            .filter(|(coord, _)| bounds.contains(*coord))
            .map(|(coord, color)| (coord, Bubble::new(coord, color)))
            .collect();
        Self { bubbles, bounds }
    }

    pub fn bounds(&self) -> GridBounds {
        self.bounds
    }

    pub fn is_occupied(&self, coord: HexCoord) -> bool {
        self.bubbles.contains_key(&coord)
    }

    /// A copy of the bubble at a position, if any.
    pub fn get(&self, coord: HexCoord) -> Option<Bubble> {
        self.bubbles.get(&coord).copied()
    }

    /// Put a bubble into an empty in-bounds cell.
    pub fn place(&mut self, coord: HexCoord, color: BubbleColor) -> Result<(), GridError> {
        if !self.bounds.contains(coord) {
            return Err(GridError::OutOfBounds(coord));
        }
        if self.is_occupied(coord) {
            return Err(GridError::OccupiedCell(coord));
        }
        self.bubbles.insert(coord, Bubble::new(coord, color));
        Ok(())
    }

    /// Take the bubble out of a cell.
    pub fn remove(&mut self, coord: HexCoord) -> Result<Bubble, GridError> {
        self.bubbles.remove(&coord).ok_or(GridError::EmptyCell(coord))
    }

    /// Set or clear the frozen flag of an occupied cell.
    pub fn set_frozen(&mut self, coord: HexCoord, frozen: bool) -> Result<(), GridError> {
        let bubble = self
            .bubbles
            .get_mut(&coord)
            .ok_or(GridError::EmptyCell(coord))?;
        bubble.frozen = frozen;
        Ok(())
    }

    /// The up to 6 adjacent cells, occupied or not.
    pub fn neighbors_of(&self, coord: HexCoord) -> [HexCoord; 6] {
        coord.neighbors()
    }

    /// Empty in-bounds neighbours of a cell.
    pub fn empty_neighbors(&self, coord: HexCoord) -> Vec<HexCoord> {
        coord
            .neighbors()
            .into_iter()
            .filter(|n| self.bounds.contains(*n) && !self.is_occupied(*n))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.bubbles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bubbles.is_empty()
    }

    /// Drop every bubble, keeping the bounds.
    pub fn clear(&mut self) {
        self.bubbles.clear();
    }

    /// Iterate over copies of all bubbles in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = Bubble> + '_ {
        self.bubbles.values().copied()
    }

    /// All occupied coordinates in row-major order.
    pub fn coords(&self) -> impl Iterator<Item = HexCoord> + '_ {
        self.bubbles.keys().copied()
    }

    /// Occupied cells of the anchored ceiling row.
    pub fn top_row_coords(&self) -> Vec<HexCoord> {
        self.coords().take_while(|c| c.row == 0).collect()
    }

    /// True when every ceiling cell holds a bubble.
    pub fn is_top_row_full(&self) -> bool {
        (0..self.bounds.columns).all(|col| self.is_occupied(HexCoord::new(0, col)))
    }

    /// The lowest row (highest index) that holds a bubble.
    pub fn lowest_row(&self) -> Option<i32> {
        self.bubbles.keys().map(|c| c.row).max()
    }

    /// Distinct colors still on the board, excluding frozen bubbles.
    pub fn colors_present(&self) -> Vec<BubbleColor> {
        self.iter()
            .filter(|b| !b.frozen)
            .map(|b| b.color)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Every cell of a column, top to bottom.
    pub fn column_cells(&self, col: i32) -> Vec<HexCoord> {
        (0..self.bounds.rows).map(|row| HexCoord::new(row, col)).collect()
    }

    /// Every cell of a row, left to right.
    pub fn row_cells(&self, row: i32) -> Vec<HexCoord> {
        (0..self.bounds.columns).map(|col| HexCoord::new(row, col)).collect()
    }

    /// Could a bubble rest in this empty cell? It must touch the ceiling or
    /// another bubble.
    fn is_attachable(&self, coord: HexCoord) -> bool {
        self.bounds.contains(coord)
            && !self.is_occupied(coord)
            && (coord.row == 0 || coord.neighbors().iter().any(|n| self.is_occupied(*n)))
    }

    /// The closest attachable empty cell to a field-space position.
    ///
    /// Starts at the cell under the position and searches outward ring by
    /// ring. The search is bounded by the playfield.
    pub fn closest_empty_cell(&self, pos: Vec2) -> Option<HexCoord> {
        let mut checked = HashSet::new();
        let under = HexCoord::from_pixel(pos);
        let start = HexCoord::new(
            under.row.clamp(0, self.bounds.rows - 1),
            under.col.clamp(0, self.bounds.columns - 1),
        );
        let mut ring = vec![start];

        while !ring.is_empty() {
            let mut found: Vec<HexCoord> = ring
                .iter()
                .copied()
                .filter(|c| self.is_attachable(*c))
                .collect();
            if !found.is_empty() {
                found.sort_by(|a, b| {
                    let da = a.to_pixel().distance_squared(pos);
                    let db = b.to_pixel().distance_squared(pos);
                    da.total_cmp(&db).then(a.cmp(b))
                });
                return found.first().copied();
            }

            checked.extend(ring.iter().copied());
            let mut next_ring = Vec::new();
            for coord in &ring {
                for neighbor in coord.neighbors() {
                    if self.in_search_area(neighbor)
                        && !checked.contains(&neighbor)
                        && !next_ring.contains(&neighbor)
                    {
                        next_ring.push(neighbor);
                    }
                }
            }
            ring = next_ring;
        }

        None
    }

    /// The playfield plus a one-cell margin, so a search that starts just
    /// outside the walls can still walk inward.
    fn in_search_area(&self, coord: HexCoord) -> bool {
        (-1..=self.bounds.columns).contains(&coord.col)
            && (-1..=self.bounds.rows).contains(&coord.row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_grid() -> BubbleGrid {
        BubbleGrid::new(GridBounds::new(5, 6))
    }

    #[test]
    fn test_place_rejects_occupied_cell() {
        let mut grid = small_grid();
        let coord = HexCoord::new(0, 2);
        grid.place(coord, BubbleColor::Red).unwrap();
        assert_eq!(
            grid.place(coord, BubbleColor::Blue),
            Err(GridError::OccupiedCell(coord))
        );
        assert_eq!(grid.get(coord).unwrap().color, BubbleColor::Red);
    }

    #[test]
    fn test_from_cells_skips_out_of_bounds() {
        let grid = BubbleGrid::from_cells(
            GridBounds::new(5, 6),
            [
                (HexCoord::new(0, 0), BubbleColor::Red),
                (HexCoord::new(0, 9), BubbleColor::Blue),
                (HexCoord::new(0, 0), BubbleColor::Green),
            ],
        );
        assert_eq!(grid.len(), 1);
        assert_eq!(grid.get(HexCoord::new(0, 0)).unwrap().color, BubbleColor::Green);
    }

    #[test]
    fn test_remove_rejects_empty_cell() {
        let mut grid = small_grid();
        let coord = HexCoord::new(1, 1);
        assert_eq!(grid.remove(coord), Err(GridError::EmptyCell(coord)));
    }

    #[test]
    fn test_place_rejects_out_of_bounds() {
        let mut grid = small_grid();
        let coord = HexCoord::new(0, 5);
        assert_eq!(
            grid.place(coord, BubbleColor::Red),
            Err(GridError::OutOfBounds(coord))
        );
    }

    #[test]
    fn test_neighbors_independent_of_occupancy() {
        let grid = small_grid();
        assert_eq!(grid.neighbors_of(HexCoord::new(2, 2)).len(), 6);
    }

    #[test]
    fn test_top_row_full() {
        let mut grid = small_grid();
        for col in 0..4 {
            grid.place(HexCoord::new(0, col), BubbleColor::Red).unwrap();
        }
        assert!(!grid.is_top_row_full());
        grid.place(HexCoord::new(0, 4), BubbleColor::Red).unwrap();
        assert!(grid.is_top_row_full());
        assert_eq!(grid.top_row_coords().len(), 5);
    }

    #[test]
    fn test_closest_empty_cell_attaches_to_cluster() {
        let mut grid = small_grid();
        grid.place(HexCoord::new(0, 2), BubbleColor::Red).unwrap();
        let below = HexCoord::new(1, 2).to_pixel();
        let cell = grid.closest_empty_cell(below).unwrap();
        assert_eq!(cell, HexCoord::new(1, 2));
        // Far below the cluster the nearest attachable cell is still next to it.
        let far = HexCoord::new(5, 2).to_pixel();
        let cell = grid.closest_empty_cell(far).unwrap();
        assert_eq!(cell.row, 1);
    }
}
