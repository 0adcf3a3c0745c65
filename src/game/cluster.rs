//! Cluster detection - finding and removing matching and floating bubbles.
//!
//! Uses flood fill (BFS) over the hex neighbourhood:
//! - pop groups: same-colored, unfrozen bubbles connected to the shot;
//! - floating clusters: bubbles no longer connected to the ceiling row.

use bevy::prelude::*;
use std::collections::{HashSet, VecDeque};

use super::{
    grid::{BubbleGrid, GridError},
    hex::HexCoord,
};

/// Minimum cluster size to pop (match-3).
pub const MIN_CLUSTER_SIZE: usize = 3;

/// Find all bubbles connected to `start` that share its color.
///
/// Frozen bubbles neither join the group nor carry the fill through them.
/// Returns an empty group when `start` is empty or frozen.
pub fn find_cluster(grid: &BubbleGrid, start: HexCoord) -> Vec<HexCoord> {
    let Some(origin) = grid.get(start) else {
        return Vec::new();
    };
    if origin.frozen {
        return Vec::new();
    }

    let mut cluster = vec![start];
    let mut visited = HashSet::from([start]);
    let mut queue = VecDeque::from([start]);

    while let Some(coord) = queue.pop_front() {
        for neighbor in coord.neighbors() {
            if !visited.insert(neighbor) {
                continue;
            }
            if let Some(bubble) = grid.get(neighbor)
                && !bubble.frozen
                && bubble.color == origin.color
            {
                cluster.push(neighbor);
                queue.push_back(neighbor);
            }
        }
    }

    cluster.sort();
    cluster
}

/// Pop the cluster around `start` if it reaches `min_size`.
///
/// Returns the removed cells; smaller groups stay on the board.
pub fn pop_cluster(
    grid: &mut BubbleGrid,
    start: HexCoord,
    min_size: usize,
) -> Result<Vec<HexCoord>, GridError> {
    let cluster = find_cluster(grid, start);
    if cluster.len() < min_size {
        return Ok(Vec::new());
    }

    for &coord in &cluster {
        grid.remove(coord)?;
    }
    debug!("Popped cluster of {} at {}", cluster.len(), start);
    Ok(cluster)
}

/// Find all bubbles connected to the ceiling row.
pub fn find_anchored_bubbles(grid: &BubbleGrid) -> HashSet<HexCoord> {
    let mut anchored: HashSet<HexCoord> = grid.top_row_coords().into_iter().collect();
    let mut queue: VecDeque<HexCoord> = anchored.iter().copied().collect();

    while let Some(coord) = queue.pop_front() {
        for neighbor in coord.neighbors() {
            if grid.is_occupied(neighbor) && anchored.insert(neighbor) {
                queue.push_back(neighbor);
            }
        }
    }

    anchored
}

/// Bubbles that are not reachable from the ceiling row.
pub fn find_floating(grid: &BubbleGrid) -> Vec<HexCoord> {
    let anchored = find_anchored_bubbles(grid);
    grid.coords().filter(|c| !anchored.contains(c)).collect()
}

/// Remove every floating bubble. Frozen bubbles fall like any other.
pub fn drop_floating(grid: &mut BubbleGrid) -> Result<Vec<HexCoord>, GridError> {
    let floating = find_floating(grid);
    for &coord in &floating {
        grid.remove(coord)?;
    }
    if !floating.is_empty() {
        debug!("Dropped {} floating bubbles", floating.len());
    }
    Ok(floating)
}

/// Frozen bubbles connected through other frozen bubbles to any cell of
/// `seeds`. The seeds themselves are not included.
pub fn find_connected_frozen(grid: &BubbleGrid, seeds: &[HexCoord]) -> Vec<HexCoord> {
    let mut visited: HashSet<HexCoord> = seeds.iter().copied().collect();
    let mut queue: VecDeque<HexCoord> = seeds.iter().copied().collect();
    let mut melted = Vec::new();

    while let Some(coord) = queue.pop_front() {
        for neighbor in coord.neighbors() {
            if visited.contains(&neighbor) {
                continue;
            }
            if grid.get(neighbor).is_some_and(|b| b.frozen) {
                visited.insert(neighbor);
                melted.push(neighbor);
                queue.push_back(neighbor);
            }
        }
    }

    melted.sort();
    melted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{bubble::BubbleColor, grid::GridBounds};

    fn grid_with(cells: &[(i32, i32, BubbleColor)]) -> BubbleGrid {
        let mut grid = BubbleGrid::new(GridBounds::new(6, 8));
        for &(row, col, color) in cells {
            grid.place(HexCoord::new(row, col), color).unwrap();
        }
        grid
    }

    use BubbleColor::{Blue, Red};

    #[test]
    fn test_three_group_pops() {
        let mut grid = grid_with(&[(0, 0, Red), (0, 1, Red), (1, 0, Red), (0, 2, Blue)]);
        let popped = pop_cluster(&mut grid, HexCoord::new(1, 0), MIN_CLUSTER_SIZE).unwrap();
        assert_eq!(popped.len(), 3);
        assert_eq!(grid.len(), 1);
    }

    #[test]
    fn test_two_group_stays() {
        let mut grid = grid_with(&[(0, 0, Red), (1, 0, Red), (0, 1, Blue)]);
        let popped = pop_cluster(&mut grid, HexCoord::new(1, 0), MIN_CLUSTER_SIZE).unwrap();
        assert!(popped.is_empty());
        assert_eq!(grid.len(), 3);
    }

    #[test]
    fn test_frozen_bubbles_break_the_group() {
        let mut grid = grid_with(&[(0, 0, Red), (0, 1, Red), (0, 2, Red)]);
        grid.set_frozen(HexCoord::new(0, 1), true).unwrap();
        assert_eq!(find_cluster(&grid, HexCoord::new(0, 0)).len(), 1);
        assert!(find_cluster(&grid, HexCoord::new(0, 1)).is_empty());
    }

    #[test]
    fn test_floating_detects_detached_branch() {
        // (1,0) hangs from (0,0); (2,0) hangs from (1,0).
        let mut grid = grid_with(&[(0, 0, Red), (1, 0, Blue), (2, 0, Blue), (0, 3, Red)]);
        assert!(find_floating(&grid).is_empty());

        grid.remove(HexCoord::new(0, 0)).unwrap();
        let dropped = drop_floating(&mut grid).unwrap();
        assert_eq!(dropped, vec![HexCoord::new(1, 0), HexCoord::new(2, 0)]);
        assert_eq!(grid.len(), 1);
    }

    #[test]
    fn test_connected_frozen_spreads_only_through_frozen() {
        let mut grid = grid_with(&[(0, 0, Red), (0, 1, Red), (0, 2, Blue), (0, 3, Red)]);
        for col in [1, 3] {
            grid.set_frozen(HexCoord::new(0, col), true).unwrap();
        }
        let melted = find_connected_frozen(&grid, &[HexCoord::new(0, 0)]);
        assert_eq!(melted, vec![HexCoord::new(0, 1)]);
    }
}
