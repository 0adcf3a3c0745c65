//! Level layouts - board size, palette, move budget and star thresholds.
//!
//! Levels get harder as the number grows: more filled rows, more colors,
//! fewer spare moves. Layouts are generated from a per-level seed so a
//! level always starts the same way.

use bevy::prelude::*;
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use super::{
    abilities::AbilityKind,
    bubble::BubbleColor,
    grid::{BubbleGrid, GridBounds},
    hex::HexCoord,
    inventory::AbilityInventory,
};

/// Definition of one level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelConfig {
    /// 1-based level number.
    pub number: u32,
    pub columns: i32,
    pub rows: i32,
    /// Rows filled with bubbles at the start.
    pub filled_rows: i32,
    /// How many colors of [`BubbleColor::ALL`] the level uses.
    pub palette: usize,
    /// Shots available before the level is lost.
    pub moves: u32,
    /// Scores for one, two and three stars on a win.
    pub star_thresholds: [u32; 3],
    pub seed: u64,
    /// Abilities granted at level start.
    pub abilities: AbilityInventory,
}

impl LevelConfig {
    /// The built-in progression for a level number (numbers below 1 are
    /// treated as level 1).
    pub fn numbered(number: u32) -> Self {
        let number = number.max(1);
        let filled_rows = (4 + (number as i32 - 1) / 3).min(8);
        let palette = (3 + (number as usize - 1) / 4).min(BubbleColor::ALL.len());
        let columns = 11;
        let bubbles = (filled_rows * columns) as u32;

        let mut abilities = AbilityInventory::new();
        // A new ability joins the kit every other level.
        for (i, kind) in AbilityKind::ACTIVE.into_iter().enumerate() {
            if number as usize > i * 2 {
                abilities.add(kind, 1);
            }
        }

        Self {
            number,
            columns,
            rows: 12,
            filled_rows,
            palette,
            moves: 20 + filled_rows as u32 * 3,
            star_thresholds: [bubbles * 10, bubbles * 15, bubbles * 22],
            seed: 0x5EED_0000 + number as u64,
            abilities,
        }
    }

    pub fn bounds(&self) -> GridBounds {
        GridBounds::new(self.columns, self.rows)
    }

    /// Fill the top `filled_rows` rows with random palette colors.
    pub fn build_grid(&self, rng: &mut impl Rng) -> BubbleGrid {
        let rows = self.filled_rows.clamp(0, self.rows - 1);
        let cells = (0..rows)
            .flat_map(|row| (0..self.columns).map(move |col| HexCoord::new(row, col)))
            .map(|coord| (coord, BubbleColor::random(rng, self.palette)))
            .collect::<Vec<_>>();
        let grid = BubbleGrid::from_cells(self.bounds(), cells);
        info!(
            "Level {}: spawned {} bubbles in {} colors",
            self.number,
            grid.len(),
            self.palette
        );
        grid
    }

    pub fn rng(&self) -> StdRng {
        StdRng::seed_from_u64(self.seed)
    }

    /// Stars for a final score: 0 on a loss, otherwise the thresholds met
    /// with a minimum of one.
    pub fn stars_for(&self, score: u32, is_win: bool) -> u8 {
        if !is_win {
            return 0;
        }
        let met = self.star_thresholds.iter().filter(|t| score >= **t).count();
        met.max(1) as u8
    }
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self::numbered(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_is_seeded() {
        let level = LevelConfig::numbered(3);
        let a = level.build_grid(&mut level.rng());
        let b = level.build_grid(&mut level.rng());
        assert_eq!(a.iter().collect::<Vec<_>>(), b.iter().collect::<Vec<_>>());
        assert_eq!(a.len() as i32, level.filled_rows * level.columns);
    }

    #[test]
    fn test_progression_gets_harder() {
        let easy = LevelConfig::numbered(1);
        let hard = LevelConfig::numbered(20);
        assert!(hard.filled_rows > easy.filled_rows);
        assert!(hard.palette > easy.palette);
        assert!(hard.filled_rows < hard.rows);
        assert_eq!(LevelConfig::numbered(0).number, 1);
    }

    #[test]
    fn test_ability_kit_grows() {
        assert_eq!(LevelConfig::numbered(1).abilities.iter().count(), 1);
        assert_eq!(LevelConfig::numbered(7).abilities.iter().count(), 4);
    }

    #[test]
    fn test_stars() {
        let mut level = LevelConfig::numbered(1);
        level.star_thresholds = [100, 200, 300];
        assert_eq!(level.stars_for(1000, false), 0);
        assert_eq!(level.stars_for(50, true), 1);
        assert_eq!(level.stars_for(250, true), 2);
        assert_eq!(level.stars_for(300, true), 3);
    }
}
