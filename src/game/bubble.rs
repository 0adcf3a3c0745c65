//! Bubbles - the values stored on the grid.
//!
//! When 3+ of the same color are connected, they pop. Frozen bubbles sit
//! out of color matching until fire burns them.

use bevy::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::hex::HexCoord;

pub(super) fn plugin(app: &mut App) {
    app.register_type::<Bubble>();
    app.register_type::<BubbleColor>();
}

/// The six bubble colors.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Reflect,
    Default,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum BubbleColor {
    #[default]
    Red,
    Blue,
    Green,
    Yellow,
    Purple,
    Orange,
}

impl BubbleColor {
    pub const ALL: [BubbleColor; 6] = [
        BubbleColor::Red,
        BubbleColor::Blue,
        BubbleColor::Green,
        BubbleColor::Yellow,
        BubbleColor::Purple,
        BubbleColor::Orange,
    ];

    /// A uniformly random color from the first `palette` colors.
    pub fn random(rng: &mut impl Rng, palette: usize) -> Self {
        let palette = palette.clamp(1, Self::ALL.len());
        Self::ALL[rng.random_range(0..palette)]
    }

    /// A random color weighted toward colors that still exist on the grid.
    ///
    /// With `chance` probability the pick comes from `grid_colors`, so the
    /// shooter rarely hands out a color that cannot match anything.
    pub fn random_weighted(
        rng: &mut impl Rng,
        grid_colors: &[BubbleColor],
        palette: usize,
        chance: f64,
    ) -> Self {
        if grid_colors.is_empty() {
            return Self::random(rng, palette);
        }

        if rng.random_bool(chance.clamp(0.0, 1.0)) {
            grid_colors[rng.random_range(0..grid_colors.len())]
        } else {
            Self::random(rng, palette)
        }
    }
}

/// A bubble sitting in a grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect, Serialize, Deserialize)]
pub struct Bubble {
    pub coord: HexCoord,
    pub color: BubbleColor,
    /// Frozen bubbles are immune to color pops, lightning and bombs.
    pub frozen: bool,
}

impl Bubble {
    pub const fn new(coord: HexCoord, color: BubbleColor) -> Self {
        Self {
            coord,
            color,
            frozen: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn test_random_respects_palette() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let color = BubbleColor::random(&mut rng, 3);
            assert!(BubbleColor::ALL[..3].contains(&color));
        }
    }

    #[test]
    fn test_weighted_always_from_grid_when_certain() {
        let mut rng = StdRng::seed_from_u64(11);
        let on_grid = [BubbleColor::Purple];
        for _ in 0..50 {
            assert_eq!(
                BubbleColor::random_weighted(&mut rng, &on_grid, 6, 1.0),
                BubbleColor::Purple
            );
        }
    }
}
