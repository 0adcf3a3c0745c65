//! The shooter at the bottom of the field.
//!
//! The shooter always has a "loaded" bubble ready to fire and a "next"
//! bubble preview. Reloads favour colors still on the board.

use bevy::prelude::*;
use rand::Rng;

use super::{
    abilities::{AbilityKind, LineMode},
    bubble::BubbleColor,
    grid::GridBounds,
    projectile::{Projectile, shooter_origin},
};

/// Loaded and next bubble plus the launch point.
#[derive(Debug, Clone, PartialEq)]
pub struct Shooter {
    pub origin: Vec2,
    loaded: BubbleColor,
    next: BubbleColor,
    /// How many colors of [`BubbleColor::ALL`] the level uses.
    palette: usize,
    /// Chance a reload picks a color that is still on the board.
    weighting: f64,
}

impl Shooter {
    pub fn new(
        rng: &mut impl Rng,
        bounds: GridBounds,
        grid_colors: &[BubbleColor],
        palette: usize,
        weighting: f64,
    ) -> Self {
        let loaded = BubbleColor::random_weighted(rng, grid_colors, palette, weighting);
        let next = BubbleColor::random_weighted(rng, grid_colors, palette, weighting);
        Self {
            origin: shooter_origin(bounds),
            loaded,
            next,
            palette,
            weighting,
        }
    }

    pub fn loaded(&self) -> BubbleColor {
        self.loaded
    }

    pub fn next(&self) -> BubbleColor {
        self.next
    }

    /// Swap the loaded and next bubbles.
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.loaded, &mut self.next);
    }

    /// Build the projectile for the loaded bubble.
    pub fn projectile(&self, direction: Vec2, ability: AbilityKind, mode: LineMode) -> Projectile {
        Projectile::new(self.origin, direction, self.loaded).with_ability(ability, mode)
    }

    /// Move next into the chamber and roll a new next.
    ///
    /// A loaded color that no longer exists on the board is replaced too.
    pub fn reload(&mut self, rng: &mut impl Rng, grid_colors: &[BubbleColor]) {
        self.loaded = if grid_colors.is_empty() || grid_colors.contains(&self.next) {
            self.next
        } else {
            BubbleColor::random_weighted(rng, grid_colors, self.palette, 1.0)
        };
        self.next = BubbleColor::random_weighted(rng, grid_colors, self.palette, self.weighting);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn test_reload_only_hands_out_board_colors() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut shooter = Shooter::new(&mut rng, GridBounds::default(), &[], 6, 0.7);
        for _ in 0..20 {
            shooter.reload(&mut rng, &[BubbleColor::Green]);
            assert_eq!(shooter.loaded(), BubbleColor::Green);
        }
    }

    #[test]
    fn test_swap() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut shooter = Shooter::new(&mut rng, GridBounds::default(), &[], 6, 0.0);
        let (loaded, next) = (shooter.loaded(), shooter.next());
        shooter.swap();
        assert_eq!((shooter.loaded(), shooter.next()), (next, loaded));
    }

    #[test]
    fn test_projectile_uses_loaded_color() {
        let mut rng = StdRng::seed_from_u64(9);
        let shooter = Shooter::new(&mut rng, GridBounds::default(), &[BubbleColor::Blue], 6, 1.0);
        let projectile = shooter.projectile(Vec2::NEG_Y, AbilityKind::Bomb, LineMode::Column);
        assert_eq!(projectile.color, BubbleColor::Blue);
        assert_eq!(projectile.ability, AbilityKind::Bomb);
        assert_eq!(projectile.origin, shooter.origin);
    }
}
