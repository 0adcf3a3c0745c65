//! Elemental abilities - grid mutations applied where an ability shot lands.
//!
//! Every ability is one plain function over the grid, looked up from the
//! closed [`AbilityKind`] enum. An ability projectile detonates on its
//! landing cell and is consumed; the floating pass runs afterwards.
//!
//! | Ability   | Area              | Frozen bubbles in the area |
//! |-----------|-------------------|----------------------------|
//! | lightning | column (or row)   | survive                    |
//! | bomb      | hex radius        | survive                    |
//! | freeze    | column (or row)   | stay frozen, others freeze |
//! | fire      | column (or row)   | burn, and so do frozen bubbles touching the burn |

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::{
    cluster::find_connected_frozen,
    grid::{BubbleGrid, GridError},
    hex::HexCoord,
};

pub(super) fn plugin(app: &mut App) {
    app.register_type::<AbilityKind>();
    app.register_type::<LineMode>();
}

/// Default bomb blast radius in hex steps.
pub const BOMB_RADIUS: i32 = 2;

/// The ability carried by a projectile.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Reflect,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum AbilityKind {
    #[default]
    None,
    Lightning,
    Bomb,
    Freeze,
    Fire,
}

/// Which line a lightning, freeze or fire shot sweeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineMode {
    #[default]
    Column,
    Row,
}

/// Where an ability goes off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbilityTarget {
    pub origin: HexCoord,
    pub mode: LineMode,
    pub bomb_radius: i32,
}

/// What an ability did to the grid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AbilityEffect {
    pub destroyed: Vec<HexCoord>,
    pub frozen: Vec<HexCoord>,
}

type AbilityFn = fn(&mut BubbleGrid, &AbilityTarget) -> Result<AbilityEffect, GridError>;

impl AbilityKind {
    /// The abilities a player can hold.
    pub const ACTIVE: [AbilityKind; 4] = [
        AbilityKind::Lightning,
        AbilityKind::Bomb,
        AbilityKind::Freeze,
        AbilityKind::Fire,
    ];

    pub fn is_none(self) -> bool {
        self == AbilityKind::None
    }

    pub fn name(&self) -> &'static str {
        match self {
            AbilityKind::None => "None",
            AbilityKind::Lightning => "Lightning",
            AbilityKind::Bomb => "Bomb",
            AbilityKind::Freeze => "Freeze",
            AbilityKind::Fire => "Fire",
        }
    }

    fn mutation(self) -> AbilityFn {
        match self {
            AbilityKind::None => no_effect,
            AbilityKind::Lightning => lightning,
            AbilityKind::Bomb => bomb,
            AbilityKind::Freeze => freeze,
            AbilityKind::Fire => fire,
        }
    }
}

/// Apply an ability to the grid. Targets that hold no bubble are skipped,
/// so an ability over an empty area is a no-op.
pub fn apply_ability(
    grid: &mut BubbleGrid,
    kind: AbilityKind,
    target: &AbilityTarget,
) -> Result<AbilityEffect, GridError> {
    let effect = (kind.mutation())(grid, target)?;
    info!(
        "{} at {}: {} destroyed, {} frozen",
        kind.name(),
        target.origin,
        effect.destroyed.len(),
        effect.frozen.len()
    );
    Ok(effect)
}

fn line_cells(grid: &BubbleGrid, target: &AbilityTarget) -> Vec<HexCoord> {
    match target.mode {
        LineMode::Column => grid.column_cells(target.origin.col),
        LineMode::Row => grid.row_cells(target.origin.row),
    }
}

/// Remove the unfrozen bubbles among `cells`.
fn destroy_unfrozen(grid: &mut BubbleGrid, cells: &[HexCoord]) -> Result<AbilityEffect, GridError> {
    let mut effect = AbilityEffect::default();
    for &coord in cells {
        if grid.get(coord).is_some_and(|b| !b.frozen) {
            grid.remove(coord)?;
            effect.destroyed.push(coord);
        }
    }
    Ok(effect)
}

fn no_effect(_grid: &mut BubbleGrid, _target: &AbilityTarget) -> Result<AbilityEffect, GridError> {
    Ok(AbilityEffect::default())
}

fn lightning(grid: &mut BubbleGrid, target: &AbilityTarget) -> Result<AbilityEffect, GridError> {
    let cells = line_cells(grid, target);
    destroy_unfrozen(grid, &cells)
}

fn bomb(grid: &mut BubbleGrid, target: &AbilityTarget) -> Result<AbilityEffect, GridError> {
    let cells: Vec<HexCoord> = grid
        .bounds()
        .iter()
        .filter(|c| c.distance(target.origin) <= target.bomb_radius)
        .collect();
    destroy_unfrozen(grid, &cells)
}

fn freeze(grid: &mut BubbleGrid, target: &AbilityTarget) -> Result<AbilityEffect, GridError> {
    let mut effect = AbilityEffect::default();
    for coord in line_cells(grid, target) {
        if grid.get(coord).is_some_and(|b| !b.frozen) {
            grid.set_frozen(coord, true)?;
            effect.frozen.push(coord);
        }
    }
    Ok(effect)
}

fn fire(grid: &mut BubbleGrid, target: &AbilityTarget) -> Result<AbilityEffect, GridError> {
    let cells = line_cells(grid, target);
    let mut effect = AbilityEffect::default();
    for &coord in &cells {
        if grid.is_occupied(coord) {
            grid.remove(coord)?;
            effect.destroyed.push(coord);
        }
    }

    // Ice touching the burn melts with it.
    for coord in find_connected_frozen(grid, &cells) {
        grid.remove(coord)?;
        effect.destroyed.push(coord);
    }
    Ok(effect)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{bubble::BubbleColor, grid::GridBounds};

    fn full_grid(rows: i32) -> BubbleGrid {
        let mut grid = BubbleGrid::new(GridBounds::new(5, 8));
        for row in 0..rows {
            for col in 0..5 {
                let color = BubbleColor::ALL[((row + col) % 4) as usize];
                grid.place(HexCoord::new(row, col), color).unwrap();
            }
        }
        grid
    }

    fn at(row: i32, col: i32, mode: LineMode) -> AbilityTarget {
        AbilityTarget {
            origin: HexCoord::new(row, col),
            mode,
            bomb_radius: BOMB_RADIUS,
        }
    }

    #[test]
    fn test_lightning_clears_column() {
        let mut grid = full_grid(4);
        let effect =
            apply_ability(&mut grid, AbilityKind::Lightning, &at(3, 2, LineMode::Column)).unwrap();
        assert_eq!(effect.destroyed.len(), 4);
        assert!((0..4).all(|row| !grid.is_occupied(HexCoord::new(row, 2))));
    }

    #[test]
    fn test_lightning_row_mode() {
        let mut grid = full_grid(4);
        let effect =
            apply_ability(&mut grid, AbilityKind::Lightning, &at(1, 0, LineMode::Row)).unwrap();
        assert_eq!(effect.destroyed.len(), 5);
        assert_eq!(grid.len(), 15);
    }

    #[test]
    fn test_bomb_spares_frozen_and_respects_radius() {
        let mut grid = full_grid(5);
        let frozen = HexCoord::new(2, 3);
        grid.set_frozen(frozen, true).unwrap();
        let effect =
            apply_ability(&mut grid, AbilityKind::Bomb, &at(2, 2, LineMode::Column)).unwrap();
        assert!(grid.is_occupied(frozen));
        assert!(!effect.destroyed.contains(&frozen));
        assert!(effect.destroyed.iter().all(|c| c.distance(HexCoord::new(2, 2)) <= BOMB_RADIUS));
        // (4, 0) is three steps away and survives.
        assert!(grid.is_occupied(HexCoord::new(4, 0)));
    }

    #[test]
    fn test_freeze_removes_nothing() {
        let mut grid = full_grid(3);
        let effect =
            apply_ability(&mut grid, AbilityKind::Freeze, &at(2, 1, LineMode::Column)).unwrap();
        assert_eq!(grid.len(), 15);
        assert_eq!(effect.frozen.len(), 3);
        assert!(effect.destroyed.is_empty());
        assert!((0..3).all(|row| grid.get(HexCoord::new(row, 1)).unwrap().frozen));
    }

    #[test]
    fn test_fire_burns_ice_and_melts_neighbours() {
        let mut grid = full_grid(3);
        grid.set_frozen(HexCoord::new(0, 1), true).unwrap();
        grid.set_frozen(HexCoord::new(0, 2), true).unwrap();
        let effect =
            apply_ability(&mut grid, AbilityKind::Fire, &at(2, 1, LineMode::Column)).unwrap();
        // Column 1 burns, the frozen (0, 2) touching it melts.
        assert_eq!(effect.destroyed.len(), 4);
        assert!(!grid.is_occupied(HexCoord::new(0, 2)));
        assert!(grid.is_occupied(HexCoord::new(0, 3)));
    }

    #[test]
    fn test_abilities_on_empty_area_are_noops() {
        let mut grid = BubbleGrid::new(GridBounds::new(5, 8));
        for kind in AbilityKind::ACTIVE {
            let effect = apply_ability(&mut grid, kind, &at(0, 4, LineMode::Column)).unwrap();
            assert_eq!(effect, AbilityEffect::default());
        }
    }
}
