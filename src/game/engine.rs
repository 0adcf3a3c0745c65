//! The bubble engine - one level's grid, shooter, inventory and score.
//!
//! A shot runs synchronously from launch to settled grid:
//! collision picks the landing cell, then either the bubble is placed and
//! its color group checked, or the ability goes off. Floating bubbles drop
//! after every removal, and the accumulator folds the result into the
//! running totals.
//!
//! The engine lives as a resource while a level is played; the plugin
//! drives it from [`FireProjectile`] messages and reports back with
//! [`ShotResolved`] and [`LevelFinished`].

use bevy::prelude::*;
use rand::rngs::StdRng;
use std::collections::BTreeMap;
use thiserror::Error;

use super::{
    abilities::{AbilityKind, AbilityTarget, LineMode, apply_ability},
    cluster::{drop_floating, pop_cluster},
    grid::{BubbleGrid, GridError},
    hex::HexCoord,
    inventory::AbilityInventory,
    level::LevelConfig,
    projectile::{Projectile, resolve_landing},
    shooter::Shooter,
    state::{ScoreAccumulator, ShotOutcome, ShotResolution},
};
use crate::{config::EngineConfig, session::GameSession};

pub(super) fn plugin(app: &mut App) {
    app.register_type::<LevelResult>();
    app.add_message::<FireProjectile>();
    app.add_message::<ShotResolved>();
    app.add_message::<LevelFinished>();
    app.init_resource::<LevelClock>();

    app.add_systems(
        Update,
        (tick_level_clock, handle_fire_projectile)
            .chain()
            .in_set(EngineSystems)
            .run_if(resource_exists::<BubbleEngine>),
    );
}

/// System set for the engine systems.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct EngineSystems;

/// Errors a shot can end with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ShotError {
    /// The board is saturated; the level is lost as "board full".
    #[error("board full: no cell left for the bubble")]
    NoLandingCell,
    #[error("a shot is already being resolved")]
    ShotInProgress,
    #[error("no shot is being resolved")]
    NoShotInFlight,
    #[error("the level is over")]
    LevelOver,
    #[error("no {} charges left", .0.name())]
    AbilityUnavailable(AbilityKind),
    #[error(transparent)]
    Grid(#[from] GridError),
}

/// How a level ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum LevelResult {
    /// Every bubble is gone.
    Cleared,
    OutOfMoves,
    /// A shot found no landing cell.
    BoardFull,
    /// A bubble settled in the last row.
    Overflow,
}

impl LevelResult {
    pub fn is_win(self) -> bool {
        self == LevelResult::Cleared
    }
}

/// Message to fire the loaded bubble.
#[derive(Message, Debug, Clone)]
pub struct FireProjectile {
    pub direction: Vec2,
    pub ability: AbilityKind,
    pub mode: LineMode,
}

impl FireProjectile {
    pub fn plain(direction: Vec2) -> Self {
        Self {
            direction,
            ability: AbilityKind::None,
            mode: LineMode::Column,
        }
    }
}

/// Message sent after every resolved shot.
#[derive(Message, Debug, Clone)]
pub struct ShotResolved(pub ShotOutcome);

/// Message sent once when the level ends, carrying the session to report.
#[derive(Message, Debug, Clone)]
pub struct LevelFinished {
    pub result: LevelResult,
    pub session: GameSession,
}

/// Seconds spent in the current level.
#[derive(Resource, Debug, Default)]
pub struct LevelClock {
    pub elapsed: f32,
}

/// Everything one level needs, owned in one place.
#[derive(Resource)]
pub struct BubbleEngine {
    level: LevelConfig,
    config: EngineConfig,
    grid: BubbleGrid,
    score: ScoreAccumulator,
    shooter: Shooter,
    inventory: AbilityInventory,
    rng: StdRng,
    abilities_used: BTreeMap<AbilityKind, u32>,
    result: Option<LevelResult>,
}

impl BubbleEngine {
    /// Start a level with its generated layout and starting abilities.
    pub fn new(level: LevelConfig, config: EngineConfig) -> Self {
        let mut rng = level.rng();
        let grid = level.build_grid(&mut rng);
        Self::assemble(level, config, grid, rng)
    }

    /// Start a level on a prepared grid.
    pub fn with_grid(level: LevelConfig, config: EngineConfig, grid: BubbleGrid) -> Self {
        let rng = level.rng();
        Self::assemble(level, config, grid, rng)
    }

    fn assemble(
        level: LevelConfig,
        config: EngineConfig,
        grid: BubbleGrid,
        mut rng: StdRng,
    ) -> Self {
        let shooter = Shooter::new(
            &mut rng,
            grid.bounds(),
            &grid.colors_present(),
            level.palette,
            config.color_weighting,
        );
        Self {
            inventory: level.abilities.clone(),
            score: ScoreAccumulator::new(config.scoring),
            abilities_used: BTreeMap::new(),
            result: None,
            level,
            config,
            grid,
            shooter,
            rng,
        }
    }

    /// Replace the starting abilities.
    pub fn with_inventory(mut self, inventory: AbilityInventory) -> Self {
        self.inventory = inventory;
        self
    }

    pub fn level(&self) -> &LevelConfig {
        &self.level
    }

    pub fn grid(&self) -> &BubbleGrid {
        &self.grid
    }

    pub fn score(&self) -> &ScoreAccumulator {
        &self.score
    }

    pub fn shooter(&self) -> &Shooter {
        &self.shooter
    }

    pub fn shooter_mut(&mut self) -> &mut Shooter {
        &mut self.shooter
    }

    pub fn inventory(&self) -> &AbilityInventory {
        &self.inventory
    }

    pub fn result(&self) -> Option<LevelResult> {
        self.result
    }

    pub fn moves_left(&self) -> u32 {
        self.level.moves.saturating_sub(self.score.shots)
    }

    /// Fire the loaded bubble in `direction`.
    pub fn fire(
        &mut self,
        direction: Vec2,
        ability: AbilityKind,
        mode: LineMode,
    ) -> Result<ShotOutcome, ShotError> {
        let projectile = self.shooter.projectile(direction, ability, mode);
        self.fire_projectile(projectile)
    }

    /// Run one shot to completion.
    pub fn fire_projectile(&mut self, projectile: Projectile) -> Result<ShotOutcome, ShotError> {
        if self.result.is_some() {
            return Err(ShotError::LevelOver);
        }
        if !self.inventory.has(projectile.ability) {
            return Err(ShotError::AbilityUnavailable(projectile.ability));
        }
        self.score.begin_shot()?;

        let landing = match resolve_landing(&self.grid, &projectile) {
            Ok(landing) => landing,
            Err(e) => {
                self.score.abort_shot();
                if e == ShotError::NoLandingCell {
                    warn!("Board full on level {}", self.level.number);
                    self.end_level(LevelResult::BoardFull);
                }
                return Err(e);
            }
        };

        let resolution = match settle(&mut self.grid, landing.cell, &projectile, &self.config) {
            Ok(resolution) => resolution,
            Err(e) => {
                self.score.abort_shot();
                return Err(e.into());
            }
        };

        self.inventory.consume(projectile.ability);
        if !projectile.ability.is_none() {
            *self.abilities_used.entry(projectile.ability).or_default() += 1;
        }

        let outcome = self.score.resolve(resolution)?;
        let colors = self.grid.colors_present();
        self.shooter.reload(&mut self.rng, &colors);

        let result = self.check_level_end();
        self.score.finish_shot(result.is_some());
        if let Some(result) = result {
            self.end_level(result);
        }
        Ok(outcome)
    }

    fn check_level_end(&self) -> Option<LevelResult> {
        if self.grid.is_empty() {
            Some(LevelResult::Cleared)
        } else if self
            .grid
            .lowest_row()
            .is_some_and(|row| row >= self.grid.bounds().rows - 1)
        {
            Some(LevelResult::Overflow)
        } else if self.score.shots >= self.level.moves {
            Some(LevelResult::OutOfMoves)
        } else {
            None
        }
    }

    fn end_level(&mut self, result: LevelResult) {
        self.result = Some(result);
        self.score.complete();
        info!(
            "Level {} over: {:?}, score {}, {} stars",
            self.level.number,
            result,
            self.score.score,
            self.stars()
        );
    }

    /// Stars earned so far: 0 unless the board was cleared.
    pub fn stars(&self) -> u8 {
        let is_win = self.result.is_some_and(LevelResult::is_win);
        self.level.stars_for(self.score.score, is_win)
    }

    /// The session summary to report for this level.
    pub fn session(&self, duration: f32) -> GameSession {
        GameSession {
            level: self.level.number as i32,
            score: self.score.score,
            moves: self.score.shots,
            stars: self.stars() as i32,
            duration,
            abilities_used: self.abilities_used.clone(),
            bubbles_destroyed: self.score.bubbles_destroyed(),
            chain_reactions: self.score.chain_reactions,
            perfect_shots: self.score.perfect_shots,
            is_win: self.result.is_some_and(LevelResult::is_win),
        }
    }
}

/// Settle a projectile into its landing cell and run the removal passes.
///
/// A plain bubble is placed and its color group popped if large enough.
/// An ability goes off at the cell instead and the bubble is consumed.
/// The floating pass follows any removal.
pub fn settle(
    grid: &mut BubbleGrid,
    cell: HexCoord,
    projectile: &Projectile,
    config: &EngineConfig,
) -> Result<ShotResolution, GridError> {
    let (popped, dropped) = if projectile.ability.is_none() {
        grid.place(cell, projectile.color)?;
        let popped = pop_cluster(grid, cell, config.min_cluster_size)?;
        let dropped = if popped.is_empty() {
            Vec::new()
        } else {
            drop_floating(grid)?
        };
        (popped.len(), dropped.len())
    } else {
        let target = AbilityTarget {
            origin: cell,
            mode: projectile.mode,
            bomb_radius: config.bomb_radius,
        };
        let effect = apply_ability(grid, projectile.ability, &target)?;
        let dropped = drop_floating(grid)?;
        (effect.destroyed.len(), dropped.len())
    };

    Ok(ShotResolution {
        landing: cell,
        ability: projectile.ability,
        popped: popped as u32,
        dropped: dropped as u32,
        chain_depth: (popped > 0) as u32 + (dropped > 0) as u32,
    })
}

fn tick_level_clock(time: Res<Time>, engine: Res<BubbleEngine>, mut clock: ResMut<LevelClock>) {
    if engine.result().is_none() {
        clock.elapsed += time.delta_secs();
    }
}

/// Resolve every fired projectile, one at a time.
fn handle_fire_projectile(
    mut engine: ResMut<BubbleEngine>,
    clock: Res<LevelClock>,
    mut fire_events: MessageReader<FireProjectile>,
    mut resolved_events: MessageWriter<ShotResolved>,
    mut finished_events: MessageWriter<LevelFinished>,
) {
    for event in fire_events.read() {
        let was_over = engine.result().is_some();

        match engine.fire(event.direction, event.ability, event.mode) {
            Ok(outcome) => {
                resolved_events.write(ShotResolved(outcome));
            }
            Err(ShotError::NoLandingCell) => {}
            Err(e) => warn!("Shot rejected: {}", e),
        }

        if !was_over && let Some(result) = engine.result() {
            finished_events.write(LevelFinished {
                result,
                session: engine.session(clock.elapsed),
            });
        }
    }
}
