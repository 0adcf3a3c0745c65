//! Score keeping - combo, chain reactions and perfect shots.
//!
//! The accumulator is a small state machine per shot:
//! `Idle -> InShot -> Resolved -> Idle`, ending in `Completed` once the
//! level is over. A shot can only start from `Idle`, which is what keeps
//! two shots from ever touching the grid at the same time.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::{abilities::AbilityKind, engine::ShotError, hex::HexCoord};

pub(super) fn plugin(app: &mut App) {
    app.register_type::<ShotPhase>();
}

/// Where the accumulator is in the shot cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
pub enum ShotPhase {
    #[default]
    Idle,
    InShot,
    Resolved,
    Completed,
}

/// Raw grid result of one shot, before scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShotResolution {
    pub landing: HexCoord,
    pub ability: AbilityKind,
    /// Bubbles removed by a color match or an ability.
    pub popped: u32,
    /// Bubbles removed because they lost their hold on the ceiling.
    pub dropped: u32,
    /// Number of removal passes the shot triggered.
    pub chain_depth: u32,
}

/// The scored result of one shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShotOutcome {
    pub popped_count: u32,
    pub dropped_count: u32,
    pub chain_depth: u32,
    pub is_perfect_shot: bool,
    pub landing: HexCoord,
    pub ability: AbilityKind,
    /// Points this shot added.
    pub points: u32,
}

/// Point values used by the accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringRules {
    pub points_per_bubble: u32,
    pub drop_bonus_multiplier: u32,
    pub max_combo: u32,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            points_per_bubble: 10,
            drop_bonus_multiplier: 2,
            max_combo: 10,
        }
    }
}

impl ScoringRules {
    /// Points for a number of popped bubbles, before the combo multiplier.
    pub fn base_points(&self, popped: u32) -> u32 {
        popped.saturating_mul(self.points_per_bubble)
    }

    /// Bonus for dropped bubbles; drops are not combo-multiplied.
    pub fn drop_points(&self, dropped: u32) -> u32 {
        dropped
            .saturating_mul(self.points_per_bubble)
            .saturating_mul(self.drop_bonus_multiplier)
    }
}

/// Running totals for one level.
#[derive(Debug, Clone, Default)]
pub struct ScoreAccumulator {
    rules: ScoringRules,
    phase: ShotPhase,
    pub score: u32,
    /// Consecutive popping shots.
    pub combo: u32,
    /// Set by the first miss of the level; no perfect shots after that.
    combo_broken: bool,
    pub chain_reactions: u32,
    pub perfect_shots: u32,
    pub bubbles_popped: u32,
    pub bubbles_dropped: u32,
    pub shots: u32,
}

impl ScoreAccumulator {
    pub fn new(rules: ScoringRules) -> Self {
        Self {
            rules,
            ..Default::default()
        }
    }

    pub fn phase(&self) -> ShotPhase {
        self.phase
    }

    /// Current score multiplier, at least 1.
    pub fn combo_multiplier(&self) -> u32 {
        self.combo.max(1)
    }

    pub fn bubbles_destroyed(&self) -> u32 {
        self.bubbles_popped.saturating_add(self.bubbles_dropped)
    }

    /// `Idle -> InShot`.
    pub fn begin_shot(&mut self) -> Result<(), ShotError> {
        match self.phase {
            ShotPhase::Idle => {
                self.phase = ShotPhase::InShot;
                Ok(())
            }
            ShotPhase::Completed => Err(ShotError::LevelOver),
            ShotPhase::InShot | ShotPhase::Resolved => Err(ShotError::ShotInProgress),
        }
    }

    /// Back to `Idle` when a shot never reached the grid.
    pub fn abort_shot(&mut self) {
        if self.phase == ShotPhase::InShot {
            self.phase = ShotPhase::Idle;
        }
    }

    /// `InShot -> Resolved`: fold one shot into the totals.
    pub fn resolve(&mut self, shot: ShotResolution) -> Result<ShotOutcome, ShotError> {
        if self.phase != ShotPhase::InShot {
            return Err(ShotError::NoShotInFlight);
        }

        let pops = shot.popped > 0;
        if pops {
            self.combo = (self.combo + 1).min(self.rules.max_combo.max(1));
        } else {
            self.combo = 0;
            self.combo_broken = true;
        }

        let points = self
            .rules
            .base_points(shot.popped)
            .saturating_mul(self.combo_multiplier())
            .saturating_add(self.rules.drop_points(shot.dropped));
        self.score = self.score.saturating_add(points);
        self.bubbles_popped += shot.popped;
        self.bubbles_dropped += shot.dropped;
        self.shots += 1;

        if shot.chain_depth >= 2 {
            self.chain_reactions += 1;
        }

        let is_perfect_shot = pops && !self.combo_broken;
        if is_perfect_shot {
            self.perfect_shots += 1;
        }

        self.phase = ShotPhase::Resolved;
        debug!(
            "Shot at {}: {} popped, {} dropped, x{} combo, +{} (total {})",
            shot.landing,
            shot.popped,
            shot.dropped,
            self.combo_multiplier(),
            points,
            self.score
        );

        Ok(ShotOutcome {
            popped_count: shot.popped,
            dropped_count: shot.dropped,
            chain_depth: shot.chain_depth,
            is_perfect_shot,
            landing: shot.landing,
            ability: shot.ability,
            points,
        })
    }

    /// `Resolved -> Idle`, or `Completed` when the level is over.
    pub fn finish_shot(&mut self, level_over: bool) {
        if self.phase == ShotPhase::Resolved {
            self.phase = if level_over {
                ShotPhase::Completed
            } else {
                ShotPhase::Idle
            };
        }
    }

    /// End the level from any phase.
    pub fn complete(&mut self) {
        self.phase = ShotPhase::Completed;
    }
}
