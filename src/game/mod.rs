//! The bubble engine.
//!
//! This module contains all the gameplay logic including:
//! - Hexagonal grid system (odd-r offset coordinates)
//! - Bubble colors and grid storage
//! - Shooter and projectile tracing
//! - Cluster detection, popping and floating drops
//! - Elemental abilities and their inventory
//! - Level layouts and score keeping

pub mod abilities;
pub mod bubble;
pub mod cluster;
pub mod engine;
pub mod grid;
pub mod hex;
pub mod inventory;
pub mod level;
pub mod projectile;
pub mod shooter;
pub mod state;

use bevy::prelude::*;

pub use engine::{
    BubbleEngine, EngineSystems, FireProjectile, LevelClock, LevelFinished, LevelResult,
    ShotError, ShotResolved,
};

pub(super) fn plugin(app: &mut App) {
    app.add_plugins((
        hex::plugin,
        grid::plugin,
        bubble::plugin,
        abilities::plugin,
        state::plugin,
        engine::plugin,
    ));
}

/// Start a level: install a fresh engine and reset the level clock.
pub fn start_level(
    commands: &mut Commands,
    level: level::LevelConfig,
    config: crate::config::EngineConfig,
) {
    info!("Starting level {}", level.number);
    commands.insert_resource(BubbleEngine::new(level, config));
    commands.insert_resource(LevelClock::default());
}
