//! Elemental Pop: a bubble-shooter engine with elemental abilities, and the
//! reward backend that turns finished levels into coins.

pub mod config;
pub mod game;
pub mod server;
pub mod session;

use bevy::prelude::*;

/// Everything the game side needs: the engine types and its systems.
pub fn plugin(app: &mut App) {
    app.add_plugins(game::plugin);
}
