//! Projectile - the bubble being shot, and where it comes to rest.
//!
//! The projectile travels in a straight line in fixed steps, bouncing off
//! the side walls, until it touches a grid bubble or the ceiling. It then
//! snaps to the best empty cell next to whatever it hit.

use bevy::prelude::*;
use std::cmp::Ordering;

use super::{
    abilities::{AbilityKind, LineMode},
    bubble::BubbleColor,
    engine::ShotError,
    grid::{BubbleGrid, GridBounds},
    hex::{HEX_SIZE, HexCoord, ROW_HEIGHT},
};

/// Distance travelled per simulation tick, small enough not to tunnel
/// through a bubble.
pub const PROJECTILE_STEP: f32 = HEX_SIZE * 0.25;

/// Collision radius of the projectile against the walls.
pub const PROJECTILE_RADIUS: f32 = HEX_SIZE * 0.9;

/// Center distance below which the projectile touches a grid bubble.
pub const COLLISION_DISTANCE: f32 = HEX_SIZE * 1.8;

/// Maximum angle from vertical (in radians) - prevents shooting too horizontally.
pub const MAX_AIM_ANGLE: f32 = 1.3; // About 75 degrees

/// Distances or angles closer than this are treated as equal.
const TIE_EPSILON: f32 = 1e-3;

/// A bubble in flight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projectile {
    /// Launch position in field space.
    pub origin: Vec2,
    /// Unit direction, pointing up the field (negative y).
    pub direction: Vec2,
    pub color: BubbleColor,
    pub ability: AbilityKind,
    pub mode: LineMode,
}

impl Projectile {
    /// A plain projectile; the direction is normalized and clamped.
    pub fn new(origin: Vec2, direction: Vec2, color: BubbleColor) -> Self {
        Self {
            origin,
            direction: clamp_aim(direction),
            color,
            ability: AbilityKind::None,
            mode: LineMode::Column,
        }
    }

    pub fn with_ability(mut self, ability: AbilityKind, mode: LineMode) -> Self {
        self.ability = ability;
        self.mode = mode;
        self
    }
}

/// Normalize an aim direction and keep it within [`MAX_AIM_ANGLE`] of
/// straight up. A zero or non-finite vector aims straight up.
pub fn clamp_aim(direction: Vec2) -> Vec2 {
    if !direction.is_finite() || direction.length_squared() <= f32::EPSILON {
        return Vec2::NEG_Y;
    }
    let angle = direction.x.atan2(-direction.y).clamp(-MAX_AIM_ANGLE, MAX_AIM_ANGLE);
    Vec2::new(angle.sin(), -angle.cos())
}

/// Where the shooter sits: centered, two cells below the last row.
pub fn shooter_origin(bounds: GridBounds) -> Vec2 {
    Vec2::new(
        bounds.right_wall() / 2.0,
        HEX_SIZE + ROW_HEIGHT * bounds.rows as f32 + HEX_SIZE * 2.0,
    )
}

/// Where a projectile came to rest.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Landing {
    /// The empty cell the projectile snaps to.
    pub cell: HexCoord,
    /// The grid bubble it touched; `None` for the ceiling.
    pub hit: Option<HexCoord>,
    pub bounces: u32,
}

/// Trace a projectile through the field and pick its landing cell.
///
/// Fails with [`ShotError::NoLandingCell`] when the board is saturated and
/// no empty cell can take the bubble.
pub fn resolve_landing(grid: &BubbleGrid, projectile: &Projectile) -> Result<Landing, ShotError> {
    let right_wall = grid.bounds().right_wall();
    let mut pos = projectile.origin;
    let mut dir = clamp_aim(projectile.direction);
    let mut bounces = 0;

    loop {
        pos += dir * PROJECTILE_STEP;

        if pos.x - PROJECTILE_RADIUS < 0.0 {
            pos.x = PROJECTILE_RADIUS;
            dir.x = dir.x.abs();
            bounces += 1;
        }
        if pos.x + PROJECTILE_RADIUS > right_wall {
            pos.x = right_wall - PROJECTILE_RADIUS;
            dir.x = -dir.x.abs();
            bounces += 1;
        }

        if let Some(hit) = first_overlap(grid, pos) {
            let cell = pick_cell(grid.empty_neighbors(hit), pos, dir)
                .or_else(|| grid.closest_empty_cell(pos))
                .ok_or(ShotError::NoLandingCell)?;
            return Ok(Landing {
                cell,
                hit: Some(hit),
                bounces,
            });
        }

        if pos.y - PROJECTILE_RADIUS <= 0.0 {
            let ceiling = grid
                .row_cells(0)
                .into_iter()
                .filter(|c| !grid.is_occupied(*c))
                .collect();
            let cell = pick_cell(ceiling, pos, dir)
                .or_else(|| grid.closest_empty_cell(pos))
                .ok_or(ShotError::NoLandingCell)?;
            return Ok(Landing {
                cell,
                hit: None,
                bounces,
            });
        }
    }
}

/// The occupied cell closest to `pos` within collision distance.
fn first_overlap(grid: &BubbleGrid, pos: Vec2) -> Option<HexCoord> {
    grid.coords()
        .map(|c| (c, c.to_pixel().distance(pos)))
        .filter(|(_, d)| *d < COLLISION_DISTANCE)
        .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))
        .map(|(c, _)| c)
}

/// Nearest candidate to the impact point; ties go to the smallest
/// deviation from the incoming direction, then the smallest row, then the
/// smallest column.
fn pick_cell(candidates: Vec<HexCoord>, pos: Vec2, dir: Vec2) -> Option<HexCoord> {
    let deviation = |c: &HexCoord| {
        let to_cell = (c.to_pixel() - pos).normalize_or_zero();
        dir.dot(to_cell).clamp(-1.0, 1.0).acos()
    };
    let approx = |a: f32, b: f32| {
        if (a - b).abs() <= TIE_EPSILON {
            Ordering::Equal
        } else {
            a.total_cmp(&b)
        }
    };

    candidates.into_iter().min_by(|a, b| {
        approx(a.to_pixel().distance(pos), b.to_pixel().distance(pos))
            .then_with(|| approx(deviation(a), deviation(b)))
            .then_with(|| a.cmp(b))
    })
}
