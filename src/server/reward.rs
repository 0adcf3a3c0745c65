//! Reward records and the stars-to-coins table.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Coins for three stars.
pub const THREE_STAR_COINS: u32 = 15;
/// Coins for two stars.
pub const TWO_STAR_COINS: u32 = 10;

/// Coins granted for a star rating. Only two- and three-star finishes pay.
pub fn compute_reward(stars: u8) -> u32 {
    match stars {
        3 => THREE_STAR_COINS,
        2 => TWO_STAR_COINS,
        _ => 0,
    }
}

/// The authoritative reward for one player on one level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelReward {
    pub user_id: Uuid,
    pub level: u32,
    pub stars: u8,
    pub coins_awarded: u32,
    pub reward_claimed: bool,
    /// Unix time in milliseconds.
    pub claimed_at: u64,
    /// Best score seen for the level.
    pub score: u32,
}

impl LevelReward {
    /// A freshly claimed reward, stamped now.
    pub fn claim(user_id: Uuid, level: u32, stars: u8, score: u32) -> Self {
        Self {
            user_id,
            level,
            stars,
            coins_awarded: compute_reward(stars),
            reward_claimed: true,
            claimed_at: now_millis(),
            score,
        }
    }
}

/// Milliseconds since the Unix epoch; 0 if the clock is before it.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
