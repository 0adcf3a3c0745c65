//! Storage behind the reward ledger.
//!
//! [`RewardStore`] is the seam a database would plug into. [`MemoryStore`]
//! keeps everything in one `RwLock`ed set of tables, which makes every
//! write-and-credit step a single critical section, and can snapshot to
//! JSON on disk.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::RwLock;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use super::reward::{LevelReward, compute_reward};
use crate::session::GameSession;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A reward for this player and level already exists.
    #[error("reward for level {level} already exists for {user_id}")]
    UniqueViolation { user_id: Uuid, level: u32 },
    #[error("no reward for level {level} for {user_id}")]
    MissingReward { user_id: Uuid, level: u32 },
    #[error("unknown player {0}")]
    UnknownPlayer(Uuid),
    #[error("snapshot i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot is malformed: {0}")]
    Serde(#[from] serde_json::Error),
}

/// A player's coin balance and contact address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerAccount {
    pub user_id: Uuid,
    pub email: String,
    pub coins: u64,
}

/// One accepted session submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub session: GameSession,
    /// Unix time in milliseconds.
    pub received_at: u64,
}

pub trait RewardStore: Send + Sync {
    fn register_player(&self, user_id: Uuid, email: &str) -> Result<PlayerAccount, StoreError>;

    fn account(&self, user_id: Uuid) -> Result<Option<PlayerAccount>, StoreError>;

    fn accounts(&self) -> Result<Vec<PlayerAccount>, StoreError>;

    /// Insert a reward and credit its coins to the player, atomically.
    ///
    /// Fails with [`StoreError::UniqueViolation`] if the player already has
    /// a reward for the level; nothing is written in that case.
    fn insert_reward(&self, reward: &LevelReward) -> Result<(), StoreError>;

    /// Raise an existing reward to the better of its stored and the given
    /// stars and score, atomically.
    ///
    /// A star raise tops the record's coins up to what the new stars pay and
    /// credits only the difference, so a level never pays more than its best
    /// star count is worth. Returns `None` when nothing improved.
    fn improve_reward(
        &self,
        user_id: Uuid,
        level: u32,
        stars: u8,
        score: u32,
    ) -> Result<Option<RewardUpgrade>, StoreError>;

    fn find_reward(&self, user_id: Uuid, level: u32) -> Result<Option<LevelReward>, StoreError>;

    fn rewards_for(&self, user_id: Uuid) -> Result<Vec<LevelReward>, StoreError>;

    fn all_rewards(&self) -> Result<Vec<LevelReward>, StoreError>;

    fn record_session(&self, record: SessionRecord) -> Result<(), StoreError>;

    fn sessions_for(&self, user_id: Uuid) -> Result<Vec<SessionRecord>, StoreError>;
}

/// A raised reward and the coins the raise credited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardUpgrade {
    pub reward: LevelReward,
    pub coins_credited: u32,
}

#[derive(Debug, Default)]
struct Tables {
    rewards: BTreeMap<(Uuid, u32), LevelReward>,
    accounts: BTreeMap<Uuid, PlayerAccount>,
    sessions: Vec<SessionRecord>,
}

/// On-disk form of [`MemoryStore`].
#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    accounts: Vec<PlayerAccount>,
    rewards: Vec<LevelReward>,
    sessions: Vec<SessionRecord>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a store from a snapshot file.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let contents = fs::read_to_string(path)?;
        let snapshot: Snapshot = serde_json::from_str(&contents)?;
        info!(
            "Loaded ledger from {:?}: {} players, {} rewards",
            path,
            snapshot.accounts.len(),
            snapshot.rewards.len()
        );

        let tables = Tables {
            accounts: snapshot
                .accounts
                .into_iter()
                .map(|a| (a.user_id, a))
                .collect(),
            rewards: snapshot
                .rewards
                .into_iter()
                .map(|r| ((r.user_id, r.level), r))
                .collect(),
            sessions: snapshot.sessions,
        };
        Ok(Self {
            tables: RwLock::new(tables),
        })
    }

    /// Load the snapshot at `path`, or start empty if there is none yet.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if path.exists() {
            Self::load(path)
        } else {
            info!("No ledger at {:?}, starting empty", path);
            Ok(Self::new())
        }
    }

    /// Write a snapshot file, creating its directory if needed.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let snapshot = {
            let tables = self.tables.read().unwrap_or_else(|e| e.into_inner());
            Snapshot {
                accounts: tables.accounts.values().cloned().collect(),
                rewards: tables.rewards.values().cloned().collect(),
                sessions: tables.sessions.clone(),
            }
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(&snapshot)?)?;
        debug!("Saved ledger to {:?}", path);
        Ok(())
    }
}

impl RewardStore for MemoryStore {
    fn register_player(&self, user_id: Uuid, email: &str) -> Result<PlayerAccount, StoreError> {
        let mut tables = self.tables.write().unwrap_or_else(|e| e.into_inner());
        let account = tables
            .accounts
            .entry(user_id)
            .or_insert_with(|| PlayerAccount {
                user_id,
                email: email.to_string(),
                coins: 0,
            });
        Ok(account.clone())
    }

    fn account(&self, user_id: Uuid) -> Result<Option<PlayerAccount>, StoreError> {
        let tables = self.tables.read().unwrap_or_else(|e| e.into_inner());
        Ok(tables.accounts.get(&user_id).cloned())
    }

    fn accounts(&self) -> Result<Vec<PlayerAccount>, StoreError> {
        let tables = self.tables.read().unwrap_or_else(|e| e.into_inner());
        Ok(tables.accounts.values().cloned().collect())
    }

    fn insert_reward(&self, reward: &LevelReward) -> Result<(), StoreError> {
        let mut tables = self.tables.write().unwrap_or_else(|e| e.into_inner());
        let key = (reward.user_id, reward.level);
        if tables.rewards.contains_key(&key) {
            return Err(StoreError::UniqueViolation {
                user_id: reward.user_id,
                level: reward.level,
            });
        }

        let account = tables
            .accounts
            .get_mut(&reward.user_id)
            .ok_or(StoreError::UnknownPlayer(reward.user_id))?;
        account.coins = account.coins.saturating_add(reward.coins_awarded as u64);
        tables.rewards.insert(key, reward.clone());
        Ok(())
    }

    fn improve_reward(
        &self,
        user_id: Uuid,
        level: u32,
        stars: u8,
        score: u32,
    ) -> Result<Option<RewardUpgrade>, StoreError> {
        let mut guard = self.tables.write().unwrap_or_else(|e| e.into_inner());
        let tables = &mut *guard;
        let reward = tables
            .rewards
            .get_mut(&(user_id, level))
            .ok_or(StoreError::MissingReward { user_id, level })?;
        if stars <= reward.stars && score <= reward.score {
            return Ok(None);
        }

        let owed = compute_reward(stars);
        let coins_credited = if stars > reward.stars {
            owed.saturating_sub(reward.coins_awarded)
        } else {
            0
        };
        if coins_credited > 0 {
            let account = tables
                .accounts
                .get_mut(&user_id)
                .ok_or(StoreError::UnknownPlayer(user_id))?;
            account.coins = account.coins.saturating_add(coins_credited as u64);
        }

        if stars > reward.stars {
            reward.stars = stars;
            reward.coins_awarded = reward.coins_awarded.max(owed);
        }
        reward.score = reward.score.max(score);
        Ok(Some(RewardUpgrade {
            reward: reward.clone(),
            coins_credited,
        }))
    }

    fn find_reward(&self, user_id: Uuid, level: u32) -> Result<Option<LevelReward>, StoreError> {
        let tables = self.tables.read().unwrap_or_else(|e| e.into_inner());
        Ok(tables.rewards.get(&(user_id, level)).cloned())
    }

    fn rewards_for(&self, user_id: Uuid) -> Result<Vec<LevelReward>, StoreError> {
        let tables = self.tables.read().unwrap_or_else(|e| e.into_inner());
        Ok(tables
            .rewards
            .range((user_id, 0)..=(user_id, u32::MAX))
            .map(|(_, r)| r.clone())
            .collect())
    }

    fn all_rewards(&self) -> Result<Vec<LevelReward>, StoreError> {
        let tables = self.tables.read().unwrap_or_else(|e| e.into_inner());
        Ok(tables.rewards.values().cloned().collect())
    }

    fn record_session(&self, record: SessionRecord) -> Result<(), StoreError> {
        let mut tables = self.tables.write().unwrap_or_else(|e| e.into_inner());
        tables.sessions.push(record);
        Ok(())
    }

    fn sessions_for(&self, user_id: Uuid) -> Result<Vec<SessionRecord>, StoreError> {
        let tables = self.tables.read().unwrap_or_else(|e| e.into_inner());
        Ok(tables
            .sessions
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect())
    }
}
