//! The reward ledger - one reward per player per level.
//!
//! Claims are idempotent. The first claim for a level inserts the record and
//! credits its coins. A later claim can raise the stored stars and score;
//! a star raise credits only the difference to the coins the new stars are
//! worth, so a level never pays more than its best result. Concurrent
//! duplicate claims race on the store's uniqueness check, and the loser
//! takes the duplicate path.

use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use super::{
    reward::LevelReward,
    store::{PlayerAccount, RewardStore, StoreError},
    validator::{ValidationError, validate_claim},
};
use crate::config::ServerConfig;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What a claim did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// First claim for the level; coins were credited.
    Granted(LevelReward),
    /// Repeat claim with more stars or a better score; the record was
    /// raised and any coins the new stars are owed were credited.
    Improved {
        reward: LevelReward,
        coins_credited: u32,
    },
    /// Repeat claim with no improvement; nothing changed.
    AlreadyClaimed(LevelReward),
}

impl ClaimOutcome {
    pub fn reward(&self) -> &LevelReward {
        match self {
            ClaimOutcome::Granted(r)
            | ClaimOutcome::Improved { reward: r, .. }
            | ClaimOutcome::AlreadyClaimed(r) => r,
        }
    }

    /// Coins this claim credited.
    pub fn coins_earned(&self) -> u32 {
        match self {
            ClaimOutcome::Granted(r) => r.coins_awarded,
            ClaimOutcome::Improved { coins_credited, .. } => *coins_credited,
            ClaimOutcome::AlreadyClaimed(_) => 0,
        }
    }
}

pub struct RewardLedger {
    store: Arc<dyn RewardStore>,
    history_limit: usize,
}

impl RewardLedger {
    pub fn new(store: Arc<dyn RewardStore>, config: &ServerConfig) -> Self {
        Self {
            store,
            history_limit: config.history_limit,
        }
    }

    pub fn store(&self) -> &Arc<dyn RewardStore> {
        &self.store
    }

    pub fn register_player(
        &self,
        user_id: Uuid,
        email: &str,
    ) -> Result<PlayerAccount, LedgerError> {
        Ok(self.store.register_player(user_id, email)?)
    }

    /// Claim the reward for a finished level.
    pub fn claim_reward(
        &self,
        user_id: Uuid,
        level: i32,
        stars: i32,
        score: u32,
    ) -> Result<ClaimOutcome, LedgerError> {
        let (level, stars) = validate_claim(level, stars)?;
        let reward = LevelReward::claim(user_id, level, stars, score);

        match self.store.insert_reward(&reward) {
            Ok(()) => {
                info!(
                    "Granted {} coins to {} for level {} ({} stars)",
                    reward.coins_awarded, user_id, level, stars
                );
                Ok(ClaimOutcome::Granted(reward))
            }
            Err(StoreError::UniqueViolation { .. }) => {
                self.reconcile(user_id, level, stars, score)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Duplicate path: keep the best stars and score, top up coins only.
    fn reconcile(
        &self,
        user_id: Uuid,
        level: u32,
        stars: u8,
        score: u32,
    ) -> Result<ClaimOutcome, LedgerError> {
        if let Some(upgrade) = self.store.improve_reward(user_id, level, stars, score)? {
            info!(
                "Raised level {} for {} to {} stars, score {} (+{} coins)",
                level, user_id, upgrade.reward.stars, upgrade.reward.score, upgrade.coins_credited
            );
            return Ok(ClaimOutcome::Improved {
                reward: upgrade.reward,
                coins_credited: upgrade.coins_credited,
            });
        }

        let existing = self
            .store
            .find_reward(user_id, level)?
            .ok_or(StoreError::MissingReward { user_id, level })?;
        debug!("Level {} already claimed by {}", level, user_id);
        Ok(ClaimOutcome::AlreadyClaimed(existing))
    }

    /// A player's rewards, highest level first, newest first within a level.
    /// `None` uses the configured page size.
    pub fn get_user_reward_history(
        &self,
        user_id: Uuid,
        limit: Option<usize>,
    ) -> Result<Vec<LevelReward>, LedgerError> {
        let mut rewards = self.store.rewards_for(user_id)?;
        rewards.sort_by(|a, b| {
            b.level
                .cmp(&a.level)
                .then(b.claimed_at.cmp(&a.claimed_at))
        });
        rewards.truncate(limit.unwrap_or(self.history_limit));
        Ok(rewards)
    }

    /// Sum of coins awarded across the player's rewards; 0 with none.
    pub fn get_total_reward_coins(&self, user_id: Uuid) -> Result<u64, LedgerError> {
        Ok(self
            .store
            .rewards_for(user_id)?
            .iter()
            .map(|r| r.coins_awarded as u64)
            .sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::store::MemoryStore;
    use std::thread;

    fn ledger() -> (RewardLedger, Uuid) {
        let ledger = RewardLedger::new(Arc::new(MemoryStore::new()), &ServerConfig::default());
        let user = Uuid::new_v4();
        ledger.register_player(user, "ada@example.com").unwrap();
        (ledger, user)
    }

    #[test]
    fn test_double_claim_pays_once() {
        let (ledger, user) = ledger();
        let first = ledger.claim_reward(user, 1, 3, 500).unwrap();
        assert!(matches!(first, ClaimOutcome::Granted(_)));
        assert_eq!(first.coins_earned(), 15);

        let second = ledger.claim_reward(user, 1, 3, 500).unwrap();
        assert!(matches!(second, ClaimOutcome::AlreadyClaimed(_)));
        assert_eq!(second.coins_earned(), 0);

        assert_eq!(ledger.get_total_reward_coins(user).unwrap(), 15);
        assert_eq!(ledger.get_user_reward_history(user, None).unwrap().len(), 1);
    }

    #[test]
    fn test_win_after_loss_still_pays() {
        let (ledger, user) = ledger();
        let loss = ledger.claim_reward(user, 1, 0, 50).unwrap();
        assert!(matches!(loss, ClaimOutcome::Granted(_)));
        assert_eq!(loss.coins_earned(), 0);

        let win = ledger.claim_reward(user, 1, 3, 900).unwrap();
        assert!(matches!(win, ClaimOutcome::Improved { .. }));
        assert_eq!(win.coins_earned(), 15);
        assert_eq!(win.reward().stars, 3);
        assert_eq!(win.reward().coins_awarded, 15);
        assert_eq!(ledger.get_total_reward_coins(user).unwrap(), 15);
        assert_eq!(ledger.store().account(user).unwrap().unwrap().coins, 15);

        let replay = ledger.claim_reward(user, 1, 3, 900).unwrap();
        assert!(matches!(replay, ClaimOutcome::AlreadyClaimed(_)));
        assert_eq!(ledger.get_total_reward_coins(user).unwrap(), 15);
    }

    #[test]
    fn test_star_raise_credits_only_the_difference() {
        let (ledger, user) = ledger();
        ledger.claim_reward(user, 2, 2, 100).unwrap();
        let replay = ledger.claim_reward(user, 2, 3, 400).unwrap();
        assert_eq!(replay.coins_earned(), 5);
        assert_eq!(ledger.get_total_reward_coins(user).unwrap(), 15);
        assert_eq!(ledger.store().account(user).unwrap().unwrap().coins, 15);
    }

    #[test]
    fn test_better_score_same_stars_is_kept() {
        let (ledger, user) = ledger();
        ledger.claim_reward(user, 1, 3, 100).unwrap();
        let replay = ledger.claim_reward(user, 1, 3, 900).unwrap();
        assert!(matches!(replay, ClaimOutcome::Improved { .. }));
        assert_eq!(replay.coins_earned(), 0);
        assert_eq!(replay.reward().score, 900);
        assert_eq!(ledger.get_total_reward_coins(user).unwrap(), 15);

        let worse = ledger.claim_reward(user, 1, 2, 300).unwrap();
        assert!(matches!(worse, ClaimOutcome::AlreadyClaimed(_)));
        assert_eq!(worse.reward().stars, 3);
        assert_eq!(worse.reward().score, 900);
    }

    #[test]
    fn test_concurrent_claims_pay_once() {
        let (ledger, user) = ledger();
        let ledger = Arc::new(ledger);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ledger = Arc::clone(&ledger);
                thread::spawn(move || ledger.claim_reward(user, 3, 2, 250).unwrap())
            })
            .collect();
        let outcomes: Vec<ClaimOutcome> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let granted = outcomes
            .iter()
            .filter(|o| matches!(o, ClaimOutcome::Granted(_)))
            .count();
        assert_eq!(granted, 1);
        assert_eq!(ledger.get_total_reward_coins(user).unwrap(), 10);
        assert_eq!(ledger.store().account(user).unwrap().unwrap().coins, 10);
    }

    #[test]
    fn test_invalid_claims_write_nothing() {
        let (ledger, user) = ledger();
        assert!(matches!(
            ledger.claim_reward(user, 1, 5, 0),
            Err(LedgerError::Validation(ValidationError::InvalidStars(5)))
        ));
        assert!(matches!(
            ledger.claim_reward(user, 0, 3, 0),
            Err(LedgerError::Validation(ValidationError::InvalidLevel(0)))
        ));
        assert!(ledger.get_user_reward_history(user, None).unwrap().is_empty());
    }

    #[test]
    fn test_history_order_and_limit() {
        let (ledger, user) = ledger();
        for level in [3, 1, 4, 2, 5] {
            ledger.claim_reward(user, level, 2, 100).unwrap();
        }
        let levels: Vec<u32> = ledger
            .get_user_reward_history(user, Some(3))
            .unwrap()
            .iter()
            .map(|r| r.level)
            .collect();
        assert_eq!(levels, vec![5, 4, 3]);
        assert_eq!(ledger.get_user_reward_history(user, None).unwrap().len(), 5);
    }

    #[test]
    fn test_history_page_of_two() {
        let (ledger, user) = ledger();
        for level in [1, 3, 5] {
            ledger.claim_reward(user, level, 3, 100).unwrap();
        }
        let page = ledger.get_user_reward_history(user, Some(2)).unwrap();
        assert_eq!(page.iter().map(|r| r.level).collect::<Vec<_>>(), vec![5, 3]);
        assert_eq!(ledger.get_total_reward_coins(user).unwrap(), 45);
    }

    #[test]
    fn test_total_coins_is_zero_for_new_players() {
        let (ledger, _) = ledger();
        assert_eq!(ledger.get_total_reward_coins(Uuid::new_v4()).unwrap(), 0);
    }
}
