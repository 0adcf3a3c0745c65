//! Handlers for the two game endpoints, independent of any transport.
//!
//! - `POST /game/session` takes a [`GameSession`] and answers with a
//!   [`SessionResponse`].
//! - `GET /leaderboard?limit=N` answers with ranked [`LeaderboardEntry`]s.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    leaderboard::{LeaderboardEntry, build_leaderboard},
    ledger::{LedgerError, RewardLedger},
    reward::now_millis,
    store::{RewardStore, SessionRecord, StoreError},
    validator::{ValidationError, validate_session},
};
use crate::{config::ServerConfig, session::GameSession};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid session: {0}")]
    Validation(#[from] ValidationError),
    #[error("storage failure: {0}")]
    Storage(#[from] StoreError),
}

impl ApiError {
    /// The HTTP status a transport should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::Validation(_) => 400,
            ApiError::Storage(_) => 500,
        }
    }
}

impl From<LedgerError> for ApiError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::Validation(e) => ApiError::Validation(e),
            LedgerError::Store(e) => ApiError::Storage(e),
        }
    }
}

/// Body of a `POST /game/session` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub coins_earned: u32,
}

/// Query of `GET /leaderboard`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardQuery {
    pub limit: Option<usize>,
}

pub struct GameApi {
    ledger: RewardLedger,
    config: ServerConfig,
}

impl GameApi {
    pub fn new(store: Arc<dyn RewardStore>, config: ServerConfig) -> Self {
        Self {
            ledger: RewardLedger::new(store, &config),
            config,
        }
    }

    pub fn ledger(&self) -> &RewardLedger {
        &self.ledger
    }

    /// `POST /game/session` for an authenticated player.
    pub fn submit_session(
        &self,
        user_id: Uuid,
        session: &GameSession,
    ) -> Result<SessionResponse, ApiError> {
        let validated = validate_session(session).inspect_err(|e| {
            warn!("Rejected session from {}: {}", user_id, e);
        })?;

        let outcome = self.ledger.claim_reward(
            user_id,
            validated.level as i32,
            validated.stars as i32,
            validated.score,
        )?;

        let session_id = Uuid::new_v4();
        self.ledger.store().record_session(SessionRecord {
            session_id,
            user_id,
            session: session.clone(),
            received_at: now_millis(),
        })?;

        info!(
            "Session {} for level {}: {} stars, {} coins",
            session_id,
            validated.level,
            validated.stars,
            outcome.coins_earned()
        );
        Ok(SessionResponse {
            session_id,
            coins_earned: outcome.coins_earned(),
        })
    }

    /// `GET /leaderboard`; the limit defaults and is capped per config.
    pub fn leaderboard(&self, query: LeaderboardQuery) -> Result<Vec<LeaderboardEntry>, ApiError> {
        let limit = query
            .limit
            .unwrap_or(self.config.leaderboard_limit)
            .min(self.config.max_leaderboard_limit);
        let store = self.ledger.store();
        Ok(build_leaderboard(&store.all_rewards()?, &store.accounts()?, limit))
    }
}
