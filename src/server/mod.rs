//! The reward backend: session validation, the reward ledger and the
//! leaderboard. Nothing here depends on Bevy.

pub mod api;
pub mod leaderboard;
pub mod ledger;
pub mod reward;
pub mod store;
pub mod validator;

pub use api::{ApiError, GameApi, LeaderboardQuery, SessionResponse};
pub use ledger::{ClaimOutcome, LedgerError, RewardLedger};
pub use store::{MemoryStore, RewardStore, RewardUpgrade, StoreError};
