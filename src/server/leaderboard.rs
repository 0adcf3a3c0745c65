//! Leaderboard rows built from reward records.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::{reward::LevelReward, store::PlayerAccount};

/// One ranked row, as returned by `GET /leaderboard`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub display_name: String,
    pub total_score: u64,
    /// 1-based position.
    pub rank: u32,
}

/// The public name for an email: its local part.
pub fn display_name(email: &str) -> String {
    email.split('@').next().unwrap_or(email).to_string()
}

/// Rank players by the sum of their best level scores, highest first. Ties
/// are broken by name so the order is stable.
pub fn build_leaderboard(
    rewards: &[LevelReward],
    accounts: &[PlayerAccount],
    limit: usize,
) -> Vec<LeaderboardEntry> {
    let mut totals: BTreeMap<Uuid, u64> = BTreeMap::new();
    for reward in rewards {
        *totals.entry(reward.user_id).or_default() += reward.score as u64;
    }

    let names: BTreeMap<Uuid, String> = accounts
        .iter()
        .map(|a| (a.user_id, display_name(&a.email)))
        .collect();

    let mut rows: Vec<(String, u64)> = totals
        .into_iter()
        .map(|(user_id, total)| {
            let name = names
                .get(&user_id)
                .cloned()
                .unwrap_or_else(|| format!("player-{}", &user_id.simple().to_string()[..8]));
            (name, total)
        })
        .collect();
    rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    rows.into_iter()
        .take(limit)
        .enumerate()
        .map(|(i, (display_name, total_score))| LeaderboardEntry {
            display_name,
            total_score,
            rank: i as u32 + 1,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(email: &str) -> PlayerAccount {
        PlayerAccount {
            user_id: Uuid::new_v4(),
            email: email.to_string(),
            coins: 0,
        }
    }

    #[test]
    fn test_display_name_strips_domain() {
        assert_eq!(display_name("ada@example.com"), "ada");
        assert_eq!(display_name("no-at-sign"), "no-at-sign");
    }

    #[test]
    fn test_ranks_by_total_score() {
        let ada = account("ada@example.com");
        let bob = account("bob@example.com");
        let rewards = vec![
            LevelReward::claim(ada.user_id, 1, 3, 300),
            LevelReward::claim(bob.user_id, 1, 3, 500),
            LevelReward::claim(ada.user_id, 2, 2, 400),
        ];
        let board = build_leaderboard(&rewards, &[ada, bob], 10);
        assert_eq!(board.len(), 2);
        assert_eq!(board[0].display_name, "ada");
        assert_eq!(board[0].total_score, 700);
        assert_eq!(board[0].rank, 1);
        assert_eq!(board[1].display_name, "bob");
        assert_eq!(board[1].rank, 2);
    }

    #[test]
    fn test_limit_applies() {
        let accounts: Vec<_> = (0..5).map(|i| account(&format!("p{i}@example.com"))).collect();
        let rewards: Vec<_> = accounts
            .iter()
            .enumerate()
            .map(|(i, a)| LevelReward::claim(a.user_id, 1, 1, i as u32 * 10))
            .collect();
        let board = build_leaderboard(&rewards, &accounts, 3);
        assert_eq!(board.len(), 3);
        assert_eq!(board[0].display_name, "p4");
    }
}
