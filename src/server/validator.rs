//! Checks on client-reported sessions.
//!
//! Everything in a [`GameSession`] is untrusted. Only the level and star
//! count feed the economy; score and bubble counts never change coins.

use thiserror::Error;

use super::reward::compute_reward;
use crate::session::GameSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("stars must be between 0 and 3, got {0}")]
    InvalidStars(i32),
    #[error("level must be at least 1, got {0}")]
    InvalidLevel(i32),
}

/// A session that passed validation, with the coins it is worth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatedSession {
    pub level: u32,
    pub stars: u8,
    pub score: u32,
    pub coins: u32,
}

/// Check a raw level and star count.
pub fn validate_claim(level: i32, stars: i32) -> Result<(u32, u8), ValidationError> {
    if level < 1 {
        return Err(ValidationError::InvalidLevel(level));
    }
    if !(0..=3).contains(&stars) {
        return Err(ValidationError::InvalidStars(stars));
    }
    Ok((level as u32, stars as u8))
}

pub fn validate_session(session: &GameSession) -> Result<ValidatedSession, ValidationError> {
    let (level, stars) = validate_claim(session.level, session.stars)?;
    Ok(ValidatedSession {
        level,
        stars,
        score: session.score,
        coins: compute_reward(stars),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(level: i32, stars: i32, score: u32) -> GameSession {
        GameSession {
            level,
            score,
            moves: 12,
            stars,
            duration: 30.0,
            abilities_used: Default::default(),
            bubbles_destroyed: 40,
            chain_reactions: 2,
            perfect_shots: 1,
            is_win: true,
        }
    }

    #[test]
    fn test_rejects_out_of_range_stars() {
        assert_eq!(validate_session(&session(1, 4, 0)), Err(ValidationError::InvalidStars(4)));
        assert_eq!(validate_session(&session(1, -1, 0)), Err(ValidationError::InvalidStars(-1)));
    }

    #[test]
    fn test_rejects_bad_level() {
        assert_eq!(validate_session(&session(0, 2, 0)), Err(ValidationError::InvalidLevel(0)));
    }

    #[test]
    fn test_score_does_not_buy_coins() {
        let low = validate_session(&session(2, 1, u32::MAX)).unwrap();
        assert_eq!(low.coins, 0);
        let high = validate_session(&session(2, 3, 0)).unwrap();
        assert_eq!(high.coins, 15);
    }
}
