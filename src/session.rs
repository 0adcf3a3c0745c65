//! The play-session summary a client reports when a level ends.
//!
//! Shared by the engine, which builds it, and the backend, which treats
//! every field as untrusted.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::game::abilities::AbilityKind;

/// Summary of one finished level, as sent in `POST /game/session`.
///
/// `level` and `stars` are signed so that malformed input survives
/// deserialization and is rejected by validation instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSession {
    pub level: i32,
    pub score: u32,
    /// Shots taken.
    pub moves: u32,
    pub stars: i32,
    /// Seconds spent in the level.
    pub duration: f32,
    #[serde(default)]
    pub abilities_used: BTreeMap<AbilityKind, u32>,
    pub bubbles_destroyed: u32,
    pub chain_reactions: u32,
    pub perfect_shots: u32,
    pub is_win: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_shape_is_camel_case() {
        let json = r#"{
            "level": 4,
            "score": 1200,
            "moves": 18,
            "stars": 3,
            "duration": 61.5,
            "abilitiesUsed": { "bomb": 1, "fire": 2 },
            "bubblesDestroyed": 57,
            "chainReactions": 3,
            "perfectShots": 2,
            "isWin": true
        }"#;
        let session: GameSession = serde_json::from_str(json).unwrap();
        assert_eq!(session.level, 4);
        assert_eq!(session.abilities_used[&AbilityKind::Fire], 2);
        assert!(session.is_win);

        let back = serde_json::to_value(&session).unwrap();
        assert_eq!(back["bubblesDestroyed"], 57);
        assert_eq!(back["abilitiesUsed"]["bomb"], 1);
    }
}
