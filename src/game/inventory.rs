//! Ability inventory - how many of each elemental shot the player holds.
//!
//! The inventory belongs to one engine and is handed in when the level
//! starts, so parallel simulations never share counts.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::abilities::AbilityKind;

/// Ability counts for one level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityInventory {
    counts: BTreeMap<AbilityKind, u32>,
}

impl AbilityInventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// One of every ability.
    pub fn starter() -> Self {
        AbilityKind::ACTIVE
            .into_iter()
            .fold(Self::new(), |inventory, kind| inventory.with(kind, 1))
    }

    pub fn with(mut self, kind: AbilityKind, count: u32) -> Self {
        self.add(kind, count);
        self
    }

    pub fn count(&self, kind: AbilityKind) -> u32 {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    /// Plain shots are always available.
    pub fn has(&self, kind: AbilityKind) -> bool {
        kind.is_none() || self.count(kind) > 0
    }

    pub fn add(&mut self, kind: AbilityKind, count: u32) {
        if kind.is_none() || count == 0 {
            return;
        }
        *self.counts.entry(kind).or_default() += count;
    }

    /// Use one charge. Returns false when none is left.
    pub fn consume(&mut self, kind: AbilityKind) -> bool {
        if kind.is_none() {
            return true;
        }
        match self.counts.get_mut(&kind) {
            Some(count) if *count > 0 => {
                *count -= 1;
                true
            }
            _ => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (AbilityKind, u32)> + '_ {
        self.counts.iter().map(|(kind, count)| (*kind, *count))
    }
}
