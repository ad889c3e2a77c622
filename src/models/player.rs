use crate::models::fight::FightType;
use serde::{Deserialize, Serialize};

/// Win/loss counters for one fight type
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FightCounters {
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub losses: u32,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub unpaid_wins: u32,
    #[serde(default)]
    pub unpaid_losses: u32,
}

impl FightCounters {
    fn record_win(&mut self) {
        self.wins += 1;
        self.total += 1;
        self.unpaid_wins += 1;
    }

    fn record_loss(&mut self) {
        self.losses += 1;
        self.total += 1;
        self.unpaid_losses += 1;
    }

    fn clear_unpaid(&mut self) {
        self.unpaid_wins = 0;
        self.unpaid_losses = 0;
    }
}

/// Persisted statistics of one registered player
///
/// Every field has a serde default so records written by older versions
/// load without runtime presence checks.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerRecord {
    pub primary_name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub prism: FightCounters,
    #[serde(default)]
    pub keep: FightCounters,
    #[serde(default)]
    pub has_unpaid_changes: bool,
    /// Unix timestamps (millis) of counted fights
    #[serde(default)]
    pub fight_times: Vec<i64>,
}

impl PlayerRecord {
    pub fn new(primary_name: impl Into<String>) -> Self {
        Self {
            primary_name: primary_name.into(),
            ..Self::default()
        }
    }

    pub fn with_aliases(mut self, aliases: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    pub fn counters(&self, fight_type: FightType) -> Option<&FightCounters> {
        match fight_type {
            FightType::Prism => Some(&self.prism),
            FightType::Keep => Some(&self.keep),
            FightType::Unknown => None,
        }
    }

    fn counters_mut(&mut self, fight_type: FightType) -> Option<&mut FightCounters> {
        match fight_type {
            FightType::Prism => Some(&mut self.prism),
            FightType::Keep => Some(&mut self.keep),
            FightType::Unknown => None,
        }
    }

    /// Count a win. Returns false (nothing changed) for an unknown fight type.
    pub fn record_win(&mut self, fight_type: FightType, at_millis: i64) -> bool {
        match self.counters_mut(fight_type) {
            Some(counters) => {
                counters.record_win();
                self.mark_changed(at_millis);
                true
            }
            None => false,
        }
    }

    /// Count a loss. Returns false (nothing changed) for an unknown fight type.
    pub fn record_loss(&mut self, fight_type: FightType, at_millis: i64) -> bool {
        match self.counters_mut(fight_type) {
            Some(counters) => {
                counters.record_loss();
                self.mark_changed(at_millis);
                true
            }
            None => false,
        }
    }

    fn mark_changed(&mut self, at_millis: i64) {
        self.has_unpaid_changes = true;
        self.fight_times.push(at_millis);
    }

    /// Clear unpaid state. Returns whether the record had anything unpaid.
    pub fn mark_paid(&mut self) -> bool {
        if !self.has_unpaid_changes {
            return false;
        }
        self.has_unpaid_changes = false;
        self.prism.clear_unpaid();
        self.keep.clear_unpaid();
        true
    }

    /// Primary name or any alias equals `name`
    pub fn answers_to(&self, name: &str) -> bool {
        self.primary_name == name || self.aliases.iter().any(|a| a == name)
    }
}
