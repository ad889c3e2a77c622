use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Kind of target fought
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum FightType {
    Prism,
    /// Percepteur (tax collector) fight
    Keep,
    #[default]
    Unknown,
}

impl FightType {
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prism => "prism",
            Self::Keep => "keep",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FightType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether our roster was on the winning side
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Won,
    Lost,
    #[default]
    Unknown,
}

impl Outcome {
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Won => "won",
            Self::Lost => "lost",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result parsed from one screenshot
///
/// Sets are ordered so iteration (and therefore display and hashing input)
/// is deterministic.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParsedOutcome {
    pub winners: BTreeSet<String>,
    pub losers: BTreeSet<String>,
    pub fight_type: FightType,
    pub outcome: Outcome,
}

impl ParsedOutcome {
    pub fn new(
        winners: impl IntoIterator<Item = impl Into<String>>,
        losers: impl IntoIterator<Item = impl Into<String>>,
        fight_type: FightType,
        outcome: Outcome,
    ) -> Self {
        Self {
            winners: winners.into_iter().map(Into::into).collect(),
            losers: losers.into_iter().map(Into::into).collect(),
            fight_type,
            outcome,
        }
    }

    pub fn participant_count(&self) -> usize {
        self.winners.len() + self.losers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.winners.is_empty() && self.losers.is_empty()
    }
}
