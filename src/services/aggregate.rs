//! Accumulated result of one submission.
//!
//! A submission may span several screenshots of the same fight. Each parsed
//! screenshot is merged in, the submitter reviews and corrects the result,
//! and on confirmation the aggregate updates the matching player records.

use crate::error::{AggregateError, ConflictError};
use crate::models::fight::{FightType, Outcome, ParsedOutcome};
use crate::models::player::PlayerRecord;
use crate::services::ocr::normalizer::normalize_text;
use crate::services::ocr::separator::infer_outcome;
use sha2::{Digest, Sha256};
use std::collections::{BTreeSet, HashSet};
use std::fmt;

/// Lifecycle of one aggregate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateState {
    Empty,
    Accumulating,
    UnderReview,
    Finalized,
    Discarded,
}

impl AggregateState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finalized | Self::Discarded)
    }
}

impl fmt::Display for AggregateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Empty => "empty",
            Self::Accumulating => "accumulating",
            Self::UnderReview => "under review",
            Self::Finalized => "finalized",
            Self::Discarded => "discarded",
        };
        f.write_str(s)
    }
}

/// Merge two partial results without touching either of them.
///
/// Fails when both carry a known and different fight type. The first known
/// outcome is kept; a disagreement is logged.
pub fn merge_outcomes(
    first: &ParsedOutcome,
    second: &ParsedOutcome,
) -> Result<ParsedOutcome, ConflictError> {
    let fight_type = merge_fight_type(first.fight_type, second.fight_type)?;
    let outcome = merge_outcome(first.outcome, second.outcome);

    let mut winners: BTreeSet<String> = first.winners.union(&second.winners).cloned().collect();
    let losers: BTreeSet<String> = first.losers.union(&second.losers).cloned().collect();
    drop_overlap(&mut winners, &losers);

    Ok(ParsedOutcome {
        winners,
        losers,
        fight_type,
        outcome,
    })
}

fn merge_fight_type(left: FightType, right: FightType) -> Result<FightType, ConflictError> {
    match (left.is_known(), right.is_known()) {
        (true, true) if left != right => Err(ConflictError { left, right }),
        (true, _) => Ok(left),
        (false, _) => Ok(right),
    }
}

fn merge_outcome(left: Outcome, right: Outcome) -> Outcome {
    if left.is_known() && right.is_known() && left != right {
        tracing::warn!(kept = %left, dropped = %right, "screenshots disagree on the outcome");
    }
    if left.is_known() {
        left
    } else {
        right
    }
}

/// A name on both sides is kept as a loser
fn drop_overlap(winners: &mut BTreeSet<String>, losers: &BTreeSet<String>) {
    winners.retain(|name| {
        let conflicting = losers.contains(name);
        if conflicting {
            tracing::warn!(name = %name, "name listed as winner and loser, keeping it as loser");
        }
        !conflicting
    });
}

/// SHA-256 hex digest of the semantic content of a result
pub fn content_hash_of(
    winners: &BTreeSet<String>,
    losers: &BTreeSet<String>,
    fight_type: FightType,
    outcome: Outcome,
) -> String {
    // BTreeSet iteration is sorted, so input order never matters
    let canonical = format!(
        "winners:{}|losers:{}|fight:{}|outcome:{}",
        winners.iter().map(String::as_str).collect::<Vec<_>>().join(","),
        losers.iter().map(String::as_str).collect::<Vec<_>>().join(","),
        fight_type,
        outcome,
    );

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultAggregate {
    winners: BTreeSet<String>,
    losers: BTreeSet<String>,
    fight_type: FightType,
    outcome: Outcome,
    state: AggregateState,
}

impl Default for ResultAggregate {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultAggregate {
    pub fn new() -> Self {
        Self {
            winners: BTreeSet::new(),
            losers: BTreeSet::new(),
            fight_type: FightType::Unknown,
            outcome: Outcome::Unknown,
            state: AggregateState::Empty,
        }
    }

    /// Merge every outcome in order. The first conflict aborts the whole build.
    pub fn from_outcomes<'a>(
        outcomes: impl IntoIterator<Item = &'a ParsedOutcome>,
    ) -> Result<Self, AggregateError> {
        let mut aggregate = Self::new();
        for outcome in outcomes {
            aggregate.merge(outcome)?;
        }
        Ok(aggregate)
    }

    pub fn state(&self) -> AggregateState {
        self.state
    }

    pub fn winners(&self) -> &BTreeSet<String> {
        &self.winners
    }

    pub fn losers(&self) -> &BTreeSet<String> {
        &self.losers
    }

    pub fn fight_type(&self) -> FightType {
        self.fight_type
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn is_finalized(&self) -> bool {
        self.state == AggregateState::Finalized
    }

    /// Current content as a plain outcome
    pub fn snapshot(&self) -> ParsedOutcome {
        ParsedOutcome {
            winners: self.winners.clone(),
            losers: self.losers.clone(),
            fight_type: self.fight_type,
            outcome: self.outcome,
        }
    }

    fn ensure_open(&self) -> Result<(), AggregateError> {
        if self.state.is_terminal() {
            return Err(AggregateError::Closed(self.state));
        }
        Ok(())
    }

    /// Fold one more screenshot in. On conflict nothing changes.
    pub fn merge(&mut self, other: &ParsedOutcome) -> Result<(), AggregateError> {
        self.ensure_open()?;
        if self.state == AggregateState::UnderReview {
            return Err(AggregateError::InvalidState(self.state));
        }

        let merged = merge_outcomes(&self.snapshot(), other)?;
        self.winners = merged.winners;
        self.losers = merged.losers;
        self.fight_type = merged.fight_type;
        self.outcome = merged.outcome;
        self.state = AggregateState::Accumulating;

        tracing::debug!(
            winners = self.winners.len(),
            losers = self.losers.len(),
            fight_type = %self.fight_type,
            "merged screenshot into result"
        );
        Ok(())
    }

    fn editable_name(&mut self, name: &str) -> Result<String, AggregateError> {
        self.ensure_open()?;
        if self.state == AggregateState::Empty {
            return Err(AggregateError::InvalidState(self.state));
        }

        let normalized = normalize_text(name);
        if normalized.is_empty() {
            return Err(AggregateError::InvalidName(name.to_string()));
        }

        self.state = AggregateState::UnderReview;
        Ok(normalized)
    }

    /// Put `name` among the winners, moving it out of the losers if needed
    pub fn add_winner(&mut self, name: &str) -> Result<(), AggregateError> {
        let name = self.editable_name(name)?;
        self.losers.remove(&name);
        self.winners.insert(name);
        Ok(())
    }

    /// Put `name` among the losers, moving it out of the winners if needed
    pub fn add_loser(&mut self, name: &str) -> Result<(), AggregateError> {
        let name = self.editable_name(name)?;
        self.winners.remove(&name);
        self.losers.insert(name);
        Ok(())
    }

    /// Returns whether the name was listed on either side
    pub fn remove_participant(&mut self, name: &str) -> Result<bool, AggregateError> {
        let name = self.editable_name(name)?;
        let from_winners = self.winners.remove(&name);
        let from_losers = self.losers.remove(&name);
        Ok(from_winners || from_losers)
    }

    /// Re-derive the outcome from the current sides
    pub fn refresh_outcome(&mut self, roster: &HashSet<String>) {
        let outcome = infer_outcome(&self.winners, &self.losers, roster);
        if outcome != self.outcome {
            tracing::debug!(from = %self.outcome, to = %outcome, "outcome changed after edit");
        }
        self.outcome = outcome;
    }

    /// Digest of the current content, computed on every call
    pub fn content_hash(&self) -> String {
        content_hash_of(&self.winners, &self.losers, self.fight_type, self.outcome)
    }

    /// Count this result into the matching records.
    ///
    /// A record matches on its primary name first, then on its aliases in
    /// order. Returns the primary names of updated records.
    pub fn reconcile(
        &self,
        records: &mut [PlayerRecord],
        now_millis: i64,
    ) -> Result<Vec<String>, AggregateError> {
        self.ensure_open()?;

        if !self.fight_type.is_known() {
            tracing::warn!("fight type unknown, no record updated");
            return Ok(Vec::new());
        }

        let mut updated = Vec::new();
        for record in records.iter_mut() {
            let side = std::iter::once(&record.primary_name)
                .chain(record.aliases.iter())
                .map(|name| normalize_text(name))
                .find_map(|name| {
                    if self.winners.contains(&name) {
                        Some(true)
                    } else if self.losers.contains(&name) {
                        Some(false)
                    } else {
                        None
                    }
                });

            let changed = match side {
                Some(true) => record.record_win(self.fight_type, now_millis),
                Some(false) => record.record_loss(self.fight_type, now_millis),
                None => false,
            };
            if changed {
                updated.push(record.primary_name.clone());
            }
        }

        tracing::info!(
            updated = updated.len(),
            fight_type = %self.fight_type,
            "reconciled result into player records"
        );
        Ok(updated)
    }

    pub fn finalize(&mut self) -> Result<(), AggregateError> {
        self.ensure_open()?;
        self.state = AggregateState::Finalized;
        Ok(())
    }

    pub fn discard(&mut self) {
        if !self.state.is_terminal() {
            self.state = AggregateState::Discarded;
        }
    }
}
