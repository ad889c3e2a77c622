//! Per-submitter pending results and the confirm/cancel flow.
//!
//! Each submitter gets its own lock, created on first use, guarding their
//! pending aggregate. Everything that touches persisted records or result
//! hashes goes through the single store lock, so two confirms never
//! interleave their check-reconcile-save sequences.

use crate::error::WorkflowError;
use crate::models::fight::ParsedOutcome;
use crate::models::summary::ResultSummary;
use crate::services::aggregate::ResultAggregate;
use crate::services::repository::RecordRepository;
use crate::services::roster::recognizable_names;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Manual correction of a pending result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOp {
    AddWinner(String),
    AddLoser(String),
    Remove(String),
}

#[derive(Debug, Clone)]
pub struct PendingSubmission {
    pub owner_id: String,
    pub aggregate: ResultAggregate,
    pub created_at: DateTime<Utc>,
    /// Hash left in the store by a failed confirm that could not withdraw it
    pub stale_hash: Option<String>,
}

/// Result of a successful confirm
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// Counted; `updated` lists the primary names of changed records
    Saved { hash: String, updated: Vec<String> },
    /// Same content was counted before; nothing changed
    Duplicate { hash: String },
}

impl fmt::Display for ConfirmOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Saved { hash, updated } if updated.is_empty() => {
                write!(f, "Result saved ({}), no registered player involved", hash)
            }
            Self::Saved { hash, updated } => {
                write!(f, "Result saved ({}), updated: {}", hash, updated.join(", "))
            }
            Self::Duplicate { hash } => write!(f, "Result already counted ({})", hash),
        }
    }
}

type Slot = Arc<Mutex<Option<PendingSubmission>>>;

pub struct SubmissionWorkflow<R: RecordRepository> {
    slots: parking_lot::Mutex<HashMap<String, Slot>>,
    store: Arc<Mutex<R>>,
}

impl<R: RecordRepository> SubmissionWorkflow<R> {
    pub fn new(store: Arc<Mutex<R>>) -> Self {
        Self {
            slots: parking_lot::Mutex::new(HashMap::new()),
            store,
        }
    }

    /// Shared store handle, for services that must use the same lock
    pub fn store(&self) -> Arc<Mutex<R>> {
        Arc::clone(&self.store)
    }

    /// Lock for one submitter, created lazily and never shared
    fn slot(&self, submitter: &str) -> Slot {
        let mut slots = self.slots.lock();
        Arc::clone(slots.entry(submitter.to_string()).or_default())
    }

    /// Lock for one submitter if they ever used the workflow
    fn existing_slot(&self, submitter: &str) -> Option<Slot> {
        self.slots.lock().get(submitter).cloned()
    }

    async fn roster(&self) -> Result<HashSet<String>, WorkflowError> {
        let store = self.store.lock().await;
        Ok(recognizable_names(&store.load_records()?))
    }

    /// Open a pending result from one or more parsed screenshots.
    ///
    /// On a fight type conflict nothing is left pending.
    pub async fn begin(
        &self,
        submitter: &str,
        outcomes: &[ParsedOutcome],
    ) -> Result<ResultSummary, WorkflowError> {
        let slot = self.slot(submitter);
        let mut pending = slot.lock().await;

        if pending.is_some() {
            return Err(WorkflowError::AlreadyPending(submitter.to_string()));
        }
        if outcomes.is_empty() {
            return Err(WorkflowError::EmptySubmission);
        }

        let aggregate = ResultAggregate::from_outcomes(outcomes)?;
        let summary = ResultSummary::from(&aggregate);

        tracing::info!(
            submitter,
            screens = outcomes.len(),
            winners = summary.winners.len(),
            losers = summary.losers.len(),
            hash = %summary.hash,
            "opened pending result"
        );

        *pending = Some(PendingSubmission {
            owner_id: submitter.to_string(),
            aggregate,
            created_at: Utc::now(),
            stale_hash: None,
        });
        Ok(summary)
    }

    /// Apply a correction and re-derive the outcome
    pub async fn edit(&self, submitter: &str, op: EditOp) -> Result<ResultSummary, WorkflowError> {
        let slot = self.slot(submitter);
        let mut pending = slot.lock().await;

        let submission = pending
            .as_mut()
            .ok_or_else(|| WorkflowError::NoPendingResult(submitter.to_string()))?;

        let roster = self.roster().await?;
        let aggregate = &mut submission.aggregate;
        match &op {
            EditOp::AddWinner(name) => aggregate.add_winner(name)?,
            EditOp::AddLoser(name) => aggregate.add_loser(name)?,
            EditOp::Remove(name) => {
                if !aggregate.remove_participant(name)? {
                    tracing::debug!(submitter, name = %name, "participant was not listed");
                }
            }
        }
        aggregate.refresh_outcome(&roster);

        let summary = ResultSummary::from(&*aggregate);
        tracing::info!(submitter, ?op, hash = %summary.hash, "edited pending result");
        Ok(summary)
    }

    /// Count the pending result unless the same content was counted before.
    ///
    /// On a persistence failure the hash is withdrawn and the pending result
    /// is kept so the submitter can retry. A hash that could not be withdrawn
    /// is remembered and removed before the retry checks for duplicates.
    pub async fn confirm(&self, submitter: &str) -> Result<ConfirmOutcome, WorkflowError> {
        let slot = self.slot(submitter);
        let mut pending = slot.lock().await;

        let submission = pending
            .as_mut()
            .ok_or_else(|| WorkflowError::NoPendingResult(submitter.to_string()))?;
        let hash = submission.aggregate.content_hash();

        let mut store = self.store.lock().await;

        if let Some(stale) = submission.stale_hash.clone() {
            store.remove_hash(&stale)?;
            tracing::info!(submitter, hash = %stale, "withdrew hash left by a failed confirm");
            submission.stale_hash = None;
        }

        if store.load_hashes()?.contains(&hash) {
            tracing::info!(submitter, hash = %hash, "result already counted, discarding");
            submission.aggregate.discard();
            *pending = None;
            return Ok(ConfirmOutcome::Duplicate { hash });
        }

        let mut records = store.load_records()?;
        let updated = submission
            .aggregate
            .reconcile(&mut records, Utc::now().timestamp_millis())?;

        store.append_hash(&hash)?;
        if let Err(e) = store.save_records(&records) {
            tracing::error!(submitter, hash = %hash, error = %e, "failed to save records, withdrawing hash");
            if let Err(revert) = store.remove_hash(&hash) {
                tracing::error!(hash = %hash, error = %revert, "failed to withdraw hash");
                submission.stale_hash = Some(hash);
            }
            return Err(WorkflowError::Persistence(e));
        }

        submission.aggregate.finalize()?;
        *pending = None;

        tracing::info!(submitter, hash = %hash, updated = updated.len(), "result counted");
        Ok(ConfirmOutcome::Saved { hash, updated })
    }

    /// Drop the pending result
    pub async fn cancel(&self, submitter: &str) -> Result<(), WorkflowError> {
        let slot = self.slot(submitter);
        let mut pending = slot.lock().await;

        let mut submission = pending
            .take()
            .ok_or_else(|| WorkflowError::NoPendingResult(submitter.to_string()))?;
        submission.aggregate.discard();

        tracing::info!(submitter, "cancelled pending result");
        Ok(())
    }

    /// Current state of the submitter's pending result, if any
    pub async fn pending(&self, submitter: &str) -> Option<ResultSummary> {
        let slot = self.existing_slot(submitter)?;
        let pending = slot.lock().await;
        pending.as_ref().map(|p| ResultSummary::from(&p.aggregate))
    }

    /// When the submitter's pending result was opened
    pub async fn pending_since(&self, submitter: &str) -> Option<DateTime<Utc>> {
        let slot = self.existing_slot(submitter)?;
        let pending = slot.lock().await;
        pending.as_ref().map(|p| p.created_at)
    }
}
