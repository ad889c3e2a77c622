use crate::commands::AppState;
use crate::models::summary::ResultSummary;
use crate::models::token::OcrCapture;
use crate::services::repository::RecordRepository;
use crate::services::submission::{ConfirmOutcome, EditOp};

/// Parse one capture without opening a submission
pub async fn parse_screen<R: RecordRepository>(
    state: &AppState<R>,
    capture: &OcrCapture,
) -> Result<ResultSummary, String> {
    let roster = state
        .roster
        .recognizable_names()
        .await
        .map_err(|e| format!("Failed to load roster: {}", e))?;

    let outcome = state
        .parser
        .parse(capture, &roster)
        .map_err(|e| format!("Could not read the screenshot: {}", e))?;
    Ok(ResultSummary::from(&outcome))
}

/// Parse every capture and open a pending result for the submitter
pub async fn submit_screens<R: RecordRepository>(
    state: &AppState<R>,
    submitter: &str,
    captures: &[OcrCapture],
) -> Result<ResultSummary, String> {
    if captures.is_empty() {
        return Err("No screenshot provided".to_string());
    }

    let roster = state
        .roster
        .recognizable_names()
        .await
        .map_err(|e| format!("Failed to load roster: {}", e))?;

    let outcomes = captures
        .iter()
        .enumerate()
        .map(|(i, capture)| {
            state
                .parser
                .parse(capture, &roster)
                .map_err(|e| format!("Could not read screenshot {}: {}", i + 1, e))
        })
        .collect::<Result<Vec<_>, _>>()?;

    state
        .workflow
        .begin(submitter, &outcomes)
        .await
        .map_err(|e| e.to_string())
}

pub async fn add_winner<R: RecordRepository>(
    state: &AppState<R>,
    submitter: &str,
    name: &str,
) -> Result<ResultSummary, String> {
    state
        .workflow
        .edit(submitter, EditOp::AddWinner(name.to_string()))
        .await
        .map_err(|e| e.to_string())
}

pub async fn add_loser<R: RecordRepository>(
    state: &AppState<R>,
    submitter: &str,
    name: &str,
) -> Result<ResultSummary, String> {
    state
        .workflow
        .edit(submitter, EditOp::AddLoser(name.to_string()))
        .await
        .map_err(|e| e.to_string())
}

pub async fn remove_participant<R: RecordRepository>(
    state: &AppState<R>,
    submitter: &str,
    name: &str,
) -> Result<ResultSummary, String> {
    state
        .workflow
        .edit(submitter, EditOp::Remove(name.to_string()))
        .await
        .map_err(|e| e.to_string())
}

pub async fn confirm<R: RecordRepository>(
    state: &AppState<R>,
    submitter: &str,
) -> Result<ConfirmOutcome, String> {
    state.workflow.confirm(submitter).await.map_err(|e| {
        if e.is_retryable() {
            format!("{} (your result is still pending)", e)
        } else {
            e.to_string()
        }
    })
}

pub async fn cancel<R: RecordRepository>(state: &AppState<R>, submitter: &str) -> Result<(), String> {
    state.workflow.cancel(submitter).await.map_err(|e| e.to_string())
}

pub async fn show_pending<R: RecordRepository>(
    state: &AppState<R>,
    submitter: &str,
) -> Result<ResultSummary, String> {
    state
        .workflow
        .pending(submitter)
        .await
        .ok_or_else(|| format!("submitter {} has no pending result", submitter))
}
