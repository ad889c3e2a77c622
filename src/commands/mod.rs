pub mod players;
pub mod screen;

use crate::models::config::AppConfig;
use crate::services::ocr::ScreenParser;
use crate::services::repository::{JsonFileRepository, RecordRepository};
use crate::services::roster::RosterService;
use crate::services::submission::SubmissionWorkflow;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Everything a command needs. Workflow and roster share one store lock.
pub struct AppState<R: RecordRepository = JsonFileRepository> {
    pub parser: ScreenParser,
    pub workflow: SubmissionWorkflow<R>,
    pub roster: RosterService<R>,
}

impl<R: RecordRepository> AppState<R> {
    /// Build from a configuration, rejecting it when unusable
    pub fn new(config: &AppConfig, repository: R) -> Result<Self, String> {
        config
            .validate()
            .map_err(|e| format!("Invalid configuration: {}", e))?;

        let store = Arc::new(Mutex::new(repository));
        Ok(Self {
            parser: ScreenParser::new(&config.parser),
            workflow: SubmissionWorkflow::new(Arc::clone(&store)),
            roster: RosterService::new(store),
        })
    }
}

impl AppState<JsonFileRepository> {
    /// File-backed state in the configured data directory
    pub fn from_config(config: &AppConfig) -> Result<Self, String> {
        let repository = JsonFileRepository::from_config(&config.storage)
            .map_err(|e| format!("Failed to open data directory: {}", e))?;
        tracing::info!(data_dir = %repository.data_dir().display(), "using file storage");
        Self::new(config, repository)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::models::player::PlayerRecord;
    use crate::services::repository::MemoryRepository;

    pub fn memory_state(records: Vec<PlayerRecord>) -> AppState<MemoryRepository> {
        AppState::new(&AppConfig::default(), MemoryRepository::with_records(records))
            .expect("Default config should be valid")
    }
}
