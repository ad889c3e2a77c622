pub mod aggregate;
pub mod config;
pub mod ocr;
pub mod repository;
pub mod roster;
pub mod submission;

pub use aggregate::{AggregateState, ResultAggregate};
pub use config::ConfigManager;
pub use repository::{JsonFileRepository, MemoryRepository, RecordRepository};
pub use roster::RosterService;
pub use submission::{ConfirmOutcome, EditOp, SubmissionWorkflow};
