pub mod config;
pub mod fight;
pub mod player;
pub mod summary;
pub mod token;

pub use fight::{FightType, Outcome, ParsedOutcome};
pub use player::{FightCounters, PlayerRecord};
pub use summary::{PlayerSummary, ResultSummary};
pub use token::{OcrCapture, Position, Token};
