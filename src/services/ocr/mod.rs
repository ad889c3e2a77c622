pub mod classifier;
pub mod matcher;
pub mod normalizer;
pub mod parser;
pub mod separator;

// Re-export main types
pub use matcher::Dictionary;
pub use parser::{parse_capture, ScreenAnalysis, ScreenParser};
