use crate::error::ConfigError;
use crate::services::ocr::normalizer::normalize_text;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Domain words expected on a battle-result screen
pub const DEFAULT_VOCABULARY: &[&str] = &[
    "combat",
    "resume",
    "kamas",
    "butin",
    "xp",
    "alliance",
    "termine",
    "victoire",
    "defaite",
    "statistiques",
    "lvl",
    "personnage",
    "gagnants",
    "gagne",
    "perdants",
    "score",
    "nom",
    "de",
    "niveau",
    "experience",
    "vulnerable",
];

/// Which side of the anchor keyword lists the winners
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum WinnerSide {
    /// Winners have a smaller `y` than the anchor
    #[default]
    Above,
    Below,
}

/// Screen parsing configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParserConfig {
    pub match_threshold: usize,
    pub anchor_keyword: String,
    #[serde(default)]
    pub winner_side: WinnerSide,
    pub prism_keywords: Vec<String>,
    pub vocabulary: Vec<String>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            match_threshold: 3,
            anchor_keyword: "perdants".to_string(),
            winner_side: WinnerSide::Above,
            prism_keywords: vec!["prisme".to_string(), "prism".to_string()],
            vocabulary: DEFAULT_VOCABULARY.iter().map(|w| w.to_string()).collect(),
        }
    }
}

impl ParserConfig {
    /// Anchor keyword in normalized form
    pub fn anchor(&self) -> String {
        normalize_text(&self.anchor_keyword)
    }

    /// Validate that the anchor is usable and present in the vocabulary
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.vocabulary.iter().all(|w| normalize_text(w).is_empty()) {
            return Err(ConfigError::EmptyVocabulary);
        }

        let anchor = self.anchor();
        if anchor.is_empty() {
            return Err(ConfigError::EmptyAnchor);
        }

        if !self.vocabulary.iter().any(|w| normalize_text(w) == anchor) {
            return Err(ConfigError::AnchorNotInVocabulary(anchor));
        }

        Ok(())
    }
}

/// Where records and result hashes are persisted
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct StorageConfig {
    /// Overrides the platform data directory
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

/// Log output configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub parser: ParserConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.parser.validate()?;
        if self.logging.level.parse::<tracing::Level>().is_err() {
            return Err(ConfigError::InvalidLogLevel(self.logging.level.clone()));
        }
        Ok(())
    }
}
