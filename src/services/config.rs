use crate::error::ConfigError;
use crate::models::config::AppConfig;
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration manager for app settings
pub struct ConfigManager {
    config_dir: PathBuf,
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager under the platform config directory
    ///
    /// This will create the config directory if it doesn't exist.
    pub fn new() -> Result<Self, ConfigError> {
        let config_dir = dirs::config_dir()
            .ok_or(ConfigError::NoConfigDir)?
            .join("fight-tracker");

        fs::create_dir_all(&config_dir).map_err(|source| ConfigError::Io {
            path: config_dir.clone(),
            source,
        })?;

        Ok(Self::at(config_dir))
    }

    /// Use an explicit directory; it is created on first save
    pub fn at(config_dir: impl Into<PathBuf>) -> Self {
        let config_dir = config_dir.into();
        let config_path = config_dir.join("config.json");
        Self {
            config_dir,
            config_path,
        }
    }

    /// Use an explicit config file
    pub fn with_file(config_path: impl Into<PathBuf>) -> Self {
        let config_path = config_path.into();
        let config_dir = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Self {
            config_dir,
            config_path,
        }
    }

    /// Save configuration to disk
    pub fn save(&self, config: &AppConfig) -> Result<(), ConfigError> {
        if !self.config_dir.as_os_str().is_empty() {
            fs::create_dir_all(&self.config_dir).map_err(|source| ConfigError::Io {
                path: self.config_dir.clone(),
                source,
            })?;
        }

        // Pretty print for human readability
        let json = serde_json::to_string_pretty(config).map_err(|source| ConfigError::Format {
            path: self.config_path.clone(),
            source,
        })?;

        fs::write(&self.config_path, json).map_err(|source| ConfigError::Io {
            path: self.config_path.clone(),
            source,
        })
    }

    /// Load configuration from disk
    ///
    /// If config file doesn't exist, returns default configuration
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        if !self.config_exists() {
            return Ok(AppConfig::default());
        }

        let content = fs::read_to_string(&self.config_path).map_err(|source| ConfigError::Io {
            path: self.config_path.clone(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| ConfigError::Format {
            path: self.config_path.clone(),
            source,
        })
    }

    /// Load and reject an unusable configuration
    pub fn load_validated(&self) -> Result<AppConfig, ConfigError> {
        let config = self.load()?;
        config.validate()?;
        tracing::debug!(path = %self.config_path.display(), "loaded configuration");
        Ok(config)
    }

    /// Get the config file path
    pub fn config_file_path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Check if config file exists
    pub fn config_exists(&self) -> bool {
        self.config_path.exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::WinnerSide;

    /// Helper to create a temporary test config manager
    fn create_test_manager() -> ConfigManager {
        use std::sync::atomic::{AtomicUsize, Ordering};
        static COUNTER: AtomicUsize = AtomicUsize::new(0);

        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let temp_dir = std::env::temp_dir().join(format!(
            "fight-tracker-test-{}-{}",
            std::process::id(),
            id
        ));
        // Clean up any existing test directory
        let _ = fs::remove_dir_all(&temp_dir);

        ConfigManager::at(temp_dir)
    }

    /// Clean up test files
    fn cleanup_test_files(manager: &ConfigManager) {
        let _ = fs::remove_dir_all(&manager.config_dir);
    }

    #[test]
    fn test_config_manager_new() {
        let manager = ConfigManager::new().expect("ConfigManager::new() should succeed");

        assert!(
            manager.config_dir.exists(),
            "Config directory should exist: {:?}",
            manager.config_dir
        );
        assert!(
            manager.config_path.to_str().unwrap().ends_with("config.json"),
            "Config path should end with config.json"
        );
        assert!(manager.config_dir.ends_with("fight-tracker"));
    }

    #[test]
    fn test_config_save() {
        let manager = create_test_manager();

        let result = manager.save(&AppConfig::default());
        assert!(result.is_ok(), "save() should succeed");
        assert!(manager.config_exists(), "Config file should exist after save");

        let file_content = fs::read_to_string(&manager.config_path).unwrap();
        let _parsed: AppConfig =
            serde_json::from_str(&file_content).expect("Saved config should be valid JSON");

        cleanup_test_files(&manager);
    }

    #[test]
    fn test_config_load_default_when_not_exists() {
        let manager = create_test_manager();
        assert!(!manager.config_exists());

        let config = manager
            .load()
            .expect("load() should return default when file doesn't exist");
        assert_eq!(config, AppConfig::default());

        cleanup_test_files(&manager);
    }

    #[test]
    fn test_config_save_and_load() {
        let manager = create_test_manager();

        let mut config = AppConfig::default();
        config.parser.match_threshold = 2;
        config.parser.winner_side = WinnerSide::Below;
        config.logging.json = true;
        manager.save(&config).expect("save should succeed");

        let loaded = manager.load().expect("load should succeed");
        assert_eq!(loaded, config);

        cleanup_test_files(&manager);
    }

    #[test]
    fn test_load_malformed_config() {
        let manager = create_test_manager();
        fs::create_dir_all(&manager.config_dir).unwrap();
        fs::write(&manager.config_path, "{ nope").unwrap();

        assert!(matches!(manager.load(), Err(ConfigError::Format { .. })));

        cleanup_test_files(&manager);
    }

    #[test]
    fn test_load_validated_rejects_invalid_config() {
        let manager = create_test_manager();
        let mut config = AppConfig::default();
        config.parser.anchor_keyword = "absent".to_string();
        manager.save(&config).unwrap();

        assert!(manager.load().is_ok(), "Plain load does not validate");
        assert!(matches!(
            manager.load_validated(),
            Err(ConfigError::AnchorNotInVocabulary(_))
        ));

        cleanup_test_files(&manager);
    }

    #[test]
    fn test_with_file() {
        let manager = create_test_manager();
        let custom = ConfigManager::with_file(manager.config_dir.join("custom.json"));

        custom.save(&AppConfig::default()).unwrap();
        assert!(custom.config_file_path().ends_with("custom.json"));
        assert!(custom.config_exists());

        cleanup_test_files(&manager);
    }

    #[test]
    fn test_config_overwrite() {
        let manager = create_test_manager();

        let mut first = AppConfig::default();
        first.logging.level = "warn".to_string();
        manager.save(&first).unwrap();

        let mut second = AppConfig::default();
        second.logging.level = "debug".to_string();
        manager.save(&second).unwrap();

        assert_eq!(manager.load().unwrap().logging.level, "debug");

        cleanup_test_files(&manager);
    }
}
