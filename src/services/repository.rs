use crate::error::StoreError;
use crate::models::config::StorageConfig;
use crate::models::player::PlayerRecord;
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

const RECORDS_FILE: &str = "players.json";
const HASHES_FILE: &str = "hashes.txt";

/// Storage for player records and the hashes of already counted results.
///
/// Callers serialize access; implementations need no locking of their own.
pub trait RecordRepository: Send {
    fn load_records(&self) -> Result<Vec<PlayerRecord>, StoreError>;

    fn save_records(&mut self, records: &[PlayerRecord]) -> Result<(), StoreError>;

    fn load_hashes(&self) -> Result<HashSet<String>, StoreError>;

    fn append_hash(&mut self, hash: &str) -> Result<(), StoreError>;

    /// Undo an `append_hash`
    fn remove_hash(&mut self, hash: &str) -> Result<(), StoreError>;
}

/// Records as a JSON array, hashes one per line
#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    data_dir: PathBuf,
}

impl JsonFileRepository {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Use the configured directory, or the platform data directory
    pub fn from_config(config: &StorageConfig) -> Result<Self, StoreError> {
        let data_dir = match &config.data_dir {
            Some(dir) => dir.clone(),
            None => dirs::data_dir()
                .ok_or(StoreError::NoDataDir)?
                .join("fight-tracker"),
        };
        Ok(Self::new(data_dir))
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn records_path(&self) -> PathBuf {
        self.data_dir.join(RECORDS_FILE)
    }

    fn hashes_path(&self) -> PathBuf {
        self.data_dir.join(HASHES_FILE)
    }

    fn ensure_dir(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.data_dir).map_err(|source| StoreError::Write {
            path: self.data_dir.clone(),
            source,
        })
    }

    /// Missing file reads as empty
    fn read_optional(path: &Path) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Write through a temporary file so readers never see a partial file
    fn write_atomic(path: &Path, content: &str) -> Result<(), StoreError> {
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, content).map_err(|source| StoreError::Write {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, path).map_err(|source| StoreError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl RecordRepository for JsonFileRepository {
    fn load_records(&self) -> Result<Vec<PlayerRecord>, StoreError> {
        let path = self.records_path();
        let Some(content) = Self::read_optional(&path)? else {
            return Ok(Vec::new());
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&content).map_err(|source| StoreError::Format { path, source })
    }

    fn save_records(&mut self, records: &[PlayerRecord]) -> Result<(), StoreError> {
        self.ensure_dir()?;
        let path = self.records_path();
        let json = serde_json::to_string_pretty(records).map_err(|source| StoreError::Format {
            path: path.clone(),
            source,
        })?;

        Self::write_atomic(&path, &json)?;
        tracing::debug!(path = %path.display(), count = records.len(), "saved player records");
        Ok(())
    }

    fn load_hashes(&self) -> Result<HashSet<String>, StoreError> {
        let Some(content) = Self::read_optional(&self.hashes_path())? else {
            return Ok(HashSet::new());
        };

        Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    fn append_hash(&mut self, hash: &str) -> Result<(), StoreError> {
        self.ensure_dir()?;
        let path = self.hashes_path();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| StoreError::Write {
                path: path.clone(),
                source,
            })?;

        writeln!(file, "{}", hash).map_err(|source| StoreError::Write { path, source })
    }

    fn remove_hash(&mut self, hash: &str) -> Result<(), StoreError> {
        let path = self.hashes_path();
        let Some(content) = Self::read_optional(&path)? else {
            return Ok(());
        };

        let mut kept: String = content
            .lines()
            .filter(|line| line.trim() != hash)
            .collect::<Vec<_>>()
            .join("\n");
        if !kept.is_empty() {
            kept.push('\n');
        }

        Self::write_atomic(&path, &kept)
    }
}

/// In-memory repository with switchable failures
#[derive(Debug, Default)]
pub struct MemoryRepository {
    records: Vec<PlayerRecord>,
    hashes: Vec<String>,
    fail_record_saves: bool,
    fail_hash_appends: bool,
    fail_hash_removals: bool,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<PlayerRecord>) -> Self {
        Self {
            records,
            ..Self::default()
        }
    }

    /// Make every `save_records` fail until switched off
    pub fn fail_record_saves(&mut self, fail: bool) {
        self.fail_record_saves = fail;
    }

    /// Make every `append_hash` fail until switched off
    pub fn fail_hash_appends(&mut self, fail: bool) {
        self.fail_hash_appends = fail;
    }

    /// Make every `remove_hash` fail until switched off
    pub fn fail_hash_removals(&mut self, fail: bool) {
        self.fail_hash_removals = fail;
    }

    pub fn records(&self) -> &[PlayerRecord] {
        &self.records
    }

    pub fn hashes(&self) -> &[String] {
        &self.hashes
    }
}

impl RecordRepository for MemoryRepository {
    fn load_records(&self) -> Result<Vec<PlayerRecord>, StoreError> {
        Ok(self.records.clone())
    }

    fn save_records(&mut self, records: &[PlayerRecord]) -> Result<(), StoreError> {
        if self.fail_record_saves {
            return Err(StoreError::Other("record store unavailable".to_string()));
        }
        self.records = records.to_vec();
        Ok(())
    }

    fn load_hashes(&self) -> Result<HashSet<String>, StoreError> {
        Ok(self.hashes.iter().cloned().collect())
    }

    fn append_hash(&mut self, hash: &str) -> Result<(), StoreError> {
        if self.fail_hash_appends {
            return Err(StoreError::Other("hash store unavailable".to_string()));
        }
        self.hashes.push(hash.to_string());
        Ok(())
    }

    fn remove_hash(&mut self, hash: &str) -> Result<(), StoreError> {
        if self.fail_hash_removals {
            return Err(StoreError::Other("hash store unavailable".to_string()));
        }
        self.hashes.retain(|h| h != hash);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fight::FightType;

    /// Helper to create a repository in a fresh temporary directory
    fn create_test_repository() -> JsonFileRepository {
        use std::sync::atomic::{AtomicUsize, Ordering};
        static COUNTER: AtomicUsize = AtomicUsize::new(0);

        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let temp_dir = std::env::temp_dir().join(format!(
            "fight-tracker-repo-test-{}-{}",
            std::process::id(),
            id
        ));
        let _ = fs::remove_dir_all(&temp_dir);

        JsonFileRepository::new(temp_dir)
    }

    fn cleanup_test_files(repository: &JsonFileRepository) {
        let _ = fs::remove_dir_all(repository.data_dir());
    }

    #[test]
    fn test_missing_files_read_as_empty() {
        let repository = create_test_repository();

        assert!(repository.load_records().unwrap().is_empty());
        assert!(repository.load_hashes().unwrap().is_empty());

        cleanup_test_files(&repository);
    }

    #[test]
    fn test_records_save_and_load() {
        let mut repository = create_test_repository();
        let mut record = PlayerRecord::new("lovova").with_aliases(["lovo"]);
        record.record_win(FightType::Prism, 10);

        repository
            .save_records(&[record.clone(), PlayerRecord::new("yaafou")])
            .expect("save should succeed");
        let loaded = repository.load_records().expect("load should succeed");

        assert_eq!(loaded, vec![record, PlayerRecord::new("yaafou")]);
        assert!(
            !repository.data_dir().join("players.tmp").exists(),
            "Temporary file should be renamed away"
        );

        cleanup_test_files(&repository);
    }

    #[test]
    fn test_malformed_records_report_path() {
        let repository = create_test_repository();
        fs::create_dir_all(repository.data_dir()).unwrap();
        fs::write(repository.records_path(), "{not json").unwrap();

        match repository.load_records() {
            Err(StoreError::Format { path, .. }) => assert!(path.ends_with(RECORDS_FILE)),
            other => panic!("Expected format error, got {:?}", other),
        }

        cleanup_test_files(&repository);
    }

    #[test]
    fn test_hash_append_and_remove() {
        let mut repository = create_test_repository();

        repository.append_hash("aaa").unwrap();
        repository.append_hash("bbb").unwrap();
        assert_eq!(repository.load_hashes().unwrap().len(), 2);

        repository.remove_hash("aaa").unwrap();
        let hashes = repository.load_hashes().unwrap();
        assert!(!hashes.contains("aaa"));
        assert!(hashes.contains("bbb"));

        repository.append_hash("ccc").unwrap();
        assert_eq!(repository.load_hashes().unwrap().len(), 2);

        cleanup_test_files(&repository);
    }

    #[test]
    fn test_hash_file_ignores_blank_lines() {
        let repository = create_test_repository();
        fs::create_dir_all(repository.data_dir()).unwrap();
        fs::write(repository.hashes_path(), "aaa\n\n  \nbbb\n").unwrap();

        let hashes = repository.load_hashes().unwrap();
        assert_eq!(hashes.len(), 2);

        cleanup_test_files(&repository);
    }

    #[test]
    fn test_from_config_uses_override() {
        let config = StorageConfig {
            data_dir: Some(PathBuf::from("/tmp/fight-tracker-custom")),
        };

        let repository = JsonFileRepository::from_config(&config).unwrap();
        assert_eq!(repository.data_dir(), Path::new("/tmp/fight-tracker-custom"));
    }

    #[test]
    fn test_memory_repository_failure_injection() {
        let mut repository = MemoryRepository::with_records(vec![PlayerRecord::new("a")]);

        repository.fail_record_saves(true);
        assert!(repository.save_records(&[]).is_err());
        assert_eq!(repository.records().len(), 1, "Failed save must keep old records");

        repository.fail_hash_appends(true);
        assert!(repository.append_hash("h").is_err());
        assert!(repository.hashes().is_empty());

        repository.fail_record_saves(false);
        repository.fail_hash_appends(false);
        repository.append_hash("h").unwrap();
        repository.remove_hash("h").unwrap();
        assert!(repository.hashes().is_empty());
    }
}
