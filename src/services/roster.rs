use crate::error::RosterError;
use crate::models::player::PlayerRecord;
use crate::services::ocr::normalizer::normalize_text;
use crate::services::repository::RecordRepository;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Every normalized primary name and alias
pub fn recognizable_names(records: &[PlayerRecord]) -> HashSet<String> {
    records
        .iter()
        .flat_map(|r| std::iter::once(&r.primary_name).chain(r.aliases.iter()))
        .map(|name| normalize_text(name))
        .filter(|name| !name.is_empty())
        .collect()
}

fn normalized_name(raw: &str) -> Result<String, RosterError> {
    let name = normalize_text(raw);
    if name.is_empty() {
        return Err(RosterError::InvalidName(raw.to_string()));
    }
    Ok(name)
}

/// Registered players. Shares the store lock with the submission workflow
/// so roster edits never interleave with a confirm.
pub struct RosterService<R: RecordRepository> {
    store: Arc<Mutex<R>>,
}

impl<R: RecordRepository> Clone for RosterService<R> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<R: RecordRepository> RosterService<R> {
    pub fn new(store: Arc<Mutex<R>>) -> Self {
        Self { store }
    }

    pub async fn players(&self) -> Result<Vec<PlayerRecord>, RosterError> {
        let store = self.store.lock().await;
        Ok(store.load_records()?)
    }

    pub async fn recognizable_names(&self) -> Result<HashSet<String>, RosterError> {
        let store = self.store.lock().await;
        Ok(recognizable_names(&store.load_records()?))
    }

    /// Lookup by primary name or alias
    pub async fn find(&self, name: &str) -> Result<Option<PlayerRecord>, RosterError> {
        let name = normalize_text(name);
        let store = self.store.lock().await;
        Ok(store
            .load_records()?
            .into_iter()
            .find(|record| record.answers_to(&name)))
    }

    pub async fn add_player(&self, name: &str) -> Result<PlayerRecord, RosterError> {
        let name = normalized_name(name)?;
        let mut store = self.store.lock().await;
        let mut records = store.load_records()?;

        if recognizable_names(&records).contains(&name) {
            return Err(RosterError::AlreadyRegistered(name));
        }

        let record = PlayerRecord::new(name.clone());
        records.push(record.clone());
        store.save_records(&records)?;

        tracing::info!(player = %name, "registered player");
        Ok(record)
    }

    /// Remove by primary name. Returns whether a record was removed.
    pub async fn remove_player(&self, name: &str) -> Result<bool, RosterError> {
        let name = normalized_name(name)?;
        let mut store = self.store.lock().await;
        let mut records = store.load_records()?;

        let before = records.len();
        records.retain(|record| record.primary_name != name);
        if records.len() == before {
            return Ok(false);
        }

        store.save_records(&records)?;
        tracing::info!(player = %name, "removed player");
        Ok(true)
    }

    /// Aliases are unique across every name and alias of every player
    pub async fn add_alias(&self, player: &str, alias: &str) -> Result<(), RosterError> {
        let player = normalized_name(player)?;
        let alias = normalized_name(alias)?;
        let mut store = self.store.lock().await;
        let mut records = store.load_records()?;

        if recognizable_names(&records).contains(&alias) {
            return Err(RosterError::AlreadyRegistered(alias));
        }

        let record = records
            .iter_mut()
            .find(|record| record.primary_name == player)
            .ok_or_else(|| RosterError::UnknownPlayer(player.clone()))?;
        record.aliases.push(alias.clone());

        store.save_records(&records)?;
        tracing::info!(player = %player, alias = %alias, "added alias");
        Ok(())
    }

    /// Returns whether the alias was present
    pub async fn remove_alias(&self, player: &str, alias: &str) -> Result<bool, RosterError> {
        let player = normalized_name(player)?;
        let alias = normalize_text(alias);
        let mut store = self.store.lock().await;
        let mut records = store.load_records()?;

        let record = records
            .iter_mut()
            .find(|record| record.primary_name == player)
            .ok_or_else(|| RosterError::UnknownPlayer(player.clone()))?;

        let before = record.aliases.len();
        record.aliases.retain(|a| *a != alias);
        if record.aliases.len() == before {
            return Ok(false);
        }

        store.save_records(&records)?;
        tracing::info!(player = %player, alias = %alias, "removed alias");
        Ok(true)
    }

    /// Players with results not yet paid out
    pub async fn unpaid(&self) -> Result<Vec<PlayerRecord>, RosterError> {
        let store = self.store.lock().await;
        Ok(store
            .load_records()?
            .into_iter()
            .filter(|record| record.has_unpaid_changes)
            .collect())
    }

    /// Clear unpaid state everywhere. Returns how many records changed.
    pub async fn mark_all_paid(&self) -> Result<usize, RosterError> {
        let mut store = self.store.lock().await;
        let mut records = store.load_records()?;

        let changed = records
            .iter_mut()
            .map(|record| record.mark_paid())
            .filter(|changed| *changed)
            .count();
        if changed > 0 {
            store.save_records(&records)?;
        }

        tracing::info!(changed, "marked players as paid");
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fight::FightType;
    use crate::services::repository::MemoryRepository;

    fn service(records: Vec<PlayerRecord>) -> (RosterService<MemoryRepository>, Arc<Mutex<MemoryRepository>>) {
        let store = Arc::new(Mutex::new(MemoryRepository::with_records(records)));
        (RosterService::new(Arc::clone(&store)), store)
    }

    #[test]
    fn test_recognizable_names_includes_aliases() {
        let records = vec![
            PlayerRecord::new("Lovova").with_aliases(["lovo"]),
            PlayerRecord::new("yaafou"),
        ];

        let names = recognizable_names(&records);

        assert_eq!(names.len(), 3);
        assert!(names.contains("lovova"), "Names should be normalized");
        assert!(names.contains("lovo"));
    }

    #[tokio::test]
    async fn test_add_player_normalizes_and_rejects_duplicates() {
        let (roster, store) = service(vec![]);

        let record = roster.add_player("Lovova").await.unwrap();
        assert_eq!(record.primary_name, "lovova");
        assert_eq!(store.lock().await.records().len(), 1);

        let duplicate = roster.add_player("LOVOVA").await;
        assert!(matches!(duplicate, Err(RosterError::AlreadyRegistered(_))));

        let invalid = roster.add_player("!!").await;
        assert!(matches!(invalid, Err(RosterError::InvalidName(_))));
    }

    #[tokio::test]
    async fn test_alias_must_be_globally_unique() {
        let (roster, _) = service(vec![
            PlayerRecord::new("lovova").with_aliases(["lovo"]),
            PlayerRecord::new("yaafou"),
        ]);

        assert!(matches!(
            roster.add_alias("yaafou", "lovo").await,
            Err(RosterError::AlreadyRegistered(_))
        ));
        assert!(matches!(
            roster.add_alias("yaafou", "lovova").await,
            Err(RosterError::AlreadyRegistered(_))
        ));
        assert!(matches!(
            roster.add_alias("nobody", "alt").await,
            Err(RosterError::UnknownPlayer(_))
        ));

        roster.add_alias("yaafou", "Yaa").await.unwrap();
        let found = roster.find("yaa").await.unwrap().expect("Alias should resolve");
        assert_eq!(found.primary_name, "yaafou");
    }

    #[tokio::test]
    async fn test_alias_names_cannot_be_registered_as_players() {
        let (roster, _) = service(vec![PlayerRecord::new("lovova").with_aliases(["lovo"])]);

        assert!(matches!(
            roster.add_player("lovo").await,
            Err(RosterError::AlreadyRegistered(_))
        ));
    }

    #[tokio::test]
    async fn test_remove_alias_and_player() {
        let (roster, store) = service(vec![PlayerRecord::new("lovova").with_aliases(["lovo"])]);

        assert!(roster.remove_alias("lovova", "lovo").await.unwrap());
        assert!(!roster.remove_alias("lovova", "lovo").await.unwrap());
        assert!(roster.find("lovo").await.unwrap().is_none());

        assert!(roster.remove_player("lovova").await.unwrap());
        assert!(!roster.remove_player("lovova").await.unwrap());
        assert!(store.lock().await.records().is_empty());
    }

    #[tokio::test]
    async fn test_unpaid_and_mark_all_paid() {
        let mut paid = PlayerRecord::new("yaafou");
        paid.record_loss(FightType::Keep, 1);
        paid.mark_paid();
        let mut owed = PlayerRecord::new("lovova");
        owed.record_win(FightType::Prism, 2);
        let (roster, store) = service(vec![paid, owed]);

        let unpaid = roster.unpaid().await.unwrap();
        assert_eq!(unpaid.len(), 1);
        assert_eq!(unpaid[0].primary_name, "lovova");

        assert_eq!(roster.mark_all_paid().await.unwrap(), 1);
        assert!(roster.unpaid().await.unwrap().is_empty());
        assert_eq!(store.lock().await.records()[1].prism.wins, 1, "Totals survive payment");

        assert_eq!(roster.mark_all_paid().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_store_failure_surfaces() {
        let (roster, store) = service(vec![]);
        store.lock().await.fail_record_saves(true);

        let result = roster.add_player("lovova").await;
        assert!(matches!(result, Err(RosterError::Store(_))));
    }
}
