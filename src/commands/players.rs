use crate::commands::AppState;
use crate::models::summary::PlayerSummary;
use crate::services::repository::RecordRepository;

pub async fn list_players<R: RecordRepository>(
    state: &AppState<R>,
) -> Result<Vec<PlayerSummary>, String> {
    let records = state
        .roster
        .players()
        .await
        .map_err(|e| format!("Failed to load players: {}", e))?;
    Ok(records.iter().map(PlayerSummary::from).collect())
}

pub async fn show_player<R: RecordRepository>(
    state: &AppState<R>,
    name: &str,
) -> Result<PlayerSummary, String> {
    state
        .roster
        .find(name)
        .await
        .map_err(|e| format!("Failed to load players: {}", e))?
        .map(|record| PlayerSummary::from(&record))
        .ok_or_else(|| format!("no player named '{}'", name))
}

pub async fn list_unpaid<R: RecordRepository>(
    state: &AppState<R>,
) -> Result<Vec<PlayerSummary>, String> {
    let records = state
        .roster
        .unpaid()
        .await
        .map_err(|e| format!("Failed to load players: {}", e))?;
    Ok(records.iter().map(PlayerSummary::from).collect())
}

pub async fn add_player<R: RecordRepository>(
    state: &AppState<R>,
    name: &str,
) -> Result<PlayerSummary, String> {
    let record = state.roster.add_player(name).await.map_err(|e| e.to_string())?;
    Ok(PlayerSummary::from(&record))
}

pub async fn remove_player<R: RecordRepository>(
    state: &AppState<R>,
    name: &str,
) -> Result<bool, String> {
    state.roster.remove_player(name).await.map_err(|e| e.to_string())
}

pub async fn add_alias<R: RecordRepository>(
    state: &AppState<R>,
    player: &str,
    alias: &str,
) -> Result<(), String> {
    state
        .roster
        .add_alias(player, alias)
        .await
        .map_err(|e| e.to_string())
}

pub async fn remove_alias<R: RecordRepository>(
    state: &AppState<R>,
    player: &str,
    alias: &str,
) -> Result<bool, String> {
    state
        .roster
        .remove_alias(player, alias)
        .await
        .map_err(|e| e.to_string())
}

/// Mark every pending payout as settled. Returns how many players changed.
pub async fn pay<R: RecordRepository>(state: &AppState<R>) -> Result<usize, String> {
    state
        .roster
        .mark_all_paid()
        .await
        .map_err(|e| format!("Failed to record payment: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::memory_state;
    use crate::models::fight::FightType;
    use crate::models::player::PlayerRecord;

    #[tokio::test]
    async fn test_player_management() {
        let state = memory_state(vec![]);

        let summary = add_player(&state, "Lovova").await.unwrap();
        assert_eq!(summary.name, "lovova");
        assert!(add_player(&state, "lovova").await.is_err());

        add_alias(&state, "lovova", "lovo").await.unwrap();
        let shown = show_player(&state, "lovo").await.unwrap();
        assert_eq!(shown.aliases, vec!["lovo"]);

        assert!(remove_alias(&state, "lovova", "lovo").await.unwrap());
        assert!(show_player(&state, "lovo").await.is_err());

        assert_eq!(list_players(&state).await.unwrap().len(), 1);
        assert!(remove_player(&state, "lovova").await.unwrap());
        assert!(list_players(&state).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_pay_clears_unpaid() {
        let mut owed = PlayerRecord::new("lovova");
        owed.record_win(FightType::Keep, 0);
        let state = memory_state(vec![owed, PlayerRecord::new("yaafou")]);

        let unpaid = list_unpaid(&state).await.unwrap();
        assert_eq!(unpaid.len(), 1);
        assert_eq!(unpaid[0].name, "lovova");

        assert_eq!(pay(&state).await.unwrap(), 1);
        assert!(list_unpaid(&state).await.unwrap().is_empty());
    }
}
