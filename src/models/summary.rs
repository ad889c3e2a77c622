use crate::models::fight::{FightType, Outcome, ParsedOutcome};
use crate::models::player::{FightCounters, PlayerRecord};
use crate::services::aggregate::{content_hash_of, ResultAggregate};
use serde::Serialize;
use std::fmt;

/// Plain view of a result for rendering
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ResultSummary {
    pub winners: Vec<String>,
    pub losers: Vec<String>,
    pub fight_type: FightType,
    pub outcome: Outcome,
    pub hash: String,
}

impl From<&ParsedOutcome> for ResultSummary {
    fn from(outcome: &ParsedOutcome) -> Self {
        Self {
            winners: outcome.winners.iter().cloned().collect(),
            losers: outcome.losers.iter().cloned().collect(),
            fight_type: outcome.fight_type,
            outcome: outcome.outcome,
            hash: content_hash_of(
                &outcome.winners,
                &outcome.losers,
                outcome.fight_type,
                outcome.outcome,
            ),
        }
    }
}

impl From<&ResultAggregate> for ResultSummary {
    fn from(aggregate: &ResultAggregate) -> Self {
        Self {
            winners: aggregate.winners().iter().cloned().collect(),
            losers: aggregate.losers().iter().cloned().collect(),
            fight_type: aggregate.fight_type(),
            outcome: aggregate.outcome(),
            hash: aggregate.content_hash(),
        }
    }
}

fn join_or_dash(names: &[String]) -> String {
    if names.is_empty() {
        "-".to_string()
    } else {
        names.join(", ")
    }
}

impl fmt::Display for ResultSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headline = match self.outcome {
            Outcome::Won => "Victory",
            Outcome::Lost => "Defeat",
            Outcome::Unknown => "Undetermined result",
        };
        writeln!(f, "{}", headline)?;
        writeln!(f, "Target: {}", self.fight_type)?;
        writeln!(f, "Winners: {}", join_or_dash(&self.winners))?;
        writeln!(f, "Losers: {}", join_or_dash(&self.losers))?;
        write!(f, "Hash: {}", self.hash)
    }
}

/// Plain view of one player's statistics
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PlayerSummary {
    pub name: String,
    pub aliases: Vec<String>,
    pub prism: FightCounters,
    pub keep: FightCounters,
    pub unpaid: bool,
    pub last_fight: Option<String>,
}

impl From<&PlayerRecord> for PlayerSummary {
    fn from(record: &PlayerRecord) -> Self {
        let last_fight = record
            .fight_times
            .iter()
            .max()
            .and_then(|millis| chrono::DateTime::from_timestamp_millis(*millis))
            .map(|time| time.format("%Y-%m-%d %H:%M UTC").to_string());

        Self {
            name: record.primary_name.clone(),
            aliases: record.aliases.clone(),
            prism: record.prism,
            keep: record.keep,
            unpaid: record.has_unpaid_changes,
            last_fight,
        }
    }
}

impl fmt::Display for PlayerSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.aliases.is_empty() {
            write!(f, " (aka {})", self.aliases.join(", "))?;
        }
        writeln!(f)?;

        for (label, counters) in [("Prism", &self.prism), ("Keep", &self.keep)] {
            write!(
                f,
                "  {}: {} fights, {} won, {} lost",
                label, counters.total, counters.wins, counters.losses
            )?;
            if self.unpaid {
                write!(
                    f,
                    " | unpaid {} won, {} lost",
                    counters.unpaid_wins, counters.unpaid_losses
                )?;
            }
            writeln!(f)?;
        }

        match &self.last_fight {
            Some(time) => write!(f, "  Last fight: {}", time),
            None => write!(f, "  No fight recorded"),
        }
    }
}
