//! Spatial winners/losers separation and result inference.
//!
//! The anchor keyword ("perdants") heads the losers section. Participants
//! are split by their vertical position relative to it; when the anchor is
//! missing, a 2-means clustering over `y` is used instead.

use crate::models::config::WinnerSide;
use crate::models::fight::{FightType, Outcome};
use crate::models::token::Position;
use regex::Regex;
use std::collections::{BTreeSet, HashSet};

const MAX_KMEANS_ITERATIONS: usize = 100;

/// How the split was obtained
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SplitMethod {
    Anchor { frontier_y: f64 },
    Clustering { winners_centroid: f64, losers_centroid: f64 },
    /// Not enough information to split; winners and losers are empty
    Indeterminate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    pub winners: BTreeSet<String>,
    pub losers: BTreeSet<String>,
    pub method: SplitMethod,
}

impl Split {
    fn indeterminate() -> Self {
        Self {
            winners: BTreeSet::new(),
            losers: BTreeSet::new(),
            method: SplitMethod::Indeterminate,
        }
    }

    pub fn is_indeterminate(&self) -> bool {
        matches!(self.method, SplitMethod::Indeterminate)
    }
}

/// Split participants into winners and losers
pub fn separate(
    participants: &[(String, Position)],
    keywords: &[(String, Position)],
    anchor: &str,
    side: WinnerSide,
) -> Split {
    if participants.is_empty() {
        tracing::warn!("no participants to separate");
        return Split::indeterminate();
    }

    let frontier = keywords
        .iter()
        .find(|(word, pos)| word == anchor && pos.y.is_finite())
        .map(|(_, pos)| pos.y);

    let mut split = match frontier {
        Some(frontier_y) => {
            tracing::info!(anchor, frontier_y, "splitting on anchor keyword");
            split_on_frontier(participants, frontier_y, side)
        }
        None => {
            tracing::warn!(anchor, "anchor keyword not found, falling back to clustering");
            split_by_clustering(participants, side)
        }
    };

    // Same name on both sides: the loser side wins the tie
    let both: Vec<String> = split.winners.intersection(&split.losers).cloned().collect();
    for name in both {
        tracing::warn!(name = %name, "name found on both sides, keeping it as loser");
        split.winners.remove(&name);
    }

    tracing::info!(
        winners = split.winners.len(),
        losers = split.losers.len(),
        "separated participants"
    );
    split
}

fn is_winner_side(y: f64, frontier_y: f64, side: WinnerSide) -> bool {
    match side {
        WinnerSide::Above => y < frontier_y,
        WinnerSide::Below => y > frontier_y,
    }
}

fn split_on_frontier(participants: &[(String, Position)], frontier_y: f64, side: WinnerSide) -> Split {
    let mut winners = BTreeSet::new();
    let mut losers = BTreeSet::new();

    for (name, pos) in participants {
        if is_winner_side(pos.y, frontier_y, side) {
            winners.insert(name.clone());
        } else {
            losers.insert(name.clone());
        }
    }

    Split {
        winners,
        losers,
        method: SplitMethod::Anchor { frontier_y },
    }
}

/// 1-D 2-means. Returns `(low_centroid, high_centroid)` or `None` when the
/// values do not form two clusters.
pub fn two_means(values: &[f64]) -> Option<(f64, f64)> {
    let mut low = values.iter().copied().fold(f64::INFINITY, f64::min);
    let mut high = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !low.is_finite() || !high.is_finite() || low == high {
        return None;
    }

    for _ in 0..MAX_KMEANS_ITERATIONS {
        let (mut low_sum, mut low_n, mut high_sum, mut high_n) = (0.0, 0usize, 0.0, 0usize);
        for &v in values {
            if (v - low).abs() < (v - high).abs() {
                low_sum += v;
                low_n += 1;
            } else {
                high_sum += v;
                high_n += 1;
            }
        }

        if low_n == 0 || high_n == 0 {
            return None;
        }

        let next_low = low_sum / low_n as f64;
        let next_high = high_sum / high_n as f64;
        if next_low == low && next_high == high {
            break;
        }
        low = next_low;
        high = next_high;
    }

    Some((low, high))
}

fn split_by_clustering(participants: &[(String, Position)], side: WinnerSide) -> Split {
    let ys: Vec<f64> = participants.iter().map(|(_, pos)| pos.y).collect();

    let Some((low, high)) = two_means(&ys) else {
        tracing::warn!(
            candidates = participants.len(),
            "fewer than two distinct vertical positions, split is indeterminate"
        );
        return Split::indeterminate();
    };

    let (winners_centroid, losers_centroid) = match side {
        WinnerSide::Above => (low, high),
        WinnerSide::Below => (high, low),
    };

    let mut winners = BTreeSet::new();
    let mut losers = BTreeSet::new();
    for (name, pos) in participants {
        // Equidistant points go to the losers
        if (pos.y - winners_centroid).abs() < (pos.y - losers_centroid).abs() {
            winners.insert(name.clone());
        } else {
            losers.insert(name.clone());
        }
    }

    tracing::info!(winners_centroid, losers_centroid, "split by clustering");
    Split {
        winners,
        losers,
        method: SplitMethod::Clustering {
            winners_centroid,
            losers_centroid,
        },
    }
}

/// Build a case-insensitive matcher for the fight-type keywords
pub fn keyword_pattern(keywords: &[String]) -> Option<Regex> {
    let alternatives: Vec<String> = keywords
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .map(regex::escape)
        .collect();
    if alternatives.is_empty() {
        return None;
    }
    Regex::new(&format!("(?i)(?:{})", alternatives.join("|"))).ok()
}

/// Prism when any line mentions a prism keyword, keep otherwise
pub fn detect_fight_type<'a>(
    lines: impl IntoIterator<Item = &'a str>,
    prism_pattern: Option<&Regex>,
) -> FightType {
    let Some(pattern) = prism_pattern else {
        return FightType::Keep;
    };

    if lines.into_iter().any(|line| pattern.is_match(line)) {
        tracing::info!("prism keyword found, prism fight");
        FightType::Prism
    } else {
        tracing::info!("no prism keyword, defaulting to keep fight");
        FightType::Keep
    }
}

/// Whether the roster sits on the winning or the losing side
pub fn infer_outcome(
    winners: &BTreeSet<String>,
    losers: &BTreeSet<String>,
    roster: &HashSet<String>,
) -> Outcome {
    let ours_won = winners.iter().any(|n| roster.contains(n));
    let ours_lost = losers.iter().any(|n| roster.contains(n));

    match (ours_won, ours_lost) {
        (true, false) => Outcome::Won,
        (false, true) => Outcome::Lost,
        (true, true) => {
            tracing::warn!("roster members found among both winners and losers, outcome unknown");
            Outcome::Unknown
        }
        (false, false) => Outcome::Unknown,
    }
}
