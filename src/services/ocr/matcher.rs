use crate::models::token::{MatchDistance, MatchedToken, NormalizedToken};
use crate::services::ocr::normalizer::normalize_text;
use rayon::prelude::*;
use std::collections::HashSet;

pub const DEFAULT_THRESHOLD: usize = 3;

/// Result of matching one word against the dictionary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    pub matched_word: String,
    pub distance: MatchDistance,
}

/// Combined domain vocabulary and roster, normalized once per parse.
///
/// Entries keep insertion order (vocabulary first, then roster) so ties are
/// always broken the same way.
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    entries: Vec<String>,
}

impl Dictionary {
    pub fn build<'a>(
        vocabulary: impl IntoIterator<Item = &'a str>,
        roster: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        let mut seen = HashSet::new();
        let entries = vocabulary
            .into_iter()
            .chain(roster)
            .map(normalize_text)
            .filter(|w| !w.is_empty())
            .filter(|w| seen.insert(w.clone()))
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Map a normalized word to its closest entry within `threshold` edits.
    ///
    /// Above the threshold the word itself is returned along with the true
    /// minimum distance.
    pub fn lookup(&self, word: &str, is_number: bool, threshold: usize) -> MatchResult {
        if word.chars().all(|c| c.is_ascii_punctuation() || c.is_whitespace()) {
            return MatchResult {
                matched_word: word.to_string(),
                distance: MatchDistance::Unmatchable,
            };
        }

        if is_number {
            return MatchResult {
                matched_word: word.to_string(),
                distance: MatchDistance::Number,
            };
        }

        let mut best: Option<(&str, usize)> = None;
        for entry in &self.entries {
            let d = levenshtein::levenshtein(word, entry);
            match best {
                Some((_, min)) if d >= min => {}
                _ => best = Some((entry.as_str(), d)),
            }
            if d == 0 {
                break;
            }
        }

        match best {
            Some((entry, d)) if d <= threshold => MatchResult {
                matched_word: entry.to_string(),
                distance: MatchDistance::Edit(d),
            },
            Some((_, d)) => MatchResult {
                matched_word: word.to_string(),
                distance: MatchDistance::Edit(d),
            },
            None => MatchResult {
                matched_word: word.to_string(),
                distance: MatchDistance::Unmatchable,
            },
        }
    }

    pub fn match_token(&self, token: &NormalizedToken, threshold: usize) -> MatchedToken {
        let result = self.lookup(&token.normalized, token.is_numeric, threshold);
        if let MatchDistance::Edit(d) = result.distance {
            if d > threshold {
                tracing::debug!(word = %token.normalized, distance = d, "no dictionary match");
            } else if d > 0 {
                tracing::debug!(word = %token.normalized, matched = %result.matched_word, distance = d, "fuzzy match");
            }
        }
        MatchedToken {
            token: token.clone(),
            word: result.matched_word,
            distance: result.distance,
        }
    }

    /// Match every token in parallel. Output order equals input order.
    pub fn match_all(&self, tokens: &[NormalizedToken], threshold: usize) -> Vec<MatchedToken> {
        tokens
            .par_iter()
            .map(|token| self.match_token(token, threshold))
            .collect()
    }
}
