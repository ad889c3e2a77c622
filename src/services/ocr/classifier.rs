use crate::models::token::{ClassifiedToken, MatchedToken, Position, TokenClass};
use std::collections::HashSet;

/// Output of classification. Noise tokens are counted but not kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
    pub participants: Vec<(String, Position)>,
    pub keywords: Vec<(String, Position)>,
    pub noise: usize,
}

impl Classification {
    pub fn total(&self) -> usize {
        self.participants.len() + self.keywords.len() + self.noise
    }
}

/// Decide the class of one matched word.
///
/// Unregistered names still count as participants so they can be corrected
/// during review; only very short or letterless leftovers are noise.
pub fn classify_word(
    word: &str,
    is_numeric: bool,
    roster: &HashSet<String>,
    keywords: &HashSet<String>,
) -> TokenClass {
    if roster.contains(word) {
        TokenClass::Participant
    } else if is_numeric || keywords.contains(word) {
        TokenClass::Keyword
    } else if word.chars().count() > 1 && word.chars().any(|c| c.is_alphabetic()) {
        TokenClass::Participant
    } else {
        TokenClass::Noise
    }
}

pub fn classify_token(
    token: &MatchedToken,
    roster: &HashSet<String>,
    keywords: &HashSet<String>,
) -> ClassifiedToken {
    ClassifiedToken {
        word: token.word.clone(),
        position: token.position(),
        class: classify_word(&token.word, token.is_numeric(), roster, keywords),
    }
}

/// Partition matched tokens into participants, keywords and noise
pub fn classify(
    tokens: &[MatchedToken],
    roster: &HashSet<String>,
    keywords: &HashSet<String>,
) -> Classification {
    let mut result = Classification::default();

    for token in tokens {
        let classified = classify_token(token, roster, keywords);
        match classified.class {
            TokenClass::Participant => {
                result.participants.push((classified.word, classified.position))
            }
            TokenClass::Keyword => result.keywords.push((classified.word, classified.position)),
            TokenClass::Noise => {
                tracing::debug!(word = %classified.word, "discarding noise token");
                result.noise += 1;
            }
        }
    }

    tracing::info!(
        participants = result.participants.len(),
        keywords = result.keywords.len(),
        noise = result.noise,
        "classified tokens"
    );
    result
}
