//! Token normalization: lowercase, strip diacritics, keep a fixed character
//! whitelist, detect numbers.

use crate::models::token::{NormalizedToken, Token};
use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

static DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]+$").expect("regex"));

/// Characters that survive normalization
fn is_whitelisted(c: char) -> bool {
    matches!(c, '0'..='9' | 'a'..='z' | '_' | '-' | ':' | '(' | ')' | '#')
}

/// Letters with no canonical decomposition
fn fold_letter(c: char) -> Option<&'static str> {
    match c {
        'ł' => Some("l"),
        'ø' => Some("o"),
        'đ' | 'ð' => Some("d"),
        'ħ' => Some("h"),
        'ı' => Some("i"),
        'œ' => Some("oe"),
        'æ' => Some("ae"),
        'ß' => Some("ss"),
        'þ' => Some("th"),
        _ => None,
    }
}

/// Normalize a raw word. May return an empty string.
pub fn normalize_text(raw: &str) -> String {
    let mut normalized = String::with_capacity(raw.len());
    for c in raw.to_lowercase().nfd() {
        if is_combining_mark(c) {
            continue;
        }
        match fold_letter(c) {
            Some(folded) => normalized.push_str(folded),
            None if is_whitelisted(c) => normalized.push(c),
            None => {}
        }
    }
    normalized
}

/// A word is numeric when, after removing at most one each of
/// `.` `,` `-` `:` `%`, only decimal digits remain.
pub fn is_numeric(word: &str) -> bool {
    let mut cleaned = word.to_string();
    for sep in ['.', ',', '-', ':', '%'] {
        if let Some(idx) = cleaned.find(sep) {
            cleaned.remove(idx);
        }
    }
    DIGITS.is_match(&cleaned)
}

/// Normalize one token. `None` means the token is dropped.
pub fn normalize(token: &Token) -> Option<NormalizedToken> {
    let normalized = normalize_text(&token.text);
    if normalized.is_empty() {
        return None;
    }

    Some(NormalizedToken {
        raw: token.text.clone(),
        is_numeric: is_numeric(&normalized),
        normalized,
        position: token.position,
    })
}

/// Normalize a token sequence, dropping empty results and tokens without a
/// usable position. Order is preserved.
pub fn normalize_all(tokens: &[Token]) -> Vec<NormalizedToken> {
    let kept: Vec<NormalizedToken> = tokens
        .iter()
        .filter(|token| {
            if token.position.is_valid() {
                true
            } else {
                tracing::warn!(word = %token.text, "dropping token with invalid position");
                false
            }
        })
        .filter_map(normalize)
        .collect();

    tracing::info!(
        before = tokens.len(),
        after = kept.len(),
        "normalized OCR tokens"
    );
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_lowercases_and_strips_accents() {
        assert_eq!(normalize_text("Défaite"), "defaite");
        assert_eq!(normalize_text("ÉLÈVE"), "eleve");
        assert_eq!(normalize_text("Garçon"), "garcon");
    }

    #[test]
    fn test_normalize_folds_letters_outside_western_europe() {
        assert_eq!(normalize_text("Dvořák"), "dvorak");
        assert_eq!(normalize_text("Ōtsuka"), "otsuka");
        assert_eq!(normalize_text("Łukasz"), "lukasz");
        assert_eq!(normalize_text("Søren"), "soren");
        assert_eq!(normalize_text("Œdipe"), "oedipe");
        assert_eq!(normalize_text("Straße"), "strasse");
        assert_eq!(normalize_text("İlkay"), "ilkay");
    }

    #[test]
    fn test_normalize_drops_non_whitelisted() {
        assert_eq!(normalize_text("Lo vo.va!"), "lovova");
        assert_eq!(normalize_text("[Team#1]"), "team#1");
        assert_eq!(normalize_text("x_y-z:(1)"), "x_y-z:(1)");
    }

    #[test]
    fn test_normalize_can_be_empty() {
        assert_eq!(normalize_text("!!!"), "");
        assert_eq!(normalize_text("   "), "");
        assert!(normalize(&Token::new("...", 0.0, 0.0)).is_none());
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let samples = [
            "Défaite", "Lovova", "12.5%", "   ", "ÀÉÎÕÜ", "x-(y)#", "名前", "Ärger!", "a.b,c", "Łódź", "Œuvre",
        ];
        for raw in samples {
            let once = normalize_text(raw);
            assert_eq!(normalize_text(&once), once, "Not idempotent for {:?}", raw);
        }
    }

    #[test]
    fn test_is_numeric_accepts_single_separators() {
        assert!(is_numeric("123"));
        assert!(is_numeric("12.5"));
        assert!(is_numeric("1,000"));
        assert!(is_numeric("-42"));
        assert!(is_numeric("12:30"));
        assert!(is_numeric("50%"));
        assert!(is_numeric("-1.5%"));
    }

    #[test]
    fn test_is_numeric_rejects_repeated_separators_and_letters() {
        assert!(!is_numeric("1.2.3"));
        assert!(!is_numeric("12ab"));
        assert!(!is_numeric(""));
        assert!(!is_numeric("-"));
    }

    #[test]
    fn test_normalize_token_flags_numbers() {
        let token = normalize(&Token::new("1:23", 5.0, 6.0)).unwrap();

        assert_eq!(token.normalized, "1:23");
        assert!(token.is_numeric);
        assert_eq!(token.raw, "1:23");
    }

    #[test]
    fn test_normalize_all_drops_empty_and_invalid_positions() {
        let tokens = vec![
            Token::new("Lovova", 10.0, 50.0),
            Token::new("!!", 10.0, 60.0),
            Token::new("Yaafou", 10.0, f64::NAN),
            Token::new("Perdants", 10.0, 100.0),
        ];

        let kept = normalize_all(&tokens);
        let words: Vec<_> = kept.iter().map(|t| t.normalized.as_str()).collect();
        assert_eq!(words, vec!["lovova", "perdants"]);
    }
}
