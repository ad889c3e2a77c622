use crate::error::{ConfigError, ParseError};
use crate::models::config::ParserConfig;
use crate::models::fight::{FightType, Outcome, ParsedOutcome};
use crate::models::token::OcrCapture;
use crate::services::ocr::classifier::classify;
use crate::services::ocr::matcher::Dictionary;
use crate::services::ocr::normalizer::{normalize_all, normalize_text};
use crate::services::ocr::separator::{
    detect_fight_type, infer_outcome, keyword_pattern, separate, SplitMethod,
};
use regex::Regex;
use std::collections::HashSet;

/// Lenient parse result: an indeterminate split is reported, not rejected
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenAnalysis {
    pub outcome: ParsedOutcome,
    pub method: SplitMethod,
    pub tokens_kept: usize,
    pub participants: usize,
    pub noise: usize,
}

impl ScreenAnalysis {
    pub fn is_indeterminate(&self) -> bool {
        matches!(self.method, SplitMethod::Indeterminate)
    }
}

/// Turns one OCR capture of a result screen into a `ParsedOutcome`.
///
/// Vocabulary, anchor and prism keywords are normalized once at
/// construction; the roster is supplied per call since it changes between
/// submissions.
#[derive(Debug, Clone)]
pub struct ScreenParser {
    config: ParserConfig,
    anchor: String,
    vocabulary: Vec<String>,
    keywords: HashSet<String>,
    prism_pattern: Option<Regex>,
}

impl ScreenParser {
    pub fn new(config: &ParserConfig) -> Self {
        let vocabulary: Vec<String> = config
            .vocabulary
            .iter()
            .map(|w| normalize_text(w))
            .filter(|w| !w.is_empty())
            .collect();
        let keywords = vocabulary.iter().cloned().collect();

        Self {
            anchor: config.anchor(),
            prism_pattern: keyword_pattern(&config.prism_keywords),
            vocabulary,
            keywords,
            config: config.clone(),
        }
    }

    /// Build a parser, rejecting an unusable configuration up front
    pub fn validated(config: &ParserConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(config))
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Run the full pipeline. Fails only when there is nothing to split;
    /// a degenerate split comes back as empty sets with an unknown outcome.
    pub fn analyze(
        &self,
        capture: &OcrCapture,
        roster: &HashSet<String>,
    ) -> Result<ScreenAnalysis, ParseError> {
        let tokens = normalize_all(&capture.tokens);
        if tokens.is_empty() {
            return Err(ParseError::NoTokens);
        }

        let roster: HashSet<String> = roster
            .iter()
            .map(|name| normalize_text(name))
            .filter(|name| !name.is_empty())
            .collect();

        // Sorted so tie-breaking does not depend on hash order
        let mut roster_words: Vec<&str> = roster.iter().map(String::as_str).collect();
        roster_words.sort_unstable();

        let dictionary = Dictionary::build(
            self.vocabulary.iter().map(String::as_str),
            roster_words.iter().copied(),
        );
        let matched = dictionary.match_all(&tokens, self.config.match_threshold);

        let classification = classify(&matched, &roster, &self.keywords);
        if classification.participants.is_empty() {
            return Err(ParseError::NoParticipants);
        }

        let split = separate(
            &classification.participants,
            &classification.keywords,
            &self.anchor,
            self.config.winner_side,
        );

        let fight_type = self.fight_type(capture);
        let outcome = if split.is_indeterminate() {
            Outcome::Unknown
        } else {
            infer_outcome(&split.winners, &split.losers, &roster)
        };

        Ok(ScreenAnalysis {
            outcome: ParsedOutcome {
                winners: split.winners,
                losers: split.losers,
                fight_type,
                outcome,
            },
            method: split.method,
            tokens_kept: tokens.len(),
            participants: classification.participants.len(),
            noise: classification.noise,
        })
    }

    /// Strict variant of `analyze`: an indeterminate split is an error
    pub fn parse(
        &self,
        capture: &OcrCapture,
        roster: &HashSet<String>,
    ) -> Result<ParsedOutcome, ParseError> {
        let analysis = self.analyze(capture, roster)?;
        if analysis.is_indeterminate() {
            return Err(ParseError::IndeterminateSplit {
                candidates: analysis.participants,
            });
        }
        Ok(analysis.outcome)
    }

    /// Scan the raw lines; without line text, fall back to the token words
    fn fight_type(&self, capture: &OcrCapture) -> FightType {
        if capture.lines.is_empty() {
            detect_fight_type(
                capture.tokens.iter().map(|t| t.text.as_str()),
                self.prism_pattern.as_ref(),
            )
        } else {
            detect_fight_type(
                capture.lines.iter().map(String::as_str),
                self.prism_pattern.as_ref(),
            )
        }
    }
}

/// Parse one capture with a one-off parser
pub fn parse_capture(
    capture: &OcrCapture,
    roster: &HashSet<String>,
    config: &ParserConfig,
) -> Result<ParsedOutcome, ParseError> {
    ScreenParser::new(config).parse(capture, roster)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::WinnerSide;
    use crate::models::token::Token;

    fn roster(names: &[&str]) -> HashSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn capture(tokens: Vec<Token>, lines: &[&str]) -> OcrCapture {
        OcrCapture::new(tokens, lines.iter().map(|l| l.to_string()).collect())
    }

    #[test]
    fn test_parse_basic_screen() {
        let capture = capture(
            vec![
                Token::new("lovova", 10.0, 50.0),
                Token::new("perdants", 10.0, 100.0),
                Token::new("yaafou", 12.0, 150.0),
            ],
            &[],
        );

        let result = parse_capture(&capture, &roster(&["lovova"]), &ParserConfig::default())
            .expect("Should parse a well formed screen");

        assert_eq!(result.winners.iter().collect::<Vec<_>>(), vec!["lovova"]);
        assert_eq!(result.losers.iter().collect::<Vec<_>>(), vec!["yaafou"]);
        assert_eq!(result.outcome, Outcome::Won);
        assert_eq!(result.fight_type, FightType::Keep);
    }

    #[test]
    fn test_parse_corrects_ocr_noise() {
        let capture = capture(
            vec![
                Token::new("Gagnants", 10.0, 10.0),
                Token::new("Lovava", 10.0, 50.0),
                Token::new("12.5%", 200.0, 50.0),
                Token::new("Perdant5", 10.0, 100.0),
                Token::new("Yaafou!", 12.0, 150.0),
            ],
            &["Gagnants", "Lovava 12.5%", "Perdant5", "Yaafou!"],
        );

        let result = parse_capture(&capture, &roster(&["Lovova"]), &ParserConfig::default())
            .expect("Should parse despite OCR noise");

        assert!(result.winners.contains("lovova"), "Fuzzy match should restore the roster name");
        assert!(!result.winners.contains("gagnants"), "Keywords are not participants");
        assert!(result.losers.contains("yaafou"));
        assert_eq!(result.outcome, Outcome::Won);
    }

    #[test]
    fn test_parse_detects_prism_from_lines() {
        let capture = capture(
            vec![
                Token::new("yaafou", 10.0, 50.0),
                Token::new("perdants", 10.0, 100.0),
                Token::new("lovova", 10.0, 150.0),
            ],
            &["Attaque du Prisme", "perdants"],
        );

        let result = parse_capture(&capture, &roster(&["lovova"]), &ParserConfig::default()).unwrap();

        assert_eq!(result.fight_type, FightType::Prism);
        assert_eq!(result.outcome, Outcome::Lost);
    }

    #[test]
    fn test_parse_respects_winner_side() {
        let mut config = ParserConfig::default();
        config.winner_side = WinnerSide::Below;
        let capture = capture(
            vec![
                Token::new("lovova", 10.0, 50.0),
                Token::new("perdants", 10.0, 100.0),
                Token::new("yaafou", 12.0, 150.0),
            ],
            &[],
        );

        let result = parse_capture(&capture, &roster(&["lovova"]), &config).unwrap();

        assert!(result.losers.contains("lovova"));
        assert_eq!(result.outcome, Outcome::Lost);
    }

    #[test]
    fn test_parse_empty_capture_fails() {
        let result = parse_capture(&OcrCapture::default(), &roster(&[]), &ParserConfig::default());
        assert_eq!(result, Err(ParseError::NoTokens));

        let only_noise = capture(vec![Token::new("!!", 0.0, 0.0)], &[]);
        let result = parse_capture(&only_noise, &roster(&[]), &ParserConfig::default());
        assert_eq!(result, Err(ParseError::NoTokens));
    }

    #[test]
    fn test_parse_without_participants_fails() {
        let capture = capture(
            vec![Token::new("perdants", 10.0, 100.0), Token::new("1500", 10.0, 120.0)],
            &[],
        );

        let result = parse_capture(&capture, &roster(&[]), &ParserConfig::default());
        assert_eq!(result, Err(ParseError::NoParticipants));
    }

    #[test]
    fn test_degenerate_split() {
        let capture = capture(
            vec![Token::new("lovova", 10.0, 50.0), Token::new("yaafou", 80.0, 50.0)],
            &[],
        );
        let parser = ScreenParser::new(&ParserConfig::default());

        let analysis = parser.analyze(&capture, &roster(&["lovova"])).unwrap();
        assert!(analysis.is_indeterminate());
        assert!(analysis.outcome.is_empty());
        assert_eq!(analysis.outcome.outcome, Outcome::Unknown);

        let strict = parser.parse(&capture, &roster(&["lovova"]));
        assert_eq!(strict, Err(ParseError::IndeterminateSplit { candidates: 2 }));
    }

    #[test]
    fn test_validated_rejects_bad_config() {
        let mut config = ParserConfig::default();
        config.anchor_keyword = String::new();

        assert!(ScreenParser::validated(&config).is_err());
        assert!(ScreenParser::validated(&ParserConfig::default()).is_ok());
    }
}
