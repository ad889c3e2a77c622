use serde::{Deserialize, Serialize};

/// On-image position of a recognized word (smaller `y` = higher on screen)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Both coordinates are finite numbers
    pub fn is_valid(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// One OCR word with its position
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Token {
    pub text: String,
    pub position: Position,
}

impl Token {
    pub fn new(text: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            text: text.into(),
            position: Position::new(x, y),
        }
    }
}

/// Everything the OCR collaborator hands over for one screenshot
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OcrCapture {
    pub tokens: Vec<Token>,
    /// Raw per-line text, scanned for fight-type keywords
    #[serde(default)]
    pub lines: Vec<String>,
}

impl OcrCapture {
    pub fn new(tokens: Vec<Token>, lines: Vec<String>) -> Self {
        Self { tokens, lines }
    }
}

/// Token after normalization
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedToken {
    pub raw: String,
    pub normalized: String,
    pub is_numeric: bool,
    pub position: Position,
}

/// Edit distance reported by the vocabulary matcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchDistance {
    /// Token is numeric, matching skipped
    Number,
    /// Token is punctuation/whitespace only, or the dictionary is empty
    Unmatchable,
    Edit(usize),
}

/// Normalized token with the word it was mapped to
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedToken {
    pub token: NormalizedToken,
    /// Dictionary entry when within threshold, the normalized token otherwise
    pub word: String,
    pub distance: MatchDistance,
}

impl MatchedToken {
    pub fn position(&self) -> Position {
        self.token.position
    }

    pub fn is_numeric(&self) -> bool {
        self.token.is_numeric
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenClass {
    Participant,
    Keyword,
    Noise,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedToken {
    pub word: String,
    pub position: Position,
    pub class: TokenClass,
}
