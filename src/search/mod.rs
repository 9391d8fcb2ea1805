// Search and replace over the document buffer.
//
// A find request names its pattern kind explicitly:
//   - Hex:      whitespace-separated hex pairs, e.g. "DE AD be ef"
//   - Char:     text decoded through the char map
//   - Relative: text whose letter-to-letter differences are matched
//
// `resolve_needle` turns the request text into a `Needle` without touching
// editor state; the `exact` and `relative` engines then locate matches.

pub mod exact;
pub mod relative;

use std::ops::Range;

use thiserror::Error;

use crate::charmap::CharMap;
use crate::editor::clipboard;

pub use relative::RelativePattern;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// How the request text is interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchKind {
    #[default]
    Hex,
    Char,
    Relative,
}

/// Find flags supplied by the find/replace dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FindOptions {
    pub case_sensitive: bool,
    pub wrap: bool,
    pub backwards: bool,
}

impl Default for FindOptions {
    fn default() -> Self {
        Self {
            case_sensitive: true,
            wrap: false,
            backwards: false,
        }
    }
}

/// Resolved search pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Needle {
    /// Exact byte sequence.
    Bytes(Vec<u8>),
    /// Pairwise-difference pattern.
    Relative(RelativePattern),
}

/// Where a search starts from, in byte units.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPosition {
    pub cursor: usize,
    pub selection: Option<Range<usize>>,
}

/// A located match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    /// Byte offset of the first matched byte.
    pub start: usize,
    /// Number of matched bytes.
    pub len: usize,
}

impl Match {
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

/// Result of a replace-one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplaceOutcome {
    /// Whether a match at the current position was replaced.
    pub replaced: bool,
    /// The next match, already selected, if any.
    pub next: Option<Match>,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("search pattern is empty")]
    EmptyPattern,
    #[error("hex pattern must have an even number of digits")]
    OddHexLength,
    #[error("invalid hex digit '{0}'")]
    InvalidHexDigit(char),
    #[error("character '{0}' is not present in the conversion table")]
    UnmappedChar(char),
    #[error("relative search requires at least {min} characters (got {got})")]
    PatternTooShort { min: usize, got: usize },
    #[error("relative search pattern contains no letters")]
    NoLetters,
    #[error("buffer too small for a sequence of {pattern} bytes")]
    PatternLongerThanBuffer { pattern: usize },
    #[error("backward relative search is not implemented")]
    UnsupportedDirection,
    #[error("replace is not available for relative search")]
    ReplaceUnsupported,
}

// ---------------------------------------------------------------------------
// Needle resolution
// ---------------------------------------------------------------------------

/// Turn request text into a search pattern.
pub fn resolve_needle(text: &str, kind: SearchKind, map: &CharMap) -> Result<Needle, SearchError> {
    match kind {
        SearchKind::Hex => parse_hex(text).map(Needle::Bytes),
        SearchKind::Char => {
            if text.is_empty() {
                return Err(SearchError::EmptyPattern);
            }
            map.encode_strict(text)
                .map(Needle::Bytes)
                .map_err(SearchError::UnmappedChar)
        }
        SearchKind::Relative => RelativePattern::parse(text).map(Needle::Relative),
    }
}

/// Turn replacement text into bytes. An empty replacement deletes matches.
pub fn resolve_replacement(
    text: &str,
    kind: SearchKind,
    map: &CharMap,
) -> Result<Vec<u8>, SearchError> {
    let blank = match kind {
        SearchKind::Hex => text.trim().is_empty(),
        SearchKind::Char => text.is_empty(),
        SearchKind::Relative => return Err(SearchError::ReplaceUnsupported),
    };
    if blank {
        return Ok(Vec::new());
    }
    match resolve_needle(text, kind, map)? {
        Needle::Bytes(bytes) => Ok(bytes),
        Needle::Relative(_) => Err(SearchError::ReplaceUnsupported),
    }
}

fn parse_hex(text: &str) -> Result<Vec<u8>, SearchError> {
    let digits: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if digits.is_empty() {
        return Err(SearchError::EmptyPattern);
    }
    if let Some(bad) = digits.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(SearchError::InvalidHexDigit(bad));
    }
    if !digits.len().is_multiple_of(2) {
        return Err(SearchError::OddHexLength);
    }
    clipboard::parse_hex_string(&digits).ok_or(SearchError::OddHexLength)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
