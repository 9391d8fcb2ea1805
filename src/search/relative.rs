// Relative-offset search.
//
// A pattern like "ADA" becomes the offsets [0, 3, 0] from its first letter;
// a run of bytes matches when the same differences hold between its bytes,
// whatever the actual values are. Non-letter characters are wildcards.

use super::{Match, SearchError};

/// Shortest accepted pattern, in characters.
pub const MIN_PATTERN_CHARS: usize = 3;

/// Compiled relative pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelativePattern {
    /// Per-position offset from the base letter; `None` matches any byte.
    offsets: Vec<Option<i32>>,
    /// Position of the base letter.
    base_index: usize,
}

impl RelativePattern {
    pub fn parse(text: &str) -> Result<Self, SearchError> {
        let chars: Vec<char> = text.chars().collect();
        if chars.is_empty() {
            return Err(SearchError::EmptyPattern);
        }
        if chars.len() < MIN_PATTERN_CHARS {
            return Err(SearchError::PatternTooShort {
                min: MIN_PATTERN_CHARS,
                got: chars.len(),
            });
        }

        let base_index = chars
            .iter()
            .position(|c| c.is_alphabetic())
            .ok_or(SearchError::NoLetters)?;
        let base = chars[base_index] as i32;

        let offsets = chars
            .iter()
            .map(|&c| c.is_alphabetic().then(|| c as i32 - base))
            .collect();

        Ok(Self {
            offsets,
            base_index,
        })
    }

    /// Number of bytes a match spans.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    pub fn offsets(&self) -> &[Option<i32>] {
        &self.offsets
    }

    /// Whether the run starting at `at` satisfies every non-wildcard offset.
    pub fn matches_at(&self, data: &[u8], at: usize) -> bool {
        let Some(window) = data.get(at..at + self.len()) else {
            return false;
        };
        let base = i32::from(window[self.base_index]);
        self.offsets
            .iter()
            .zip(window)
            .all(|(offset, &b)| offset.is_none_or(|o| i32::from(b) - base == o))
    }
}

/// Next relative match after `cursor_byte`.
///
/// Scans forward from `min(len - n, cursor_byte + 1)`; with `wrap`, retries
/// from 0 up to that start. Backward scanning is not supported.
pub fn find_next(
    data: &[u8],
    pattern: &RelativePattern,
    cursor_byte: usize,
    wrap: bool,
    backwards: bool,
) -> Result<Option<Match>, SearchError> {
    if backwards {
        return Err(SearchError::UnsupportedDirection);
    }
    find_from(data, pattern, cursor_byte.saturating_add(1), wrap)
}

/// First relative match starting at or after `start` (clamped to the last
/// full window). With `wrap`, retries from 0 up to that start.
pub fn find_from(
    data: &[u8],
    pattern: &RelativePattern,
    start: usize,
    wrap: bool,
) -> Result<Option<Match>, SearchError> {
    let n = pattern.len();
    if data.len() < n {
        return Err(SearchError::PatternLongerThanBuffer { pattern: n });
    }

    let last = data.len() - n;
    let start = last.min(start);

    let found = (start..=last)
        .find(|&i| pattern.matches_at(data, i))
        .or_else(|| {
            if wrap {
                (0..start).find(|&i| pattern.matches_at(data, i))
            } else {
                None
            }
        });

    if found.is_none() {
        log::debug!("relative search: no run of {n} bytes matched");
    }
    Ok(found.map(|start| Match { start, len: n }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
