// Known-plaintext encoding guesser.
//
// Given phrases the user believes appear somewhere in the buffer, every
// alignment of every phrase is tested: the letters and digits of the phrase
// must read a consistent, one-to-one character <-> byte assignment at that
// alignment. Each distinct assignment found is a candidate for the char map.
//
// Characters other than letters and digits occupy a position but do not
// constrain the byte found there.

pub mod worker;

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::ops::Range;

use thiserror::Error;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

pub use worker::GuessWorker;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GuessError {
    #[error("at least one known phrase is required")]
    NoPhrases,
    #[error("known phrase {0:?} contains no letters or digits")]
    EmptyPhrase(String),
    #[error("invalid search range {start}..{end}")]
    InvalidRange { start: usize, end: usize },
    #[error("a guess is already running")]
    Busy,
}

// ---------------------------------------------------------------------------
// Phrases and mappings
// ---------------------------------------------------------------------------

/// A plaintext phrase plus where each of its letters and digits occurs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownPhrase {
    text: String,
    len_chars: usize,
    pattern: BTreeMap<char, Vec<usize>>,
}

impl KnownPhrase {
    pub fn new(text: &str) -> Result<Self, GuessError> {
        let mut pattern: BTreeMap<char, Vec<usize>> = BTreeMap::new();
        let mut len_chars = 0;
        for (i, c) in text.chars().enumerate() {
            if c.is_alphanumeric() {
                pattern.entry(c).or_default().push(i);
            }
            len_chars += 1;
        }
        if pattern.is_empty() {
            return Err(GuessError::EmptyPhrase(text.to_string()));
        }
        Ok(Self {
            text: text.to_string(),
            len_chars,
            pattern,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of bytes an alignment spans.
    pub fn len_chars(&self) -> usize {
        self.len_chars
    }

    /// Positions of each letter/digit, in order.
    pub fn pattern(&self) -> &BTreeMap<char, Vec<usize>> {
        &self.pattern
    }

    /// The assignment this phrase implies at `data[at..]`, if consistent.
    pub fn mapping_at(&self, data: &[u8], at: usize) -> Option<CandidateMapping> {
        let window = data.get(at..at + self.len_chars)?;
        let mut mapping = BTreeMap::new();
        let mut used = HashSet::new();

        for (&c, positions) in &self.pattern {
            let byte = window[positions[0]];
            if positions[1..].iter().any(|&p| window[p] != byte) {
                return None;
            }
            // Two characters reading the same byte break injectivity.
            if !used.insert(byte) {
                return None;
            }
            mapping.insert(c, byte);
        }
        Some(CandidateMapping(mapping))
    }
}

/// A consistent character -> byte assignment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CandidateMapping(pub BTreeMap<char, u8>);

impl CandidateMapping {
    pub fn get(&self, c: char) -> Option<u8> {
        self.0.get(&c).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Pairs in character order.
    pub fn pairs(&self) -> impl Iterator<Item = (char, u8)> + Clone + '_ {
        self.0.iter().map(|(&c, &b)| (c, b))
    }
}

impl fmt::Display for CandidateMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (c, b)) in self.pairs().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{c}={b:02X}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// What to scan for and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuessRequest {
    pub phrases: Vec<String>,
    /// Byte range to scan; the end is clamped to the buffer length.
    pub range: Range<usize>,
}

impl GuessRequest {
    /// Scan the whole buffer.
    pub fn new(phrases: Vec<String>) -> Self {
        Self {
            phrases,
            range: 0..usize::MAX,
        }
    }

    pub fn with_range(mut self, range: Range<usize>) -> Self {
        self.range = range;
        self
    }

    /// Validate and compile the phrases.
    pub fn compile(&self) -> Result<Vec<KnownPhrase>, GuessError> {
        if self.range.start > self.range.end {
            return Err(GuessError::InvalidRange {
                start: self.range.start,
                end: self.range.end,
            });
        }
        if self.phrases.is_empty() {
            return Err(GuessError::NoPhrases);
        }
        self.phrases.iter().map(|p| KnownPhrase::new(p)).collect()
    }
}

// ---------------------------------------------------------------------------
// Scan
// ---------------------------------------------------------------------------

fn alignments(data: &[u8], phrase: &KnownPhrase, range: &Range<usize>) -> Range<usize> {
    let end = range.end.min(data.len());
    let n = phrase.len_chars();
    if end < n || range.start > end - n {
        return 0..0;
    }
    range.start..end - n + 1
}

#[cfg(not(feature = "parallel"))]
fn phrase_candidates(data: &[u8], phrase: &KnownPhrase, range: &Range<usize>) -> Vec<CandidateMapping> {
    alignments(data, phrase, range)
        .filter_map(|i| phrase.mapping_at(data, i))
        .collect()
}

/// Alignments are tested in parallel; `collect` keeps them in offset order.
#[cfg(feature = "parallel")]
fn phrase_candidates(data: &[u8], phrase: &KnownPhrase, range: &Range<usize>) -> Vec<CandidateMapping> {
    alignments(data, phrase, range)
        .into_par_iter()
        .filter_map(|i| phrase.mapping_at(data, i))
        .collect()
}

/// Every distinct candidate mapping, in discovery order: phrases in the
/// order given, alignments in increasing offset.
pub fn guess(data: &[u8], phrases: &[KnownPhrase], range: Range<usize>) -> Vec<CandidateMapping> {
    log::debug!(
        "guess: scanning {} bytes for {} phrase(s) in {}..{}",
        data.len(),
        phrases.len(),
        range.start,
        range.end.min(data.len())
    );

    let mut seen = HashSet::new();
    let mut results = Vec::new();
    for phrase in phrases {
        for candidate in phrase_candidates(data, phrase, &range) {
            if !candidate.is_empty() && seen.insert(candidate.clone()) {
                results.push(candidate);
            }
        }
    }

    log::info!("guess: {} candidate mapping(s)", results.len());
    results
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn phrase(s: &str) -> KnownPhrase {
        KnownPhrase::new(s).unwrap()
    }

    #[test]
    fn position_pattern() {
        let p = phrase("ABA");
        assert_eq!(p.len_chars(), 3);
        assert_eq!(p.pattern()[&'A'], vec![0, 2]);
        assert_eq!(p.pattern()[&'B'], vec![1]);
    }

    #[test]
    fn non_alphanumerics_are_unconstrained() {
        let p = phrase("A B");
        assert_eq!(p.len_chars(), 3);
        assert!(!p.pattern().contains_key(&' '));
        assert!(p.mapping_at(&[0x10, 0xEE, 0x11], 0).is_some());
    }

    #[test]
    fn empty_phrase_is_rejected() {
        assert_eq!(
            KnownPhrase::new(" - "),
            Err(GuessError::EmptyPhrase(" - ".into()))
        );
        assert!(KnownPhrase::new("").is_err());
    }

    #[test]
    fn consistent_alignment_yields_mapping() {
        let found = guess(&[0x41, 0x42, 0x41], &[phrase("ABA")], 0..3);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].get('A'), Some(0x41));
        assert_eq!(found[0].get('B'), Some(0x42));
        assert_eq!(found[0].to_string(), "A=41 B=42");
    }

    #[test]
    fn non_injective_alignment_is_rejected() {
        assert!(guess(&[0x41, 0x41, 0x41], &[phrase("ABA")], 0..3).is_empty());
    }

    #[test]
    fn inconsistent_repeat_is_rejected() {
        assert!(guess(&[0x41, 0x42, 0x43], &[phrase("ABA")], 0..3).is_empty());
    }

    #[test]
    fn duplicates_are_dropped_in_discovery_order() {
        let data = [0x10, 0x20, 0x10, 0x10, 0x20, 0x10, 0x30, 0x40, 0x30];
        let found = guess(&data, &[phrase("ABA")], 0..data.len());
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].get('A'), Some(0x10));
        assert_eq!(found[1].get('A'), Some(0x30));
    }

    #[test]
    fn range_limits_alignments() {
        let data = [0x10, 0x20, 0x10, 0x30, 0x40, 0x30];
        let found = guess(&data, &[phrase("ABA")], 1..6);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].get('B'), Some(0x40));
        assert!(guess(&data, &[phrase("ABA")], 1..5).is_empty());
        assert!(guess(&data, &[phrase("ABA")], 5..6).is_empty());
    }

    #[test]
    fn phrases_scan_independently() {
        let data = [0x01, 0x02, 0x01];
        let found = guess(&data, &[phrase("ABA"), phrase("XYX")], 0..usize::MAX);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].get('A'), Some(0x01));
        assert_eq!(found[1].get('X'), Some(0x01));
    }

    #[test]
    fn request_validation() {
        assert_eq!(
            GuessRequest::new(vec![]).compile(),
            Err(GuessError::NoPhrases)
        );
        #[allow(clippy::reversed_empty_ranges)]
        let bad = GuessRequest::new(vec!["AB".into()]).with_range(5..2);
        assert_eq!(
            bad.compile(),
            Err(GuessError::InvalidRange { start: 5, end: 2 })
        );
        assert_eq!(GuessRequest::new(vec!["THE".into()]).compile().unwrap().len(), 1);
    }
}
