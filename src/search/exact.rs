// Exact byte-sequence search and replace.
//
// Case-insensitive matching folds ASCII letters to lowercase on both the
// haystack and the needle; all other bytes compare as-is.

use std::borrow::Cow;
use std::ops::Range;

use memchr::memmem;

use super::{FindOptions, Match, SearchPosition};

/// Haystack or needle as it should be compared.
pub fn fold(bytes: &[u8], case_sensitive: bool) -> Cow<'_, [u8]> {
    if case_sensitive {
        Cow::Borrowed(bytes)
    } else {
        Cow::Owned(bytes.to_ascii_lowercase())
    }
}

/// Whether `needle` occurs at byte `at`.
pub fn matches_at(data: &[u8], needle: &[u8], at: usize, case_sensitive: bool) -> bool {
    let Some(window) = data.get(at..at.saturating_add(needle.len())) else {
        return false;
    };
    if case_sensitive {
        window == needle
    } else {
        window.eq_ignore_ascii_case(needle)
    }
}

/// First occurrence starting at or after `from`.
fn index_of(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    let from = from.min(haystack.len());
    memmem::find(&haystack[from..], needle).map(|p| p + from)
}

/// Last occurrence starting at or before `last_start`.
fn last_index_of(haystack: &[u8], needle: &[u8], last_start: usize) -> Option<usize> {
    let end = last_start
        .saturating_add(needle.len())
        .min(haystack.len());
    memmem::rfind(&haystack[..end], needle)
}

/// Forward search from `start`. With `wrap`, a miss retries from 0 and only
/// accepts a hit that lies before `start`.
pub fn find_forward(
    data: &[u8],
    needle: &[u8],
    start: usize,
    case_sensitive: bool,
    wrap: bool,
) -> Option<Match> {
    if needle.is_empty() {
        return None;
    }
    let haystack = fold(data, case_sensitive);
    let needle_cmp = fold(needle, case_sensitive);
    let start = start.min(data.len());

    let found = index_of(&haystack, &needle_cmp, start).or_else(|| {
        if wrap {
            index_of(&haystack, &needle_cmp, 0).filter(|&p| p < start)
        } else {
            None
        }
    });

    found.map(|start| Match {
        start,
        len: needle.len(),
    })
}

/// Backward search for the last match starting at or before `search_end`.
/// A negative `search_end` means nothing precedes the start point. With
/// `wrap`, a miss retries from the end of the buffer and only accepts a hit
/// after `search_end`.
pub fn find_backward(
    data: &[u8],
    needle: &[u8],
    search_end: isize,
    case_sensitive: bool,
    wrap: bool,
) -> Option<Match> {
    if needle.is_empty() || data.is_empty() {
        return None;
    }
    let haystack = fold(data, case_sensitive);
    let needle_cmp = fold(needle, case_sensitive);

    let primary = if search_end >= 0 {
        last_index_of(&haystack, &needle_cmp, search_end as usize)
    } else {
        None
    };

    let found = primary.or_else(|| {
        if wrap {
            last_index_of(&haystack, &needle_cmp, data.len() - 1)
                .filter(|&p| p as isize > search_end)
        } else {
            None
        }
    });

    found.map(|start| Match {
        start,
        len: needle.len(),
    })
}

/// Find-next relative to the current cursor/selection.
///
/// Forward starts at the selection end, else one past the cursor when the
/// needle already matches there, else at the cursor. Backward ends just
/// before the selection start, else just before the cursor, skipping a
/// match that ends exactly at the cursor.
pub fn find_next(
    data: &[u8],
    needle: &[u8],
    pos: &SearchPosition,
    opts: &FindOptions,
) -> Option<Match> {
    let n = needle.len();
    if opts.backwards {
        let search_end = match &pos.selection {
            Some(sel) => sel.start as isize - 1,
            None => {
                let cursor = pos.cursor;
                if cursor >= n && matches_at(data, needle, cursor - n, opts.case_sensitive) {
                    cursor as isize - n as isize - 1
                } else {
                    cursor as isize - 1
                }
            }
        };
        find_backward(data, needle, search_end, opts.case_sensitive, opts.wrap)
    } else {
        let start = match &pos.selection {
            Some(sel) => sel.end,
            None if pos.cursor < data.len()
                && matches_at(data, needle, pos.cursor, opts.case_sensitive) =>
            {
                pos.cursor + 1
            }
            None => pos.cursor,
        };
        find_forward(data, needle, start, opts.case_sensitive, opts.wrap)
    }
}

/// Non-overlapping match spans, scanned left to right over the unmodified buffer.
pub fn match_spans(data: &[u8], needle: &[u8], case_sensitive: bool) -> Vec<Range<usize>> {
    if needle.is_empty() {
        return Vec::new();
    }
    let haystack = fold(data, case_sensitive);
    let needle_cmp = fold(needle, case_sensitive);
    memmem::find_iter(&haystack, &needle_cmp)
        .map(|p| p..p + needle.len())
        .collect()
}

/// Replace every occurrence of `needle`.
///
/// Spans are collected against the unmodified input and applied from the
/// highest offset down, so a length change never shifts a span that is
/// still pending. Returns the new buffer and the number of replacements.
pub fn replace_all(
    data: &[u8],
    needle: &[u8],
    replacement: &[u8],
    case_sensitive: bool,
) -> (Vec<u8>, usize) {
    let spans = match_spans(data, needle, case_sensitive);
    let mut out = data.to_vec();
    for span in spans.iter().rev() {
        out.splice(span.clone(), replacement.iter().copied());
    }
    (out, spans.len())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
