// `.tbl` conversion table text codec.
//
// Format: one `HH=glyph` line per byte value, hex uppercase on output,
// `#` starts a comment line. Loading is a full overwrite: any byte the text
// does not mention gets its default glyph back. Lines that are not a
// single-byte `HH=glyph` entry (multi-byte keys such as `8000=the`, end
// tokens such as `/FF`) are skipped with a warning.

use thiserror::Error;

use crate::charmap::{self, CharMap, GlyphTable, PLACEHOLDER};

/// Header line written at the top of every saved table.
pub const HEADER: &str = "# Conversion Table File";

/// Errors produced while decoding table files.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    /// The file is not valid UTF-8.
    #[error("line {line}: table text is not valid UTF-8")]
    InvalidUtf8 { line: usize },
}

/// Decode raw table file contents.
pub fn decode_table(bytes: &[u8]) -> Result<GlyphTable, TableError> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Ok(parse_table(text)),
        Err(e) => {
            let valid = &bytes[..e.valid_up_to()];
            let line = valid.iter().filter(|&&b| b == b'\n').count() + 1;
            Err(TableError::InvalidUtf8 { line })
        }
    }
}

/// Parse table text into a full glyph table.
///
/// An empty glyph maps to the placeholder; a glyph that is only whitespace
/// keeps its first character so that `20= ` round-trips.
pub fn parse_table(text: &str) -> GlyphTable {
    let mut table = charmap::default_table();

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim_start().trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            log::warn!("table line {line_no}: no '=' separator, skipped");
            continue;
        };
        let key = key.trim();
        let Ok(byte) = u8::from_str_radix(key, 16) else {
            log::warn!("table line {line_no}: '{key}' is not a single byte value, skipped");
            continue;
        };

        let glyph = value
            .trim()
            .chars()
            .next()
            .or_else(|| value.chars().find(|&c| c != '\r'))
            .unwrap_or(PLACEHOLDER);
        table[byte as usize] = Some(glyph);
    }

    table
}

/// Format a char map as table text.
pub fn format_table(map: &CharMap) -> String {
    let mut out = String::with_capacity(HEADER.len() + 1 + 256 * 5);
    out.push_str(HEADER);
    out.push('\n');
    for byte in 0..=255u8 {
        let glyph = map.glyph(byte).map(String::from).unwrap_or_default();
        out.push_str(&format!("{byte:02X}={glyph}\n"));
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
