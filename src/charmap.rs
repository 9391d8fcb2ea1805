// Byte-value to display-glyph table.
//
// The table is consulted in both directions:
//   - byte -> glyph for the character column and clipboard text
//   - glyph -> byte for character entry, search needles and paste decoding
//
// Reverse lookups scan byte values 0..=255 in order, so when the same glyph
// sits in several slots the lowest byte wins.

use std::fmt;

/// Number of slots in the table (one per byte value).
pub const TABLE_SIZE: usize = 256;

/// Glyph shown for unmapped or non-printable bytes.
pub const PLACEHOLDER: char = '.';

/// A single slot: zero or one display character.
pub type Glyph = Option<char>;

/// Raw table contents exchanged with the table persistence collaborator.
pub type GlyphTable = [Glyph; TABLE_SIZE];

/// Default glyph for `byte`: the literal character for printable ASCII,
/// the placeholder otherwise.
pub fn default_glyph(byte: u8) -> char {
    if (0x20..=0x7E).contains(&byte) {
        byte as char
    } else {
        PLACEHOLDER
    }
}

/// Table with the default glyph in every slot.
pub fn default_table() -> GlyphTable {
    std::array::from_fn(|i| Some(default_glyph(i as u8)))
}

// ---------------------------------------------------------------------------
// Alphabet series
// ---------------------------------------------------------------------------

/// Predefined alphabets that can be written into consecutive table slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlphabetSeries {
    /// `A`..=`Z`.
    LatinUpper,
    /// `a`..=`z`.
    LatinLower,
    /// 50 code points starting at U+3042.
    Hiragana,
    /// 50 code points starting at U+30A2.
    Katakana,
    /// Cyrillic capitals U+0410..=U+042F.
    Cyrillic,
}

impl AlphabetSeries {
    /// The characters of the series, in slot order.
    pub fn chars(self) -> Vec<char> {
        let (start, count) = match self {
            Self::LatinUpper => ('A' as u32, 26),
            Self::LatinLower => ('a' as u32, 26),
            Self::Hiragana => (0x3042, 50),
            Self::Katakana => (0x30A2, 50),
            Self::Cyrillic => (0x0410, 0x042F - 0x0410 + 1),
        };
        (start..start + count).filter_map(char::from_u32).collect()
    }
}

// ---------------------------------------------------------------------------
// CharMap
// ---------------------------------------------------------------------------

/// The 256-slot glyph table.
#[derive(Clone, PartialEq, Eq)]
pub struct CharMap {
    glyphs: GlyphTable,
}

impl Default for CharMap {
    fn default() -> Self {
        Self {
            glyphs: default_table(),
        }
    }
}

impl fmt::Debug for CharMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let customized = (0..TABLE_SIZE)
            .filter(|&i| self.glyphs[i] != Some(default_glyph(i as u8)))
            .count();
        f.debug_struct("CharMap")
            .field("customized_slots", &customized)
            .finish()
    }
}

impl CharMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map from raw table contents.
    pub fn from_table(glyphs: GlyphTable) -> Self {
        Self { glyphs }
    }

    /// Glyph for `byte`, if the slot is non-empty.
    pub fn glyph(&self, byte: u8) -> Glyph {
        self.glyphs[byte as usize]
    }

    /// Glyph for `byte`, substituting a space for an empty slot.
    pub fn display(&self, byte: u8) -> char {
        self.glyphs[byte as usize].unwrap_or(' ')
    }

    /// First byte value whose glyph is `c`.
    pub fn byte_for(&self, c: char) -> Option<u8> {
        self.glyphs
            .iter()
            .position(|g| *g == Some(c))
            .map(|i| i as u8)
    }

    /// Decode `text` through the table, failing on the first unmapped char.
    pub fn encode_strict(&self, text: &str) -> Result<Vec<u8>, char> {
        text.chars()
            .map(|c| self.byte_for(c).ok_or(c))
            .collect()
    }

    /// Decode `text` through the table; unmapped characters become 0x00.
    pub fn encode_lossy(&self, text: &str) -> Vec<u8> {
        text.chars()
            .map(|c| self.byte_for(c).unwrap_or(0))
            .collect()
    }

    /// Render `bytes` as a string of glyphs.
    pub fn render(&self, bytes: &[u8]) -> String {
        bytes.iter().map(|&b| self.display(b)).collect()
    }

    /// Set a single slot from user text: the first character, or the
    /// placeholder when `text` is empty.
    pub fn set_glyph(&mut self, byte: u8, text: &str) {
        self.glyphs[byte as usize] = Some(text.chars().next().unwrap_or(PLACEHOLDER));
    }

    /// Replace the whole table.
    pub fn apply(&mut self, glyphs: GlyphTable) {
        self.glyphs = glyphs;
    }

    /// Copy of the whole table.
    pub fn export(&self) -> GlyphTable {
        self.glyphs
    }

    /// Every slot becomes the placeholder.
    pub fn clear(&mut self) {
        self.glyphs = [Some(PLACEHOLDER); TABLE_SIZE];
    }

    /// Restore the printable-ASCII-or-placeholder defaults.
    pub fn reset_default(&mut self) {
        self.glyphs = default_table();
    }

    /// Write `series` into consecutive slots starting at `start`.
    ///
    /// Entries that would land past 0xFF are dropped. Returns the number of
    /// slots written.
    pub fn insert_series(&mut self, start: u8, series: AlphabetSeries) -> usize {
        let mut written = 0;
        for (slot, c) in (start as usize..TABLE_SIZE).zip(series.chars()) {
            self.glyphs[slot] = Some(c);
            written += 1;
        }
        written
    }

    /// Apply a recovered character -> byte assignment.
    ///
    /// Every byte slot named by the assignment is reset to the placeholder
    /// first, then each pair is written.
    pub fn apply_assignments<I>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (char, u8)> + Clone,
    {
        for (_, byte) in pairs.clone() {
            self.glyphs[byte as usize] = Some(PLACEHOLDER);
        }
        for (c, byte) in pairs {
            self.glyphs[byte as usize] = Some(c);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
