// Byte buffer with a nibble-addressed cursor and a selection.
//
// Positions are nibble indices (byte index * 2). The cursor and both
// selection bounds are always even; the "high nibble typed, low nibble
// pending" state of hex entry lives in a separate flag instead of in the
// cursor parity.
//
// Every mutation queues an `EditorEvent` for the view; callers drain them
// with `take_events()`.

pub mod clipboard;

use std::ops::Range;

use crate::charmap::CharMap;
use crate::history::Snapshot;

pub use clipboard::ClipboardPayload;

/// Default number of bytes per view row.
pub const DEFAULT_BYTES_PER_LINE: usize = 16;

// ---------------------------------------------------------------------------
// Modes, motions, events
// ---------------------------------------------------------------------------

/// How single keystrokes are interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EditMode {
    /// Hex digits edit nibbles.
    #[default]
    HexEntry,
    /// Characters resolve through the char map and overwrite whole bytes.
    CharEntry,
}

/// Cursor motions driven by navigation keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Left,
    Right,
    Up,
    Down,
    /// Start of the buffer.
    Home,
    /// End of the buffer (one past the last byte).
    End,
}

/// Notifications for the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorEvent {
    /// Buffer contents changed.
    DataChanged,
    /// Cursor moved; carries the new nibble position for auto-scroll.
    PositionChanged(usize),
    /// Selection, mode or glyphs changed; repaint without scrolling.
    Redraw,
}

// ---------------------------------------------------------------------------
// Editor
// ---------------------------------------------------------------------------

/// The document bytes plus cursor/selection state.
#[derive(Debug, Clone, Default)]
pub struct Editor {
    data: Vec<u8>,
    cursor: usize,
    selection: Option<(usize, usize)>,
    anchor: Option<usize>,
    mode: EditMode,
    pending_nibble: bool,
    bytes_per_line: usize,
    events: Vec<EditorEvent>,
}

impl Editor {
    pub fn new(bytes_per_line: usize) -> Self {
        Self {
            bytes_per_line: bytes_per_line.max(1),
            ..Self::default()
        }
    }

    /// Editor over `data` with the default row width.
    pub fn with_data(data: Vec<u8>) -> Self {
        let mut editor = Self::new(DEFAULT_BYTES_PER_LINE);
        editor.data = data;
        editor
    }

    // -- accessors ----------------------------------------------------------

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Cursor as a nibble index.
    pub fn cursor_position(&self) -> usize {
        self.cursor
    }

    /// Cursor as a byte index.
    pub fn cursor_byte(&self) -> usize {
        self.cursor / 2
    }

    /// Selection bounds in nibble units, `start < end`.
    pub fn selection(&self) -> Option<(usize, usize)> {
        self.selection
    }

    pub fn selection_start(&self) -> Option<usize> {
        self.selection.map(|(s, _)| s)
    }

    pub fn selection_end(&self) -> Option<usize> {
        self.selection.map(|(_, e)| e)
    }

    /// Selection as a byte range.
    pub fn selected_bytes(&self) -> Option<Range<usize>> {
        self.selection.map(|(s, e)| s / 2..e / 2)
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    /// True after the high nibble of a hex pair was typed.
    pub fn pending_nibble(&self) -> bool {
        self.pending_nibble
    }

    pub fn bytes_per_line(&self) -> usize {
        self.bytes_per_line
    }

    /// Drain queued view notifications.
    pub fn take_events(&mut self) -> Vec<EditorEvent> {
        std::mem::take(&mut self.events)
    }

    // -- whole-buffer replacement -------------------------------------------

    /// Replace the buffer; cursor goes to 0 and selection is cleared.
    pub fn set_data(&mut self, data: Vec<u8>) {
        self.data = data;
        self.pending_nibble = false;
        self.anchor = None;
        self.selection = None;
        self.set_cursor(0);
        self.events.push(EditorEvent::DataChanged);
        self.events.push(EditorEvent::Redraw);
    }

    /// Capture buffer, cursor and selection.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            data: self.data.clone(),
            cursor: self.cursor,
            selection: self.selection,
        }
    }

    /// Restore a captured state.
    pub fn restore(&mut self, snapshot: &Snapshot) {
        self.data = snapshot.data.clone();
        self.pending_nibble = false;
        self.anchor = None;
        self.cursor = self.normalize(snapshot.cursor as isize);
        self.events.push(EditorEvent::PositionChanged(self.cursor));
        match snapshot.selection {
            Some((s, e)) => self.set_selection(s as isize, e as isize),
            None => self.clear_selection(),
        }
        self.events.push(EditorEvent::DataChanged);
    }

    // -- cursor and selection -----------------------------------------------

    fn max_position(&self) -> isize {
        (self.data.len() * 2) as isize
    }

    fn normalize(&self, pos: isize) -> usize {
        let clamped = pos.clamp(0, self.max_position()) as usize;
        (clamped / 2) * 2
    }

    /// Move the cursor. Clamped to `[0, 2*len]` and rounded down to a byte
    /// boundary. Returns false when the normalized position is unchanged.
    pub fn set_cursor(&mut self, pos: isize) -> bool {
        let pos = self.normalize(pos);
        if pos == self.cursor {
            return false;
        }
        self.cursor = pos;
        self.pending_nibble = false;
        self.events.push(EditorEvent::PositionChanged(pos));
        true
    }

    /// Set the selection from two nibble positions in any order.
    /// Coinciding bounds clear the selection.
    pub fn set_selection(&mut self, start: isize, end: isize) {
        let mut a = self.normalize(start);
        let mut b = self.normalize(end);
        if a > b {
            std::mem::swap(&mut a, &mut b);
        }
        let next = (a != b).then_some((a, b));
        if next != self.selection {
            self.selection = next;
            self.events.push(EditorEvent::Redraw);
        }
    }

    pub fn clear_selection(&mut self) {
        self.anchor = None;
        if self.selection.take().is_some() {
            self.events.push(EditorEvent::Redraw);
        }
    }

    /// Move the cursor to `pos`, extending the selection from the anchor.
    /// The anchor is set from the current cursor when no gesture is active.
    pub fn extend_to(&mut self, pos: isize) {
        let anchor = *self.anchor.get_or_insert(self.cursor);
        self.set_cursor(pos);
        self.set_selection(anchor as isize, self.cursor as isize);
    }

    /// Cursor to a byte offset, selection cleared.
    pub fn go_to_offset(&mut self, byte: usize) {
        self.clear_selection();
        self.set_cursor(byte.saturating_mul(2).min(isize::MAX as usize) as isize);
    }

    /// Cursor to `start` and selection over `len` bytes from there.
    pub fn select_span(&mut self, start: usize, len: usize) {
        self.anchor = None;
        self.set_cursor((start * 2) as isize);
        self.set_selection((start * 2) as isize, ((start + len) * 2) as isize);
    }

    /// Apply a navigation key. Without `extend` the selection is dropped.
    pub fn move_cursor(&mut self, motion: Motion, extend: bool) {
        let cur = self.cursor as isize;
        let row = (self.bytes_per_line * 2) as isize;
        let target = match motion {
            Motion::Left => cur - 2,
            Motion::Right => cur + 2,
            Motion::Up => cur - row,
            Motion::Down => cur + row,
            Motion::Home => 0,
            Motion::End => self.max_position(),
        };
        if extend {
            self.extend_to(target);
        } else {
            self.clear_selection();
            self.set_cursor(target);
        }
    }

    pub fn set_mode(&mut self, mode: EditMode) {
        if self.mode != mode {
            self.mode = mode;
            self.pending_nibble = false;
            self.events.push(EditorEvent::Redraw);
        }
    }

    // -- editing --------------------------------------------------------------

    /// Handle a typed character. Returns true when the buffer changed.
    ///
    /// Hex entry writes the high nibble first and waits for the low one
    /// before advancing. Character entry resolves `c` through `map` and
    /// overwrites the whole byte. Input at end of buffer is ignored.
    pub fn input_char(&mut self, c: char, map: &CharMap) -> bool {
        let idx = self.cursor_byte();
        if idx >= self.data.len() {
            return false;
        }

        match self.mode {
            EditMode::HexEntry => {
                let Some(nibble) = c.to_digit(16).map(|d| d as u8) else {
                    return false;
                };
                let byte = &mut self.data[idx];
                if self.pending_nibble {
                    *byte = (*byte & 0xF0) | nibble;
                    self.pending_nibble = false;
                    self.events.push(EditorEvent::DataChanged);
                    self.set_cursor(self.cursor as isize + 2);
                } else {
                    *byte = (*byte & 0x0F) | (nibble << 4);
                    self.pending_nibble = true;
                    self.events.push(EditorEvent::DataChanged);
                }
                true
            }
            EditMode::CharEntry => {
                let Some(value) = map.byte_for(c) else {
                    return false;
                };
                self.data[idx] = value;
                self.events.push(EditorEvent::DataChanged);
                self.set_cursor(self.cursor as isize + 2);
                true
            }
        }
    }

    /// Backspace: step back one byte and zero it.
    pub fn backspace(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.set_cursor(self.cursor as isize - 2);
        let idx = self.cursor_byte();
        self.data[idx] = 0x00;
        self.events.push(EditorEvent::DataChanged);
        true
    }

    /// Delete: zero the byte under the cursor and step forward.
    pub fn delete(&mut self) -> bool {
        let idx = self.cursor_byte();
        if idx >= self.data.len() {
            return false;
        }
        self.data[idx] = 0x00;
        self.events.push(EditorEvent::DataChanged);
        self.set_cursor(self.cursor as isize + 2);
        true
    }

    /// Copy the selected bytes.
    pub fn copy(&self) -> Option<ClipboardPayload> {
        let range = self.selected_bytes()?;
        Some(ClipboardPayload::from_bytes(&self.data[range]))
    }

    /// Overwrite from the selection start (or cursor) with the resolved
    /// payload. Never grows the buffer: the payload is truncated to the
    /// bytes remaining. Returns the number of bytes written.
    pub fn paste(&mut self, payload: &ClipboardPayload, map: &CharMap) -> usize {
        let bytes = payload.resolve(map);
        let pos = self
            .selected_bytes()
            .map_or(self.cursor_byte(), |r| r.start);
        let n = bytes.len().min(self.data.len().saturating_sub(pos));
        if n == 0 {
            return 0;
        }

        self.data[pos..pos + n].copy_from_slice(&bytes[..n]);
        self.clear_selection();
        self.events.push(EditorEvent::DataChanged);
        self.set_cursor(((pos + n) * 2) as isize);
        n
    }

    /// Splice `replacement` over `range`; the buffer may grow or shrink.
    /// The cursor lands just past the replacement and the selection is
    /// cleared.
    pub fn replace_range(&mut self, range: Range<usize>, replacement: &[u8]) {
        let start = range.start;
        self.data.splice(range, replacement.iter().copied());
        self.clear_selection();
        self.pending_nibble = false;
        self.events.push(EditorEvent::DataChanged);
        self.cursor = self.normalize(self.cursor as isize);
        self.set_cursor(((start + replacement.len()) * 2) as isize);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn editor(bytes: &[u8]) -> Editor {
        Editor::with_data(bytes.to_vec())
    }

    #[test]
    fn cursor_is_clamped_and_even() {
        let mut e = editor(&[0; 4]);
        assert!(e.set_cursor(5));
        assert_eq!(e.cursor_position(), 4);
        e.set_cursor(-7);
        assert_eq!(e.cursor_position(), 0);
        e.set_cursor(1_000);
        assert_eq!(e.cursor_position(), 8);
    }

    #[test]
    fn unchanged_cursor_is_a_noop() {
        let mut e = editor(&[0; 4]);
        e.set_cursor(2);
        e.take_events();
        assert!(!e.set_cursor(3));
        assert!(e.take_events().is_empty());
    }

    #[test]
    fn cursor_move_reports_position() {
        let mut e = editor(&[0; 4]);
        e.set_cursor(6);
        assert_eq!(e.take_events(), vec![EditorEvent::PositionChanged(6)]);
    }

    #[test]
    fn selection_is_normalized() {
        let mut e = editor(&[0; 8]);
        e.set_selection(9, 3);
        assert_eq!(e.selection(), Some((2, 8)));
        e.set_selection(-5, 100);
        assert_eq!(e.selection(), Some((0, 16)));
        e.set_selection(4, 5);
        assert_eq!(e.selection(), None);
    }

    #[test]
    fn hex_entry_writes_high_then_low_nibble() {
        let map = CharMap::new();
        let mut e = editor(&[0x00, 0x00]);
        assert!(e.input_char('a', &map));
        assert_eq!(e.data(), &[0xA0, 0x00]);
        assert!(e.pending_nibble());
        assert_eq!(e.cursor_position(), 0);

        assert!(e.input_char('5', &map));
        assert_eq!(e.data(), &[0xA5, 0x00]);
        assert!(!e.pending_nibble());
        assert_eq!(e.cursor_position(), 2);
    }

    #[test]
    fn hex_entry_ignores_non_hex() {
        let map = CharMap::new();
        let mut e = editor(&[0x12]);
        assert!(!e.input_char('z', &map));
        assert_eq!(e.data(), &[0x12]);
    }

    #[test]
    fn moving_clears_pending_nibble() {
        let map = CharMap::new();
        let mut e = editor(&[0x00, 0x00]);
        e.input_char('f', &map);
        e.move_cursor(Motion::Right, false);
        assert!(!e.pending_nibble());
        e.input_char('1', &map);
        assert_eq!(e.data(), &[0xF0, 0x10]);
    }

    #[test]
    fn char_entry_uses_char_map() {
        let mut map = CharMap::new();
        map.set_glyph(0x80, "あ");
        let mut e = editor(&[0x00, 0x00, 0x00]);
        e.set_mode(EditMode::CharEntry);
        assert!(e.input_char('あ', &map));
        assert!(e.input_char('A', &map));
        assert!(!e.input_char('い', &map));
        assert_eq!(e.data(), &[0x80, 0x41, 0x00]);
        assert_eq!(e.cursor_position(), 4);
    }

    #[test]
    fn input_at_end_is_ignored() {
        let map = CharMap::new();
        let mut e = editor(&[0x00]);
        e.set_cursor(2);
        assert!(!e.input_char('1', &map));
    }

    #[test]
    fn backspace_and_delete_zero_whole_bytes() {
        let mut e = editor(&[0x11, 0x22, 0x33]);
        e.set_cursor(4);
        assert!(e.backspace());
        assert_eq!(e.data(), &[0x11, 0x00, 0x33]);
        assert_eq!(e.cursor_position(), 2);

        e.set_cursor(0);
        assert!(e.delete());
        assert_eq!(e.data(), &[0x00, 0x00, 0x33]);
        assert_eq!(e.cursor_position(), 2);

        e.set_cursor(0);
        assert!(!e.backspace());
        e.set_cursor(6);
        assert!(!e.delete());
    }

    #[test]
    fn shift_extend_uses_anchor() {
        let mut e = editor(&[0; 40]);
        e.set_cursor(4);
        e.move_cursor(Motion::Right, true);
        e.move_cursor(Motion::Right, true);
        assert_eq!(e.selection(), Some((4, 8)));
        e.move_cursor(Motion::Left, true);
        e.move_cursor(Motion::Left, true);
        e.move_cursor(Motion::Left, true);
        assert_eq!(e.selection(), Some((2, 4)));
        e.move_cursor(Motion::Down, false);
        assert_eq!(e.selection(), None);
        assert_eq!(e.cursor_position(), 2 + 32);
    }

    #[test]
    fn copy_selection() {
        let mut e = editor(&[0xDE, 0xAD, 0xBE, 0xEF]);
        assert!(e.copy().is_none());
        e.set_selection(2, 6);
        let payload = e.copy().unwrap();
        assert_eq!(payload.raw.as_deref(), Some(&[0xAD, 0xBE][..]));
        assert_eq!(payload.text, "AD BE");
    }

    #[test]
    fn paste_truncates_and_never_grows() {
        let map = CharMap::new();
        let mut e = editor(&[0; 4]);
        e.set_cursor(4);
        let n = e.paste(&ClipboardPayload::from_bytes(&[1, 2, 3, 4, 5]), &map);
        assert_eq!(n, 2);
        assert_eq!(e.data(), &[0, 0, 1, 2]);
        assert_eq!(e.len(), 4);
        assert_eq!(e.cursor_position(), 8);
    }

    #[test]
    fn paste_starts_at_selection_and_clears_it() {
        let map = CharMap::new();
        let mut e = editor(&[0; 4]);
        e.set_cursor(6);
        e.set_selection(2, 4);
        e.paste(&ClipboardPayload::from_text("AB"), &map);
        assert_eq!(e.data(), &[0, 0x41, 0x42, 0]);
        assert_eq!(e.selection(), None);
    }

    #[test]
    fn replace_range_resizes() {
        let mut e = editor(b"hello world");
        e.replace_range(0..5, b"hi");
        assert_eq!(e.data(), b"hi world");
        assert_eq!(e.cursor_position(), 4);
    }

    #[test]
    fn snapshot_restore() {
        let mut e = editor(&[1, 2, 3]);
        e.set_cursor(2);
        e.set_selection(2, 6);
        let snap = e.snapshot();
        e.set_data(vec![9]);
        e.restore(&snap);
        assert_eq!(e.data(), &[1, 2, 3]);
        assert_eq!(e.cursor_position(), 2);
        assert_eq!(e.selection(), Some((2, 6)));
    }

    #[test]
    fn set_data_resets_position() {
        let mut e = editor(&[1, 2, 3]);
        e.set_cursor(4);
        e.set_selection(0, 2);
        e.set_data(vec![7; 10]);
        assert_eq!(e.cursor_position(), 0);
        assert_eq!(e.selection(), None);
        assert!(e.take_events().contains(&EditorEvent::DataChanged));
    }
}
