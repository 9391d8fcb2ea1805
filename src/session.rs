// Editing session: the single owner of buffer, history, char map and the
// guess worker.
//
// The view and the find/replace and guess dialogs talk only to `Session`.
// Every operation either commits fully (buffer change + one undo snapshot)
// or leaves all state untouched. View notifications are queued and drained
// with `take_notifications()`.

use std::ops::Range;

use crate::charmap::{AlphabetSeries, CharMap, GlyphTable};
use crate::editor::{ClipboardPayload, EditMode, Editor, EditorEvent, Motion};
use crate::guess::{CandidateMapping, GuessError, GuessRequest, GuessWorker};
use crate::history::{History, MAX_UNDO_STATES};
use crate::search::{
    self, FindOptions, Match, Needle, ReplaceOutcome, SearchError, SearchKind, SearchPosition,
    exact, relative,
};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Session-wide settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorConfig {
    /// Bytes per view row; vertical motions move by one row.
    pub bytes_per_line: usize,
    /// Maximum number of edits that can be undone.
    pub history_limit: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            bytes_per_line: crate::editor::DEFAULT_BYTES_PER_LINE,
            history_limit: MAX_UNDO_STATES,
        }
    }
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// Buffer contents changed.
    DataChanged,
    /// Cursor moved (nibble position).
    PositionChanged(usize),
    /// Repaint without scrolling.
    Redraw,
    /// A guess scan finished.
    GuessResultsReady(Vec<CandidateMapping>),
}

impl From<EditorEvent> for Notification {
    fn from(event: EditorEvent) -> Self {
        match event {
            EditorEvent::DataChanged => Self::DataChanged,
            EditorEvent::PositionChanged(pos) => Self::PositionChanged(pos),
            EditorEvent::Redraw => Self::Redraw,
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct Session {
    config: EditorConfig,
    editor: Editor,
    history: History,
    char_map: CharMap,
    worker: GuessWorker,
    modified: bool,
    notifications: Vec<Notification>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl Session {
    pub fn new(config: EditorConfig) -> Self {
        let editor = Editor::new(config.bytes_per_line);
        let mut history = History::new(config.history_limit);
        history.reset(editor.snapshot());
        Self {
            config,
            editor,
            history,
            char_map: CharMap::new(),
            worker: GuessWorker::new(),
            modified: false,
            notifications: Vec::new(),
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    fn flush_events(&mut self) {
        self.notifications
            .extend(self.editor.take_events().into_iter().map(Notification::from));
    }

    /// Record the current editor state as an undo step.
    fn commit(&mut self) {
        if self.history.push(self.editor.snapshot()) {
            self.modified = true;
        }
        self.flush_events();
    }

    /// Drain queued view notifications.
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        self.flush_events();
        std::mem::take(&mut self.notifications)
    }

    // -- document -------------------------------------------------------------

    /// Replace the document (file load). History is reseeded.
    pub fn set_buffer(&mut self, data: Vec<u8>) {
        log::debug!("loading {} byte document", data.len());
        self.editor.set_data(data);
        self.history.reset(self.editor.snapshot());
        self.modified = false;
        self.flush_events();
    }

    pub fn buffer(&self) -> &[u8] {
        self.editor.data()
    }

    /// Same bytes as `buffer`, as seen by the view.
    pub fn hex_data(&self) -> &[u8] {
        self.editor.data()
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// The document was written out.
    pub fn mark_saved(&mut self) {
        self.modified = false;
    }

    // -- cursor and selection ---------------------------------------------------

    pub fn cursor_position(&self) -> usize {
        self.editor.cursor_position()
    }

    pub fn selection_start(&self) -> Option<usize> {
        self.editor.selection_start()
    }

    pub fn selection_end(&self) -> Option<usize> {
        self.editor.selection_end()
    }

    pub fn set_cursor(&mut self, nibble_pos: isize) -> bool {
        let moved = self.editor.set_cursor(nibble_pos);
        self.flush_events();
        moved
    }

    pub fn set_selection(&mut self, start: isize, end: isize) {
        self.editor.set_selection(start, end);
        self.flush_events();
    }

    pub fn clear_selection(&mut self) {
        self.editor.clear_selection();
        self.flush_events();
    }

    pub fn move_cursor(&mut self, motion: Motion, extend: bool) {
        self.editor.move_cursor(motion, extend);
        self.flush_events();
    }

    pub fn go_to_offset(&mut self, byte: usize) {
        self.editor.go_to_offset(byte);
        self.flush_events();
    }

    pub fn edit_mode(&self) -> EditMode {
        self.editor.mode()
    }

    pub fn set_edit_mode(&mut self, mode: EditMode) {
        self.editor.set_mode(mode);
        self.flush_events();
    }

    // -- editing ----------------------------------------------------------------

    pub fn input_char(&mut self, c: char) -> bool {
        let changed = self.editor.input_char(c, &self.char_map);
        if changed {
            self.commit();
        }
        changed
    }

    pub fn backspace(&mut self) -> bool {
        let changed = self.editor.backspace();
        if changed {
            self.commit();
        }
        changed
    }

    pub fn delete(&mut self) -> bool {
        let changed = self.editor.delete();
        if changed {
            self.commit();
        }
        changed
    }

    pub fn copy(&self) -> Option<ClipboardPayload> {
        self.editor.copy()
    }

    /// Returns the number of bytes overwritten.
    pub fn paste(&mut self, payload: &ClipboardPayload) -> usize {
        let written = self.editor.paste(payload, &self.char_map);
        if written > 0 {
            self.commit();
        }
        written
    }

    // -- history ----------------------------------------------------------------

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.history.undo() else {
            return false;
        };
        self.editor.restore(snapshot);
        self.modified = true;
        self.flush_events();
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(snapshot) = self.history.redo() else {
            return false;
        };
        self.editor.restore(snapshot);
        self.modified = true;
        self.flush_events();
        true
    }

    // -- search and replace -----------------------------------------------------

    fn search_position(&self) -> SearchPosition {
        SearchPosition {
            cursor: self.editor.cursor_byte(),
            selection: self.editor.selected_bytes(),
        }
    }

    /// Find the next match and select it. `Ok(None)` leaves state unchanged.
    ///
    /// The start point follows the cursor rules, so a match sitting exactly
    /// under an unselected cursor is skipped; see `find_first` for a search
    /// over the whole buffer.
    pub fn find(
        &mut self,
        text: &str,
        kind: SearchKind,
        opts: FindOptions,
    ) -> Result<Option<Match>, SearchError> {
        let needle = search::resolve_needle(text, kind, &self.char_map)?;
        let data = self.editor.data();
        let found = match &needle {
            Needle::Bytes(bytes) => exact::find_next(data, bytes, &self.search_position(), &opts),
            Needle::Relative(pattern) => relative::find_next(
                data,
                pattern,
                self.editor.cursor_byte(),
                opts.wrap,
                opts.backwards,
            )?,
        };
        self.select_found(text, found);
        Ok(found)
    }

    /// Find the first match in the buffer (the last one when searching
    /// backwards), ignoring the cursor, and select it.
    pub fn find_first(
        &mut self,
        text: &str,
        kind: SearchKind,
        opts: FindOptions,
    ) -> Result<Option<Match>, SearchError> {
        let needle = search::resolve_needle(text, kind, &self.char_map)?;
        let data = self.editor.data();
        let found = match &needle {
            Needle::Bytes(bytes) if opts.backwards => exact::find_backward(
                data,
                bytes,
                data.len() as isize - 1,
                opts.case_sensitive,
                false,
            ),
            Needle::Bytes(bytes) => exact::find_forward(data, bytes, 0, opts.case_sensitive, false),
            Needle::Relative(_) if opts.backwards => {
                return Err(SearchError::UnsupportedDirection);
            }
            Needle::Relative(pattern) => relative::find_from(data, pattern, 0, false)?,
        };
        self.select_found(text, found);
        Ok(found)
    }

    fn select_found(&mut self, text: &str, found: Option<Match>) {
        match found {
            Some(m) => {
                self.editor.select_span(m.start, m.len);
                self.flush_events();
            }
            None => log::debug!("find: no match for {text:?}"),
        }
    }

    /// Replace the match at the selection start (or cursor), then select the
    /// next match forward with wrap-around.
    pub fn replace_one(
        &mut self,
        text: &str,
        replacement: &str,
        kind: SearchKind,
        opts: FindOptions,
    ) -> Result<ReplaceOutcome, SearchError> {
        let replacement = search::resolve_replacement(replacement, kind, &self.char_map)?;
        let Needle::Bytes(needle) = search::resolve_needle(text, kind, &self.char_map)? else {
            return Err(SearchError::ReplaceUnsupported);
        };

        let pos = self
            .editor
            .selected_bytes()
            .map_or(self.editor.cursor_byte(), |r| r.start);
        let replaced = exact::matches_at(self.editor.data(), &needle, pos, opts.case_sensitive);
        if replaced {
            self.editor
                .replace_range(pos..pos + needle.len(), &replacement);
            self.commit();
        }

        let next_opts = FindOptions {
            wrap: true,
            backwards: false,
            ..opts
        };
        let next = exact::find_next(
            self.editor.data(),
            &needle,
            &self.search_position(),
            &next_opts,
        );
        if let Some(m) = next {
            self.editor.select_span(m.start, m.len);
        }
        self.flush_events();
        Ok(ReplaceOutcome { replaced, next })
    }

    /// Replace every occurrence. Returns the number replaced; zero leaves
    /// the session untouched.
    pub fn replace_all(
        &mut self,
        text: &str,
        replacement: &str,
        kind: SearchKind,
        case_sensitive: bool,
    ) -> Result<usize, SearchError> {
        let replacement = search::resolve_replacement(replacement, kind, &self.char_map)?;
        let Needle::Bytes(needle) = search::resolve_needle(text, kind, &self.char_map)? else {
            return Err(SearchError::ReplaceUnsupported);
        };

        let (data, count) =
            exact::replace_all(self.editor.data(), &needle, &replacement, case_sensitive);
        if count == 0 {
            log::debug!("replace all: no occurrences of {text:?}");
            return Ok(0);
        }
        self.editor.set_data(data);
        self.commit();
        log::info!("replace all: {count} occurrence(s) replaced");
        Ok(count)
    }

    /// Byte spans of every match, for highlighting.
    pub fn find_all(
        &self,
        text: &str,
        kind: SearchKind,
        case_sensitive: bool,
    ) -> Result<Vec<Range<usize>>, SearchError> {
        match search::resolve_needle(text, kind, &self.char_map)? {
            Needle::Bytes(needle) => Ok(exact::match_spans(
                self.editor.data(),
                &needle,
                case_sensitive,
            )),
            Needle::Relative(pattern) => {
                let data = self.editor.data();
                if data.len() < pattern.len() {
                    return Err(SearchError::PatternLongerThanBuffer {
                        pattern: pattern.len(),
                    });
                }
                Ok((0..=data.len() - pattern.len())
                    .filter(|&i| pattern.matches_at(data, i))
                    .map(|i| i..i + pattern.len())
                    .collect())
            }
        }
    }

    // -- char map ---------------------------------------------------------------

    pub fn char_map(&self) -> &CharMap {
        &self.char_map
    }

    fn char_map_changed(&mut self) {
        self.notifications.push(Notification::Redraw);
    }

    pub fn apply_char_map(&mut self, glyphs: GlyphTable) {
        self.char_map.apply(glyphs);
        self.char_map_changed();
    }

    pub fn export_char_map(&self) -> GlyphTable {
        self.char_map.export()
    }

    pub fn set_glyph(&mut self, byte: u8, text: &str) {
        self.char_map.set_glyph(byte, text);
        self.char_map_changed();
    }

    pub fn clear_char_map(&mut self) {
        self.char_map.clear();
        self.char_map_changed();
    }

    pub fn reset_char_map(&mut self) {
        self.char_map.reset_default();
        self.char_map_changed();
    }

    pub fn insert_series(&mut self, start: u8, series: AlphabetSeries) -> usize {
        let written = self.char_map.insert_series(start, series);
        self.char_map_changed();
        written
    }

    /// Write a guessed mapping into the char map.
    pub fn apply_mapping(&mut self, mapping: &CandidateMapping) {
        self.char_map.apply_assignments(mapping.pairs());
        log::info!("applied mapping: {mapping}");
        self.char_map_changed();
    }

    // -- guesser ----------------------------------------------------------------

    /// Start a background scan over a copy of the buffer.
    pub fn start_guess(&mut self, request: &GuessRequest) -> Result<(), GuessError> {
        self.worker.start(self.editor.data().to_vec(), request)
    }

    pub fn guess_running(&self) -> bool {
        self.worker.is_running()
    }

    /// Check for a finished scan; on completion a `GuessResultsReady`
    /// notification is queued. Returns true when results arrived.
    pub fn poll_guess(&mut self) -> bool {
        match self.worker.poll() {
            Some(results) => {
                self.notifications
                    .push(Notification::GuessResultsReady(results));
                true
            }
            None => false,
        }
    }

    /// Block until the outstanding scan finishes and return its results.
    pub fn wait_guess(&mut self) -> Option<Vec<CandidateMapping>> {
        self.worker.wait()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn session(bytes: &[u8]) -> Session {
        let mut s = Session::default();
        s.set_buffer(bytes.to_vec());
        s.take_notifications();
        s
    }

    #[test]
    fn load_resets_history_and_modified() {
        let mut s = session(&[1, 2, 3]);
        s.input_char('f');
        assert!(s.is_modified());
        s.set_buffer(vec![9, 9]);
        assert!(!s.is_modified());
        assert!(!s.can_undo());
        assert_eq!(s.cursor_position(), 0);
    }

    #[test]
    fn typing_commits_undo_steps() {
        let mut s = session(&[0x00, 0x00]);
        s.input_char('a');
        s.input_char('b');
        assert_eq!(s.buffer(), &[0xAB, 0x00]);
        assert!(s.undo());
        assert_eq!(s.buffer(), &[0xA0, 0x00]);
        assert!(s.undo());
        assert_eq!(s.buffer(), &[0x00, 0x00]);
        assert!(!s.undo());
        assert!(s.redo());
        assert!(s.redo());
        assert_eq!(s.buffer(), &[0xAB, 0x00]);
        assert_eq!(s.cursor_position(), 2);
    }

    #[test]
    fn find_selects_match() {
        let mut s = session(b"..needle..");
        let m = s
            .find("needle", SearchKind::Char, FindOptions::default())
            .unwrap()
            .unwrap();
        assert_eq!(m.start, 2);
        assert_eq!(s.cursor_position(), 4);
        assert_eq!(s.selection_start(), Some(4));
        assert_eq!(s.selection_end(), Some(16));
    }

    #[test]
    fn find_miss_leaves_state() {
        let mut s = session(b"abc");
        s.set_cursor(2);
        s.take_notifications();
        assert_eq!(s.find("FF", SearchKind::Hex, FindOptions::default()), Ok(None));
        assert_eq!(s.cursor_position(), 2);
        assert!(s.take_notifications().is_empty());
    }

    #[test]
    fn find_skips_match_under_cursor() {
        let mut s = session(b"needle....");
        assert_eq!(
            s.find("needle", SearchKind::Char, FindOptions::default()),
            Ok(None)
        );
    }

    #[test]
    fn find_first_covers_offset_zero() {
        let mut s = session(b"needle....");
        let m = s
            .find_first("needle", SearchKind::Char, FindOptions::default())
            .unwrap();
        assert_eq!(m, Some(Match { start: 0, len: 6 }));
        assert_eq!(s.selection_start(), Some(0));
        assert_eq!(s.selection_end(), Some(12));
        // Searching on from the selected match finds nothing further.
        assert_eq!(
            s.find("needle", SearchKind::Char, FindOptions::default()),
            Ok(None)
        );
    }

    #[test]
    fn find_first_backwards_takes_last_match() {
        let mut s = session(b"ab..ab..");
        let back = FindOptions {
            backwards: true,
            ..FindOptions::default()
        };
        let m = s.find_first("ab", SearchKind::Char, back).unwrap();
        assert_eq!(m, Some(Match { start: 4, len: 2 }));
        assert_eq!(
            s.find_first("ABA", SearchKind::Relative, back),
            Err(SearchError::UnsupportedDirection)
        );
    }

    #[test]
    fn invalid_needle_is_reported() {
        let mut s = session(b"abc");
        assert_eq!(
            s.find("ABC", SearchKind::Hex, FindOptions::default()),
            Err(SearchError::OddHexLength)
        );
    }

    #[test]
    fn relative_find_and_backward_error() {
        let mut s = session(&[0x00, 0x10, 0x13, 0x10]);
        let m = s
            .find("ADA", SearchKind::Relative, FindOptions::default())
            .unwrap();
        assert_eq!(m, Some(Match { start: 1, len: 3 }));
        let back = FindOptions {
            backwards: true,
            ..FindOptions::default()
        };
        assert_eq!(
            s.find("ADA", SearchKind::Relative, back),
            Err(SearchError::UnsupportedDirection)
        );
    }

    #[test]
    fn replace_one_then_selects_next() {
        let mut s = session(b"cat cat");
        s.find("cat", SearchKind::Char, FindOptions::default())
            .unwrap();
        // The cursor sat on the first "cat", so find-next moved to the second.
        assert_eq!(s.selection_start(), Some(8));
        let out = s
            .replace_one("cat", "dog", SearchKind::Char, FindOptions::default())
            .unwrap();
        assert!(out.replaced);
        assert_eq!(s.buffer(), b"cat dog");
        assert_eq!(out.next, Some(Match { start: 0, len: 3 }));
        assert!(s.can_undo());
    }

    #[test]
    fn replace_all_is_one_undo_step() {
        let mut s = session(b"AbcAbc");
        let n = s
            .replace_all("abc", "X", SearchKind::Char, false)
            .unwrap();
        assert_eq!(n, 2);
        assert_eq!(s.buffer(), b"XX");
        assert_eq!(s.cursor_position(), 0);
        assert!(s.undo());
        assert_eq!(s.buffer(), b"AbcAbc");
    }

    #[test]
    fn replace_all_without_matches_is_a_noop() {
        let mut s = session(b"abc");
        s.set_cursor(4);
        assert_eq!(s.replace_all("zz", "y", SearchKind::Char, true), Ok(0));
        assert_eq!(s.cursor_position(), 4);
        assert!(!s.can_undo());
        assert!(!s.is_modified());
    }

    #[test]
    fn relative_replace_is_rejected() {
        let mut s = session(b"abc");
        assert_eq!(
            s.replace_all("ADA", "x", SearchKind::Relative, true),
            Err(SearchError::ReplaceUnsupported)
        );
    }

    #[test]
    fn paste_commits() {
        let mut s = session(&[0; 4]);
        assert_eq!(s.paste(&ClipboardPayload::from_bytes(&[1, 2])), 2);
        assert_eq!(s.buffer(), &[1, 2, 0, 0]);
        assert!(s.undo());
        assert_eq!(s.buffer(), &[0; 4]);
    }

    #[test]
    fn char_map_changes_redraw() {
        let mut s = session(&[0x90]);
        s.set_glyph(0x90, "ж");
        assert_eq!(s.take_notifications(), vec![Notification::Redraw]);
        s.set_edit_mode(EditMode::CharEntry);
        s.set_cursor(0);
        assert!(s.input_char('A'));
        assert_eq!(s.buffer(), &[0x41]);
        assert_eq!(s.char_map().render(&[0x90]), "ж");
    }

    #[test]
    fn guess_roundtrip_through_notifications() {
        let mut s = session(&[0x81, 0x82, 0x81]);
        s.start_guess(&GuessRequest::new(vec!["ABA".into()]))
            .unwrap();
        assert_eq!(
            s.start_guess(&GuessRequest::new(vec!["ABA".into()])),
            Err(GuessError::Busy)
        );
        while !s.poll_guess() {
            std::thread::yield_now();
        }
        let results = s
            .take_notifications()
            .into_iter()
            .find_map(|n| match n {
                Notification::GuessResultsReady(r) => Some(r),
                _ => None,
            })
            .unwrap();
        assert_eq!(results.len(), 1);
        s.apply_mapping(&results[0]);
        assert_eq!(s.char_map().render(s.buffer()), "ABA");
    }
}
