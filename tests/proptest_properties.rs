use hexandtabler::charmap::CharMap;
use hexandtabler::editor::{ClipboardPayload, Editor};
use hexandtabler::history::MAX_UNDO_STATES;
use hexandtabler::search::exact;
use hexandtabler::search::{FindOptions, Match, RelativePattern, SearchKind};
use hexandtabler::session::Session;
use proptest::prelude::*;

fn session_with(data: Vec<u8>) -> Session {
    let mut s = Session::default();
    s.set_buffer(data);
    s
}

proptest! {
    #[test]
    fn prop_cursor_is_even_and_in_bounds(
        data in proptest::collection::vec(any::<u8>(), 0..256),
        pos in -1024isize..1024
    ) {
        let mut e = Editor::with_data(data.clone());
        e.set_cursor(pos);
        let cur = e.cursor_position();
        prop_assert!(cur % 2 == 0);
        prop_assert!(cur <= data.len() * 2);
    }

    #[test]
    fn prop_selection_is_ordered_and_even(
        data in proptest::collection::vec(any::<u8>(), 0..256),
        a in -600isize..600,
        b in -600isize..600
    ) {
        let mut e = Editor::with_data(data.clone());
        e.set_selection(a, b);
        if let Some((s, end)) = e.selection() {
            prop_assert!(s < end);
            prop_assert!(s % 2 == 0 && end % 2 == 0);
            prop_assert!(end <= data.len() * 2);
        }
    }

    #[test]
    fn prop_paste_never_grows(
        data in proptest::collection::vec(any::<u8>(), 0..128),
        payload in proptest::collection::vec(any::<u8>(), 0..256),
        text in ".{0,64}",
        pos in 0isize..300
    ) {
        let map = CharMap::new();
        let mut e = Editor::with_data(data.clone());
        e.set_cursor(pos);
        e.paste(&ClipboardPayload::from_bytes(&payload), &map);
        prop_assert_eq!(e.len(), data.len());
        e.paste(&ClipboardPayload::from_text(text), &map);
        prop_assert_eq!(e.len(), data.len());
    }

    #[test]
    fn prop_undo_redo_inverse(
        data in proptest::collection::vec(any::<u8>(), 1..64),
        keys in proptest::collection::vec(0u8..16, 1..140)
    ) {
        let mut s = session_with(data.clone());
        let mut states = vec![s.buffer().to_vec()];
        for k in keys {
            let c = char::from_digit(k as u32, 16).unwrap();
            if !s.input_char(c) {
                s.set_cursor(0);
                continue;
            }
            if states.last().map(|v| v.as_slice()) != Some(s.buffer()) {
                states.push(s.buffer().to_vec());
            }
        }
        let edits = states.len() - 1;
        let undoable = edits.min(MAX_UNDO_STATES);

        for _ in 0..undoable {
            prop_assert!(s.undo());
        }
        prop_assert_eq!(s.buffer(), states[edits - undoable].as_slice());
        if edits <= MAX_UNDO_STATES {
            prop_assert_eq!(s.buffer(), data.as_slice());
        }
        prop_assert!(!s.undo());
        for _ in 0..undoable {
            prop_assert!(s.redo());
        }
        prop_assert_eq!(s.buffer(), states.last().unwrap().as_slice());
    }

    #[test]
    fn prop_history_is_bounded(
        edits in 1usize..200
    ) {
        let mut s = session_with(vec![0; 1]);
        for i in 0..edits {
            s.set_cursor(0);
            s.paste(&ClipboardPayload::from_bytes(&[(i % 251) as u8 + 1]));
        }
        let mut undone = 0;
        while s.undo() {
            undone += 1;
        }
        prop_assert!(undone <= MAX_UNDO_STATES);
        prop_assert_eq!(undone, edits.min(MAX_UNDO_STATES));
    }

    #[test]
    fn prop_exact_find_round_trip(
        prefix in proptest::collection::vec(0u8..0x80, 0..200),
        needle in proptest::collection::vec(0x80u8..=0xFF, 1..16),
        suffix in proptest::collection::vec(0u8..0x80, 0..200)
    ) {
        let mut data = prefix.clone();
        data.extend_from_slice(&needle);
        data.extend_from_slice(&suffix);
        let hex: String = needle.iter().map(|b| format!("{b:02X}")).collect();
        let mut s = session_with(data);

        let hit = s.find_first(&hex, SearchKind::Hex, FindOptions::default()).unwrap();
        prop_assert_eq!(hit, Some(Match { start: prefix.len(), len: needle.len() }));
        prop_assert_eq!(s.selection_start(), Some(prefix.len() * 2));
        prop_assert_eq!(s.selection_end(), Some((prefix.len() + needle.len()) * 2));

        let again = s.find(&hex, SearchKind::Hex, FindOptions::default()).unwrap();
        prop_assert_eq!(again, None);
        prop_assert_eq!(s.selection_start(), Some(prefix.len() * 2));
    }

    #[test]
    fn prop_find_from_cursor_reaches_later_needle(
        prefix in proptest::collection::vec(0u8..0x80, 1..200),
        needle in proptest::collection::vec(0x80u8..=0xFF, 1..16)
    ) {
        let mut data = prefix.clone();
        data.extend_from_slice(&needle);
        let hex: String = needle.iter().map(|b| format!("{b:02X}")).collect();
        let mut s = session_with(data);

        let hit = s.find(&hex, SearchKind::Hex, FindOptions::default()).unwrap();
        prop_assert_eq!(hit.map(|m| m.start), Some(prefix.len()));
        prop_assert_eq!(exact::find_forward(s.buffer(), &needle, 0, true, false), hit);
    }

    #[test]
    fn prop_replace_all_removes_every_match(
        data in proptest::collection::vec(0u8..4, 0..256),
        needle in proptest::collection::vec(0u8..4, 1..4)
    ) {
        let spans = exact::match_spans(&data, &needle, true);
        let (out, n) = exact::replace_all(&data, &needle, &[0xFF], true);
        prop_assert_eq!(n, spans.len());
        prop_assert_eq!(out.len(), data.len() - n * needle.len() + n);
    }

    #[test]
    fn prop_relative_wildcard_matches_any_middle(
        base in any::<u8>(),
        middle in any::<u8>()
    ) {
        let p = RelativePattern::parse("A?A").unwrap();
        prop_assert!(p.matches_at(&[base, middle, base], 0));
    }

    #[test]
    fn prop_relative_is_shift_invariant(
        shift in 0u8..=0xF0
    ) {
        let p = RelativePattern::parse("AEB").unwrap();
        prop_assert!(p.matches_at(&[shift, shift + 4, shift + 1], 0));
    }
}
