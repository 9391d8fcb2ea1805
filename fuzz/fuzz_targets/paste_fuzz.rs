#![no_main]
use hexandtabler::charmap::CharMap;
use hexandtabler::editor::{ClipboardPayload, Editor};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }
    let len = data[0] as usize;
    let cursor = data[1] as isize * 2;
    let text = String::from_utf8_lossy(&data[2..]).into_owned();

    let mut editor = Editor::with_data(vec![0; len]);
    editor.set_cursor(cursor);
    editor.paste(&ClipboardPayload::from_text(text), &CharMap::new());
    assert_eq!(editor.len(), len);
    assert!(editor.cursor_position() <= len * 2);
});
