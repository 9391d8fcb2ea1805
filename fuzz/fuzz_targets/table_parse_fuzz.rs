#![no_main]
use hexandtabler::charmap::CharMap;
use hexandtabler::table::{decode_table, format_table, parse_table};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(glyphs) = decode_table(data) {
        // Anything that decodes must survive a format/parse cycle.
        let map = CharMap::from_table(glyphs);
        let again = parse_table(&format_table(&map));
        assert_eq!(CharMap::from_table(again), map);
    }
});
