#![no_main]

use libfuzzer_sys::fuzz_target;
use std::io::Cursor;
use tinymeta_io::{JpegMetaManager, VendorRegistry};

fuzz_target!(|data: &[u8]| {
    // Scanning and decoding arbitrary bytes must NEVER panic, only return errors
    let registry = VendorRegistry::builtin();
    let Ok(mut manager) = JpegMetaManager::new(&registry, Cursor::new(data)) else {
        return;
    };

    let _ = manager.extract("tinymeta", &["artist", "title"]);
    let _ = manager.extract("tinymetagzip", &["artist"]);
    let _ = manager.scan_state();

    // Whatever was read, the output replays the input exactly
    let mut output = Vec::new();
    if manager.write_to(&mut output).is_ok() {
        assert_eq!(output, data);
    }
});
