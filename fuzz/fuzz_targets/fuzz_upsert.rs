#![no_main]

use libfuzzer_sys::fuzz_target;
use std::io::Cursor;
use tinymeta_io::{Fields, JpegMetaManager, VendorRegistry};

fuzz_target!(|data: &[u8]| {
    // Split the input into field bytes and a stream
    let (head, stream) = data.split_at(data.len().min(16));
    let value = String::from_utf8_lossy(head).into_owned();

    let mut fields = Fields::new();
    fields.insert("fuzz".to_string(), value);

    let registry = VendorRegistry::builtin();
    for vendor in ["tinymeta", "tinymetagzip"] {
        let Ok(mut manager) = JpegMetaManager::new(&registry, Cursor::new(stream)) else {
            return;
        };
        if manager.upsert(vendor, &fields).is_err() {
            continue;
        }

        let mut output = Vec::new();
        if manager.write_to(&mut output).is_err() {
            continue;
        }

        // An updated file must read back what was written
        let mut reread = JpegMetaManager::new(&registry, Cursor::new(output.as_slice()))
            .expect("composed output keeps the JPEG prefix");
        if let Ok(found) = reread.extract(vendor, &["fuzz"]) {
            assert_eq!(found.get("fuzz"), fields.get("fuzz"));
        }
    }
});
