#![no_main]
use libfuzzer_sys::fuzz_target;
use xrofs::{ByteOrder, ImageReader};

// Arbitrary bytes must either parse into in-bounds entries or be rejected
fuzz_target!(|data: &[u8]| {
    for order in [ByteOrder::Little, ByteOrder::Big] {
        let reader = match ImageReader::new(data, order) {
            Ok(reader) => reader,
            Err(_) => continue,
        };

        for entry in reader.entries() {
            let end = entry.offset as usize + entry.size as usize + entry.name.len();
            assert!(end < data.len());
            let _ = reader.open(entry.name);
        }
        for file in reader.files() {
            assert_eq!(file.map().len(), file.size());
        }
    }
});
