#![no_main]
use libfuzzer_sys::fuzz_target;
use metagz::container::{decoder, frame, metadata::Metadata};

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes must only ever produce errors, never panics.
    let _ = decoder::decode(data, "fuzz.gz");

    if let Ok(f) = frame::split(data) {
        assert_eq!(
            4 + f.metadata.len() + f.payload.len(),
            data.len(),
            "frame regions must cover the input"
        );
        let _ = Metadata::from_bytes(f.metadata);
    }
});
