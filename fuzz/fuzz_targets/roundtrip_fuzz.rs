#![no_main]
use libfuzzer_sys::fuzz_target;
use metagz::container::{decoder, encoder, filename};

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    // First byte picks the filename length, the rest is split into name and payload.
    let name_len = (data[0] as usize).min(data.len() - 1);
    let (name_bytes, payload) = data[1..].split_at(name_len);
    let name = String::from_utf8_lossy(name_bytes);
    if name.is_empty() {
        return;
    }

    let container = encoder::encode(payload, &name, None).unwrap();
    let decoded = decoder::decode(&container, "ignored").unwrap();
    assert_eq!(decoded.payload, payload);
    assert_eq!(decoded.filename, filename::sanitize(&name));
});
