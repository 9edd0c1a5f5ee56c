use metagz::container::decoder::{self, DecodeError, Format};

#[derive(Debug)]
struct Vector {
    name: String,
    expect: Option<Format>,
    fallback: String,
    input: Vec<u8>,
    filename: String,
    payload: Vec<u8>,
}

fn hex_to_bytes(s: &str) -> Vec<u8> {
    let s = s.trim();
    if s.is_empty() {
        return Vec::new();
    }
    assert!(
        s.len().is_multiple_of(2),
        "hex string must have even length"
    );
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
        .collect()
}

fn parse_expect(s: &str) -> Option<Format> {
    match s {
        "framed" => Some(Format::Framed),
        "gzip" => Some(Format::Gzip),
        "deflate" => Some(Format::Deflate),
        "reject" => None,
        other => panic!("unknown expectation {other:?}"),
    }
}

fn load_vectors() -> Vec<Vector> {
    let manifest = include_str!("vectors/manifest.tsv");
    manifest
        .lines()
        .filter(|line| !line.trim().is_empty() && !line.starts_with('#'))
        .map(|line| {
            let parts: Vec<_> = line.split('|').collect();
            assert_eq!(parts.len(), 6, "invalid vector row: {line}");
            Vector {
                name: parts[0].to_string(),
                expect: parse_expect(parts[1]),
                fallback: parts[2].to_string(),
                input: hex_to_bytes(parts[3]),
                filename: parts[4].to_string(),
                payload: hex_to_bytes(parts[5]),
            }
        })
        .collect()
}

#[test]
fn vector_database_is_non_empty() {
    let vectors = load_vectors();
    assert!(vectors.iter().any(|v| v.expect.is_some()));
    assert!(vectors.iter().any(|v| v.expect.is_none()));
}

#[test]
fn accepted_vectors_decode_exactly() {
    for v in load_vectors() {
        let Some(format) = v.expect else { continue };
        let decoded = decoder::decode(&v.input, &v.fallback)
            .unwrap_or_else(|e| panic!("vector {} failed: {e}", v.name));
        assert_eq!(decoded.format, format, "vector {}", v.name);
        assert_eq!(decoded.filename, v.filename, "vector {}", v.name);
        assert_eq!(decoded.payload, v.payload, "vector {}", v.name);
        assert_eq!(
            decoded.metadata.is_some(),
            format == Format::Framed,
            "vector {}",
            v.name
        );
    }
}

#[test]
fn rejected_vectors_fail_every_stage() {
    for v in load_vectors() {
        if v.expect.is_some() {
            continue;
        }
        assert!(decoder::try_framed(&v.input).is_err(), "vector {}", v.name);
        assert!(
            decoder::try_gzip(&v.input, &v.fallback).is_err(),
            "vector {}",
            v.name
        );
        assert!(
            decoder::try_deflate(&v.input, &v.fallback).is_err(),
            "vector {}",
            v.name
        );
        assert!(
            matches!(
                decoder::decode(&v.input, &v.fallback),
                Err(DecodeError::NotCompressed)
            ),
            "vector {}",
            v.name
        );
    }
}

#[test]
fn framed_vectors_keep_full_record() {
    let v = load_vectors()
        .into_iter()
        .find(|v| v.name == "framed_full_record")
        .unwrap();
    let meta = decoder::decode(&v.input, &v.fallback)
        .unwrap()
        .metadata
        .unwrap();
    assert_eq!(meta.original_size, 4);
    assert_eq!(meta.timestamp, 1_700_000_000_000);
    assert_eq!(meta.mimetype.as_deref(), Some("application/pdf"));
    assert_eq!(
        meta.compressed_at.as_deref(),
        Some("2023-11-14T22:13:20.000Z")
    );
    assert_eq!(meta.version, "1.0");
}
