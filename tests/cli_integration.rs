use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::tempdir;

fn bin() -> String {
    env!("CARGO_BIN_EXE_metagz").to_string()
}

fn only_file(dir: &Path) -> PathBuf {
    let entries: Vec<_> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.is_file())
        .collect();
    assert_eq!(entries.len(), 1, "{entries:?}");
    entries.into_iter().next().unwrap()
}

#[test]
fn cli_compress_decompress_roundtrip() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("hello.txt");
    let packed = dir.path().join("packed");
    let unpacked = dir.path().join("unpacked");
    fs::create_dir_all(&packed).unwrap();
    fs::create_dir_all(&unpacked).unwrap();
    fs::write(&input, b"hello world!").unwrap();

    let st = Command::new(bin())
        .args(["compress", "--output-dir"])
        .arg(&packed)
        .arg(&input)
        .status()
        .unwrap();
    assert!(st.success());

    let container = only_file(&packed);
    let name = container.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.ends_with("-hello.txt.gz"), "{name}");

    let st = Command::new(bin())
        .args(["decompress", "--output-dir"])
        .arg(&unpacked)
        .arg(&container)
        .status()
        .unwrap();
    assert!(st.success());

    let output = only_file(&unpacked);
    assert!(
        output
            .file_name()
            .unwrap()
            .to_string_lossy()
            .ends_with("-hello.txt")
    );
    assert_eq!(fs::read(&output).unwrap(), b"hello world!");
}

#[test]
fn cli_compress_json_report() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("notes.txt");
    fs::write(&input, "abc".repeat(1000)).unwrap();

    let out = Command::new(bin())
        .args(["--json", "compress", "-o"])
        .arg(dir.path())
        .arg(&input)
        .output()
        .unwrap();
    assert!(out.status.success());

    let report: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(report["success"], true);
    assert_eq!(report["originalSize"], 3000);
    assert!(report["compressionRatio"].as_str().unwrap().ends_with('%'));
    let filename = report["filename"].as_str().unwrap();
    assert_eq!(
        report["downloadPath"].as_str().unwrap(),
        format!("/compressed/{filename}")
    );
    assert!(dir.path().join(filename).exists());
}

#[test]
fn cli_decompress_stdout_bare_gzip() {
    use flate2::{Compression, write::GzEncoder};
    use std::io::Write;

    let dir = tempdir().unwrap();
    let input = dir.path().join("plain.txt.gz");
    let mut enc = GzEncoder::new(Vec::new(), Compression::default());
    enc.write_all(b"bare gzip body").unwrap();
    fs::write(&input, enc.finish().unwrap()).unwrap();

    let out = Command::new(bin())
        .args(["decompress", "--stdout"])
        .arg(&input)
        .output()
        .unwrap();
    assert!(out.status.success());
    assert_eq!(out.stdout, b"bare gzip body");
}

#[test]
fn cli_rejects_garbage_with_error_report() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("broken.gz");
    fs::write(&input, [0xffu8; 64]).unwrap();

    let out = Command::new(bin())
        .args(["--json", "decompress", "-o"])
        .arg(dir.path())
        .arg(&input)
        .output()
        .unwrap();
    assert!(!out.status.success());

    let report: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(report["error"], "File is not a valid compressed file");
    assert_eq!(
        report["details"],
        "not a valid compressed file or is corrupted"
    );
    assert!(report["suggestion"].is_string());
}

#[test]
fn cli_policy_refuses_type() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("tool.exe");
    fs::write(&input, b"MZ").unwrap();

    let st = Command::new(bin())
        .args(["-q", "compress", "-o"])
        .arg(dir.path())
        .arg(&input)
        .status()
        .unwrap();
    assert!(!st.success());

    let st = Command::new(bin())
        .args(["-q", "compress", "--any-type", "-o"])
        .arg(dir.path())
        .arg(&input)
        .status()
        .unwrap();
    assert!(st.success());
}

#[test]
fn cli_inspect_reports_metadata() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("data.bin");
    fs::write(&input, [7u8; 100]).unwrap();

    let st = Command::new(bin())
        .args(["-q", "compress", "-o"])
        .arg(dir.path())
        .arg(&input)
        .status()
        .unwrap();
    assert!(st.success());
    let container = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().path())
        .find(|p| p.to_string_lossy().ends_with(".gz"))
        .unwrap();

    let out = Command::new(bin())
        .args(["--json", "inspect"])
        .arg(&container)
        .output()
        .unwrap();
    assert!(out.status.success());
    let info: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(info["format"], "framed");
    assert_eq!(info["filename"], "data.bin");
    assert_eq!(info["payloadSize"], 100);
    assert_eq!(info["metadata"]["originalSize"], 100);
}

#[test]
fn cli_config_works() {
    let out = Command::new(bin()).arg("config").output().unwrap();
    assert!(out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("MAX_METADATA_LEN=50000"));
}

#[test]
fn cli_stdout_zero_padded_gzip_with_headers() {
    use flate2::{Compression, write::GzEncoder};
    use std::io::Write;

    let dir = tempdir().unwrap();
    let input = dir.path().join("padded.txt.gz");
    let mut enc = GzEncoder::new(Vec::new(), Compression::default());
    enc.write_all(b"hello").unwrap();
    let mut bytes = enc.finish().unwrap();
    bytes.extend_from_slice(&[0u8; 8]);
    fs::write(&input, bytes).unwrap();

    let out = Command::new(bin())
        .args(["-v", "decompress", "--stdout"])
        .arg(&input)
        .output()
        .unwrap();
    assert!(out.status.success());
    assert_eq!(out.stdout, b"hello");
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("X-Compression-Info: Standard GZIP format"), "{stderr}");
    assert!(stderr.contains("filename=\"padded.txt\""), "{stderr}");
}
