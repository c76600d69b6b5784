use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

fn repo_root() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .and_then(|p| p.parent())
        .expect("expected crates/<name> layout")
        .to_path_buf()
}

#[test]
fn cli_sanitizes_a_fixture_file() {
    let root = repo_root();
    let fixture = root.join("fixtures").join("lesson").join("malformed.mmd");
    assert!(fixture.exists(), "fixture missing: {}", fixture.display());

    let exe = assert_cmd::cargo_bin!("mastery");
    let output = Command::new(exe)
        .current_dir(&root)
        .args(["sanitize", fixture.to_string_lossy().as_ref()])
        .output()
        .expect("run mastery sanitize");
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).expect("utf-8 stdout");
    assert_eq!(stdout.lines().next(), Some("flowchart TD"));
    assert!(stdout.contains(r#"A["Start"] --> B{"Is it 'ok'?"}"#), "{stdout}");
    assert!(stdout.contains(r#"B -->|yes| C(("Done"))"#), "{stdout}");
    assert!(!stdout.contains("```"));
}

#[test]
fn cli_sanitizes_stdin_when_no_file_is_given() {
    let exe = assert_cmd::cargo_bin!("mastery");
    let mut child = Command::new(exe)
        .arg("sanitize")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("spawn mastery sanitize");
    child
        .stdin
        .as_mut()
        .expect("stdin handle")
        .write_all(b"A --> B")
        .expect("write stdin");
    let output = child.wait_with_output().expect("wait for mastery");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("utf-8 stdout");
    assert_eq!(stdout, "flowchart TD\nA --> B\n");
}

#[test]
fn cli_writes_sanitized_output_to_a_file() {
    let root = repo_root();
    let fixture = root.join("fixtures").join("lesson").join("malformed.mmd");
    let tmp = tempfile::tempdir().expect("tempdir");
    let out = tmp.path().join("out.mmd");

    let exe = assert_cmd::cargo_bin!("mastery");
    let status = Command::new(exe)
        .current_dir(&root)
        .args([
            "sanitize",
            fixture.to_string_lossy().as_ref(),
            "--out",
            out.to_string_lossy().as_ref(),
        ])
        .status()
        .expect("run mastery sanitize --out");
    assert!(status.success());

    let written = fs::read_to_string(&out).expect("read output file");
    assert!(written.starts_with("flowchart TD"));
}

#[test]
fn cli_respects_a_configured_direction() {
    let exe = assert_cmd::cargo_bin!("mastery");
    let mut child = Command::new(exe)
        .args(["sanitize", "--direction", "LR"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("spawn mastery sanitize");
    child
        .stdin
        .as_mut()
        .expect("stdin handle")
        .write_all(b"A --> B")
        .expect("write stdin");
    let output = child.wait_with_output().expect("wait for mastery");

    let stdout = String::from_utf8(output.stdout).expect("utf-8 stdout");
    assert_eq!(stdout.lines().next(), Some("flowchart LR"));
}

#[test]
fn cli_rejects_unknown_options() {
    let exe = assert_cmd::cargo_bin!("mastery");
    let output = Command::new(exe)
        .args(["sanitize", "--nope"])
        .output()
        .expect("run mastery");
    assert!(!output.status.success());
}
