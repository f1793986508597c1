//! Integration tests for the `pyshade` binary.

use std::path::Path;
use std::process::Command;

fn cargo_bin() -> Command {
    let mut cmd = Command::new(env!("CARGO"));
    cmd.args(["run", "-p", "pyshade-cli", "--bin", "pyshade", "--"]);
    cmd
}

fn write_input(dir: &Path, name: &str, source: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, source).expect("Failed to write input file");
    path
}

#[test]
fn test_obfuscates_file() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let input = write_input(
        dir.path(),
        "app.py",
        "def add(a, b):\n    return a + b\nprint(add(1, 2))\n",
    );
    let output = dir.path().join("out.py");

    let status = cargo_bin()
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .status()
        .expect("Failed to run pyshade");
    assert!(status.success());

    let code = std::fs::read_to_string(&output).expect("Output file missing");
    assert!(code.contains("def __obf_0001__(a, b):"));
    assert!(code.contains("__obf_0001__(1, 2)"));
    assert!(!code.contains("add"));
}

#[test]
fn test_default_output_path() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let input = write_input(dir.path(), "script.py", "x = 'secret'\n");

    let status = cargo_bin()
        .arg(&input)
        .status()
        .expect("Failed to run pyshade");
    assert!(status.success());

    let code =
        std::fs::read_to_string(dir.path().join("script.obf.py")).expect("Output file missing");
    assert!(code.contains("b64decode"));
    assert!(!code.contains("'secret'"));
}

#[test]
fn test_reserve_flag_keeps_name() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let input = write_input(
        dir.path(),
        "app.py",
        "def main():\n    helper()\ndef helper():\n    pass\nmain()\n",
    );
    let output = dir.path().join("out.py");

    let status = cargo_bin()
        .args(["--reserve", "main"])
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .status()
        .expect("Failed to run pyshade");
    assert!(status.success());

    let code = std::fs::read_to_string(&output).expect("Output file missing");
    assert!(code.contains("def main():"));
    assert!(code.contains("def __obf_0001__():"));
}

#[test]
fn test_json_summary() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let input = write_input(
        dir.path(),
        "app.py",
        "def f():\n    return 'a'\ndef g():\n    return 'b'\nf()\n",
    );
    let output_path = dir.path().join("out.py");

    let output = cargo_bin()
        .arg("--json")
        .arg(&input)
        .arg("-o")
        .arg(&output_path)
        .output()
        .expect("Failed to run pyshade");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let summary: serde_json::Value =
        serde_json::from_str(stdout.trim()).expect("stdout is not valid JSON");
    assert_eq!(summary["functions_renamed"], 2);
    assert_eq!(summary["literals_encoded"], 2);
}

#[test]
fn test_malformed_input_fails() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let input = write_input(dir.path(), "broken.py", "def broken(:\n");
    let output_path = dir.path().join("out.py");

    let output = cargo_bin()
        .arg(&input)
        .arg("-o")
        .arg(&output_path)
        .output()
        .expect("Failed to run pyshade");

    assert!(!output.status.success());
    // Nothing is written on failure.
    assert!(!output_path.exists());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("syntax error"));
}

#[test]
fn test_missing_input_fails() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");

    let output = cargo_bin()
        .arg(dir.path().join("no-such-file.py"))
        .output()
        .expect("Failed to run pyshade");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("cannot read"));
}
