// toolshape-cli/tests/cli.rs

use std::fs;
use std::process::Command;
use tempfile::tempdir;

fn toolshape() -> Command {
    Command::new(env!("CARGO_BIN_EXE_toolshape"))
}

#[test]
fn score_prints_severity_json() {
    let dir = tempdir().unwrap();
    let output = toolshape()
        .current_dir(dir.path())
        .args(["score", "CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:H/A:H"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["severity"], "critical");
    assert_eq!(value["score"], 9.8);
}

#[test]
fn parse_reads_captured_files_and_reports_failure() {
    let dir = tempdir().unwrap();
    let stdout_path = dir.path().join("tsc.out");
    fs::write(
        &stdout_path,
        "src/index.ts(10,5): error TS2322: Type 'string' is not assignable to type 'number'.\n",
    )
    .unwrap();

    let output = toolshape()
        .current_dir(dir.path())
        .arg("parse")
        .arg("tsc")
        .arg("--stdout")
        .arg(&stdout_path)
        .args(["--exit-code", "2", "--full"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["shape"], "full");
    assert_eq!(value["data"]["errors"], 1);
    assert_eq!(value["data"]["diagnostics"][0]["code"], "2322");
}

#[test]
fn config_file_selects_human_output() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("Toolshape.toml"), "[output]\nformat = \"human\"\n").unwrap();
    let output = toolshape()
        .current_dir(dir.path())
        .env("NO_COLOR", "1")
        .args(["score", "5.0"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "medium (5.0)");
}

#[test]
fn run_rejects_flag_like_arguments() {
    let dir = tempdir().unwrap();
    let output = toolshape()
        .current_dir(dir.path())
        .args(["run", "git-log", "--", "--exec=evil"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--exec=evil"), "{}", stderr);
}
