//! Integration tests for the command line.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn passphrase_export() -> Command {
    Command::new(env!("CARGO_BIN_EXE_passphrase-export"))
}

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn test_export_without_converter() {
    let temp_dir = TempDir::new().unwrap();
    let output_base = temp_dir.path().join("backup");

    let output = passphrase_export()
        .args(["export", "--no-convert", "-s", "-p"])
        .arg(fixture("phabricator_passphrase.sql"))
        .arg("-u")
        .arg(fixture("phabricator_user.sql"))
        .arg("-o")
        .arg(&output_base)
        .output()
        .unwrap();

    assert!(output.status.success(), "Command failed: {:?}", output);

    let csv = fs::read_to_string(temp_dir.path().join("backup.csv")).unwrap();
    assert!(csv.starts_with("Title,Login URL,Login Username,Login Password,"));
    assert!(csv.contains("K1 - prod db,,root,hunter2,1500001000,1500002000,Alice Smith"));
    assert!(!temp_dir.path().join("backup.1pif").exists());

    for snapshot in [
        "user_data.json",
        "passphrase_data.json",
        "secret_data.json",
        "assembled_dict.json",
    ] {
        assert!(
            temp_dir.path().join(snapshot).exists(),
            "missing snapshot {}",
            snapshot
        );
    }

    let users: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(temp_dir.path().join("user_data.json")).unwrap())
            .unwrap();
    assert_eq!(users["PHID-USER-aaaa"]["realName"], "Alice Smith");

    let assembled: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(temp_dir.path().join("assembled_dict.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(assembled[0]["Title"], "K1 - prod db");
    assert_eq!(assembled[0]["Created"], 1500001000);
}

#[cfg(unix)]
#[test]
fn test_export_runs_converter_and_restores() {
    let temp_dir = TempDir::new().unwrap();
    let workdir = temp_dir.path().join("converter");
    fs::create_dir(&workdir).unwrap();

    // Invoked as: sh fake_convert.sh csv -a <csv> -o <out>
    fs::write(workdir.join("fake_convert.sh"), "cp \"$3\" \"$5\"\n").unwrap();

    let config_path = temp_dir.path().join("config.yaml");
    fs::write(
        &config_path,
        format!(
            "converter:\n  program: sh\n  script: fake_convert.sh\n  workdir: {}\n",
            workdir.display()
        ),
    )
    .unwrap();

    let output_base = temp_dir.path().join("backup");
    let output = passphrase_export()
        .args(["export", "-p"])
        .arg(fixture("phabricator_passphrase.sql"))
        .arg("-u")
        .arg(fixture("phabricator_user.sql"))
        .arg("-o")
        .arg(&output_base)
        .arg("-c")
        .arg(&config_path)
        .output()
        .unwrap();

    assert!(output.status.success(), "Command failed: {:?}", output);

    let bundle = fs::read_to_string(temp_dir.path().join("backup.1pif")).unwrap();
    assert!(bundle.contains("don't share"));
    assert!(bundle.contains("Bob O'Brien"));
    assert!(!bundle.contains("@SINGLE_placeholder"));
    assert!(!bundle.contains("@DOUBLE_placeholder"));

    // The CSV itself keeps the placeholders
    let csv = fs::read_to_string(temp_dir.path().join("backup.csv")).unwrap();
    assert!(csv.contains("@SINGLE_placeholder"));
}

#[cfg(unix)]
#[test]
fn test_export_fails_when_converter_fails() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(
        &config_path,
        format!(
            "converter:\n  program: \"false\"\n  workdir: {}\n",
            temp_dir.path().display()
        ),
    )
    .unwrap();

    let output = passphrase_export()
        .args(["export", "-p"])
        .arg(fixture("phabricator_passphrase.sql"))
        .arg("-u")
        .arg(fixture("phabricator_user.sql"))
        .arg("-o")
        .arg(temp_dir.path().join("backup"))
        .arg("-c")
        .arg(&config_path)
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("converter failed"), "stderr: {}", stderr);
}

#[test]
fn test_export_missing_input() {
    let temp_dir = TempDir::new().unwrap();

    let output = passphrase_export()
        .args(["export", "--no-convert", "-p"])
        .arg(temp_dir.path().join("absent.sql"))
        .arg("-u")
        .arg(fixture("phabricator_user.sql"))
        .arg("-o")
        .arg(temp_dir.path().join("backup"))
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("does not exist"), "stderr: {}", stderr);
    assert!(!temp_dir.path().join("backup.csv").exists());
}

#[test]
fn test_export_structural_error_exits_nonzero() {
    let temp_dir = TempDir::new().unwrap();

    // The user dump has no passphrase tables
    let output = passphrase_export()
        .args(["export", "--no-convert", "-p"])
        .arg(fixture("phabricator_user.sql"))
        .arg("-u")
        .arg(fixture("phabricator_user.sql"))
        .arg("-o")
        .arg(temp_dir.path().join("backup"))
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("table 'passphrase_credential' not found"),
        "stderr: {}",
        stderr
    );
}

#[test]
fn test_table_command_prints_json() {
    let output = passphrase_export()
        .args(["table", "-i", "id"])
        .arg(fixture("phabricator_passphrase.sql"))
        .arg("passphrase_secret")
        .output()
        .unwrap();

    assert!(output.status.success(), "Command failed: {:?}", output);

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["1"]["secretData"], "hunter2");
    assert_eq!(json.as_object().unwrap().len(), 4);
}

#[test]
fn test_restore_command() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("out.1pif");
    fs::write(&file, "O@SINGLE_placeholderBrien \\\\ @DOUBLE_placeholderx").unwrap();

    let output = passphrase_export()
        .arg("restore")
        .arg(&file)
        .output()
        .unwrap();

    assert!(output.status.success(), "Command failed: {:?}", output);
    assert_eq!(fs::read_to_string(&file).unwrap(), "O'Brien \\ \\\"x");
}

#[test]
fn test_completions() {
    let output = passphrase_export()
        .args(["completions", "bash"])
        .output()
        .unwrap();

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("passphrase-export"));
}
