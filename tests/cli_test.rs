//! End-to-end tests for the demoreel CLI binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

#[allow(deprecated)]
fn demoreel_cmd() -> Command {
    Command::cargo_bin("demoreel").unwrap()
}

/// Write a config rooted in `dir` with `extra` appended, returning its path.
fn write_config(dir: &Path, extra: &str) -> PathBuf {
    let path = dir.join("demoreel.toml");
    let root = dir.join("work");
    let content = format!("[paths]\nroot = {:?}\n\n{}", root.to_string_lossy(), extra);
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn help_lists_subcommands() {
    demoreel_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("generate"))
        .stdout(predicate::str::contains("check-tools"))
        .stdout(predicate::str::contains("purge"));
}

#[test]
fn version_command() {
    demoreel_cmd()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("demoreel"));
}

#[test]
fn features_default_set() {
    let tmp = tempfile::tempdir().unwrap();
    let config = write_config(tmp.path(), "");
    demoreel_cmd()
        .args(["--config"])
        .arg(&config)
        .arg("features")
        .assert()
        .success()
        .stdout(predicate::str::contains("8 built-in feature(s)"))
        .stdout(predicate::str::contains("Smart Replies: 100/100"));
}

#[test]
fn features_from_config_keep_order() {
    let tmp = tempfile::tempdir().unwrap();
    let config = write_config(
        tmp.path(),
        "[[features]]\nname = \"Login\"\nvalue = 80\n\n\
         [[features]]\nname = \"Search\"\nvalue = 250\n",
    );
    demoreel_cmd()
        .arg("--config")
        .arg(&config)
        .arg("features")
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"(?s)Login: 80/100.*Search: 100/100").unwrap());
}

#[test]
fn validate_accepts_good_config() {
    let tmp = tempfile::tempdir().unwrap();
    let config = write_config(tmp.path(), "[compress]\ncrf = 30\n");
    demoreel_cmd()
        .arg("validate")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"))
        .stdout(predicate::str::contains("crf: 30"));
}

#[test]
fn validate_rejects_bad_crf() {
    let tmp = tempfile::tempdir().unwrap();
    let config = write_config(tmp.path(), "[compress]\ncrf = 99\n");
    demoreel_cmd()
        .arg("validate")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("crf 99"));
}

#[test]
fn check_tools_reports_ffmpeg() {
    demoreel_cmd()
        .arg("check-tools")
        .assert()
        .success()
        .stdout(predicate::str::contains("ffmpeg"));
}

#[test]
fn generate_rejects_malformed_feature() {
    demoreel_cmd()
        .args(["generate", "--feature", "Login"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("NAME=VALUE"));
}

#[test]
fn generate_rejects_zero_duration() {
    let tmp = tempfile::tempdir().unwrap();
    let config = write_config(tmp.path(), "");
    demoreel_cmd()
        .arg("--config")
        .arg(&config)
        .args(["generate", "--duration", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid --duration"));
}

#[test]
fn generate_rejects_huge_duration() {
    let tmp = tempfile::tempdir().unwrap();
    let config = write_config(tmp.path(), "");
    demoreel_cmd()
        .arg("--config")
        .arg(&config)
        .args(["generate", "--duration", "1e30"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid --duration"));
}

#[test]
fn validate_rejects_huge_clip_duration() {
    let tmp = tempfile::tempdir().unwrap();
    let config = write_config(tmp.path(), "[clip]\nduration_secs = 1e30\n");
    demoreel_cmd()
        .arg("validate")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("clip duration"));
}

#[test]
fn purge_removes_stale_files_and_logs() {
    let tmp = tempfile::tempdir().unwrap();
    let config = write_config(tmp.path(), "");
    let temp_dir = tmp.path().join("work").join("temp");
    let banner_dir = tmp.path().join("work").join("banners");
    std::fs::create_dir_all(&temp_dir).unwrap();
    std::fs::create_dir_all(&banner_dir).unwrap();

    let stale = temp_dir.join("stale.mp4");
    let fresh = temp_dir.join("fresh.mp4");
    std::fs::write(&stale, b"old").unwrap();
    std::fs::write(&fresh, b"new").unwrap();
    let old = SystemTime::now() - Duration::from_secs(25 * 3600);
    std::fs::File::options()
        .write(true)
        .open(&stale)
        .unwrap()
        .set_modified(old)
        .unwrap();

    demoreel_cmd()
        .arg("--config")
        .arg(&config)
        .args(["purge", "--hours", "24"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 1 file(s), kept 1"));

    assert!(!stale.exists());
    assert!(fresh.exists());
    assert!(tmp.path().join("work").join("demoreel.log").exists());
}
