//! Integration tests for the facilita binary

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Working directory with a local config.yaml so runs never touch the
/// user's real config or the network-facing defaults.
fn offline_workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    let config = "\
api:
  base_url: https://api.invalid.localhost
resolver:
  endpoint: https://resolver.invalid.localhost/dl
  api_host: resolver.invalid.localhost
app:
  temp_dir: null
  keep_audio: false
  default_output_format: text
";
    fs::write(dir.path().join("config.yaml"), config).unwrap();
    dir
}

fn facilita() -> Command {
    Command::cargo_bin("facilita").unwrap()
}

#[test]
fn test_cli_help_lists_commands() {
    facilita()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("transcribe"))
        .stdout(predicate::str::contains("prompts"))
        .stdout(predicate::str::contains("sources"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_cli_version() {
    facilita().arg("--version").assert().success();
}

#[test]
fn test_transcribe_requires_media_argument() {
    facilita()
        .arg("transcribe")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_prompt_flags_are_exclusive() {
    facilita()
        .args([
            "transcribe",
            "clip.mp4",
            "--prompt",
            "Summarize",
            "--prompt-id",
            "2",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn test_sources_lists_supported_inputs() {
    facilita()
        .arg("sources")
        .assert()
        .success()
        .stdout(predicate::str::contains("YouTube"))
        .stdout(predicate::str::contains("mp4"))
        .stdout(predicate::str::contains("mp3"));
}

#[test]
fn test_transcribe_missing_file_fails_cleanly() {
    let dir = offline_workspace();

    facilita()
        .current_dir(dir.path())
        .args(["--quiet", "transcribe", "missing.mp4"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_transcribe_rejects_non_youtube_url() {
    let dir = offline_workspace();

    // Fails during validation, before any request could go out
    facilita()
        .current_dir(dir.path())
        .args(["--quiet", "transcribe", "https://vimeo.com/12345"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a valid YouTube link"));
}

#[test]
fn test_transcribe_rejects_idless_youtube_url() {
    let dir = offline_workspace();

    facilita()
        .current_dir(dir.path())
        .args([
            "--quiet",
            "transcribe",
            "https://www.youtube.com/playlist?list=PL123",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not resolve"));
}

#[test]
fn test_transcribe_youtube_needs_api_key() {
    let dir = offline_workspace();

    // The key check runs before the resolver is contacted
    facilita()
        .current_dir(dir.path())
        .env_remove("FACILITA_RAPIDAPI_KEY")
        .args([
            "--quiet",
            "transcribe",
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("FACILITA_RAPIDAPI_KEY"));
}

#[test]
fn test_config_show_reads_local_file() {
    let dir = offline_workspace();

    facilita()
        .current_dir(dir.path())
        .env_remove("FACILITA_RAPIDAPI_KEY")
        .args(["config", "--show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("api.invalid.localhost"))
        .stdout(predicate::str::contains("(not set)"));
}
