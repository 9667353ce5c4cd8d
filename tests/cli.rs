use assert_cmd::Command;
use predicates::prelude::*;

fn transcript_api() -> Command {
    let mut cmd = Command::cargo_bin("transcript-api").unwrap();
    cmd.env_remove("PORT").env("RUST_LOG", "off");
    cmd
}

#[test]
fn help_lists_subcommands() {
    transcript_api()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("fetch"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn config_show_prints_defaults_and_writes_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");

    transcript_api()
        .args(["--config", path.to_str().unwrap(), "config", "--show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Max Attempts: 3"))
        .stdout(predicate::str::contains("socks5://127.0.0.1:9050"));

    assert!(path.exists());
}

#[test]
fn config_file_overrides_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "retry:\n  max_attempts: 7\n  proxy_url: null\n").unwrap();

    transcript_api()
        .args(["--config", path.to_str().unwrap(), "config", "--show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Max Attempts: 7"))
        .stdout(predicate::str::contains("Proxy: disabled"));
}

#[test]
fn invalid_config_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "retry:\n  max_attempts: 0\n").unwrap();

    transcript_api()
        .args(["--config", path.to_str().unwrap(), "config", "--show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("max_attempts"));
}

#[test]
fn fetch_rejects_non_youtube_input() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");

    transcript_api()
        .args(["--config", path.to_str().unwrap(), "fetch", "https://vimeo.com/1234"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not a YouTube video id or URL"));
}
