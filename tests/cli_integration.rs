//! End-to-end tests of the `ticketboard` binary

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Command isolated from the user's configuration and environment
fn ticketboard(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("ticketboard").unwrap();
    cmd.env_clear()
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join(".config"))
        .env("NO_COLOR", "1");
    cmd
}

#[test]
fn help_lists_commands() {
    let home = TempDir::new().unwrap();
    ticketboard(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("migrate"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn config_show_json_masks_password() {
    let home = TempDir::new().unwrap();
    let output = ticketboard(&home)
        .env("TICKETBOARD__SERVER__PORT", "9100")
        .env("DATABASE_URL", "postgres://board:hunter2@db:5432/tickets")
        .args(["--json", "config", "show"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let config: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(config["server"]["port"], 9100);
    assert_eq!(config["database"]["url"], "postgres://board:****@db:5432/tickets");
    assert_eq!(config["pagination"]["max_limit"], 1000);
}

#[test]
fn config_file_is_read() {
    let home = TempDir::new().unwrap();
    let path = home.path().join("board.toml");
    std::fs::write(&path, "[pagination]\ndefault_limit = 25\n").unwrap();

    ticketboard(&home)
        .args(["config", "show", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("default_limit"))
        .stdout(predicate::str::contains("25"));
}

#[test]
fn missing_config_file_fails_with_suggestions() {
    let home = TempDir::new().unwrap();
    ticketboard(&home)
        .args(["--config", "/definitely/not/here.toml", "config", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration error"))
        .stderr(predicate::str::contains("Suggestions"));
}

#[cfg(feature = "postgres")]
#[test]
fn migrate_without_database_url_fails() {
    let home = TempDir::new().unwrap();
    ticketboard(&home)
        .arg("migrate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("database.url is not set"));
}
