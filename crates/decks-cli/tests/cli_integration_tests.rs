//! CLI integration tests
//!
//! Run the built `decks` binary against temporary databases.

use rusqlite::Connection;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn decks(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_decks"))
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("Failed to execute CLI")
}

fn write_config(dir: &Path, body: &str) -> String {
    let path = dir.join("decks.toml");
    fs::write(&path, body).unwrap();
    path.to_str().unwrap().to_string()
}

#[test]
fn test_migrate_creates_schema() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("decks.db");

    let output = decks(
        temp_dir.path(),
        &["migrate", "--db", db_path.to_str().unwrap()],
    );

    assert!(
        output.status.success(),
        "migrate should succeed. Stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(String::from_utf8_lossy(&output.stdout).contains("Database ready"));

    let conn = Connection::open(&db_path).unwrap();
    let applied: i64 = conn
        .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
        .unwrap();
    assert_eq!(applied, 1);
}

#[test]
fn test_migrate_twice_is_harmless() {
    let temp_dir = TempDir::new().unwrap();
    let db = temp_dir.path().join("decks.db");
    let db = db.to_str().unwrap();

    assert!(decks(temp_dir.path(), &["migrate", "--db", db]).status.success());
    assert!(decks(temp_dir.path(), &["migrate", "--db", db]).status.success());
}

#[test]
fn test_config_file_selects_database() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_config(
        temp_dir.path(),
        "[database]\npath = \"from-config.db\"\n\n[logging]\nprofile = \"test\"\n",
    );

    let output = decks(temp_dir.path(), &["--config", &config, "migrate"]);

    assert!(output.status.success());
    assert!(temp_dir.path().join("from-config.db").exists());
}

#[test]
fn test_missing_config_file_fails() {
    let temp_dir = TempDir::new().unwrap();

    let output = decks(temp_dir.path(), &["--config", "nowhere.toml", "migrate"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("configuration"));
}

#[test]
fn test_seed_reports_unreachable_cards_service() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_config(
        temp_dir.path(),
        concat!(
            "[cards]\nurl = \"http://127.0.0.1:9\"\n\n",
            "[seeding]\ndependency_timeout_ms = 200\npoll_interval_ms = 20\n\n",
            "[logging]\nprofile = \"test\"\n",
        ),
    );

    let output = decks(
        temp_dir.path(),
        &["--config", &config, "seed", "--db", "seed.db"],
    );

    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"failed\""), "stdout: {}", stdout);
    assert!(stdout.contains("ERR_TIMEOUT"));

    // Nothing written; schema still in place
    let conn = Connection::open(temp_dir.path().join("seed.db")).unwrap();
    let decks: i64 = conn
        .query_row("SELECT COUNT(*) FROM decks", [], |row| row.get(0))
        .unwrap();
    assert_eq!(decks, 0);
}

#[test]
fn test_help_lists_commands() {
    let temp_dir = TempDir::new().unwrap();
    let output = decks(temp_dir.path(), &["--help"]);

    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["serve", "migrate", "seed"] {
        assert!(stdout.contains(command), "missing {command} in help");
    }
}
