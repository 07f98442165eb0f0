//! Binary-level checks: exit codes, stdout contracts, dry-run sync end to end.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use bod_io::SqliteSource;
use chrono::{Datelike, Utc};
use predicates::prelude::*;

fn bod() -> Command {
    let mut cmd = Command::cargo_bin("bod").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

fn write_config(dir: &Path, file: &str, draft_id: &str, sheet: &str) -> std::path::PathBuf {
    let year = Utc::now().year();
    let path = dir.join(file);
    fs::write(
        &path,
        format!(
            "year: {year}\nname: Friends {year}\nsheet_name: {sheet}\ndraft_id: {draft_id}\n\
             update_type: web\ngspread_credentials_name: GSPREAD_CREDENTIALS\ndatabase_dir: databases\n"
        ),
    )
    .unwrap();
    path
}

#[test]
fn layout_prints_json() {
    bod()
        .args(["layout", "--scoreboard", "5", "--released", "100", "--worst", "50", "--best", "50"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"available_height\": 92"))
        .stdout(predicate::str::contains("\"worst_picks_height\": 44"))
        .stdout(predicate::str::contains("\"best_picks_row_num\": 59"));
}

#[test]
fn validate_accepts_a_good_config() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = write_config(dir.path(), "friends.yml", "friends", "Friends Sheet");
    bod()
        .args(["validate", "--config"])
        .arg(&cfg)
        .assert()
        .success()
        .stdout(predicate::str::contains("ok (friends, web)"));
}

#[test]
fn validate_reports_every_problem_with_exit_2() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = dir.path().join("bad.yml");
    fs::write(&cfg, "year: '2025'\nname: x\nupdate_type: ftp\n").unwrap();
    bod()
        .args(["validate", "--config"])
        .arg(&cfg)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Missing required fields: sheet_name, draft_id, gspread_credentials_name"))
        .stderr(predicate::str::contains("year: expected int, got str"))
        .stderr(predicate::str::contains("update_type: must be 's3' or 'web'"));
}

#[test]
fn duplicate_draft_ids_fail_the_batch() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_config(dir.path(), "a.yml", "friends", "Sheet A");
    let b = write_config(dir.path(), "b.yml", "friends", "Sheet B");
    bod()
        .args(["validate", "--config"])
        .arg(&a)
        .arg("--config")
        .arg(&b)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("draft_id 'friends' is used by"));
}

#[test]
fn missing_config_file_is_exit_2() {
    bod()
        .args(["sync", "--config", "does/not/exist.yml"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("config file not found"));
}

#[test]
fn data_failures_are_retried_then_exit_4() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = write_config(dir.path(), "friends.yml", "friends", "Friends Sheet");
    bod()
        .args(["sync", "--dry-run", "--skip-transform", "--retries", "1", "--backoff-secs", "0", "--config"])
        .arg(&cfg)
        .assert()
        .code(4)
        .stderr(predicate::str::contains("retrying in 0s"))
        .stderr(predicate::str::contains("catalog directory not found"));
}

fn seed_catalog(database_dir: &Path, catalog: &str) {
    let dir = database_dir.join(catalog);
    fs::create_dir_all(&dir).unwrap();
    for schema in SqliteSource::SCHEMAS {
        fs::write(dir.join(format!("{schema}.db")), b"").unwrap();
    }
    let src = SqliteSource::open(database_dir, catalog).unwrap();
    src.connection()
        .execute_batch(
            "CREATE TABLE dashboards.scoreboard (c0, c1, c2, c3, c4, c5);
             INSERT INTO dashboards.scoreboard VALUES ('Ann', 100, 1, 1, 1.0, 100);
             CREATE TABLE combined.base_query
                 (c0, title, c2, c3, c4, c5, c6, c7, c8, c9, c10, c11, c12, c13, c14, c15);
             INSERT INTO combined.base_query VALUES
                 (1, 'Movie A', 'Ann', 100, 100, 1, 1, 1.0, 60, 0.6, 40, 0.4, NULL, 0, '2025-05-01', 'Yes');
             CREATE TABLE dashboards.worst_picks (c0, c1, c2, c3, c4, c5);
             CREATE TABLE dashboards.best_picks (c0, c1, c2, c3, c4, c5);
             CREATE TABLE cleaned.drafter (movie TEXT, name TEXT);
             INSERT INTO cleaned.drafter VALUES ('Movie A', 'Ann'), ('Movie B', 'Ann');
             CREATE TABLE cleaned.box_office_mojo_dump
                 (title TEXT, revenue INTEGER, release_year INTEGER, loaded_date TEXT, published_timestamp_utc TEXT);",
        )
        .unwrap();
}

#[test]
fn dry_run_sync_prints_the_summary() {
    let dir = tempfile::tempdir().unwrap();
    seed_catalog(&dir.path().join("databases"), "friends");
    let cfg = write_config(dir.path(), "friends.yml", "friends", "Friends Sheet");

    let out = bod()
        .args(["sync", "--dry-run", "--skip-transform", "--retries", "0", "--config"])
        .arg(&cfg)
        .assert()
        .success()
        .stderr(predicate::str::contains("Dashboard updated and formatted"))
        .stderr(predicate::str::contains("No revenue data found for this year."))
        .get_output()
        .stdout
        .clone();

    let summary: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(summary["assets"], 2);
    assert_eq!(summary["missing_movies"], serde_json::json!(["Movie B"]));
    assert_eq!(summary["min_revenue"], "NoData");
    assert_eq!(summary["digest"].as_str().unwrap().len(), 64);
}
