//! `consent` binary contract: exit codes, text and JSON output.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

struct Env {
    dir: TempDir,
    db: PathBuf,
}

impl Env {
    fn new() -> Self {
        let dir = tempdir().unwrap();
        let db = dir.path().join("data").join("consent.db");
        Self { dir, db }
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_consent"));
        cmd.current_dir(self.dir.path())
            .env_remove("CONSENT_DB")
            .env_remove("RUST_LOG")
            .arg("--db")
            .arg(&self.db);
        cmd
    }

    fn run(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.cmd().args(args).assert()
    }

    fn json(&self, args: &[&str]) -> (i32, Value) {
        let out = self.cmd().arg("--format").arg("json").args(args).output().unwrap();
        let code = out.status.code().unwrap();
        let v = serde_json::from_slice(&out.stdout).unwrap();
        (code, v)
    }
}

const PAIR: [&str; 4] = ["--user", "a@b.com", "--consent", "form_1"];

fn with_pair<'a>(cmd: &'a str, extra: &[&'a str]) -> Vec<&'a str> {
    let mut args = vec![cmd];
    args.extend_from_slice(&PAIR);
    args.extend_from_slice(extra);
    args
}

#[test]
fn test_add_creates_database_and_second_add_is_refused() {
    let env = Env::new();
    env.run(&with_pair("add", &["--status", "accepted"]))
        .success()
        .stdout(predicate::str::contains("consent added"));
    assert!(env.db.exists());

    env.run(&with_pair("add", &["--status", "declined"]))
        .code(1)
        .stdout(predicate::str::contains("consent already recorded"));

    env.run(&with_pair("check", &[]))
        .success()
        .stdout(predicate::str::diff("accepted\n"));
}

#[test]
fn test_lifecycle_exit_codes() {
    let env = Env::new();
    env.run(&with_pair("exists", &[])).code(1);
    env.run(&with_pair("update", &["--status", "1"])).code(1);
    env.run(&with_pair("remove", &[])).code(1);

    env.run(&with_pair("add", &["--status", "1"])).success();
    env.run(&with_pair("exists", &[])).success();
    env.run(&with_pair("check", &[])).success();

    env.run(&with_pair("update", &["--status", "0"])).success();
    env.run(&with_pair("check", &[]))
        .code(1)
        .stdout(predicate::str::contains("not accepted"));

    env.run(&with_pair("remove", &[])).success();
    env.run(&with_pair("exists", &[]))
        .code(1)
        .stdout(predicate::str::contains("not found"));
}

#[test]
fn test_show_json_keeps_created_at_across_update() {
    let env = Env::new();
    env.run(&with_pair("add", &["--status", "accepted"])).success();

    let (code, before) = env.json(&with_pair("show", &[]));
    assert_eq!(code, 0);
    assert_eq!(before["user_id"], "a@b.com");
    assert_eq!(before["status"], "accepted");

    env.run(&with_pair("update", &["--status", "declined"])).success();
    let (_, after) = env.json(&with_pair("show", &[]));
    assert_eq!(after["status"], "declined");
    assert_eq!(after["id"], before["id"]);
    assert_eq!(after["created_at"], before["created_at"]);
}

#[test]
fn test_exists_json_reports_id() {
    let env = Env::new();
    let (code, v) = env.json(&with_pair("exists", &[]));
    assert_eq!(code, 1);
    assert_eq!(v["exists"], false);
    assert!(v["id"].is_null());

    env.run(&with_pair("add", &["--status", "accepted"])).success();
    let (code, v) = env.json(&with_pair("exists", &[]));
    assert_eq!(code, 0);
    assert_eq!(v["exists"], true);
    assert!(v["id"].is_i64());
}

#[test]
fn test_purge_user_requires_confirmation() {
    let env = Env::new();
    env.run(&["add", "--user", "u@x.org", "--consent", "form_1", "--status", "1"])
        .success();
    env.run(&["add", "--user", "u@x.org", "--consent", "form_2", "--status", "0"])
        .success();
    env.run(&["add", "--user", "other@x.org", "--consent", "form_1", "--status", "1"])
        .success();

    let (code, v) = env.json(&["purge-user", "--user", "u@x.org"]);
    assert_eq!(code, 1);
    assert_eq!(v, serde_json::json!({"success": false, "removed": 0}));

    let (code, v) = env.json(&["purge-user", "--user", "u@x.org", "--yes"]);
    assert_eq!(code, 0);
    assert_eq!(v, serde_json::json!({"success": true, "removed": 2}));

    env.run(&["check", "--user", "other@x.org", "--consent", "form_1"])
        .success();
}

#[test]
fn test_list_filters_and_pages() {
    let env = Env::new();
    for (user, consent, status) in [
        ("u", "f1", "accepted"),
        ("u", "f2", "declined"),
        ("v", "f1", "accepted"),
    ] {
        env.run(&["add", "--user", user, "--consent", consent, "--status", status])
            .success();
    }

    let (code, v) = env.json(&["list", "--status", "accepted"]);
    assert_eq!(code, 0);
    assert_eq!(v["total"], 2);
    assert_eq!(v["records"].as_array().unwrap().len(), 2);

    let (_, v) = env.json(&["list", "--user", "u", "--limit", "1"]);
    assert_eq!(v["total"], 2);
    assert_eq!(v["records"].as_array().unwrap().len(), 1);

    env.run(&["list", "--consent", "f2"])
        .success()
        .stdout(predicate::str::contains("\tu\tf2\tdeclined\t"));
}

#[test]
fn test_sanitized_keys_address_same_record() {
    let env = Env::new();
    env.run(&["add", "--user", " a@b.com ", "--consent", "<b>form_1</b>", "--status", "1"])
        .success();
    env.run(&with_pair("check", &[])).success();
}

#[test]
fn test_outcome_echoes_keys_as_stored() {
    let env = Env::new();
    let raw = ["--user", " a@b.com ", "--consent", "<b>form_1</b>"];
    let (code, v) = env.json(&[&["add"][..], &raw, &["--status", "1"]].concat());
    assert_eq!(code, 0);
    assert_eq!(v["user_id"], "a@b.com");
    assert_eq!(v["consent_id"], "form_1");

    env.run(&[&["update"][..], &raw, &["--status", "0"]].concat())
        .success()
        .stdout(predicate::str::contains("user=a@b.com consent=form_1"));
}

#[test]
fn test_invalid_input_exits_with_config_error() {
    let env = Env::new();
    env.run(&["add", "--user", "   ", "--consent", "form_1", "--status", "1"])
        .code(2)
        .stderr(predicate::str::contains("user_id"));

    // clap rejects unknown status values as usage errors
    env.run(&with_pair("add", &["--status", "maybe"])).code(2);
}

fn write_config(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("consent.yaml");
    std::fs::write(&path, body).unwrap();
    path
}

#[test]
fn test_config_file_is_discovered_in_working_directory() {
    let dir = tempdir().unwrap();
    write_config(dir.path(), "storage:\n  path: from-config.db\nkeys:\n  max_len: 5\n");

    let mut cmd = Command::new(env!("CARGO_BIN_EXE_consent"));
    cmd.current_dir(dir.path())
        .env_remove("CONSENT_DB")
        .env_remove("RUST_LOG")
        .args(["add", "--user", "abcdef", "--consent", "c", "--status", "1"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("(max 5)"));

    let mut cmd = Command::new(env!("CARGO_BIN_EXE_consent"));
    cmd.current_dir(dir.path())
        .env_remove("CONSENT_DB")
        .env_remove("RUST_LOG")
        .args(["add", "--user", "abc", "--consent", "c", "--status", "1"])
        .assert()
        .success();
    assert!(dir.path().join("from-config.db").exists());
}

#[test]
fn test_unknown_config_key_is_rejected() {
    let env = Env::new();
    let cfg = write_config(env.dir.path(), "storage:\n  engine: sqlite\n");
    env.cmd()
        .arg("--config")
        .arg(&cfg)
        .args(with_pair("exists", &[]))
        .assert()
        .code(2)
        .stderr(predicate::str::contains("failed to parse config"));
}

#[test]
fn test_memory_backend_is_refused_without_db() {
    let dir = tempdir().unwrap();
    write_config(dir.path(), "storage:\n  backend: memory\n");

    let mut cmd = Command::new(env!("CARGO_BIN_EXE_consent"));
    cmd.current_dir(dir.path())
        .env_remove("CONSENT_DB")
        .env_remove("RUST_LOG")
        .args(with_pair("add", &["--status", "1"]))
        .assert()
        .code(2)
        .stderr(predicate::str::contains("memory"))
        .stdout(predicate::str::contains("consent added").not());

    // --db still wins over the configured backend
    let db = dir.path().join("explicit.db");
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_consent"));
    cmd.current_dir(dir.path())
        .env_remove("CONSENT_DB")
        .env_remove("RUST_LOG")
        .arg("--db")
        .arg(&db)
        .args(with_pair("add", &["--status", "1"]))
        .assert()
        .success();
    assert!(db.exists());
}

#[test]
fn test_db_env_var_selects_database() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("env.db");
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_consent"));
    cmd.current_dir(dir.path())
        .env("CONSENT_DB", &db)
        .env_remove("RUST_LOG")
        .args(with_pair("add", &["--status", "1"]))
        .assert()
        .success();
    assert!(db.exists());
}

#[test]
fn test_mutations_log_to_stderr_when_enabled() {
    let env = Env::new();
    env.cmd()
        .env("RUST_LOG", "consent_core=info")
        .args(with_pair("add", &["--status", "1"]))
        .assert()
        .success()
        .stderr(predicate::str::contains("consent added"))
        .stdout(
            predicate::str::contains("consent added").and(predicate::str::contains("INFO").not()),
        );
}

#[test]
fn test_version_prints_package_version() {
    Command::new(env!("CARGO_BIN_EXE_consent"))
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}
