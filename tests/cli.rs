use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const ACCOUNTS: &str = r#"[
  {"id": "u1", "name": "alice", "email": "alice@example.org", "admin": true,
   "last_active": 1709294400, "telegram": "@alice"},
  {"id": "u2", "name": "bob", "email": "bob@example.org", "disabled": true},
  {"id": "u3", "name": "carol", "email": "", "label": "family"},
  {"id": "u4", "name": "dave", "email": "dave@example.net", "expiry": 1893456000},
  {"id": "u5", "name": "erin", "email": "erin@example.org", "discord": "erin#1"}
]"#;

const ACTIVITY: &str = r#"{"items": [
  {"id": "a1", "type": "creation", "user_id": "u1", "username": "alice",
   "source_type": "user", "source": "u1", "source_username": "alice",
   "invite_code": "WELCOME", "time": 1704103200},
  {"id": "a2", "type": "disabled", "user_id": "u2", "username": "bob",
   "source_type": "admin", "source": "u1", "source_username": "alice",
   "time": 1706781600},
  {"id": "a3", "type": "createInvite", "invite_code": "SPRING",
   "source_type": "daemon", "time": 1711962000}
], "last_page": true}"#;

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("accounts.json"), ACCOUNTS).unwrap();
        fs::write(dir.path().join("activity.json"), ACTIVITY).unwrap();
        fs::write(dir.path().join("roster.toml"), "page_size = 2\n").unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn config(&self) -> PathBuf {
        self.path("roster.toml")
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("roster").unwrap();
        cmd.arg("--config").arg(self.config()).env_remove("RUST_LOG");
        cmd
    }
}

fn arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn local_search_keeps_loading_until_a_match_is_found() {
    let fx = Fixture::new();
    let file = fx.path("accounts.json");
    // With a page size of 2, "erin" only arrives with the third page.
    fx.cmd()
        .args(["search", arg(&file), "erin"])
        .assert()
        .success()
        .stdout(predicate::str::contains("erin"))
        .stdout(predicate::str::contains("alice").not())
        .stdout(predicate::str::contains("5 total, 5 loaded, 1 shown"));
}

#[test]
fn bool_filter_shows_a_chip() {
    let fx = Fixture::new();
    let file = fx.path("accounts.json");
    fx.cmd()
        .args(["search", arg(&file), "admin:true", "--all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("alice [admin]"))
        .stdout(predicate::str::contains("bob").not())
        .stdout(predicate::str::contains("Filters: [Admin: true]"));
}

#[test]
fn server_search_loads_only_matches() {
    let fx = Fixture::new();
    let file = fx.path("accounts.json");
    fx.cmd()
        .args(["search", arg(&file), "email:example.org", "--server"])
        .assert()
        .success()
        .stdout(predicate::str::contains("alice"))
        .stdout(predicate::str::contains("bob"))
        .stdout(predicate::str::contains("dave").not())
        .stdout(predicate::str::contains("5 total, 2 loaded, 2 shown"));
}

#[test]
fn sort_descending() {
    let fx = Fixture::new();
    let file = fx.path("accounts.json");
    let output = fx
        .cmd()
        .args(["search", arg(&file), "--sort", "name", "--desc", "--all"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let erin = stdout.find("erin").unwrap();
    let alice = stdout.find("alice").unwrap();
    assert!(erin < alice);
}

#[test]
fn unknown_sort_column_fails() {
    let fx = Fixture::new();
    let file = fx.path("accounts.json");
    fx.cmd()
        .args(["search", arg(&file), "--sort", "shoe_size"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot sort by 'shoe_size'"));
}

#[test]
fn no_matches_is_reported() {
    let fx = Fixture::new();
    let file = fx.path("accounts.json");
    fx.cmd()
        .args(["search", arg(&file), "zebra"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No matching records."));
}

#[test]
fn gated_fields_need_their_capability() {
    let fx = Fixture::new();
    let file = fx.path("accounts.json");
    // Without the capability the filter is dropped and everyone is listed.
    fx.cmd()
        .args(["search", arg(&file), "telegram:true", "--all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("bob"));

    fx.cmd()
        .args(["--capability", "telegram", "search", arg(&file), "telegram:true", "--all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("alice"))
        .stdout(predicate::str::contains("bob").not());
}

#[test]
fn activity_type_filter() {
    let fx = Fixture::new();
    let file = fx.path("activity.json");
    fx.cmd()
        .args(["search", arg(&file), "--kind", "activity", "accountDisabled:true", "--all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Account bob disabled by alice"))
        .stdout(predicate::str::contains("SPRING").not());
}

#[test]
fn activity_defaults_to_newest_first() {
    let fx = Fixture::new();
    let file = fx.path("activity.json");
    let output = fx
        .cmd()
        .args(["search", arg(&file), "--kind", "activity", "--all"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let spring = stdout.find("SPRING").unwrap();
    let welcome = stdout.find("WELCOME").unwrap();
    assert!(spring < welcome);
}

#[test]
fn fields_lists_available_filters() {
    let fx = Fixture::new();
    fx.cmd()
        .arg("fields")
        .assert()
        .success()
        .stdout(predicate::str::contains("last_active"))
        .stdout(predicate::str::contains("notify_telegram").not())
        .stdout(predicate::str::contains("Integrations"));

    fx.cmd()
        .args(["--capability", "all", "fields"])
        .assert()
        .success()
        .stdout(predicate::str::contains("notify_telegram"))
        .stdout(predicate::str::contains("referrals_enabled"));
}

#[test]
fn explain_prints_descriptors() {
    let fx = Fixture::new();
    fx.cmd()
        .args(["explain", "bob", "admin:true", "last_active:>2024-02"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Tokens"))
        .stdout(predicate::str::contains("0..3"))
        .stdout(predicate::str::contains("\"field\": \"admin\""))
        .stdout(predicate::str::contains("\"operator\": \">\""))
        .stdout(predicate::str::contains("\"month\": 2"));
}

#[test]
fn malformed_fixture_fails() {
    let fx = Fixture::new();
    let file = fx.path("broken.json");
    fs::write(&file, "{not json").unwrap();
    fx.cmd()
        .args(["search", arg(&file)])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"))
        .stderr(predicate::str::contains("broken.json"));
}
