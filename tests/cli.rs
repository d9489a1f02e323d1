use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

struct Env {
    home: TempDir,
    db: PathBuf,
}

impl Env {
    fn new() -> Self {
        let home = tempfile::tempdir().unwrap();
        let db = home.path().join("data").join("expenses.db");
        Self { home, db }
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("spendlens").unwrap();
        cmd.env("HOME", self.home.path())
            .env_remove("RUST_LOG")
            .arg("--db")
            .arg(&self.db);
        cmd
    }

    fn seeded() -> Self {
        let env = Self::new();
        env.cmd()
            .args(["seed", "--count", "300", "--seed", "7"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Added 300 synthetic expenses for 2025"));
        env
    }

    fn path(&self, name: &str) -> PathBuf {
        self.home.path().join(name)
    }
}

fn add(env: &Env, date: &str, category: &str, mode: &str, amount: &str) {
    env.cmd()
        .args([
            "add",
            "--date",
            date,
            "--category",
            category,
            "--payment-mode",
            mode,
            "--amount",
            amount,
        ])
        .assert()
        .success();
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

#[test]
fn read_commands_need_a_database() {
    let env = Env::new();
    env.cmd()
        .arg("dashboard")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No database found"));
}

#[test]
fn insights_without_key_lists_catalog() {
    let env = Env::seeded();
    env.cmd()
        .arg("insights")
        .assert()
        .success()
        .stdout(predicate::str::contains("contribution"))
        .stdout(predicate::str::contains("recurring-descriptions"));
}

#[test]
fn insight_by_category_as_csv() {
    let env = Env::new();
    add(&env, "2025-01-05", "Food", "Cash", "100");
    add(&env, "2025-01-10", "Food", "UPI", "50");
    add(&env, "2025-06-15", "Travel", "Cash", "200");

    env.cmd()
        .args(["insights", "by-category", "--format", "csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "category,total_spent,txn_count\nTravel,200,1\nFood,150,2",
        ));
}

#[test]
fn contribution_respects_filters() {
    let env = Env::new();
    add(&env, "2025-01-05", "Food", "Cash", "100");
    add(&env, "2025-01-10", "Food", "UPI", "50");
    add(&env, "2025-06-15", "Travel", "Cash", "200");

    env.cmd()
        .args([
            "insights",
            "contribution",
            "--payment-mode",
            "Cash",
            "--format",
            "json",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("66.67"))
        .stdout(predicate::str::contains("33.33"));
}

#[test]
fn unknown_insight_fails() {
    let env = Env::seeded();
    env.cmd()
        .args(["insights", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::starts_with("Error: Unknown insight: nope"));
}

#[test]
fn dashboard_shows_kpis() {
    let env = Env::seeded();
    env.cmd()
        .args(["dashboard", "--month", "2025-03"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Expense Overview"))
        .stdout(predicate::str::contains("Monthly Spending Trend"));
}

#[test]
fn bad_month_filter_fails() {
    let env = Env::seeded();
    env.cmd()
        .args(["list", "--month", "March"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid month"));
}

#[test]
fn query_rejects_writes() {
    let env = Env::seeded();
    env.cmd()
        .args(["query", "DELETE FROM expenses"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("read-only"));

    env.cmd()
        .args(["query", "SELECT COUNT(*) AS n FROM expenses", "--format", "csv"])
        .assert()
        .success()
        .stdout("n\n300\n");
}

#[test]
fn list_limit_must_be_numeric() {
    let env = Env::seeded();
    env.cmd()
        .args(["list", "--limit", "ten"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("non-negative integer"));

    env.cmd()
        .args(["list", "--limit", "3", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"payment_mode\""));
}

#[test]
fn add_rejects_invalid_date() {
    let env = Env::new();
    env.cmd()
        .args([
            "add",
            "--date",
            "2025-02-30",
            "--category",
            "Food",
            "--payment-mode",
            "Cash",
            "--amount",
            "10",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid date"));
}

#[test]
fn add_stores_canonical_dates() {
    let env = Env::new();
    add(&env, "2025-1-5", "Food", "Cash", "100");

    env.cmd()
        .args(["list", "--month", "2025-01", "--format", "csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2025-01-05,Food,Cash"));
    env.cmd()
        .args(["insights", "h1-vs-h2", "--format", "csv"])
        .assert()
        .success()
        .stdout("half,total_spent\nH1,100\n");
}

#[test]
fn seed_year_out_of_range_fails() {
    let env = Env::new();
    env.cmd()
        .args(["seed", "--count", "5", "--year", "12025"])
        .assert()
        .failure();
    assert!(!env.db.exists());
}

#[test]
fn export_then_import_round_trips() {
    let env = Env::new();
    add(&env, "2025-01-05", "Food", "Cash", "100");
    add(&env, "2025-03-09", "Bills", "UPI", "900");

    let out = env.path("out.csv");
    env.cmd()
        .args(["export", "--category", "Bills", "--output"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 1 rows"));
    assert!(read(&out).contains("Bills,UPI,,900.00,0.00"));

    env.cmd()
        .arg("import")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported: 1"));
    env.cmd()
        .arg("import")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("already been imported"));
}

#[test]
fn status_and_backup() {
    let env = Env::seeded();
    env.cmd()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Expenses:       300"));

    let backup = env.path("backup.db");
    env.cmd()
        .arg("backup")
        .arg("--output")
        .arg(&backup)
        .assert()
        .success();
    assert!(backup.exists());
}

#[test]
fn completions_print_script() {
    Command::cargo_bin("spendlens")
        .unwrap()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("spendlens"));
}
