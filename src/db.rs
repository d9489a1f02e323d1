use std::path::Path;

use rusqlite::Connection;
use tracing::debug;

use crate::error::Result;

pub const DB_FILE: &str = "expenses.db";

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS expenses (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    date TEXT NOT NULL,
    category TEXT NOT NULL,
    payment_mode TEXT NOT NULL,
    description TEXT,
    amount REAL NOT NULL DEFAULT 0,
    cashback REAL NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_expenses_date ON expenses(date);
CREATE INDEX IF NOT EXISTS idx_expenses_category ON expenses(category);

CREATE TABLE IF NOT EXISTS imports (
    id INTEGER PRIMARY KEY,
    filename TEXT NOT NULL,
    import_date TEXT DEFAULT (datetime('now')),
    record_count INTEGER,
    checksum TEXT NOT NULL UNIQUE
);
";

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    debug!("Opening database at {}", db_path.display());
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        (dir, conn)
    }

    #[test]
    fn test_init_db_creates_tables() {
        let (_dir, conn) = test_db();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        for expected in &["expenses", "imports"] {
            assert!(tables.contains(&expected.to_string()), "missing table: {expected}");
        }
    }

    #[test]
    fn test_init_db_is_idempotent() {
        let (_dir, conn) = test_db();
        init_db(&conn).unwrap();
    }

    #[test]
    fn test_cashback_defaults_to_zero() {
        let (_dir, conn) = test_db();
        conn.execute(
            "INSERT INTO expenses (date, category, payment_mode, amount) VALUES ('2025-01-01', 'Food', 'Cash', 10.0)",
            [],
        )
        .unwrap();
        let cashback: f64 = conn
            .query_row("SELECT cashback FROM expenses", [], |r| r.get(0))
            .unwrap();
        assert_eq!(cashback, 0.0);
    }

    #[test]
    fn test_ids_are_monotonic() {
        let (_dir, conn) = test_db();
        for _ in 0..3 {
            conn.execute(
                "INSERT INTO expenses (date, category, payment_mode, amount) VALUES ('2025-01-01', 'Food', 'Cash', 1.0)",
                [],
            )
            .unwrap();
        }
        let ids: Vec<i64> = conn
            .prepare("SELECT id FROM expenses ORDER BY id")
            .unwrap()
            .query_map([], |r| r.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
