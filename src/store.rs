use std::io::Write;
use std::path::Path;

use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use tracing::{debug, info};

use crate::catalog::Statement;
use crate::db::{get_connection, init_db};
use crate::error::{ExpenseError, Result};
use crate::filter::{Filter, BASE_CONDITION};
use crate::fmt::round2;
use crate::models::{Column, Expense, NewExpense};

/// Column names plus raw cells, in the order the query produced them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl ResultSet {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn value(&self, row: usize, col: usize) -> Option<&Value> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    pub fn f64_at(&self, row: usize, col: usize) -> Option<f64> {
        match self.value(row, col)? {
            Value::Real(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            Value::Text(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub fn i64_at(&self, row: usize, col: usize) -> Option<i64> {
        match self.value(row, col)? {
            Value::Integer(i) => Some(*i),
            Value::Real(f) => Some(*f as i64),
            Value::Text(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub fn text_at(&self, row: usize, col: usize) -> Option<String> {
        match self.value(row, col)? {
            Value::Null => None,
            v => Some(cell_text(v)),
        }
    }

    pub fn write_csv<W: Write>(&self, out: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(out);
        wtr.write_record(&self.columns)?;
        for row in &self.rows {
            wtr.write_record(row.iter().map(cell_text))?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Array of objects keyed by column name.
    pub fn to_json(&self) -> serde_json::Value {
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let obj = self
                    .columns
                    .iter()
                    .zip(row)
                    .map(|(name, v)| (name.clone(), cell_json(v)))
                    .collect::<serde_json::Map<_, _>>();
                serde_json::Value::Object(obj)
            })
            .collect();
        serde_json::Value::Array(rows)
    }
}

pub fn cell_text(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::Integer(i) => i.to_string(),
        Value::Real(f) => f.to_string(),
        Value::Text(s) => s.clone(),
        Value::Blob(b) => format!("<{} bytes>", b.len()),
    }
}

fn cell_json(v: &Value) -> serde_json::Value {
    match v {
        Value::Null => serde_json::Value::Null,
        Value::Integer(i) => (*i).into(),
        Value::Real(f) => serde_json::Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::Text(s) => s.clone().into(),
        Value::Blob(b) => hex::encode(b).into(),
    }
}

/// Handle on the expense database. Callers open one per unit of work and
/// drop it when done; nothing is shared process-wide.
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = get_connection(db_path)?;
        init_db(&conn)?;
        Ok(Self { conn })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        init_db(&conn)?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Run a read-only statement. Anything SQLite reports as writing is
    /// refused before it runs.
    pub fn execute(&self, stmt: &Statement) -> Result<ResultSet> {
        self.run(&stmt.sql, &stmt.params)
    }

    /// Ad-hoc read-only SQL with no parameters.
    pub fn query(&self, sql: &str) -> Result<ResultSet> {
        self.run(sql, &[])
    }

    fn run(&self, sql: &str, params: &[Value]) -> Result<ResultSet> {
        debug!(sql, params = params.len(), "executing");
        let mut stmt = self.conn.prepare(sql)?;
        if !stmt.readonly() {
            return Err(ExpenseError::ReadOnly);
        }
        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
        let width = columns.len();
        let rows = stmt
            .query_map(params_from_iter(params.iter()), |row| {
                (0..width)
                    .map(|i| row.get::<_, Value>(i))
                    .collect::<rusqlite::Result<Vec<Value>>>()
            })?
            .collect::<std::result::Result<Vec<Vec<Value>>, _>>()?;
        debug!(rows = rows.len(), "query complete");
        Ok(ResultSet { columns, rows })
    }

    /// Validate and insert one row, returning its id.
    pub fn append(&mut self, expense: &NewExpense) -> Result<i64> {
        expense.validate()?;
        let tx = self.conn.transaction()?;
        let id = insert(&tx, expense)?;
        tx.commit()?;
        info!(id, "expense added");
        Ok(id)
    }

    /// Insert a batch atomically: either every row lands or none does.
    pub fn append_all(&mut self, expenses: &[NewExpense]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        insert_batch(&tx, expenses)?;
        tx.commit()?;
        info!(count = expenses.len(), "expenses appended");
        Ok(expenses.len())
    }

    /// Insert an imported batch together with its `imports` ledger row. If
    /// the ledger write fails none of the rows are kept.
    pub fn append_import(
        &mut self,
        expenses: &[NewExpense],
        filename: &str,
        checksum: &str,
    ) -> Result<usize> {
        let tx = self.conn.transaction()?;
        insert_batch(&tx, expenses)?;
        tx.execute(
            "INSERT INTO imports (filename, record_count, checksum) VALUES (?1, ?2, ?3)",
            rusqlite::params![filename, expenses.len() as i64, checksum],
        )?;
        tx.commit()?;
        info!(count = expenses.len(), filename, "import recorded");
        Ok(expenses.len())
    }

    pub fn expenses(&self, filter: &Filter, limit: Option<u32>) -> Result<Vec<Expense>> {
        let mut clause = filter.render(BASE_CONDITION);
        let limit_sql = match limit {
            Some(n) => format!(" LIMIT {}", clause.bind(i64::from(n))),
            None => String::new(),
        };
        let sql = format!(
            "SELECT id, date, category, payment_mode, description, amount, cashback \
             FROM expenses {} ORDER BY date, id{limit_sql}",
            clause.sql
        );
        debug!(sql, "listing expenses");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(clause.params.iter()), |row| {
                Ok(Expense {
                    id: row.get(0)?,
                    date: row.get(1)?,
                    category: row.get(2)?,
                    payment_mode: row.get(3)?,
                    description: row.get(4)?,
                    amount: row.get(5)?,
                    cashback: row.get(6)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn distinct(&self, column: Column) -> Result<Vec<String>> {
        let sql = format!(
            "SELECT DISTINCT {col} FROM expenses ORDER BY {col}",
            col = column.name()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let values = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(values)
    }

    pub fn count(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM expenses", [], |r| r.get(0))?)
    }

    /// Earliest and latest dates on record, if any.
    pub fn date_range(&self) -> Result<Option<(String, String)>> {
        let range: (Option<String>, Option<String>) = self.conn.query_row(
            "SELECT MIN(date), MAX(date) FROM expenses",
            [],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )?;
        Ok(match range {
            (Some(min), Some(max)) => Some((min, max)),
            _ => None,
        })
    }
}

/// Validate everything first so a bad row never leaves a partial batch.
fn insert_batch(conn: &Connection, expenses: &[NewExpense]) -> Result<()> {
    for e in expenses {
        e.validate()?;
    }
    for e in expenses {
        insert(conn, e)?;
    }
    Ok(())
}

fn insert(conn: &Connection, e: &NewExpense) -> Result<i64> {
    conn.execute(
        "INSERT INTO expenses (date, category, payment_mode, description, amount, cashback) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            e.date,
            e.category,
            e.payment_mode,
            e.description,
            round2(e.amount),
            round2(e.cashback)
        ],
    )?;
    Ok(conn.last_insert_rowid())
}
