use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::Result;
use crate::filter::Filter;
use crate::models::Expense;
use crate::settings::get_data_dir;

const HEADER: [&str; 7] = [
    "id",
    "date",
    "category",
    "payment_mode",
    "description",
    "amount",
    "cashback",
];

/// Write rows as CSV with a header line. The output re-imports cleanly.
pub fn write_expenses<W: Write>(rows: &[Expense], out: W) -> Result<usize> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(HEADER)?;
    for e in rows {
        wtr.write_record([
            e.id.to_string(),
            e.date.clone(),
            e.category.clone(),
            e.payment_mode.clone(),
            e.description.clone().unwrap_or_default(),
            format!("{:.2}", e.amount),
            format!("{:.2}", e.cashback),
        ])?;
    }
    wtr.flush()?;
    Ok(rows.len())
}

fn default_path() -> PathBuf {
    let date = chrono::Local::now().format("%Y-%m-%d").to_string();
    get_data_dir()
        .join("exports")
        .join(format!("expenses-{date}.csv"))
}

pub fn run(db_path: &Path, filter: &Filter, output: Option<String>) -> Result<()> {
    let store = super::open_existing(db_path)?;
    let rows = store.expenses(filter, None)?;

    let path = output.map(PathBuf::from).unwrap_or_else(default_path);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = std::fs::File::create(&path)?;
    let written = write_expenses(&rows, file)?;
    info!(path = %path.display(), rows = written, "export written");
    println!("Wrote {written} rows to {}", path.display());
    Ok(())
}
