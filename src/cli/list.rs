use std::path::Path;

use comfy_table::{Cell, CellAlignment, Table};

use crate::catalog::Count;
use crate::cli::export::write_expenses;
use crate::cli::OutputFormat;
use crate::error::Result;
use crate::filter::Filter;
use crate::fmt::money;
use crate::models::Expense;
use crate::settings::load_settings;

fn expense_table(rows: &[Expense], currency: &str) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        "ID", "Date", "Category", "Payment Mode", "Description", "Amount", "Cashback",
    ]);
    for e in rows {
        table.add_row(vec![
            Cell::new(e.id),
            Cell::new(&e.date),
            Cell::new(&e.category),
            Cell::new(&e.payment_mode),
            Cell::new(e.description.as_deref().unwrap_or("")),
            Cell::new(money(e.amount, currency)).set_alignment(CellAlignment::Right),
            Cell::new(money(e.cashback, currency)).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

pub fn run(
    db_path: &Path,
    filter: &Filter,
    limit: Option<Count>,
    format: OutputFormat,
) -> Result<()> {
    let store = super::open_existing(db_path)?;
    let rows = store.expenses(filter, limit.map(|c| c.get()))?;

    match format {
        OutputFormat::Table => {
            if rows.is_empty() {
                println!("(no rows)");
            } else {
                let currency = load_settings().currency;
                println!("{}", expense_table(&rows, &currency));
                println!("{} row(s)", rows.len());
            }
        }
        OutputFormat::Csv => {
            write_expenses(&rows, std::io::stdout().lock())?;
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
    }
    Ok(())
}
