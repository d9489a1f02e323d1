use std::path::Path;

use crate::error::Result;
use crate::fmt::format_bytes;
use crate::models::Column;
use crate::settings::load_settings;
use crate::store::Store;

pub fn run(db_path: &Path) -> Result<()> {
    let settings = load_settings();

    println!("Data dir:   {}", settings.data_dir);
    println!("Database:   {}", db_path.display());
    println!("Currency:   {}", settings.currency);

    if !db_path.exists() {
        println!();
        println!("Database not found. Run `spendlens init` to set up.");
        return Ok(());
    }

    let size = std::fs::metadata(db_path)?.len();
    println!("DB size:    {}", format_bytes(size));

    let store = Store::open(db_path)?;
    println!();
    println!("Expenses:       {}", store.count()?);
    match store.date_range()? {
        Some((first, last)) => println!("Date range:     {first} .. {last}"),
        None => println!("Date range:     (empty)"),
    }
    println!("Categories:     {}", store.distinct(Column::Category)?.len());
    println!("Payment modes:  {}", store.distinct(Column::PaymentMode)?.join(", "));
    Ok(())
}
