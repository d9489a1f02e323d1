use std::path::Path;

use crate::error::Result;
use crate::fmt::money;
use crate::models::{normalize_date, NewExpense};
use crate::settings::load_settings;

pub fn run(
    db_path: &Path,
    date: &str,
    category: &str,
    payment_mode: &str,
    description: Option<&str>,
    amount: f64,
    cashback: f64,
) -> Result<()> {
    let date = normalize_date(date)?;
    let mut expense = NewExpense::new(&date, category.trim(), payment_mode.trim(), amount)
        .with_cashback(cashback);
    if let Some(d) = description.filter(|d| !d.trim().is_empty()) {
        expense = expense.with_description(d.trim());
    }

    let mut store = super::open_or_create(db_path)?;
    let id = store.append(&expense)?;
    let currency = load_settings().currency;
    println!(
        "Added expense #{id}: {} {} via {} on {}",
        money(expense.amount, &currency),
        expense.category,
        expense.payment_mode,
        expense.date
    );
    Ok(())
}
