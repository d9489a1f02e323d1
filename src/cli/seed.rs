use std::path::Path;

use tracing::debug;

use crate::error::Result;
use crate::settings::load_settings;
use crate::simulate::{generate, SimulationConfig};

pub fn run(
    db_path: &Path,
    count: usize,
    month: Option<u32>,
    year: i32,
    seed: Option<u64>,
) -> Result<()> {
    let config = SimulationConfig {
        count,
        month,
        year,
        seed: seed.or(load_settings().seed),
    };
    debug!(?config, "generating synthetic expenses");
    let rows = generate(&config);

    let mut store = super::open_or_create(db_path)?;
    let added = store.append_all(&rows)?;

    let scope = match month {
        Some(m) => format!("{} {year}", crate::fmt::month_name(i64::from(m))),
        None => year.to_string(),
    };
    println!("Added {added} synthetic expenses for {scope}.");
    println!("  Database: {}", db_path.display());
    println!("  Total rows: {}", store.count()?);
    println!();
    println!("Try these next:");
    println!("  spendlens dashboard");
    println!("  spendlens insights");
    println!("  spendlens insights contribution");
    Ok(())
}
