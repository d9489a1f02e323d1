use std::path::Path;

use crate::cli::render::render;
use crate::cli::OutputFormat;
use crate::error::Result;

pub fn run(db_path: &Path, sql: &str, format: OutputFormat) -> Result<()> {
    let store = super::open_existing(db_path)?;
    let rs = store.query(sql)?;
    println!("{}", render(&rs, format)?);
    Ok(())
}
