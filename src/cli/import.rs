use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::importer::import_file;

pub fn run(db_path: &Path, file: &str) -> Result<()> {
    let path = PathBuf::from(file);
    let mut store = super::open_or_create(db_path)?;
    let result = import_file(&mut store, &path)?;

    if result.duplicate_file {
        println!("This file has already been imported (duplicate checksum). Skipping.");
        return Ok(());
    }

    println!("Imported: {}", result.imported);
    println!("Skipped:  {}", result.skipped);
    Ok(())
}
