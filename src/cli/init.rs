use std::path::{Path, PathBuf};

use crate::db::DB_FILE;
use crate::error::Result;
use crate::settings::{load_settings, save_settings, shellexpand_path};
use crate::store::Store;

/// With `--db`, only that database file is created and settings are left
/// alone. Otherwise the data directory is recorded in settings first.
pub fn run(data_dir: Option<String>, db_override: Option<&Path>) -> Result<()> {
    if let Some(db_path) = db_override {
        let store = super::open_or_create(db_path)?;
        println!(
            "Initialized {} ({} expenses)",
            db_path.display(),
            store.count()?
        );
        return Ok(());
    }

    let mut settings = load_settings();
    if let Some(dir) = data_dir {
        settings.data_dir = shellexpand_path(&dir);
    }
    save_settings(&settings)?;

    let resolved = PathBuf::from(&settings.data_dir);
    std::fs::create_dir_all(&resolved)?;
    std::fs::create_dir_all(resolved.join("exports"))?;

    let store = Store::open(&resolved.join(DB_FILE))?;
    println!(
        "Initialized spendlens at {} ({} expenses)",
        resolved.display(),
        store.count()?
    );
    Ok(())
}
