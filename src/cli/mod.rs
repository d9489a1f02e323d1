pub mod add;
pub mod backup;
pub mod dashboard;
pub mod export;
pub mod import;
pub mod init;
pub mod insights;
pub mod list;
pub mod query;
pub mod render;
pub mod seed;
pub mod status;

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::filter::LevelFilter;

use crate::catalog::Count;
use crate::error::{ExpenseError, Result};
use crate::filter::Filter;
use crate::settings::resolve_db_path;
use crate::store::Store;

#[derive(Parser)]
#[command(
    name = "spendlens",
    about = "Personal expense analytics: synthetic data, SQL insights, dashboards and CSV export."
)]
pub struct Cli {
    /// Database file (default: <data_dir>/expenses.db)
    #[arg(long, global = true)]
    pub db: Option<String>,

    /// Log verbosity when RUST_LOG is not set
    #[arg(long = "log-level", global = true, default_value_t = LevelFilter::WARN)]
    pub log_level: LevelFilter,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn db_path(&self) -> PathBuf {
        resolve_db_path(self.db.as_deref())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Csv,
    Json,
}

/// Row filters shared by every reporting command.
#[derive(Args, Clone, Debug, Default)]
pub struct FilterArgs {
    /// Only this category
    #[arg(long)]
    pub category: Option<String>,
    /// Only this payment mode
    #[arg(long = "payment-mode")]
    pub payment_mode: Option<String>,
    /// Only this month: YYYY-MM
    #[arg(long)]
    pub month: Option<String>,
    /// Extra SQL condition, e.g. "amount > 1000" (trusted input)
    #[arg(long = "where")]
    pub where_clause: Option<String>,
}

impl FilterArgs {
    pub fn to_filter(&self) -> Result<Filter> {
        let mut filter = Filter::new();
        if let Some(c) = &self.category {
            filter = filter.category(c);
        }
        if let Some(p) = &self.payment_mode {
            filter = filter.payment_mode(p);
        }
        if let Some(m) = &self.month {
            filter = filter.month(m)?;
        }
        if let Some(w) = &self.where_clause {
            filter = filter.and_raw(w);
        }
        Ok(filter)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Choose a data directory and create the database.
    Init {
        /// Path for spendlens data (default: ~/Documents/spendlens)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Load synthetic expenses.
    Seed {
        /// Number of rows to generate
        #[arg(long, default_value_t = crate::simulate::DEFAULT_COUNT)]
        count: usize,
        /// Put every row in this month (1-12)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
        month: Option<u32>,
        /// Calendar year for generated dates
        #[arg(
            long,
            default_value_t = crate::simulate::DEFAULT_YEAR,
            value_parser = clap::value_parser!(i32).range(1..=9999)
        )]
        year: i32,
        /// RNG seed for reproducible data
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Add a single expense.
    Add {
        /// Date: YYYY-MM-DD
        #[arg(long)]
        date: String,
        #[arg(long)]
        category: String,
        #[arg(long = "payment-mode")]
        payment_mode: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        amount: f64,
        #[arg(long, default_value_t = 0.0)]
        cashback: f64,
    },
    /// Import expenses from a CSV file.
    Import {
        /// CSV with Date, Category, Payment_Mode, Description, Amount_Paid, Cashback
        file: String,
    },
    /// KPIs and charts for the filtered expenses.
    Dashboard {
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// List the available insights, or run one by key.
    Insights {
        /// Insight key (omit to list all)
        key: Option<String>,
        #[command(flatten)]
        filters: FilterArgs,
        /// Row limit for top-N insights
        #[arg(long)]
        limit: Option<Count>,
        /// Threshold for recurring insights
        #[arg(long = "min-occurrences")]
        min_occurrences: Option<Count>,
        /// Category list for category-months, comma separated
        #[arg(long, value_delimiter = ',')]
        categories: Vec<String>,
        /// Category for weekend-split and payment-split
        #[arg(long = "for-category")]
        for_category: Option<String>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Run a read-only SQL query against the expenses table.
    Query {
        sql: String,
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Show raw expense rows.
    List {
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long)]
        limit: Option<Count>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Write the filtered expenses to CSV.
    Export {
        #[command(flatten)]
        filters: FilterArgs,
        /// Output path (default: <data_dir>/exports/expenses-YYYY-MM-DD.csv)
        #[arg(long)]
        output: Option<String>,
    },
    /// Show database location and summary statistics.
    Status,
    /// Back up the database.
    Backup {
        /// Output path (default: <data_dir>/backups/expenses-YYYYMMDD-HHMMSS.db)
        #[arg(long)]
        output: Option<String>,
    },
    /// Print a shell completion script.
    Completions {
        shell: clap_complete::Shell,
    },
}

/// Open the store, refusing to silently create a database for read commands.
pub(crate) fn open_existing(db_path: &Path) -> Result<Store> {
    if !db_path.exists() {
        return Err(ExpenseError::Settings(format!(
            "No database found at {}\nRun `spendlens init` or `spendlens seed` first.",
            db_path.display()
        )));
    }
    Store::open(db_path)
}

/// Open the store for writing, creating the file and its directory if needed.
pub(crate) fn open_or_create(db_path: &Path) -> Result<Store> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Store::open(db_path)
}
