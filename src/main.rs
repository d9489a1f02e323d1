mod catalog;
mod cli;
mod db;
mod error;
mod filter;
mod fmt;
mod importer;
mod models;
mod settings;
mod simulate;
mod store;

use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use tracing::debug;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use catalog::InsightParams;
use cli::{Cli, Commands};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logger(cli.log_level);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            debug!("exiting with error: {e:?}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> error::Result<()> {
    let db_path = cli.db_path();

    match cli.command {
        Commands::Init { data_dir } => {
            let db_override = cli.db.as_ref().map(|_| db_path.as_path());
            cli::init::run(data_dir, db_override)
        }
        Commands::Seed {
            count,
            month,
            year,
            seed,
        } => cli::seed::run(&db_path, count, month, year, seed),
        Commands::Add {
            date,
            category,
            payment_mode,
            description,
            amount,
            cashback,
        } => cli::add::run(
            &db_path,
            &date,
            &category,
            &payment_mode,
            description.as_deref(),
            amount,
            cashback,
        ),
        Commands::Import { file } => cli::import::run(&db_path, &file),
        Commands::Dashboard { filters } => cli::dashboard::run(&db_path, &filters.to_filter()?),
        Commands::Insights {
            key,
            filters,
            limit,
            min_occurrences,
            categories,
            for_category,
            format,
        } => {
            let params = InsightParams {
                limit,
                min_occurrences,
                categories,
                category: for_category,
            };
            cli::insights::run(
                &db_path,
                key.as_deref(),
                &filters.to_filter()?,
                params,
                format,
            )
        }
        Commands::Query { sql, format } => cli::query::run(&db_path, &sql, format),
        Commands::List {
            filters,
            limit,
            format,
        } => cli::list::run(&db_path, &filters.to_filter()?, limit, format),
        Commands::Export { filters, output } => {
            cli::export::run(&db_path, &filters.to_filter()?, output)
        }
        Commands::Status => cli::status::run(&db_path),
        Commands::Backup { output } => cli::backup::run(&db_path, output),
        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                env!("CARGO_BIN_NAME"),
                &mut std::io::stdout(),
            );
            Ok(())
        }
    }
}

/// Honors `RUST_LOG` when set; otherwise logs this crate at `level` to stderr.
fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => EnvFilter::from_default_env(),
        None => EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), level)),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
