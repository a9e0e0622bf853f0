//! Reference shell binary for the four `status`/`diff`/`sync`/`seed`
//! subcommands. This binary itself registers no resource types — a real
//! deployment forks this file (or reuses `commands`/`cli`/`seed` as a
//! library dependency) and builds its own `SchemaRegistry`/`SeedSource`
//! list from its annotated types before calling into the same functions.

mod cli;
mod commands;
mod error_presentation;
mod seed;

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;

use semitexa_core::{ConnectionConfig, OrmSettings, SchemaRegistry, SyncOptions};
use semitexa_mysql::{MysqlAdapter, MysqlConnection};

use cli::{Cli, Command};
use error_presentation::{CliError, render_runtime_error};
use seed::SeedSource;

fn main() -> ExitCode {
    env_logger::init();

    match run() {
        Ok(code) => code,
        Err(error) => {
            eprintln!("{}", render_runtime_error(error));
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode, CliError> {
    let args = Cli::parse();
    let connection_config = ConnectionConfig::from_env(running_in_container());
    let orm_settings = OrmSettings::from_env();
    let registry = SchemaRegistry::builder().build();
    let seed_sources: Vec<Box<dyn SeedSource>> = Vec::new();

    let mut reader_conn = MysqlConnection::connect(&connection_config).map_err(CliError::Connect)?;

    match args.command {
        Command::Status => {
            let server_version = reader_conn.server_version().ok();
            let adapter = build_adapter(&connection_config, orm_settings.pool_size);
            let report = commands::run_status(
                &registry,
                &mut reader_conn,
                &adapter,
                server_version,
                orm_settings.pool_size,
                &connection_config.database,
                &orm_settings.ignore_tables,
            )?;
            println!("{report}");
            Ok(ExitCode::SUCCESS)
        }
        Command::Diff => {
            match commands::run_diff(&registry, &mut reader_conn, &connection_config.database, &orm_settings.ignore_tables) {
                Ok(report) => {
                    println!("{report}");
                    Ok(ExitCode::SUCCESS)
                }
                Err(source) => Err(CliError::Core(source)),
            }
        }
        Command::Sync { dry_run, allow_destructive, output } => {
            let mut adapter = build_adapter(&connection_config, orm_settings.pool_size);
            let options = SyncOptions {
                allow_destructive,
                ignore_tables: orm_settings.ignore_tables.clone(),
                dry_run,
                ..SyncOptions::default()
            };
            let run = commands::run_sync(
                &registry,
                &mut reader_conn,
                &mut adapter,
                &connection_config.database,
                &options,
                output.as_deref(),
                Path::new("."),
            )?;
            println!("{}", run.outcome_summary);
            if let Some(path) = run.audit_path {
                println!("audit record written to {}", path.display());
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Seed => {
            let mut adapter = build_adapter(&connection_config, orm_settings.pool_size);
            let run = commands::run_seed(&mut adapter, &seed_sources)?;
            for (table, count) in run.per_table_counts {
                println!("{table}: {count} row(s) seeded");
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn build_adapter(config: &ConnectionConfig, pool_size: usize) -> MysqlAdapter {
    let config = config.clone();
    MysqlAdapter::new(pool_size, move || MysqlConnection::connect(&config))
}

fn running_in_container() -> bool {
    std::path::Path::new("/.dockerenv").exists() || std::env::var_os("KUBERNETES_SERVICE_HOST").is_some()
}
