// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Skillsheets and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Skillsheets CLI entrypoint.
//!
//! `check` validates a skill or bundle file, `migrate` upgrades it to the current schema,
//! `schema` prints the JSON Schema of either file shape and `migrations` lists the
//! registered migration steps.

use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use skillsheets::config::EditorConfig;
use skillsheets::loader::{LoadError, LoadOptions, PersistOutcome, SkillLoader};
use skillsheets::migrate::SchemaMigrator;
use skillsheets::model::{Bundle, SkillDocument};
use skillsheets::registry::SheetRegistry;
use skillsheets::resolve::ValidationReport;
use skillsheets::store::{FileStore, FsStore, StoreError};

#[derive(Debug, Parser)]
#[command(name = "skillsheets", version, about = "Inspect and upgrade skill sheet files")]
struct Cli {
    /// Editor config file (TOML). Defaults to $SKILLSHEETS_CONFIG.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// fsync written files and their directory.
    #[arg(long, global = true)]
    durable_writes: bool,

    /// More log output (repeatable). RUST_LOG takes precedence.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load a skill or bundle file and report validation issues.
    Check {
        path: PathBuf,
        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
        /// Skip validation.
        #[arg(long)]
        bypass: bool,
    },
    /// Upgrade a skill or bundle file (and its sibling bundle) to the current schema.
    Migrate {
        path: PathBuf,
        /// Write migrated files back instead of only reporting.
        #[arg(long)]
        write: bool,
    },
    /// Print the JSON Schema of a file shape.
    Schema {
        #[arg(value_enum, default_value_t = SchemaKind::Bundle)]
        kind: SchemaKind,
    },
    /// Print the migration table as JSON.
    Migrations,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SchemaKind {
    Bundle,
    Skill,
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => "warn",
        1 => "info,skillsheets=debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn loader(config: &EditorConfig) -> Result<SkillLoader, StoreError> {
    let store: Arc<dyn FileStore> =
        Arc::new(FsStore::new().with_durability(config.persistence.durability()));
    SkillLoader::from_config(store, config)
}

fn print_report(report: &ValidationReport, json: bool) -> Result<(), Box<dyn Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }
    for issue in report.issues() {
        let level = serde_json::to_value(issue.level)?;
        println!("{}: {}", level.as_str().unwrap_or("issue"), issue.message);
    }
    if report.ok && !report.has_warnings() {
        println!("ok");
    }
    Ok(())
}

fn run(cli: Cli) -> Result<ExitCode, Box<dyn Error>> {
    let mut config = EditorConfig::load(cli.config.as_deref())?;
    if cli.durable_writes {
        config.persistence.durable = true;
    }

    match cli.command {
        Command::Check { path, json, bypass } => {
            if bypass {
                config.validation.bypass = true;
            }
            let mut registry = SheetRegistry::new(&config.registry)
                .with_resolve_options(config.validation.resolve_options());
            let options = LoadOptions {
                auto_save: Some(false),
                ..LoadOptions::default()
            };

            match loader(&config)?.open_into(&mut registry, &path, &options) {
                Ok((_, report)) => {
                    print_report(&report, json)?;
                    Ok(ExitCode::SUCCESS)
                }
                Err(LoadError::Registry(err)) if err.report().is_some() => {
                    if let Some(report) = err.report() {
                        print_report(report, json)?;
                    }
                    Ok(ExitCode::FAILURE)
                }
                Err(err) => Err(err.into()),
            }
        }
        Command::Migrate { path, write } => {
            let options = LoadOptions {
                auto_save: Some(write),
                ..LoadOptions::default()
            };
            let loader = loader(&config)?;
            let loaded = loader.load_skill_file(&path, &options)?;

            if !loaded.migrated {
                println!("{}: up to date", path.display());
                return Ok(ExitCode::SUCCESS);
            }
            match loaded.persist {
                PersistOutcome::Written(paths) => {
                    for written in paths {
                        println!("{}: migrated", written.display());
                    }
                    Ok(ExitCode::SUCCESS)
                }
                PersistOutcome::Scheduled(paths) => {
                    let failures = loader
                        .scheduler()
                        .map(|saves| {
                            saves.flush();
                            saves.take_failures()
                        })
                        .unwrap_or_default();
                    for failure in &failures {
                        eprintln!(
                            "skillsheets: could not write {}: {}",
                            failure.path.display(),
                            failure.error
                        );
                    }
                    for written in paths
                        .iter()
                        .filter(|path| !failures.iter().any(|failure| &failure.path == *path))
                    {
                        println!("{}: migrated", written.display());
                    }
                    Ok(if failures.is_empty() {
                        ExitCode::SUCCESS
                    } else {
                        ExitCode::FAILURE
                    })
                }
                PersistOutcome::Failed { path, error } => {
                    eprintln!("skillsheets: could not write {}: {error}", path.display());
                    Ok(ExitCode::FAILURE)
                }
                PersistOutcome::Disabled | PersistOutcome::NotNeeded => {
                    println!("{}: needs migration (use --write to save)", path.display());
                    Ok(ExitCode::SUCCESS)
                }
            }
        }
        Command::Schema { kind } => {
            let schema = match kind {
                SchemaKind::Bundle => schemars::schema_for!(Bundle),
                SchemaKind::Skill => schemars::schema_for!(SkillDocument),
            };
            println!("{}", serde_json::to_string_pretty(&schema)?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Migrations => {
            let report = SchemaMigrator::builtin().report();
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("skillsheets: {err}");
            ExitCode::FAILURE
        }
    }
}
