//! Mesh Ingest - validate a mesh product file and load it into SQLite

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use mesh_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use mesh_ingest::config::parse_delimiter;
use mesh_ingest::{
    persist_batch, skip_reason, validate_file, BatchResult, ConflictMode, ErrorReport,
    IngestConfig, IngestOutcome, PersistDecision, PersistPolicy, SqliteMeshStore,
};
use std::path::{Path, PathBuf};
use std::process;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "mesh-ingest")]
#[command(author, version, about = "Validate mesh product files and load them into SQLite")]
struct Cli {
    /// Delimited input file; prompted for when omitted
    path: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long, env = "MESH_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database file
    #[arg(long)]
    database: Option<PathBuf>,

    /// Field delimiter (single character, or "tab")
    #[arg(long)]
    delimiter: Option<String>,

    /// Whether valid rows are written when other rows were rejected
    #[arg(long, value_enum)]
    policy: Option<PersistPolicy>,

    /// Behaviour when a codename is already stored
    #[arg(long, value_enum)]
    on_conflict: Option<ConflictMode>,

    /// Validate only, never open the database
    #[arg(long)]
    dry_run: bool,

    /// Report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    format: ReportFormat,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Warn
    };
    let log_config = LogConfig::builder()
        .level(level)
        .output(LogOutput::Console)
        .log_file_prefix("mesh-ingest")
        .build();

    // Environment takes precedence over flags
    let log_config = log_config.merge_env().unwrap_or_else(|e| {
        eprintln!("Warning: ignoring logging environment: {}", e);
        LogConfig::default()
    });

    // Keep the guard alive so buffered file logs are flushed on exit
    let _guard = init_logging(&log_config).ok().flatten();

    match run(&cli) {
        Ok(outcome) if outcome.is_failure() => process::exit(1),
        Ok(_) => {},
        Err(e) => {
            error!(error = %e, "Ingestion failed");
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            process::exit(1);
        },
    }
}

fn run(cli: &Cli) -> Result<IngestOutcome> {
    let config = build_config(cli)?;
    let path = match &cli.path {
        Some(path) => path.clone(),
        None => prompt_for_path()?,
    };

    info!(path = %path.display(), dry_run = cli.dry_run, "Starting ingestion");
    let result = validate_file(&path, &config)?;

    // Row errors are shown before the database is touched
    if cli.format == ReportFormat::Text {
        print_report(&result.report);
    }

    let persisted = if cli.dry_run {
        Ok(PersistDecision::DryRun)
    } else {
        match skip_reason(&result, config.policy) {
            Some(decision) => Ok(decision),
            None => write_batch(&result, &config),
        }
    };

    let (decision, failure) = match persisted {
        Ok(decision) => (decision, None),
        Err(e) => (PersistDecision::SinkFailed, Some(e)),
    };
    let outcome = IngestOutcome { result, decision };

    match cli.format {
        ReportFormat::Text => print_decision(&outcome, &config.database),
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
    }

    match failure {
        Some(e) => Err(e),
        None => Ok(outcome),
    }
}

fn write_batch(result: &BatchResult, config: &IngestConfig) -> Result<PersistDecision> {
    let mut store = SqliteMeshStore::open(&config.database)
        .with_context(|| format!("Failed to open database {}", config.database.display()))?
        .with_conflict_mode(config.on_conflict);
    Ok(persist_batch(result, config.policy, &mut store)?)
}

/// Defaults, then config file and environment, then flags
fn build_config(cli: &Cli) -> Result<IngestConfig> {
    let mut config = IngestConfig::load(cli.config.as_deref())?;

    if let Some(database) = &cli.database {
        config.database = database.clone();
    }
    if let Some(delimiter) = &cli.delimiter {
        config.delimiter = parse_delimiter(delimiter)?;
    }
    if let Some(policy) = cli.policy {
        config.policy = policy;
    }
    if let Some(mode) = cli.on_conflict {
        config.on_conflict = mode;
    }

    config.validate()?;
    Ok(config)
}

fn prompt_for_path() -> Result<PathBuf> {
    let answer = inquire::Text::new("Please enter the CSV file path:")
        .prompt()
        .context("No input file given")?;
    Ok(PathBuf::from(answer.trim()))
}

fn print_report(report: &ErrorReport) {
    if report.is_empty() {
        return;
    }
    println!("{}", "Errors encountered:".red().bold());
    for message in report.messages() {
        println!("{}", message);
    }
    println!();
}

fn print_decision(outcome: &IngestOutcome, database: &Path) {
    let summary = format!(
        "{} rows read, {} valid, {} excluded",
        outcome.result.total_rows,
        outcome.result.batch.len(),
        outcome.result.excluded_rows()
    );

    match outcome.decision {
        PersistDecision::Persisted(rows) => {
            println!(
                "{} Data ingested and validated successfully: {} rows written to {}",
                "✓".green(),
                rows,
                database.display()
            );
            println!("  {}", summary.dimmed());
        },
        PersistDecision::SkippedDueToErrors => {
            println!("{} Nothing was written ({})", "✗".red(), summary);
        },
        PersistDecision::NothingToPersist => {
            println!("{} No valid rows to write ({})", "!".yellow(), summary);
        },
        PersistDecision::DryRun => {
            println!("{} Validation only: {}", "•".cyan(), summary);
        },
        PersistDecision::SinkFailed => {
            println!("{} Writing to {} failed ({})", "✗".red(), database.display(), summary);
        },
    }
}
