//! e-Requesting CLI
//!
//! Validates the records in a JSON bundle and runs fulfillment passes over it.
//!
//! Usage:
//!   erequest validate --bundle records.json
//!   erequest validate --bundle records.json --type task --shallow --json
//!   erequest process --bundle records.json --filler lab --write
//!
//! Exit status is 0 when every record validated, 1 when any record failed
//! validation, and 2 on any other error.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use erequest_validator::{
    AppConfig, FulfillmentProcessor, MemoryRepository, RecordRepository, RecordType,
    ValidatorResponse, ValidatorSet,
};

#[derive(Parser, Debug)]
#[command(name = "erequest")]
#[command(version)]
#[command(about = "Validate pathology e-requesting records and process fulfillment tasks")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// YAML configuration file
    #[arg(long, short = 'c', global = true, env = "EREQUEST_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate every record in a bundle
    Validate {
        /// JSON record bundle (defaults to the configured bundle)
        #[arg(long, short = 'b')]
        bundle: Option<PathBuf>,

        /// Only validate records of this type (task, request, subject, ...)
        #[arg(long = "type", short = 't')]
        record_type: Option<RecordType>,

        /// Check reference presence only, without resolving targets
        #[arg(long)]
        shallow: bool,

        /// Print the results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Accept or reject the requested tasks owned by a filler organization
    Process {
        /// JSON record bundle (defaults to the configured bundle)
        #[arg(long, short = 'b')]
        bundle: Option<PathBuf>,

        /// Filler organization id (defaults to the configured filler)
        #[arg(long, short = 'f')]
        filler: Option<String>,

        /// Save the updated tasks back to the bundle
        #[arg(long)]
        write: bool,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RecordReport<'a> {
    record_type: RecordType,
    id: &'a str,
    #[serde(flatten)]
    response: ValidatorResponse,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = match AppConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(2);
        }
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let result = match cli.command {
        Commands::Validate {
            bundle,
            record_type,
            shallow,
            json,
        } => cmd_validate(&config, bundle, record_type, shallow, json).await,
        Commands::Process {
            bundle,
            filler,
            write,
        } => cmd_process(&config, bundle, filler, write).await,
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

fn bundle_path(config: &AppConfig, flag: Option<PathBuf>) -> Result<PathBuf> {
    flag.or_else(|| config.bundle.clone())
        .context("no bundle given; pass --bundle or set EREQUEST_BUNDLE")
}

async fn load_bundle(path: &PathBuf) -> Result<MemoryRepository> {
    MemoryRepository::load(path)
        .await
        .with_context(|| format!("failed to load bundle {}", path.display()))
}

/// Returns whether every selected record is valid
async fn cmd_validate(
    config: &AppConfig,
    bundle: Option<PathBuf>,
    record_type: Option<RecordType>,
    shallow: bool,
    json: bool,
) -> Result<bool> {
    let path = bundle_path(config, bundle)?;
    let repository = load_bundle(&path).await?;
    let deep = config.deep_validation && !shallow;
    let validators = ValidatorSet::new();

    let records = repository.snapshot().await.records;
    let selected: Vec<_> = records
        .iter()
        .filter(|r| record_type.map_or(true, |t| r.record_type() == t))
        .collect();
    info!(path = %path.display(), records = selected.len(), deep, "Validating bundle");

    let mut invalid = 0;
    let mut reports = Vec::with_capacity(selected.len());
    for record in selected {
        let repo: Option<&dyn RecordRepository> = if deep { Some(&repository) } else { None };
        let response = validators
            .validate_record(record, repo)
            .await
            .with_context(|| format!("validating {}/{}", record.record_type(), record.id()))?;
        if !response.is_valid() {
            invalid += 1;
        }

        if json {
            reports.push(RecordReport {
                record_type: record.record_type(),
                id: record.id(),
                response,
            });
        } else {
            println!("{}/{}: {}", record.record_type(), record.id(), response);
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }
    info!(invalid, "Validation complete");
    Ok(invalid == 0)
}

async fn cmd_process(
    config: &AppConfig,
    bundle: Option<PathBuf>,
    filler: Option<String>,
    write: bool,
) -> Result<bool> {
    let path = bundle_path(config, bundle)?;
    let filler = filler
        .or_else(|| config.filler_organization.clone())
        .context("no filler organization given; pass --filler or set EREQUEST_FILLER")?;
    let repository = load_bundle(&path).await?;

    let summary = FulfillmentProcessor::default()
        .process(&repository, &filler)
        .await
        .with_context(|| format!("fulfillment pass for {} failed", filler))?;

    for outcome in &summary.outcomes {
        println!("Task/{}: {} ({})", outcome.task_id, outcome.status, outcome.reason);
    }
    println!("accepted: {}, rejected: {}", summary.accepted, summary.rejected);

    if write {
        repository
            .save(&path)
            .await
            .with_context(|| format!("failed to write bundle {}", path.display()))?;
        info!(path = %path.display(), "Bundle updated");
    }
    Ok(true)
}
