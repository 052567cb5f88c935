//! ckanpub - publish a Data Package bundle to a CKAN catalog
//!
//! Loads the bundle, patches the dataset metadata and uploads the primary
//! resource. Confirmations go to stdout; logs go to stderr.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use ckanpub_core::catalog::CkanClient;
use ckanpub_core::config::PublishConfig;
use ckanpub_core::publish::{PublishEvent, PublishOutcome, PublishRequest, Publisher};

/// Log levels
#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Accepts only paths that exist on disk
fn existing_path(s: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(s);
    if path.exists() {
        Ok(path)
    } else {
        Err(format!("Path '{s}' does not exist"))
    }
}

#[derive(Parser, Debug)]
#[clap(
    name = "ckanpub",
    about = "Publish a Data Package bundle to a CKAN catalog",
    version
)]
struct Cli {
    /// CKAN base URL
    #[clap(long, env = "CKANURL")]
    ckan: String,

    /// Bundle directory or datapackage.json file
    #[clap(long, value_parser = existing_path)]
    datapackage: PathBuf,

    /// CKAN API key used for package and resource writes
    #[clap(long, env = "CKANAPIKEY", hide_env_values = true)]
    ckanapikey: Option<String>,

    /// Load and map the bundle without contacting the catalog
    #[clap(long)]
    dry: bool,

    /// Print the package payload as JSON
    #[clap(long)]
    verbose: bool,

    /// Configuration file (defaults to the global config, if any)
    #[clap(long)]
    config: Option<PathBuf>,

    /// Delimiter joining years and dimension values
    #[clap(long)]
    delimiter: Option<String>,

    /// Add a "Source" extra resolved from the source code
    #[clap(long)]
    with_source: bool,

    /// Set log level
    #[clap(long, default_value = "warn")]
    log_level: LogLevel,
}

/// Initialize tracing with the CLI log level
///
/// `RUST_LOG` directives are layered on top of `--log-level`.
fn initialize_tracing(log_level: &LogLevel) {
    let mut filter = EnvFilter::new(log_level.to_filter_directive());

    if let Ok(env) = std::env::var(EnvFilter::DEFAULT_ENV) {
        for directive in env.split(',').filter(|d| !d.trim().is_empty()) {
            if let Ok(parsed) = directive.trim().parse() {
                filter = filter.add_directive(parsed);
            }
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr) // stdout is reserved for confirmations
        .init();
}

/// Resolve the effective configuration: file first, then flag overrides
fn resolve_config(cli: &Cli) -> Result<PublishConfig> {
    let mut config = PublishConfig::load(cli.config.as_deref())?;

    if let Some(delimiter) = &cli.delimiter {
        config.extras.delimiter = delimiter.clone();
    }
    if cli.with_source {
        config.extras.include_source = true;
    }

    config.validate()?;
    debug!("Effective configuration: {:?}", config);
    Ok(config)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    initialize_tracing(&cli.log_level);

    let config = resolve_config(&cli)?;
    let client = CkanClient::new(&cli.ckan, cli.ckanapikey.clone(), &config.http)?;
    let publisher = Publisher::new(client, config.extras);

    let request = PublishRequest {
        ckan_url: cli.ckan.clone(),
        bundle: cli.datapackage.clone(),
        dry_run: cli.dry,
    };

    let outcome = publisher
        .publish(&request, &mut |event| match event {
            PublishEvent::MetadataPatched { title } => println!("{title} Created"),
            PublishEvent::ResourceUploaded { path, .. } => println!("{path} Uploaded"),
        })
        .await
        .with_context(|| format!("Failed to publish {}", cli.datapackage.display()))?;

    if cli.verbose {
        println!("{}", serde_json::to_string_pretty(outcome.upload())?);
    }

    if let PublishOutcome::DryRun { upload } = &outcome {
        debug!("Dry run complete for '{}'", upload.name);
    }

    Ok(())
}
