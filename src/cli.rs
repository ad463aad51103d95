use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::Config;
use crate::executor::DispatcherBuilder;
use crate::store::{ActionStore, MemoryValueStore};
use crate::types::{DispatchContext, DispatchRequest, ProgramFile};
use crate::validator::{self, Severity};

#[derive(Parser)]
#[command(name = "action")]
#[command(about = "Action - run and check compiled action programs", long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default search)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Dispatch one action from a program file and print the results
    Run {
        /// Compiled program file (JSON)
        file: PathBuf,

        /// Action to dispatch
        action_id: String,

        /// Dispatch context (JSON object string)
        #[arg(long, default_value = "{}")]
        context: String,

        /// Event payload (JSON string)
        #[arg(long, default_value = "null")]
        payload: String,

        /// Seed the in-memory value store from a JSON file of `{collection: {id: doc}}`
        #[arg(long)]
        data: Option<PathBuf>,
    },

    /// Check a program file for broken references
    Validate {
        /// Compiled program file (JSON)
        file: PathBuf,
    },

    /// Print the effective configuration
    Config,
}

/// Run the CLI by parsing process arguments
pub async fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    run_cli_with_args(cli).await
}

/// Run the CLI with provided arguments
pub async fn run_cli_from_args(args: Vec<String>) -> Result<()> {
    let cli = Cli::parse_from(args);
    run_cli_with_args(cli).await
}

async fn run_cli_with_args(cli: Cli) -> Result<()> {
    // Load config before anything else so errors surface before any output
    let config = Config::builder().config_path(cli.config.clone()).build()?;
    init_tracing(&config);

    match cli.command {
        Commands::Run {
            file,
            action_id,
            context,
            payload,
            data,
        } => {
            let (store, overrides) = ActionStore::load(&file)?;

            let context: DispatchContext =
                serde_json::from_str(&context).context("Invalid --context JSON")?;
            let payload: JsonValue =
                serde_json::from_str(&payload).context("Invalid --payload JSON")?;

            let values = match data {
                Some(path) => MemoryValueStore::from_json(&read_json(&path)?),
                None => MemoryValueStore::new(),
            };
            let values = Arc::new(values);

            let dispatcher = DispatcherBuilder::new()
                .store(store)
                .overrides(overrides)
                .values(values.clone())
                .config(config.engine.clone())
                .build();

            let outcome = dispatcher
                .try_dispatch(&action_id, DispatchRequest::new(context, payload))
                .await?;

            println!("{}", serde_json::to_string_pretty(&outcome)?);
            let snapshot = values.snapshot();
            if snapshot.as_object().is_some_and(|m| !m.is_empty()) {
                eprintln!("\nValues:");
                eprintln!("{}", serde_json::to_string_pretty(&snapshot)?);
            }

            if let Some(err) = outcome.error {
                anyhow::bail!("Action '{}' failed: {}", action_id, err);
            }
        }

        Commands::Validate { file } => {
            let program: ProgramFile = serde_json::from_value(read_json(&file)?)
                .with_context(|| format!("Invalid program file {}", file.display()))?;

            let findings = validator::validate_program_file(&program);
            if findings.is_empty() {
                println!("✓ {} is valid", file.display());
                return Ok(());
            }

            for finding in &findings {
                println!("{}", finding);
            }

            let errors = findings
                .iter()
                .filter(|f| f.severity == Severity::Error)
                .count();
            println!(
                "\n{} error(s), {} warning(s)",
                errors,
                findings.len() - errors
            );
            if errors > 0 {
                anyhow::bail!("{} has {} validation error(s)", file.display(), errors);
            }
        }

        Commands::Config => {
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}

/// `RUST_LOG` wins; otherwise use the configured level
fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log.level));

    // Ignore the error when a subscriber is already installed
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn read_json(path: &Path) -> Result<JsonValue> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&source).with_context(|| format!("Invalid JSON in {}", path.display()))
}
