// SPDX-License-Identifier: PMPL-1.0-or-later
//! Remediate CLI - analyze a document snapshot and print the outcome.
//!
//! The binary is a thin export stage over the library: it runs the pipeline
//! on a JSON document snapshot and prints the machine-readable result.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use remediate::capability::{Capability, HttpCapability};
use remediate::config::Config;
use remediate::document::{Document, SnapshotDocument};
use remediate::enhancer;
use remediate::issue::{self, Severity};
use remediate::pipeline;
use remediate::store::SessionStore;

/// Document accessibility analysis and remediation tracking
#[derive(Parser)]
#[command(name = "remediate")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline on a document snapshot and print issues,
    /// score, and statistics as JSON
    Analyze {
        /// JSON document snapshot to analyze
        snapshot: PathBuf,

        /// Configuration file (TOML)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Generative capability endpoint; overrides the config file
        #[arg(long, env = "REMEDIATE_AI_ENDPOINT")]
        endpoint: Option<String>,

        /// Capability API key; never read from config files
        #[arg(long, env = "REMEDIATE_AI_KEY", hide_env_values = true)]
        api_key: Option<String>,

        /// Enable verbose logging
        #[arg(long, short)]
        verbose: bool,
    },

    /// Detect and score only, without capability access
    Score {
        /// JSON document snapshot to analyze
        snapshot: PathBuf,

        /// Configuration file (TOML)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Enable verbose logging
        #[arg(long, short)]
        verbose: bool,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("remediate=debug")
    } else {
        EnvFilter::new("remediate=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<Config> {
    match path {
        Some(p) => Ok(Config::load(p)?),
        None => Ok(Config::default()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            snapshot,
            config,
            endpoint,
            api_key,
            verbose,
        } => {
            init_logging(verbose);
            let config = load_config(config.as_ref())?;
            let document = SnapshotDocument::from_path(&snapshot)?;

            let endpoint = endpoint.or_else(|| config.ai.endpoint.clone());
            let capability = match (endpoint, api_key) {
                (Some(endpoint), Some(key)) => {
                    Some(HttpCapability::new(&config.ai, &endpoint, &key)?)
                }
                _ => None,
            };
            let capability_ref = capability.as_ref().map(|c| c as &dyn Capability);

            let outcome = pipeline::run_analysis(&document, capability_ref, &config).await?;

            let mut store = SessionStore::new(document.name());
            let mut issues = outcome.issues;
            issue::sort_for_display(&mut issues);
            store.set_issues(issues)?;
            enhancer::enhance(store.issues_mut(), capability_ref, &config.ai).await;

            let report = serde_json::json!({
                "session": store.session_id(),
                "document": store.document_name(),
                "score": outcome.score,
                "statistics": store.statistics(),
                "issues": store.issues(),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);

            if store.issues().iter().any(|i| i.severity == Severity::Error) {
                std::process::exit(1);
            }
        }

        Commands::Score {
            snapshot,
            config,
            verbose,
        } => {
            init_logging(verbose);
            let config = load_config(config.as_ref())?;
            let document = SnapshotDocument::from_path(&snapshot)?;

            let outcome = pipeline::run_analysis(&document, None, &config).await?;
            println!("{}", serde_json::to_string_pretty(&outcome.score)?);
        }
    }

    Ok(())
}
