//! scanfiler - classify scanned documents and file them in the cloud
//!
//! Two modes:
//! - `scanfiler classify <file>` (or just `scanfiler <file>`) runs OCR and
//!   classification on a local file and prints the result
//! - `scanfiler --daemon` watches the FTP drop folders and files every new
//!   scan in the owner's cloud storage

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;

use scanfiler_core::config::Config;

mod commands;
mod logging;
mod output;

use commands::{classify::ClassifyCommand, daemon::DaemonCommand};
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(
    name = "scanfiler",
    version,
    about = "Classify scanned documents with OCR and an LLM and file them in the cloud",
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Log level: trace, debug, info, warn or error
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log style: plain or json
    #[arg(long, global = true)]
    log_style: Option<String>,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Watch the remote folders and process new files
    #[arg(short, long)]
    daemon: bool,

    /// Document to classify
    file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Classify the content of a scanned document
    #[command(visible_alias = "c")]
    Classify(ClassifyCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // A missing .env is fine; a broken one is worth a warning once logging is up
    let dotenv = dotenvy::dotenv().err().filter(|e| !e.not_found());

    let default_path = Config::default_path();
    let config_path = cli.config.clone().unwrap_or(default_path);
    let config = load_config(&config_path, cli.config.is_some())?;
    logging::init(
        cli.verbose,
        cli.log_level.as_deref().unwrap_or(&config.logging.level),
        cli.log_style.as_deref().unwrap_or(&config.logging.style),
    )?;
    debug!(path = %config_path.display(), "Configuration loaded");
    if let Some(e) = dotenv {
        tracing::warn!(error = %e, "Cannot load .env file");
    }

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };

    if cli.daemon {
        return DaemonCommand.execute(config).await;
    }

    match (cli.command, cli.file) {
        (Some(Commands::Classify(cmd)), _) => cmd.execute(&config, format).await,
        (None, Some(file)) => {
            ClassifyCommand { file, lang: None }
                .execute(&config, format)
                .await
        }
        (None, None) => bail!("No file provided"),
    }
}

/// Loads the config file and applies environment overrides
///
/// An explicitly requested file must exist; the default location is
/// optional. A file that exists but does not parse is always fatal.
fn load_config(path: &Path, explicit: bool) -> Result<Config> {
    let loaded = if explicit {
        Config::load(path)
    } else {
        Config::load_or_default(path)
    };
    let mut config =
        loaded.with_context(|| format!("Cannot load config file {}", path.display()))?;
    config.apply_env();
    Ok(config)
}
