//! Tracing subscriber setup

use anyhow::{anyhow, bail, Result};
use tracing_subscriber::EnvFilter;

use scanfiler_core::config::{VALID_LOG_LEVELS, VALID_LOG_STYLES};

/// Effective level: `-v` forces debug, `-vv` trace
fn resolve_level(verbose: u8, level: &str) -> Result<String> {
    let level = match verbose {
        0 => level.to_lowercase(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    };
    if !VALID_LOG_LEVELS.contains(&level.as_str()) {
        bail!(
            "Invalid log level '{}', expected one of: {}",
            level,
            VALID_LOG_LEVELS.join(", ")
        );
    }
    Ok(level)
}

/// Initializes the global subscriber
///
/// `RUST_LOG`, when set, takes precedence over `level`. Logs go to stderr in
/// both styles so that `--json` command output on stdout stays parseable.
pub fn init(verbose: u8, level: &str, style: &str) -> Result<()> {
    let level = resolve_level(verbose, level)?;
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);

    match style {
        "plain" => builder.with_target(false).try_init(),
        "json" => builder.json().with_target(true).try_init(),
        other => bail!(
            "Invalid log style '{}', expected one of: {}",
            other,
            VALID_LOG_STYLES.join(", ")
        ),
    }
    .map_err(|e| anyhow!("Cannot initialize logging: {e}"))
}
