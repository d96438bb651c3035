//! Transform command implementation
//!
//! Runs one file through a target's chain and writes the result to stdout.
//! Useful for checking what a broadcast would do to a single file.

use anyhow::{Context as _, Result};
use clap::Args;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use repo_broadcast::config::DEFAULT_CONFIG_FILE;
use repo_broadcast::transform::{is_binary, CancelToken};

use super::load;

/// Arguments for the transform command
#[derive(Args, Debug)]
pub struct TransformArgs {
    /// Path to config file
    #[arg(
        short,
        long,
        value_name = "PATH",
        env = "REPO_BROADCAST_CONFIG",
        default_value = DEFAULT_CONFIG_FILE
    )]
    pub config: PathBuf,

    /// Target repository (org/name)
    #[arg(short, long, value_name = "REPO")]
    pub target: String,

    /// Destination path used to pick the rewrite rules (defaults to FILE)
    #[arg(long = "as", value_name = "PATH")]
    pub as_path: Option<String>,

    /// Give up after this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// File to transform
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

/// Execute the transform command
pub fn execute(args: TransformArgs) -> Result<()> {
    let output = transform_file(&args)?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&output)?;
    stdout.flush()?;
    Ok(())
}

/// Transformed content of `args.file`
fn transform_file(args: &TransformArgs) -> Result<Vec<u8>> {
    let loaded = load(&args.config)?;
    let target = loaded.target(&args.target)?;

    let content = std::fs::read(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let path = args
        .as_path
        .clone()
        .unwrap_or_else(|| args.file.to_string_lossy().replace('\\', "/"));

    if is_binary(&path, &content) {
        log::info!("{} is binary, copying unchanged", path);
        return Ok(content);
    }

    let cancel = match args.timeout {
        Some(secs) => CancelToken::with_timeout(Duration::from_secs(secs)),
        None => CancelToken::new(),
    };
    let ctx = loaded.config.context_for(target, &path);
    let output = loaded
        .chain(target)
        .transform(&cancel, &content, &ctx)
        .with_context(|| format!("Failed to transform {}", path))?;
    Ok(output)
}
