//! CLI argument parsing and command dispatch

use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::LevelFilter;

use repo_broadcast::redact::Redactor;
use repo_broadcast::regex_cache::RegexCache;

use crate::commands;

/// Repository Broadcast - Localize files from a template repository for its targets
#[derive(Parser, Debug)]
#[command(name = "repo-broadcast")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Set log level (off, error, warn, info, debug, trace); RUST_LOG refines it
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    log_level: LevelFilter,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Transform a single file for one target and print it to stdout
    Transform(commands::transform::TransformArgs),

    /// Render a source tree into an output directory for one target
    Render(commands::render::RenderArgs),

    /// Validate a .broadcast.yaml configuration file
    Validate(commands::validate::ValidateArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(self.log_level);

        match self.command {
            Commands::Transform(args) => commands::transform::execute(args),
            Commands::Render(args) => commands::render::execute(args),
            Commands::Validate(args) => commands::validate::execute(args),
        }
    }
}

/// Install `env_logger` on stderr, masking secrets in every record.
///
/// The redactor owns its cache so formatting a record never waits on locks
/// held by the code that emitted it.
fn init_logging(level: LevelFilter) {
    let redactor = Redactor::new(Arc::new(RegexCache::new()));

    // Fails only when a logger is already installed
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format(move |buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                redactor.redact(&record.args().to_string())
            )
        })
        .try_init();
}
