//! # Validate Command Implementation
//!
//! This module implements the `validate` subcommand, which checks a
//! `.broadcast.yaml` file without rendering anything.
//!
//! ## Functionality
//!
//! - **Configuration Validation**: Parses the file and runs the structural
//!   checks (repository format, duplicate targets, exclude globs).
//! - **Pattern Validation**: Compiles every `cache.precompile` pattern and
//!   reports the ones that fail.
//!
//! This command is a safe, read-only operation that does not modify any files.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use repo_broadcast::config::{self, BroadcastConfig, DEFAULT_CONFIG_FILE};
use repo_broadcast::regex_cache::{PrecompileReport, RegexCache};

/// Validate a .broadcast.yaml configuration file
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to the .broadcast.yaml configuration file to validate.
    #[arg(
        short,
        long,
        value_name = "FILE",
        env = "REPO_BROADCAST_CONFIG",
        default_value = DEFAULT_CONFIG_FILE
    )]
    pub config: PathBuf,
}

/// Execute the `validate` command.
pub fn execute(args: ValidateArgs) -> Result<()> {
    let config_path = &args.config;
    println!("Validating configuration: {}", config_path.display());

    let config = match config::from_file(config_path) {
        Ok(config) => {
            println!("[OK] Configuration file parsed successfully");
            config
        }
        Err(e) => {
            println!("[ERR] Configuration parsing failed: {}", e);
            return Err(anyhow::anyhow!("Configuration parsing failed: {}", e));
        }
    };

    print_summary(&config);

    let report = precompile(&config);
    if report.is_success() {
        println!(
            "[OK] {} precompile patterns compiled",
            config.cache.precompile.len()
        );
        println!("\nConfiguration is valid");
        Ok(())
    } else {
        for failure in &report.failures {
            println!("[ERR] Pattern {:?}: {}", failure.pattern, failure.error);
        }
        Err(anyhow::anyhow!(
            "{} precompile patterns failed to compile",
            report.failures.len()
        ))
    }
}

fn print_summary(config: &BroadcastConfig) {
    println!("\nConfiguration Summary:");
    println!("   Source: {}", config.source.repo);
    println!("   Exclude patterns: {}", config.exclude.len());
    println!("   Targets: {}", config.targets.len());
    for target in &config.targets {
        let stages = config.stages(target);
        let mut enabled = vec!["binary"];
        if stages.emails {
            enabled.push("email");
        }
        if stages.repo_name {
            enabled.push("repo");
        }
        if stages.variables {
            enabled.push("template");
        }
        println!("   - {} ({})", target.repo, enabled.join(", "));
    }
}

/// Compile the configured warm-up patterns into a throwaway cache
fn precompile(config: &BroadcastConfig) -> PrecompileReport {
    let cache = RegexCache::with_max_size(config.cache.max_size);
    cache.precompile_patterns(&config.cache.precompile)
}
