//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the
//! `repo-broadcast` command-line tool. Each subcommand lives in its own file.
//!
//! ## Structure
//!
//! Each command module contains:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`.
//! - An `execute` function that takes the parsed `Args` and performs the
//!   command's logic by calling into the `repo_broadcast` library.
//!
//! Loading the configuration and building a target's chain is shared by every
//! command and lives here.

pub mod render;
pub mod transform;
pub mod validate;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context as _, Result};

use repo_broadcast::config::{self, BroadcastConfig, TargetConfig};
use repo_broadcast::regex_cache::RegexCache;
use repo_broadcast::transform::{standard_chain, Chain};

/// Parsed configuration plus the regex cache sized from it
pub(crate) struct Loaded {
    pub config: BroadcastConfig,
    pub cache: Arc<RegexCache>,
}

/// Load `path` and warm a cache with its `precompile` patterns.
///
/// Precompile failures are logged, not fatal; `validate` reports them in full.
pub(crate) fn load(path: &Path) -> Result<Loaded> {
    if !path.exists() {
        anyhow::bail!("Configuration file not found: {}", path.display());
    }
    let config = config::from_file(path)
        .with_context(|| format!("Failed to load configuration {}", path.display()))?;

    let cache = Arc::new(RegexCache::with_max_size(config.cache.max_size));
    let report = cache.precompile_patterns(&config.cache.precompile);
    for failure in &report.failures {
        log::warn!(
            "precompile pattern {:?} failed: {}",
            failure.pattern,
            failure.error
        );
    }

    Ok(Loaded { config, cache })
}

impl Loaded {
    /// The configured target named `repo`
    pub fn target(&self, repo: &str) -> Result<&TargetConfig> {
        self.config.target(repo).ok_or_else(|| {
            let known: Vec<&str> = self
                .config
                .targets
                .iter()
                .map(|target| target.repo.as_str())
                .collect();
            anyhow::anyhow!(
                "Target '{}' is not configured (known targets: {})",
                repo,
                known.join(", ")
            )
        })
    }

    /// The standard chain for `target`
    pub fn chain(&self, target: &TargetConfig) -> Chain {
        standard_chain(&self.cache, self.config.stages(target))
    }
}
