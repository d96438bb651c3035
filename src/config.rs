//! # Broadcast Configuration
//!
//! This module defines the `.broadcast.yaml` file: which repository files come
//! from, which repositories receive them, and how content is localized for each
//! target.
//!
//! ```yaml
//! source:
//!   repo: org/template
//!   security_email: security@org.com
//! exclude: ["*.lock", "vendor/**"]
//! cache:
//!   max_size: 500
//! targets:
//!   - repo: org/service-a
//!     security_email: security@service-a.com
//!     transform:
//!       repo_name: true
//!       variables:
//!         SERVICE_NAME: service-a
//! ```
//!
//! ## Key Components
//!
//! - **`BroadcastConfig`**: The whole file. [`parse`] and [`from_file`] read it and
//!   run [`BroadcastConfig::validate`].
//! - **`TargetConfig`**: One destination repository with its own transform
//!   settings and email overrides.
//! - **`BroadcastConfig::context_for`**: Builds the per-file
//!   [`Context`](crate::transform::Context) the transformation chain consumes.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use glob::Pattern;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::regex_cache::DEFAULT_MAX_SIZE;
use crate::transform::repo::RepoName;
use crate::transform::{Context, Stages};

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = ".broadcast.yaml";

/// Complete broadcast configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BroadcastConfig {
    /// The repository files are broadcast from
    pub source: SourceConfig,
    /// Glob patterns (relative to the source root) for files that are never broadcast
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub cache: CacheConfig,
    /// Repositories that receive the files
    pub targets: Vec<TargetConfig>,
}

/// Source repository settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    /// `org/name`
    pub repo: String,
    #[serde(default)]
    pub security_email: Option<String>,
    #[serde(default)]
    pub support_email: Option<String>,
}

/// Regex cache settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    #[serde(default = "default_max_size")]
    pub max_size: usize,
    /// Patterns compiled at startup
    #[serde(default)]
    pub precompile: Vec<String>,
}

fn default_max_size() -> usize {
    DEFAULT_MAX_SIZE
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_SIZE,
            precompile: Vec::new(),
        }
    }
}

/// One target repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetConfig {
    /// `org/name`
    pub repo: String,
    #[serde(default)]
    pub security_email: Option<String>,
    #[serde(default)]
    pub support_email: Option<String>,
    #[serde(default)]
    pub transform: TransformConfig,
}

/// Per-target content transformation settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransformConfig {
    /// Rewrite references to the source repository
    #[serde(default)]
    pub repo_name: bool,
    /// Template variables substituted into `{{VAR}}` / `${VAR}` placeholders
    #[serde(default)]
    pub variables: HashMap<String, String>,
}

/// Parse and validate a YAML configuration string
pub fn parse(yaml_content: &str) -> Result<BroadcastConfig> {
    let config: BroadcastConfig = serde_yaml::from_str(yaml_content)?;
    config.validate()?;
    Ok(config)
}

/// Read, parse and validate a configuration file
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<BroadcastConfig> {
    let content = std::fs::read_to_string(path).map_err(Error::Io)?;
    parse(&content)
}

fn validate_repo(repo: &str, field: &str) -> Result<()> {
    RepoName::parse(repo).map(|_| ()).map_err(|_| Error::ConfigParse {
        message: format!("{} '{}' is not a valid repository", field, repo),
        hint: Some("Use the form org/name, e.g. 'acme/service'".to_string()),
    })
}

fn configured(email: &Option<String>) -> bool {
    email.as_deref().is_some_and(|e| !e.is_empty())
}

impl BroadcastConfig {
    /// Check repository identifiers, target uniqueness and exclude globs
    pub fn validate(&self) -> Result<()> {
        validate_repo(&self.source.repo, "source.repo")?;

        if self.targets.is_empty() {
            return Err(Error::ConfigParse {
                message: "No targets configured".to_string(),
                hint: Some("Add at least one entry under 'targets:'".to_string()),
            });
        }

        let mut seen = HashSet::new();
        for (index, target) in self.targets.iter().enumerate() {
            validate_repo(&target.repo, &format!("targets[{}].repo", index))?;
            if !seen.insert(target.repo.as_str()) {
                return Err(Error::ConfigParse {
                    message: format!("Target '{}' is listed more than once", target.repo),
                    hint: None,
                });
            }
        }

        for pattern in &self.exclude {
            Pattern::new(pattern).map_err(|err| Error::ConfigParse {
                message: format!("Invalid exclude pattern '{}': {}", pattern, err),
                hint: None,
            })?;
        }

        if self.cache.max_size == 0 {
            return Err(Error::ConfigParse {
                message: "cache.max_size must be greater than zero".to_string(),
                hint: None,
            });
        }

        Ok(())
    }

    /// Find the target for `repo`
    pub fn target(&self, repo: &str) -> Option<&TargetConfig> {
        self.targets.iter().find(|target| target.repo == repo)
    }

    /// Compiled exclude globs
    pub fn exclude_patterns(&self) -> Result<Vec<Pattern>> {
        self.exclude
            .iter()
            .map(|pattern| Pattern::new(pattern).map_err(Error::Glob))
            .collect()
    }

    /// Build the transformation context for one file of `target`
    pub fn context_for(&self, target: &TargetConfig, file_path: &str) -> Context {
        Context {
            source_repo: self.source.repo.clone(),
            target_repo: target.repo.clone(),
            file_path: file_path.to_string(),
            variables: target.transform.variables.clone(),
            source_security_email: self.source.security_email.clone(),
            target_security_email: target.security_email.clone(),
            source_support_email: self.source.support_email.clone(),
            target_support_email: target.support_email.clone(),
        }
    }

    /// Chain stages `target` needs
    pub fn stages(&self, target: &TargetConfig) -> Stages {
        let security =
            configured(&self.source.security_email) && configured(&target.security_email);
        let support = configured(&self.source.support_email) && configured(&target.support_email);

        Stages {
            emails: security || support,
            repo_name: target.transform.repo_name,
            variables: !target.transform.variables.is_empty(),
        }
    }
}
