//! # Repository Broadcast Library
//!
//! This library rewrites files taken from a source repository so they fit a
//! target repository. It is used by the `repo-broadcast` command-line tool,
//! which renders a source checkout once per configured target, but every stage
//! can be driven directly.
//!
//! ## Quick Example
//!
//! ```
//! use std::sync::Arc;
//! use repo_broadcast::regex_cache::RegexCache;
//! use repo_broadcast::transform::{standard_chain, CancelToken, Context, Stages};
//!
//! let cache = Arc::new(RegexCache::new());
//! let chain = standard_chain(&cache, Stages::all());
//!
//! let ctx = Context::new("org/template", "org/service", "go.mod")
//!     .with_variable("SERVICE_NAME", "service");
//! let out = chain
//!     .transform(&CancelToken::new(), b"module github.com/org/template\n", &ctx)
//!     .unwrap();
//! assert_eq!(out, b"module github.com/org/service\n");
//! ```
//!
//! ## Core Concepts
//!
//! - **Regex cache (`regex_cache`)**: A bounded, thread-safe cache of compiled
//!   patterns with hit/miss statistics, seeded with the patterns every run needs.
//! - **Transformers (`transform`)**: Single-purpose rewriters for binary
//!   detection, email addresses, repository references and template variables,
//!   composed into an ordered [`Chain`](transform::Chain).
//! - **Configuration (`config`)**: The `.broadcast.yaml` schema describing the
//!   source, its targets and per-target transform settings.
//! - **Rendering (`render`)**: Walks a source tree and writes the transformed
//!   copy for one target, in parallel.
//! - **Redaction (`redact`)**: Masks tokens and URL credentials in log output.

pub mod config;
pub mod error;
pub mod redact;
pub mod regex_cache;
pub mod render;
pub mod transform;

#[cfg(test)]
mod transform_proptest;
