//! # Error Handling
//!
//! This module defines the centralized error type for `repo-broadcast`. It
//! uses `thiserror` to build a single `Error` enum covering every failure the
//! transformation pipeline, the configuration loader and the renderer can
//! report.
//!
//! ## Key Components
//!
//! - **`Error`**: The main enum. Each variant carries enough context (file
//!   path, transformer name, repository identifier) for a per-file failure to
//!   be diagnosed without re-running the sync.
//!
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`.
//!
//! Cancellation is a distinct variant so the caller can treat it as "work not
//! attempted" instead of "work failed"; see [`Error::is_cancelled`].

use thiserror::Error;

/// Main error type for repo-broadcast operations
#[derive(Error, Debug)]
pub enum Error {
    /// A repository identifier did not split into exactly `org/name`.
    #[error("Invalid repository format: '{repo}' (expected org/name)")]
    InvalidRepoFormat { repo: String },

    /// A transformer in a chain failed. Wraps the underlying error with the
    /// transformer's name and the file being processed.
    #[error("Transformer '{transformer}' failed for {path}: {source}")]
    Transform {
        transformer: String,
        path: String,
        #[source]
        source: Box<Error>,
    },

    /// The chain observed a cancellation signal before running a transformer.
    #[error("Transformation of {path} cancelled before '{transformer}'")]
    Cancelled { transformer: String, path: String },

    /// An error occurred while parsing or validating the broadcast configuration.
    ///
    /// Optionally carries a hint about how to fix it.
    #[error("Configuration parsing error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    ConfigParse {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// A file could not be rendered into the output tree.
    #[error("Render error: {path} - {message}")]
    Render { path: String, message: String },

    /// An error indicating that a lock has been poisoned.
    #[error("Lock poisoned: {context}")]
    LockPoisoned { context: String },

    /// A regular expression error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A glob pattern error, wrapped from `glob::PatternError`.
    #[error("Glob pattern error: {0}")]
    Glob(#[from] glob::PatternError),

    /// A directory traversal error, wrapped from `walkdir::Error`.
    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

impl Error {
    /// Returns true when this error (or the error a chain wrapped) is a
    /// cancellation rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        match self {
            Error::Cancelled { .. } => true,
            Error::Transform { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
