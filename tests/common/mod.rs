//! Shared test utilities for integration and E2E tests.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_config(configs::SERVICE);
//!     // ... test code
//! }
//! ```

use assert_fs::prelude::*;
use std::path::{Path, PathBuf};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_cmd::cargo::cargo_bin_cmd;
    #[allow(unused_imports)]
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::configs;
    pub use super::TestFixture;
}

/// Common configuration YAML snippets for testing.
#[allow(dead_code)]
pub mod configs {
    /// Template repository broadcast to one service, every stage enabled.
    pub const SERVICE: &str = r#"
source:
  repo: org/go-broadcast
  security_email: go-broadcast@example.com
exclude: ["*.lock"]
targets:
  - repo: acme/service
    security_email: security@service.com
    transform:
      repo_name: true
      variables:
        SERVICE_NAME: service
"#;

    /// Configuration with a precompile pattern that does not compile.
    pub const BAD_PRECOMPILE: &str = r#"
source:
  repo: org/template
cache:
  precompile: ['TODO\(\w+\)', '(unclosed']
targets:
  - repo: org/service
"#;

    /// Source repository without the org part.
    pub const BAD_REPO: &str = r#"
source:
  repo: template
targets:
  - repo: org/service
"#;

    /// Invalid YAML for error testing.
    pub const INVALID_YAML: &str = "source: [unclosed";
}

/// A temporary directory holding a `.broadcast.yaml` and a `source/` tree.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Add a `.broadcast.yaml` configuration file with the given content.
    pub fn with_config(self, content: &str) -> Self {
        self.temp_dir
            .child(".broadcast.yaml")
            .write_str(content)
            .expect("Failed to write config file");
        self
    }

    /// Add a file under `source/`.
    #[allow(dead_code)]
    pub fn with_source_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child("source")
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Add a binary file under `source/`.
    #[allow(dead_code)]
    pub fn with_binary_source_file(self, path: &str, content: &[u8]) -> Self {
        self.temp_dir
            .child("source")
            .child(path)
            .write_binary(content)
            .expect("Failed to write binary file");
        self
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Get the path to the config file.
    #[allow(dead_code)]
    pub fn config_path(&self) -> PathBuf {
        self.temp_dir.path().join(".broadcast.yaml")
    }

    #[allow(dead_code)]
    pub fn source_dir(&self) -> PathBuf {
        self.temp_dir.path().join("source")
    }

    #[allow(dead_code)]
    pub fn output_dir(&self) -> PathBuf {
        self.temp_dir.path().join("out")
    }

    /// Create a child path in the temp directory.
    #[allow(dead_code)]
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
