//! Rendering a source tree for one target
//!
//! This is the local part of a broadcast: every file of the source checkout is
//! run through the target's transformation chain and written to an output
//! directory, mirroring the source layout.
//!
//! ## Per-file flow
//!
//! 1. Skip `.git/` and anything matching an `exclude` glob. Symbolic links
//!    are never followed; they are listed in the report instead.
//! 2. Read the file. Binary files (see [`is_binary`]) are copied unchanged.
//! 3. Run the chain with a [`Context`](crate::transform::Context) built from
//!    the configuration.
//! 4. Write the result, unless this is a dry run.
//!
//! Files are processed in parallel with rayon. A failing file is recorded in
//! the [`RenderReport`] and nothing is written for it; the other files still
//! render. Files not started because of cancellation are counted as skipped.

use std::fs;
use std::path::Path;

use glob::Pattern;
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::Serialize;
use walkdir::WalkDir;

use crate::config::{BroadcastConfig, TargetConfig};
use crate::error::{Error, Result};
use crate::transform::{is_binary, CancelToken, Chain};

/// What to render and where
#[derive(Debug, Clone, Copy)]
pub struct RenderRequest<'a> {
    pub config: &'a BroadcastConfig,
    pub target: &'a TargetConfig,
    pub source_dir: &'a Path,
    pub output_dir: &'a Path,
    /// Transform without writing anything
    pub dry_run: bool,
}

/// A file that could not be rendered
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    pub path: String,
    pub reason: String,
}

/// Summary of one render run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenderReport {
    pub target: String,
    /// Files whose content changed
    pub transformed: usize,
    /// Text files the chain left as they were
    pub unchanged: usize,
    /// Binary files copied verbatim
    pub binary: usize,
    /// Files not attempted because the run was cancelled
    pub skipped: usize,
    /// Symbolic links found in the source tree; none are rendered
    pub symlinks: Vec<String>,
    pub failures: Vec<FileFailure>,
}

impl RenderReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of files considered
    pub fn total(&self) -> usize {
        self.transformed
            + self.unchanged
            + self.binary
            + self.skipped
            + self.symlinks.len()
            + self.failures.len()
    }

    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Transformed => self.transformed += 1,
            Outcome::Unchanged => self.unchanged += 1,
            Outcome::Binary => self.binary += 1,
            Outcome::Skipped => self.skipped += 1,
            Outcome::Failed(failure) => self.failures.push(failure),
        }
    }
}

#[derive(Debug)]
enum Outcome {
    Transformed,
    Unchanged,
    Binary,
    Skipped,
    Failed(FileFailure),
}

/// The entries of a source tree that are not excluded.
///
/// Paths are relative, `/`-separated and sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceFiles {
    /// Regular files to render
    pub files: Vec<String>,
    /// Symbolic links, which are not followed
    pub symlinks: Vec<String>,
}

impl SourceFiles {
    /// Number of entries a render of this tree will report
    pub fn len(&self) -> usize {
        self.files.len() + self.symlinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.symlinks.is_empty()
    }
}

/// Walk `source_dir` once, skipping `.git` and anything `excludes` matches.
pub fn collect_files(source_dir: &Path, excludes: &[Pattern]) -> Result<SourceFiles> {
    let mut source = SourceFiles::default();

    let walker = WalkDir::new(source_dir)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || entry.file_name() != ".git");

    for entry in walker {
        let entry = entry?;
        let file_type = entry.file_type();
        if !file_type.is_file() && !file_type.is_symlink() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(source_dir)
            .map_err(|_| Error::Render {
                path: entry.path().display().to_string(),
                message: "file is outside the source directory".to_string(),
            })?
            .to_string_lossy()
            .replace('\\', "/");

        if excludes.iter().any(|pattern| pattern.matches(&relative)) {
            debug!("excluded {}", relative);
            continue;
        }
        if file_type.is_symlink() {
            source.symlinks.push(relative);
        } else {
            source.files.push(relative);
        }
    }

    source.files.sort();
    source.symlinks.sort();
    Ok(source)
}

/// Render every file of the source tree for `request.target`.
///
/// Walks the tree with [`collect_files`] and hands the result to
/// [`render_files`].
pub fn render_target<F>(
    request: &RenderRequest<'_>,
    chain: &Chain,
    cancel: &CancelToken,
    on_file: F,
) -> Result<RenderReport>
where
    F: Fn(&str) + Sync,
{
    let excludes = request.config.exclude_patterns()?;
    let source = collect_files(request.source_dir, &excludes)?;
    Ok(render_files(request, &source, chain, cancel, on_file))
}

/// Render files already collected from `request.source_dir`.
///
/// `on_file` is called once per regular file after it has been handled, from
/// the worker thread that handled it. Symbolic links are reported, not read.
pub fn render_files<F>(
    request: &RenderRequest<'_>,
    source: &SourceFiles,
    chain: &Chain,
    cancel: &CancelToken,
    on_file: F,
) -> RenderReport
where
    F: Fn(&str) + Sync,
{
    info!(
        "rendering {} files for {} from {}",
        source.files.len(),
        request.target.repo,
        request.source_dir.display()
    );
    for link in &source.symlinks {
        warn!("{}: symbolic link not rendered", link);
    }

    let outcomes: Vec<Outcome> = source
        .files
        .par_iter()
        .map(|relative| {
            let outcome = render_file(request, chain, cancel, relative);
            on_file(relative);
            outcome
        })
        .collect();

    let mut report = RenderReport {
        target: request.target.repo.clone(),
        symlinks: source.symlinks.clone(),
        ..RenderReport::default()
    };
    for outcome in outcomes {
        report.record(outcome);
    }

    info!(
        "{}: {} transformed, {} unchanged, {} binary, {} skipped, {} symlinks, {} failed",
        report.target,
        report.transformed,
        report.unchanged,
        report.binary,
        report.skipped,
        report.symlinks.len(),
        report.failures.len()
    );
    report
}

fn render_file(
    request: &RenderRequest<'_>,
    chain: &Chain,
    cancel: &CancelToken,
    relative: &str,
) -> Outcome {
    if cancel.is_cancelled() {
        return Outcome::Skipped;
    }

    let failed = |reason: String| {
        warn!("{}: {}", relative, reason);
        Outcome::Failed(FileFailure {
            path: relative.to_string(),
            reason,
        })
    };

    let content = match fs::read(request.source_dir.join(relative)) {
        Ok(content) => content,
        Err(err) => return failed(format!("cannot read file: {}", err)),
    };

    let (output, outcome) = if is_binary(relative, &content) {
        (content, Outcome::Binary)
    } else {
        let ctx = request.config.context_for(request.target, relative);
        match chain.transform(cancel, &content, &ctx) {
            Ok(output) if output == content => (output, Outcome::Unchanged),
            Ok(output) => (output, Outcome::Transformed),
            Err(err) if err.is_cancelled() => return Outcome::Skipped,
            Err(err) => return failed(err.to_string()),
        }
    };

    if !request.dry_run {
        let destination = request.output_dir.join(relative);
        let written = destination
            .parent()
            .map_or(Ok(()), fs::create_dir_all)
            .and_then(|_| fs::write(&destination, &output));
        if let Err(err) = written {
            return failed(format!("cannot write {}: {}", destination.display(), err));
        }
    }

    outcome
}
