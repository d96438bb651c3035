//! Render command implementation
//!
//! Renders a whole source checkout for one target:
//! 1. Load the configuration and warm the regex cache
//! 2. Build the target's chain
//! 3. Walk the tree once, then transform and write it in parallel
//! 4. Report counts (or JSON with `--json`) and fail if any file failed

use anyhow::Result;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use repo_broadcast::config::DEFAULT_CONFIG_FILE;
use repo_broadcast::regex_cache::CacheStats;
use repo_broadcast::render::{collect_files, render_files, RenderReport, RenderRequest};
use repo_broadcast::transform::CancelToken;

use super::load;

/// Arguments for the render command
#[derive(Args, Debug)]
pub struct RenderArgs {
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

    /// Source checkout to render
    #[arg(short, long, value_name = "DIR")]
    pub source: PathBuf,

    /// Directory the rendered files are written to
    #[arg(short, long, value_name = "DIR")]
    pub output: PathBuf,

    /// Show what would be done without writing files
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Stop starting new files after this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

/// JSON output of `render --json`
#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    #[serde(flatten)]
    report: &'a RenderReport,
    dry_run: bool,
    cache: CacheStats,
    elapsed_ms: u128,
}

/// Execute the render command
pub fn execute(args: RenderArgs) -> Result<()> {
    let start_time = Instant::now();

    let loaded = load(&args.config)?;
    let target = loaded.target(&args.target)?;
    if !args.source.is_dir() {
        anyhow::bail!("Source directory not found: {}", args.source.display());
    }

    let request = RenderRequest {
        config: &loaded.config,
        target,
        source_dir: &args.source,
        output_dir: &args.output,
        dry_run: args.dry_run,
    };
    let cancel = match args.timeout {
        Some(secs) => CancelToken::with_timeout(Duration::from_secs(secs)),
        None => CancelToken::new(),
    };
    let chain = loaded.chain(target);

    let source = collect_files(&args.source, &loaded.config.exclude_patterns()?)?;
    let progress = if args.json {
        ProgressBar::hidden()
    } else {
        progress_bar(source.files.len() as u64)
    };

    let report = render_files(&request, &source, &chain, &cancel, |path| {
        progress.set_message(path.to_string());
        progress.inc(1);
    });
    progress.finish_and_clear();

    if args.json {
        let json = JsonReport {
            report: &report,
            dry_run: args.dry_run,
            cache: loaded.cache.stats(),
            elapsed_ms: start_time.elapsed().as_millis(),
        };
        println!("{}", serde_json::to_string_pretty(&json)?);
    } else {
        print_summary(&args, &report, start_time.elapsed());
    }

    if !report.is_success() {
        anyhow::bail!(
            "{} of {} files failed to render",
            report.failures.len(),
            report.total()
        );
    }
    Ok(())
}

fn progress_bar(total: u64) -> ProgressBar {
    let bar = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::with_template("{bar:30} {pos}/{len} {wide_msg}") {
        bar.set_style(style);
    }
    bar
}

fn print_summary(args: &RenderArgs, report: &RenderReport, elapsed: Duration) {
    if args.dry_run {
        println!("DRY RUN - no files written");
    }
    println!(
        "Rendered {} for {} in {:.2}s",
        args.source.display(),
        report.target,
        elapsed.as_secs_f64()
    );
    println!("   {} transformed", report.transformed);
    println!("   {} unchanged", report.unchanged);
    println!("   {} binary", report.binary);
    if report.skipped > 0 {
        println!("   {} skipped", report.skipped);
    }
    for link in &report.symlinks {
        println!("   symlink not rendered: {}", link);
    }
    for failure in &report.failures {
        println!("   failed: {}: {}", failure.path, failure.reason);
    }
    if !args.dry_run {
        println!("   Files written to: {}", args.output.display());
    }
}
