//! bincmp: binary file comparison CLI
//!
//! Usage:
//!   bincmp [-l] FILE1 FILE2           - byte-level comparison of two files
//!   bincmp [-l] REFERENCE A B         - do A and B deviate from REFERENCE alike?
//!
//! A finished comparison exits 0 whatever the verdict; the verdict is on stdout.
//! Usage errors and I/O failures exit non-zero.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use bincmp_core::config::BincmpConfig;
use bincmp_core::{ComparisonOutcome, ConsistencyResult, Incomparable};
use bincmp_engine::{PairwiseComparator, TripleConsistencyChecker};

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "bincmp",
    version,
    about = "Compare binary files byte by byte",
    long_about = "bincmp: with two files, report every differing byte; with three, \
                  check that the last two deviate from the first in the same way"
)]
struct Cli {
    /// List every difference (two files) or every conflicting offset (three files)
    #[arg(short = 'l', long = "list")]
    list: bool,

    /// FILE1 FILE2, or REFERENCE CANDIDATE_A CANDIDATE_B
    #[arg(value_name = "FILE", num_args = 2..=3, required = true)]
    files: Vec<PathBuf>,

    /// Path to bincmp.toml configuration file
    #[arg(long, short = 'c', env = "BINCMP_CONFIG")]
    config: Option<PathBuf>,

    /// Bytes read from each file per step (overrides config)
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "BINCMP_LOG")]
    log: Option<String>,

    /// Log format (json, text)
    #[arg(long, env = "BINCMP_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Print the result as JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Debug, ValueEnum)]
enum LogFormat {
    Json,
    Text,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    init_logging(&config);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        files = cli.files.len(),
        chunk_size = config.compare.chunk_size,
        "bincmp starting"
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.files.as_slice() {
        [a, b] => cmd_compare(&mut out, &config, a, b, cli.list, cli.json),
        [reference, a, b] => {
            cmd_consistency(&mut out, &config, reference, a, b, cli.list, cli.json)
        }
        other => anyhow::bail!("expected two or three files, got {}", other.len()),
    }
}

// ── Config loading ────────────────────────────────────────────────────────────

fn load_config(path: Option<&Path>) -> Result<BincmpConfig> {
    match path {
        Some(path) if path.exists() => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("reading config: {}", path.display()))?;
            toml::from_str(&content).with_context(|| format!("parsing config: {}", path.display()))
        }
        _ => Ok(BincmpConfig::default()),
    }
}

/// Config file, then command-line overrides, then validation.
fn resolve_config(cli: &Cli) -> Result<BincmpConfig> {
    let mut config = load_config(cli.config.as_deref())?;

    if let Some(chunk_size) = cli.chunk_size {
        config.compare.chunk_size = chunk_size;
    }
    if let Some(level) = &cli.log {
        config.log.level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        config.log.format = match format {
            LogFormat::Json => "json".into(),
            LogFormat::Text => "text".into(),
        };
    }

    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn init_logging(config: &BincmpConfig) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log.level));

    // stdout carries the report
    match LogFormat::from_str(&config.log.format, true) {
        Ok(LogFormat::Json) => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(io::stderr))
                .init();
        }
    }
}

// ── `bincmp FILE1 FILE2` ──────────────────────────────────────────────────────

fn cmd_compare(
    out: &mut impl Write,
    config: &BincmpConfig,
    a: &Path,
    b: &Path,
    list: bool,
    json: bool,
) -> Result<()> {
    let comparator = PairwiseComparator::from_config(&config.compare);
    let outcome = comparator
        .compare(a, b)
        .with_context(|| format!("comparing {} and {}", a.display(), b.display()))?;

    debug!(outcome = outcome.label(), "pairwise comparison done");

    if json {
        serde_json::to_writer_pretty(&mut *out, &outcome).context("encoding JSON")?;
        writeln!(out)?;
    } else {
        render_comparison(out, &outcome, list)?;
    }
    Ok(())
}

fn render_comparison(
    out: &mut impl Write,
    outcome: &ComparisonOutcome,
    list: bool,
) -> io::Result<()> {
    writeln!(out, "Result of comparison: {}", outcome.label())?;

    match outcome {
        ComparisonOutcome::NotFound { path } => {
            writeln!(out, "Missing file: {}", path.display())?;
            return Ok(());
        }
        ComparisonOutcome::SizeMismatch { size_a, size_b } => {
            writeln!(out, "File 1 length: {size_a}")?;
            writeln!(out, "File 2 length: {size_b}")?;
        }
        ComparisonOutcome::Identical { size } | ComparisonOutcome::ContentDiffers { size, .. } => {
            writeln!(out, "File 1 length: {size}")?;
            writeln!(out, "File 2 length: {size}")?;
        }
    }

    writeln!(out, "Num. differences: {}", outcome.differences().len())?;

    if let Some(first) = outcome.first_difference_offset() {
        writeln!(out, "Offset differs: {first:#x}")?;
        if list {
            writeln!(out, "List of differences:")?;
            for d in outcome.differences() {
                writeln!(
                    out,
                    "offset 0x{:08x}: 0x{:02x} != 0x{:02x} ({} != {})",
                    d.offset, d.value_a, d.value_b, d.value_a, d.value_b
                )?;
            }
        }
    }
    Ok(())
}

// ── `bincmp REFERENCE A B` ────────────────────────────────────────────────────

fn cmd_consistency(
    out: &mut impl Write,
    config: &BincmpConfig,
    reference: &Path,
    a: &Path,
    b: &Path,
    list: bool,
    json: bool,
) -> Result<()> {
    let started = Instant::now();
    let checker = TripleConsistencyChecker::from_config(&config.compare);
    let result = checker
        .check(reference, a, b)
        .with_context(|| {
            format!(
                "checking {} and {} against {}",
                a.display(),
                b.display(),
                reference.display()
            )
        })?;
    let elapsed = started.elapsed();

    debug!(
        consistent = result.consistent,
        conflicts = result.conflicts.len(),
        elapsed_ms = elapsed.as_millis() as u64,
        "consistency check done"
    );

    if json {
        serde_json::to_writer_pretty(&mut *out, &result).context("encoding JSON")?;
        writeln!(out)?;
    } else {
        render_consistency(out, &result, list, elapsed)?;
    }
    Ok(())
}

fn render_consistency(
    out: &mut impl Write,
    result: &ConsistencyResult,
    list: bool,
    elapsed: Duration,
) -> io::Result<()> {
    if list {
        if let Some(reason) = &result.incomparable {
            writeln!(out, "Not comparable: {}", describe_incomparable(reason))?;
        }
        for (offset, bytes) in &result.conflicts {
            writeln!(
                out,
                "offset 0x{:08x}: 0x{:02x} != 0x{:02x} ({} != {})",
                offset, bytes.value_a, bytes.value_b, bytes.value_a, bytes.value_b
            )?;
        }
    }

    writeln!(out, "{}", if result.consistent { "OK" } else { "NOK" })?;

    if list {
        writeln!(out, "Elapsed time: {}", format_elapsed(elapsed))?;
    }
    Ok(())
}

fn describe_incomparable(reason: &Incomparable) -> String {
    match reason {
        Incomparable::CandidateSizeMismatch { size_a, size_b } => {
            format!("candidates differ in length ({size_a} != {size_b})")
        }
        Incomparable::ReferenceSizeMismatch {
            candidate,
            reference_size,
            candidate_size,
        } => format!(
            "{} is {candidate_size} bytes, reference is {reference_size}",
            candidate.display()
        ),
        Incomparable::Missing { path } => format!("{} not found", path.display()),
    }
}

/// Wall-clock duration as `HH:MM:SS`; hours keep counting past a day.
fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
}
