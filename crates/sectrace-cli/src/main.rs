//! sectrace: replay and stress harness for the section tracker
//!
//! Runs section scripts against a fresh tracker and prints what ended up on
//! the active stack and in the completed history.

mod config;
mod script;
mod stress;

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use sectrace::SectionTracker;
use tracing::info;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use config::{CONFIG_FILE, Config, SECTRACE_DIR};
use stress::StressConfig;

/// Replay and stress harness for the sectrace section tracker
#[derive(Parser)]
#[command(name = "sectrace")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to .sectrace directory (default: search for .sectrace/config.toml)
    #[arg(long, global = true, env = "SECTRACE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a section script and print the resulting state
    Replay {
        /// Script file to replay
        script: PathBuf,

        /// Start in strict mode regardless of config
        #[arg(long)]
        strict: bool,

        /// Print the final state as JSON
        #[arg(long)]
        json: bool,

        /// Log strict-mode failures and continue instead of stopping
        #[arg(long)]
        keep_going: bool,
    },

    /// Run concurrent begin/end pairs and verify the history
    Stress {
        /// Number of worker threads
        #[arg(long, default_value = "8")]
        threads: usize,

        /// Begin/end pairs per worker
        #[arg(long, default_value = "10000")]
        iterations: usize,

        /// Run in strict mode regardless of config
        #[arg(long)]
        strict: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Initialize a new .sectrace directory with config file
    Init {
        /// Force overwrite existing config
        #[arg(long)]
        force: bool,
    },
}

fn filter_for(level: &str, verbose: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    }
}

/// Initialize logging to stderr.
fn init_logging(level: &str, verbose: bool) {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter_for(level, verbose))
        .init();
}

/// Initialize logging to daily rotating files in `logs_dir`.
fn init_file_logging(logs_dir: &Path, level: &str, verbose: bool) {
    if let Err(e) = std::fs::create_dir_all(logs_dir) {
        eprintln!("Warning: Failed to create logs directory: {}", e);
        // Fall back to stderr logging
        init_logging(level, verbose);
        return;
    }

    let file_appender = RollingFileAppender::new(Rotation::DAILY, logs_dir, "sectrace.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Dropping the guard would stop logging
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .with(filter_for(level, verbose))
        .init();
}

/// Load config from `--config` or by discovery. Returns the config and the
/// .sectrace directory it came from, if any.
fn load_config(explicit: Option<&Path>) -> Result<(Config, Option<PathBuf>)> {
    if let Some(dir) = explicit {
        let path = Config::config_path(dir);
        let config = Config::from_file(&path)?;
        return Ok((config, Some(dir.to_path_buf())));
    }

    match Config::find_and_load()? {
        Some((config, dir)) => Ok((config, Some(dir))),
        None => Ok((Config::default(), None)),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Replay {
            script,
            strict,
            json,
            keep_going,
        } => {
            let config = setup(cli.config.as_deref(), cli.verbose)?;
            cmd_replay(&config, &script, strict, json, keep_going)
        }
        Commands::Stress {
            threads,
            iterations,
            strict,
            json,
        } => {
            let config = setup(cli.config.as_deref(), cli.verbose)?;
            cmd_stress(&config, threads, iterations, strict, json)
        }
        Commands::Init { force } => cmd_init(force),
    }
}

/// Load config and install the log subscriber it asks for.
fn setup(config_dir: Option<&Path>, verbose: bool) -> Result<Config> {
    let (config, sectrace_dir) = load_config(config_dir)?;

    match config.resolve_log_dir(sectrace_dir.as_deref()) {
        Some(logs_dir) => init_file_logging(&logs_dir, &config.logging.level, verbose),
        None => init_logging(&config.logging.level, verbose),
    }

    match &sectrace_dir {
        Some(dir) => info!("Loaded config from {}", dir.display()),
        None => tracing::debug!("No {}/{} found, using defaults", SECTRACE_DIR, CONFIG_FILE),
    }
    for error in config.validate() {
        tracing::warn!("Invalid config: {}", error);
    }

    Ok(config)
}

fn tracker_for(config: &Config, strict: bool) -> SectionTracker {
    let tracker = SectionTracker::with_config(&config.tracker);
    if strict {
        tracker.set_strict_mode(true);
    }
    tracker
}

fn cmd_replay(
    config: &Config,
    path: &Path,
    strict: bool,
    json: bool,
    keep_going: bool,
) -> Result<()> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read script: {}", path.display()))?;
    let steps = script::parse(&source)
        .with_context(|| format!("Failed to parse script: {}", path.display()))?;

    let tracker = tracker_for(config, strict);
    let mut stdout = std::io::stdout().lock();
    let report = script::replay(&tracker, &steps, keep_going, &mut stdout)
        .with_context(|| format!("Replay of {} failed", path.display()))?;

    info!(
        executed = report.executed,
        failures = report.failures.len(),
        "Replay complete"
    );

    let snapshot = tracker.snapshot();
    if json {
        writeln!(stdout, "{}", serde_json::to_string_pretty(&snapshot)?)?;
    } else {
        writeln!(stdout, "{}", snapshot)?;
    }

    if !report.failures.is_empty() {
        bail!(
            "{} command(s) failed in strict mode",
            report.failures.len()
        );
    }
    Ok(())
}

fn cmd_stress(
    config: &Config,
    threads: usize,
    iterations: usize,
    strict: bool,
    json: bool,
) -> Result<()> {
    if threads == 0 {
        bail!("--threads must be at least 1");
    }

    let tracker = tracker_for(config, strict);
    info!(threads, iterations, strict = tracker.is_strict_mode(), "Starting stress run");

    let report = stress::run(&tracker, StressConfig {
        threads,
        iterations,
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "{} threads x {} iterations: {} ends, {} history entries, {} left active ({}ms)",
            report.threads,
            report.iterations,
            report.ends,
            report.history_len,
            report.leftover,
            report.elapsed_ms
        );
    }
    Ok(())
}

fn cmd_init(force: bool) -> Result<()> {
    let config_path = Config::write_default(Path::new(SECTRACE_DIR), force)?;
    println!("Created {}", config_path.display());
    Ok(())
}
