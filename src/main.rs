use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::thread;
use threadlog::{tlog, LogResult, LoggerConfig};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "threadlog")]
#[command(about = "Write per-thread diagnostic logs to the temp directory")]
#[command(version)]
struct Cli {
    /// Number of worker threads to spawn
    #[arg(short, long, default_value = "2")]
    threads: usize,

    /// Lines each worker writes
    #[arg(short, long, default_value = "3")]
    messages: usize,

    /// Directory for log files (overrides the config file and THREADLOG_TMPDIR)
    #[arg(long)]
    tmp_dir: Option<PathBuf>,

    /// YAML logger config
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Leave each worker's log open instead of clearing it
    #[arg(long)]
    keep_open: bool,

    /// Don't print the per-thread announcement lines
    #[arg(short, long)]
    quiet: bool,
}

const DEFAULT_FILTER: &str = "threadlog=info";

/// `RUST_LOG` when set and valid, otherwise [`DEFAULT_FILTER`].
fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(env_filter())
        .init();
}

fn build_config(cli: &Cli) -> Result<LoggerConfig> {
    let mut config = match &cli.config {
        Some(path) => LoggerConfig::load(path)?,
        None => LoggerConfig::from_env(),
    };
    if let Some(dir) = &cli.tmp_dir {
        config = config.with_temp_dir(dir);
    }
    if cli.quiet {
        config = config.with_announce(false);
    }
    Ok(config)
}

fn run_worker(index: usize, messages: usize, keep_open: bool) -> LogResult<Option<PathBuf>> {
    tlog!("worker {} started", index)?;
    for i in 1..=messages {
        tlog!("message {} of {}", i, messages)?;
    }
    threadlog::log("done")?;

    let path = threadlog::global().current_log_path();
    if !keep_open {
        threadlog::clear()?;
    }
    Ok(path)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = build_config(&cli)?;
    if !threadlog::init_global(config) {
        bail!("Global logger was already initialized");
    }

    let mut workers = Vec::with_capacity(cli.threads);
    for index in 1..=cli.threads {
        let (messages, keep_open) = (cli.messages, cli.keep_open);
        let worker = thread::Builder::new()
            .name(format!("worker-{}", index))
            .spawn(move || run_worker(index, messages, keep_open))
            .with_context(|| format!("Failed to spawn worker-{}", index))?;
        workers.push((index, worker));
    }

    let mut failures = 0;
    for (index, worker) in workers {
        match worker.join() {
            Ok(Ok(Some(path))) => println!("worker-{}: {}", index, path.display()),
            Ok(Ok(None)) => println!("worker-{}: no log written", index),
            Ok(Err(e)) => {
                tracing::error!("worker-{} failed: {}", index, e);
                failures += 1;
            }
            Err(_) => {
                tracing::error!("worker-{} panicked", index);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        bail!("{} of {} worker(s) failed", failures, cli.threads);
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
