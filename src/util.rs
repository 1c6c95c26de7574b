use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;

use crate::replicate::workers::ProgressSnapshot;

/// Well-known failure artifact, written in the run's working directory.
pub const FAILED_LIST_FILE: &str = "failed_list.txt";

/// Persist the failed identifiers, one per line, overwriting any prior
/// content. Resubmitting this file is the sole retry mechanism.
pub fn write_failed_list(dir: &Path, lfns: &[String]) -> std::io::Result<PathBuf> {
    let path = dir.join(FAILED_LIST_FILE);
    let mut body = String::new();
    for lfn in lfns {
        body.push_str(lfn);
        body.push('\n');
    }
    std::fs::write(&path, body)?;
    Ok(path)
}

/// Total progress bar counting completed tasks. Progress lines from workers
/// go through `ProgressBar::println` so they interleave cleanly above it.
pub fn init_total_progress(total: u64) -> Result<ProgressBar> {
    let style = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
    )
    .with_context(|| "invalid progress template")?
    .progress_chars("=> ");
    let pb = ProgressBar::new(total);
    pb.set_style(style);
    Ok(pb)
}

/// Final summary line. Dry runs are marked so simulated counters are never
/// mistaken for executed transfers.
pub fn print_summary(snap: &ProgressSnapshot, elapsed: Duration, simulated: bool) {
    let counts =
        format!("Total: {} / Success: {} / Fail: {}", snap.total, snap.succeeded, snap.failed);
    let timing = format!("({:.2} s)", elapsed.as_secs_f64());
    let line = if simulated {
        format!("{} {} [dry-run, nothing was transferred]", counts, timing)
    } else {
        format!("{} {}", counts, timing)
    };
    if snap.failed > 0 {
        println!("{}", line.yellow());
    } else {
        println!("{}", line.green());
    }
}

/// Install the verbose tracing subscriber: env-filtered fmt layer writing
/// through a non-blocking appender into the logs directory. Returns the
/// writer guard that must outlive the run; `None` when a subscriber is
/// already installed (tests).
pub fn init_verbose_logging(logs_dir: &Path) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    if let Err(e) = std::fs::create_dir_all(logs_dir) {
        eprintln!("Cannot create logs dir {}: {}", logs_dir.display(), e);
        return None;
    }
    let file_name =
        format!("run_{}.log", chrono::Utc::now().format("%Y%m%dT%H%M%SZ"));
    let appender = tracing_appender::rolling::never(logs_dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug"));
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init();
    match installed {
        Ok(()) => Some(guard),
        Err(_) => None,
    }
}
