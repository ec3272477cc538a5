//! Progress display for the qdown CLI.

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use qdown_lib::{RunCounters, RunSummary};
use std::sync::Arc;
use std::time::Duration;

/// Spinner refresh period.
const TICK: Duration = Duration::from_millis(200);

/// Create the download spinner, hidden in quiet mode.
pub(crate) fn progress_spinner(quiet: bool) -> Result<ProgressBar> {
    if quiet {
        return Ok(ProgressBar::hidden());
    }
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] {msg}",
    )?);
    spinner.enable_steady_tick(TICK);
    spinner.set_message("Listing bucket ...");
    Ok(spinner)
}

/// Mirror the run counters into the spinner message until aborted.
pub(crate) async fn track_progress(spinner: ProgressBar, counters: Arc<RunCounters>) {
    let mut interval = tokio::time::interval(TICK);
    loop {
        interval.tick().await;
        let snapshot = counters.snapshot(spinner.elapsed());
        if snapshot.listed > 0 {
            spinner.set_message(progress_message(&snapshot));
        }
    }
}

/// One-line description of a run in flight.
pub(crate) fn progress_message(summary: &RunSummary) -> String {
    let mut message = format!(
        "{} done, {} failed, {} already local",
        summary.succeeded, summary.failed, summary.local
    );
    if summary.filtered > 0 {
        message.push_str(&format!(", {} filtered", summary.filtered));
    }
    message
}
