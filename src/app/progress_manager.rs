//! Console rendering of crawl events: spinner plus inline messages.

use std::time::Duration;

use ftp_crawler_core::{
    Classification, CrawlEvents, CrawlProgress, DownloadOutcome, RemotePath, SkipReason,
};
use indicatif::{ProgressBar, ProgressStyle};

/// Renders crawl progress on stderr.
///
/// With a spinner, inline lines go through [`ProgressBar::println`] so they
/// do not tear the spinner line. Quiet mode prints nothing.
pub(crate) struct ConsoleEvents {
    spinner: Option<ProgressBar>,
    quiet: bool,
    downloaded: usize,
}

impl ConsoleEvents {
    pub(crate) fn new(use_spinner: bool, quiet: bool) -> Self {
        let spinner = use_spinner.then(|| {
            let spinner = ProgressBar::new_spinner();
            spinner.set_style(
                ProgressStyle::with_template("{spinner} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            spinner.enable_steady_tick(Duration::from_millis(100));
            spinner.set_message("Connecting...");
            spinner
        });
        Self {
            spinner,
            quiet,
            downloaded: 0,
        }
    }

    pub(crate) fn downloaded(&self) -> usize {
        self.downloaded
    }

    /// Clears the spinner; call before printing the final summary.
    pub(crate) fn finish(&self) {
        if let Some(spinner) = &self.spinner {
            spinner.finish_and_clear();
        }
    }

    fn line(&self, message: &str) {
        if self.quiet {
            return;
        }
        match &self.spinner {
            Some(spinner) => spinner.println(message),
            None => eprintln!("{message}"),
        }
    }
}

impl CrawlEvents for ConsoleEvents {
    fn directory_visited(&mut self, dir: &RemotePath, progress: CrawlProgress) {
        if let Some(spinner) = &self.spinner {
            spinner.set_message(progress_message(progress, dir));
        }
    }

    fn directory_skipped(&mut self, dir: &RemotePath, reason: &SkipReason) {
        if matches!(reason, SkipReason::Excluded) {
            return;
        }
        self.line(&format!("  skipped {dir}: {reason}"));
    }

    fn file_matched(&mut self, path: &RemotePath, classification: &Classification) {
        if classification.should_report {
            self.line(&format!("  found {path}"));
        }
    }

    fn download_finished(&mut self, remote: &RemotePath, outcome: &DownloadOutcome) {
        match outcome {
            DownloadOutcome::Downloaded { local, bytes, .. } => {
                self.downloaded += 1;
                self.line(&format!(
                    "  saved {remote} -> {} ({bytes} bytes)",
                    local.display()
                ));
            }
            DownloadOutcome::Failed { error, attempts } => {
                self.line(&format!(
                    "  download failed {remote} after {attempts} attempt(s): {error}"
                ));
            }
            DownloadOutcome::Skipped(reason) => {
                self.line(&format!("  download skipped {remote}: {reason}"));
            }
        }
    }
}

fn progress_message(progress: CrawlProgress, current: &RemotePath) -> String {
    format!(
        "[{} dirs, {} files] {current}",
        progress.directories, progress.files
    )
}
