//! Exit code logic for the crawler process.
//!
//! A crawl that ran to completion exits successfully regardless of isolated
//! per-file failures; single-file mode fails when the requested file was not
//! saved.

use ftp_crawler_core::DownloadOutcome;

use crate::ProcessExit;

/// Determines the process exit outcome of single-file mode.
pub(crate) fn determine_fetch_outcome(outcome: &DownloadOutcome) -> ProcessExit {
    if outcome.is_downloaded() {
        ProcessExit::Success
    } else {
        ProcessExit::Failure
    }
}
