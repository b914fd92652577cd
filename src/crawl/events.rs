//! Diagnostic sink for crawl progress.
//!
//! The crawl reports what it does through [`CrawlEvents`]; the binary renders
//! these as a spinner and inline messages, tests record them. Every method has
//! a no-op default so implementors only override what they display.

use std::fmt;

use crate::download::DownloadOutcome;
use crate::remote::RemotePath;
use crate::rules::Classification;

/// Why a directory was not listed or not descended into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Matched an excluded directory prefix.
    Excluded,
    /// The server refused to enter or list it.
    AccessDenied(String),
    /// Listing failed for another non-fatal reason.
    ListingFailed(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Excluded => f.write_str("excluded"),
            Self::AccessDenied(message) => write!(f, "access denied ({message})"),
            Self::ListingFailed(message) => write!(f, "listing failed ({message})"),
        }
    }
}

/// Running totals at the time of an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlProgress {
    pub directories: usize,
    pub files: usize,
}

/// Receives crawl diagnostics.
pub trait CrawlEvents {
    fn directory_visited(&mut self, _dir: &RemotePath, _progress: CrawlProgress) {}

    fn directory_skipped(&mut self, _dir: &RemotePath, _reason: &SkipReason) {}

    fn file_matched(&mut self, _path: &RemotePath, _classification: &Classification) {}

    fn download_finished(&mut self, _remote: &RemotePath, _outcome: &DownloadOutcome) {}
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEvents;

impl CrawlEvents for NoopEvents {}

impl<E: CrawlEvents + ?Sized> CrawlEvents for &mut E {
    fn directory_visited(&mut self, dir: &RemotePath, progress: CrawlProgress) {
        (**self).directory_visited(dir, progress);
    }

    fn directory_skipped(&mut self, dir: &RemotePath, reason: &SkipReason) {
        (**self).directory_skipped(dir, reason);
    }

    fn file_matched(&mut self, path: &RemotePath, classification: &Classification) {
        (**self).file_matched(path, classification);
    }

    fn download_finished(&mut self, remote: &RemotePath, outcome: &DownloadOutcome) {
        (**self).download_finished(remote, outcome);
    }
}
