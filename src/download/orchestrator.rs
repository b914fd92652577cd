//! Serialized, paced retrieval of matched files.
//!
//! The [`DownloadOrchestrator`] owns the run's download bookkeeping: which
//! remote paths were already attempted, the retry policy and the pacer. All
//! transfers go through the caller's [`RemoteStore`] on the crawl thread, one
//! at a time.
//!
//! # Example
//!
//! ```
//! use ftp_crawler_core::download::{DownloadOrchestrator, DownloadOutcome, Pacer, RetryPolicy};
//! use ftp_crawler_core::remote::{MemoryStore, RemotePath};
//!
//! let dir = std::env::temp_dir().join("ftp-crawler-doc-orchestrator");
//! std::fs::create_dir_all(&dir).unwrap();
//! let mut store = MemoryStore::new().with_file("/etc/id_rsa", b"key");
//! let mut orchestrator =
//!     DownloadOrchestrator::new(&dir, RetryPolicy::default(), Pacer::disabled());
//!
//! let outcome = orchestrator.fetch(&mut store, &RemotePath::new("/etc/id_rsa")).unwrap();
//! assert!(matches!(outcome, DownloadOutcome::Downloaded { bytes: 3, .. }));
//! ```

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

use tracing::{debug, info, instrument, warn};

use super::filename::local_destination;
use super::pacer::Pacer;
use super::retry::{FailureType, RetryDecision, RetryPolicy, classify_error};
use crate::remote::{RemoteEntry, RemoteError, RemotePath, RemoteStore};

/// Why a download was not attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadSkip {
    /// The path was already attempted during this run.
    AlreadyAttempted,
    /// The remote name cannot be used as a local file name.
    InvalidDestination(String),
}

impl fmt::Display for DownloadSkip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyAttempted => f.write_str("already attempted"),
            Self::InvalidDestination(reason) => write!(f, "invalid destination: {reason}"),
        }
    }
}

/// Result of one download request.
#[derive(Debug)]
pub enum DownloadOutcome {
    Downloaded {
        local: PathBuf,
        bytes: u64,
        attempts: u32,
    },
    Failed {
        error: RemoteError,
        attempts: u32,
    },
    Skipped(DownloadSkip),
}

impl DownloadOutcome {
    #[must_use]
    pub fn is_downloaded(&self) -> bool {
        matches!(self, Self::Downloaded { .. })
    }

    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Counters for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadStats {
    completed: usize,
    failed: usize,
    skipped: usize,
    retried: usize,
}

impl DownloadStats {
    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.failed
    }

    #[must_use]
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Number of extra attempts made after transient failures.
    #[must_use]
    pub fn retried(&self) -> usize {
        self.retried
    }
}

/// Retrieves downloadable files into a flat destination directory.
#[derive(Debug)]
pub struct DownloadOrchestrator {
    destination: PathBuf,
    retry_policy: RetryPolicy,
    pacer: Pacer,
    attempted: HashSet<RemotePath>,
    stats: DownloadStats,
}

impl DownloadOrchestrator {
    /// The destination directory must already exist.
    #[must_use]
    pub fn new(destination: impl Into<PathBuf>, retry_policy: RetryPolicy, pacer: Pacer) -> Self {
        let destination = destination.into();
        debug!(
            destination = %destination.display(),
            max_attempts = retry_policy.max_attempts(),
            pace_max_ms = pacer.max_delay().as_millis(),
            "creating download orchestrator"
        );
        Self {
            destination,
            retry_policy,
            pacer,
            attempted: HashSet::new(),
            stats: DownloadStats::default(),
        }
    }

    #[must_use]
    pub fn stats(&self) -> DownloadStats {
        self.stats
    }

    /// Downloads `entry` unless it was already attempted.
    ///
    /// Per-file failures are returned as [`DownloadOutcome::Failed`]; the
    /// caller keeps going.
    ///
    /// # Errors
    ///
    /// Only errors that leave the session unusable (classified as
    /// [`FailureType::Fatal`]) are returned.
    #[instrument(skip(self, store, entry), fields(remote = %entry.path()))]
    pub fn download_if_matched<S: RemoteStore + ?Sized>(
        &mut self,
        store: &mut S,
        entry: &RemoteEntry,
    ) -> Result<DownloadOutcome, RemoteError> {
        let remote = entry.path();
        if !self.attempted.insert(remote.clone()) {
            debug!("already attempted, skipping");
            self.stats.skipped += 1;
            return Ok(DownloadOutcome::Skipped(DownloadSkip::AlreadyAttempted));
        }

        let local = match local_destination(&self.destination, entry.name()) {
            Ok(local) => local,
            Err(reason) => {
                warn!(reason = reason.describe(), "refusing to download");
                self.stats.skipped += 1;
                return Ok(DownloadOutcome::Skipped(DownloadSkip::InvalidDestination(
                    reason.describe().to_string(),
                )));
            }
        };

        let outcome = self.download_with_retry(store, remote, local)?;
        self.pacer.pause();
        Ok(outcome)
    }

    /// Single-file mode: downloads one remote path with the same rules.
    ///
    /// # Errors
    ///
    /// See [`Self::download_if_matched`].
    pub fn fetch<S: RemoteStore + ?Sized>(
        &mut self,
        store: &mut S,
        remote: &RemotePath,
    ) -> Result<DownloadOutcome, RemoteError> {
        self.download_if_matched(store, &RemoteEntry::file(remote.clone()))
    }

    fn download_with_retry<S: RemoteStore + ?Sized>(
        &mut self,
        store: &mut S,
        remote: &RemotePath,
        local: PathBuf,
    ) -> Result<DownloadOutcome, RemoteError> {
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            debug!(attempt, local = %local.display(), "attempting download");

            match store.download(remote, &local) {
                Ok(bytes) => {
                    info!(
                        bytes,
                        attempts = attempt,
                        local = %local.display(),
                        "download completed"
                    );
                    self.stats.completed += 1;
                    return Ok(DownloadOutcome::Downloaded {
                        local,
                        bytes,
                        attempts: attempt,
                    });
                }
                Err(error) => {
                    let failure_type = classify_error(&error);
                    if failure_type == FailureType::Fatal {
                        return Err(error);
                    }

                    match self.retry_policy.should_retry(failure_type, attempt) {
                        RetryDecision::Retry { delay, .. } => {
                            debug!(
                                error = %error,
                                delay_ms = delay.as_millis(),
                                "transient failure, retrying"
                            );
                            self.stats.retried += 1;
                            self.pacer.wait(delay);
                        }
                        RetryDecision::DoNotRetry { reason } => {
                            warn!(
                                error = %error,
                                attempts = attempt,
                                reason = %reason,
                                "download failed"
                            );
                            self.stats.failed += 1;
                            return Ok(DownloadOutcome::Failed {
                                error,
                                attempts: attempt,
                            });
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::remote::MemoryStore;
    use tempfile::TempDir;

    fn orchestrator(dir: &TempDir, policy: RetryPolicy) -> DownloadOrchestrator {
        DownloadOrchestrator::new(dir.path(), policy, Pacer::disabled())
    }

    fn immediate_retries(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::ZERO, Duration::ZERO, 2.0)
    }

    #[test]
    fn test_download_writes_flattened_file() {
        let temp = TempDir::new().unwrap();
        let mut store = MemoryStore::new().with_file("/home/user/.ssh/id_rsa", b"PRIVATE");
        let mut orch = orchestrator(&temp, RetryPolicy::default());

        let entry = RemoteEntry::file(RemotePath::new("/home/user/.ssh/id_rsa"));
        let outcome = orch.download_if_matched(&mut store, &entry).unwrap();

        let DownloadOutcome::Downloaded {
            local,
            bytes,
            attempts,
        } = outcome
        else {
            panic!("expected Downloaded, got {outcome:?}");
        };
        assert_eq!(local, temp.path().join("id_rsa"));
        assert_eq!(bytes, 7);
        assert_eq!(attempts, 1);
        assert_eq!(std::fs::read(local).unwrap(), b"PRIVATE");
        assert_eq!(orch.stats().completed(), 1);
    }

    #[test]
    fn test_second_request_is_skipped_without_store_call() {
        let temp = TempDir::new().unwrap();
        let mut store = MemoryStore::new().with_file("/SAM", b"x");
        let mut orch = orchestrator(&temp, RetryPolicy::default());
        let path = RemotePath::new("/SAM");

        orch.fetch(&mut store, &path).unwrap();
        let second = orch.fetch(&mut store, &path).unwrap();

        assert!(matches!(
            second,
            DownloadOutcome::Skipped(DownloadSkip::AlreadyAttempted)
        ));
        assert_eq!(store.download_calls().len(), 1);
        assert_eq!(orch.stats().skipped(), 1);
    }

    #[test]
    fn test_failed_attempt_is_not_repeated() {
        let temp = TempDir::new().unwrap();
        let mut store = MemoryStore::new()
            .with_file("/SYSTEM", b"x")
            .fail_download("/SYSTEM", 550);
        let mut orch = orchestrator(&temp, RetryPolicy::default());
        let path = RemotePath::new("/SYSTEM");

        assert!(orch.fetch(&mut store, &path).unwrap().is_failed());
        assert!(matches!(
            orch.fetch(&mut store, &path).unwrap(),
            DownloadOutcome::Skipped(DownloadSkip::AlreadyAttempted)
        ));
        assert_eq!(store.download_calls().len(), 1);
    }

    #[test]
    fn test_invalid_names_are_skipped() {
        let temp = TempDir::new().unwrap();
        let mut store = MemoryStore::new();
        let mut orch = orchestrator(&temp, RetryPolicy::default());

        let outcome = orch.fetch(&mut store, &RemotePath::new("/a/..")).unwrap();
        assert!(matches!(
            outcome,
            DownloadOutcome::Skipped(DownloadSkip::InvalidDestination(_))
        ));
        let outcome = orch.fetch(&mut store, &RemotePath::root()).unwrap();
        assert!(matches!(
            outcome,
            DownloadOutcome::Skipped(DownloadSkip::InvalidDestination(_))
        ));
        assert!(store.download_calls().is_empty());
    }

    #[test]
    fn test_name_collision_overwrites() {
        let temp = TempDir::new().unwrap();
        let mut store = MemoryStore::new()
            .with_file("/a/web.config", b"first")
            .with_file("/b/web.config", b"second");
        let mut orch = orchestrator(&temp, RetryPolicy::default());

        orch.fetch(&mut store, &RemotePath::new("/a/web.config")).unwrap();
        orch.fetch(&mut store, &RemotePath::new("/b/web.config")).unwrap();

        let written = std::fs::read(temp.path().join("web.config")).unwrap();
        assert_eq!(written, b"second");
        assert_eq!(orch.stats().completed(), 2);
    }

    #[test]
    fn test_default_policy_does_not_retry_transient() {
        let temp = TempDir::new().unwrap();
        let mut store = MemoryStore::new()
            .with_file("/db.php", b"x")
            .fail_download_times("/db.php", 450, 1);
        let mut orch = orchestrator(&temp, RetryPolicy::default());

        let outcome = orch.fetch(&mut store, &RemotePath::new("/db.php")).unwrap();
        assert!(matches!(outcome, DownloadOutcome::Failed { attempts: 1, .. }));
        assert_eq!(orch.stats().retried(), 0);
    }

    #[test]
    fn test_transient_failure_retried_when_configured() {
        let temp = TempDir::new().unwrap();
        let mut store = MemoryStore::new()
            .with_file("/db.php", b"x")
            .fail_download_times("/db.php", 450, 2);
        let mut orch = orchestrator(&temp, immediate_retries(3));

        let outcome = orch.fetch(&mut store, &RemotePath::new("/db.php")).unwrap();
        assert!(matches!(outcome, DownloadOutcome::Downloaded { attempts: 3, .. }));
        assert_eq!(orch.stats().retried(), 2);
        assert_eq!(store.download_calls().len(), 3);
    }

    #[test]
    fn test_permanent_failure_not_retried() {
        let temp = TempDir::new().unwrap();
        let mut store = MemoryStore::new()
            .with_file("/flag.txt", b"x")
            .fail_download("/flag.txt", 550);
        let mut orch = orchestrator(&temp, immediate_retries(5));

        let outcome = orch.fetch(&mut store, &RemotePath::new("/flag.txt")).unwrap();
        assert!(matches!(outcome, DownloadOutcome::Failed { attempts: 1, .. }));
        assert_eq!(orch.stats().failed(), 1);
    }

    #[test]
    fn test_service_closing_reply_is_fatal() {
        let temp = TempDir::new().unwrap();
        let mut store = MemoryStore::new()
            .with_file("/flag.txt", b"x")
            .fail_download("/flag.txt", 421);
        let mut orch = orchestrator(&temp, RetryPolicy::default());

        assert!(orch.fetch(&mut store, &RemotePath::new("/flag.txt")).is_err());
    }

    #[test]
    fn test_pacing_after_each_attempt_sequence_but_not_skips() {
        let temp = TempDir::new().unwrap();
        let pacer = Pacer::new(Duration::from_millis(5));
        let mut store = MemoryStore::new()
            .with_file("/a", b"x")
            .fail_download("/b", 550);
        let mut orch =
            DownloadOrchestrator::new(temp.path(), RetryPolicy::default(), pacer.clone());

        orch.fetch(&mut store, &RemotePath::new("/a")).unwrap();
        orch.fetch(&mut store, &RemotePath::new("/b")).unwrap();
        orch.fetch(&mut store, &RemotePath::new("/a")).unwrap();

        assert_eq!(pacer.pauses(), 2);
    }

    #[test]
    fn test_skip_display() {
        assert_eq!(DownloadSkip::AlreadyAttempted.to_string(), "already attempted");
    }
}
