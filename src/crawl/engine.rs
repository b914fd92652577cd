//! One crawl run: walk, classify, collect, download.

use std::path::PathBuf;

use tracing::{debug, info, instrument};

use super::collector::MatchCollector;
use super::events::{CrawlEvents, CrawlProgress, SkipReason};
use super::walker::{DirectoryVisitor, TreeWalker, WalkStats};
use crate::download::{DownloadOrchestrator, DownloadStats, Pacer, RetryPolicy};
use crate::remote::{Listing, RemoteError, RemotePath, RemoteStore};
use crate::rules::{EntryClassifier, ReportMode, RuleSet};

/// Inputs of a crawl besides the store and the rules.
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    /// Where the walk starts.
    pub root: RemotePath,
    pub mode: ReportMode,
    /// Existing directory receiving downloads.
    pub destination: PathBuf,
    pub retry_policy: RetryPolicy,
    /// Shared by the walker and the downloads.
    pub pacer: Pacer,
}

impl CrawlSettings {
    /// Root walk in match mode, default retry policy and pacing.
    #[must_use]
    pub fn new(destination: impl Into<PathBuf>) -> Self {
        Self {
            root: RemotePath::root(),
            mode: ReportMode::default(),
            destination: destination.into(),
            retry_policy: RetryPolicy::default(),
            pacer: Pacer::default(),
        }
    }
}

/// What a finished crawl produced.
#[derive(Debug)]
pub struct CrawlSummary {
    pub matches: MatchCollector,
    pub walk: WalkStats,
    pub downloads: DownloadStats,
}

/// Runs a full crawl against `store`.
///
/// Each directory's files are classified (and downloaded when selected)
/// before the walk descends further.
///
/// # Errors
///
/// Returns the error that made the session unusable; everything else is
/// reported through `events` and the summary.
#[instrument(skip_all, fields(root = %settings.root, mode = ?settings.mode))]
pub fn crawl<S, E>(
    store: &mut S,
    rules: &RuleSet,
    settings: CrawlSettings,
    events: &mut E,
) -> Result<CrawlSummary, RemoteError>
where
    S: RemoteStore + ?Sized,
    E: CrawlEvents + ?Sized,
{
    info!("crawl started");
    let CrawlSettings {
        root,
        mode,
        destination,
        retry_policy,
        pacer,
    } = settings;

    let walker = TreeWalker::new(rules, pacer.clone());
    let mut visitor = CrawlVisitor {
        classifier: EntryClassifier::new(rules, mode),
        collector: MatchCollector::new(),
        orchestrator: DownloadOrchestrator::new(destination, retry_policy, pacer),
        events,
        progress: CrawlProgress::default(),
    };

    let walk = walker.walk(store, &root, &mut visitor)?;
    let summary = CrawlSummary {
        downloads: visitor.orchestrator.stats(),
        matches: visitor.collector,
        walk,
    };

    info!(
        matches = summary.matches.len(),
        directories = summary.walk.visited,
        files = summary.walk.files_seen,
        downloaded = summary.downloads.completed(),
        download_failures = summary.downloads.failed(),
        "crawl complete"
    );
    Ok(summary)
}

struct CrawlVisitor<'a, E: ?Sized> {
    classifier: EntryClassifier<'a>,
    collector: MatchCollector,
    orchestrator: DownloadOrchestrator,
    events: &'a mut E,
    progress: CrawlProgress,
}

impl<S, E> DirectoryVisitor<S> for CrawlVisitor<'_, E>
where
    S: RemoteStore + ?Sized,
    E: CrawlEvents + ?Sized,
{
    fn visit(&mut self, store: &mut S, listing: &Listing) -> Result<(), RemoteError> {
        self.progress.directories += 1;

        for entry in &listing.files {
            self.progress.files += 1;
            let classification = self.classifier.classify(entry);
            if !classification.is_match() {
                continue;
            }

            let path = entry.path();
            if self.collector.add(path.clone()) {
                debug!(
                    path = %path,
                    rule = ?classification.rule,
                    download = classification.should_download,
                    "file matched"
                );
                self.events.file_matched(path, &classification);
            }

            if classification.should_download {
                let outcome = self.orchestrator.download_if_matched(store, entry)?;
                self.events.download_finished(path, &outcome);
            }
        }

        self.events
            .directory_visited(&listing.directory, self.progress);
        Ok(())
    }

    fn skipped(&mut self, dir: &RemotePath, reason: &SkipReason) {
        self.events.directory_skipped(dir, reason);
    }
}
