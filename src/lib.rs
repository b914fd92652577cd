//! FTP Crawler Core Library
//!
//! Enumerates the file tree of a remote FTP host, classifies every file
//! against interest and exclusion rules, downloads the files that are
//! interesting by name and produces a deduplicated inventory of matches.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`remote`] - Remote paths, the [`RemoteStore`] capability, the FTP
//!   session and an in-memory tree
//! - [`rules`] - Interest/exclusion rule set and per-entry classifier
//! - [`crawl`] - Tree walker, match collector and the crawl engine
//! - [`download`] - Serialized downloads with pacing and bounded retry
//! - [`report`] - Inventory file naming and writing
//!
//! # Example
//!
//! ```
//! use ftp_crawler_core::{CrawlSettings, MemoryStore, NoopEvents, Pacer, RuleSet, crawl};
//!
//! let dir = std::env::temp_dir();
//! let mut store = MemoryStore::new()
//!     .with_file("/a/secret.pem", b"-----BEGIN")
//!     .with_file("/a/notes.txt", b"hello");
//! let settings = CrawlSettings {
//!     pacer: Pacer::disabled(),
//!     ..CrawlSettings::new(&dir)
//! };
//!
//! let summary = crawl(&mut store, &RuleSet::default(), settings, &mut NoopEvents).unwrap();
//! assert_eq!(summary.matches.len(), 1);
//! ```

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod crawl;
pub mod download;
pub mod remote;
pub mod report;
pub mod rules;

// Re-export commonly used types
pub use crawl::{
    CrawlEvents, CrawlProgress, CrawlSettings, CrawlSummary, MatchCollector, NoopEvents,
    SkipReason, TreeWalker, WalkStats, crawl,
};
pub use download::{
    DEFAULT_MAX_PACE, DEFAULT_MAX_RETRIES, DownloadOrchestrator, DownloadOutcome, DownloadSkip,
    DownloadStats, FailureType, Pacer, RetryDecision, RetryPolicy, classify_error,
};
pub use remote::{
    Credentials, FtpOptions, FtpStore, MemoryStore, RemoteEntry, RemoteError, RemotePath,
    RemoteStore, Target, TargetError,
};
pub use report::{ReportError, listing_file_name, write_listing};
pub use rules::{Classification, EntryClassifier, ReportMode, RuleConfig, RuleError, RuleSet};
