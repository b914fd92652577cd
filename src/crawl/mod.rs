//! Crawl engine.
//!
//! [`crawl`] composes the pieces of a run: the [`TreeWalker`] lists the remote
//! tree, every listed file is classified, matches go into the
//! [`MatchCollector`] and files selected for download are handed to the
//! download orchestrator. Progress and per-node failures are reported through
//! [`CrawlEvents`].

mod collector;
mod engine;
mod events;
mod walker;

pub use collector::MatchCollector;
pub use engine::{CrawlSettings, CrawlSummary, crawl};
pub use events::{CrawlEvents, CrawlProgress, NoopEvents, SkipReason};
pub use walker::{DirectoryVisitor, TreeWalker, WalkStats};
