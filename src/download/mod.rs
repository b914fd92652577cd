//! Retrieval of matched files.
//!
//! Downloads are serialized on the crawl thread and paced with a randomized
//! delay. Each remote path is requested at most once per run; per-file
//! failures are reported as outcomes and never end the crawl.

pub mod filename;
mod orchestrator;
pub mod pacer;
mod retry;

pub use filename::{
    InvalidName, local_destination, sanitize_filename_component, validate_file_name,
};
pub use orchestrator::{DownloadOrchestrator, DownloadOutcome, DownloadSkip, DownloadStats};
pub use pacer::{DEFAULT_MAX_PACE, Pacer};
pub use retry::{
    DEFAULT_MAX_RETRIES, FailureType, MAX_RETRIES_LIMIT, RetryDecision, RetryPolicy,
    classify_error,
};
