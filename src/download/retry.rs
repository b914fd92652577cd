//! Bounded retry with exponential backoff for transient download failures.
//!
//! When a download fails, the error is classified into a [`FailureType`]:
//! - [`FailureType::Transient`] - 4xx FTP replies and transfers that failed without a reply
//! - [`FailureType::Permanent`] - 5xx replies and local write failures
//! - [`FailureType::NeedsAuth`] - the file was refused to this user
//! - [`FailureType::Fatal`] - the session is gone; nothing more can be fetched
//!
//! The [`RetryPolicy`] then determines whether to try again. The default policy
//! makes a single attempt, so retrying is strictly opt-in.
//!
//! # Example
//!
//! ```
//! use ftp_crawler_core::download::{classify_error, FailureType, RetryDecision, RetryPolicy};
//! use ftp_crawler_core::remote::{RemoteError, RemotePath};
//!
//! let policy = RetryPolicy::with_max_retries(2);
//! let error = RemoteError::transfer(RemotePath::new("/db.sql"), Some(450), "450 busy");
//! assert_eq!(classify_error(&error), FailureType::Transient);
//!
//! match policy.should_retry(classify_error(&error), 1) {
//!     RetryDecision::Retry { delay, attempt } => {
//!         println!("Retrying in {:?} (attempt {})", delay, attempt);
//!     }
//!     RetryDecision::DoNotRetry { reason } => {
//!         println!("Not retrying: {}", reason);
//!     }
//! }
//! ```

use std::time::Duration;

use rand::Rng;
use tracing::{debug, instrument};

use crate::remote::RemoteError;

/// Default number of extra attempts after the first one.
pub const DEFAULT_MAX_RETRIES: u32 = 0;

/// Upper bound accepted for extra attempts.
pub const MAX_RETRIES_LIMIT: u32 = 10;

/// Default base delay for exponential backoff (1 second).
const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Default maximum delay cap (32 seconds).
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(32);

/// Default backoff multiplier (doubles each attempt).
const DEFAULT_BACKOFF_MULTIPLIER: f32 = 2.0;

/// Maximum jitter added to delays (500ms). Never more than the base delay.
const MAX_JITTER: Duration = Duration::from_millis(500);

/// Classification of download failure types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    /// Temporary failure that may succeed on retry (FTP 4xx).
    Transient,

    /// Failure that won't succeed regardless of retries (FTP 5xx, local IO).
    Permanent,

    /// The server refused this file to the logged-in user.
    NeedsAuth,

    /// The session is unusable; the run has to stop.
    Fatal,
}

/// Decision on whether to retry a failed download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry the download after the specified delay.
    Retry {
        /// How long to wait before retrying.
        delay: Duration,
        /// Which attempt number this will be (1-indexed, so first retry is attempt 2).
        attempt: u32,
    },

    /// Do not retry the download.
    DoNotRetry {
        /// Human-readable reason why retry is not attempted.
        reason: String,
    },
}

/// Configuration for retry behavior with exponential backoff.
///
/// # Default Values
///
/// - `max_attempts`: 1 (no retry)
/// - `base_delay`: 1 second
/// - `max_delay`: 32 seconds
/// - `backoff_multiplier`: 2.0
///
/// # Delay Calculation
///
/// ```text
/// delay = min(base_delay * multiplier^(attempt - 1), max_delay) + jitter
/// ```
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the initial attempt).
    max_attempts: u32,

    /// Base delay for the first retry.
    base_delay: Duration,

    /// Maximum delay cap.
    max_delay: Duration,

    /// Multiplier applied each attempt (typically 2.0 for doubling).
    backoff_multiplier: f32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_RETRIES + 1,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
        }
    }
}

impl RetryPolicy {
    /// Creates a new retry policy with custom settings.
    ///
    /// # Arguments
    ///
    /// * `max_attempts` - Maximum attempts including initial (clamped to >= 1)
    /// * `base_delay` - Base delay for first retry
    /// * `max_delay` - Maximum delay cap
    /// * `backoff_multiplier` - Multiplier for exponential increase
    #[must_use]
    pub fn new(
        max_attempts: u32,
        base_delay: Duration,
        max_delay: Duration,
        backoff_multiplier: f32,
    ) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
            backoff_multiplier,
        }
    }

    /// Policy allowing `retries` extra attempts, default delays otherwise.
    #[must_use]
    pub fn with_max_retries(retries: u32) -> Self {
        Self {
            max_attempts: retries.min(MAX_RETRIES_LIMIT) + 1,
            ..Self::default()
        }
    }

    /// Returns the maximum number of attempts configured.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Determines whether to retry after `attempt` (1-indexed) failed.
    #[instrument(skip(self), fields(max_attempts = self.max_attempts))]
    pub fn should_retry(&self, failure_type: FailureType, attempt: u32) -> RetryDecision {
        match failure_type {
            FailureType::Permanent => {
                return RetryDecision::DoNotRetry {
                    reason: "permanent failure - retry would not help".to_string(),
                };
            }
            FailureType::NeedsAuth => {
                return RetryDecision::DoNotRetry {
                    reason: "access refused for this user - retry would not help".to_string(),
                };
            }
            FailureType::Fatal => {
                return RetryDecision::DoNotRetry {
                    reason: "session lost".to_string(),
                };
            }
            FailureType::Transient => {}
        }

        if attempt >= self.max_attempts {
            debug!(attempt, max = self.max_attempts, "max attempts reached");
            return RetryDecision::DoNotRetry {
                reason: format!("max attempts ({}) exhausted", self.max_attempts),
            };
        }

        let delay = self.calculate_delay(attempt);

        debug!(
            attempt,
            next_attempt = attempt + 1,
            delay_ms = delay.as_millis(),
            "will retry"
        );

        RetryDecision::Retry {
            delay,
            attempt: attempt + 1,
        }
    }

    /// Formula: `min(base_delay * multiplier^(attempt - 1), max_delay) + jitter`
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn calculate_delay(&self, attempt: u32) -> Duration {
        let base_ms = self.base_delay.as_millis() as f64;
        let multiplier = f64::from(self.backoff_multiplier);

        let exponent = f64::from(attempt.saturating_sub(1));
        let delay_ms = base_ms * multiplier.powf(exponent);

        let capped_ms = delay_ms.min(self.max_delay.as_millis() as f64);

        Duration::from_millis(capped_ms as u64) + self.calculate_jitter()
    }

    #[allow(clippy::cast_possible_truncation)]
    fn calculate_jitter(&self) -> Duration {
        let cap = MAX_JITTER.min(self.base_delay).as_millis() as u64;
        if cap == 0 {
            return Duration::ZERO;
        }
        let jitter_ms = rand::thread_rng().gen_range(0..=cap);
        Duration::from_millis(jitter_ms)
    }
}

/// Classifies a remote error into a failure type for retry decisions.
///
/// | Error | Type |
/// |-------|------|
/// | `Transfer`, 4xx reply | Transient |
/// | `Transfer`, no reply code | Transient |
/// | `Transfer`, 530/532 | NeedsAuth |
/// | `Transfer`, other 5xx | Permanent |
/// | `AccessDenied` | NeedsAuth |
/// | `LocalIo` | Permanent |
/// | `Connect`, `Auth`, `ConnectionLost` | Fatal |
#[instrument(level = "debug")]
pub fn classify_error(error: &RemoteError) -> FailureType {
    match error {
        RemoteError::Transfer { code, .. } => code.map_or(FailureType::Transient, classify_reply),
        RemoteError::AccessDenied { .. } => FailureType::NeedsAuth,
        RemoteError::LocalIo { .. } => FailureType::Permanent,
        RemoteError::Connect { .. }
        | RemoteError::Auth { .. }
        | RemoteError::ConnectionLost { .. } => FailureType::Fatal,
    }
}

/// Classifies an FTP reply code.
#[allow(clippy::match_same_arms)]
fn classify_reply(code: u32) -> FailureType {
    match code {
        421 => FailureType::Fatal,                  // Service not available, closing
        530 | 532 => FailureType::NeedsAuth,        // Not logged in / need account
        400..=499 => FailureType::Transient,        // Transient negative completion
        500..=599 => FailureType::Permanent,        // Permanent negative completion
        _ => FailureType::Permanent,
    }
}
