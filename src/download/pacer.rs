//! Randomized politeness delay between remote operations.
//!
//! The crawl pauses after every directory visit and every download attempt
//! sequence. Each pause is a uniformly random duration in `[0, max]`, drawn
//! with 10 ms precision, so the request pattern does not look mechanical.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use ftp_crawler_core::download::Pacer;
//!
//! let pacer = Pacer::new(Duration::from_millis(20));
//! let waited = pacer.pause();
//! assert!(waited <= Duration::from_millis(20));
//! assert_eq!(pacer.pauses(), 1);
//!
//! assert!(Pacer::disabled().is_disabled());
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, instrument, warn};

/// Default upper bound of a single pause.
pub const DEFAULT_MAX_PACE: Duration = Duration::from_secs(2);

/// Granularity of the random draw.
const PACE_STEP_MS: u64 = 10;

/// Cumulative pacing after which a one-time warning is logged.
const CUMULATIVE_PACE_WARNING_THRESHOLD: Duration = Duration::from_secs(300);

/// Randomized pacing between remote operations.
///
/// Cloning is cheap; clones share their counters.
#[derive(Debug, Clone)]
pub struct Pacer {
    max_delay: Duration,
    disabled: bool,
    state: Arc<PacerState>,
}

#[derive(Debug, Default)]
struct PacerState {
    pauses: AtomicU64,
    cumulative_delay_ms: AtomicU64,
}

impl PacerState {
    /// Adds to the cumulative delay and returns the new total.
    #[allow(clippy::cast_possible_truncation)]
    fn record(&self, delay: Duration) -> Duration {
        self.pauses.fetch_add(1, Ordering::SeqCst);
        let delay_ms = delay.as_millis() as u64;
        let new_total = self
            .cumulative_delay_ms
            .fetch_add(delay_ms, Ordering::SeqCst)
            + delay_ms;
        Duration::from_millis(new_total)
    }
}

impl Default for Pacer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PACE)
    }
}

impl Pacer {
    /// Creates a pacer with the given upper bound. A zero bound disables pacing.
    #[must_use]
    #[instrument(skip_all, fields(max_ms = max_delay.as_millis()))]
    pub fn new(max_delay: Duration) -> Self {
        if max_delay.is_zero() {
            return Self::disabled();
        }
        debug!("creating pacer");
        Self {
            max_delay,
            disabled: false,
            state: Arc::new(PacerState::default()),
        }
    }

    /// A pacer that never sleeps and records nothing.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            max_delay: Duration::ZERO,
            disabled: true,
            state: Arc::new(PacerState::default()),
        }
    }

    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    #[must_use]
    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    /// Sleeps for a random duration in `[0, max]` and returns it.
    pub fn pause(&self) -> Duration {
        if self.disabled {
            return Duration::ZERO;
        }
        let delay = self.draw();
        self.sleep_and_record(delay, "pacing");
        delay
    }

    /// Sleeps for a fixed duration, counted like a pause. Used for retry backoff.
    pub fn wait(&self, delay: Duration) {
        if self.disabled || delay.is_zero() {
            return;
        }
        self.sleep_and_record(delay, "backoff");
    }

    /// Number of pauses taken across all clones.
    #[must_use]
    pub fn pauses(&self) -> u64 {
        self.state.pauses.load(Ordering::SeqCst)
    }

    /// Total time slept across all clones.
    #[must_use]
    pub fn cumulative_delay(&self) -> Duration {
        Duration::from_millis(self.state.cumulative_delay_ms.load(Ordering::SeqCst))
    }

    #[allow(clippy::cast_possible_truncation)]
    fn draw(&self) -> Duration {
        let steps = self.max_delay.as_millis() as u64 / PACE_STEP_MS;
        if steps == 0 {
            return Duration::ZERO;
        }
        let step = rand::thread_rng().gen_range(0..=steps);
        Duration::from_millis(step * PACE_STEP_MS)
    }

    fn sleep_and_record(&self, delay: Duration, kind: &'static str) {
        let before = self.cumulative_delay();
        let cumulative = self.state.record(delay);
        debug!(
            kind,
            delay_ms = delay.as_millis(),
            cumulative_ms = cumulative.as_millis(),
            "pausing"
        );
        if before < CUMULATIVE_PACE_WARNING_THRESHOLD
            && cumulative >= CUMULATIVE_PACE_WARNING_THRESHOLD
        {
            warn!(
                cumulative_delay_secs = cumulative.as_secs(),
                "pacing has added over five minutes to this run - lower --pace-max-ms to speed up"
            );
        }
        if !delay.is_zero() {
            thread::sleep(delay);
        }
    }
}
