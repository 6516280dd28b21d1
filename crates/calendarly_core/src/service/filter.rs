//! Debounced text filter trigger.
//!
//! # Responsibility
//! - Collapse bursts of filter keystrokes into one evaluation.
//!
//! # Invariants
//! - Last write wins: a newer `submit` supersedes any pending text.
//! - A pending text is released at most once.
//! - Time is passed in by the caller; nothing here reads the clock.

use crate::config::FILTER_DEBOUNCE_MS;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct Pending {
    text: String,
    submitted_at: Instant,
}

/// Last-write-wins debouncer for filter input.
#[derive(Debug, Clone)]
pub struct FilterDebouncer {
    quiet: Duration,
    pending: Option<Pending>,
}

impl Default for FilterDebouncer {
    fn default() -> Self {
        Self::new(Duration::from_millis(FILTER_DEBOUNCE_MS))
    }
}

impl FilterDebouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: None,
        }
    }

    /// Records a keystroke, replacing any text still waiting.
    pub fn submit(&mut self, text: impl Into<String>, now: Instant) {
        self.pending = Some(Pending {
            text: text.into(),
            submitted_at: now,
        });
    }

    /// Drops any pending text without releasing it.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Releases the pending text once the quiet period has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        let ready = self
            .pending
            .as_ref()
            .is_some_and(|p| now.saturating_duration_since(p.submitted_at) >= self.quiet);
        if ready {
            self.pending.take().map(|p| p.text)
        } else {
            None
        }
    }
}
