//! Shared utility functions used across multiple modules.

use std::sync::atomic::{AtomicI64, Ordering};

/// Normalize optional text by trimming whitespace and removing empties.
///
/// Returns `None` when the input is `None` or the trimmed value is empty.
pub fn normalize_text_option(value: Option<String>) -> Option<String> {
    let value = value?;
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Check if a string starts with `http://` or `https://`.
pub fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

/// Truncate text to at most 180 characters for error messages.
pub fn compact_text(value: &str) -> String {
    value.trim().chars().take(180).collect()
}

/// Millisecond clock that never hands out the same value twice.
///
/// Row timestamps double as optimistic-concurrency tokens, so two writes in
/// the same millisecond must still get distinct, increasing stamps.
#[derive(Debug, Default)]
pub struct MonotonicClock {
    last: AtomicI64,
}

impl MonotonicClock {
    pub const fn new() -> Self {
        Self {
            last: AtomicI64::new(0),
        }
    }

    /// Current unix time in ms, bumped past the previously issued value.
    pub fn now_millis(&self) -> i64 {
        let wall = chrono::Utc::now().timestamp_millis();
        let mut previous = self.last.load(Ordering::Relaxed);
        loop {
            let next = wall.max(previous + 1);
            match self.last.compare_exchange_weak(
                previous,
                next,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return next,
                Err(actual) => previous = actual,
            }
        }
    }
}

/// Process-wide clock used for row stamps.
pub fn now_millis() -> i64 {
    static CLOCK: MonotonicClock = MonotonicClock::new();
    CLOCK.now_millis()
}
