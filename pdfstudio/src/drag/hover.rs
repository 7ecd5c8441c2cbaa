//! Debounced drop-target tracking.
//!
//! Moving the pointer between two adjacent drop zones produces a `leave`
//! immediately followed by an `over`. Clearing the target on every `leave`
//! makes the insertion marker flicker, so a `leave` only schedules the clear
//! and a later `over` cancels it.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Source of the current time.
pub trait Clock {
    /// Current instant.
    fn now(&self) -> Instant;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl ManualClock {
    /// Start at the current wall-clock instant.
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
        }
    }

    /// Move time forward.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Drop-target state with a debounced clear.
#[derive(Debug, Clone)]
pub struct HoverIntent {
    debounce: Duration,
    target: Option<usize>,
    clear_at: Option<Instant>,
}

impl HoverIntent {
    /// Create with the given leave debounce.
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            target: None,
            clear_at: None,
        }
    }

    /// Pointer is over the drop zone at `flat_index`.
    pub fn over(&mut self, flat_index: usize) {
        self.clear_at = None;
        self.target = Some(flat_index);
    }

    /// Pointer left a drop zone at `now`.
    pub fn leave(&mut self, now: Instant) {
        if self.target.is_some() {
            self.clear_at = Some(now + self.debounce);
        }
    }

    /// Apply a pending clear if its deadline has passed.
    pub fn tick(&mut self, now: Instant) {
        if self.clear_at.is_some_and(|deadline| now >= deadline) {
            self.target = None;
            self.clear_at = None;
        }
    }

    /// Current target as of `now`.
    pub fn target(&mut self, now: Instant) -> Option<usize> {
        self.tick(now);
        self.target
    }

    /// Whether a clear is scheduled.
    pub fn is_clear_pending(&self) -> bool {
        self.clear_at.is_some()
    }

    /// Forget the target and any scheduled clear.
    pub fn reset(&mut self) {
        self.target = None;
        self.clear_at = None;
    }
}
