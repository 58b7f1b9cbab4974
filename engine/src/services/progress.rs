//! Progress tracker (component O): a thread-safe counter propagated
//! through analyzer calls via an ambient context value, spec.md §4.O/§9.
//!
//! Grounded on the *structure* of `server/src/services/progress.rs`'s
//! `ProgressTracker`, minus its indicatif terminal rendering — spec.md
//! §1 explicitly keeps terminal progress rendering out of scope for the
//! core. A CLI-edge wrapper (see `cli`) may attach an indicatif bar as
//! the callback; the core itself never touches a terminal.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Invoked from worker threads as work completes; implementors are
/// responsible for thread safety (spec.md §9).
pub type ProgressCallback = Arc<dyn Fn(u64, u64, &str) + Send + Sync>;

#[derive(Clone)]
pub struct ProgressTracker {
    total: Arc<AtomicU64>,
    current: Arc<AtomicU64>,
    callback: Option<ProgressCallback>,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        ProgressTracker { total: Arc::new(AtomicU64::new(0)), current: Arc::new(AtomicU64::new(0)), callback: None }
    }
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback) -> Self {
        ProgressTracker { callback: Some(callback), ..Self::default() }
    }

    pub fn set_total(&self, n: u64) {
        self.total.store(n, Ordering::SeqCst);
    }

    pub fn add(&self, n: u64) {
        self.total.fetch_add(n, Ordering::SeqCst);
    }

    /// Increments `current` and invokes the callback, if present, with
    /// `(current, total, path)`.
    pub fn tick(&self, path: &str) {
        let current = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        let total = self.total.load(Ordering::SeqCst);
        if let Some(cb) = &self.callback {
            cb(current, total, path);
        }
    }

    pub fn current(&self) -> u64 {
        self.current.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> u64 {
        self.total.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn tick_increments_current_and_invokes_callback() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen2 = seen.clone();
        let tracker = ProgressTracker::with_callback(Arc::new(move |cur, total, path| {
            seen2.lock().unwrap().push((cur, total, path.to_string()));
        }));
        tracker.set_total(2);
        tracker.tick("a.rs");
        tracker.tick("b.rs");
        assert_eq!(tracker.current(), 2);
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[test]
    fn absence_of_callback_is_tolerated() {
        let tracker = ProgressTracker::new();
        tracker.tick("a.rs"); // must not panic
        assert_eq!(tracker.current(), 1);
    }
}
