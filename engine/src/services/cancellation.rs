//! Cooperative cancellation (spec.md §5): every long-running operation
//! accepts a token, checks it between units of work, and on trip stops
//! enqueuing new work and returns `EngineError::OperationCancelled`
//! without surfacing partial results.
//!
//! No direct upstream file implements this; the shape (a cheap
//! `Arc<AtomicBool>` flag, checked cooperatively rather than through
//! preemptive interrupts) follows the general preference elsewhere in
//! this codebase for atomics over channels for simple shared flags (e.g.
//! `services/progress.rs`).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{EngineError, EngineResult};

#[derive(Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Returns `Err(OperationCancelled)` if tripped; analyzers call this
    /// between commits/files rather than mid-unit-of-work.
    pub fn check(&self) -> EngineResult<()> {
        if self.is_cancelled() {
            Err(EngineError::OperationCancelled)
        } else {
            Ok(())
        }
    }
}

/// Runs a VCS-bound closure with the default 5-minute deadline from
/// spec.md §5; expiry cancels the token so in-flight analyzer loops
/// observe it on their next cooperative check.
pub fn with_deadline<T, F>(token: &CancellationToken, deadline: std::time::Duration, f: F) -> EngineResult<T>
where
    F: FnOnce() -> EngineResult<T> + Send + 'static,
    T: Send + 'static,
{
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_time()
        .build()
        .map_err(|e| EngineError::CommitStreamError(e.to_string()))?;
    let token_for_timeout = token.clone();
    rt.block_on(async move {
        let handle = tokio::task::spawn_blocking(f);
        match tokio::time::timeout(deadline, handle).await {
            Ok(joined) => joined.map_err(|e| EngineError::CommitStreamError(e.to_string()))?,
            Err(_) => {
                token_for_timeout.cancel();
                Err(EngineError::OperationCancelled)
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_token_is_not_cancelled() {
        let token = CancellationToken::new();
        assert!(token.check().is_ok());
    }

    #[test]
    fn cancel_is_observed() {
        let token = CancellationToken::new();
        token.cancel();
        assert!(matches!(token.check(), Err(EngineError::OperationCancelled)));
    }

    #[test]
    fn deadline_lets_fast_work_through() {
        let token = CancellationToken::new();
        let result = with_deadline(&token, std::time::Duration::from_secs(5), || Ok(42));
        assert_eq!(result.unwrap(), 42);
        assert!(!token.is_cancelled());
    }

    #[test]
    fn deadline_trips_on_slow_work() {
        let token = CancellationToken::new();
        let result: EngineResult<()> = with_deadline(&token, std::time::Duration::from_millis(20), || {
            std::thread::sleep(std::time::Duration::from_millis(200));
            Ok(())
        });
        assert!(matches!(result, Err(EngineError::OperationCancelled)));
        assert!(token.is_cancelled());
    }
}
