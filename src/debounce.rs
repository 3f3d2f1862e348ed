//! Debounce gate for continuous-feedback operations.
//!
//! Cursor movement fires far more often than a checker round trip can keep
//! up with. The gate collapses rapid repeated triggers into a single delayed
//! dispatch per key (one key per open document): re-triggering before the
//! delay elapses cancels and replaces the pending timer, so the last trigger
//! wins and nothing queues.
//!
//! Cancellation is timer-only. Once the delay has elapsed the action is
//! detached onto its own task and runs to completion; an in-flight checker
//! call is never aborted mid-way.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Collapses rapid repeated triggers into one delayed action per key.
///
/// Must be used from within a tokio runtime.
#[derive(Debug, Default)]
pub struct DebounceGate {
    /// Pending timer per key. Entries for fired timers go stale until the
    /// next trigger replaces them; aborting a finished task is a no-op.
    pending: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl DebounceGate {
    /// Creates an empty gate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `action` to run after `delay`, superseding any timer still
    /// pending for `key`.
    ///
    /// A `delay` of zero degenerates to execution on the next scheduler
    /// tick. The arguments of a superseded trigger are dropped with its
    /// timer; most recent call wins.
    pub fn trigger<F, Fut>(&self, key: impl Into<String>, delay: Duration, action: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Past this point the work is no longer cancelable: detach it so
            // that aborting the timer handle cannot reach a started action.
            tokio::spawn(action());
        });

        let previous = self
            .pending
            .lock()
            .expect("debounce gate lock poisoned")
            .insert(key.into(), timer);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    /// Cancels the pending timer for `key`, if any. Started actions are
    /// unaffected.
    pub fn cancel(&self, key: &str) {
        if let Some(timer) = self
            .pending
            .lock()
            .expect("debounce gate lock poisoned")
            .remove(key)
        {
            timer.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    // Timing-sensitive tests run serialized so parallel load cannot skew
    // the windows.

    #[tokio::test]
    #[serial]
    async fn test_rapid_triggers_collapse_to_last() {
        let gate = DebounceGate::new();
        let fired = Arc::new(Mutex::new(Vec::new()));

        for i in 1..=5u32 {
            let fired = Arc::clone(&fired);
            gate.trigger("doc", Duration::from_millis(50), move || async move {
                fired.lock().unwrap().push(i);
            });
        }

        tokio::time::sleep(Duration::from_millis(200)).await;
        // Exactly one action ran, with the arguments of the last trigger.
        assert_eq!(*fired.lock().unwrap(), vec![5]);
    }

    #[tokio::test]
    #[serial]
    async fn test_keys_are_independent() {
        let gate = DebounceGate::new();
        let count = Arc::new(AtomicU32::new(0));

        for key in ["a.js", "b.js"] {
            let count = Arc::clone(&count);
            gate.trigger(key, Duration::from_millis(10), move || async move {
                count.fetch_add(1, Ordering::SeqCst);
            });
        }

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    #[serial]
    async fn test_zero_delay_runs_on_next_tick() {
        let gate = DebounceGate::new();
        let count = Arc::new(AtomicU32::new(0));

        let c = Arc::clone(&count);
        gate.trigger("doc", Duration::ZERO, move || async move {
            c.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    #[serial]
    async fn test_retrigger_after_fire_runs_again() {
        let gate = DebounceGate::new();
        let count = Arc::new(AtomicU32::new(0));

        for _ in 0..2 {
            let c = Arc::clone(&count);
            gate.trigger("doc", Duration::from_millis(10), move || async move {
                c.fetch_add(1, Ordering::SeqCst);
            });
            tokio::time::sleep(Duration::from_millis(80)).await;
        }

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    #[serial]
    async fn test_cancel_drops_pending_timer() {
        let gate = DebounceGate::new();
        let count = Arc::new(AtomicU32::new(0));

        let c = Arc::clone(&count);
        gate.trigger("doc", Duration::from_millis(50), move || async move {
            c.fetch_add(1, Ordering::SeqCst);
        });
        gate.cancel("doc");

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
