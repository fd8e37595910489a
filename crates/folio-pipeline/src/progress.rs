// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Progress reporting for tool runs and editor setup.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;
use tracing::{debug, info};

/// Receives the current step of a long-running operation.
pub trait ProgressSink: Send + Sync {
    /// Show `message` as the current step, replacing the previous one.
    fn report(&self, message: &str);

    /// Nothing is in progress any more.
    fn clear(&self);
}

/// Publishes the current message on a watch channel; `None` when idle.
#[derive(Debug)]
pub struct WatchProgress {
    tx: watch::Sender<Option<String>>,
}

impl WatchProgress {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> Option<String> {
        self.tx.borrow().clone()
    }
}

impl Default for WatchProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for WatchProgress {
    fn report(&self, message: &str) {
        self.tx.send_replace(Some(message.to_string()));
    }

    fn clear(&self) {
        self.tx.send_replace(None);
    }
}

/// Writes progress to the log. Used by the command-line host.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn report(&self, message: &str) {
        info!(progress = message, "Progress");
    }

    fn clear(&self) {
        debug!("Progress cleared");
    }
}

/// Forwards to the session's sink only while the session is still in the
/// generation a run started in. A run outlived by a reset or tool change
/// goes quiet.
pub(crate) struct GenerationProgress {
    inner: Arc<dyn ProgressSink>,
    current: Arc<AtomicU64>,
    generation: u64,
}

impl GenerationProgress {
    pub(crate) fn new(inner: Arc<dyn ProgressSink>, current: Arc<AtomicU64>) -> Self {
        let generation = current.load(Ordering::SeqCst);
        Self {
            inner,
            current,
            generation,
        }
    }

    fn is_current(&self) -> bool {
        self.current.load(Ordering::SeqCst) == self.generation
    }
}

impl ProgressSink for GenerationProgress {
    fn report(&self, message: &str) {
        if self.is_current() {
            self.inner.report(message);
        }
    }

    fn clear(&self) {
        if self.is_current() {
            self.inner.clear();
        }
    }
}

/// Clears the sink when dropped, so unwinding out of a tool still clears it.
pub struct ProgressGuard<'a> {
    sink: &'a dyn ProgressSink,
}

impl<'a> ProgressGuard<'a> {
    pub fn new(sink: &'a dyn ProgressSink) -> Self {
        Self { sink }
    }
}

impl Drop for ProgressGuard<'_> {
    fn drop(&mut self) {
        self.sink.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Counting {
        clears: Mutex<u32>,
    }

    impl ProgressSink for Counting {
        fn report(&self, _message: &str) {}

        fn clear(&self) {
            *self.clears.lock().unwrap() += 1;
        }
    }

    #[test]
    fn watch_progress_publishes_and_clears() {
        let progress = WatchProgress::new();
        let rx = progress.subscribe();
        progress.report("Processing...");
        assert_eq!(rx.borrow().as_deref(), Some("Processing..."));
        progress.clear();
        assert_eq!(progress.current(), None);
    }

    #[test]
    fn guard_clears_once_even_on_panic() {
        let sink = Counting::default();
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = ProgressGuard::new(&sink);
            panic!("tool blew up");
        }));
        assert!(outcome.is_err());
        assert_eq!(*sink.clears.lock().unwrap(), 1);
    }

    #[test]
    fn outdated_generation_goes_quiet() {
        let sink = Arc::new(Counting::default());
        let current = Arc::new(AtomicU64::new(3));
        let progress = GenerationProgress::new(sink.clone(), current.clone());
        progress.clear();
        current.store(4, Ordering::SeqCst);
        progress.clear();
        assert_eq!(*sink.clears.lock().unwrap(), 1);
    }
}
