//! Debounced notifier

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::sink::NotifySink;

/// Notifier configuration
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    /// Minimum spacing between dispatched notifications
    pub min_interval: Duration,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            min_interval: Duration::from_secs(30),
        }
    }
}

impl NotifierConfig {
    /// Set the minimum dispatch interval
    pub fn min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = interval;
        self
    }
}

struct NotifierShared {
    wake: Notify,
    done: AtomicBool,
}

/// Coalesces bursty triggers into rate-limited external calls.
///
/// One background task runs from construction until [`shutdown`]
/// (Self::shutdown). [`trigger`](Self::trigger) never blocks the caller;
/// triggers landing inside the suppression window are dropped. The external
/// call itself runs concurrently with the wait loop, so a slow sink never
/// delays trigger handling.
pub struct DebouncedNotifier {
    shared: Arc<NotifierShared>,
    task: JoinHandle<()>,
}

impl DebouncedNotifier {
    /// Start the background dispatch loop
    pub fn spawn<S: NotifySink>(sink: S, config: NotifierConfig) -> Self {
        let shared = Arc::new(NotifierShared {
            wake: Notify::new(),
            done: AtomicBool::new(false),
        });

        let task = tokio::spawn(dispatch_loop(
            Arc::clone(&shared),
            Arc::new(sink),
            config.min_interval,
        ));

        Self { shared, task }
    }

    /// Wake the dispatch loop.
    ///
    /// Non-blocking; callable from any task at any frequency. Concurrent
    /// triggers coalesce into one wake.
    pub fn trigger(&self) {
        self.shared.wake.notify_one();
    }

    /// Stop the loop and wait for the background task to exit.
    pub async fn shutdown(self) {
        self.shared.done.store(true, Ordering::Release);
        self.shared.wake.notify_one();
        let _ = self.task.await;
        tracing::debug!("Notifier stopped");
    }
}

async fn dispatch_loop<S: NotifySink>(
    shared: Arc<NotifierShared>,
    sink: Arc<S>,
    min_interval: Duration,
) {
    // None until the first dispatch, so the first trigger always fires.
    let mut last_fired: Option<Instant> = None;
    let mut dispatches = tokio::task::JoinSet::new();

    loop {
        shared.wake.notified().await;

        // Reap dispatches that have already finished.
        while dispatches.try_join_next().is_some() {}

        if shared.done.load(Ordering::Acquire) {
            break;
        }

        if let Some(fired_at) = last_fired {
            if fired_at.elapsed() < min_interval {
                // Inside the suppression window: drop this trigger.
                continue;
            }
        }

        last_fired = Some(Instant::now());

        // Fire-and-log, concurrent with the next wait cycle.
        let sink = Arc::clone(&sink);
        dispatches.spawn(async move {
            if let Err(e) = sink.dispatch().await {
                tracing::warn!(error = %e, "Notification dispatch failed");
            }
        });
    }

    // Shutdown is not complete until in-flight calls have finished.
    while dispatches.join_next().await.is_some() {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use std::sync::atomic::AtomicUsize;

    struct CountingSink {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    impl NotifySink for CountingSink {
        async fn dispatch(&self) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(Error::Notify("synthetic failure".into()))
            } else {
                Ok(())
            }
        }
    }

    fn counting(fail: bool) -> (CountingSink, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            CountingSink {
                calls: Arc::clone(&calls),
                fail,
            },
            calls,
        )
    }

    #[tokio::test]
    async fn test_burst_fires_once() {
        let (sink, calls) = counting(false);
        let config = NotifierConfig::default().min_interval(Duration::from_millis(200));
        let notifier = DebouncedNotifier::spawn(sink, config);

        for _ in 0..5 {
            notifier.trigger();
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        notifier.shutdown().await;
    }

    #[tokio::test]
    async fn test_triggers_across_windows_fire_twice() {
        let (sink, calls) = counting(false);
        let config = NotifierConfig::default().min_interval(Duration::from_millis(50));
        let notifier = DebouncedNotifier::spawn(sink, config);

        notifier.trigger();
        tokio::time::sleep(Duration::from_millis(100)).await;
        notifier.trigger();
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);

        notifier.shutdown().await;
    }

    #[tokio::test]
    async fn test_suppressed_triggers_are_dropped_not_queued() {
        let (sink, calls) = counting(false);
        let config = NotifierConfig::default().min_interval(Duration::from_millis(100));
        let notifier = DebouncedNotifier::spawn(sink, config);

        notifier.trigger();
        tokio::time::sleep(Duration::from_millis(20)).await;
        notifier.trigger();
        notifier.trigger();

        // Past the window with no further triggers: the dropped ones must
        // not fire retroactively.
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        notifier.shutdown().await;
    }

    #[tokio::test]
    async fn test_failures_do_not_block_later_triggers() {
        let (sink, calls) = counting(true);
        let config = NotifierConfig::default().min_interval(Duration::from_millis(30));
        let notifier = DebouncedNotifier::spawn(sink, config);

        notifier.trigger();
        tokio::time::sleep(Duration::from_millis(60)).await;
        notifier.trigger();
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);

        notifier.shutdown().await;
    }

    struct SlowSink {
        finished: Arc<AtomicBool>,
        delay: Duration,
    }

    impl NotifySink for SlowSink {
        async fn dispatch(&self) -> Result<()> {
            tokio::time::sleep(self.delay).await;
            self.finished.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_shutdown_waits_for_inflight_dispatch() {
        let finished = Arc::new(AtomicBool::new(false));
        let sink = SlowSink {
            finished: Arc::clone(&finished),
            delay: Duration::from_millis(200),
        };
        let notifier = DebouncedNotifier::spawn(sink, NotifierConfig::default());

        notifier.trigger();
        // Give the loop a moment to start the dispatch.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!finished.load(Ordering::SeqCst));

        notifier.shutdown().await;
        assert!(finished.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_shutdown_joins_background_task() {
        let (sink, calls) = counting(false);
        let notifier = DebouncedNotifier::spawn(sink, NotifierConfig::default());

        tokio::time::timeout(Duration::from_secs(1), notifier.shutdown())
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
