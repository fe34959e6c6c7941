/// Fixed-interval background polling
///
/// Each `Poller` owns one worker thread that fetches immediately and then
/// once per interval, replacing the shared state wholesale on every cycle.
/// `stop()` (or dropping the poller) cancels the loop, wakes the worker and
/// joins it; a fetch that completes after cancellation is discarded.
///
/// There is no retry: a failed fetch records its error, clears the data and
/// waits for the next tick like any other cycle.

use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::logging::{self, Endpoint};
use crate::model::ApiError;

/// What the last completed cycle produced.
#[derive(Debug, Clone)]
pub struct PollState<T> {
    pub data: Option<T>,
    /// Banner text for the last failure; cleared by the next success.
    pub error: Option<String>,
    /// Committed cycles, successful or not.
    pub cycles: u64,
    pub last_success: Option<DateTime<Utc>>,
}

impl<T> Default for PollState<T> {
    fn default() -> Self {
        PollState { data: None, error: None, cycles: 0, last_success: None }
    }
}

impl<T> PollState<T> {
    /// Applies one fetch outcome.
    pub fn commit(&mut self, outcome: Result<T, ApiError>, now: DateTime<Utc>) {
        match outcome {
            Ok(data) => {
                self.data = Some(data);
                self.error = None;
                self.last_success = Some(now);
            }
            Err(e) => {
                self.data = None;
                self.error = Some(e.to_string());
            }
        }
        self.cycles += 1;
    }
}

struct Shared<T> {
    state: Mutex<PollState<T>>,
    cancelled: Mutex<bool>,
    wake: Condvar,
}

fn lock<U>(m: &Mutex<U>) -> MutexGuard<'_, U> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct Poller<T> {
    name: String,
    shared: Arc<Shared<T>>,
    handle: Option<JoinHandle<()>>,
}

impl<T: Clone + Send + 'static> Poller<T> {
    /// Starts polling. The first fetch runs right away on the worker thread.
    pub fn start<F>(name: &str, source: Endpoint, interval: Duration, mut fetch: F) -> Self
    where
        F: FnMut() -> Result<T, ApiError> + Send + 'static,
    {
        let shared = Arc::new(Shared {
            state: Mutex::new(PollState::default()),
            cancelled: Mutex::new(false),
            wake: Condvar::new(),
        });

        let worker = Arc::clone(&shared);
        let worker_name = name.to_string();
        let handle = thread::spawn(move || {
            loop {
                if *lock(&worker.cancelled) {
                    break;
                }

                let outcome = fetch();
                if let Err(ref e) = outcome {
                    logging::log_api_failure(source, &worker_name, e);
                }

                // Commit under the cancel lock so stop() cannot interleave.
                let cancelled = lock(&worker.cancelled);
                if *cancelled {
                    logging::debug(source, None, &format!("{}: discarding result after stop", worker_name));
                    break;
                }
                lock(&worker.state).commit(outcome, Utc::now());

                let (cancelled, _) = worker
                    .wake
                    .wait_timeout_while(cancelled, interval, |c| !*c)
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                if *cancelled {
                    break;
                }
            }
        });

        logging::info(source, None, &format!("{}: polling every {}s", name, interval.as_secs()));

        Poller { name: name.to_string(), shared, handle: Some(handle) }
    }
}

impl<T> Poller<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Marks the loop cancelled and wakes the worker without waiting for it.
    /// A fetch already in flight finishes but its result is discarded.
    pub fn cancel(&self) {
        {
            let mut cancelled = lock(&self.shared.cancelled);
            *cancelled = true;
        }
        self.shared.wake.notify_all();
    }

    /// Cancels the loop and waits for the worker to exit. Idempotent.
    pub fn stop(&mut self) {
        self.cancel();

        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                logging::error(Endpoint::System, None, &format!("{}: worker panicked", self.name));
            }
        }
    }
}

impl<T: Clone> Poller<T> {
    pub fn snapshot(&self) -> PollState<T> {
        lock(&self.shared.state).clone()
    }
}

impl<T> Drop for Poller<T> {
    fn drop(&mut self) {
        self.stop();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::mpsc;
    use std::time::Instant;

    const WAIT: Duration = Duration::from_secs(5);

    #[test]
    fn test_commit_success_then_failure() {
        let now = Utc::now();
        let mut state: PollState<Vec<u32>> = PollState::default();

        state.commit(Ok(vec![1, 2]), now);
        assert_eq!(state.data, Some(vec![1, 2]));
        assert_eq!(state.error, None);
        assert_eq!(state.last_success, Some(now));

        state.commit(Err(ApiError::Network("refused".to_string())), now);
        assert_eq!(state.data, None, "a failed poll clears the displayed list");
        assert_eq!(state.error.as_deref(), Some("Network error: refused"));
        assert_eq!(state.last_success, Some(now), "last success survives a failure");

        state.commit(Ok(vec![3]), now);
        assert_eq!(state.error, None, "the next good poll clears the banner");
        assert_eq!(state.cycles, 3);
    }

    #[test]
    fn test_fetches_immediately_then_on_interval() {
        let (tick_tx, tick_rx) = mpsc::channel();
        let mut calls = 0u32;
        let mut poller = Poller::start("test", Endpoint::System, Duration::from_millis(20), move || {
            calls += 1;
            let _ = tick_tx.send(calls);
            Ok(calls)
        });

        // The third fetch only starts once the second result is committed.
        for expected in 1..=3 {
            assert_eq!(tick_rx.recv_timeout(WAIT), Ok(expected));
        }
        poller.stop();

        let state = poller.snapshot();
        assert!(state.cycles >= 2, "expected several cycles, got {}", state.cycles);
        assert!(state.data.unwrap_or(0) >= 2);
        assert!(state.last_success.is_some());
        assert!(!poller.is_running());
    }

    #[test]
    fn test_result_after_stop_is_discarded() {
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let mut poller = Poller::start("slow", Endpoint::System, Duration::from_secs(60), move || {
            let _ = started_tx.send(());
            let _ = release_rx.recv_timeout(WAIT);
            Ok(1u8)
        });

        started_rx.recv_timeout(WAIT).expect("first fetch should start");
        poller.cancel();
        release_tx.send(()).expect("worker is waiting on the release");
        poller.stop();

        let state = poller.snapshot();
        assert_eq!(state.cycles, 0, "in-flight result must not be applied after stop");
        assert_eq!(state.data, None);
    }

    #[test]
    fn test_stop_wakes_a_sleeping_worker() {
        let (tick_tx, tick_rx) = mpsc::channel();
        let mut poller = Poller::start("idle", Endpoint::System, Duration::from_secs(3600), move || {
            let _ = tick_tx.send(());
            Ok(())
        });
        tick_rx.recv_timeout(WAIT).expect("first fetch runs immediately");

        let started = Instant::now();
        poller.stop();
        assert!(started.elapsed() < WAIT, "stop must not wait out the interval");
        poller.stop();
        assert!(!poller.is_running());
    }

    #[test]
    fn test_drop_releases_worker() {
        let calls = Arc::new(AtomicU32::new(0));
        {
            let counter = Arc::clone(&calls);
            let (tick_tx, tick_rx) = mpsc::channel();
            let _poller = Poller::start("scoped", Endpoint::System, Duration::from_millis(5), move || {
                counter.fetch_add(1, Ordering::SeqCst);
                let _ = tick_tx.send(());
                Ok(())
            });
            tick_rx.recv_timeout(WAIT).expect("worker should be polling");
        }
        // Drop joined the worker, so the count can no longer move.
        let after_drop = calls.load(Ordering::SeqCst);
        assert!(after_drop >= 1);
        thread::sleep(Duration::from_millis(30));
        assert_eq!(calls.load(Ordering::SeqCst), after_drop, "no fetches after the poller is dropped");
    }
}
