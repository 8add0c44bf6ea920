//! Delay propagation of a rapidly changing value (typically the search box)
//! until it has been stable for a fixed interval.

use std::time::{Duration, Instant};

use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Delay applied to search input before it reaches the filters.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

/// Async debouncer backed by a tokio task.
///
/// Every [`set`](Debouncer::set) restarts the timer; the settled value is
/// published to subscribers once `delay` passes without input. Dropping the
/// debouncer aborts the task, so nothing is published after teardown.
pub struct Debouncer<T> {
    input: watch::Sender<T>,
    output: watch::Receiver<T>,
    task: JoinHandle<()>,
}

impl<T> Debouncer<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Must be called from within a tokio runtime.
    pub fn new(initial: T, delay: Duration) -> Self {
        let (input, mut input_rx) = watch::channel(initial.clone());
        let (output_tx, output) = watch::channel(initial);

        let task = tokio::spawn(async move {
            while input_rx.changed().await.is_ok() {
                loop {
                    tokio::select! {
                        changed = input_rx.changed() => {
                            if changed.is_err() {
                                return;
                            }
                        }
                        _ = tokio::time::sleep(delay) => break,
                    }
                }

                let settled = input_rx.borrow_and_update().clone();
                output_tx.send_if_modified(|current| {
                    if *current != settled {
                        *current = settled;
                        true
                    } else {
                        false
                    }
                });
            }
        });

        Self {
            input,
            output,
            task,
        }
    }

    pub fn set(&self, value: T) {
        // Only fails once the task is gone, i.e. during teardown
        let _ = self.input.send(value);
    }

    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.output.clone()
    }

    /// Last settled value.
    pub fn current(&self) -> T {
        self.output.borrow().clone()
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Clock-driven debounce for loops that already poll on a tick.
#[derive(Debug, Clone)]
pub struct Debounce<T> {
    delay: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debounce<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Record a new input observed at `now`, replacing anything pending.
    pub fn push(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now + self.delay));
    }

    /// Take the pending value if it has been stable for the full delay.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((_, deadline)) if *deadline <= now => self.pending.take().map(|(value, _)| value),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}
