// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! A subscriber that records everything it is told.

use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::time::timeout;

use matchflow_core::{FlowError, Subscriber};

const WAIT_TIMEOUT: Duration = Duration::from_secs(2);

struct Recorded<T> {
    values: Vec<T>,
    completed: bool,
    error: Option<FlowError>,
    /// Counts every terminal signal, including contract-violating extras.
    terminal_count: usize,
}

/// Records all notifications and exposes both synchronous accessors and
/// awaitable assertions. Waiters time out after two seconds and panic with
/// a description of what they were waiting for.
pub struct RecordingSubscriber<T> {
    state: Mutex<Recorded<T>>,
    notify: Notify,
}

impl<T> Default for RecordingSubscriber<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RecordingSubscriber<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(Recorded {
                values: Vec::new(),
                completed: false,
                error: None,
                terminal_count: 0,
            }),
            notify: Notify::new(),
        }
    }

    pub fn value_count(&self) -> usize {
        self.state.lock().values.len()
    }

    pub fn is_completed(&self) -> bool {
        self.state.lock().completed
    }

    pub fn error(&self) -> Option<FlowError> {
        self.state.lock().error.clone()
    }

    pub fn terminal_count(&self) -> usize {
        self.state.lock().terminal_count
    }

    /// Waits until at least `n` values have been recorded.
    pub async fn wait_for_values(&self, n: usize) {
        self.wait_until(
            |state| state.values.len() >= n,
            &format!("{n} recorded values"),
        )
        .await;
    }

    /// Waits for `on_completed`.
    pub async fn wait_for_completion(&self) {
        self.wait_until(|state| state.completed, "completion").await;
    }

    /// Waits for `on_error` and returns the recorded error.
    pub async fn wait_for_error(&self) -> FlowError {
        self.wait_until(|state| state.error.is_some(), "an error")
            .await;
        self.state
            .lock()
            .error
            .clone()
            .unwrap_or_else(|| unreachable!("error recorded but missing"))
    }

    async fn wait_until(&self, condition: impl Fn(&Recorded<T>) -> bool, what: &str) {
        loop {
            if condition(&self.state.lock()) {
                return;
            }
            if timeout(WAIT_TIMEOUT, self.notify.notified()).await.is_err() {
                panic!("timed out waiting for {what}");
            }
        }
    }
}

impl<T: Clone> RecordingSubscriber<T> {
    pub fn values(&self) -> Vec<T> {
        self.state.lock().values.clone()
    }
}

impl<T: Send + 'static> Subscriber<T> for RecordingSubscriber<T> {
    fn on_next(&self, item: T) {
        self.state.lock().values.push(item);
        self.notify.notify_one();
    }

    fn on_completed(&self) {
        {
            let mut state = self.state.lock();
            state.completed = true;
            state.terminal_count += 1;
        }
        self.notify.notify_one();
    }

    fn on_error(&self, error: FlowError) {
        {
            let mut state = self.state.lock();
            state.error = Some(error);
            state.terminal_count += 1;
        }
        self.notify.notify_one();
    }
}
