//! Resettable single-shot delay timer
//!
//! Coalesces a burst of changes into one action: every `reset` pushes the
//! fire time out by the full interval. On expiry the action runs once and
//! the timer goes idle until the next reset.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Action run when the timer fires
pub type DelayedAction = Arc<dyn Fn() + Send + Sync>;

/// Snapshot of a timer's state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayState {
    pub interval: Duration,
    pub running: bool,
    /// When the current countdown started
    pub started_at: Option<Instant>,
}

struct TimerState {
    interval: Duration,
    /// Bumped on every reset/stop so a superseded timer never fires
    generation: u64,
    task: Option<JoinHandle<()>>,
    started_at: Option<Instant>,
}

/// Debounce timer bound to one action
pub struct DelayController {
    state: Arc<Mutex<TimerState>>,
    action: DelayedAction,
    handle: Handle,
}

impl DelayController {
    /// Create an idle timer; tasks are spawned on `handle`
    pub fn new(interval: Duration, handle: Handle, action: DelayedAction) -> Self {
        Self {
            state: Arc::new(Mutex::new(TimerState {
                interval,
                generation: 0,
                task: None,
                started_at: None,
            })),
            action,
            handle,
        }
    }

    /// Restart the countdown from the full interval
    pub fn reset(&self) {
        let mut state = self.state.lock();
        if let Some(task) = state.task.take() {
            task.abort();
        }
        state.generation += 1;
        state.started_at = Some(Instant::now());

        let generation = state.generation;
        let interval = state.interval;
        let shared = Arc::clone(&self.state);
        let action = Arc::clone(&self.action);

        state.task = Some(self.handle.spawn(async move {
            tokio::time::sleep(interval).await;
            {
                let mut state = shared.lock();
                if state.generation != generation {
                    return;
                }
                state.task = None;
                state.started_at = None;
            }
            Self::enact(&action);
        }));

        debug!("Resetting delay ({:?})", interval);
    }

    /// Cancel without firing
    pub fn stop(&self) {
        let mut state = self.state.lock();
        if let Some(task) = state.task.take() {
            task.abort();
        }
        state.generation += 1;
        state.started_at = None;
    }

    /// Cancel any countdown and run the action on the calling thread
    pub fn enact_now(&self) {
        self.stop();
        Self::enact(&self.action);
    }

    pub fn is_running(&self) -> bool {
        self.state.lock().started_at.is_some()
    }

    pub fn state(&self) -> DelayState {
        let state = self.state.lock();
        DelayState {
            interval: state.interval,
            running: state.started_at.is_some(),
            started_at: state.started_at,
        }
    }

    /// Time until the action fires, if running
    pub fn remaining(&self) -> Option<Duration> {
        let state = self.state.lock();
        state
            .started_at
            .map(|started| state.interval.saturating_sub(started.elapsed()))
    }

    fn enact(action: &DelayedAction) {
        info!("Enacting delayed action");
        action();
        debug!("Delayed action completed");
    }
}

impl Drop for DelayController {
    fn drop(&mut self) {
        if let Some(task) = self.state.lock().task.take() {
            task.abort();
        }
    }
}
