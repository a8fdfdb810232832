//! Periodic recording ticks.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Source of recording ticks, polled from the host loop.
pub trait TickScheduler {
    /// (Re)starts the timer. Any previous timer is stopped first.
    fn start(&mut self, period: Duration);
    fn stop(&mut self);
    fn is_running(&self) -> bool;
    /// Number of ticks since the last call.
    fn take_ticks(&mut self) -> usize;
}

/// Tokio interval task counting ticks into a shared counter.
pub struct TokioTicker {
    handle: Handle,
    task: Option<JoinHandle<()>>,
    ticks: Arc<AtomicUsize>,
}

impl TokioTicker {
    pub fn new(handle: Handle) -> Self {
        Self {
            handle,
            task: None,
            ticks: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl TickScheduler for TokioTicker {
    fn start(&mut self, period: Duration) {
        self.stop();
        if period.is_zero() {
            return;
        }

        let ticks = self.ticks.clone();
        self.task = Some(self.handle.spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                ticks.fetch_add(1, Ordering::Relaxed);
            }
        }));
        log::debug!("Recording timer started ({} ms)", period.as_millis());
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            log::debug!("Recording timer stopped");
        }
        // An aborted task may still be mid-tick; it keeps the old counter
        self.ticks = Arc::new(AtomicUsize::new(0));
    }

    fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    fn take_ticks(&mut self) -> usize {
        self.ticks.swap(0, Ordering::Relaxed)
    }
}

impl Drop for TokioTicker {
    fn drop(&mut self) {
        self.stop();
    }
}

#[derive(Debug, Default)]
struct ManualState {
    period: Option<Duration>,
    pending: usize,
}

/// Scheduler fired by hand, for hosts that own their own clock.
///
/// Clones share state, so one copy can be handed to the recorder while the
/// host keeps another to fire ticks.
#[derive(Debug, Clone, Default)]
pub struct ManualTicker {
    state: Arc<Mutex<ManualState>>,
}

impl ManualTicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `count` ticks if the timer is running. Returns whether it was.
    pub fn fire(&self, count: usize) -> bool {
        let mut state = self.lock();
        if state.period.is_none() {
            return false;
        }
        state.pending += count;
        true
    }

    /// Period of the running timer.
    pub fn period(&self) -> Option<Duration> {
        self.lock().period
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ManualState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl TickScheduler for ManualTicker {
    fn start(&mut self, period: Duration) {
        let mut state = self.lock();
        state.pending = 0;
        state.period = (!period.is_zero()).then_some(period);
    }

    fn stop(&mut self) {
        let mut state = self.lock();
        state.period = None;
        state.pending = 0;
    }

    fn is_running(&self) -> bool {
        self.lock().period.is_some()
    }

    fn take_ticks(&mut self) -> usize {
        std::mem::take(&mut self.lock().pending)
    }
}
