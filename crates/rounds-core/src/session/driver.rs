//! Periodic tick driver.
//!
//! Bridges the clock-free [`SessionEngine`] to real time. A tokio task wakes
//! on a fixed period (~100ms) and charges the engine with the *measured*
//! elapsed time since the previous wake, so delayed or coalesced wakeups
//! never accumulate drift. The delta is consumed on every iteration, running
//! or not, and the first delta after a paused-to-running edge is discarded
//! because part of it elapsed while paused. Paused intervals are therefore
//! never charged against the countdown.
//!
//! Phase transitions are applied after the tick that reached zero returns,
//! never inside it.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};

use super::engine::SessionEngine;
use crate::events::Event;

/// Default tick period.
pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_millis(100);

/// Drives a [`SessionEngine`] with wall-clock deltas on a fixed period.
///
/// The engine stays shared behind a mutex; controls go through
/// [`engine()`](Self::engine) and execute strictly between ticks -- the
/// driver and every control call serialize on the same lock, so no tick is
/// ever in flight concurrently with a control.
pub struct TickDriver {
    engine: Arc<Mutex<SessionEngine>>,
    period: Duration,
    handle: Option<JoinHandle<()>>,
}

impl TickDriver {
    pub fn new(engine: SessionEngine) -> Self {
        Self::with_period(engine, DEFAULT_TICK_PERIOD)
    }

    pub fn with_period(engine: SessionEngine, period: Duration) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
            period,
            handle: None,
        }
    }

    /// Shared handle to the driven engine.
    pub fn engine(&self) -> Arc<Mutex<SessionEngine>> {
        Arc::clone(&self.engine)
    }

    /// Lock the engine for a control call or a snapshot read.
    pub fn lock(&self) -> MutexGuard<'_, SessionEngine> {
        lock(&self.engine)
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Spawn the periodic tick task. Events are forwarded to `events`.
    ///
    /// The task exits on its own once the session completes; `stop()` ends it
    /// deterministically at any point. Starting an already-running driver is
    /// a no-op.
    pub fn start(&mut self, events: UnboundedSender<Event>) {
        if self.is_running() {
            return;
        }
        let engine = Arc::clone(&self.engine);
        let period = self.period;
        self.handle = Some(tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut last = Instant::now();
            let mut was_running = false;
            loop {
                ticker.tick().await;
                let now = Instant::now();
                let delta = now - last;
                last = now;

                let mut engine = lock(&engine);
                let running = engine.is_running();
                // The first wake after a resume (or the initial start) sees a
                // delta that partly elapsed before the engine was running, so
                // it must not reach the countdown.
                if running && was_running {
                    if let Some(event) = engine.tick(delta) {
                        let _ = events.send(event);
                    }
                    // The transition runs after the zero-reaching tick
                    // returned. Zero-length rest phases re-arm the flag, so
                    // drain it.
                    while engine.transition_pending() {
                        if let Some(event) = engine.advance_phase() {
                            let _ = events.send(event);
                        }
                    }
                }
                was_running = running;
                if engine.is_complete() {
                    break;
                }
            }
        }));
    }

    /// Unregister the periodic task. Safe to call repeatedly.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for TickDriver {
    fn drop(&mut self) {
        self.stop();
    }
}

fn lock<'a>(engine: &'a Arc<Mutex<SessionEngine>>) -> MutexGuard<'a, SessionEngine> {
    match engine.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
