use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use chrono::NaiveDate;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::{SessionError, SessionState, Transition};
use crate::models::Workout;

/// Owns the single active session and the task that ticks it.
#[derive(Clone)]
pub struct SessionManager {
    slot: Arc<Mutex<Option<SessionState>>>,
    ticker: Arc<StdMutex<Option<JoinHandle<()>>>>,
    tick: Duration,
}

impl SessionManager {
    pub fn new(tick: Duration) -> Self {
        Self {
            slot: Arc::new(Mutex::new(None)),
            ticker: Arc::new(StdMutex::new(None)),
            tick,
        }
    }

    pub async fn snapshot(&self) -> Option<SessionState> {
        self.slot.lock().await.clone()
    }

    /// Replace any running session with a fresh one in setup.
    pub async fn start(&self, workout: Workout, plan_date: Option<NaiveDate>) -> SessionState {
        self.stop_ticker();
        let state = SessionState::new(workout, plan_date);
        tracing::info!(workout = %state.workout.name, ?plan_date, "session started");
        *self.slot.lock().await = Some(state.clone());
        state
    }

    /// Run `f` against the active session, then make sure the ticker matches
    /// the resulting phase.
    pub async fn update<R>(
        &self,
        f: impl FnOnce(&mut SessionState) -> Result<R, SessionError>,
    ) -> Result<R, SessionError> {
        let mut guard = self.slot.lock().await;
        let state = guard.as_mut().ok_or(SessionError::NoSession)?;
        let phase = state.phase;
        let out = f(state)?;
        if state.phase != phase {
            Transition {
                from: phase,
                to: state.phase,
                set: state.current_set,
            }
            .log(&state.workout.name);
        }
        let timed = state.phase.is_timed();
        drop(guard);

        if timed {
            self.ensure_ticker();
        }
        Ok(out)
    }

    /// Take the session out once it is ready to be logged.
    pub async fn finish(&self) -> Result<SessionState, SessionError> {
        let mut guard = self.slot.lock().await;
        let state = guard.as_ref().ok_or(SessionError::NoSession)?;
        state.ready_to_finish()?;
        let state = guard.take().ok_or(SessionError::NoSession)?;
        drop(guard);
        self.stop_ticker();
        tracing::info!(workout = %state.workout.name, "session finished");
        Ok(state)
    }

    /// Put back a finished session whose log entry could not be saved, unless
    /// another session was started meanwhile. Returns whether it went back.
    pub async fn restore(&self, state: SessionState) -> bool {
        let mut guard = self.slot.lock().await;
        if guard.is_some() {
            return false;
        }
        tracing::warn!(workout = %state.workout.name, "session restored after failed finish");
        let timed = state.phase.is_timed();
        *guard = Some(state);
        drop(guard);
        if timed {
            self.ensure_ticker();
        }
        true
    }

    /// Discard the session. Returns whether one was active.
    pub async fn cancel(&self) -> bool {
        self.stop_ticker();
        let cancelled = self.slot.lock().await.take();
        if let Some(state) = &cancelled {
            tracing::info!(workout = %state.workout.name, "session cancelled");
        }
        cancelled.is_some()
    }

    pub fn ticker_running(&self) -> bool {
        self.ticker
            .lock()
            .map(|h| h.as_ref().is_some_and(|h| !h.is_finished()))
            .unwrap_or(false)
    }

    fn stop_ticker(&self) {
        if let Ok(mut handle) = self.ticker.lock() {
            if let Some(handle) = handle.take() {
                handle.abort();
            }
        }
    }

    fn ensure_ticker(&self) {
        let Ok(mut handle) = self.ticker.lock() else {
            tracing::error!("ticker lock poisoned");
            return;
        };
        if handle.as_ref().is_some_and(|h| !h.is_finished()) {
            return;
        }

        let slot = self.slot.clone();
        let period = self.tick;
        *handle = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                let mut guard = slot.lock().await;
                let Some(state) = guard.as_mut() else {
                    break;
                };
                if let Some(transition) = state.tick() {
                    transition.log(&state.workout.name);
                }
                if !state.phase.is_timed() {
                    break;
                }
            }
        }));
    }
}
