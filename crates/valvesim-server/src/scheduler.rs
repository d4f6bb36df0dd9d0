//! Periodic value generation for the live address space.
//!
//! One background task visits every node once per tick and mutates its
//! value according to its declared data kind. A node that fails to update
//! (transiently unavailable) is logged and retried on the next tick; the
//! tick always finishes the remaining nodes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rand::Rng;
use thiserror::Error;
use tokio::sync::{watch, RwLock};
use tokio::time::{interval, Duration};

use valvesim_mapping::DataKind;

use crate::space::{AddressSpace, Value};

/// Per-tick flip probability of boolean points.
pub const BOOL_FLIP_PROBABILITY: f64 = 0.05;

/// Default time between update passes.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Lifecycle of the scheduler. `Stopped` is terminal; a stopped scheduler
/// is never restarted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    Stopped,
}

/// Errors raised by scheduler lifecycle transitions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("scheduler already running")]
    AlreadyRunning,

    #[error("scheduler already stopped")]
    AlreadyStopped,
}

/// Compute the next value of a node. Pure over the RNG so the update
/// policies are testable with a seeded generator.
///
/// - double: previous + uniform(-0.5, +0.5), unclamped drift
/// - int32 / byte: previous + one of {-1, 0, +1} (wrapping)
/// - boolean: flips with probability [`BOOL_FLIP_PROBABILITY`]
/// - unknown kind: rewritten unchanged
pub fn advance_value(value: &Value, kind: &DataKind, rng: &mut impl Rng) -> Value {
    match (kind, value) {
        (DataKind::Double, Value::Double(v)) => Value::Double(v + rng.gen_range(-0.5..=0.5)),
        (DataKind::Int32, Value::Int32(v)) => Value::Int32(v.wrapping_add(rng.gen_range(-1..=1))),
        (DataKind::Byte, Value::Byte(v)) => {
            Value::Byte(v.wrapping_add_signed(rng.gen_range(-1i8..=1)))
        }
        (DataKind::Boolean, Value::Bool(v)) => {
            if rng.gen_bool(BOOL_FLIP_PROBABILITY) {
                Value::Bool(!v)
            } else {
                Value::Bool(*v)
            }
        }
        // Unknown kinds and kind/value divergence: leave the value as-is.
        (_, other) => *other,
    }
}

/// One full update pass over the address space. Node failures are isolated:
/// logged, skipped, retried on the next pass.
pub fn run_tick(space: &AddressSpace, rng: &mut impl Rng) {
    for address in space.addresses() {
        if let Err(err) = space.apply(&address, |value, kind| advance_value(value, kind, rng)) {
            tracing::debug!(node = %address, %err, "node update failed, retrying next tick");
        }
    }
}

/// Drives the periodic update pass over a shared [`AddressSpace`].
pub struct UpdateScheduler {
    space: Arc<AddressSpace>,
    tick_interval: Duration,
    state: Arc<RwLock<SchedulerState>>,
    stop_tx: watch::Sender<bool>,
    ticks: Arc<AtomicU64>,
}

impl UpdateScheduler {
    pub fn new(space: Arc<AddressSpace>) -> Self {
        Self::with_interval(space, DEFAULT_TICK_INTERVAL)
    }

    pub fn with_interval(space: Arc<AddressSpace>, tick_interval: Duration) -> Self {
        let (stop_tx, _) = watch::channel(false);
        Self {
            space,
            tick_interval,
            state: Arc::new(RwLock::new(SchedulerState::Idle)),
            stop_tx,
            ticks: Arc::new(AtomicU64::new(0)),
        }
    }

    pub async fn state(&self) -> SchedulerState {
        *self.state.read().await
    }

    /// Number of completed update passes.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Transition Idle → Running and spawn the tick task.
    pub async fn start(&self) -> Result<(), SchedulerError> {
        let mut state = self.state.write().await;
        match *state {
            SchedulerState::Idle => *state = SchedulerState::Running,
            SchedulerState::Running => return Err(SchedulerError::AlreadyRunning),
            SchedulerState::Stopped => return Err(SchedulerError::AlreadyStopped),
        }
        drop(state);

        let space = self.space.clone();
        let scheduler_state = self.state.clone();
        let ticks = self.ticks.clone();
        let tick_interval = self.tick_interval;
        let mut stop_rx = self.stop_tx.subscribe();

        tokio::spawn(async move {
            let mut timer = interval(tick_interval);
            timer.tick().await; // Skip the immediate first tick

            loop {
                tokio::select! {
                    // Cancellation is cooperative: checked between ticks,
                    // never mid-pass.
                    _ = stop_rx.changed() => break,
                    _ = timer.tick() => {
                        let mut rng = rand::thread_rng();
                        run_tick(&space, &mut rng);
                        ticks.fetch_add(1, Ordering::Relaxed);
                    }
                }
            }

            *scheduler_state.write().await = SchedulerState::Stopped;
            tracing::info!("update scheduler stopped");
        });

        tracing::info!(
            nodes = self.space.len(),
            interval_ms = self.tick_interval.as_millis() as u64,
            "update scheduler started"
        );
        Ok(())
    }

    /// Signal the tick task to stop. Observed within one tick interval;
    /// the transition to Stopped is terminal.
    pub async fn stop(&self) {
        let mut state = self.state.write().await;
        if *state == SchedulerState::Idle {
            // Never started: nothing to signal, but the state machine
            // still reaches its terminal state.
            *state = SchedulerState::Stopped;
            return;
        }
        drop(state);
        let _ = self.stop_tx.send(true);
    }
}
