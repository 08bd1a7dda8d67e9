use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::simulation::SimulationEngine;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("Scheduler is already running")]
    AlreadyRunning,
    #[error("Scheduler has been stopped and cannot be restarted")]
    Stopped,
    #[error("Tick interval must be greater than zero")]
    ZeroInterval,
}

/// Scheduler lifecycle: `Idle -> Running -> Stopped`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerState {
    Idle,
    Running,
    Stopped,
}

/// Tick loop status tracking
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskStatus {
    pub last_run: Option<DateTime<Utc>>,
    pub last_duration_ms: Option<u64>,
    pub run_count: u64,
    /// Ticks where at least one sink failed
    pub error_count: u64,
    /// Ticks whose handling took longer than the interval
    pub overrun_count: u64,
}

enum Lifecycle {
    Idle,
    Running {
        cancel: CancellationToken,
        handle: JoinHandle<()>,
    },
    Stopped {
        handle: Option<JoinHandle<()>>,
    },
}

/// Fires the engine on a fixed period.
///
/// Missed ticks are skipped: when a tick (generation plus sinks) overruns
/// the period, at most one tick fires as soon as it completes and the
/// schedule then continues on the original cadence. There is never more
/// than one generation cycle in flight.
pub struct Scheduler {
    engine: Arc<SimulationEngine>,
    lifecycle: Mutex<Lifecycle>,
    status: Arc<RwLock<TaskStatus>>,
}

impl Scheduler {
    pub fn new(engine: Arc<SimulationEngine>) -> Self {
        Self {
            engine,
            lifecycle: Mutex::new(Lifecycle::Idle),
            status: Arc::new(RwLock::new(TaskStatus::default())),
        }
    }

    pub fn engine(&self) -> &Arc<SimulationEngine> {
        &self.engine
    }

    pub fn state(&self) -> SchedulerState {
        match &*self.lifecycle.lock() {
            Lifecycle::Idle => SchedulerState::Idle,
            Lifecycle::Running { .. } => SchedulerState::Running,
            Lifecycle::Stopped { .. } => SchedulerState::Stopped,
        }
    }

    pub async fn status(&self) -> TaskStatus {
        self.status.read().await.clone()
    }

    /// Begin ticking every `period`; the first tick fires immediately.
    /// Must be called from within a tokio runtime.
    pub fn start(&self, period: Duration) -> Result<(), SchedulerError> {
        if period.is_zero() {
            return Err(SchedulerError::ZeroInterval);
        }

        let mut lifecycle = self.lifecycle.lock();
        match &*lifecycle {
            Lifecycle::Running { .. } => return Err(SchedulerError::AlreadyRunning),
            Lifecycle::Stopped { .. } => return Err(SchedulerError::Stopped),
            Lifecycle::Idle => {}
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_ticks(
            self.engine.clone(),
            period,
            cancel.clone(),
            self.status.clone(),
        ));
        *lifecycle = Lifecycle::Running { cancel, handle };

        info!(interval_ms = period.as_millis() as u64, "scheduler started");
        Ok(())
    }

    /// Prevent further ticks. Idempotent; a tick already in progress completes.
    pub fn stop(&self) {
        let mut lifecycle = self.lifecycle.lock();
        let previous = std::mem::replace(&mut *lifecycle, Lifecycle::Stopped { handle: None });
        *lifecycle = match previous {
            Lifecycle::Running { cancel, handle } => {
                cancel.cancel();
                info!("scheduler stopped");
                Lifecycle::Stopped {
                    handle: Some(handle),
                }
            }
            Lifecycle::Idle => Lifecycle::Stopped { handle: None },
            stopped @ Lifecycle::Stopped { .. } => stopped,
        };
    }

    /// Stop and wait for an in-flight tick to finish
    pub async fn shutdown(&self) {
        self.stop();
        let handle = match &mut *self.lifecycle.lock() {
            Lifecycle::Stopped { handle } => handle.take(),
            _ => None,
        };
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "tick loop ended abnormally");
            }
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        if let Lifecycle::Running { cancel, .. } = &*self.lifecycle.lock() {
            cancel.cancel();
        }
    }
}

async fn run_ticks(
    engine: Arc<SimulationEngine>,
    period: Duration,
    cancel: CancellationToken,
    status: Arc<RwLock<TaskStatus>>,
) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let started = Instant::now();
        let (batch, report) = engine.tick().await;
        let elapsed = started.elapsed();
        let overran = elapsed > period;

        {
            let mut status = status.write().await;
            status.last_run = Some(Utc::now());
            status.last_duration_ms = Some(elapsed.as_millis() as u64);
            status.run_count += 1;
            if report.failed > 0 {
                status.error_count += 1;
            }
            if overran {
                status.overrun_count += 1;
            }
        }

        if overran {
            warn!(
                elapsed_ms = elapsed.as_millis() as u64,
                interval_ms = period.as_millis() as u64,
                "tick overran its interval, skipping missed ticks"
            );
        } else {
            debug!(readings = batch.len(), elapsed_ms = elapsed.as_millis() as u64, "tick");
        }
    }

    debug!("tick loop exited");
}
