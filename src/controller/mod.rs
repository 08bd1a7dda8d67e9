pub mod scheduler;

use anyhow::{Context, Result};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::info;

use crate::config::Config;
use crate::domain::Batch;
use crate::simulation::SimulationEngine;
use crate::sinks::{BroadcastSink, CsvSink, LogSink, SinkSet};

pub use scheduler::{Scheduler, SchedulerError, SchedulerState, TaskStatus};

#[derive(Clone)]
pub struct AppState {
    pub cfg: Config,
    pub engine: Arc<SimulationEngine>,
    pub scheduler: Arc<Scheduler>,
    pub live: broadcast::Sender<Batch>,
    pub started_at: Instant,
}

impl AppState {
    /// Build the engine and its sinks from configuration.
    /// Must be called from within a tokio runtime when MQTT is enabled.
    pub fn new(cfg: Config) -> Result<Self> {
        let broadcast = BroadcastSink::new(cfg.broadcast.capacity);
        let live = broadcast.sender();

        let mut sinks = SinkSet::new();
        sinks.push(Arc::new(LogSink));
        if cfg.storage.enabled {
            let csv = CsvSink::new(&cfg.storage.data_dir).with_context(|| {
                format!("failed to prepare data dir {}", cfg.storage.data_dir.display())
            })?;
            info!(path = %csv.path().display(), "CSV storage enabled");
            sinks.push(Arc::new(csv));
        }
        #[cfg(feature = "mqtt")]
        {
            if cfg.mqtt.enabled {
                sinks.push(Arc::new(crate::sinks::MqttSink::connect(&cfg.mqtt)));
            }
        }
        sinks.push(Arc::new(broadcast));

        info!(sinks = ?sinks, "sinks registered");

        let engine = Arc::new(
            SimulationEngine::new(cfg.sensors.clone(), cfg.simulation.seed)?.with_sinks(sinks),
        );
        let scheduler = Arc::new(Scheduler::new(engine.clone()));

        Ok(Self {
            cfg,
            engine,
            scheduler,
            live,
            started_at: Instant::now(),
        })
    }
}

pub fn spawn_controller_tasks(state: &AppState) -> Result<()> {
    state
        .scheduler
        .start(state.cfg.simulation.interval())
        .context("failed to start scheduler")?;
    Ok(())
}

/// Wait for `signal`, then stop the scheduler so no tick starts while the
/// HTTP server drains its connections
pub async fn stop_on_signal(scheduler: Arc<Scheduler>, signal: impl Future<Output = ()>) {
    signal.await;
    scheduler.stop();
}
