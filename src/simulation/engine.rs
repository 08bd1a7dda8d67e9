//! # Simulation Engine
//!
//! Owns the generator state, publishes the latest batch, and fans each batch
//! out to the registered sinks.

use chrono::{DateTime, FixedOffset, Local};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

use super::generator::EngineState;
use super::random::RandomSource;
use crate::domain::{
    empty_batch, validate_definitions, Batch, SensorConfigError, SensorDefinition,
};
use crate::sinks::{DispatchReport, ReadingSink, SinkSet};

pub struct SimulationEngine {
    sensors: Arc<[SensorDefinition]>,
    state: Mutex<EngineState>,
    last_batch: RwLock<Batch>,
    sinks: SinkSet,
    ticks: AtomicU64,
}

impl SimulationEngine {
    /// Validate the definitions and build initial state
    pub fn new(
        sensors: Vec<SensorDefinition>,
        seed: Option<u64>,
    ) -> Result<Self, SensorConfigError> {
        validate_definitions(&sensors)?;
        let sensors: Arc<[SensorDefinition]> = Arc::from(sensors);
        let state = EngineState::new(sensors.clone(), RandomSource::new(seed));

        info!(sensors = sensors.len(), seeded = seed.is_some(), "simulation engine created");

        Ok(Self {
            sensors,
            state: Mutex::new(state),
            last_batch: RwLock::new(empty_batch()),
            sinks: SinkSet::default(),
            ticks: AtomicU64::new(0),
        })
    }

    /// Register a sink; sinks are invoked in registration order
    pub fn with_sink(mut self, sink: Arc<dyn ReadingSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn with_sinks(mut self, sinks: SinkSet) -> Self {
        self.sinks.extend(sinks);
        self
    }

    pub fn sensors(&self) -> &[SensorDefinition] {
        &self.sensors
    }

    pub fn sinks(&self) -> &SinkSet {
        &self.sinks
    }

    /// Generate and publish one batch at `now` without notifying sinks
    pub fn generate(&self, now: DateTime<FixedOffset>) -> Batch {
        let mut state = self.state.lock();
        let batch: Batch = Arc::from(state.generate(now));
        // Publish under the state lock so batches are visible in generation order.
        *self.last_batch.write() = batch.clone();
        drop(state);

        self.ticks.fetch_add(1, Ordering::Relaxed);
        batch
    }

    /// Generate at `now` and hand the batch to every sink
    pub async fn tick_at(&self, now: DateTime<FixedOffset>) -> (Batch, DispatchReport) {
        let batch = self.generate(now);
        let report = self.sinks.dispatch(&batch).await;
        debug!(
            readings = batch.len(),
            delivered = report.delivered,
            failed = report.failed,
            "tick complete"
        );
        (batch, report)
    }

    /// Generate at the current local wall-clock time and notify sinks
    pub async fn tick(&self) -> (Batch, DispatchReport) {
        self.tick_at(Local::now().fixed_offset()).await
    }

    /// Reseed and restart every sensor near its midpoint
    pub fn reset(&self) {
        self.state.lock().reset();
        info!("simulation reset");
    }

    pub fn reset_with_seed(&self, seed: u64) {
        self.state.lock().reset_with_seed(seed);
        info!(seed, "simulation reset with seed");
    }

    /// Most recently published batch; empty before the first tick
    pub fn last_batch(&self) -> Batch {
        self.last_batch.read().clone()
    }

    /// Number of batches generated so far
    pub fn tick_count(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    #[cfg(test)]
    pub(crate) fn with_state<R>(&self, f: impl FnOnce(&mut EngineState) -> R) -> R {
        f(&mut self.state.lock())
    }
}
