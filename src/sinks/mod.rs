//! Consumers of generated batches.
//!
//! A sink receives the full batch after every tick. Failures stay local to
//! the sink: they are logged and counted, and the remaining sinks still run.

pub mod broadcast;
pub mod csv;
pub mod log;
#[cfg(feature = "mqtt")]
pub mod mqtt;

use async_trait::async_trait;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, warn};

use crate::domain::Reading;

pub use self::broadcast::BroadcastSink;
pub use self::csv::CsvSink;
pub use self::log::LogSink;
#[cfg(feature = "mqtt")]
pub use self::mqtt::MqttSink;

/// Sink-specific errors
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Background task failed: {0}")]
    Task(String),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReadingSink: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    async fn on_readings(&self, batch: &[Reading]) -> Result<(), SinkError>;
}

/// Outcome of delivering one batch to every sink
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Ordered collection of sinks
#[derive(Clone, Default)]
pub struct SinkSet {
    sinks: Vec<Arc<dyn ReadingSink>>,
}

impl SinkSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sink: Arc<dyn ReadingSink>) {
        self.sinks.push(sink);
    }

    pub fn extend(&mut self, other: SinkSet) {
        self.sinks.extend(other.sinks);
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.sinks.iter().map(|s| s.name()).collect()
    }

    /// Deliver `batch` to each sink in order. Errors and panics are logged
    /// and counted, never propagated.
    pub async fn dispatch(&self, batch: &[Reading]) -> DispatchReport {
        let mut report = DispatchReport::default();

        for sink in &self.sinks {
            match AssertUnwindSafe(sink.on_readings(batch)).catch_unwind().await {
                Ok(Ok(())) => report.delivered += 1,
                Ok(Err(e)) => {
                    report.failed += 1;
                    warn!(sink = sink.name(), error = %e, "sink failed to accept readings");
                }
                Err(_) => {
                    report.failed += 1;
                    error!(sink = sink.name(), "sink panicked while handling readings");
                }
            }
        }

        report
    }
}

impl std::fmt::Debug for SinkSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
