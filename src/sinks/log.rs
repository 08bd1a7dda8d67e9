use async_trait::async_trait;
use tracing::{debug, info};

use super::{ReadingSink, SinkError};
use crate::domain::Reading;

/// Writes every batch to the tracing pipeline
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

#[async_trait]
impl ReadingSink for LogSink {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn on_readings(&self, batch: &[Reading]) -> Result<(), SinkError> {
        let Some(first) = batch.first() else {
            return Ok(());
        };
        info!(readings = batch.len(), timestamp = %first.timestamp, "readings generated");
        for r in batch {
            debug!(
                sensor_id = %r.sensor_id,
                sensor_type = %r.sensor_type,
                value = r.value,
                unit = %r.unit,
                "reading"
            );
        }
        Ok(())
    }
}
