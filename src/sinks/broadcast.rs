use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::broadcast;

use super::{ReadingSink, SinkError};
use crate::domain::{Batch, Reading};

/// Republishes every batch on an in-process broadcast channel.
///
/// Slow subscribers lag and lose old batches; the sink never waits on them.
#[derive(Debug, Clone)]
pub struct BroadcastSink {
    tx: broadcast::Sender<Batch>,
}

impl BroadcastSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Batch> {
        self.tx.subscribe()
    }

    pub fn sender(&self) -> broadcast::Sender<Batch> {
        self.tx.clone()
    }
}

#[async_trait]
impl ReadingSink for BroadcastSink {
    fn name(&self) -> &'static str {
        "broadcast"
    }

    async fn on_readings(&self, batch: &[Reading]) -> Result<(), SinkError> {
        // No subscribers is not a failure.
        let _ = self.tx.send(Arc::from(batch.to_vec()));
        Ok(())
    }
}
