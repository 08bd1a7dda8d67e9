use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::sensor::{SensorDefinition, SensorType};

/// A single generated sensor value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub sensor_id: String,
    pub sensor_type: SensorType,
    pub value: f64,
    pub unit: String,
    pub timestamp: DateTime<FixedOffset>,
}

impl Reading {
    pub fn new(def: &SensorDefinition, value: f64, timestamp: DateTime<FixedOffset>) -> Self {
        Self {
            sensor_id: def.id.clone(),
            sensor_type: def.sensor_type,
            value,
            unit: def.unit.clone(),
            timestamp,
        }
    }
}

/// Readings produced by one tick, in configuration order, sharing one timestamp.
///
/// Published batches are never mutated; a new tick replaces the whole `Arc`.
pub type Batch = Arc<[Reading]>;

/// The empty batch returned before the first tick
pub fn empty_batch() -> Batch {
    Arc::from(Vec::new())
}
