//! Publishes each reading as JSON to `<topic_base>/<sensor_type>/<sensor_id>`.
//!
//! Publishing never waits on the broker: while disconnected, or when the
//! client request queue is full, the batch fails fast with a transport error.

use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::{ReadingSink, SinkError};
use crate::config::MqttConfig;
use crate::domain::Reading;

pub struct MqttSink {
    client: AsyncClient,
    topic_base: String,
    qos: QoS,
    retained: bool,
    connected: Arc<AtomicBool>,
    event_loop: JoinHandle<()>,
}

/// Requests buffered between the client and its event loop
const REQUEST_CAPACITY: usize = 64;

fn qos_from(level: u8) -> QoS {
    match level {
        0 => QoS::AtMostOnce,
        2 => QoS::ExactlyOnce,
        _ => QoS::AtLeastOnce,
    }
}

pub fn topic_for(base: &str, reading: &Reading) -> String {
    format!("{}/{}/{}", base, reading.sensor_type, reading.sensor_id)
}

impl MqttSink {
    /// Spawn the client event loop; must be called inside a tokio runtime
    pub fn connect(cfg: &MqttConfig) -> Self {
        let mut options =
            MqttOptions::new(cfg.client_id.clone(), cfg.broker_host.clone(), cfg.broker_port);
        options.set_keep_alive(Duration::from_secs(30));
        if let (Some(user), Some(pass)) = (&cfg.username, &cfg.password) {
            options.set_credentials(user.clone(), pass.clone());
        }

        let (client, mut event_loop) = AsyncClient::new(options, REQUEST_CAPACITY);
        let broker = format!("{}:{}", cfg.broker_host, cfg.broker_port);
        info!(%broker, "connecting to MQTT broker");

        let connected = Arc::new(AtomicBool::new(false));
        let link = connected.clone();
        let event_loop = tokio::spawn(async move {
            loop {
                match event_loop.poll().await {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        info!(%broker, "connected to MQTT broker");
                        link.store(true, Ordering::Release);
                    }
                    Ok(_) => {}
                    Err(e) => {
                        link.store(false, Ordering::Release);
                        warn!(error = %e, %broker, "MQTT connection error, retrying");
                        tokio::time::sleep(Duration::from_secs(5)).await;
                    }
                }
            }
        });

        Self {
            client,
            topic_base: cfg.topic_base.clone(),
            qos: qos_from(cfg.qos),
            retained: cfg.retained,
            connected,
            event_loop,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }
}

impl Drop for MqttSink {
    fn drop(&mut self) {
        self.event_loop.abort();
    }
}

#[async_trait]
impl ReadingSink for MqttSink {
    fn name(&self) -> &'static str {
        "mqtt"
    }

    async fn on_readings(&self, batch: &[Reading]) -> Result<(), SinkError> {
        if !self.is_connected() {
            return Err(SinkError::Transport("MQTT broker not connected".into()));
        }
        for reading in batch {
            let payload = serde_json::to_vec(reading)?;
            self.client
                .try_publish(topic_for(&self.topic_base, reading), self.qos, self.retained, payload)
                .map_err(|e| SinkError::Transport(e.to_string()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SensorType;
    use chrono::Utc;

    #[test]
    fn test_topic_layout() {
        let reading = Reading {
            sensor_id: "light001".into(),
            sensor_type: SensorType::Light,
            value: 312.0,
            unit: "lux".into(),
            timestamp: Utc::now().fixed_offset(),
        };
        assert_eq!(topic_for("greenhouse/sensors", &reading), "greenhouse/sensors/light/light001");
    }

    fn unreachable_broker() -> MqttConfig {
        MqttConfig {
            enabled: true,
            broker_host: "127.0.0.1".into(),
            broker_port: 1,
            client_id: "sensor-simulator-test".into(),
            username: None,
            password: None,
            topic_base: "sensors".into(),
            qos: 1,
            retained: false,
        }
    }

    fn batch() -> Vec<Reading> {
        ["temp001", "hum001", "light001", "press001"]
            .into_iter()
            .map(|id| Reading {
                sensor_id: id.into(),
                sensor_type: SensorType::Temperature,
                value: 21.0,
                unit: "°C".into(),
                timestamp: Utc::now().fixed_offset(),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_unreachable_broker_fails_fast() {
        let sink = MqttSink::connect(&unreachable_broker());
        let batch = batch();
        for tick in 1..=40 {
            let result = tokio::time::timeout(Duration::from_secs(1), sink.on_readings(&batch))
                .await
                .unwrap_or_else(|_| panic!("publish blocked on tick {}", tick));
            assert!(matches!(result, Err(SinkError::Transport(_))));
        }
    }

    #[tokio::test]
    async fn test_full_request_queue_errors_instead_of_blocking() {
        let sink = MqttSink::connect(&unreachable_broker());
        // Pretend the link is up so publishes reach the undrained request queue.
        sink.connected.store(true, Ordering::Release);
        let batch = batch();

        let mut last = None;
        for tick in 1..=40 {
            let result = tokio::time::timeout(Duration::from_secs(1), sink.on_readings(&batch))
                .await
                .unwrap_or_else(|_| panic!("publish blocked on tick {}", tick));
            last = Some(result);
        }
        // 40 batches of 4 readings cannot fit in the request queue.
        assert!(40 * batch.len() > REQUEST_CAPACITY);
        assert!(matches!(last, Some(Err(SinkError::Transport(_)))));
    }

    #[test]
    fn test_qos_mapping() {
        assert_eq!(qos_from(0), QoS::AtMostOnce);
        assert_eq!(qos_from(1), QoS::AtLeastOnce);
        assert_eq!(qos_from(2), QoS::ExactlyOnce);
        assert_eq!(qos_from(9), QoS::AtLeastOnce);
    }
}
