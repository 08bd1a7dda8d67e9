use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::domain::{validate_definitions, SensorConfigError, SensorDefinition, SensorType};

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";
pub const ENV_PREFIX: &str = "SIM__";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] figment::Error),
    #[error(transparent)]
    Sensors(#[from] SensorConfigError),
    #[error("Simulation interval must be greater than zero")]
    ZeroInterval,
    #[error("Invalid server address: {0}")]
    InvalidAddress(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub simulation: SimulationConfig,
    pub sensors: Vec<SensorDefinition>,
    pub storage: StorageConfig,
    pub broadcast: BroadcastConfig,
    pub mqtt: MqttConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
    pub enable_cors: bool,
    pub cors_origin: String,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ConfigError::InvalidAddress(format!("{}:{}", self.host, self.port)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Tick period in milliseconds
    pub interval_ms: u64,
    /// Fixed seed for reproducible runs; entropy when absent
    pub seed: Option<u64>,
}

impl SimulationConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub enabled: bool,
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastConfig {
    /// Batches buffered per live subscriber before it starts lagging
    pub capacity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MqttConfig {
    pub enabled: bool,
    pub broker_host: String,
    pub broker_port: u16,
    pub client_id: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub topic_base: String,
    pub qos: u8,
    pub retained: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                request_timeout_secs: 30,
                enable_cors: false,
                cors_origin: "http://localhost:3000".to_string(),
            },
            simulation: SimulationConfig {
                interval_ms: 1000,
                seed: None,
            },
            sensors: default_sensors(),
            storage: StorageConfig {
                enabled: true,
                data_dir: PathBuf::from("./data"),
            },
            broadcast: BroadcastConfig { capacity: 16 },
            mqtt: MqttConfig {
                enabled: false,
                broker_host: "localhost".to_string(),
                broker_port: 1883,
                client_id: "sensor-simulator".to_string(),
                username: None,
                password: None,
                topic_base: "sensors".to_string(),
                qos: 1,
                retained: false,
            },
        }
    }
}

/// One sensor of each type with realistic greenhouse ranges
pub fn default_sensors() -> Vec<SensorDefinition> {
    vec![
        SensorDefinition::new("temp001", SensorType::Temperature, 18.0, 30.0, 0.3, "°C"),
        SensorDefinition::new("hum001", SensorType::Humidity, 40.0, 75.0, 1.0, "%"),
        SensorDefinition::new("light001", SensorType::Light, 0.0, 1000.0, 10.0, "lux"),
        SensorDefinition::new("press001", SensorType::Pressure, 990.0, 1020.0, 0.5, "hPa"),
    ]
}

impl Config {
    /// Defaults, then `config/default.toml`, then `SIM__*` environment variables
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let cfg: Config = Self::figment(path).extract()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn figment(path: impl AsRef<Path>) -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.simulation.interval_ms == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        validate_definitions(&self.sensors)?;
        self.server.socket_addr()?;
        Ok(())
    }
}
