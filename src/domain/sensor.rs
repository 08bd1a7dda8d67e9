use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use thiserror::Error;
use validator::{Validate, ValidationError, ValidationErrors};

/// Sensor definition errors, raised while loading configuration
#[derive(Debug, Error)]
pub enum SensorConfigError {
    #[error("Invalid sensor definition '{id}': {source}")]
    Invalid {
        id: String,
        #[source]
        source: ValidationErrors,
    },
    #[error("Duplicate sensor id: {0}")]
    DuplicateId(String),
    #[error("No sensors configured")]
    Empty,
}

/// Physical quantity a simulated sensor measures
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SensorType {
    /// Air temperature (°C)
    Temperature,
    /// Relative humidity (%)
    Humidity,
    /// Illuminance (lux)
    Light,
    /// Barometric pressure (hPa)
    Pressure,
}

/// Immutable description of one simulated sensor.
///
/// Definitions are validated once when configuration is loaded; the
/// generator relies on `min_value < max_value` and a finite, non-negative
/// noise amplitude that fits inside the range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_bounds"))]
pub struct SensorDefinition {
    #[validate(length(min = 1, message = "sensor id must not be empty"))]
    pub id: String,
    #[serde(rename = "type")]
    pub sensor_type: SensorType,
    pub min_value: f64,
    pub max_value: f64,
    #[validate(range(min = 0.0, message = "noise amplitude must be non-negative"))]
    pub noise_amplitude: f64,
    pub unit: String,
}

impl SensorDefinition {
    pub fn new(
        id: impl Into<String>,
        sensor_type: SensorType,
        min_value: f64,
        max_value: f64,
        noise_amplitude: f64,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            sensor_type,
            min_value,
            max_value,
            noise_amplitude,
            unit: unit.into(),
        }
    }

    /// Midpoint of the configured range
    pub fn midpoint(&self) -> f64 {
        (self.min_value + self.max_value) / 2.0
    }

    /// Width of the configured range
    pub fn span(&self) -> f64 {
        self.max_value - self.min_value
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min_value && value <= self.max_value
    }

    /// Run field and cross-field validation
    pub fn check(&self) -> Result<(), SensorConfigError> {
        self.validate().map_err(|source| SensorConfigError::Invalid {
            id: self.id.clone(),
            source,
        })
    }
}

fn validate_bounds(def: &SensorDefinition) -> Result<(), ValidationError> {
    if !def.min_value.is_finite() || !def.max_value.is_finite() {
        let mut err = ValidationError::new("non_finite_bounds");
        err.message = Some("min_value and max_value must be finite".into());
        return Err(err);
    }
    if def.min_value >= def.max_value {
        let mut err = ValidationError::new("inverted_bounds");
        err.message = Some("min_value must be strictly less than max_value".into());
        return Err(err);
    }
    if !def.noise_amplitude.is_finite() {
        let mut err = ValidationError::new("non_finite_noise");
        err.message = Some("noise_amplitude must be finite".into());
        return Err(err);
    }
    // A bounce of up to one amplitude from either rail must stay inside the range.
    if def.noise_amplitude > def.span() {
        let mut err = ValidationError::new("noise_exceeds_range");
        err.message = Some("noise_amplitude must not exceed max_value - min_value".into());
        return Err(err);
    }
    Ok(())
}

/// Validate an ordered sensor list: every definition plus id uniqueness
pub fn validate_definitions(defs: &[SensorDefinition]) -> Result<(), SensorConfigError> {
    if defs.is_empty() {
        return Err(SensorConfigError::Empty);
    }
    let mut seen = std::collections::HashSet::with_capacity(defs.len());
    for def in defs {
        def.check()?;
        if !seen.insert(def.id.as_str()) {
            return Err(SensorConfigError::DuplicateId(def.id.clone()));
        }
    }
    Ok(())
}
