//! # Sensor Simulation Module
//!
//! Synthesizes plausible temperature, humidity, light and pressure series.
//!
//! ## Components
//!
//! - **RandomSource**: seedable uniform generator owned by the engine
//! - **Seasonal**: per-type time-of-day / day-of-week shaping, one pure function per sensor type
//! - **Generator**: per-sensor state (last value, drift coefficient) and the step that combines
//!   noise, drift and seasonal factor, soft-bounced into the configured range
//! - **Engine**: the generator state behind one lock, the published last batch, and sink fan-out
//!
//! ## Usage
//!
//! ```rust
//! use chrono::Local;
//! use sensor_simulator::domain::{SensorDefinition, SensorType};
//! use sensor_simulator::simulation::SimulationEngine;
//!
//! let engine = SimulationEngine::new(
//!     vec![SensorDefinition::new("temp001", SensorType::Temperature, 18.0, 30.0, 0.3, "°C")],
//!     Some(42),
//! )
//! .unwrap();
//!
//! let batch = engine.generate(Local::now().fixed_offset());
//! assert_eq!(batch.len(), 1);
//! assert!((18.0..=30.0).contains(&batch[0].value));
//! ```

pub mod engine;
pub mod generator;
pub mod random;
pub mod seasonal;

pub use engine::SimulationEngine;
pub use generator::EngineState;
pub use random::RandomSource;
pub use seasonal::{seasonal_factor, shape_for, ShapeFn, TimeOfDay};
