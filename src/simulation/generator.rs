//! # Reading Generator
//!
//! Per-sensor stochastic process: bounded noise, slow drift with random
//! reversal, and a seasonal contribution, soft-bounced back into range.
//!
//! All mutable simulation state lives in [`EngineState`]. The engine keeps
//! exactly one instance behind one lock, so a reset can never interleave
//! with a generation cycle.

use chrono::{DateTime, FixedOffset};
use std::sync::Arc;

use super::random::RandomSource;
use super::seasonal::{seasonal_factor, TimeOfDay};
use crate::domain::{Reading, SensorDefinition};

/// Probability per tick that a sensor's drift reverses direction
pub const DRIFT_REVERSAL_PROBABILITY: f64 = 0.05;
/// Half-width of the perturbation added on drift reversal
pub const DRIFT_REVERSAL_JITTER: f64 = 0.005;
/// Half-width of the initial drift coefficient
pub const DRIFT_INITIAL_RANGE: f64 = 0.02;
/// Initial value spread around the midpoint, in noise amplitudes
pub const INITIAL_SPREAD: f64 = 2.0;
/// Spread around the midpoint after a reset, in noise amplitudes
pub const RESET_SPREAD: f64 = 3.0;

/// Mutable per-sensor record
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SensorState {
    pub last_value: f64,
    pub drift_coefficient: f64,
}

impl SensorState {
    fn seeded(def: &SensorDefinition, spread: f64, rng: &mut RandomSource) -> Self {
        let start = def.midpoint() + rng.symmetric(def.noise_amplitude * spread);
        let last_value = soft_bounce(def, start, rng);
        let drift_coefficient = rng.symmetric(DRIFT_INITIAL_RANGE);
        Self {
            last_value,
            drift_coefficient,
        }
    }
}

/// Random source plus one [`SensorState`] per definition, index-aligned
/// with the configuration order.
#[derive(Debug)]
pub struct EngineState {
    sensors: Arc<[SensorDefinition]>,
    states: Vec<SensorState>,
    rng: RandomSource,
}

impl EngineState {
    /// Build initial state for already-validated definitions
    pub fn new(sensors: Arc<[SensorDefinition]>, rng: RandomSource) -> Self {
        let mut state = Self {
            states: Vec::with_capacity(sensors.len()),
            sensors,
            rng,
        };
        state.reinitialize(INITIAL_SPREAD);
        state
    }

    fn reinitialize(&mut self, spread: f64) {
        let Self {
            sensors,
            states,
            rng,
        } = self;
        states.clear();
        states.extend(sensors.iter().map(|def| SensorState::seeded(def, spread, rng)));
    }

    pub fn sensors(&self) -> &[SensorDefinition] {
        &self.sensors
    }

    /// Reseed the random source and restart every sensor near its midpoint
    pub fn reset(&mut self) {
        self.rng.reseed();
        self.reinitialize(RESET_SPREAD);
    }

    /// Like [`EngineState::reset`], with an explicit new base seed
    pub fn reset_with_seed(&mut self, seed: u64) {
        self.rng.reseed_with(seed);
        self.reinitialize(RESET_SPREAD);
    }

    /// Advance every sensor one step and return the batch in configuration order
    pub fn generate(&mut self, now: DateTime<FixedOffset>) -> Vec<Reading> {
        let time = TimeOfDay::from_datetime(&now);
        let Self {
            sensors,
            states,
            rng,
        } = self;

        sensors
            .iter()
            .zip(states.iter_mut())
            .map(|(def, state)| {
                let value = step(def, state, &time, rng);
                Reading::new(def, value, now)
            })
            .collect()
    }

    #[cfg(test)]
    pub(crate) fn state_of(&self, index: usize) -> Option<SensorState> {
        self.states.get(index).copied()
    }

    #[cfg(test)]
    pub(crate) fn force_state(&mut self, index: usize, state: SensorState) {
        self.states[index] = state;
    }
}

/// One step of the process for a single sensor. Draw order is fixed:
/// noise, reversal roll, reversal jitter, seasonal draws, bounce.
fn step(
    def: &SensorDefinition,
    state: &mut SensorState,
    time: &TimeOfDay,
    rng: &mut RandomSource,
) -> f64 {
    let noise = rng.symmetric(def.noise_amplitude);
    let drift = state.drift_coefficient * state.last_value;

    if rng.chance(DRIFT_REVERSAL_PROBABILITY) {
        state.drift_coefficient =
            -state.drift_coefficient + rng.symmetric(DRIFT_REVERSAL_JITTER);
    }

    let seasonal = seasonal_factor(def.sensor_type, time, rng);
    let value = soft_bounce(def, state.last_value + noise + seasonal + drift, rng);
    state.last_value = value;
    value
}

/// Re-randomize an out-of-range value to within one noise amplitude of the
/// violated rail. In-range values pass through untouched.
///
/// The outer `min`/`max` only absorb rounding: validation guarantees the
/// amplitude fits inside the range.
pub(crate) fn soft_bounce(def: &SensorDefinition, value: f64, rng: &mut RandomSource) -> f64 {
    if value < def.min_value {
        (def.min_value + rng.uniform(0.0, def.noise_amplitude)).min(def.max_value)
    } else if value > def.max_value {
        (def.max_value - rng.uniform(0.0, def.noise_amplitude)).max(def.min_value)
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SensorType;
    use chrono::TimeZone;

    fn sensors() -> Arc<[SensorDefinition]> {
        Arc::from(vec![
            SensorDefinition::new("temp001", SensorType::Temperature, 18.0, 30.0, 0.3, "°C"),
            SensorDefinition::new("hum001", SensorType::Humidity, 40.0, 75.0, 1.0, "%"),
            SensorDefinition::new("light001", SensorType::Light, 0.0, 1000.0, 10.0, "lux"),
            SensorDefinition::new("press001", SensorType::Pressure, 990.0, 1020.0, 0.5, "hPa"),
        ])
    }

    fn at(hour: u32, minute: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 6, 15, hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn test_initial_state_within_range() {
        let state = EngineState::new(sensors(), RandomSource::seeded(3));
        for (i, def) in state.sensors().iter().enumerate() {
            let s = state.state_of(i).unwrap();
            assert!(def.contains(s.last_value));
            assert!((def.midpoint() - s.last_value).abs() <= def.noise_amplitude * INITIAL_SPREAD);
            assert!(s.drift_coefficient.abs() <= DRIFT_INITIAL_RANGE);
        }
    }

    #[test]
    fn test_generate_order_and_timestamp() {
        let mut state = EngineState::new(sensors(), RandomSource::seeded(3));
        let now = at(9, 41);
        let batch = state.generate(now);
        let ids: Vec<_> = batch.iter().map(|r| r.sensor_id.as_str()).collect();
        assert_eq!(ids, ["temp001", "hum001", "light001", "press001"]);
        assert!(batch.iter().all(|r| r.timestamp == now));
        assert_eq!(batch[2].unit, "lux");
        assert_eq!(batch[3].sensor_type, SensorType::Pressure);
    }

    #[test]
    fn test_values_stay_in_range_over_a_day() {
        let mut state = EngineState::new(sensors(), RandomSource::seeded(99));
        let defs = sensors();
        for minute in 0..(24 * 60) {
            let now = at(minute / 60, minute % 60);
            for (reading, def) in state.generate(now).iter().zip(defs.iter()) {
                assert!(
                    def.contains(reading.value),
                    "{} out of range: {}",
                    def.id,
                    reading.value
                );
            }
        }
    }

    #[test]
    fn test_state_tracks_emitted_value() {
        let mut state = EngineState::new(sensors(), RandomSource::seeded(5));
        let batch = state.generate(at(14, 0));
        for (i, reading) in batch.iter().enumerate() {
            assert_eq!(state.state_of(i).unwrap().last_value, reading.value);
        }
    }

    #[test]
    fn test_soft_bounce_below_floor() {
        let def = SensorDefinition::new("t1", SensorType::Temperature, 18.0, 30.0, 0.3, "°C");
        let mut state = EngineState::new(Arc::from(vec![def.clone()]), RandomSource::seeded(8));
        for seed in 0..200u64 {
            state.reset_with_seed(seed);
            // Strongly negative drift drags the next value far under the floor.
            state.force_state(
                0,
                SensorState {
                    last_value: 18.0,
                    drift_coefficient: -0.5,
                },
            );
            let value = state.generate(at(18, 0))[0].value;
            assert!(value >= def.min_value, "bounced below floor: {}", value);
            assert!(
                value <= def.min_value + def.noise_amplitude,
                "bounced too far: {}",
                value
            );
        }
    }

    #[test]
    fn test_soft_bounce_above_ceiling() {
        let def = SensorDefinition::new("l1", SensorType::Light, 0.0, 1000.0, 10.0, "lux");
        let mut rng = RandomSource::seeded(4);
        for _ in 0..500 {
            let v = soft_bounce(&def, 1400.0, &mut rng);
            assert!((990.0..=1000.0).contains(&v));
        }
        assert_eq!(soft_bounce(&def, 500.0, &mut rng), 500.0);
    }

    #[test]
    fn test_zero_noise_bounce_lands_on_rail() {
        let def = SensorDefinition::new("p1", SensorType::Pressure, 990.0, 1020.0, 0.0, "hPa");
        let mut rng = RandomSource::seeded(4);
        assert_eq!(soft_bounce(&def, 900.0, &mut rng), 990.0);
        assert_eq!(soft_bounce(&def, 2000.0, &mut rng), 1020.0);
    }

    #[test]
    fn test_reset_restarts_near_midpoint() {
        let mut state = EngineState::new(sensors(), RandomSource::seeded(21));
        for minute in 0..120 {
            state.generate(at(12 + minute / 60, minute % 60));
        }
        state.reset();
        for (i, def) in sensors().iter().enumerate() {
            let s = state.state_of(i).unwrap();
            assert!(def.contains(s.last_value));
            assert!((s.last_value - def.midpoint()).abs() <= def.noise_amplitude * RESET_SPREAD);
            assert!(s.drift_coefficient.abs() <= DRIFT_INITIAL_RANGE);
        }
    }

    #[test]
    fn test_fixed_seed_is_reproducible() {
        let mut a = EngineState::new(sensors(), RandomSource::seeded(1234));
        let mut b = EngineState::new(sensors(), RandomSource::seeded(1234));
        for minute in 0..300 {
            let now = at(6 + minute / 60, minute % 60);
            let ra = a.generate(now);
            let rb = b.generate(now);
            for (x, y) in ra.iter().zip(rb.iter()) {
                assert_eq!(x.value.to_bits(), y.value.to_bits());
            }
        }
    }

    #[test]
    fn test_drift_reversal_flips_sign() {
        let def = SensorDefinition::new("p1", SensorType::Pressure, 990.0, 1020.0, 0.5, "hPa");
        let mut state = EngineState::new(Arc::from(vec![def]), RandomSource::seeded(77));
        state.force_state(
            0,
            SensorState {
                last_value: 1005.0,
                drift_coefficient: 0.02,
            },
        );
        let mut flipped = false;
        for minute in 0..600 {
            state.generate(at(minute / 60, minute % 60));
            if state.state_of(0).unwrap().drift_coefficient < 0.0 {
                flipped = true;
                break;
            }
        }
        // 5% per tick over 600 ticks
        assert!(flipped);
    }
}
