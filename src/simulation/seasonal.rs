//! # Seasonal Shaping
//!
//! Per-type time-of-day / day-of-week contribution added to every reading.
//! Each sensor type maps to one pure shape function; the only side effect a
//! shape may have is drawing from the [`RandomSource`] it is handed.

use chrono::{DateTime, Datelike, TimeZone, Timelike};
use std::f64::consts::PI;

use super::random::RandomSource;
use crate::domain::SensorType;

/// Probability of a humidity spike (rain / irrigation) per tick
pub const HUMIDITY_SPIKE_PROBABILITY: f64 = 0.01;
/// Probability of a passing cloud dimming daylight per tick
pub const CLOUD_PROBABILITY: f64 = 0.10;
/// Daylight window, inclusive, in fractional hours
pub const DAYLIGHT_HOURS: (f64, f64) = (5.0, 19.0);
/// Peak daylight contribution at solar noon (lux)
pub const DAYLIGHT_PEAK_LUX: f64 = 400.0;

/// Wall-clock inputs the shapes depend on
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeOfDay {
    /// Hour plus minute / 60, in `[0, 24)`
    pub hour_of_day: f64,
    /// Minute of the hour, `0..=59`
    pub minute: f64,
    /// Day of week with Sunday = 0
    pub weekday: f64,
}

impl TimeOfDay {
    /// Extract the shaping inputs from a timestamp in its own offset
    pub fn from_datetime<Tz: TimeZone>(now: &DateTime<Tz>) -> Self {
        let minute = now.minute() as f64;
        Self {
            hour_of_day: now.hour() as f64 + minute / 60.0,
            minute,
            weekday: now.weekday().num_days_from_sunday() as f64,
        }
    }

    pub fn new(hour_of_day: f64, minute: f64, weekday: f64) -> Self {
        Self {
            hour_of_day,
            minute,
            weekday,
        }
    }
}

pub type ShapeFn = fn(&TimeOfDay, &mut RandomSource) -> f64;

/// Strategy table: the shape function for a sensor type
pub fn shape_for(sensor_type: SensorType) -> ShapeFn {
    match sensor_type {
        SensorType::Temperature => temperature,
        SensorType::Humidity => humidity,
        SensorType::Light => light,
        SensorType::Pressure => pressure,
    }
}

pub fn seasonal_factor(sensor_type: SensorType, time: &TimeOfDay, rng: &mut RandomSource) -> f64 {
    shape_for(sensor_type)(time, rng)
}

fn daily_cycle(hour_of_day: f64) -> f64 {
    (hour_of_day / 24.0 * 2.0 * PI).sin()
}

/// Warmer by day, cooler by night, with a small minute ripple
pub fn temperature(time: &TimeOfDay, _rng: &mut RandomSource) -> f64 {
    let minute_cycle = (time.minute / 60.0 * 2.0 * PI).sin() * 0.3;
    daily_cycle(time.hour_of_day) * 2.0 + minute_cycle
}

/// Inverse of the temperature cycle, with occasional spikes
pub fn humidity(time: &TimeOfDay, rng: &mut RandomSource) -> f64 {
    let cycle = -daily_cycle(time.hour_of_day) * 3.0;
    if rng.chance(HUMIDITY_SPIKE_PROBABILITY) {
        cycle + rng.uniform(0.0, 10.0)
    } else {
        cycle + (time.minute / 30.0 * 2.0 * PI).sin() * 0.8
    }
}

/// Bell-shaped daylight around noon, dim ambient light at night
pub fn light(time: &TimeOfDay, rng: &mut RandomSource) -> f64 {
    let (dawn, dusk) = DAYLIGHT_HOURS;
    if time.hour_of_day >= dawn && time.hour_of_day <= dusk {
        let x = (time.hour_of_day - 12.0) / 7.0;
        let base = DAYLIGHT_PEAK_LUX * (-(x * x)).exp();
        let cloud = if rng.chance(CLOUD_PROBABILITY) {
            rng.uniform(0.5, 0.8)
        } else {
            1.0
        };
        base * cloud
    } else {
        rng.uniform(0.0, 5.0)
    }
}

/// Slow two-day wave plus a weekly wave
pub fn pressure(time: &TimeOfDay, _rng: &mut RandomSource) -> f64 {
    let slow = (time.hour_of_day / 48.0 * 2.0 * PI).sin() * 0.5;
    let weekly = (time.weekday / 7.0 * 2.0 * PI).sin();
    slow + weekly
}
