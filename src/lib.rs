//! Sensor Simulator
//!
//! Generates plausible temperature, humidity, light and pressure readings on a
//! fixed schedule and fans every batch out to pluggable sinks (log, CSV,
//! in-process broadcast, optional MQTT) and an HTTP/WebSocket API.

pub mod api;
pub mod config;
pub mod controller;
pub mod domain;
pub mod simulation;
pub mod sinks;
pub mod telemetry;
