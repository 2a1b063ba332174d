//! Platform-agnostic core logic for IoT firmware
//!
//! This crate contains the application that runs on every supported board:
//! an LED heartbeat, periodic and button-triggered temperature/humidity
//! telemetry over MQTT, and a network connectivity observer. It has NO
//! hardware dependencies; everything it needs from the board comes through
//! the `hal-abstractions` traits.
//!
//! ## Architecture
//!
//! - [`app::App::bootstrap`] registers timers, the button handler and the
//!   network event handler with the host runtime and creates the sensor.
//! - The runtime delivers triggers one at a time through
//!   [`app::App::dispatch`].
//! - Failures (missing sensor, rejected publish, unknown event codes) are
//!   logged where they happen and never escape a handler.
//!
//! ## Logging
//!
//! With the `defmt` feature all logging goes to `defmt`; otherwise it goes to
//! the `log` facade.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]
#![deny(warnings)]

#[macro_use]
mod fmt;

pub mod app;
pub mod config;
pub mod heartbeat;
pub mod network;
pub mod sensor;
pub mod telemetry;
pub mod time;

#[cfg(test)]
mod test_support;

pub use app::{App, BootReport, Callback, PublishOutcome};
pub use config::{AppConfig, ConfigError, SensorConfig};
pub use network::NetEvent;
pub use sensor::{Reading, SensorHandle};
pub use telemetry::{Payload, TelemetryError, TelemetryRecord, PAYLOAD_CAPACITY, SENSOR_FAILURE};
pub use time::{CivilDateTime, TimeOfDay};
