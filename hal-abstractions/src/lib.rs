//! Hardware abstraction traits for IoT firmware
//!
//! This crate defines the services an application consumes from its host
//! runtime: timers, GPIO edge handlers, event groups, sensor drivers, an MQTT
//! publisher and system information. Board support crates implement these
//! traits; `iot-core` only ever talks to them.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]
#![deny(warnings)]

pub mod event;
pub mod gpio;
pub mod mqtt;
pub mod runtime;
pub mod sensor;
pub mod system;
pub mod timer;

pub use embedded_hal;

pub use event::EventGroup;
pub use gpio::{ButtonConfig, Edge, Pull};
pub use mqtt::{Publisher, QoS};
pub use runtime::{HostEvent, Runtime};
pub use sensor::{SensorDriver, SensorModel, TemperatureHumidity};
pub use system::{SystemInfo, Timestamp};
pub use timer::{TimerId, TimerMode};
