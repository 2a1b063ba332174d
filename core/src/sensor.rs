//! Sensor handle owned by the application

use hal_abstractions::TemperatureHumidity;

use crate::fmt::Dbg;
use crate::telemetry::{finite_or_sentinel, SENSOR_FAILURE};

/// Temperature and humidity taken together
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    /// Degrees Celsius, or [`SENSOR_FAILURE`]
    pub temperature: f32,
    /// Percent relative humidity, or [`SENSOR_FAILURE`]
    pub humidity: f32,
}

impl Reading {
    /// Reading reported when no sensor is available
    pub const UNAVAILABLE: Self = Self {
        temperature: SENSOR_FAILURE,
        humidity: SENSOR_FAILURE,
    };
}

/// The sensor created at bootstrap, if creation succeeded
///
/// Reads never fail outright: a missing sensor or a failed channel yields
/// [`SENSOR_FAILURE`] for that channel.
pub struct SensorHandle<S> {
    sensor: Option<S>,
}

impl<S: TemperatureHumidity> SensorHandle<S> {
    /// Wrap a successfully created sensor
    pub fn new(sensor: S) -> Self {
        Self {
            sensor: Some(sensor),
        }
    }

    /// Handle for a sensor that could not be created
    pub fn absent() -> Self {
        Self { sensor: None }
    }

    /// Whether a sensor is attached
    pub fn is_present(&self) -> bool {
        self.sensor.is_some()
    }

    /// Read both channels
    ///
    /// An absent sensor was already reported at bootstrap and is not logged
    /// again; a failing channel on a present sensor logs a warning.
    pub fn read(&mut self) -> Reading {
        let Some(sensor) = self.sensor.as_mut() else {
            return Reading::UNAVAILABLE;
        };

        let temperature = match sensor.read_temperature() {
            Ok(t) => finite_or_sentinel(t),
            Err(e) => {
                log_warn!("Temperature read failed: {}", Dbg(&e));
                SENSOR_FAILURE
            }
        };
        let humidity = match sensor.read_humidity() {
            Ok(h) => finite_or_sentinel(h),
            Err(e) => {
                log_warn!("Humidity read failed: {}", Dbg(&e));
                SENSOR_FAILURE
            }
        };

        Reading {
            temperature,
            humidity,
        }
    }
}

impl<S: TemperatureHumidity> From<Option<S>> for SensorHandle<S> {
    fn from(sensor: Option<S>) -> Self {
        Self { sensor }
    }
}
