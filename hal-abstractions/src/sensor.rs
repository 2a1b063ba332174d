//! Temperature/humidity sensor driver interface

/// Supported single-wire sensor families
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorModel {
    Dht11,
    Dht21,
    Dht22,
}

impl SensorModel {
    /// Human readable part name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Dht11 => "DHT11",
            Self::Dht21 => "DHT21",
            Self::Dht22 => "DHT22",
        }
    }
}

impl core::fmt::Display for SensorModel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// A configured sensor instance
pub trait TemperatureHumidity {
    /// Read failure (timeout, checksum, ...)
    type Error: core::fmt::Debug;

    /// Temperature in degrees Celsius
    fn read_temperature(&mut self) -> Result<f32, Self::Error>;

    /// Relative humidity in percent
    fn read_humidity(&mut self) -> Result<f32, Self::Error>;
}

/// Factory for sensor instances
pub trait SensorDriver {
    /// Sensor produced by this driver
    type Sensor: TemperatureHumidity;
    /// Creation failure
    type Error: core::fmt::Debug;

    /// Claim `pin` and configure a sensor of the given model on it
    fn create(&mut self, pin: u8, model: SensorModel) -> Result<Self::Sensor, Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_names() {
        assert_eq!(SensorModel::Dht11.name(), "DHT11");
        assert_eq!(SensorModel::Dht22.name(), "DHT22");
    }
}
