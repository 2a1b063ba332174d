//! Application configuration
//!
//! Defaults match the fielded ESP-class board: LED on GPIO2, button on GPIO0
//! (boot button, active low) and a DHT22 on GPIO5.

use hal_abstractions::{ButtonConfig, Edge, Pull, QoS, SensorModel};

/// Maximum MQTT topic length accepted by [`AppConfig::validate`]
pub const MAX_TOPIC_LEN: usize = 64;

/// Telemetry sensor wiring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorConfig {
    /// Data pin of the single-wire sensor
    pub pin: u8,
    /// Sensor family
    pub model: SensorModel,
}

/// Top-level application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Heartbeat LED output pin
    pub led_pin: u8,
    /// Heartbeat timer period in milliseconds
    pub heartbeat_period_ms: u32,
    /// Telemetry timer period in milliseconds
    pub telemetry_period_ms: u32,
    /// Button that triggers an immediate telemetry report
    pub button: ButtonConfig,
    /// Temperature/humidity sensor
    pub sensor: SensorConfig,
    /// Topic telemetry is published to
    pub topic: &'static str,
    /// Delivery guarantee for telemetry
    pub qos: QoS,
    /// Broker retain flag for telemetry
    pub retain: bool,
    /// Offset applied to the wall clock before formatting the timestamp
    pub utc_offset_secs: i32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            led_pin: 2,
            heartbeat_period_ms: 10_000,
            telemetry_period_ms: 60_000,
            button: ButtonConfig {
                pin: 0,
                pull: Pull::Up,
                edge: Edge::Falling,
                debounce_ms: 200,
            },
            sensor: SensorConfig {
                pin: 5,
                model: SensorModel::Dht22,
            },
            topic: "event/temp_humidity",
            qos: QoS::AtLeastOnce,
            retain: false,
            utc_offset_secs: 0,
        }
    }
}

/// Rejected configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// A timer period of zero
    ZeroPeriod,
    /// Empty telemetry topic
    EmptyTopic,
    /// Topic contains `+`, `#` or NUL
    InvalidTopic,
    /// Topic longer than [`MAX_TOPIC_LEN`]
    TopicTooLong,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ZeroPeriod => write!(f, "Timer period must be non-zero"),
            Self::EmptyTopic => write!(f, "Topic is empty"),
            Self::InvalidTopic => write!(f, "Topic contains invalid MQTT characters"),
            Self::TopicTooLong => write!(f, "Topic is too long"),
        }
    }
}

impl core::error::Error for ConfigError {}

impl AppConfig {
    /// Check the configuration before anything is registered
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.heartbeat_period_ms == 0 || self.telemetry_period_ms == 0 {
            return Err(ConfigError::ZeroPeriod);
        }
        validate_topic(self.topic)
    }
}

/// Validate an MQTT topic name for publishing
///
/// Topic names cannot contain wildcards (`+`, `#`) or null characters.
pub fn validate_topic(topic: &str) -> Result<(), ConfigError> {
    if topic.is_empty() {
        return Err(ConfigError::EmptyTopic);
    }
    if topic.len() > MAX_TOPIC_LEN {
        return Err(ConfigError::TopicTooLong);
    }
    if topic.contains(['+', '#', '\0']) {
        return Err(ConfigError::InvalidTopic);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.led_pin, 2);
        assert_eq!(config.heartbeat_period_ms, 10_000);
        assert_eq!(config.telemetry_period_ms, 60_000);
        assert_eq!(config.button.pin, 0);
        assert_eq!(config.button.pull, Pull::Up);
        assert_eq!(config.button.edge, Edge::Falling);
        assert_eq!(config.button.debounce_ms, 200);
        assert_eq!(config.sensor.pin, 5);
        assert_eq!(config.sensor.model, SensorModel::Dht22);
        assert_eq!(config.topic, "event/temp_humidity");
        assert_eq!(config.qos, QoS::AtLeastOnce);
        assert!(!config.retain);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_period_rejected() {
        let config = AppConfig {
            telemetry_period_ms: 0,
            ..AppConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroPeriod));
    }

    #[test]
    fn test_topic_validation() {
        assert_eq!(validate_topic(""), Err(ConfigError::EmptyTopic));
        assert_eq!(validate_topic("event/+"), Err(ConfigError::InvalidTopic));
        assert_eq!(validate_topic("event/#"), Err(ConfigError::InvalidTopic));
        assert_eq!(validate_topic("event/\0"), Err(ConfigError::InvalidTopic));

        let long_topic = "this/is/a/very/long/topic/that/exceeds/the/maximum/allowed/length/for/telemetry";
        assert_eq!(validate_topic(long_topic), Err(ConfigError::TopicTooLong));

        assert!(validate_topic("device/stm32f405-test123/telemetry").is_ok());
    }
}
