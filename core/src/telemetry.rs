//! Telemetry record and its JSON payload
//!
//! The payload is written by hand into a fixed-capacity buffer, no allocator
//! involved. Key order and formatting are fixed:
//!
//! ```text
//! {"total_ram":524288,"free_ram":300000,"temperature":23.5,"humidity":48.2,"device":"dev-01","timestamp":"14:05:09"}
//! ```
//!
//! Sensor fields always carry a fractional part (`20.0`, `-1000.0`) so they
//! decode as floats whatever the reading.

use core::fmt::Write;

use heapless::String;

use crate::time::TimeOfDay;

/// Payload buffer capacity in bytes
pub const PAYLOAD_CAPACITY: usize = 256;

/// Value reported in place of a reading that could not be taken
pub const SENSOR_FAILURE: f32 = -1000.0;

/// Serialized telemetry message
pub type Payload = String<PAYLOAD_CAPACITY>;

/// Telemetry encoding errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TelemetryError {
    /// Encoded record does not fit in [`PAYLOAD_CAPACITY`]
    PayloadTooLarge,
}

impl core::fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::PayloadTooLarge => write!(f, "Payload too large"),
        }
    }
}

impl core::error::Error for TelemetryError {}

/// One telemetry report, built and consumed within a single publish cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryRecord<'a> {
    /// Total heap in bytes
    pub total_ram: u32,
    /// Free heap in bytes
    pub free_ram: u32,
    /// Temperature in degrees Celsius, or [`SENSOR_FAILURE`]
    pub temperature: f32,
    /// Relative humidity in percent, or [`SENSOR_FAILURE`]
    pub humidity: f32,
    /// Device identifier
    pub device: &'a str,
    /// Local time of day the record was taken
    pub timestamp: TimeOfDay,
}

impl TelemetryRecord<'_> {
    /// Encode as a compact JSON object
    ///
    /// Non-finite readings are encoded as [`SENSOR_FAILURE`] so the output is
    /// always valid JSON with numeric sensor fields.
    pub fn to_json(&self) -> Result<Payload, TelemetryError> {
        let mut out = Payload::new();
        self.write_json(&mut out)
            .map_err(|_| TelemetryError::PayloadTooLarge)?;
        Ok(out)
    }

    fn write_json(&self, out: &mut Payload) -> core::fmt::Result {
        write!(
            out,
            "{{\"total_ram\":{},\"free_ram\":{},\"temperature\":{},\"humidity\":{},\"device\":",
            self.total_ram,
            self.free_ram,
            JsonFloat(self.temperature),
            JsonFloat(self.humidity),
        )?;
        write_json_str(out, self.device)?;
        write!(out, ",\"timestamp\":\"{}\"}}", self.timestamp)
    }
}

/// Whether reports from `device` fit in [`PAYLOAD_CAPACITY`]
///
/// Sized against the largest RAM figures and failed readings; real sensor
/// values are never wider than the sentinel by more than a few bytes.
pub fn device_fits(device: &str) -> bool {
    let record = TelemetryRecord {
        total_ram: u32::MAX,
        free_ram: u32::MAX,
        temperature: SENSOR_FAILURE,
        humidity: SENSOR_FAILURE,
        device,
        timestamp: TimeOfDay {
            hour: 23,
            minute: 59,
            second: 59,
        },
    };
    record.to_json().is_ok()
}

/// Replace NaN and infinities with [`SENSOR_FAILURE`]
pub fn finite_or_sentinel(value: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        SENSOR_FAILURE
    }
}

/// JSON number that always reads back as a float
struct JsonFloat(f32);

impl core::fmt::Display for JsonFloat {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        // f32 Display never uses exponent notation; 64 bytes fits any value
        let mut digits = String::<64>::new();
        write!(digits, "{}", finite_or_sentinel(self.0))?;
        f.write_str(&digits)?;
        if !digits.contains('.') {
            f.write_str(".0")?;
        }
        Ok(())
    }
}

/// Write `s` as a quoted JSON string
fn write_json_str<W: Write>(out: &mut W, s: &str) -> core::fmt::Result {
    out.write_char('"')?;
    for c in s.chars() {
        match c {
            '"' => out.write_str("\\\"")?,
            '\\' => out.write_str("\\\\")?,
            '\n' => out.write_str("\\n")?,
            '\r' => out.write_str("\\r")?,
            '\t' => out.write_str("\\t")?,
            c if (c as u32) < 0x20 => write!(out, "\\u{:04x}", c as u32)?,
            c => out.write_char(c)?,
        }
    }
    out.write_char('"')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(device: &str) -> TelemetryRecord<'_> {
        TelemetryRecord {
            total_ram: 524_288,
            free_ram: 300_000,
            temperature: 23.5,
            humidity: 48.2,
            device,
            timestamp: TimeOfDay::new(14, 5, 9).unwrap(),
        }
    }

    #[test]
    fn test_reference_payload() {
        let payload = record("dev-01").to_json().unwrap();
        assert_eq!(
            payload.as_str(),
            r#"{"total_ram":524288,"free_ram":300000,"temperature":23.5,"humidity":48.2,"device":"dev-01","timestamp":"14:05:09"}"#
        );
    }

    #[test]
    fn test_failed_readings_stay_numeric() {
        let mut r = record("dev-01");
        r.temperature = f32::NAN;
        r.humidity = f32::INFINITY;
        let payload = r.to_json().unwrap();
        assert!(payload.contains(r#""temperature":-1000.0,"#));
        assert!(payload.contains(r#""humidity":-1000.0,"#));
        assert!(!payload.contains("NaN"));
        assert!(!payload.contains("inf"));
    }

    #[test]
    fn test_integral_readings_keep_float_form() {
        let mut r = record("dev-01");
        r.temperature = 20.0;
        r.humidity = 50.0;
        let payload = r.to_json().unwrap();
        assert!(payload.contains(r#""temperature":20.0,"humidity":50.0,"#));

        r.temperature = SENSOR_FAILURE;
        r.humidity = -0.5;
        let payload = r.to_json().unwrap();
        assert!(payload.contains(r#""temperature":-1000.0,"humidity":-0.5,"#));
    }

    #[test]
    fn test_json_float() {
        let mut s = String::<24>::new();
        write!(s, "{} {} {}", JsonFloat(23.5), JsonFloat(0.0), JsonFloat(f32::NAN)).unwrap();
        assert_eq!(s.as_str(), "23.5 0.0 -1000.0");
    }

    #[test]
    fn test_device_is_escaped() {
        let payload = record("a\"b\\c\n").to_json().unwrap();
        assert!(payload.contains(r#""device":"a\"b\\c\n""#));
    }

    #[test]
    fn test_control_characters_escaped() {
        let payload = record("x\u{1}").to_json().unwrap();
        assert!(payload.contains(r#""device":"x\u0001""#));
    }

    #[test]
    fn test_payload_too_large() {
        let long_id = "dddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddd";
        assert_eq!(
            record(long_id).to_json(),
            Err(TelemetryError::PayloadTooLarge)
        );
    }

    #[test]
    fn test_device_fits() {
        assert!(device_fits("dev-01"));
        assert!(device_fits("stm32f405-0123456789abcdef01234567"));
        assert!(!device_fits(&"d".repeat(160)));
    }

    #[test]
    fn test_finite_or_sentinel() {
        assert_eq!(finite_or_sentinel(21.0), 21.0);
        assert_eq!(finite_or_sentinel(f32::NAN), SENSOR_FAILURE);
        assert_eq!(finite_or_sentinel(f32::NEG_INFINITY), SENSOR_FAILURE);
    }
}
