#![deny(unsafe_code)]
#![deny(warnings)]
//! Device identifier for STM32F405
//!
//! The factory-programmed 96-bit unique device ID is stable across reboots
//! and unique to each chip. It doubles as the telemetry `device` field and
//! the MQTT client ID.

use heapless::String;

/// Maximum length of the device ID string
/// Format: "stm32f405-" (10 chars) + 24 hex chars = 34 chars total
pub const DEVICE_ID_MAX_LEN: usize = 34;

const PREFIX: &str = "stm32f405-";

/// Device ID in the format `stm32f405-{24_hex_chars}`
///
/// ```no_run
/// let id = device_id::device_id();
/// // Result: "stm32f405-0123456789abcdef01234567"
/// ```
pub fn device_id() -> String<DEVICE_ID_MAX_LEN> {
    format_device_id(embassy_stm32::uid::uid_hex())
}

fn format_device_id(uid_hex: &str) -> String<DEVICE_ID_MAX_LEN> {
    let mut id = String::new();
    // Both pushes fit: 10 + 24 bytes is exactly DEVICE_ID_MAX_LEN. A short
    // or oversized UID string truncates instead of failing.
    let _ = id.push_str(PREFIX);
    for c in uid_hex.chars() {
        if id.push(c).is_err() {
            break;
        }
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_id_format() {
        let id = format_device_id("0123456789abcdef01234567");
        assert_eq!(id.as_str(), "stm32f405-0123456789abcdef01234567");
        assert_eq!(id.len(), DEVICE_ID_MAX_LEN);
    }

    #[test]
    fn test_oversized_uid_truncates() {
        let id = format_device_id("0123456789abcdef0123456789");
        assert_eq!(id.len(), DEVICE_ID_MAX_LEN);
    }
}
