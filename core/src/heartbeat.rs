//! LED heartbeat
//!
//! Each tick flips the LED and reports uptime and heap usage. The new state
//! is read back from the pin rather than tracked separately, so the log always
//! reflects what the hardware drives.

use hal_abstractions::embedded_hal::digital::StatefulOutputPin;
use hal_abstractions::SystemInfo;

use crate::fmt::{fixed2, Dbg};

/// GPIO failure while toggling the LED
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HeartbeatError {
    /// Toggling or reading back the output failed
    Gpio,
}

impl core::fmt::Display for HeartbeatError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Gpio => write!(f, "GPIO error"),
        }
    }
}

impl core::error::Error for HeartbeatError {}

/// Toggle `led` and log the new state with system statistics
///
/// Returns the new logical level (`true` = high).
pub fn tick<L, H>(led: &mut L, system: &H) -> Result<bool, HeartbeatError>
where
    L: StatefulOutputPin,
    H: SystemInfo + ?Sized,
{
    let level = led
        .toggle()
        .and_then(|()| led.is_set_high())
        .map_err(|e| {
            log_error!("Heartbeat LED toggle failed: {}", Dbg(&e));
            HeartbeatError::Gpio
        })?;

    let uptime = fixed2(system.uptime_secs());
    log_info!(
        "{} uptime: {}, RAM: {}, {} free",
        if level { "Tick" } else { "Tock" },
        uptime.as_str(),
        system.heap_total(),
        system.heap_free()
    );

    Ok(level)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{capture_logs, FakeLed, FixedSystem};

    #[test]
    fn test_tick_flips_state() {
        let system = FixedSystem::default();
        let mut led = FakeLed::low();

        for _ in 0..5 {
            let before = led.high;
            let after = tick(&mut led, &system).unwrap();
            assert_eq!(after, !before);
            assert_eq!(led.high, after);
        }
        assert_eq!(led.toggles, 5);
    }

    #[test]
    fn test_tick_logs_stats() {
        let system = FixedSystem {
            uptime: 12.3456,
            heap_total: 524_288,
            heap_free: 300_000,
            ..FixedSystem::default()
        };
        let mut led = FakeLed::low();

        let (_, logs) = capture_logs(|| tick(&mut led, &system));
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].message, "Tick uptime: 12.35, RAM: 524288, 300000 free");

        let (_, logs) = capture_logs(|| tick(&mut led, &system));
        assert!(logs[0].message.starts_with("Tock "));
    }

    #[test]
    fn test_gpio_failure_is_reported() {
        let system = FixedSystem::default();
        let mut led = FakeLed::failing();

        let (result, logs) = capture_logs(|| tick(&mut led, &system));
        assert_eq!(result, Err(HeartbeatError::Gpio));
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].level, log::Level::Error);
    }
}
