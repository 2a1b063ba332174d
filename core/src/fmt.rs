//! Logging macros
//!
//! Firmware builds enable the `defmt` feature and log over RTT. Everything
//! else (host tests, simulators) goes through the `log` facade. Format
//! strings must stay within the `{}` subset both backends accept; values that
//! need precision are pre-formatted into a `heapless::String` first.

macro_rules! log_info {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::info!($($arg)*);
        #[cfg(not(feature = "defmt"))]
        ::log::info!($($arg)*);
    }};
}

macro_rules! log_warn {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::warn!($($arg)*);
        #[cfg(not(feature = "defmt"))]
        ::log::warn!($($arg)*);
    }};
}

macro_rules! log_error {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::error!($($arg)*);
        #[cfg(not(feature = "defmt"))]
        ::log::error!($($arg)*);
    }};
}

macro_rules! log_debug {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::debug!($($arg)*);
        #[cfg(not(feature = "defmt"))]
        ::log::debug!($($arg)*);
    }};
}

use core::fmt::Write;

/// Formats any `Debug` value for either logging backend
pub(crate) struct Dbg<'a, T: ?Sized>(pub &'a T);

impl<T: core::fmt::Debug + ?Sized> core::fmt::Display for Dbg<'_, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

#[cfg(feature = "defmt")]
impl<T: core::fmt::Debug + ?Sized> defmt::Format for Dbg<'_, T> {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{}", defmt::Debug2Format(self.0))
    }
}

/// Two-decimal rendering of `value` for log lines
pub(crate) fn fixed2(value: f64) -> heapless::String<24> {
    let mut out = heapless::String::new();
    // 24 bytes holds any f64 in range of uptime/temperature at 2 decimals
    if write!(out, "{:.2}", value).is_err() {
        out.clear();
        let _ = out.push_str("?");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed2() {
        assert_eq!(fixed2(12.3456).as_str(), "12.35");
        assert_eq!(fixed2(0.0).as_str(), "0.00");
        assert_eq!(fixed2(-1000.0).as_str(), "-1000.00");
    }

    #[test]
    fn test_fixed2_overflow_falls_back() {
        assert_eq!(fixed2(1e300).as_str(), "?");
    }

    #[test]
    fn test_dbg_uses_debug() {
        #[derive(Debug)]
        struct Timeout;
        let mut s = heapless::String::<16>::new();
        write!(s, "{}", Dbg(&Timeout)).unwrap();
        assert_eq!(s.as_str(), "Timeout");
    }
}
