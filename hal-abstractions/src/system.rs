//! System information and wall clock

/// Wall clock reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timestamp {
    /// Unix timestamp in seconds since epoch (1970-01-01 00:00:00 UTC)
    pub unix_secs: u64,
    /// Microseconds component (0-999,999)
    pub micros: u32,
}

impl Timestamp {
    /// Create a new timestamp
    pub const fn new(unix_secs: u64, micros: u32) -> Self {
        Self { unix_secs, micros }
    }
}

/// Runtime statistics and identity of the device
pub trait SystemInfo {
    /// Seconds since boot
    fn uptime_secs(&self) -> f64;

    /// Total heap size in bytes
    fn heap_total(&self) -> u32;

    /// Free heap in bytes
    fn heap_free(&self) -> u32;

    /// Configured device identifier
    ///
    /// Sent verbatim in every telemetry report, which is capped at 256
    /// bytes; keep it well under ~130 bytes or reports are skipped.
    fn device_id(&self) -> &str;

    /// Current wall clock time; `unix_secs == 0` until the clock is set
    fn now(&self) -> Timestamp;
}
