#![deny(unsafe_code)]
#![deny(warnings)]
//! System information and wall clock backed by the internal RTC
//!
//! The RTC runs from the 32.768 kHz LSE. Until the first SNTP sync the
//! clock reads as the Unix epoch, so telemetry timestamps show `00:00:00`
//! rather than whatever the RTC powered up with.

use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, Ordering};

use critical_section::Mutex;
use defmt::{error, info, Format};
use embassy_stm32::rtc::{DateTime, DayOfWeek, Rtc};
use hal_abstractions::{SystemInfo, Timestamp};
use heapless::String;
use iot_core::CivilDateTime;

use crate::device_id::{self, DEVICE_ID_MAX_LEN};

/// Set once the RTC holds network time
static TIME_SYNCED: AtomicBool = AtomicBool::new(false);

/// Global internal RTC instance
static RTC: Mutex<RefCell<Option<Rtc>>> = Mutex::new(RefCell::new(None));

/// RTC operation errors
#[derive(Debug, Clone, Copy, Format)]
pub enum RtcError {
    /// RTC not initialized
    NotInitialized,
    /// RTC hardware error
    HardwareError,
}

/// Hand the RTC to the clock; must happen before any time operations
pub fn initialize_rtc(rtc: Rtc) {
    critical_section::with(|cs| {
        RTC.borrow(cs).replace(Some(rtc));
    });
    info!("Internal RTC initialized");
}

/// Write network time to the RTC
///
/// Only marks the clock as synced if the write succeeds.
pub fn set_clock(timestamp: Timestamp) -> Result<(), RtcError> {
    let civil = CivilDateTime::from_unix(timestamp.unix_secs);
    let datetime = DateTime::from(
        civil.year,
        civil.month,
        civil.day,
        DayOfWeek::Monday, // not needed for timekeeping
        civil.hour,
        civil.minute,
        civil.second,
        0,
    )
    .map_err(|_| RtcError::HardwareError)?;

    critical_section::with(|cs| {
        let mut rtc = RTC.borrow(cs).borrow_mut();
        let rtc = rtc.as_mut().ok_or(RtcError::NotInitialized)?;
        rtc.set_datetime(datetime)
            .map_err(|_| RtcError::HardwareError)?;
        TIME_SYNCED.store(true, Ordering::Release);
        Ok(())
    })
}

fn read_clock() -> Result<Timestamp, RtcError> {
    if !TIME_SYNCED.load(Ordering::Acquire) {
        return Err(RtcError::NotInitialized);
    }

    critical_section::with(|cs| {
        let mut rtc = RTC.borrow(cs).borrow_mut();
        let rtc = rtc.as_mut().ok_or(RtcError::NotInitialized)?;
        let dt = rtc.now().map_err(|_| RtcError::HardwareError)?;
        let civil = CivilDateTime {
            year: dt.year(),
            month: dt.month(),
            day: dt.day(),
            hour: dt.hour(),
            minute: dt.minute(),
            second: dt.second(),
        };
        // Internal RTC only has 1-second resolution
        Ok(Timestamp::new(civil.to_unix(), 0))
    })
}

/// Board implementation of [`SystemInfo`]
///
/// There is no global allocator on this board, so heap figures are zero.
pub struct BoardSystem {
    device_id: String<DEVICE_ID_MAX_LEN>,
}

impl BoardSystem {
    pub fn new() -> Self {
        Self {
            device_id: device_id::device_id(),
        }
    }
}

impl SystemInfo for BoardSystem {
    fn uptime_secs(&self) -> f64 {
        embassy_time::Instant::now().as_millis() as f64 / 1000.0
    }

    fn heap_total(&self) -> u32 {
        0
    }

    fn heap_free(&self) -> u32 {
        0
    }

    fn device_id(&self) -> &str {
        self.device_id.as_str()
    }

    fn now(&self) -> Timestamp {
        match read_clock() {
            Ok(ts) => ts,
            Err(RtcError::NotInitialized) => Timestamp::new(0, 0),
            Err(e) => {
                error!("Failed to read RTC: {:?}", e);
                Timestamp::new(0, 0)
            }
        }
    }
}
