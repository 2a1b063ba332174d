//! Host-side doubles for the runtime services, plus log capture

use std::cell::RefCell;
use std::sync::Once;

use hal_abstractions::embedded_hal::digital::{self, ErrorType, OutputPin, StatefulOutputPin};
use hal_abstractions::{
    ButtonConfig, EventGroup, Publisher, QoS, Runtime, SensorDriver, SensorModel, SystemInfo,
    TemperatureHumidity, TimerId, TimerMode, Timestamp,
};

use crate::app::Callback;

// --- log capture -----------------------------------------------------------

/// One captured log record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub level: log::Level,
    pub message: String,
}

thread_local! {
    static CAPTURED: RefCell<Option<Vec<LogLine>>> = const { RefCell::new(None) };
}

struct CaptureLogger;

impl log::Log for CaptureLogger {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        CAPTURED.with(|captured| {
            if let Some(lines) = captured.borrow_mut().as_mut() {
                lines.push(LogLine {
                    level: record.level(),
                    message: record.args().to_string(),
                });
            }
        });
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger;
static INSTALL: Once = Once::new();

/// Run `f` and return what it logged on this thread
///
/// Each test runs on its own thread, so captures never mix.
pub fn capture_logs<R>(f: impl FnOnce() -> R) -> (R, Vec<LogLine>) {
    INSTALL.call_once(|| {
        let _ = log::set_logger(&LOGGER);
        log::set_max_level(log::LevelFilter::Trace);
    });

    CAPTURED.with(|captured| *captured.borrow_mut() = Some(Vec::new()));
    let result = f();
    let lines = CAPTURED.with(|captured| captured.borrow_mut().take().unwrap_or_default());
    (result, lines)
}

// --- sensor ----------------------------------------------------------------

/// Failure modes of the scripted sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorFault {
    NotFound,
    Timeout,
    Checksum,
}

/// Sensor returning fixed values, optionally failing per channel
#[derive(Debug, Clone)]
pub struct ScriptedSensor {
    pub temperature: f32,
    pub humidity: f32,
    pub fail_temperature: Option<SensorFault>,
    pub fail_humidity: Option<SensorFault>,
}

impl ScriptedSensor {
    pub fn new(temperature: f32, humidity: f32) -> Self {
        Self {
            temperature,
            humidity,
            fail_temperature: None,
            fail_humidity: None,
        }
    }
}

impl TemperatureHumidity for ScriptedSensor {
    type Error = SensorFault;

    fn read_temperature(&mut self) -> Result<f32, SensorFault> {
        match self.fail_temperature {
            Some(fault) => Err(fault),
            None => Ok(self.temperature),
        }
    }

    fn read_humidity(&mut self) -> Result<f32, SensorFault> {
        match self.fail_humidity {
            Some(fault) => Err(fault),
            None => Ok(self.humidity),
        }
    }
}

/// Driver handing out [`ScriptedSensor`]s and recording what was asked for
#[derive(Debug, Default)]
pub struct ScriptedDriver {
    pub temperature: f32,
    pub humidity: f32,
    /// `create` fails with [`SensorFault::NotFound`]
    pub refuse: bool,
    /// Created sensors fail every read with [`SensorFault::Timeout`]
    pub sensor_fails: bool,
    pub created: Vec<(u8, SensorModel)>,
}

impl ScriptedDriver {
    pub fn new(temperature: f32, humidity: f32) -> Self {
        Self {
            temperature,
            humidity,
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            refuse: true,
            ..Self::default()
        }
    }
}

impl SensorDriver for ScriptedDriver {
    type Sensor = ScriptedSensor;
    type Error = SensorFault;

    fn create(&mut self, pin: u8, model: SensorModel) -> Result<ScriptedSensor, SensorFault> {
        if self.refuse {
            return Err(SensorFault::NotFound);
        }
        self.created.push((pin, model));

        let mut sensor = ScriptedSensor::new(self.temperature, self.humidity);
        if self.sensor_fails {
            sensor.fail_temperature = Some(SensorFault::Timeout);
            sensor.fail_humidity = Some(SensorFault::Timeout);
        }
        Ok(sensor)
    }
}

// --- GPIO ------------------------------------------------------------------

/// GPIO failure of [`FakeLed`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinFault;

impl digital::Error for PinFault {
    fn kind(&self) -> digital::ErrorKind {
        digital::ErrorKind::Other
    }
}

/// Output pin that remembers its level and counts level changes
#[derive(Debug, Default)]
pub struct FakeLed {
    pub high: bool,
    pub toggles: u32,
    pub fail: bool,
}

impl FakeLed {
    pub fn low() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn check(&self) -> Result<(), PinFault> {
        if self.fail {
            Err(PinFault)
        } else {
            Ok(())
        }
    }
}

impl ErrorType for FakeLed {
    type Error = PinFault;
}

impl OutputPin for FakeLed {
    fn set_low(&mut self) -> Result<(), PinFault> {
        self.check()?;
        if self.high {
            self.toggles += 1;
        }
        self.high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), PinFault> {
        self.check()?;
        if !self.high {
            self.toggles += 1;
        }
        self.high = true;
        Ok(())
    }
}

impl StatefulOutputPin for FakeLed {
    fn is_set_high(&mut self) -> Result<bool, PinFault> {
        self.check()?;
        Ok(self.high)
    }

    fn is_set_low(&mut self) -> Result<bool, PinFault> {
        self.check()?;
        Ok(!self.high)
    }
}

// --- runtime ---------------------------------------------------------------

/// What the application asked the runtime for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Output(u8),
    Timer {
        period_ms: u32,
        mode: TimerMode,
        callback: Callback,
    },
    Button {
        config: ButtonConfig,
        callback: Callback,
    },
    EventGroup {
        group: EventGroup,
        callback: Callback,
    },
}

/// Runtime registration failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoTimerSlot;

/// Runtime that records registrations instead of acting on them
#[derive(Debug, Default)]
pub struct RecordingRuntime {
    pub registrations: Vec<Registration>,
    /// `set_timer` fails with [`NoTimerSlot`]
    pub reject_timers: bool,
    next_timer: u32,
}

impl RecordingRuntime {
    /// Runtime whose timer service is exhausted
    pub fn rejecting_timers() -> Self {
        Self {
            reject_timers: true,
            ..Self::default()
        }
    }
}

impl Runtime<Callback> for RecordingRuntime {
    type Error = NoTimerSlot;

    fn configure_output(&mut self, pin: u8) -> Result<(), NoTimerSlot> {
        self.registrations.push(Registration::Output(pin));
        Ok(())
    }

    fn set_timer(
        &mut self,
        period_ms: u32,
        mode: TimerMode,
        callback: Callback,
    ) -> Result<TimerId, NoTimerSlot> {
        if self.reject_timers {
            return Err(NoTimerSlot);
        }
        self.registrations.push(Registration::Timer {
            period_ms,
            mode,
            callback,
        });
        self.next_timer += 1;
        Ok(TimerId(self.next_timer))
    }

    fn set_button_handler(
        &mut self,
        config: ButtonConfig,
        callback: Callback,
    ) -> Result<(), NoTimerSlot> {
        self.registrations
            .push(Registration::Button { config, callback });
        Ok(())
    }

    fn add_event_group_handler(
        &mut self,
        group: EventGroup,
        callback: Callback,
    ) -> Result<(), NoTimerSlot> {
        self.registrations
            .push(Registration::EventGroup { group, callback });
        Ok(())
    }
}

// --- messaging -------------------------------------------------------------

/// Publish failure of [`RecordingPublisher`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishFault {
    NotConnected,
}

/// A message handed to the publisher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub topic: String,
    pub payload: Vec<u8>,
    pub qos: QoS,
    pub retain: bool,
}

/// Publisher that keeps accepted messages and counts attempts
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    pub published: Vec<Published>,
    pub attempts: u32,
    pub fail: Option<PublishFault>,
}

impl RecordingPublisher {
    pub fn failing(fault: PublishFault) -> Self {
        Self {
            fail: Some(fault),
            ..Self::default()
        }
    }
}

impl Publisher for RecordingPublisher {
    type Error = PublishFault;

    fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        qos: QoS,
        retain: bool,
    ) -> Result<(), PublishFault> {
        self.attempts += 1;
        if let Some(fault) = self.fail {
            return Err(fault);
        }
        self.published.push(Published {
            topic: topic.to_string(),
            payload: payload.to_vec(),
            qos,
            retain,
        });
        Ok(())
    }
}

// --- system ----------------------------------------------------------------

/// System information with fixed values
#[derive(Debug, Clone)]
pub struct FixedSystem {
    pub uptime: f64,
    pub heap_total: u32,
    pub heap_free: u32,
    pub device_id: &'static str,
    pub now: Timestamp,
}

impl Default for FixedSystem {
    fn default() -> Self {
        Self {
            uptime: 0.0,
            heap_total: 0,
            heap_free: 0,
            device_id: "test-device",
            now: Timestamp::new(0, 0),
        }
    }
}

impl FixedSystem {
    /// 524288 B heap, 300000 B free, device "dev-01", 2024-01-01 14:05:09 UTC
    pub fn reference() -> Self {
        Self {
            uptime: 42.0,
            heap_total: 524_288,
            heap_free: 300_000,
            device_id: "dev-01",
            now: Timestamp::new(1_704_067_200 + 14 * 3600 + 5 * 60 + 9, 0),
        }
    }
}

impl SystemInfo for FixedSystem {
    fn uptime_secs(&self) -> f64 {
        self.uptime
    }

    fn heap_total(&self) -> u32 {
        self.heap_total
    }

    fn heap_free(&self) -> u32 {
        self.heap_free
    }

    fn device_id(&self) -> &str {
        self.device_id
    }

    fn now(&self) -> Timestamp {
        self.now
    }
}
