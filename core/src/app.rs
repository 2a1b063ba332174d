//! Application coordinator
//!
//! [`App::bootstrap`] registers everything with the host runtime; afterwards
//! the runtime drives the application through [`App::dispatch`]. Every
//! handler takes `&mut self`, so handlers can never overlap and the button
//! and timer paths into [`App::on_telemetry`] are strictly serialized.

use hal_abstractions::embedded_hal::digital::StatefulOutputPin;
use hal_abstractions::{
    EventGroup, HostEvent, Publisher, Runtime, SensorDriver, SystemInfo, TimerMode,
};

use crate::config::{AppConfig, ConfigError};
use crate::fmt::{fixed2, Dbg};
use crate::heartbeat;
use crate::network::{self, NetEvent};
use crate::sensor::{Reading, SensorHandle};
use crate::telemetry::{self, TelemetryRecord};
use crate::time::TimeOfDay;

/// Callback tags registered with the runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Callback {
    /// LED heartbeat timer
    Heartbeat,
    /// Periodic telemetry timer
    Telemetry,
    /// Button edge
    Button,
    /// Network event group
    NetStatus,
}

/// Which bootstrap registrations the runtime accepted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BootReport {
    pub led_output: bool,
    pub heartbeat_timer: bool,
    pub telemetry_timer: bool,
    pub button_handler: bool,
    pub sensor: bool,
    pub net_handler: bool,
}

/// Result of one telemetry cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PublishOutcome {
    /// The messaging client accepted the payload
    Published,
    /// The messaging client rejected the payload
    Failed,
    /// No publish was attempted (payload could not be encoded)
    Skipped,
}

/// The application and the resources it owns
pub struct App<L, S, P, H> {
    config: AppConfig,
    led: L,
    sensor: SensorHandle<S>,
    publisher: P,
    system: H,
    boot: BootReport,
}

impl<L, S, P, H> App<L, S, P, H>
where
    L: StatefulOutputPin,
    S: hal_abstractions::TemperatureHumidity,
    P: Publisher,
    H: SystemInfo,
{
    /// Register timers, handlers and the sensor with the host runtime
    ///
    /// Only an invalid `config` fails. Registration and sensor creation
    /// failures are logged and recorded in [`App::boot_report`]; the
    /// application still starts with whatever did register.
    pub fn bootstrap<R, D>(
        config: AppConfig,
        runtime: &mut R,
        driver: &mut D,
        led: L,
        publisher: P,
        system: H,
    ) -> Result<Self, ConfigError>
    where
        R: Runtime<Callback>,
        D: SensorDriver<Sensor = S>,
    {
        config.validate().map_err(|e| {
            log_error!("Invalid configuration: {}", e);
            e
        })?;

        let mut boot = BootReport::default();

        boot.led_output = registered("LED output", runtime.configure_output(config.led_pin));
        boot.heartbeat_timer = registered(
            "heartbeat timer",
            runtime.set_timer(
                config.heartbeat_period_ms,
                TimerMode::Repeat,
                Callback::Heartbeat,
            ),
        );
        boot.telemetry_timer = registered(
            "telemetry timer",
            runtime.set_timer(
                config.telemetry_period_ms,
                TimerMode::Repeat,
                Callback::Telemetry,
            ),
        );
        boot.button_handler = registered(
            "button handler",
            runtime.set_button_handler(config.button, Callback::Button),
        );

        let sensor = match driver.create(config.sensor.pin, config.sensor.model) {
            Ok(sensor) => {
                boot.sensor = true;
                SensorHandle::new(sensor)
            }
            Err(e) => {
                log_warn!(
                    "Unable to initialize {}: {}",
                    config.sensor.model.name(),
                    Dbg(&e)
                );
                SensorHandle::absent()
            }
        };

        let device = system.device_id();
        if !telemetry::device_fits(device) {
            log_error!(
                "Device id is too long for telemetry ({} bytes); reports will be skipped",
                device.len()
            );
        }

        boot.net_handler = registered(
            "network event handler",
            runtime.add_event_group_handler(EventGroup::Net, Callback::NetStatus),
        );

        log_info!(
            "Application started: heartbeat every {} ms, telemetry every {} ms to {}",
            config.heartbeat_period_ms,
            config.telemetry_period_ms,
            config.topic
        );

        Ok(Self {
            config,
            led,
            sensor,
            publisher,
            system,
            boot,
        })
    }

    /// Route a runtime trigger to its handler
    pub fn dispatch(&mut self, event: HostEvent<Callback>) {
        match event {
            HostEvent::Timer(Callback::Heartbeat) => {
                let _ = self.on_heartbeat();
            }
            HostEvent::Timer(Callback::Telemetry) => {
                self.on_telemetry();
            }
            HostEvent::Edge {
                callback: Callback::Button,
                pin,
            } => {
                self.on_button(pin);
            }
            HostEvent::Event {
                callback: Callback::NetStatus,
                group: EventGroup::Net,
                code,
            } => {
                self.on_net_event(code);
            }
            other => log_debug!("Ignoring unexpected dispatch: {}", Dbg(&other)),
        }
    }

    /// Heartbeat timer: flip the LED and log system statistics
    pub fn on_heartbeat(&mut self) -> Option<bool> {
        heartbeat::tick(&mut self.led, &self.system).ok()
    }

    /// Telemetry timer: read the sensor and publish one report
    ///
    /// Exactly one publish attempt is made and its result logged; failures
    /// are not retried.
    pub fn on_telemetry(&mut self) -> PublishOutcome {
        let reading = self.sensor.read();
        self.publish_reading(reading)
    }

    /// Button press: log the current reading, then report it
    pub fn on_button(&mut self, pin: u8) -> PublishOutcome {
        log_info!("Button pressed on pin: {}", pin);

        let reading = self.sensor.read();
        let temperature = fixed2(reading.temperature as f64);
        let humidity = fixed2(reading.humidity as f64);
        log_info!(
            "Temperature: {} *C Humidity: {} %",
            temperature.as_str(),
            humidity.as_str()
        );

        self.on_telemetry()
    }

    /// Network event: log known transitions
    pub fn on_net_event(&mut self, code: i32) -> Option<NetEvent> {
        network::observe(code)
    }

    /// Registrations accepted at bootstrap
    pub fn boot_report(&self) -> BootReport {
        self.boot
    }

    /// Active configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    fn publish_reading(&mut self, reading: Reading) -> PublishOutcome {
        let now = self.system.now();
        let record = TelemetryRecord {
            total_ram: self.system.heap_total(),
            free_ram: self.system.heap_free(),
            temperature: reading.temperature,
            humidity: reading.humidity,
            device: self.system.device_id(),
            timestamp: TimeOfDay::from_unix(now.unix_secs, self.config.utc_offset_secs),
        };

        let payload = match record.to_json() {
            Ok(payload) => payload,
            Err(e) => {
                log_error!("Telemetry not published: {}", e);
                return PublishOutcome::Skipped;
            }
        };
        log_debug!("Telemetry payload: {}", payload.as_str());

        match self.publisher.publish(
            self.config.topic,
            payload.as_bytes(),
            self.config.qos,
            self.config.retain,
        ) {
            Ok(()) => {
                log_info!("Published to {}: yes", self.config.topic);
                PublishOutcome::Published
            }
            Err(e) => {
                log_warn!("Published to {}: no ({})", self.config.topic, Dbg(&e));
                PublishOutcome::Failed
            }
        }
    }
}

/// Log a failed registration and report whether it succeeded
fn registered<T, E: core::fmt::Debug>(what: &str, result: Result<T, E>) -> bool {
    match result {
        Ok(_) => true,
        Err(e) => {
            log_error!("Failed to register {}: {}", what, Dbg(&e));
            false
        }
    }
}
