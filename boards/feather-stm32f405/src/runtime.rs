#![deny(unsafe_code)]
#![deny(warnings)]
//! Registration side of the board runtime
//!
//! `App::bootstrap` runs inside RTIC `init`, before any task exists. The
//! runtime therefore only records what was asked for; `init` turns the
//! resulting [`Schedule`] into spawned tasks.

use defmt::{info, Format};
use hal_abstractions::{ButtonConfig, EventGroup, Runtime, TimerId, TimerMode};
use heapless::Vec;
use iot_core::Callback;

/// Timer tasks available on this board
pub const MAX_TIMERS: usize = 2;

/// Board pin numbers (Feather silkscreen labels)
pub mod pins {
    /// Red user LED, D13 (PC1)
    pub const LED: u8 = 13;
    /// Push button to GND, D10 (PB9)
    pub const BUTTON: u8 = 10;
    /// DHT22 data line, D9 (PB8)
    pub const DHT: u8 = 9;
}

/// Registration failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub enum RuntimeError {
    /// Pin is not wired for the requested use on this board
    UnknownPin(u8),
    /// All timer tasks are taken
    NoTimerSlot,
    /// The button task is already bound
    ButtonTaken,
}

/// One registered timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub struct TimerSlot {
    pub period_ms: u32,
    pub mode: TimerMode,
    pub callback: Callback,
}

/// Everything the application registered during bootstrap
#[derive(Debug, Default)]
pub struct Schedule {
    pub timers: Vec<TimerSlot, MAX_TIMERS>,
    pub button: Option<(ButtonConfig, Callback)>,
    pub net: Option<Callback>,
}

/// Runtime handed to `App::bootstrap`
#[derive(Default)]
pub struct BoardRuntime {
    schedule: Schedule,
}

impl BoardRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registrations collected so far
    pub fn into_schedule(self) -> Schedule {
        self.schedule
    }
}

impl Runtime<Callback> for BoardRuntime {
    type Error = RuntimeError;

    fn configure_output(&mut self, pin: u8) -> Result<(), RuntimeError> {
        // The LED output is created in init; only check the wiring matches
        if pin != pins::LED {
            return Err(RuntimeError::UnknownPin(pin));
        }
        Ok(())
    }

    fn set_timer(
        &mut self,
        period_ms: u32,
        mode: TimerMode,
        callback: Callback,
    ) -> Result<TimerId, RuntimeError> {
        let slot = TimerSlot {
            period_ms,
            mode,
            callback,
        };
        self.schedule
            .timers
            .push(slot)
            .map_err(|_| RuntimeError::NoTimerSlot)?;
        info!("Timer {}: every {} ms -> {:?}", self.schedule.timers.len(), period_ms, callback);
        Ok(TimerId(self.schedule.timers.len() as u32))
    }

    fn set_button_handler(
        &mut self,
        config: ButtonConfig,
        callback: Callback,
    ) -> Result<(), RuntimeError> {
        if config.pin != pins::BUTTON {
            return Err(RuntimeError::UnknownPin(config.pin));
        }
        if self.schedule.button.is_some() {
            return Err(RuntimeError::ButtonTaken);
        }
        self.schedule.button = Some((config, callback));
        Ok(())
    }

    fn add_event_group_handler(
        &mut self,
        group: EventGroup,
        callback: Callback,
    ) -> Result<(), RuntimeError> {
        match group {
            EventGroup::Net => self.schedule.net = Some(callback),
        }
        Ok(())
    }
}
