//! Host runtime registration
//!
//! The runtime owns the event loop. Applications register what they want to
//! be woken for and hand the runtime a callback tag of their own choosing;
//! the runtime later delivers a [`HostEvent`] carrying that tag back to the
//! application, one at a time.

use crate::event::EventGroup;
use crate::gpio::ButtonConfig;
use crate::timer::{TimerId, TimerMode};

/// A trigger delivered by the runtime to the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HostEvent<C> {
    /// A registered timer fired
    Timer(C),
    /// A registered input edge was accepted after debouncing
    Edge {
        /// Callback tag given at registration
        callback: C,
        /// Pin the edge occurred on
        pin: u8,
    },
    /// An event was posted to a subscribed group
    Event {
        /// Callback tag given at registration
        callback: C,
        /// Group the event belongs to
        group: EventGroup,
        /// Group-specific event code
        code: i32,
    },
}

/// Registration side of the host runtime
///
/// Implementations must deliver events serially: no two `HostEvent`s are
/// ever handled at the same time.
pub trait Runtime<C: Copy> {
    /// Registration failure
    type Error: core::fmt::Debug;

    /// Configure `pin` as a digital output
    fn configure_output(&mut self, pin: u8) -> Result<(), Self::Error>;

    /// Fire `callback` every `period_ms` (or once, per `mode`)
    fn set_timer(
        &mut self,
        period_ms: u32,
        mode: TimerMode,
        callback: C,
    ) -> Result<TimerId, Self::Error>;

    /// Fire `callback` on debounced edges of a button input
    fn set_button_handler(&mut self, config: ButtonConfig, callback: C) -> Result<(), Self::Error>;

    /// Deliver every event of `group` to `callback`
    fn add_event_group_handler(&mut self, group: EventGroup, callback: C)
        -> Result<(), Self::Error>;
}
