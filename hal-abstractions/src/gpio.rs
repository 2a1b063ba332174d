//! GPIO input configuration
//!
//! Outputs are plain `embedded_hal::digital::StatefulOutputPin`s; only the
//! edge-triggered button handler needs a description the runtime can act on.

/// Input pull resistor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pull {
    None,
    Up,
    Down,
}

/// Edge that triggers an input handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edge {
    Rising,
    Falling,
    Any,
}

/// Button handler registration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonConfig {
    /// Input pin number
    pub pin: u8,
    /// Pull resistor applied to the input
    pub pull: Pull,
    /// Edge that fires the handler
    pub edge: Edge,
    /// Edges closer together than this are dropped by the runtime
    pub debounce_ms: u32,
}
