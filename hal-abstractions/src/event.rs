//! Host event groups

/// Event groups an application can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EventGroup {
    /// Network connectivity transitions
    Net,
}
