//! Network connectivity observer
//!
//! The network stack owns the connectivity state machine; this side only
//! reports transitions as they are posted.

/// Connectivity transitions posted to the network event group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(i32)]
pub enum NetEvent {
    Disconnected = 0,
    Connecting = 1,
    Connected = 2,
    IpAcquired = 3,
}

impl NetEvent {
    /// Decode a raw event code; `None` for codes outside the group
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Disconnected),
            1 => Some(Self::Connecting),
            2 => Some(Self::Connected),
            3 => Some(Self::IpAcquired),
            _ => None,
        }
    }

    /// Raw event code
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// Log line for this transition
    pub const fn message(self) -> &'static str {
        match self {
            Self::Disconnected => "Net disconnected",
            Self::Connecting => "Net connecting...",
            Self::Connected => "Net connected",
            Self::IpAcquired => "Net got IP address",
        }
    }
}

/// Log a network event; unknown codes are dropped silently
pub fn observe(code: i32) -> Option<NetEvent> {
    let event = NetEvent::from_code(code)?;
    log_info!("{}", event.message());
    Some(event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::capture_logs;

    #[test]
    fn test_known_codes_log_once() {
        let expected = [
            (0, NetEvent::Disconnected, "Net disconnected"),
            (1, NetEvent::Connecting, "Net connecting..."),
            (2, NetEvent::Connected, "Net connected"),
            (3, NetEvent::IpAcquired, "Net got IP address"),
        ];

        for (code, event, line) in expected {
            let (observed, logs) = capture_logs(|| observe(code));
            assert_eq!(observed, Some(event));
            assert_eq!(event.code(), code);
            assert_eq!(logs.len(), 1);
            assert_eq!(logs[0].message, line);
        }
    }

    #[test]
    fn test_unknown_codes_are_silent() {
        for code in [-1, 4, 100, i32::MAX, i32::MIN] {
            let (observed, logs) = capture_logs(|| observe(code));
            assert_eq!(observed, None);
            assert!(logs.is_empty());
        }
    }
}
