//! MQTT publishing service

/// MQTT delivery guarantee
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum QoS {
    AtMostOnce = 0,
    AtLeastOnce = 1,
    ExactlyOnce = 2,
}

impl QoS {
    /// Numeric QoS level as carried on the wire
    pub const fn level(self) -> u8 {
        self as u8
    }
}

/// Messaging client owned by the host runtime
///
/// `publish` hands the message over and reports whether the client accepted
/// it. Callers treat an error as final for that message: there is no retry
/// contract at this layer.
pub trait Publisher {
    /// Reason a message was not accepted
    type Error: core::fmt::Debug;

    /// Publish `payload` to `topic`
    fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        qos: QoS,
        retain: bool,
    ) -> Result<(), Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qos_levels() {
        assert_eq!(QoS::AtMostOnce.level(), 0);
        assert_eq!(QoS::AtLeastOnce.level(), 1);
        assert_eq!(QoS::ExactlyOnce.level(), 2);
    }
}
