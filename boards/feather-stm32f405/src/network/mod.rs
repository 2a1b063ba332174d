#![deny(unsafe_code)]
#![deny(warnings)]
//! Network side of the firmware
//!
//! - **`config`**: broker, SNTP and stack settings with `Default`s
//! - **`error`**: error enum for network operations
//! - **`mqtt`**: broker session and the publisher handed to the app
//! - **`sntp`**: SNTP client that sets the RTC
//! - **`socket`**: TCP socket with `embedded-io-async` traits for TLS
//!
//! Connectivity changes are reported to the application as [`NetEvent`]
//! codes through the channel given to [`watch_link`].

pub mod config;
pub mod error;
pub mod mqtt;
pub mod sntp;
pub mod socket;

pub use config::{MqttConfig, NetworkConfig, SntpConfig};
pub use mqtt::{MqttSession, QueuePublisher};
pub use sntp::SntpClient;

use defmt::{info, warn};
use embassy_futures::select::{select, Either};
use embassy_net::Stack;
use iot_core::NetEvent;
use rtic_sync::channel::Sender;

/// Pending network events between the network task and the app
pub const NET_EVENT_CAPACITY: usize = 4;

pub type NetEventSender = Sender<'static, i32, NET_EVENT_CAPACITY>;

fn post(events: &mut NetEventSender, event: NetEvent) {
    // No receiver means the app did not register for network events
    if let Err(rtic_sync::channel::TrySendError::Full(_)) = events.try_send(event.code()) {
        warn!("Network event queue full, dropped {:?}", event);
    }
}

/// Follow link and DHCP state forever, posting every transition
pub async fn watch_link(stack: Stack<'static>, mut events: NetEventSender) -> ! {
    loop {
        post(&mut events, NetEvent::Connecting);
        stack.wait_link_up().await;
        post(&mut events, NetEvent::Connected);

        if let Either::First(()) = select(stack.wait_config_up(), stack.wait_link_down()).await {
            log_address(&stack);
            post(&mut events, NetEvent::IpAcquired);
            stack.wait_link_down().await;
        }

        post(&mut events, NetEvent::Disconnected);
    }
}

/// Wait for DHCP to hand out an address
pub async fn wait_for_config(stack: &Stack<'_>) {
    stack.wait_config_up().await;
}

fn log_address(stack: &Stack<'_>) {
    if let Some(config) = stack.config_v4() {
        let ip = config.address.address().octets();
        info!("IP: {}.{}.{}.{}", ip[0], ip[1], ip[2], ip[3]);

        if let Some(gateway) = config.gateway {
            let gw = gateway.octets();
            info!("Gateway: {}.{}.{}.{}", gw[0], gw[1], gw[2], gw[3]);
        }
    }
}
