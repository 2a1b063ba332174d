#![deny(warnings)]
//! MQTT v5.0 session over TLS 1.3
//!
//! The application publishes from RTIC tasks through [`QueuePublisher`],
//! which never blocks: it hands the message to [`OUTBOX`] and returns. The
//! network task owns the one [`MqttSession`], drains the outbox onto the
//! broker connection and reconnects when the connection drops.
//!
//! # Memory
//!
//! - TLS read/write buffers: 18 KB + 16 KB, handed in once from `main`
//! - TCP socket buffers: 4 KB + 4 KB per connection
//! - MQTT packet buffer: 2 KB bump buffer per connection

#![allow(unsafe_code)] // TopicName::new_unchecked

use core::sync::atomic::{AtomicBool, Ordering};

use defmt::{debug, error, info, warn, Debug2Format, Format};
use embassy_net::{dns::DnsQueryType, IpEndpoint, Stack};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embedded_tls::{
    Aes128GcmSha256, CryptoProvider, NoVerify, TlsConfig, TlsConnection, TlsContext, TlsVerifier,
};
use hal_abstractions::{Publisher, QoS};
use heapless::{String, Vec};
use iot_core::config::{validate_topic, MAX_TOPIC_LEN};
use iot_core::PAYLOAD_CAPACITY;
use rust_mqtt::{
    buffer::BumpBuffer,
    client::{
        options::{ConnectOptions, PublicationOptions, TopicReference},
        Client,
    },
    config::{KeepAlive, SessionExpiryInterval},
    types::{MqttString, TopicName},
    Bytes,
};

use super::config::MqttConfig;
use super::error::NetworkError;
use super::socket::AsyncTcpSocket;

/// MQTT packet buffer size: 2KB for packet assembly
const MQTT_BUFFER_SIZE: usize = 2048;

/// TLS read buffer: max TLS 1.3 record (16 KB) plus header, tag and slack
pub const TLS_READ_BUF_SIZE: usize = 18 * 1024;

/// TLS write buffer: we control outgoing record sizes
pub const TLS_WRITE_BUF_SIZE: usize = 16 * 1024;

/// Messages waiting for the session
const OUTBOX_DEPTH: usize = 4;

/// A message accepted by [`QueuePublisher`]
pub struct Outgoing {
    topic: String<MAX_TOPIC_LEN>,
    payload: Vec<u8, PAYLOAD_CAPACITY>,
    qos: QoS,
    retain: bool,
}

/// Handoff from application tasks to the network task
pub static OUTBOX: Channel<CriticalSectionRawMutex, Outgoing, OUTBOX_DEPTH> = Channel::new();

/// True while a broker connection is open
static SESSION_UP: AtomicBool = AtomicBool::new(false);

/// Why [`QueuePublisher`] refused a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub enum PublishError {
    /// No broker connection
    NotConnected,
    /// The network task has not drained earlier messages
    QueueFull,
    /// Topic is empty, too long or contains wildcards
    InvalidTopic,
    /// Payload does not fit a queue slot
    PayloadTooLarge,
}

/// [`Publisher`] for application tasks
///
/// Fails fast instead of waiting for the broker, so a handler never stalls
/// behind the network.
#[derive(Default)]
pub struct QueuePublisher;

impl Publisher for QueuePublisher {
    type Error = PublishError;

    fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        qos: QoS,
        retain: bool,
    ) -> Result<(), PublishError> {
        if !SESSION_UP.load(Ordering::Acquire) {
            return Err(PublishError::NotConnected);
        }
        let message = outgoing(topic, payload, qos, retain)?;
        OUTBOX
            .try_send(message)
            .map_err(|_| PublishError::QueueFull)
    }
}

fn outgoing(topic: &str, payload: &[u8], qos: QoS, retain: bool) -> Result<Outgoing, PublishError> {
    validate_topic(topic).map_err(|_| PublishError::InvalidTopic)?;
    let topic = String::try_from(topic).map_err(|_| PublishError::InvalidTopic)?;
    let payload = Vec::from_slice(payload).map_err(|_| PublishError::PayloadTooLarge)?;
    Ok(Outgoing {
        topic,
        payload,
        qos,
        retain,
    })
}

fn mqtt_qos(qos: QoS) -> rust_mqtt::types::QoS {
    match qos {
        QoS::AtMostOnce => rust_mqtt::types::QoS::AtMostOnce,
        QoS::AtLeastOnce => rust_mqtt::types::QoS::AtLeastOnce,
        QoS::ExactlyOnce => rust_mqtt::types::QoS::ExactlyOnce,
    }
}

/// Simple crypto provider that wraps an RNG for TLS operations
struct SimpleCryptoProvider<'a, RNG> {
    rng: &'a mut RNG,
    verifier: NoVerify,
}

impl<'a, RNG> SimpleCryptoProvider<'a, RNG> {
    fn new(rng: &'a mut RNG) -> Self {
        Self {
            rng,
            verifier: NoVerify,
        }
    }
}

impl<RNG> CryptoProvider for SimpleCryptoProvider<'_, RNG>
where
    RNG: rand_core::CryptoRngCore,
{
    type CipherSuite = Aes128GcmSha256;
    type Signature = &'static [u8];

    fn rng(&mut self) -> impl rand_core::CryptoRngCore {
        &mut *self.rng
    }

    fn verifier(
        &mut self,
    ) -> Result<&mut impl TlsVerifier<Self::CipherSuite>, embedded_tls::TlsError> {
        Ok(&mut self.verifier)
    }
}

/// The broker connection owned by the network task
pub struct MqttSession {
    config: MqttConfig,
    client_id: &'static str,
    tls_read: &'static mut [u8],
    tls_write: &'static mut [u8],
}

impl MqttSession {
    pub fn new(
        config: MqttConfig,
        client_id: &'static str,
        tls_read: &'static mut [u8],
        tls_write: &'static mut [u8],
    ) -> Self {
        Self {
            config,
            client_id,
            tls_read,
            tls_write,
        }
    }

    /// Connect, then forward [`OUTBOX`] to the broker until the connection
    /// fails
    ///
    /// Only returns with the error that ended the session. Messages still
    /// queued at that point are dropped.
    pub async fn run<RNG>(&mut self, stack: Stack<'static>, rng: &mut RNG) -> Result<(), NetworkError>
    where
        RNG: rand_core::RngCore + rand_core::CryptoRng,
    {
        info!(
            "Connecting to MQTT broker at {}:{}",
            self.config.broker_host, self.config.broker_port
        );
        let endpoint = self.resolve(stack).await?;

        let mut rx_buffer = [0u8; 4096];
        let mut tx_buffer = [0u8; 4096];
        let mut socket = AsyncTcpSocket::new(stack, &mut rx_buffer, &mut tx_buffer);
        socket.connect(endpoint).await?;
        info!("TCP connection established to {}", Debug2Format(&endpoint));

        let tls_config = TlsConfig::new().with_server_name(self.config.broker_host);
        let mut tls_connection = TlsConnection::<AsyncTcpSocket, Aes128GcmSha256>::new(
            socket,
            &mut *self.tls_read,
            &mut *self.tls_write,
        );
        let provider = SimpleCryptoProvider::new(rng);
        tls_connection
            .open(TlsContext::new(&tls_config, provider))
            .await
            .map_err(|e| {
                error!("TLS handshake failed: {:?}", Debug2Format(&e));
                NetworkError::TlsHandshakeFailed
            })?;
        debug!("TLS 1.3 handshake complete");

        let mut mqtt_buffer = [0u8; MQTT_BUFFER_SIZE];
        let mut buffer = BumpBuffer::new(&mut mqtt_buffer);
        let mut mqtt_client = Client::<'_, _, _, 1, 1, 1, 0>::new(&mut buffer);

        let connect_opts = ConnectOptions {
            session_expiry_interval: SessionExpiryInterval::EndOnDisconnect,
            clean_start: self.config.clean_start,
            keep_alive: if self.config.keep_alive_secs == 0 {
                KeepAlive::Infinite
            } else {
                KeepAlive::Seconds(self.config.keep_alive_secs)
            },
            will: None,
            user_name: None,
            password: None,
        };
        let client_id = MqttString::new(self.client_id.into()).map_err(|e| {
            error!("Invalid MQTT client ID: {:?}", Debug2Format(&e));
            NetworkError::MqttProtocolError
        })?;

        mqtt_client
            .connect(tls_connection, &connect_opts, Some(client_id))
            .await
            .map_err(|e| {
                error!("MQTT connect failed: {:?}", Debug2Format(&e));
                NetworkError::MqttConnectionFailed
            })?;

        info!("MQTT session up as {}", self.client_id);
        SESSION_UP.store(true, Ordering::Release);

        loop {
            let message = OUTBOX.receive().await;

            let topic = match MqttString::new(message.topic.as_str().into()) {
                // SAFETY: QueuePublisher only queues topics that passed
                // validate_topic: non-empty, no wildcards, no NUL.
                Ok(topic) => unsafe { TopicName::new_unchecked(topic) },
                Err(e) => {
                    warn!("Dropping message, bad topic: {:?}", Debug2Format(&e));
                    continue;
                }
            };

            // TODO: wait for PUBACK/PUBCOMP before taking the next message
            // once the client exposes acknowledgement events; today QoS 1/2
            // are sent with their flag but not tracked.
            let options = PublicationOptions {
                retain: message.retain,
                message_expiry_interval: None,
                topic: TopicReference::Name(topic),
                qos: mqtt_qos(message.qos),
            };

            match mqtt_client
                .publish(&options, Bytes::from(message.payload.as_slice()))
                .await
            {
                Ok(packet_id) => debug!(
                    "Sent {} bytes to {} (packet_id: {})",
                    message.payload.len(),
                    message.topic.as_str(),
                    packet_id
                ),
                Err(e) => {
                    error!("MQTT publish failed: {:?}", Debug2Format(&e));
                    session_down();
                    return Err(NetworkError::MqttPublishFailed);
                }
            }
        }
    }

    async fn resolve(&self, stack: Stack<'static>) -> Result<IpEndpoint, NetworkError> {
        let server_ip = stack
            .dns_query(self.config.broker_host, DnsQueryType::A)
            .await
            .map_err(|e| {
                error!("DNS query failed: {:?}", Debug2Format(&e));
                NetworkError::DnsError
            })?
            .first()
            .copied()
            .ok_or_else(|| {
                error!("DNS returned no results for {}", self.config.broker_host);
                NetworkError::DnsError
            })?;

        Ok(IpEndpoint::new(server_ip, self.config.broker_port))
    }
}

/// Mark the session closed and drop anything still queued
fn session_down() {
    SESSION_UP.store(false, Ordering::Release);
    let mut dropped = 0usize;
    while OUTBOX.try_receive().is_ok() {
        dropped += 1;
    }
    if dropped > 0 {
        warn!("Dropped {} queued MQTT messages", dropped);
    }
}
