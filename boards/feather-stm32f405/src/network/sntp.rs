#![deny(unsafe_code)]
#![deny(warnings)]
//! SNTP client that sets the RTC from network time

use defmt::{error, info, warn, Debug2Format};
use embassy_futures::select::{select, Either};
use embassy_net::dns::DnsQueryType;
use embassy_net::udp::{PacketMetadata, UdpSocket};
use embassy_net::{IpEndpoint, Stack};
use embassy_time::{Duration, Instant, Timer};
use hal_abstractions::Timestamp;

use crate::system;

use super::config::SntpConfig;
use super::error::NetworkError;

/// Seconds between the NTP era (1900) and the Unix epoch
const NTP_UNIX_OFFSET: u64 = 2_208_988_800;

/// NTP packet: LI=0, VN=3, Mode=3 (client)
const NTP_CLIENT_REQUEST: u8 = 0x1B;

/// SNTP client for time synchronization
pub struct SntpClient {
    config: SntpConfig,
}

impl SntpClient {
    pub fn new(config: SntpConfig) -> Self {
        Self { config }
    }

    /// Time between periodic resyncs
    pub fn resync_interval(&self) -> Duration {
        self.config.resync_interval
    }

    /// Query the configured servers in order and write the first good
    /// answer to the RTC
    pub async fn sync(&self, stack: Stack<'static>) -> Result<Timestamp, NetworkError> {
        for server in self.config.servers {
            for attempt in 0..self.config.retry_count {
                info!(
                    "Attempting SNTP sync with {} (attempt {})",
                    server,
                    attempt + 1
                );
                match self.request(stack, server).await {
                    Ok(timestamp) => {
                        system::set_clock(timestamp)?;
                        info!(
                            "SNTP sync successful: {}.{:06} UTC",
                            timestamp.unix_secs, timestamp.micros
                        );
                        return Ok(timestamp);
                    }
                    Err(e) => {
                        warn!("SNTP sync failed: {:?}, retrying...", e);
                        Timer::after_secs(2).await;
                    }
                }
            }
        }
        error!("All SNTP sync attempts failed");
        Err(NetworkError::AllServersFailed)
    }

    async fn request(&self, stack: Stack<'static>, server: &str) -> Result<Timestamp, NetworkError> {
        let server_ip = stack
            .dns_query(server, DnsQueryType::A)
            .await
            .map_err(|_| NetworkError::DnsError)?
            .first()
            .copied()
            .ok_or(NetworkError::DnsError)?;
        let server_endpoint = IpEndpoint::new(server_ip, 123);

        let mut rx_meta = [PacketMetadata::EMPTY; 2];
        let mut rx_buffer = [0u8; 64];
        let mut tx_meta = [PacketMetadata::EMPTY; 2];
        let mut tx_buffer = [0u8; 64];
        let mut socket = UdpSocket::new(
            stack,
            &mut rx_meta,
            &mut rx_buffer,
            &mut tx_meta,
            &mut tx_buffer,
        );
        socket.bind(0).map_err(|_| NetworkError::SocketError)?;

        let mut request = [0u8; 48];
        request[0] = NTP_CLIENT_REQUEST;
        let transmit_time = Instant::now();
        socket
            .send_to(&request, server_endpoint)
            .await
            .map_err(|_| NetworkError::SocketError)?;

        let mut response = [0u8; 48];
        let timeout = Timer::after(Duration::from_millis(self.config.timeout_ms));
        let (len, from) = match select(timeout, socket.recv_from(&mut response)).await {
            Either::First(_) => return Err(NetworkError::Timeout),
            Either::Second(result) => result.map_err(|_| NetworkError::SocketError)?,
        };
        let rtt = Instant::now().duration_since(transmit_time);

        if len < 48 || from.endpoint.addr != server_ip {
            warn!("Unexpected NTP reply from {}", Debug2Format(&from));
            return Err(NetworkError::InvalidResponse);
        }

        let stratum = response[1];
        if stratum == 0 || stratum > self.config.max_stratum {
            warn!(
                "Invalid stratum {} (max {})",
                stratum, self.config.max_stratum
            );
            return Err(NetworkError::ServerError);
        }

        Ok(parse_transmit_time(&response, rtt.as_micros() / 2))
    }
}

/// Server transmit timestamp from an NTP reply, advanced by half the RTT
fn parse_transmit_time(response: &[u8; 48], correction_micros: u64) -> Timestamp {
    let secs = u32::from_be_bytes([response[40], response[41], response[42], response[43]]) as u64;
    let frac = u32::from_be_bytes([response[44], response[45], response[46], response[47]]);

    // Fraction is in units of 2^-32 s
    let micros = ((frac as u64 * 1_000_000) >> 32) + correction_micros;
    Timestamp::new(
        secs.saturating_sub(NTP_UNIX_OFFSET) + micros / 1_000_000,
        (micros % 1_000_000) as u32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(secs: u32, frac: u32) -> [u8; 48] {
        let mut packet = [0u8; 48];
        packet[40..44].copy_from_slice(&secs.to_be_bytes());
        packet[44..48].copy_from_slice(&frac.to_be_bytes());
        packet
    }

    #[test]
    fn test_parse_transmit_time() {
        // 2024-01-01T00:00:00.5Z
        let packet = reply(3_913_056_000, 0x8000_0000);
        let ts = parse_transmit_time(&packet, 0);
        assert_eq!(ts.unix_secs, 1_704_067_200);
        assert_eq!(ts.micros, 500_000);
    }

    #[test]
    fn test_rtt_correction_carries_into_seconds() {
        let packet = reply(3_913_056_000, 0x8000_0000);
        let ts = parse_transmit_time(&packet, 700_000);
        assert_eq!(ts.unix_secs, 1_704_067_201);
        assert_eq!(ts.micros, 200_000);
    }
}
