// SNTP als Fallback-Zeitquelle (nur UTC, keine Offsets)
use embassy_net::{
    Stack,
    udp::{PacketMetadata, UdpSocket},
};
use wakeup_core::timesync::SNTP_PACKET_SIZE;
use wakeup_core::{Error, NetworkTime, TimeSource, parse_sntp_response, sntp_request};

use crate::config::{NTP_PORT, NTP_SERVER};
use crate::net::resolve_hostname;

/// SNTP Client
pub struct SntpSource {
    stack: Stack<'static>,
}

impl SntpSource {
    pub fn new(stack: Stack<'static>) -> Self {
        Self { stack }
    }
}

impl TimeSource for SntpSource {
    async fn fetch_utc(&mut self) -> Result<NetworkTime, Error> {
        let server = resolve_hostname(self.stack, NTP_SERVER)
            .await
            .map_err(|_| Error::Network)?;

        let mut rx_meta = [PacketMetadata::EMPTY; 2];
        let mut tx_meta = [PacketMetadata::EMPTY; 2];
        let mut rx_buffer = [0u8; 128];
        let mut tx_buffer = [0u8; 128];
        let mut socket = UdpSocket::new(
            self.stack,
            &mut rx_meta,
            &mut rx_buffer,
            &mut tx_meta,
            &mut tx_buffer,
        );
        socket.bind(0).map_err(|_| Error::Network)?;

        socket
            .send_to(&sntp_request(), (server, NTP_PORT))
            .await
            .map_err(|_| Error::Network)?;

        let mut packet = [0u8; SNTP_PACKET_SIZE];
        let (len, _) = socket
            .recv_from(&mut packet)
            .await
            .map_err(|_| Error::Network)?;

        parse_sntp_response(&packet[..len])
    }
}
