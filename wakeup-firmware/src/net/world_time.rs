// World-Time HTTP API als primäre Zeitquelle
//
// Schlichtes HTTP/1.0 GET, die Antwort wird komplett in einen Buffer
// gelesen und der JSON-Body mit serde-json-core dekodiert.

use core::fmt::Write as _;

use defmt::{debug, warn};
use embassy_net::{Stack, tcp::TcpSocket};
use embassy_time::Duration;
use heapless::String;
use wakeup_core::{Error, NetworkTime, TimeSource, WorldTimeResponse, http_response_body};

use crate::config::{TIME_API_BUFFER_SIZE, TIME_API_HOST, TIME_API_PATH};
use crate::net::{DnsError, resolve_hostname};

/// HTTP Port der World-Time API
const HTTP_PORT: u16 = 80;

/// World-Time API Client
pub struct WorldTimeSource {
    stack: Stack<'static>,
}

impl WorldTimeSource {
    pub fn new(stack: Stack<'static>) -> Self {
        Self { stack }
    }

    /// Liest die komplette Antwort bis der Server die Verbindung schließt
    async fn request(&self, response: &mut [u8]) -> Result<usize, TimeApiError> {
        let address = resolve_hostname(self.stack, TIME_API_HOST)
            .await
            .map_err(TimeApiError::Dns)?;

        let mut rx_buffer = [0u8; 1024];
        let mut tx_buffer = [0u8; 256];
        let mut socket = TcpSocket::new(self.stack, &mut rx_buffer, &mut tx_buffer);
        socket.set_timeout(Some(Duration::from_secs(10)));
        socket
            .connect((address, HTTP_PORT))
            .await
            .map_err(|_| TimeApiError::ConnectionFailed)?;

        let mut request: String<160> = String::new();
        write!(
            request,
            "GET {} HTTP/1.0\r\nHost: {}\r\nConnection: close\r\n\r\n",
            TIME_API_PATH, TIME_API_HOST
        )
        .map_err(|_| TimeApiError::RequestTooLong)?;

        let mut sent = 0;
        while sent < request.len() {
            sent += socket
                .write(&request.as_bytes()[sent..])
                .await
                .map_err(|_| TimeApiError::Io)?;
        }

        let mut len = 0;
        while len < response.len() {
            match socket.read(&mut response[len..]).await {
                Ok(0) => break,
                Ok(n) => len += n,
                Err(_) => return Err(TimeApiError::Io),
            }
        }
        socket.close();

        debug!("TIME: world time API answered with {} bytes", len);
        Ok(len)
    }

    async fn fetch(&self) -> Result<NetworkTime, TimeApiError> {
        let mut response = [0u8; TIME_API_BUFFER_SIZE];
        let len = self.request(&mut response).await?;
        let body = http_response_body(&response[..len]).map_err(|_| TimeApiError::BadStatus)?;

        serde_json_core::from_slice::<WorldTimeResponse>(body)
            .map(|(time, _)| NetworkTime::from(time))
            .map_err(|_| TimeApiError::InvalidJson)
    }
}

impl TimeSource for WorldTimeSource {
    async fn fetch_utc(&mut self) -> Result<NetworkTime, Error> {
        self.fetch().await.map_err(|error| {
            warn!("TIME: world time API failed: {}", error);
            Error::Network
        })
    }
}

/// Fehler der World-Time API Abfrage
#[derive(Debug)]
enum TimeApiError {
    Dns(DnsError),
    ConnectionFailed,
    RequestTooLong,
    Io,
    BadStatus,
    InvalidJson,
}

impl defmt::Format for TimeApiError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            TimeApiError::Dns(error) => defmt::write!(fmt, "{}", error),
            TimeApiError::ConnectionFailed => defmt::write!(fmt, "Connection failed"),
            TimeApiError::RequestTooLong => defmt::write!(fmt, "Request too long"),
            TimeApiError::Io => defmt::write!(fmt, "Socket I/O error"),
            TimeApiError::BadStatus => defmt::write!(fmt, "HTTP status not 200"),
            TimeApiError::InvalidJson => defmt::write!(fmt, "Invalid JSON"),
        }
    }
}
