//! TimeSync - Netzwerk-Zeit mit Retry und Fallback
//!
//! Primäre Quelle ist eine World-Time HTTP API (liefert auch die
//! Zeitzonen-Offsets), Fallback ist SNTP (nur UTC). Jede Quelle wird höchstens
//! `RetryPolicy::attempts` Mal versucht, jeder Versuch ist zeitlich begrenzt.

use embassy_time::{Duration, Timer, with_timeout};

use crate::error::Error;
use crate::traits::TimeSource;
use crate::types::NetworkTime;

/// Größe eines SNTP-Pakets (ohne Extensions)
pub const SNTP_PACKET_SIZE: usize = 48;

/// Sekunden zwischen NTP-Epoche (1900) und Unix-Epoche (1970)
pub const NTP_UNIX_OFFSET: u64 = 2_208_988_800;

/// Begrenzte Wiederholung für eine Zeitquelle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u8,
    pub timeout: Duration,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            timeout: Duration::from_secs(10),
            backoff: Duration::from_secs(2),
        }
    }
}

/// Welche Quelle die Zeit geliefert hat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimeSourceKind {
    Primary,
    Fallback,
}

/// Ergebnis von `resolve`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimeSyncOutcome {
    pub time: NetworkTime,
    pub source: TimeSourceKind,
}

/// Fragt `source` mit begrenzten Wiederholungen ab
///
/// Ein Timeout zählt wie ein Netzwerkfehler.
pub async fn fetch_with_retry<T: TimeSource>(
    source: &mut T,
    policy: &RetryPolicy,
) -> Result<NetworkTime, Error> {
    let attempts = policy.attempts.max(1);

    for attempt in 1..=attempts {
        match with_timeout(policy.timeout, source.fetch_utc()).await {
            Ok(Ok(time)) => return Ok(time),
            Ok(Err(_error)) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("TIME: attempt {}/{} failed: {}", attempt, attempts, _error);
            }
            Err(_) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("TIME: attempt {}/{} timed out", attempt, attempts);
            }
        }
        if attempt < attempts {
            Timer::after(policy.backoff).await;
        }
    }

    Err(Error::Network)
}

/// Holt die Zeit von `primary`, bei Fehlschlag von `fallback`
///
/// # Fehlerbehandlung
/// `Error::Network` wenn beide Quellen ausgefallen sind.
pub async fn resolve<P: TimeSource, F: TimeSource>(
    primary: &mut P,
    fallback: &mut F,
    policy: &RetryPolicy,
) -> Result<TimeSyncOutcome, Error> {
    if let Ok(time) = fetch_with_retry(primary, policy).await {
        return Ok(TimeSyncOutcome {
            time,
            source: TimeSourceKind::Primary,
        });
    }

    #[cfg(feature = "defmt")]
    defmt::warn!("TIME: primary source failed, trying fallback");

    let time = fetch_with_retry(fallback, policy).await?;
    Ok(TimeSyncOutcome {
        time,
        source: TimeSourceKind::Fallback,
    })
}

/// Baut eine SNTP Client-Anfrage (LI = 0, Version 3, Mode 3)
pub fn sntp_request() -> [u8; SNTP_PACKET_SIZE] {
    let mut packet = [0u8; SNTP_PACKET_SIZE];
    packet[0] = 0x1B;
    packet
}

/// Liest den Transmit-Timestamp aus einer SNTP-Antwort
///
/// # Fehlerbehandlung
/// `Error::Network` bei zu kurzen Paketen, falschem Mode, Stratum 0
/// (Kiss-o'-Death) oder einem Zeitstempel vor 1970.
pub fn parse_sntp_response(packet: &[u8]) -> Result<NetworkTime, Error> {
    if packet.len() < SNTP_PACKET_SIZE {
        return Err(Error::Network);
    }
    // Mode 4 = Server
    if packet[0] & 0x07 != 4 {
        return Err(Error::Network);
    }
    if packet[1] == 0 {
        return Err(Error::Network);
    }

    let seconds = u32::from_be_bytes([packet[40], packet[41], packet[42], packet[43]]);
    let unix = u64::from(seconds)
        .checked_sub(NTP_UNIX_OFFSET)
        .ok_or(Error::Network)?;

    Ok(NetworkTime::utc(unix as i64))
}

/// Trennt eine HTTP/1.x Antwort in Header und Body und prüft den Status
///
/// Nur `200` wird akzeptiert, alles andere ist `Error::Network`.
pub fn http_response_body(response: &[u8]) -> Result<&[u8], Error> {
    let header_end = response
        .windows(4)
        .position(|window| window == b"\r\n\r\n")
        .ok_or(Error::Network)?;

    let status_line = response[..header_end]
        .split(|byte| *byte == b'\n')
        .next()
        .ok_or(Error::Network)?;
    let mut parts = status_line.split(|byte| *byte == b' ');
    let version = parts.next().ok_or(Error::Network)?;
    let status = parts.next().ok_or(Error::Network)?;
    let status = status.strip_suffix(b"\r").unwrap_or(status);
    if !version.starts_with(b"HTTP/1.") || status != b"200" {
        return Err(Error::Network);
    }

    Ok(&response[header_end + 4..])
}

/// Antwort der World-Time HTTP API (`/api/ip`)
#[cfg(feature = "serde")]
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
pub struct WorldTimeResponse {
    pub unixtime: i64,
    pub raw_offset: i32,
    pub dst_offset: i32,
}

#[cfg(feature = "serde")]
impl From<WorldTimeResponse> for NetworkTime {
    fn from(response: WorldTimeResponse) -> Self {
        Self {
            unix_time: response.unixtime,
            raw_offset: Some(response.raw_offset),
            dst_offset: Some(response.dst_offset),
        }
    }
}
