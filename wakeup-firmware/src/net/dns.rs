// DNS- und Netzwerk-Helfer für MQTT und TimeSync
use embassy_net::{IpAddress, Ipv4Address, Stack, dns::DnsQueryType};
use embassy_time::{Duration, Timer, with_timeout};

use crate::config::DNS_TIMEOUT_SECS;

/// DNS Fehler-Typen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DnsError {
    ResolutionFailed,
    Timeout,
}

impl defmt::Format for DnsError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            DnsError::ResolutionFailed => defmt::write!(fmt, "DNS failed"),
            DnsError::Timeout => defmt::write!(fmt, "DNS timeout"),
        }
    }
}

/// Wartet bis Link und DHCP-Konfiguration stehen
pub async fn wait_for_network(stack: Stack<'static>) {
    loop {
        if stack.is_link_up() && stack.config_v4().is_some() {
            break;
        }
        Timer::after(Duration::from_millis(500)).await;
    }
}

/// Löst Hostname zu IPv4-Adresse auf
///
/// Nutzt embassy-net DNS-Stack mit konfigurierbarem Timeout.
pub async fn resolve_hostname(
    stack: Stack<'static>,
    hostname: &str,
) -> Result<Ipv4Address, DnsError> {
    let result = with_timeout(
        Duration::from_secs(DNS_TIMEOUT_SECS),
        stack.dns_query(hostname, DnsQueryType::A),
    )
    .await;

    match result {
        Ok(Ok(addrs)) => addrs
            .iter()
            .find_map(|addr| match addr {
                IpAddress::Ipv4(ipv4) => Some(*ipv4),
                #[allow(unreachable_patterns)]
                _ => None,
            })
            .ok_or(DnsError::ResolutionFailed),
        Ok(Err(_)) => Err(DnsError::ResolutionFailed),
        Err(_) => Err(DnsError::Timeout),
    }
}
