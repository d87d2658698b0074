// Netzwerk-Clients: DNS, World-Time API (primär) und SNTP (Fallback)

pub mod dns;
pub mod sntp;
pub mod world_time;

pub use dns::{DnsError, resolve_hostname, wait_for_network};
pub use sntp::SntpSource;
pub use world_time::WorldTimeSource;
