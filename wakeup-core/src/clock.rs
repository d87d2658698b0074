//! WallClock - Systemuhr auf Basis von `embassy_time::Instant`
//!
//! Merkt sich die zuletzt synchronisierte UTC-Zeit zusammen mit dem
//! monotonen Zeitpunkt der Synchronisation. Die Lokalzeit rechnet der
//! `AlarmScheduler` aus seinen Offsets dazu.

use core::cell::Cell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::Instant;

#[derive(Debug, Clone, Copy)]
struct ClockAnchor {
    unix_secs: i64,
    at: Instant,
}

/// Wanduhr, bis zur ersten Synchronisation "unsynced"
pub struct WallClock<M: RawMutex> {
    anchor: Mutex<M, Cell<Option<ClockAnchor>>>,
}

impl<M: RawMutex> Default for WallClock<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex> WallClock<M> {
    pub const fn new() -> Self {
        Self {
            anchor: Mutex::new(Cell::new(None)),
        }
    }

    /// Setzt die aktuelle UTC-Zeit (Unix-Sekunden)
    pub fn set_utc(&self, unix_secs: i64) {
        let anchor = ClockAnchor {
            unix_secs,
            at: Instant::now(),
        };
        self.anchor.lock(|cell| cell.set(Some(anchor)));
    }

    /// Aktuelle UTC-Zeit oder `None` wenn noch nie synchronisiert
    pub fn now_utc(&self) -> Option<i64> {
        let anchor = self.anchor.lock(Cell::get)?;
        let elapsed = Instant::now().saturating_duration_since(anchor.at);
        Some(anchor.unix_secs + elapsed.as_secs() as i64)
    }

    pub fn is_synced(&self) -> bool {
        self.anchor.lock(Cell::get).is_some()
    }
}
