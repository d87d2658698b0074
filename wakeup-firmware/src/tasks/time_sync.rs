// TimeSync Task - stellt die Uhr periodisch über das Netzwerk
use defmt::{info, warn};
use embassy_net::Stack;
use embassy_time::{Duration, Timer};
use wakeup_core::{RetryPolicy, resolve};

use crate::config::{TIME_SYNC_INTERVAL_SECS, TIME_SYNC_RETRY_SECS};
use crate::net::{SntpSource, WorldTimeSource, wait_for_network};
use crate::{AppClock, AppScheduler, StatusSignal};

/// TimeSync Task
///
/// Fragt zuerst die World-Time API (inklusive Zeitzonen-Offsets), bei
/// Ausfall SNTP. Die Netzwerk-Abfrage läuft ohne Scheduler-Lock, erst das
/// Ergebnis wird unter dem Lock übernommen.
#[embassy_executor::task]
pub async fn time_sync_task(
    stack: Stack<'static>,
    scheduler: &'static AppScheduler,
    clock: &'static AppClock,
    status: &'static StatusSignal,
) {
    info!("TIME: task started, waiting for network...");
    wait_for_network(stack).await;

    let mut primary = WorldTimeSource::new(stack);
    let mut fallback = SntpSource::new(stack);
    let policy = RetryPolicy::default();

    loop {
        match resolve(&mut primary, &mut fallback, &policy).await {
            Ok(outcome) => {
                scheduler.lock().await.apply_time_sync(clock, &outcome);
                status.signal(());
            }
            Err(error) => warn!("TIME: impossible to update time: {}", error),
        }

        // Ohne gültige Uhr schneller erneut versuchen
        let pause = if clock.is_synced() {
            TIME_SYNC_INTERVAL_SECS
        } else {
            TIME_SYNC_RETRY_SECS
        };
        Timer::after(Duration::from_secs(pause)).await;
    }
}
