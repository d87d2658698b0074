// Alarm Task - prüft periodisch die Weckzeit
use defmt::{debug, info};
use embassy_time::{Duration, Ticker};
use wakeup_core::AlarmAction;

use crate::config::ALARM_CHECK_INTERVAL_MS;
use crate::{AppClock, AppScheduler, StatusSignal};

/// Alarm Task
///
/// Tickt alle `ALARM_CHECK_INTERVAL_MS` und treibt die Zustandsmaschine des
/// Weckers. Solange die Uhr noch nie gestellt wurde, wird nicht geprüft
/// (eine Weckzeit relativ zu 1970 wäre sinnlos).
#[embassy_executor::task]
pub async fn alarm_task(
    scheduler: &'static AppScheduler,
    clock: &'static AppClock,
    status: &'static StatusSignal,
) {
    info!("ALARM: task started, checking every {} ms", ALARM_CHECK_INTERVAL_MS);
    let mut ticker = Ticker::every(Duration::from_millis(ALARM_CHECK_INTERVAL_MS));
    let mut waiting_logged = false;

    loop {
        ticker.next().await;

        let mut scheduler = scheduler.lock().await;
        let Some(now) = scheduler.local_time(clock) else {
            if !waiting_logged {
                debug!("ALARM: clock not synced yet, skipping checks");
                waiting_logged = true;
            }
            continue;
        };

        match scheduler.check_alarm(&now) {
            AlarmAction::Triggered | AlarmAction::Reset => status.signal(()),
            AlarmAction::None => {}
        }
    }
}
