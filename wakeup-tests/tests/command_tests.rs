//! Integration Tests für Command-Parsing und WakeUpLight-Dispatch

mod common;

use common::{MockPixelSink, MockStorage, TestMutex};
use embassy_futures::block_on;
use embassy_futures::select::select;
use embassy_sync::mutex::Mutex;
use embassy_time::Timer;
use wakeup_core::{
    AlarmConfig, AlarmScheduler, Color, Command, Error, HeartbeatAnimator, HeartbeatConfig,
    LightDriver, WakeUpLight, WallClock,
};

/// Baut Light, Heartbeat, Scheduler und Uhr als lokale Variablen auf
/// und bindet den Dispatch-Kontext an `$app`.
macro_rules! setup {
    ($light:ident, $sink:ident, $storage:ident, $app:ident) => {
        let $sink = MockPixelSink::new(4);
        let $storage = MockStorage::new();
        let $light: LightDriver<TestMutex, MockPixelSink> = LightDriver::new($sink.clone(), true);
        let heartbeat = HeartbeatAnimator::new(&$light, HeartbeatConfig::default());
        let scheduler = Mutex::new(AlarmScheduler::new(
            $light.sequences(),
            $storage.clone(),
            AlarmConfig::default(),
        ));
        let clock: WallClock<TestMutex> = WallClock::new();
        let $app = WakeUpLight {
            light: &$light,
            heartbeat: &heartbeat,
            scheduler: &scheduler,
            clock: &clock,
        };
    };
}

// ============================================================================
// Tests: Command::parse
// ============================================================================

#[test]
fn test_parse_light_topics() {
    assert_eq!(Command::parse("wakeuplight/toggle_light", ""), Ok(Command::Toggle));
    assert_eq!(
        Command::parse("wakeuplight/on", ""),
        Ok(Command::TurnOn { full: true })
    );
    assert_eq!(
        Command::parse("wakeuplight/on", "0"),
        Ok(Command::TurnOn { full: false })
    );
    assert_eq!(Command::parse("wakeuplight/off", ""), Ok(Command::TurnOff));
    assert_eq!(
        Command::parse("wakeuplight/set_brightness", "0.25"),
        Ok(Command::SetBrightness(0.25))
    );
    assert_eq!(
        Command::parse("wakeuplight/set_rgbw", "rgb(255,64,0)"),
        Ok(Command::SetColor(Color::AMBER))
    );
}

#[test]
fn test_parse_alarm_topics() {
    assert_eq!(
        Command::parse("wakeuplight/set_alarm_hour", "7"),
        Ok(Command::SetAlarmHour(7))
    );
    assert_eq!(
        Command::parse("wakeuplight/set_alarm_minute", "30"),
        Ok(Command::SetAlarmMinute(30))
    );
    assert_eq!(
        Command::parse("wakeuplight/set_alarm_delay", "900"),
        Ok(Command::SetAlarmDuration(900))
    );
    assert_eq!(
        Command::parse("wakeuplight/toggle_alarm", ""),
        Ok(Command::ToggleAlarm)
    );
    assert_eq!(
        Command::parse("wakeuplight/toggle_alarm", "0"),
        Ok(Command::SetAlarmEnabled(false))
    );
    assert_eq!(
        Command::parse("wakeuplight/set_utc_offset", "-5"),
        Ok(Command::SetUtcOffset(-5))
    );
    assert_eq!(
        Command::parse("wakeuplight/set_dst_offset", "1"),
        Ok(Command::SetDstOffset(1))
    );
    assert_eq!(
        Command::parse("wakeuplight/publish_updates", ""),
        Ok(Command::RequestStatus)
    );
    assert_eq!(
        Command::parse("wakeuplight/toggle_heartbeat", ""),
        Ok(Command::ToggleHeartbeat)
    );
}

#[test]
fn test_parse_rejects_malformed_payloads() {
    assert_eq!(
        Command::parse("wakeuplight/set_brightness", "hell"),
        Err(Error::InvalidArgument)
    );
    assert_eq!(
        Command::parse("wakeuplight/set_alarm_hour", "-1"),
        Err(Error::InvalidArgument)
    );
    assert_eq!(
        Command::parse("wakeuplight/toggle_alarm", "maybe"),
        Err(Error::InvalidArgument)
    );
    assert_eq!(
        Command::parse("wakeuplight/dht", ""),
        Err(Error::InvalidArgument)
    );
}

#[test]
fn test_every_subscribed_topic_is_understood() {
    let payloads = [
        "", "1", "", "0.5", "#ff4000", "06:15", "6", "15", "1200", "", "1", "0", "", "", "", "",
    ];

    for (name, payload) in Command::TOPICS.iter().zip(payloads) {
        let topic = format!("wakeuplight/{name}");
        assert!(
            Command::parse(&topic, payload).is_ok(),
            "topic {topic} with payload {payload:?} was rejected"
        );
    }
}

#[test]
fn test_manual_override_classification() {
    assert!(Command::Toggle.is_manual_override());
    assert!(Command::SetColor(Color::OFF).is_manual_override());
    assert!(!Command::Sunrise(None).is_manual_override());
    assert!(!Command::RequestStatus.is_manual_override());
}

// ============================================================================
// Tests: WakeUpLight::handle
// ============================================================================

#[test]
fn test_handle_light_commands() {
    setup!(light, sink, _storage, app);

    assert_eq!(block_on(app.handle(Command::Toggle)), Ok(true));
    assert_eq!(block_on(light.current_color()), Color::FULL_WHITE);

    block_on(app.handle(Command::SetColor(Color::new(10, 20, 30, 40)))).unwrap();
    assert_eq!(sink.last_main_color(), Some(Color::new(10, 20, 30, 40)));

    block_on(app.handle(Command::SetBrightness(0.5))).unwrap();
    assert_eq!(block_on(light.current_color()), Color::new(5, 10, 15, 20));

    block_on(app.handle(Command::TurnOff)).unwrap();
    assert!(!block_on(light.is_on()));
}

#[test]
fn test_handle_set_alarm_keeps_unspecified_fields() {
    setup!(_light, _sink, storage, app);

    block_on(app.handle(Command::SetAlarm {
        hour: 7,
        minute: 45,
        duration_seconds: None,
        enabled: None,
    }))
    .unwrap();

    let config = block_on(app.scheduler.lock()).config();
    assert_eq!((config.alarm_hour, config.alarm_minute), (7, 45));
    assert_eq!(config.alarm_duration_seconds, 1200);
    assert!(config.alarm_enabled);
    assert_eq!(storage.write_count(), 1);
}

#[test]
fn test_handle_single_alarm_fields() {
    setup!(_light, _sink, _storage, app);

    block_on(app.handle(Command::SetAlarmHour(5))).unwrap();
    block_on(app.handle(Command::SetAlarmMinute(30))).unwrap();
    block_on(app.handle(Command::SetAlarmDuration(600))).unwrap();
    assert_eq!(
        block_on(app.handle(Command::SetAlarmHour(25))),
        Err(Error::InvalidArgument)
    );

    let config = block_on(app.scheduler.lock()).config();
    assert_eq!(config.alarm_hour, 5);
    assert_eq!(config.alarm_minute, 30);
    assert_eq!(config.alarm_duration_seconds, 600);
}

#[test]
fn test_handle_offsets_in_hours() {
    setup!(_light, _sink, _storage, app);

    block_on(app.handle(Command::SetUtcOffset(2))).unwrap();
    block_on(app.handle(Command::SetDstOffset(1))).unwrap();
    assert_eq!(
        block_on(app.handle(Command::SetUtcOffset(20))),
        Err(Error::InvalidArgument)
    );

    let config = block_on(app.scheduler.lock()).config();
    assert_eq!(config.utc_offset_seconds, 7200);
    assert_eq!(config.dst_offset_seconds, 3600);
}

#[test]
fn test_handle_toggles() {
    setup!(_light, _sink, _storage, app);

    block_on(app.handle(Command::ToggleAlarm)).unwrap();
    assert!(!block_on(app.scheduler.lock()).config().alarm_enabled);
    block_on(app.handle(Command::SetAlarmEnabled(true))).unwrap();
    assert!(block_on(app.scheduler.lock()).config().alarm_enabled);

    assert!(!app.heartbeat.is_enabled());
    block_on(app.handle(Command::ToggleHeartbeat)).unwrap();
    assert!(app.heartbeat.is_enabled());
}

#[test]
fn test_handle_sequence_start_and_stop() {
    setup!(light, _sink, _storage, app);

    block_on(app.handle(Command::Sunrise(Some(60)))).unwrap();
    assert!(light.sequence_active());

    block_on(app.handle(Command::StopSequence)).unwrap();
    assert!(!light.sequence_active());

    assert_eq!(
        block_on(app.handle(Command::Sunset(Some(0)))),
        Err(Error::InvalidArgument)
    );
}

#[test]
fn test_manual_command_cancels_running_sequence() {
    setup!(light, sink, _storage, app);

    block_on(select(light.run_sequences(), async {
        app.handle(Command::Sunrise(Some(1))).await.unwrap();
        Timer::after_millis(100).await;
        assert!(light.sequence_active());

        app.handle(Command::TurnOff).await.unwrap();
        Timer::after_millis(50).await;
        assert!(!light.sequence_active());
    }));

    let flushes = sink.flush_count();
    assert_eq!(block_on(light.current_color()), Color::OFF);
    block_on(Timer::after_millis(100));
    assert_eq!(sink.flush_count(), flushes);
}

// ============================================================================
// Tests: Status
// ============================================================================

#[test]
fn test_status_snapshot() {
    setup!(_light, _sink, _storage, app);

    block_on(app.handle(Command::SetColor(Color::AMBER))).unwrap();
    block_on(app.handle(Command::SetAlarm {
        hour: 6,
        minute: 5,
        duration_seconds: Some(1200),
        enabled: Some(true),
    }))
    .unwrap();

    let status = block_on(app.status());
    assert!(status.light_on);
    assert_eq!(status.current_color, Color::AMBER);
    assert!(status.alarm_on);
    assert_eq!((status.alarm_hour, status.alarm_minute), (6, 5));
    assert_eq!(status.alarm_delay, 1200);
    assert!(!status.alarm_running);
    assert_eq!(status.current_time, None);

    app.clock.set_utc(1_711_865_100);
    let status = block_on(app.status());
    let time = status.current_time.unwrap();
    assert_eq!((time.hour, time.minute), (7, 5));
}

#[test]
fn test_status_serializes_to_json() {
    setup!(_light, _sink, _storage, app);

    let status = block_on(app.status());
    let mut buffer = [0u8; 512];
    let len = serde_json_core::to_slice(&status, &mut buffer).unwrap();
    let json = core::str::from_utf8(&buffer[..len]).unwrap();

    assert!(json.contains("\"alarm_hour\":6"));
    assert!(json.contains("\"alarm_minute\":15"));
    assert!(json.contains("\"light_on\":false"));
    assert!(json.contains("\"current_time\":null"));
}
