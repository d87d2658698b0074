//! Integration Tests für LightDriver und HeartbeatAnimator
//!
//! Diese Tests laufen auf dem Host (x86_64) und nutzen MockPixelSink.
//! Async-Code läuft über `block_on` mit dem std Time-Driver.

mod common;

use common::{MockPixelSink, TestLight};
use embassy_futures::block_on;
use embassy_futures::join::join;
use embassy_futures::select::select;
use embassy_time::{Duration, Timer};
use wakeup_core::{
    Color, Error, HeartbeatAnimator, HeartbeatConfig, LedError, LightDriver, SequenceKind,
    interpolate,
};

fn new_light(pixel_count: usize, status_pixel: bool) -> (TestLight, MockPixelSink) {
    let sink = MockPixelSink::new(pixel_count);
    (LightDriver::new(sink.clone(), status_pixel), sink)
}

// ============================================================================
// Tests: Manuelle Operationen
// ============================================================================

#[test]
fn test_set_all_writes_every_pixel_in_one_batch() {
    let (light, sink) = new_light(5, false);
    let color = Color::new(1, 2, 3, 4);

    block_on(light.set_all(color)).unwrap();

    assert_eq!(sink.pixels(), vec![color; 5]);
    assert_eq!(sink.flush_count(), 1);
    assert_eq!(block_on(light.current_color()), color);
    assert!(block_on(light.is_on()));
}

#[test]
fn test_set_all_skips_status_pixel() {
    let (light, sink) = new_light(4, true);

    block_on(light.set_all(Color::AMBER)).unwrap();

    let pixels = sink.pixels();
    assert_eq!(pixels[0], Color::OFF);
    assert!(pixels[1..].iter().all(|pixel| *pixel == Color::AMBER));
}

#[test]
fn test_turn_on_full_and_white() {
    let (light, sink) = new_light(3, false);

    block_on(light.turn_on(true)).unwrap();
    assert_eq!(sink.last_main_color(), Some(Color::FULL_WHITE));

    block_on(light.turn_on(false)).unwrap();
    assert_eq!(sink.last_main_color(), Some(Color::WHITE));

    block_on(light.turn_off()).unwrap();
    assert_eq!(sink.last_main_color(), Some(Color::OFF));
    assert!(!block_on(light.is_on()));
}

#[test]
fn test_toggle_flips_based_on_current_color() {
    let (light, _sink) = new_light(3, false);

    block_on(light.toggle()).unwrap();
    assert_eq!(block_on(light.current_color()), Color::FULL_WHITE);

    block_on(light.toggle()).unwrap();
    assert_eq!(block_on(light.current_color()), Color::OFF);

    // Jede Farbe außer OFF gilt als "an"
    block_on(light.set_color(Color::new(0, 0, 1, 0))).unwrap();
    block_on(light.toggle()).unwrap();
    assert_eq!(block_on(light.current_color()), Color::OFF);
}

#[test]
fn test_set_brightness_scales_current_color() {
    let (light, sink) = new_light(3, false);
    block_on(light.set_color(Color::new(200, 100, 50, 10))).unwrap();

    block_on(light.set_brightness(0.5)).unwrap();

    assert_eq!(block_on(light.current_color()), Color::new(100, 50, 25, 5));
    assert_eq!(sink.last_main_color(), Some(Color::new(100, 50, 25, 5)));
    assert_eq!(block_on(light.brightness()), 0.5);
}

#[test]
fn test_set_brightness_rejects_out_of_range_without_change() {
    let (light, sink) = new_light(3, false);
    block_on(light.set_color(Color::AMBER)).unwrap();
    let flushes = sink.flush_count();

    for scale in [1.5, -0.1, f32::NAN] {
        assert_eq!(
            block_on(light.set_brightness(scale)),
            Err(Error::InvalidArgument)
        );
    }

    assert_eq!(block_on(light.current_color()), Color::AMBER);
    assert_eq!(sink.flush_count(), flushes);
}

#[test]
fn test_write_status_requires_reserved_pixel() {
    let (light, _sink) = new_light(3, false);
    assert_eq!(
        block_on(light.write_status(Color::WHITE)),
        Err(Error::InvalidArgument)
    );
}

// ============================================================================
// Tests: Fades
// ============================================================================

#[test]
fn test_fade_writes_steps_plus_one_frames() {
    let (light, sink) = new_light(4, false);
    let target = Color::new(100, 50, 0, 200);

    block_on(light.fade(target, 40, 4, Some(Color::OFF))).unwrap();

    let frames = sink.frames();
    assert_eq!(frames.len(), 5);
    assert_eq!(frames[0], vec![Color::OFF; 4]);
    assert_eq!(frames[2], vec![Color::new(50, 25, 0, 100); 4]);
    assert_eq!(frames[4], vec![target; 4]);
    assert_eq!(block_on(light.current_color()), target);
}

#[test]
fn test_fade_starts_from_current_color_by_default() {
    let (light, sink) = new_light(2, false);
    block_on(light.set_color(Color::AMBER)).unwrap();

    block_on(light.fade(Color::OFF, 10, 2, None)).unwrap();

    let frames = sink.frames();
    // set_color + 3 Fade-Frames
    assert_eq!(frames.len(), 4);
    assert_eq!(frames[1], vec![Color::AMBER; 2]);
    assert_eq!(frames[3], vec![Color::OFF; 2]);
}

#[test]
fn test_fade_with_zero_steps_is_rejected() {
    let (light, sink) = new_light(2, false);

    assert_eq!(
        block_on(light.fade(Color::WHITE, 100, 0, None)),
        Err(Error::InvalidArgument)
    );
    assert_eq!(sink.flush_attempts(), 0);
}

#[test]
fn test_fade_takes_roughly_its_duration() {
    let (light, _sink) = new_light(2, false);

    let started = std::time::Instant::now();
    block_on(light.fade(Color::WHITE, 100, 5, Some(Color::OFF))).unwrap();
    let elapsed = started.elapsed();

    assert!(elapsed >= std::time::Duration::from_millis(95), "{elapsed:?}");
    assert!(elapsed < std::time::Duration::from_secs(2), "{elapsed:?}");
}

#[test]
fn test_hardware_failure_aborts_fade_and_keeps_partial_state() {
    let (light, sink) = new_light(3, false);
    let target = Color::new(200, 100, 0, 0);
    sink.fail_flush_from(3);

    let result = block_on(light.fade(target, 50, 10, Some(Color::OFF)));

    assert_eq!(result, Err(Error::Hardware(LedError::WriteFailed)));
    assert_eq!(sink.flush_attempts(), 4);
    let partial = interpolate(Color::OFF, target, 2, 10).unwrap();
    assert_eq!(block_on(light.current_color()), partial);
}

// ============================================================================
// Tests: Sequenzen & Abbruch
// ============================================================================

#[test]
fn test_sunrise_sequence_ends_full_white() {
    let (light, sink) = new_light(3, false);

    block_on(light.sunrise_sequence(110)).unwrap();

    let frames = sink.frames();
    assert_eq!(frames.first(), Some(&vec![Color::OFF; 3]));
    assert_eq!(frames.last(), Some(&vec![Color::FULL_WHITE; 3]));
    assert!(frames.contains(&vec![Color::DIM_WARM_WHITE; 3]));
    assert!(frames.contains(&vec![Color::AMBER; 3]));
}

#[test]
fn test_sunset_sequence_ends_off() {
    let (light, sink) = new_light(3, false);

    block_on(light.sunset_sequence(110)).unwrap();

    assert_eq!(sink.frames().first(), Some(&vec![Color::FULL_WHITE; 3]));
    assert_eq!(sink.last_main_color(), Some(Color::OFF));
    assert!(!block_on(light.is_on()));
}

#[test]
fn test_toggle_during_sunrise_cancels_and_toggles() {
    let (light, sink) = new_light(3, false);

    let (sunrise, toggle) = block_on(join(light.sunrise_sequence(600), async {
        Timer::after_millis(150).await;
        light.toggle().await
    }));

    assert_eq!(sunrise, Err(Error::Cancelled));
    assert_eq!(toggle, Ok(()));
    // Sunrise war mitten im Fade (an), Toggle schaltet aus
    assert_eq!(block_on(light.current_color()), Color::OFF);

    // Abgebrochene Sequenz schreibt nichts mehr
    let flushes = sink.flush_count();
    block_on(Timer::after_millis(100));
    assert_eq!(sink.flush_count(), flushes);
}

#[test]
fn test_interrupt_cancels_running_fade() {
    let (light, _sink) = new_light(2, false);

    let (fade, ()) = block_on(join(
        light.fade(Color::WHITE, 500, 50, Some(Color::OFF)),
        async {
            Timer::after_millis(60).await;
            light.interrupt();
        },
    ));

    assert_eq!(fade, Err(Error::Cancelled));
    let color = block_on(light.current_color());
    assert_ne!(color, Color::WHITE);
    assert_ne!(color, Color::OFF);
}

#[test]
fn test_sequence_runner_executes_requests() {
    let (light, _sink) = new_light(3, false);
    let handle = light.sequences();

    block_on(select(light.run_sequences(), async {
        assert!(!handle.is_active());
        handle.start(SequenceKind::Sunrise, 100);
        assert!(handle.is_active());

        Timer::after_millis(30).await;
        assert!(handle.is_active());

        Timer::after_millis(250).await;
        assert!(!handle.is_active());
    }));

    assert_eq!(block_on(light.current_color()), Color::FULL_WHITE);
}

#[test]
fn test_sequence_handle_cancel_stops_runner_sequence() {
    let (light, sink) = new_light(3, false);
    let handle = light.sequences();

    block_on(select(light.run_sequences(), async {
        handle.start(SequenceKind::Sunrise, 1000);
        Timer::after_millis(100).await;
        handle.cancel();
        Timer::after_millis(30).await;
        assert!(!handle.is_active());
    }));

    let flushes = sink.flush_count();
    assert_ne!(block_on(light.current_color()), Color::FULL_WHITE);
    block_on(Timer::after_millis(100));
    assert_eq!(sink.flush_count(), flushes);
}

#[test]
fn test_new_sequence_replaces_running_one() {
    let (light, _sink) = new_light(3, false);
    let handle = light.sequences();

    block_on(select(light.run_sequences(), async {
        handle.start(SequenceKind::Sunrise, 2000);
        Timer::after_millis(100).await;
        handle.start(SequenceKind::Sunset, 100);
        Timer::after_millis(300).await;
    }));

    assert_eq!(block_on(light.current_color()), Color::OFF);
}

// ============================================================================
// Tests: Heartbeat
// ============================================================================

fn fast_heartbeat() -> HeartbeatConfig {
    HeartbeatConfig {
        period: Duration::from_millis(20),
        pulse: Duration::from_millis(20),
        steps: 2,
        color: Color::new(0, 0, 16, 0),
    }
}

#[test]
fn test_heartbeat_pulse_only_touches_status_pixel() {
    let (light, sink) = new_light(4, true);
    block_on(light.set_color(Color::AMBER)).unwrap();
    let heartbeat = HeartbeatAnimator::new(&light, fast_heartbeat());

    block_on(heartbeat.pulse()).unwrap();

    assert_eq!(block_on(light.current_color()), Color::AMBER);
    let frames = sink.frames();
    assert!(frames.iter().any(|frame| frame[0] == Color::new(0, 0, 16, 0)));
    let last = frames.last().unwrap();
    assert_eq!(last[0], Color::OFF);
    assert!(last[1..].iter().all(|pixel| *pixel == Color::AMBER));
}

#[test]
fn test_heartbeat_start_stop_idempotent() {
    let (light, _sink) = new_light(2, true);
    let heartbeat = HeartbeatAnimator::new(&light, fast_heartbeat());

    assert!(!heartbeat.is_enabled());
    heartbeat.start();
    heartbeat.start();
    assert!(heartbeat.is_enabled());
    heartbeat.stop();
    heartbeat.stop();
    assert!(!heartbeat.is_enabled());

    assert!(heartbeat.toggle());
    assert!(!heartbeat.toggle());
}

#[test]
fn test_heartbeat_loop_pulses_while_enabled() {
    let (light, sink) = new_light(2, true);
    let heartbeat = HeartbeatAnimator::new(&light, fast_heartbeat());

    // Gestoppt: kein Schreibzugriff
    block_on(select(heartbeat.run(), Timer::after_millis(60)));
    assert_eq!(sink.flush_count(), 0);

    heartbeat.start();
    block_on(select(heartbeat.run(), Timer::after_millis(100)));
    assert!(sink.flush_count() > 0);
    assert_eq!(block_on(light.current_color()), Color::OFF);
}

#[test]
fn test_heartbeat_stop_mid_pulse_finishes_pulse_and_rests_off() {
    let (light, sink) = new_light(2, true);
    let config = HeartbeatConfig {
        period: Duration::from_secs(1),
        pulse: Duration::from_millis(200),
        steps: 10,
        color: Color::new(0, 0, 16, 0),
    };
    let heartbeat = HeartbeatAnimator::new(&light, config);
    heartbeat.start();

    block_on(select(heartbeat.run(), async {
        Timer::after_millis(60).await;
        heartbeat.stop();
        Timer::after_millis(400).await;
    }));

    // Genau ein vollständiger Puls: 11 Schritte hoch, 11 Schritte runter
    let frames = sink.frames();
    assert_eq!(frames.len(), 22);
    assert!(frames.iter().any(|frame| frame[0] == config.color));
    assert_eq!(frames.last().unwrap()[0], Color::OFF);
    assert!(!heartbeat.is_enabled());
}

#[test]
fn test_heartbeat_keeps_running_during_fade() {
    let (light, sink) = new_light(3, true);
    let heartbeat = HeartbeatAnimator::new(&light, fast_heartbeat());
    heartbeat.start();

    block_on(select(heartbeat.run(), async {
        light
            .fade(Color::AMBER, 100, 5, Some(Color::OFF))
            .await
            .unwrap();
    }));

    assert_eq!(block_on(light.current_color()), Color::AMBER);
    assert!(
        sink.frames()
            .iter()
            .any(|frame| frame[0] != Color::OFF)
    );
}

#[test]
fn test_heartbeat_without_status_pixel_fails_pulse() {
    let (light, _sink) = new_light(2, false);
    let heartbeat = HeartbeatAnimator::new(&light, fast_heartbeat());

    assert_eq!(block_on(heartbeat.pulse()), Err(Error::InvalidArgument));
}
