//! HeartbeatAnimator - pulsierendes Status-Pixel
//!
//! Läuft unabhängig von Fades und Sequenzen: schreibt nur Index 0 über
//! `LightDriver::write_status` und fasst `current_color` nie an.

use core::sync::atomic::{AtomicBool, Ordering};

use embassy_futures::select::select;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Timer};

use crate::error::Error;
use crate::light::LightDriver;
use crate::logic::interpolate;
use crate::traits::PixelSink;
use crate::types::Color;

/// Parameter für den Heartbeat-Puls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartbeatConfig {
    /// Pause zwischen zwei Pulsen
    pub period: Duration,
    /// Dauer eines Pulses (Fade-In + Fade-Out)
    pub pulse: Duration,
    /// Schritte pro Fade-Hälfte
    pub steps: u32,
    /// Spitzenfarbe des Pulses (niedrige Helligkeit)
    pub color: Color,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_secs(5),
            pulse: Duration::from_millis(600),
            steps: 8,
            color: Color::new(0, 0, 16, 0),
        }
    }
}

/// Periodischer Puls auf dem Status-Pixel
pub struct HeartbeatAnimator<'a, M: RawMutex, S: PixelSink> {
    light: &'a LightDriver<M, S>,
    config: HeartbeatConfig,
    enabled: AtomicBool,
    wake: Signal<M, ()>,
}

impl<'a, M: RawMutex, S: PixelSink> HeartbeatAnimator<'a, M, S> {
    /// Erstellt einen (noch gestoppten) Heartbeat
    pub fn new(light: &'a LightDriver<M, S>, config: HeartbeatConfig) -> Self {
        Self {
            light,
            config,
            enabled: AtomicBool::new(false),
            wake: Signal::new(),
        }
    }

    /// Startet den Heartbeat (idempotent)
    pub fn start(&self) {
        if !self.enabled.swap(true, Ordering::AcqRel) {
            self.wake.signal(());
        }
    }

    /// Stoppt den Heartbeat vor dem nächsten Puls (idempotent)
    pub fn stop(&self) {
        if self.enabled.swap(false, Ordering::AcqRel) {
            self.wake.signal(());
        }
    }

    /// Schaltet um, gibt den neuen Zustand zurück
    pub fn toggle(&self) -> bool {
        if self.is_enabled() {
            self.stop();
            false
        } else {
            self.start();
            true
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Ein Puls: Fade-In auf `config.color`, Fade-Out auf OFF
    ///
    /// Bei einem Hardware-Fehler wird noch versucht, das Pixel auf OFF zu
    /// setzen, der Fehler wird zurückgegeben.
    pub async fn pulse(&self) -> Result<(), Error> {
        let result = self.pulse_inner().await;
        if result.is_err() {
            let _ = self.light.write_status(Color::OFF).await;
        }
        result
    }

    async fn pulse_inner(&self) -> Result<(), Error> {
        let steps = self.config.steps.max(1);
        let pause = self.config.pulse / (2 * steps);

        for step in 0..=steps {
            let color = interpolate(Color::OFF, self.config.color, step, steps)?;
            self.light.write_status(color).await?;
            Timer::after(pause).await;
        }
        for step in 0..=steps {
            let color = interpolate(self.config.color, Color::OFF, step, steps)?;
            self.light.write_status(color).await?;
            if step < steps {
                Timer::after(pause).await;
            }
        }
        Ok(())
    }

    /// Heartbeat-Loop, läuft für immer
    ///
    /// Gestoppt wartet der Loop auf `start()`. Zwischen zwei Pulsen wird
    /// `period` gewartet, ein `stop()` weckt ihn sofort auf.
    pub async fn run(&self) -> ! {
        loop {
            if !self.is_enabled() {
                self.wake.wait().await;
                continue;
            }

            if let Err(_error) = self.pulse().await {
                #[cfg(feature = "defmt")]
                defmt::warn!("HEARTBEAT: pulse failed: {}", _error);
            }

            select(Timer::after(self.config.period), self.wake.wait()).await;
        }
    }
}
