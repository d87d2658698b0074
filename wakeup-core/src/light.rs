//! LightDriver - Fade-Engine für den Pixel-Strip
//!
//! Besitzt den `PixelSink` und den Licht-Zustand (aktuelle Farbe,
//! Helligkeit). Alle Farbwechsel laufen über einen async Mutex, der nur für
//! einen Schreib-Batch gehalten wird, nie über ein `Timer::after` hinweg.
//!
//! # Abbruch
//! Fades und Sequenzen sind kooperativ abbrechbar: jede Animation merkt sich
//! beim Start den Wert eines Epoch-Zählers. Manuelle Overrides (`toggle`,
//! `set_color`, ...) erhöhen den Zähler, die laufende Animation bemerkt das
//! beim nächsten Schritt (unter dem Lock) und endet mit `Error::Cancelled`.
//! Der zuletzt geschriebene Teil-Farbwert bleibt stehen.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::Mutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Timer};

use crate::error::Error;
use crate::logic::interpolate;
use crate::traits::PixelSink;
use crate::types::Color;

/// Ziel-Intervall zwischen zwei Fade-Schritten einer Sequenz
pub const SEQUENCE_FRAME_MS: u32 = 20;

/// Obergrenze für Schritte pro Sequenz-Stufe
pub const MAX_SEQUENCE_STEPS: u32 = 1000;

/// Sonnenaufgang oder Sonnenuntergang
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SequenceKind {
    Sunrise,
    Sunset,
}

/// Auftrag an den Sequenz-Runner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SequenceRequest {
    pub kind: SequenceKind,
    pub duration_ms: u32,
}

/// Eine Stufe einer Sequenz: Fade von `start` nach `target`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FadeStage {
    pub start: Color,
    pub target: Color,
    pub duration_ms: u32,
    pub steps: u32,
}

/// Teilt eine Sequenz in ihre drei Fade-Stufen auf
///
/// Sunrise: OFF → DIM_WARM_WHITE → AMBER → FULL_WHITE, Gewichte 10 : 80 : 20.
/// Sunset: exakt umgekehrt, Gewichte 20 : 80 : 10.
///
/// Die Gewichte summieren sich auf 110 und werden als Anteil an der
/// Gesamtdauer gerundet. Die letzte Stufe bekommt den Rest, damit die Summe
/// der Stufen exakt `total_ms` ergibt.
pub fn sequence_stages(kind: SequenceKind, total_ms: u32) -> [FadeStage; 3] {
    let (colors, weights) = match kind {
        SequenceKind::Sunrise => (
            [
                Color::OFF,
                Color::DIM_WARM_WHITE,
                Color::AMBER,
                Color::FULL_WHITE,
            ],
            [10u64, 80, 20],
        ),
        SequenceKind::Sunset => (
            [
                Color::FULL_WHITE,
                Color::AMBER,
                Color::DIM_WARM_WHITE,
                Color::OFF,
            ],
            [20u64, 80, 10],
        ),
    };
    let weight_sum: u64 = weights.iter().sum();
    let total = u64::from(total_ms);

    let first = ((total * weights[0] + weight_sum / 2) / weight_sum) as u32;
    let second = ((total * weights[1] + weight_sum / 2) / weight_sum) as u32;
    let third = total_ms.saturating_sub(first).saturating_sub(second);

    let stage = |index: usize, duration_ms: u32| FadeStage {
        start: colors[index],
        target: colors[index + 1],
        duration_ms,
        steps: (duration_ms / SEQUENCE_FRAME_MS).clamp(1, MAX_SEQUENCE_STEPS),
    };

    [stage(0, first), stage(1, second), stage(2, third)]
}

struct LightState<S> {
    sink: S,
    current: Color,
    brightness: f32,
}

/// Fade-Engine über einem `PixelSink`
///
/// # Status-Pixel
/// Mit `status_pixel = true` ist Index 0 für den Heartbeat reserviert und
/// wird von `set_all` und allen Fades ausgelassen.
pub struct LightDriver<M: RawMutex, S: PixelSink> {
    state: Mutex<M, LightState<S>>,
    status_pixel: bool,
    epoch: AtomicU32,
    sequence_running: AtomicBool,
    requests: Signal<M, SequenceRequest>,
}

impl<M: RawMutex, S: PixelSink> LightDriver<M, S> {
    /// Erstellt den Driver, das Licht gilt als aus
    ///
    /// Die Hardware wird erst mit dem ersten Schreibzugriff angefasst
    /// (in der Firmware: `turn_off()` direkt nach dem Start).
    pub fn new(sink: S, status_pixel: bool) -> Self {
        Self {
            state: Mutex::new(LightState {
                sink,
                current: Color::OFF,
                brightness: 1.0,
            }),
            status_pixel,
            epoch: AtomicU32::new(0),
            sequence_running: AtomicBool::new(false),
            requests: Signal::new(),
        }
    }

    /// Zuletzt auf alle Pixel geschriebene Farbe
    pub async fn current_color(&self) -> Color {
        self.state.lock().await.current
    }

    /// true wenn die aktuelle Farbe nicht OFF ist
    pub async fn is_on(&self) -> bool {
        !self.current_color().await.is_off()
    }

    /// Zuletzt mit `set_brightness` gesetzter Faktor
    pub async fn brightness(&self) -> f32 {
        self.state.lock().await.brightness
    }

    /// true wenn Index 0 als Status-Pixel reserviert ist
    pub fn has_status_pixel(&self) -> bool {
        self.status_pixel
    }

    /// Bricht laufende Fades/Sequenzen ab und verwirft wartende Aufträge
    ///
    /// Gibt den neuen Epoch-Wert zurück. Wer mit diesem Wert animiert,
    /// "besitzt" das Licht bis zum nächsten `interrupt()`.
    pub fn interrupt(&self) -> u32 {
        self.requests.reset();
        self.epoch.fetch_add(1, Ordering::AcqRel).wrapping_add(1)
    }

    /// true solange eine Sequenz läuft oder auf den Runner wartet
    pub fn sequence_active(&self) -> bool {
        self.sequence_running.load(Ordering::Acquire) || self.requests.signaled()
    }

    /// Handle zum Starten/Abbrechen von Sequenzen über den Runner
    pub fn sequences(&self) -> SequenceHandle<'_, M, S> {
        SequenceHandle { light: self }
    }

    // ========================================================================
    // Manuelle Overrides (brechen laufende Animationen ab)
    // ========================================================================

    /// Setzt alle steuerbaren Pixel auf `color`
    pub async fn set_all(&self, color: Color) -> Result<(), Error> {
        self.interrupt();
        let mut state = self.state.lock().await;
        self.commit(&mut state, color)?;
        state.brightness = 1.0;
        Ok(())
    }

    /// Alias für `set_all` (Command `set_color`)
    pub async fn set_color(&self, color: Color) -> Result<(), Error> {
        self.set_all(color).await
    }

    /// Licht an: `FULL_WHITE` oder Weiß ohne W-Kanal
    pub async fn turn_on(&self, full: bool) -> Result<(), Error> {
        let color = if full { Color::FULL_WHITE } else { Color::WHITE };
        self.set_all(color).await
    }

    /// Licht aus
    pub async fn turn_off(&self) -> Result<(), Error> {
        self.set_all(Color::OFF).await
    }

    /// Schaltet anhand der aktuellen Farbe um (an → OFF, aus → FULL_WHITE)
    ///
    /// Entscheidung und Schreiben passieren unter demselben Lock.
    pub async fn toggle(&self) -> Result<(), Error> {
        self.interrupt();
        let mut state = self.state.lock().await;
        let next = if state.current.is_off() {
            Color::FULL_WHITE
        } else {
            Color::OFF
        };
        self.commit(&mut state, next)?;
        state.brightness = 1.0;
        Ok(())
    }

    /// Skaliert die aktuelle Farbe mit `scale` und schreibt sie neu
    ///
    /// Die Skalierung ist verlustbehaftet: zweimal 0.5 ergibt 0.25.
    ///
    /// # Fehlerbehandlung
    /// `Error::InvalidArgument` wenn `scale` nicht in [0, 1] liegt (auch NaN),
    /// dann bleibt alles unverändert.
    pub async fn set_brightness(&self, scale: f32) -> Result<(), Error> {
        if !(0.0..=1.0).contains(&scale) {
            return Err(Error::InvalidArgument);
        }
        self.interrupt();
        let mut state = self.state.lock().await;
        let color = state.current.scale(scale);
        self.commit(&mut state, color)?;
        state.brightness = scale;
        Ok(())
    }

    /// Schreibt nur das reservierte Status-Pixel (Index 0)
    ///
    /// Ändert weder `current_color` noch laufende Animationen.
    pub async fn write_status(&self, color: Color) -> Result<(), Error> {
        if !self.status_pixel {
            return Err(Error::InvalidArgument);
        }
        let mut state = self.state.lock().await;
        state.sink.write(0, color)?;
        state.sink.flush()?;
        Ok(())
    }

    // ========================================================================
    // Fades & Sequenzen
    // ========================================================================

    /// Fade von `start` (Default: aktuelle Farbe) nach `target`
    ///
    /// Schreibt `steps + 1` Farben, zwischen zwei Schreibvorgängen wird
    /// `duration_ms / steps` geschlafen. Ein Fade übernimmt das Licht wie ein
    /// manueller Override (laufende Animationen werden abgebrochen).
    ///
    /// # Fehlerbehandlung
    /// - `Error::InvalidArgument` bei `steps == 0` (vor jeder Änderung)
    /// - `Error::Cancelled` wenn zwischendurch ein Override kam
    /// - `Error::Hardware` bricht ab, der Teilzustand bleibt stehen
    pub async fn fade(
        &self,
        target: Color,
        duration_ms: u32,
        steps: u32,
        start: Option<Color>,
    ) -> Result<(), Error> {
        if steps == 0 {
            return Err(Error::InvalidArgument);
        }
        let token = self.interrupt();
        self.fade_with_token(target, duration_ms, steps, start, token)
            .await
    }

    /// Sonnenaufgang über `total_ms` (direkt, ohne Runner)
    pub async fn sunrise_sequence(&self, total_ms: u32) -> Result<(), Error> {
        let token = self.interrupt();
        self.run_stages(sequence_stages(SequenceKind::Sunrise, total_ms), token)
            .await
    }

    /// Sonnenuntergang über `total_ms` (direkt, ohne Runner)
    pub async fn sunset_sequence(&self, total_ms: u32) -> Result<(), Error> {
        let token = self.interrupt();
        self.run_stages(sequence_stages(SequenceKind::Sunset, total_ms), token)
            .await
    }

    /// Sequenz-Runner: führt über `SequenceHandle` angeforderte Sequenzen aus
    ///
    /// Läuft für immer, in der Firmware als eigener Task.
    pub async fn run_sequences(&self) -> ! {
        loop {
            let request = self.requests.wait().await;
            let token = self.epoch.load(Ordering::Acquire);

            self.sequence_running.store(true, Ordering::Release);
            let result = self
                .run_stages(sequence_stages(request.kind, request.duration_ms), token)
                .await;
            self.sequence_running.store(false, Ordering::Release);

            match result {
                Ok(()) => {
                    #[cfg(feature = "defmt")]
                    defmt::info!("LIGHT: {} finished", request.kind);
                }
                Err(Error::Cancelled) => {
                    #[cfg(feature = "defmt")]
                    defmt::info!("LIGHT: {} cancelled", request.kind);
                }
                Err(_error) => {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("LIGHT: {} aborted: {}", request.kind, _error);
                }
            }
        }
    }

    async fn run_stages(&self, stages: [FadeStage; 3], token: u32) -> Result<(), Error> {
        for stage in stages {
            self.fade_with_token(
                stage.target,
                stage.duration_ms,
                stage.steps,
                Some(stage.start),
                token,
            )
            .await?;
        }
        Ok(())
    }

    async fn fade_with_token(
        &self,
        target: Color,
        duration_ms: u32,
        steps: u32,
        start: Option<Color>,
        token: u32,
    ) -> Result<(), Error> {
        let start = match start {
            Some(color) => color,
            None => self.current_color().await,
        };
        let pause = Duration::from_micros(u64::from(duration_ms) * 1000 / u64::from(steps));

        for step in 0..=steps {
            let color = interpolate(start, target, step, steps)?;
            {
                let mut state = self.state.lock().await;
                if self.epoch.load(Ordering::Acquire) != token {
                    return Err(Error::Cancelled);
                }
                self.commit(&mut state, color)?;
            }
            if step < steps {
                Timer::after(pause).await;
            }
        }
        Ok(())
    }

    /// Schreibt `color` auf alle steuerbaren Pixel als ein Batch
    ///
    /// `current` wird erst nach erfolgreichem Flush aktualisiert.
    fn commit(&self, state: &mut LightState<S>, color: Color) -> Result<(), Error> {
        let first = usize::from(self.status_pixel);
        let count = state.sink.pixel_count();
        for index in first..count {
            state.sink.write(index, color)?;
        }
        state.sink.flush()?;
        state.current = color;
        Ok(())
    }
}

/// Handle auf den Sequenz-Runner
///
/// Wird vom `AlarmScheduler` gehalten; damit läuft keine Sequenz ohne
/// Möglichkeit, sie wieder abzubrechen.
pub struct SequenceHandle<'a, M: RawMutex, S: PixelSink> {
    light: &'a LightDriver<M, S>,
}

impl<M: RawMutex, S: PixelSink> Clone for SequenceHandle<'_, M, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M: RawMutex, S: PixelSink> Copy for SequenceHandle<'_, M, S> {}

impl<'a, M: RawMutex, S: PixelSink> SequenceHandle<'a, M, S> {
    /// Startet eine Sequenz, eine laufende wird ersetzt
    pub fn start(&self, kind: SequenceKind, duration_ms: u32) {
        self.light.interrupt();
        self.light.requests.signal(SequenceRequest { kind, duration_ms });
    }

    /// Bricht laufende und wartende Sequenzen ab
    pub fn cancel(&self) {
        self.light.interrupt();
    }

    /// true solange eine Sequenz läuft oder wartet
    pub fn is_active(&self) -> bool {
        self.light.sequence_active()
    }

    /// Zugriff auf den Driver (z.B. für Status-Abfragen)
    pub fn light(&self) -> &'a LightDriver<M, S> {
        self.light
    }
}
