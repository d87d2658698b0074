//! Gemeinsame Mocks für die Integration Tests
//!
//! Alle Mocks teilen ihren Zustand über `Arc<Mutex<..>>`: der Test behält
//! einen Klon und kann nachsehen, was der Core geschrieben hat, nachdem der
//! Mock in den `LightDriver` bzw. `AlarmScheduler` verschoben wurde.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::{Duration, Timer};
use wakeup_core::{
    AlarmScheduler, Color, ConfigStorage, Error, LedError, LightDriver, NetworkTime, PixelSink,
    TimeSource,
};

pub type TestMutex = CriticalSectionRawMutex;
pub type TestLight = LightDriver<TestMutex, MockPixelSink>;
pub type TestScheduler<'a> = AlarmScheduler<'a, TestMutex, MockPixelSink, MockStorage>;

// ============================================================================
// Mock Pixel Sink
// ============================================================================

#[derive(Default)]
pub struct SinkLog {
    /// Buffer-Zustand (wird durch `write` verändert)
    pub pixels: Vec<Color>,
    /// Letzter geflushter Zustand pro Flush
    pub frames: Vec<Vec<Color>>,
    pub write_count: usize,
    /// Flushes ab dieser Nummer (0-basiert) schlagen fehl
    pub fail_flush_from: Option<usize>,
    pub flush_attempts: usize,
}

#[derive(Clone)]
pub struct MockPixelSink {
    log: Arc<Mutex<SinkLog>>,
}

impl MockPixelSink {
    pub fn new(pixel_count: usize) -> Self {
        let log = SinkLog {
            pixels: vec![Color::OFF; pixel_count],
            ..SinkLog::default()
        };
        Self {
            log: Arc::new(Mutex::new(log)),
        }
    }

    pub fn pixels(&self) -> Vec<Color> {
        self.log.lock().unwrap().pixels.clone()
    }

    pub fn frames(&self) -> Vec<Vec<Color>> {
        self.log.lock().unwrap().frames.clone()
    }

    pub fn flush_count(&self) -> usize {
        self.log.lock().unwrap().frames.len()
    }

    pub fn flush_attempts(&self) -> usize {
        self.log.lock().unwrap().flush_attempts
    }

    pub fn write_count(&self) -> usize {
        self.log.lock().unwrap().write_count
    }

    /// Letzte geflushte Farbe des letzten Pixels (Haupt-Licht)
    pub fn last_main_color(&self) -> Option<Color> {
        self.log
            .lock()
            .unwrap()
            .frames
            .last()
            .and_then(|frame| frame.last().copied())
    }

    pub fn fail_flush_from(&self, flush_number: usize) {
        self.log.lock().unwrap().fail_flush_from = Some(flush_number);
    }
}

impl PixelSink for MockPixelSink {
    fn pixel_count(&self) -> usize {
        self.log.lock().unwrap().pixels.len()
    }

    fn write(&mut self, index: usize, color: Color) -> Result<(), LedError> {
        let mut log = self.log.lock().unwrap();
        let pixel = log
            .pixels
            .get_mut(index)
            .ok_or(LedError::IndexOutOfRange)?;
        *pixel = color;
        log.write_count += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), LedError> {
        let mut log = self.log.lock().unwrap();
        let attempt = log.flush_attempts;
        log.flush_attempts += 1;
        if log.fail_flush_from.is_some_and(|from| attempt >= from) {
            return Err(LedError::WriteFailed);
        }
        let frame = log.pixels.clone();
        log.frames.push(frame);
        Ok(())
    }
}

// ============================================================================
// Mock Storage
// ============================================================================

#[derive(Default)]
pub struct StorageLog {
    pub data: Option<Vec<u8>>,
    pub write_count: usize,
    pub fail_writes: bool,
}

#[derive(Clone, Default)]
pub struct MockStorage {
    log: Arc<Mutex<StorageLog>>,
}

impl MockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(data: &[u8]) -> Self {
        let storage = Self::default();
        storage.log.lock().unwrap().data = Some(data.to_vec());
        storage
    }

    pub fn data(&self) -> Option<Vec<u8>> {
        self.log.lock().unwrap().data.clone()
    }

    pub fn write_count(&self) -> usize {
        self.log.lock().unwrap().write_count
    }

    pub fn fail_writes(&self) {
        self.log.lock().unwrap().fail_writes = true;
    }
}

impl ConfigStorage for MockStorage {
    fn read(&mut self, buffer: &mut [u8]) -> Result<(), Error> {
        let log = self.log.lock().unwrap();
        // Leerer Flash liest sich als 0xFF
        buffer.fill(0xFF);
        if let Some(data) = &log.data {
            let len = data.len().min(buffer.len());
            buffer[..len].copy_from_slice(&data[..len]);
        }
        Ok(())
    }

    fn write(&mut self, buffer: &[u8]) -> Result<(), Error> {
        let mut log = self.log.lock().unwrap();
        if log.fail_writes {
            return Err(Error::Persistence);
        }
        log.data = Some(buffer.to_vec());
        log.write_count += 1;
        Ok(())
    }
}

// ============================================================================
// Mock Time Source
// ============================================================================

pub struct MockTimeSource {
    responses: VecDeque<Result<NetworkTime, Error>>,
    pub calls: usize,
    /// Künstliche Antwortzeit pro Aufruf
    pub delay: Option<Duration>,
}

impl MockTimeSource {
    pub fn new(responses: impl IntoIterator<Item = Result<NetworkTime, Error>>) -> Self {
        Self {
            responses: responses.into_iter().collect(),
            calls: 0,
            delay: None,
        }
    }

    /// Quelle, die jeden Aufruf mit `Error::Network` beantwortet
    pub fn failing() -> Self {
        Self::new([])
    }
}

impl TimeSource for MockTimeSource {
    async fn fetch_utc(&mut self) -> Result<NetworkTime, Error> {
        self.calls += 1;
        if let Some(delay) = self.delay {
            Timer::after(delay).await;
        }
        self.responses.pop_front().unwrap_or(Err(Error::Network))
    }
}
