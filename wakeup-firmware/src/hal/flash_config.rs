// Flash-Speicher für den Konfigurations-Record
//
// Ein 4 KB Sektor wird exklusiv für den Record genutzt. Schreiben heißt:
// Sektor löschen, Record (auf Wortgrenze aufgefüllt) schreiben.

use embedded_storage::nor_flash::{NorFlash, ReadNorFlash};
use esp_storage::FlashStorage;
use wakeup_core::{CONFIG_RECORD_SIZE, ConfigStorage, Error};

use crate::config::{CONFIG_FLASH_OFFSET, FLASH_SECTOR_SIZE};

/// Record-Größe auf 4 Byte aufgerundet (Flash schreibt wortweise)
const ALIGNED_RECORD_SIZE: usize = CONFIG_RECORD_SIZE.next_multiple_of(4);

/// `ConfigStorage` auf dem internen SPI-Flash
pub struct FlashConfigStorage {
    flash: FlashStorage<'static>,
    offset: u32,
}

impl FlashConfigStorage {
    pub fn new(flash: FlashStorage<'static>) -> Self {
        Self {
            flash,
            offset: CONFIG_FLASH_OFFSET,
        }
    }
}

impl ConfigStorage for FlashConfigStorage {
    fn read(&mut self, buffer: &mut [u8]) -> Result<(), Error> {
        if buffer.len() > ALIGNED_RECORD_SIZE {
            return Err(Error::Persistence);
        }

        let mut aligned = [0xFFu8; ALIGNED_RECORD_SIZE];
        self.flash
            .read(self.offset, &mut aligned)
            .map_err(|_| Error::Persistence)?;
        buffer.copy_from_slice(&aligned[..buffer.len()]);
        Ok(())
    }

    fn write(&mut self, buffer: &[u8]) -> Result<(), Error> {
        if buffer.len() > ALIGNED_RECORD_SIZE {
            return Err(Error::Persistence);
        }

        let mut aligned = [0xFFu8; ALIGNED_RECORD_SIZE];
        aligned[..buffer.len()].copy_from_slice(buffer);

        self.flash
            .erase(self.offset, self.offset + FLASH_SECTOR_SIZE)
            .map_err(|_| Error::Persistence)?;
        self.flash
            .write(self.offset, &aligned)
            .map_err(|_| Error::Persistence)
    }
}
