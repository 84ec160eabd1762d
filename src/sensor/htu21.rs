//! HTU21D(F) relative humidity / temperature sensor over I²C.
//!
//! Uses the "hold master" commands: the sensor stretches SCL until the
//! conversion is done, so a single `write_read` returns the result.
//!
//! Frame layout (3 bytes):
//! ```text
//! Byte 0: Data MSB
//! Byte 1: Data LSB  (bits 1..0 are status bits, masked before conversion)
//! Byte 2: CRC-8     (polynomial x^8 + x^5 + x^4 + 1, init 0x00)
//! ```
//!
//! Conversion (datasheet):
//! ```text
//! RH = -6     + 125    * S / 2^16   [%]
//! T  = -46.85 + 175.72 * S / 2^16   [°C]
//! ```
//! evaluated in fixed point and rounded to the nearest integer.

use crate::config::{HTU21_ADDRESS, HTU21_RESET_DELAY_MS};
use crate::error::{Error, SensorError};
use crate::reading::{Celsius, Percentage};
use crate::sensor::SensorDriver;
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

/// Trigger temperature measurement, hold master.
pub const CMD_TEMPERATURE_HOLD: u8 = 0xE3;

/// Trigger humidity measurement, hold master.
pub const CMD_HUMIDITY_HOLD: u8 = 0xE5;

/// Soft reset.
pub const CMD_SOFT_RESET: u8 = 0xFE;

const STATUS_MASK: u16 = 0xFFFC;
const CRC_POLYNOMIAL: u16 = 0x131;

/// HTU21D driver, generic over any blocking `embedded-hal` I²C bus.
pub struct Htu21<I2C> {
    i2c: I2C,
}

impl<I2C: I2c> Htu21<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self { i2c }
    }

    /// Soft-reset the sensor and wait for it to come back.
    pub fn reset(&mut self, delay: &mut impl DelayNs) -> Result<(), Error> {
        self.i2c
            .write(HTU21_ADDRESS, &[CMD_SOFT_RESET])
            .map_err(|_| SensorError::Bus)?;
        delay.delay_ms(HTU21_RESET_DELAY_MS);
        Ok(())
    }

    fn measure(&mut self, command: u8) -> Result<u16, SensorError> {
        let mut frame = [0u8; 3];
        self.i2c
            .write_read(HTU21_ADDRESS, &[command], &mut frame)
            .map_err(|_| SensorError::Bus)?;
        parse_frame(&frame)
    }
}

impl<I2C: I2c> SensorDriver for Htu21<I2C> {
    fn sample_humidity(&mut self) -> Result<Percentage, SensorError> {
        self.measure(CMD_HUMIDITY_HOLD).map(humidity_from_raw)
    }

    fn sample_temperature(&mut self) -> Result<Celsius, SensorError> {
        self.measure(CMD_TEMPERATURE_HOLD).map(temperature_from_raw)
    }
}

/// Validate a measurement frame and return the 16-bit signal with the
/// status bits cleared.
pub fn parse_frame(frame: &[u8; 3]) -> Result<u16, SensorError> {
    if crc8(&frame[..2]) != frame[2] {
        return Err(SensorError::Crc);
    }
    Ok(u16::from_be_bytes([frame[0], frame[1]]) & STATUS_MASK)
}

/// CRC-8 as specified by the HTU21D datasheet.
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc: u16 = 0;
    for &byte in data {
        crc ^= byte as u16;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ CRC_POLYNOMIAL
            } else {
                crc << 1
            };
        }
    }
    crc as u8
}

/// Convert a raw humidity signal to whole percent (clamped to 0..=100).
pub fn humidity_from_raw(raw: u16) -> Percentage {
    let signal = (raw & STATUS_MASK) as i32;
    let scaled = 125 * signal - 6 * 65_536;
    Percentage::saturating(round_div(scaled as i64, 65_536) as i32)
}

/// Convert a raw temperature signal to whole degrees Celsius.
pub fn temperature_from_raw(raw: u16) -> Celsius {
    let signal = (raw & STATUS_MASK) as i64;
    // Hundredths of a degree, scaled by 2^16.
    let scaled = 17_572 * signal - 4_685 * 65_536;
    Celsius::saturating(round_div(scaled, 100 * 65_536) as i32)
}

/// Divide rounding half up, correct for negative numerators.
fn round_div(numerator: i64, denominator: i64) -> i64 {
    (numerator + denominator / 2).div_euclid(denominator)
}
