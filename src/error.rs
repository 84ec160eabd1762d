//! Unified error type for temprh.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! Implements `defmt::Format` (behind the `defmt` feature) for efficient
//! on-target logging.

/// Top-level error type used across the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    // Sensor
    /// A sample could not be taken.
    Sensor(SensorError),

    // BLE
    /// The SoftDevice returned a BLE-level error.
    Ble(BleError),

    // Generic
    /// Buffer too small for the requested operation.
    BufferOverflow,
    /// The device name is empty.
    InvalidName,
}

/// Transient sensor failures.  The services absorb these silently and
/// retry on the next tick or read request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError {
    /// I²C transaction failed (NACK, arbitration loss, bus error).
    Bus,
    /// The frame checksum did not match its payload.
    Crc,
}

/// Subset of BLE errors we propagate (keeps the enum `Copy`-friendly).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BleError {
    /// GAP / GATT raw error code from the SoftDevice.
    Raw(u32),
    /// Service or characteristic registration was rejected.
    RegisterFailed,
    /// Advertising could not start.
    AdvertiseFailed,
}

// Convenience conversions

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Error::Sensor(e)
    }
}

impl From<BleError> for Error {
    fn from(e: BleError) -> Self {
        Error::Ble(e)
    }
}
