//! Sensor quantities and their on-air encoding.
//!
//! Both characteristics carry exactly one byte, no framing, no scaling
//! exponent:
//! ```text
//! Relative humidity: uint8, 0..=100 %
//! Temperature:       sint8, -128..=127 °C (two's complement)
//! ```

/// Length of every characteristic value on the wire.
pub const VALUE_LEN: usize = 1;

/// Relative humidity in whole percent, always within `0..=100`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Percentage(u8);

impl Percentage {
    pub const MAX: u8 = 100;

    /// Returns `None` when `value` is above 100 %.
    pub const fn new(value: u8) -> Option<Self> {
        if value <= Self::MAX {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Clamp an arbitrary integer into the valid range.
    pub fn saturating(value: i32) -> Self {
        Self(value.clamp(0, Self::MAX as i32) as u8)
    }

    pub const fn get(self) -> u8 {
        self.0
    }
}

/// Temperature in whole degrees Celsius.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Celsius(i8);

impl Celsius {
    pub const fn new(value: i8) -> Self {
        Self(value)
    }

    /// Clamp an arbitrary integer into the `i8` range.
    pub fn saturating(value: i32) -> Self {
        Self(value.clamp(i8::MIN as i32, i8::MAX as i32) as i8)
    }

    pub const fn get(self) -> i8 {
        self.0
    }
}

/// Encoded characteristic value, ready for a notify or a read response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CharacteristicValue([u8; VALUE_LEN]);

impl CharacteristicValue {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// A quantity that fits a single-byte characteristic.
pub trait Encode: Copy {
    fn encode(self) -> CharacteristicValue;
}

impl Encode for Percentage {
    fn encode(self) -> CharacteristicValue {
        CharacteristicValue([self.0])
    }
}

impl Encode for Celsius {
    fn encode(self) -> CharacteristicValue {
        CharacteristicValue(self.0.to_le_bytes())
    }
}
