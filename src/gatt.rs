//! GATT surface: characteristic identities, presentation metadata and
//! the push-update seam towards the BLE stack.
//!
//! Both sensor services share the vendor service UUID and expose one
//! single-byte characteristic each, readable and notifiable, described
//! by a Characteristic Presentation Format (CPF) descriptor:
//! ```text
//! Byte 0:    Format      (0x04 = uint8, 0x0C = sint8)
//! Byte 1:    Exponent    (signed, always 0 here)
//! Byte 2..4: Unit        (SIG assigned, little-endian)
//! Byte 4:    Name space  (0x01 = Bluetooth SIG)
//! Byte 5..7: Description (little-endian, 0x0000 = unknown)
//! ```

use crate::config::{
    UNIT_DEGREE_CELSIUS, UNIT_PERCENTAGE, VENDOR_UUID_BASE, VENDOR_UUID_HUMID_CHAR,
    VENDOR_UUID_SENSOR_SERVICE, VENDOR_UUID_TEMP_CHAR,
};

/// CPF format: unsigned 8-bit integer.
pub const CPF_FORMAT_UINT8: u8 = 0x04;

/// CPF format: signed 8-bit integer.
pub const CPF_FORMAT_SINT8: u8 = 0x0C;

/// CPF name space: Bluetooth SIG assigned numbers.
pub const CPF_NAMESPACE_BLUETOOTH_SIG: u8 = 0x01;

/// Encoded size of a CPF descriptor.
pub const CPF_LEN: usize = 7;

/// The two characteristics this peripheral exposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CharacteristicId {
    Humidity,
    Temperature,
}

impl CharacteristicId {
    /// Static description used for registration.
    pub fn info(self) -> &'static CharacteristicInfo {
        match self {
            CharacteristicId::Humidity => &HUMIDITY,
            CharacteristicId::Temperature => &TEMPERATURE,
        }
    }
}

/// Characteristic Presentation Format descriptor value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Presentation {
    pub format: u8,
    pub exponent: i8,
    pub unit: u16,
    pub namespace: u8,
    pub description: u16,
}

impl Presentation {
    pub fn to_bytes(&self) -> [u8; CPF_LEN] {
        let unit = self.unit.to_le_bytes();
        let description = self.description.to_le_bytes();
        [
            self.format,
            self.exponent as u8,
            unit[0],
            unit[1],
            self.namespace,
            description[0],
            description[1],
        ]
    }
}

/// Everything the BLE binding needs to register one characteristic.
#[derive(Debug)]
pub struct CharacteristicInfo {
    pub id: CharacteristicId,
    /// Vendor short UUID (combined with [`VENDOR_UUID_BASE`]).
    pub short_uuid: u16,
    /// Characteristic User Description.
    pub name: &'static str,
    pub presentation: Presentation,
}

impl CharacteristicInfo {
    pub fn uuid(&self) -> [u8; 16] {
        vendor_uuid(self.short_uuid)
    }
}

pub static HUMIDITY: CharacteristicInfo = CharacteristicInfo {
    id: CharacteristicId::Humidity,
    short_uuid: VENDOR_UUID_HUMID_CHAR,
    name: "Relative Humidity",
    presentation: Presentation {
        format: CPF_FORMAT_UINT8,
        exponent: 0,
        unit: UNIT_PERCENTAGE,
        namespace: CPF_NAMESPACE_BLUETOOTH_SIG,
        description: 0,
    },
};

pub static TEMPERATURE: CharacteristicInfo = CharacteristicInfo {
    id: CharacteristicId::Temperature,
    short_uuid: VENDOR_UUID_TEMP_CHAR,
    name: "Temperature",
    presentation: Presentation {
        format: CPF_FORMAT_SINT8,
        exponent: 0,
        unit: UNIT_DEGREE_CELSIUS,
        namespace: CPF_NAMESPACE_BLUETOOTH_SIG,
        description: 0,
    },
};

/// 128-bit UUID of the sensor service.
pub fn service_uuid() -> [u8; 16] {
    vendor_uuid(VENDOR_UUID_SENSOR_SERVICE)
}

/// Expand a vendor short UUID onto the vendor base (little-endian).
pub fn vendor_uuid(short: u16) -> [u8; 16] {
    let mut uuid = VENDOR_UUID_BASE;
    uuid[12..14].copy_from_slice(&short.to_le_bytes());
    uuid
}

/// Push-update primitive of the BLE binding.
///
/// Implementations update the stored attribute value and notify the
/// connected central if it subscribed.  Delivery failures are the
/// binding's business; callers never learn about them.
pub trait Notifier {
    fn notify(&mut self, characteristic: CharacteristicId, value: &[u8]);
}

impl<N: Notifier + ?Sized> Notifier for &mut N {
    fn notify(&mut self, characteristic: CharacteristicId, value: &[u8]) {
        (**self).notify(characteristic, value)
    }
}
