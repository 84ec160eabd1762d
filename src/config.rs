//! Application-wide constants and compile-time configuration.
//!
//! All pin assignments, timing parameters, and protocol constants live
//! here so they can be tuned in one place.  There is no runtime
//! configuration: the GATT surface is the only interface.

// Device

/// Complete local name carried in the advertising payload and the GAP
/// device name characteristic.
pub const DEVICE_NAME: &str = "Temperature/RH";

// Tick source

/// Periodic sampling rate while a central is connected (Hz).
pub const TICK_HZ: u64 = 1;

/// Depth of the scheduler event queue (ticks + deferred GATT reads).
pub const EVENT_QUEUE_DEPTH: usize = 8;

// BLE

/// Advertising interval (in 0.625 ms units). 400 = 250 ms.
pub const BLE_ADV_INTERVAL: u32 = 400;

/// Preferred connection interval range (in 1.25 ms units).
/// Notifications go out once per second, so a relaxed interval is fine.
pub const BLE_CONN_INTERVAL_MIN: u16 = 80;
pub const BLE_CONN_INTERVAL_MAX: u16 = 160;

/// BLE slave latency (number of connection events the peripheral can skip).
pub const BLE_SLAVE_LATENCY: u16 = 0;

/// BLE supervision timeout (in 10 ms units). 400 = 4 s.
pub const BLE_SUP_TIMEOUT: u16 = 400;

/// ATT MTU. Every characteristic value is a single byte, the default is plenty.
pub const BLE_ATT_MTU: u16 = 23;

/// Radio TX power (dBm).
pub const BLE_TX_POWER_DBM: i8 = 0;

// GATT

/// Vendor-specific 128-bit base UUID, little-endian as the SoftDevice
/// expects it.  Bytes 12..14 are replaced by the 16-bit short UUIDs below.
///
/// Base: `c9b40000-5f0e-4c2a-9d1b-3e7a2f6d8e51`
pub const VENDOR_UUID_BASE: [u8; 16] = [
    0x51, 0x8e, 0x6d, 0x2f, 0x7a, 0x3e, 0x1b, 0x9d, //
    0x2a, 0x4c, 0x0e, 0x5f, 0x00, 0x00, 0xb4, 0xc9,
];

/// Short UUID of the sensor service (shared by both service instances).
pub const VENDOR_UUID_SENSOR_SERVICE: u16 = 0x0001;

/// Short UUID of the relative humidity characteristic.
pub const VENDOR_UUID_HUMID_CHAR: u16 = 0x0002;

/// Short UUID of the temperature characteristic.
pub const VENDOR_UUID_TEMP_CHAR: u16 = 0x0003;

/// Bluetooth SIG unit: thermodynamic temperature, degree Celsius.
pub const UNIT_DEGREE_CELSIUS: u16 = 0x272F;

/// Bluetooth SIG unit: percentage.
pub const UNIT_PERCENTAGE: u16 = 0x27AD;

// Sensor (HTU21D)

/// 7-bit I²C address of the HTU21D.
pub const HTU21_ADDRESS: u8 = 0x40;

/// Settle time after a soft reset (ms). Datasheet: < 15 ms.
pub const HTU21_RESET_DELAY_MS: u32 = 15;

// GPIO pin assignments (nRF52840-DK defaults)
//
// These are logical names; actual `embassy_nrf::peripherals::*` types are
// selected in `main.rs`.  Adjust for your custom PCB.
//
//   I²C SDA        → P0.26
//   I²C SCL        → P0.27
//   Status LED     → P0.13 (LED1, active low)

/// Status LED blink period while advertising (ms).
pub const LED_BLINK_PERIOD_MS: u64 = 1000;

/// Status LED on-time within one blink period (ms).
pub const LED_BLINK_ON_MS: u64 = 50;
