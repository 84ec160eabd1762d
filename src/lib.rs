//! Host-testable core of the temprh firmware.
//!
//! Everything in here is free of SoftDevice and executor types: the
//! sensor services, the scheduler that owns them, the HTU21 driver
//! (generic over `embedded-hal`), advertising payload and LED policy.
//!
//! Usage: `cargo test --lib` / `cargo test`
//!
//! Note: The embedded binary uses main.rs with #![no_std] and #![no_main]
//! and pulls this crate in with the `embedded` feature.

#![cfg_attr(not(test), no_std)]

// This must go FIRST so that all the other modules see its macros.
#[macro_use]
mod fmt;

pub mod advertising;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod gatt;
pub mod indicator;
pub mod reading;
pub mod sensor;
pub mod service;
pub mod tick;

#[cfg(test)]
mod mock;

pub use dispatch::{Registry, Scheduler, TickDispatcher};
pub use error::{BleError, Error, SensorError};
pub use events::{Event, EventQueue, ReadReply, ReadRequest, TickProducer};
pub use gatt::{CharacteristicId, Notifier};
pub use reading::{Celsius, CharacteristicValue, Percentage};
pub use sensor::SensorDriver;
pub use service::{AnyService, Context, HumidityService, SensorService, TemperatureService};
pub use tick::{TickEpoch, TickSource, TickState};
