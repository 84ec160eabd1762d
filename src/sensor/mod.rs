//! Sensor driver seam.
//!
//! The services only ever see [`SensorDriver`]: two blocking operations
//! that either produce a raw reading or report a transient failure.
//! [`htu21::Htu21`] is the concrete driver used on target.

pub mod htu21;

use crate::error::SensorError;
use crate::reading::{Celsius, Percentage};

/// Blocking access to the combined humidity / temperature sensor.
///
/// Both calls are made from the scheduler task, so their worst-case
/// duration bounds how quickly the next event is handled.
pub trait SensorDriver {
    fn sample_humidity(&mut self) -> Result<Percentage, SensorError>;

    fn sample_temperature(&mut self) -> Result<Celsius, SensorError>;
}

impl<S: SensorDriver + ?Sized> SensorDriver for &mut S {
    fn sample_humidity(&mut self) -> Result<Percentage, SensorError> {
        (**self).sample_humidity()
    }

    fn sample_temperature(&mut self) -> Result<Celsius, SensorError> {
        (**self).sample_temperature()
    }
}
