//! Recording test doubles for the sensor, BLE binding and tick source.

use crate::error::SensorError;
use crate::gatt::{CharacteristicId, Notifier};
use crate::reading::{Celsius, Percentage};
use crate::sensor::SensorDriver;
use crate::service::Context;
use crate::tick::{TickSource, TickState};

/// Sensor whose next outcome per quantity is set by the test.
pub struct MockSensor {
    pub humidity: Result<Percentage, SensorError>,
    pub temperature: Result<Celsius, SensorError>,
    /// Every sample request, in call order.
    pub calls: Vec<CharacteristicId>,
}

impl MockSensor {
    pub fn new(humidity: u8, temperature: i8) -> Self {
        Self {
            humidity: Ok(Percentage::saturating(humidity as i32)),
            temperature: Ok(Celsius::new(temperature)),
            calls: Vec::new(),
        }
    }

    pub fn failing() -> Self {
        Self {
            humidity: Err(SensorError::Bus),
            temperature: Err(SensorError::Bus),
            calls: Vec::new(),
        }
    }
}

impl SensorDriver for MockSensor {
    fn sample_humidity(&mut self) -> Result<Percentage, SensorError> {
        self.calls.push(CharacteristicId::Humidity);
        self.humidity
    }

    fn sample_temperature(&mut self) -> Result<Celsius, SensorError> {
        self.calls.push(CharacteristicId::Temperature);
        self.temperature
    }
}

#[derive(Default)]
pub struct MockNotifier {
    pub sent: Vec<(CharacteristicId, Vec<u8>)>,
}

impl MockNotifier {
    pub fn count_for(&self, id: CharacteristicId) -> usize {
        self.sent.iter().filter(|(c, _)| *c == id).count()
    }
}

impl Notifier for MockNotifier {
    fn notify(&mut self, characteristic: CharacteristicId, value: &[u8]) {
        self.sent.push((characteristic, value.to_vec()));
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickCall {
    Start,
    Stop,
    Clear,
}

pub struct MockTick {
    state: TickState,
    epoch: u32,
    pub calls: Vec<TickCall>,
}

impl Default for MockTick {
    fn default() -> Self {
        Self {
            state: TickState::Disarmed,
            epoch: 0,
            calls: Vec::new(),
        }
    }
}

impl TickSource for MockTick {
    fn start(&mut self) {
        self.calls.push(TickCall::Start);
        self.state = TickState::Armed;
    }

    fn stop(&mut self) {
        self.calls.push(TickCall::Stop);
        self.state = TickState::Disarmed;
        self.epoch += 1;
    }

    fn clear(&mut self) {
        self.calls.push(TickCall::Clear);
        self.epoch += 1;
    }

    fn state(&self) -> TickState {
        self.state
    }

    fn epoch(&self) -> u32 {
        self.epoch
    }
}

/// Owns one of each double so a `Context` can be borrowed from it.
pub struct Rig {
    pub sensor: MockSensor,
    pub notifier: MockNotifier,
    pub tick: MockTick,
}

impl Rig {
    pub fn new(humidity: u8, temperature: i8) -> Self {
        Self::with_sensor(MockSensor::new(humidity, temperature))
    }

    pub fn with_sensor(sensor: MockSensor) -> Self {
        Self {
            sensor,
            notifier: MockNotifier::default(),
            tick: MockTick::default(),
        }
    }

    pub fn ctx(&mut self) -> Context<'_> {
        Context {
            sensor: &mut self.sensor,
            notifier: &mut self.notifier,
            tick: &mut self.tick,
        }
    }
}
