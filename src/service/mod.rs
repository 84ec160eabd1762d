//! Sensor services - each bridges one physical quantity to one GATT
//! characteristic and decides when to sample and whether to push.
//!
//! ```text
//!                 on_connect   on_disconnect   on_read        on_tick
//! Humidity        update       -               sample+cache   update
//! Temperature     update,      tick stop       sample+cache   update
//!                 tick clear+start
//! ```
//!
//! "update" = sample; on success cache the reading and notify it.  A
//! failed sample leaves the cache untouched and emits nothing; the next
//! tick or read retries implicitly.  The cache is never reset, so a stale
//! value survives any number of later failures.


use crate::error::SensorError;
use crate::gatt::{CharacteristicId, Notifier};
use crate::reading::{Celsius, CharacteristicValue, Encode, Percentage};
use crate::sensor::SensorDriver;
use crate::tick::TickSource;

/// Collaborators a handler may touch, borrowed for one event.
pub struct Context<'a> {
    pub sensor: &'a mut dyn SensorDriver,
    pub notifier: &'a mut dyn Notifier,
    pub tick: &'a mut dyn TickSource,
}

/// Common capability of every sensor service.
pub trait SensorService {
    /// Characteristic this service is bound to.
    fn characteristic(&self) -> CharacteristicId;

    /// A central connected: push a fresh value right away.
    fn on_connect(&mut self, ctx: &mut Context<'_>);

    /// The central went away.
    fn on_disconnect(&mut self, _ctx: &mut Context<'_>) {}

    /// Answer a read request with a freshly sampled value.
    ///
    /// `None` means the sample failed; the binding answers the request
    /// with an error.
    fn on_read(&mut self, ctx: &mut Context<'_>) -> Option<CharacteristicValue>;

    /// Periodic tick from the dispatcher.
    fn on_tick(&mut self, ctx: &mut Context<'_>);

    /// Encoded last known reading, if any sample ever succeeded.
    fn last_value(&self) -> Option<CharacteristicValue>;
}

/// Sample-and-push shared by connect and tick handlers.
fn update<R: Encode>(
    last: &mut Option<R>,
    characteristic: CharacteristicId,
    sample: Result<R, SensorError>,
    notifier: &mut dyn Notifier,
) {
    match sample {
        Ok(reading) => {
            *last = Some(reading);
            notifier.notify(characteristic, reading.encode().as_bytes());
        }
        Err(e) => debug!("{}: sample failed ({}), keeping last value", characteristic, e),
    }
}

/// Sample-and-cache for read requests.  No notify: the value travels in
/// the read response.
fn read<R: Encode>(
    last: &mut Option<R>,
    characteristic: CharacteristicId,
    sample: Result<R, SensorError>,
) -> Option<CharacteristicValue> {
    match sample {
        Ok(reading) => {
            *last = Some(reading);
            Some(reading.encode())
        }
        Err(e) => {
            debug!("{}: read sample failed ({})", characteristic, e);
            None
        }
    }
}

// Humidity

/// Relative humidity service.  Never touches the tick source.
#[derive(Debug, Default)]
pub struct HumidityService {
    last_reading: Option<Percentage>,
}

impl HumidityService {
    pub const fn new() -> Self {
        Self { last_reading: None }
    }

    pub fn last_reading(&self) -> Option<Percentage> {
        self.last_reading
    }

    fn update(&mut self, ctx: &mut Context<'_>) {
        let sample = ctx.sensor.sample_humidity();
        update(
            &mut self.last_reading,
            CharacteristicId::Humidity,
            sample,
            ctx.notifier,
        );
    }
}

impl SensorService for HumidityService {
    fn characteristic(&self) -> CharacteristicId {
        CharacteristicId::Humidity
    }

    fn on_connect(&mut self, ctx: &mut Context<'_>) {
        self.update(ctx);
    }

    fn on_read(&mut self, ctx: &mut Context<'_>) -> Option<CharacteristicValue> {
        let sample = ctx.sensor.sample_humidity();
        read(&mut self.last_reading, CharacteristicId::Humidity, sample)
    }

    fn on_tick(&mut self, ctx: &mut Context<'_>) {
        self.update(ctx);
    }

    fn last_value(&self) -> Option<CharacteristicValue> {
        self.last_reading.map(Encode::encode)
    }
}

// Temperature

/// Temperature service.  Sole owner of the shared tick source: its
/// connection lifecycle arms and disarms periodic sampling for both
/// services.
#[derive(Debug, Default)]
pub struct TemperatureService {
    last_reading: Option<Celsius>,
}

impl TemperatureService {
    pub const fn new() -> Self {
        Self { last_reading: None }
    }

    pub fn last_reading(&self) -> Option<Celsius> {
        self.last_reading
    }

    fn update(&mut self, ctx: &mut Context<'_>) {
        let sample = ctx.sensor.sample_temperature();
        update(
            &mut self.last_reading,
            CharacteristicId::Temperature,
            sample,
            ctx.notifier,
        );
    }
}

impl SensorService for TemperatureService {
    fn characteristic(&self) -> CharacteristicId {
        CharacteristicId::Temperature
    }

    fn on_connect(&mut self, ctx: &mut Context<'_>) {
        self.update(ctx);
        ctx.tick.clear();
        ctx.tick.start();
        info!("Tick source armed");
    }

    fn on_disconnect(&mut self, ctx: &mut Context<'_>) {
        ctx.tick.stop();
        info!("Tick source disarmed");
    }

    fn on_read(&mut self, ctx: &mut Context<'_>) -> Option<CharacteristicValue> {
        let sample = ctx.sensor.sample_temperature();
        read(&mut self.last_reading, CharacteristicId::Temperature, sample)
    }

    fn on_tick(&mut self, ctx: &mut Context<'_>) {
        self.update(ctx);
    }

    fn last_value(&self) -> Option<CharacteristicValue> {
        self.last_reading.map(Encode::encode)
    }
}

// Closed set

/// Every service variant this firmware knows about.
#[derive(Debug)]
pub enum AnyService {
    Humidity(HumidityService),
    Temperature(TemperatureService),
}

impl AnyService {
    fn inner(&mut self) -> &mut dyn SensorService {
        match self {
            AnyService::Humidity(s) => s,
            AnyService::Temperature(s) => s,
        }
    }
}

impl SensorService for AnyService {
    fn characteristic(&self) -> CharacteristicId {
        match self {
            AnyService::Humidity(s) => s.characteristic(),
            AnyService::Temperature(s) => s.characteristic(),
        }
    }

    fn on_connect(&mut self, ctx: &mut Context<'_>) {
        self.inner().on_connect(ctx)
    }

    fn on_disconnect(&mut self, ctx: &mut Context<'_>) {
        self.inner().on_disconnect(ctx)
    }

    fn on_read(&mut self, ctx: &mut Context<'_>) -> Option<CharacteristicValue> {
        self.inner().on_read(ctx)
    }

    fn on_tick(&mut self, ctx: &mut Context<'_>) {
        self.inner().on_tick(ctx)
    }

    fn last_value(&self) -> Option<CharacteristicValue> {
        match self {
            AnyService::Humidity(s) => s.last_value(),
            AnyService::Temperature(s) => s.last_value(),
        }
    }
}
