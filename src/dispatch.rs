//! Service registry, tick dispatcher and the scheduler that owns them.
//!
//! The scheduler is constructed once at startup and owns both services
//! plus the three collaborators (sensor, BLE binding, tick source).
//! Nothing is reachable through globals; the embedded binary hands the
//! scheduler to one task and feeds it events.
//!
//! Ordering:
//! - connect / disconnect fan out in registration order (humidity,
//!   temperature);
//! - a tick fans out temperature first, then humidity.

use crate::events::{Event, EventQueue, ReadReply};
use crate::gatt::{CharacteristicId, Notifier};
use crate::reading::CharacteristicValue;
use crate::sensor::SensorDriver;
use crate::service::{AnyService, Context, HumidityService, SensorService, TemperatureService};
use crate::tick::{TickSource, TickState};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Receiver;

/// Number of registered services.
pub const SERVICE_COUNT: usize = 2;

/// Fixed ordered collection of the registered services.
pub struct Registry {
    services: [AnyService; SERVICE_COUNT],
}

impl Registry {
    /// Registers humidity first, then temperature.
    pub const fn new() -> Self {
        Self {
            services: [
                AnyService::Humidity(HumidityService::new()),
                AnyService::Temperature(TemperatureService::new()),
            ],
        }
    }

    pub fn get(&self, id: CharacteristicId) -> &AnyService {
        match id {
            CharacteristicId::Humidity => &self.services[0],
            CharacteristicId::Temperature => &self.services[1],
        }
    }

    pub fn get_mut(&mut self, id: CharacteristicId) -> &mut AnyService {
        match id {
            CharacteristicId::Humidity => &mut self.services[0],
            CharacteristicId::Temperature => &mut self.services[1],
        }
    }

    /// Services in registration order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut AnyService> {
        self.services.iter_mut()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/// Fan-out of one tick to every service's `on_tick`.
pub struct TickDispatcher;

impl TickDispatcher {
    /// Fixed tick order.
    pub const ORDER: [CharacteristicId; SERVICE_COUNT] =
        [CharacteristicId::Temperature, CharacteristicId::Humidity];

    /// Run every `on_tick` synchronously, once each, in [`Self::ORDER`].
    pub fn dispatch(registry: &mut Registry, ctx: &mut Context<'_>) {
        for id in Self::ORDER {
            registry.get_mut(id).on_tick(ctx);
        }
    }
}

/// Single-threaded owner of the services and their collaborators.
pub struct Scheduler<S, B, T> {
    services: Registry,
    sensor: S,
    binding: B,
    tick: T,
}

impl<S, B, T> Scheduler<S, B, T>
where
    S: SensorDriver,
    B: Notifier,
    T: TickSource,
{
    pub fn new(sensor: S, binding: B, tick: T) -> Self {
        Self {
            services: Registry::new(),
            sensor,
            binding,
            tick,
        }
    }

    /// Handle one event to completion.
    pub fn handle<R: ReadReply>(&mut self, event: Event<R>) {
        match event {
            Event::Connected => self.connect(),
            Event::Disconnected => self.disconnect(),
            Event::Tick { epoch } => self.tick_in(epoch),
            Event::Read(request) => {
                let value = self.read(request.characteristic);
                request.reply.reply(value);
            }
        }
    }

    pub fn connect(&mut self) {
        info!("Central connected");
        let (services, mut ctx) = self.split();
        for service in services.iter_mut() {
            service.on_connect(&mut ctx);
        }
    }

    pub fn disconnect(&mut self) {
        info!("Central disconnected");
        let (services, mut ctx) = self.split();
        for service in services.iter_mut() {
            service.on_disconnect(&mut ctx);
        }
    }

    /// Dispatch a tick produced in `epoch`.  Ticks from an epoch the
    /// source has since left (queued before a `clear` or `stop`) are
    /// discarded.
    pub fn tick_in(&mut self, epoch: u32) {
        if epoch != self.tick.epoch() {
            trace!("Stale tick from epoch {} - ignored", epoch);
            return;
        }
        self.tick();
    }

    /// Dispatch one tick of the current epoch.  Ignored while the source
    /// is disarmed, the hardware would not have fired it.
    pub fn tick(&mut self) {
        if self.tick.state() == TickState::Disarmed {
            trace!("Tick while disarmed - ignored");
            return;
        }
        let (services, mut ctx) = self.split();
        TickDispatcher::dispatch(services, &mut ctx);
    }

    pub fn read(&mut self, id: CharacteristicId) -> Option<CharacteristicValue> {
        let (services, mut ctx) = self.split();
        services.get_mut(id).on_read(&mut ctx)
    }

    /// Handle every event currently queued without waiting.  Returns the
    /// number of events handled.
    pub fn drain<R: ReadReply, const DEPTH: usize>(&mut self, queue: &EventQueue<R, DEPTH>) -> usize {
        let mut handled = 0;
        while let Ok(event) = queue.try_receive() {
            self.handle(event);
            handled += 1;
        }
        handled
    }

    /// Scheduler loop: wait for the next event, handle it, repeat.
    pub async fn run<R: ReadReply, const DEPTH: usize>(
        &mut self,
        events: Receiver<'_, CriticalSectionRawMutex, Event<R>, DEPTH>,
    ) -> ! {
        loop {
            let event = events.receive().await;
            self.handle(event);
        }
    }

    /// Encoded last known reading of one characteristic.
    pub fn last_value(&self, id: CharacteristicId) -> Option<CharacteristicValue> {
        self.services.get(id).last_value()
    }

    pub fn tick_state(&self) -> TickState {
        self.tick.state()
    }

    pub fn binding(&self) -> &B {
        &self.binding
    }

    pub fn binding_mut(&mut self) -> &mut B {
        &mut self.binding
    }

    pub fn sensor(&self) -> &S {
        &self.sensor
    }

    pub fn sensor_mut(&mut self) -> &mut S {
        &mut self.sensor
    }

    fn split(&mut self) -> (&mut Registry, Context<'_>) {
        (
            &mut self.services,
            Context {
                sensor: &mut self.sensor,
                notifier: &mut self.binding,
                tick: &mut self.tick,
            },
        )
    }
}
