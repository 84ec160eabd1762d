//! Integration tests for temprh host-testable logic.
//!
//! The scheduler runs against the real HTU21 driver on a scripted I²C
//! bus, so every sample goes through framing, CRC and conversion.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use embassy_sync::channel::Channel;
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};
use temprh::config::{HTU21_ADDRESS, HTU21_RESET_DELAY_MS};
use temprh::sensor::htu21::{Htu21, CMD_HUMIDITY_HOLD, CMD_SOFT_RESET, CMD_TEMPERATURE_HOLD};
use temprh::{
    CharacteristicId, CharacteristicValue, Error, Event, EventQueue, Notifier, ReadReply,
    ReadRequest, Scheduler, SensorError, TickEpoch, TickProducer, TickSource, TickState,
};

// ═══════════════════════════════════════════════════════════════════════════
// Test doubles
// ═══════════════════════════════════════════════════════════════════════════

/// Humidity 45 %.
const RH_45: [u8; 3] = [0x68, 0x72, 0xF8];
/// Humidity 30 %.
const RH_30: [u8; 3] = [0x49, 0xBA, 0x2E];
/// Humidity 50 %.
const RH_50: [u8; 3] = [0x72, 0xB0, 0x5D];
/// Temperature 22 °C.
const T_22: [u8; 3] = [0x64, 0x4C, 0x96];
/// Temperature 23 °C.
const T_23: [u8; 3] = [0x65, 0xC4, 0xA1];
/// Temperature -10 °C.
const T_MINUS_10: [u8; 3] = [0x35, 0xAC, 0x44];

#[derive(Default)]
struct BusState {
    script: VecDeque<Option<[u8; 3]>>,
    commands: Vec<u8>,
    nack_writes: bool,
}

/// I²C bus answering each measurement with the next scripted frame.
/// `None` in the script NACKs the transfer.  Clones share state, so the
/// test keeps a handle after the driver took the bus.
#[derive(Clone, Default)]
struct ScriptedBus(Rc<RefCell<BusState>>);

impl ScriptedBus {
    fn push(&self, frame: [u8; 3]) {
        self.0.borrow_mut().script.push_back(Some(frame));
    }

    fn push_nack(&self) {
        self.0.borrow_mut().script.push_back(None);
    }

    fn nack_writes(&self) {
        self.0.borrow_mut().nack_writes = true;
    }

    fn pending(&self) -> usize {
        self.0.borrow().script.len()
    }

    fn take_commands(&self) -> Vec<u8> {
        std::mem::take(&mut self.0.borrow_mut().commands)
    }
}

impl ErrorType for ScriptedBus {
    type Error = ErrorKind;
}

impl I2c for ScriptedBus {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        assert_eq!(address, HTU21_ADDRESS);
        let mut state = self.0.borrow_mut();
        for op in operations {
            match op {
                Operation::Write(_) if state.nack_writes => {
                    return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address))
                }
                Operation::Write(bytes) => state.commands.extend_from_slice(bytes),
                Operation::Read(buf) => match state.script.pop_front().flatten() {
                    Some(frame) => buf.copy_from_slice(&frame[..buf.len()]),
                    None => return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data)),
                },
            }
        }
        Ok(())
    }
}

/// Delay that only adds up what it was asked to wait.
#[derive(Default)]
struct CountingDelay {
    waited_ns: u64,
}

impl DelayNs for CountingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.waited_ns += ns as u64;
    }
}

#[derive(Default)]
struct RecordingNotifier {
    sent: Vec<(CharacteristicId, u8)>,
}

impl RecordingNotifier {
    fn latest(&self, id: CharacteristicId) -> Option<u8> {
        self.sent.iter().rev().find(|(c, _)| *c == id).map(|(_, v)| *v)
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&mut self, characteristic: CharacteristicId, value: &[u8]) {
        assert_eq!(value.len(), 1, "values are single bytes");
        self.sent.push((characteristic, value[0]));
    }
}

/// Tick source sharing its epoch with the test's `TickProducer`.
struct FakeTick {
    state: TickState,
    epoch: Rc<TickEpoch>,
}

impl FakeTick {
    fn new(epoch: Rc<TickEpoch>) -> Self {
        Self {
            state: TickState::Disarmed,
            epoch,
        }
    }
}

impl TickSource for FakeTick {
    fn start(&mut self) {
        self.state = TickState::Armed;
    }

    fn stop(&mut self) {
        self.state = TickState::Disarmed;
        self.epoch.advance();
    }

    fn clear(&mut self) {
        self.epoch.advance();
    }

    fn state(&self) -> TickState {
        self.state
    }

    fn epoch(&self) -> u32 {
        self.epoch.current()
    }
}

/// Captures the answer to a deferred read.  Outer `None`: not answered.
#[derive(Clone, Default)]
struct ReplySlot(Rc<Cell<Option<Option<CharacteristicValue>>>>);

impl ReplySlot {
    fn answer(&self) -> Option<Option<CharacteristicValue>> {
        self.0.get()
    }
}

impl ReadReply for ReplySlot {
    fn reply(self, value: Option<CharacteristicValue>) {
        self.0.set(Some(value));
    }
}

type Rig = Scheduler<Htu21<ScriptedBus>, RecordingNotifier, FakeTick>;

fn rig(bus: &ScriptedBus) -> Rig {
    rig_with_epoch(bus, Rc::default())
}

fn rig_with_epoch(bus: &ScriptedBus, epoch: Rc<TickEpoch>) -> Rig {
    Scheduler::new(
        Htu21::new(bus.clone()),
        RecordingNotifier::default(),
        FakeTick::new(epoch),
    )
}

fn byte(value: Option<CharacteristicValue>) -> Option<u8> {
    value.map(|v| v.as_bytes()[0])
}

// ═══════════════════════════════════════════════════════════════════════════
// Scenarios
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn connect_publishes_both_values_and_ticks_renotify() {
    let b = ScriptedBus::default();
    // connect: humidity, temperature
    b.push(RH_45);
    b.push(T_22);
    // two ticks: temperature, humidity
    for _ in 0..2 {
        b.push(T_22);
        b.push(RH_45);
    }
    let mut s = rig(&b);

    s.connect();
    assert_eq!(byte(s.last_value(CharacteristicId::Humidity)), Some(45));
    assert_eq!(byte(s.last_value(CharacteristicId::Temperature)), Some(22));
    assert_eq!(s.binding().sent.len(), 2);

    s.tick();
    s.tick();

    assert_eq!(s.binding().sent.len(), 6);
    assert_eq!(s.binding().latest(CharacteristicId::Humidity), Some(45));
    assert_eq!(s.binding().latest(CharacteristicId::Temperature), Some(22));
}

#[test]
fn failed_tick_keeps_values_and_next_tick_recovers() {
    let b = ScriptedBus::default();
    b.push(RH_45);
    b.push(T_22);
    // tick N: both fail
    b.push_nack();
    b.push_nack();
    // tick N+1: new values
    b.push(T_23);
    b.push(RH_50);
    let mut s = rig(&b);
    s.connect();

    s.tick();
    assert_eq!(s.binding().sent.len(), 2, "no notify for a failed tick");
    assert_eq!(byte(s.last_value(CharacteristicId::Humidity)), Some(45));
    assert_eq!(byte(s.last_value(CharacteristicId::Temperature)), Some(22));

    s.tick();
    assert_eq!(s.binding().sent.len(), 4);
    assert_eq!(byte(s.last_value(CharacteristicId::Humidity)), Some(50));
    assert_eq!(byte(s.last_value(CharacteristicId::Temperature)), Some(23));
}

#[test]
fn read_before_any_connect_returns_fresh_single_byte() {
    let b = ScriptedBus::default();
    b.push(RH_30);
    let mut s = rig(&b);

    let value = s.read(CharacteristicId::Humidity);

    assert_eq!(value.map(|v| v.as_bytes().to_vec()), Some(vec![30]));
    assert!(s.binding().sent.is_empty(), "reads never notify");
}

#[test]
fn temperature_disconnect_stops_humidity_ticks() {
    let b = ScriptedBus::default();
    b.push(RH_45);
    b.push(T_22);
    let mut s = rig(&b);
    s.connect();
    assert_eq!(s.tick_state(), TickState::Armed);

    s.disconnect();
    let before = s.binding().sent.len();
    s.tick();

    assert_eq!(s.tick_state(), TickState::Disarmed);
    assert_eq!(s.binding().sent.len(), before);
    assert_eq!(b.pending(), 0);
}

// ═══════════════════════════════════════════════════════════════════════════
// Bus-level ordering
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn tick_measures_temperature_then_humidity() {
    let b = ScriptedBus::default();
    b.push(RH_45);
    b.push(T_22);
    b.push(T_MINUS_10);
    b.push(RH_30);
    let mut s = rig(&b);
    s.connect();
    assert_eq!(b.take_commands(), [CMD_HUMIDITY_HOLD, CMD_TEMPERATURE_HOLD]);

    s.tick();

    assert_eq!(b.take_commands(), [CMD_TEMPERATURE_HOLD, CMD_HUMIDITY_HOLD]);
    assert_eq!(
        byte(s.last_value(CharacteristicId::Temperature)),
        Some((-10i8) as u8)
    );
    assert_eq!(byte(s.last_value(CharacteristicId::Humidity)), Some(30));
}

#[test]
fn corrupted_frame_is_not_published() {
    let b = ScriptedBus::default();
    let mut bad = RH_45;
    bad[2] ^= 0x01;
    b.push(bad);
    b.push(T_22);
    let mut s = rig(&b);

    s.connect();

    assert!(s.last_value(CharacteristicId::Humidity).is_none());
    assert_eq!(s.binding().latest(CharacteristicId::Temperature), Some(22));
    assert_eq!(s.binding().latest(CharacteristicId::Humidity), None);
}

#[test]
fn reset_sends_soft_reset_and_waits() {
    let b = ScriptedBus::default();
    let mut sensor = Htu21::new(b.clone());
    let mut delay = CountingDelay::default();

    assert!(sensor.reset(&mut delay).is_ok());

    assert_eq!(b.take_commands(), [CMD_SOFT_RESET]);
    assert!(delay.waited_ns >= HTU21_RESET_DELAY_MS as u64 * 1_000_000);
}

#[test]
fn reset_on_silent_bus_reports_sensor_error() {
    let b = ScriptedBus::default();
    b.nack_writes();
    let mut sensor = Htu21::new(b.clone());
    let mut delay = CountingDelay::default();

    assert_eq!(
        sensor.reset(&mut delay),
        Err(Error::Sensor(SensorError::Bus))
    );
    assert_eq!(delay.waited_ns, 0);
}

// ═══════════════════════════════════════════════════════════════════════════
// Event queue
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn queued_events_are_handled_in_order() {
    let queue: EventQueue<ReplySlot, 8> = Channel::new();
    let epoch = Rc::new(TickEpoch::new());
    let b = ScriptedBus::default();
    b.push(RH_45);
    b.push(T_22);
    b.push(T_23);
    b.push(RH_50);
    b.push(T_MINUS_10);
    let mut s = rig_with_epoch(&b, epoch.clone());
    let producer = TickProducer::new(&queue, &epoch);
    let slot = ReplySlot::default();

    assert!(queue.try_send(Event::Connected).is_ok());
    assert_eq!(s.drain(&queue), 1);

    assert!(producer.tick());
    assert!(queue
        .try_send(Event::Read(ReadRequest {
            characteristic: CharacteristicId::Temperature,
            reply: slot.clone(),
        }))
        .is_ok());
    assert!(queue.try_send(Event::Disconnected).is_ok());
    assert!(producer.tick());

    assert_eq!(s.drain(&queue), 4);
    assert_eq!(slot.answer().map(byte), Some(Some((-10i8) as u8)));
    assert_eq!(byte(s.last_value(CharacteristicId::Humidity)), Some(50));
    assert_eq!(s.tick_state(), TickState::Disarmed);
    assert_eq!(s.binding().sent.len(), 4, "tick after disconnect is stale");
    assert_eq!(b.pending(), 0);
}

#[test]
fn failed_read_is_answered_with_none() {
    let queue: EventQueue<ReplySlot, 4> = Channel::new();
    let b = ScriptedBus::default();
    b.push_nack();
    let mut s = rig(&b);
    let slot = ReplySlot::default();

    assert!(queue
        .try_send(Event::Read(ReadRequest {
            characteristic: CharacteristicId::Humidity,
            reply: slot.clone(),
        }))
        .is_ok());
    s.drain(&queue);

    assert_eq!(slot.answer(), Some(None));
}

#[test]
fn tick_is_dropped_when_queue_is_full() {
    let queue: EventQueue<ReplySlot, 2> = Channel::new();
    let epoch = TickEpoch::new();
    let producer = TickProducer::new(&queue, &epoch);

    assert!(producer.tick());
    assert!(producer.tick());
    assert!(!producer.tick());
    assert_eq!(queue.len(), 2);
}

#[test]
fn ticks_queued_before_disconnect_are_discarded() {
    let queue: EventQueue<ReplySlot, 4> = Channel::new();
    let epoch = Rc::new(TickEpoch::new());
    let b = ScriptedBus::default();
    b.push(RH_45);
    b.push(T_22);
    let mut s = rig_with_epoch(&b, epoch.clone());
    s.connect();

    let producer = TickProducer::new(&queue, &epoch);
    producer.tick();
    producer.tick();
    s.disconnect();

    assert_eq!(s.drain(&queue), 2);
    assert_eq!(s.binding().sent.len(), 2);
}

#[test]
fn tick_queued_while_disconnected_does_not_fire_after_reconnect() {
    let queue: EventQueue<ReplySlot, 4> = Channel::new();
    let epoch = Rc::new(TickEpoch::new());
    let b = ScriptedBus::default();
    for _ in 0..2 {
        b.push(RH_45);
        b.push(T_22);
    }
    let mut s = rig_with_epoch(&b, epoch.clone());
    let producer = TickProducer::new(&queue, &epoch);

    s.connect();
    s.disconnect();
    assert_eq!(s.drain(&queue), 0);

    // The timer fires once more before it sees the stop.
    assert!(producer.tick());

    s.connect();
    let after_connect = s.binding().sent.len();
    assert_eq!(s.drain(&queue), 1);

    assert_eq!(after_connect, 4);
    assert_eq!(s.binding().sent.len(), after_connect, "no notify before a full period");
    assert_eq!(b.pending(), 0);
}

#[test]
fn reconnect_rearms_ticks() {
    let b = ScriptedBus::default();
    for _ in 0..2 {
        b.push(RH_45);
        b.push(T_22);
    }
    b.push(T_23);
    b.push(RH_50);
    let mut s = rig(&b);

    s.connect();
    s.disconnect();
    s.connect();
    s.tick();

    assert_eq!(s.tick_state(), TickState::Armed);
    assert_eq!(s.binding().latest(CharacteristicId::Temperature), Some(23));
    assert_eq!(s.binding().latest(CharacteristicId::Humidity), Some(50));
}
