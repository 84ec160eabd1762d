//! Scheduler event queue.
//!
//! The BLE binding and the tick source are producers; a single
//! scheduler drains the queue and runs every handler to completion, so
//! the cached readings are never touched from two contexts at once.
//! The queue is guarded by a critical section, which makes `try_send`
//! safe from interrupt context.

use crate::gatt::CharacteristicId;
use crate::reading::CharacteristicValue;
use crate::tick::TickEpoch;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, Sender};

/// Everything the scheduler reacts to.
///
/// `R` is the binding's handle for answering a pending read request.
pub enum Event<R> {
    /// A central connected.
    Connected,
    /// The central disconnected.
    Disconnected,
    /// One period of the shared tick source elapsed, in `epoch`.
    Tick { epoch: u32 },
    /// A central is waiting for a characteristic value.
    Read(ReadRequest<R>),
}

/// Deferred characteristic read.
pub struct ReadRequest<R> {
    pub characteristic: CharacteristicId,
    pub reply: R,
}

/// Completes a deferred read.  `None` means the sample failed and the
/// binding should answer with an error.
pub trait ReadReply {
    fn reply(self, value: Option<CharacteristicValue>);
}

/// Bounded multi-producer, single-consumer event queue.
pub type EventQueue<R, const DEPTH: usize> = Channel<CriticalSectionRawMutex, Event<R>, DEPTH>;

/// Producer half handed to the tick source.
///
/// Ticks are never queued behind each other: when the queue is full the
/// tick is dropped instead of being delivered late in a burst.
pub struct TickProducer<'a, R, const DEPTH: usize> {
    sender: Sender<'a, CriticalSectionRawMutex, Event<R>, DEPTH>,
    epoch: &'a TickEpoch,
}

impl<'a, R, const DEPTH: usize> TickProducer<'a, R, DEPTH> {
    pub fn new(queue: &'a EventQueue<R, DEPTH>, epoch: &'a TickEpoch) -> Self {
        Self {
            sender: queue.sender(),
            epoch,
        }
    }

    /// Emit one tick stamped with the current epoch.  Returns `false` if
    /// it had to be dropped.
    pub fn tick(&self) -> bool {
        let event = Event::Tick {
            epoch: self.epoch.current(),
        };
        if self.sender.try_send(event).is_err() {
            warn!("Event queue full - dropping tick");
            return false;
        }
        true
    }
}
