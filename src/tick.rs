//! Periodic tick source seam.
//!
//! A single shared 1 Hz source drives periodic sampling.  Only the
//! temperature service arms and disarms it (see `service`), so the
//! humidity service ticks exactly while the temperature service's
//! central is connected.
//!
//! Every `clear` and `stop` opens a new epoch.  Ticks carry the epoch
//! they were produced in, so one that was already queued when the
//! source got cleared or stopped is recognised as stale and dropped.

use core::sync::atomic::{AtomicU32, Ordering};

/// Armed state of the shared tick source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TickState {
    Armed,
    Disarmed,
}

/// Start / stop / clear control over the periodic tick.
pub trait TickSource {
    /// Arm the source; the first tick follows one full period later.
    fn start(&mut self);

    /// Disarm the source; no tick is produced until the next `start`.
    fn stop(&mut self);

    /// Reset the period counter so the next tick is a full period away.
    fn clear(&mut self);

    fn state(&self) -> TickState;

    /// Current epoch; advanced by every `clear` and `stop`.
    fn epoch(&self) -> u32;

    fn is_armed(&self) -> bool {
        self.state() == TickState::Armed
    }
}

impl<T: TickSource + ?Sized> TickSource for &mut T {
    fn start(&mut self) {
        (**self).start()
    }

    fn stop(&mut self) {
        (**self).stop()
    }

    fn clear(&mut self) {
        (**self).clear()
    }

    fn state(&self) -> TickState {
        (**self).state()
    }

    fn epoch(&self) -> u32 {
        (**self).epoch()
    }
}

/// Epoch counter shared between a tick source and its producer.
///
/// Only the source advances it; the producer stamps ticks with it.
#[derive(Debug, Default)]
pub struct TickEpoch(AtomicU32);

impl TickEpoch {
    pub const fn new() -> Self {
        Self(AtomicU32::new(0))
    }

    pub fn current(&self) -> u32 {
        self.0.load(Ordering::Acquire)
    }

    /// Open the next epoch and return it.
    pub fn advance(&self) -> u32 {
        let next = self.current().wrapping_add(1);
        self.0.store(next, Ordering::Release);
        next
    }
}
