//! Shared 1 Hz tick source on top of `embassy_time::Ticker`.
//!
//! [`TickerSource`] lives inside the scheduler and forwards start / stop
//! / clear to [`tick_task`] through a signal.  The task turns every
//! elapsed period into an `Event::Tick` on the scheduler queue, stamped
//! with the epoch the source is in.

use defmt::{debug, Format};
use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Ticker};
use temprh::config::{EVENT_QUEUE_DEPTH, TICK_HZ};
use temprh::events::TickProducer;
use temprh::tick::{TickEpoch, TickSource, TickState};

use crate::ble::server::GattReadReply;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Format)]
pub enum TickCommand {
    Start,
    Stop,
    Clear,
}

pub type TickControl = Signal<CriticalSectionRawMutex, TickCommand>;

/// Scheduler-side handle of the tick task.
pub struct TickerSource {
    control: &'static TickControl,
    epoch: &'static TickEpoch,
    state: TickState,
}

impl TickerSource {
    pub fn new(control: &'static TickControl, epoch: &'static TickEpoch) -> Self {
        Self {
            control,
            epoch,
            state: TickState::Disarmed,
        }
    }
}

impl TickSource for TickerSource {
    fn start(&mut self) {
        self.state = TickState::Armed;
        self.control.signal(TickCommand::Start);
    }

    fn stop(&mut self) {
        self.state = TickState::Disarmed;
        self.epoch.advance();
        self.control.signal(TickCommand::Stop);
    }

    fn clear(&mut self) {
        self.epoch.advance();
        self.control.signal(TickCommand::Clear);
    }

    fn state(&self) -> TickState {
        self.state
    }

    fn epoch(&self) -> u32 {
        self.epoch.current()
    }
}

#[embassy_executor::task]
pub async fn tick_task(
    control: &'static TickControl,
    producer: TickProducer<'static, GattReadReply, EVENT_QUEUE_DEPTH>,
) -> ! {
    loop {
        // Disarmed: only a start gets us going.
        while control.wait().await != TickCommand::Start {}
        debug!("Tick source armed");

        let mut ticker = Ticker::every(Duration::from_hz(TICK_HZ));
        loop {
            // Commands win over a period that elapsed at the same time.
            match select(control.wait(), ticker.next()).await {
                Either::First(TickCommand::Stop) => break,
                Either::First(TickCommand::Start | TickCommand::Clear) => ticker.reset(),
                Either::Second(()) => {
                    producer.tick();
                }
            }
        }
        debug!("Tick source disarmed");
    }
}
