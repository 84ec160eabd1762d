//! Status LED task.

use embassy_futures::select::{select, Either};
use embassy_nrf::gpio::Output;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Instant, Timer};
use temprh::indicator::{led_should_be_on, next_toggle_in_ms, LinkState};

pub type LinkSignal = Signal<CriticalSectionRawMutex, LinkState>;

/// Drive the (active-low) status LED from the link state.
#[embassy_executor::task]
pub async fn led_task(mut led: Output<'static>, link: &'static LinkSignal) -> ! {
    let mut state = LinkState::Advertising;
    let mut entered = Instant::now();

    loop {
        let elapsed = entered.elapsed().as_millis();
        if led_should_be_on(state, elapsed) {
            led.set_low();
        } else {
            led.set_high();
        }

        let toggle = async {
            match next_toggle_in_ms(state, elapsed) {
                Some(ms) => Timer::after_millis(ms).await,
                None => core::future::pending::<()>().await,
            }
        };
        if let Either::Second(next) = select(toggle, link.wait()).await {
            state = next;
            entered = Instant::now();
        }
    }
}
