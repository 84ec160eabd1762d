//! temprh firmware entry point (nRF52840 + SoftDevice S140 + HTU21D).
//!
//! Task layout:
//! - `softdevice_task`: SoftDevice event pump
//! - `tick_task`: shared 1 Hz tick source, feeds the event queue
//! - `led_task`: status LED
//! - `main`: advertise, then run the GATT server and the scheduler on the
//!   connection until the central goes away
//!
//! Build: `cargo build --release --features embedded`

#![no_std]
#![no_main]

mod ble;
mod led;
mod ticker;

use defmt::{debug, info, unwrap, warn};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_futures::select::{select, Either};
use embassy_nrf::gpio::{Level, Output, OutputDrive};
use embassy_nrf::interrupt::{self, InterruptExt, Priority};
use embassy_nrf::twim::{self, Twim};
use embassy_nrf::{bind_interrupts, peripherals};
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use embassy_time::{Delay, Duration, Timer};
use nrf_softdevice::ble::gatt_server;
use nrf_softdevice::Softdevice;
use panic_probe as _;
use temprh::config::{self, EVENT_QUEUE_DEPTH};
use temprh::events::{EventQueue, TickProducer};
use temprh::indicator::LinkState;
use temprh::tick::TickEpoch;
use temprh::sensor::htu21::Htu21;
use temprh::{advertising, Scheduler};

use crate::ble::server::{GattNotifier, GattReadReply, SensorServer};
use crate::led::LinkSignal;
use crate::ticker::{TickControl, TickerSource};

bind_interrupts!(struct Irqs {
    TWISPI0 => twim::InterruptHandler<peripherals::TWISPI0>;
});

static EVENTS: EventQueue<GattReadReply, EVENT_QUEUE_DEPTH> = Channel::new();
static TICK_CONTROL: TickControl = Signal::new();
static TICK_EPOCH: TickEpoch = TickEpoch::new();
static LINK: LinkSignal = Signal::new();

/// Peripheral interrupts must stay off the priorities the SoftDevice
/// reserves (0, 1, 4).
fn embassy_config() -> embassy_nrf::config::Config {
    let mut config = embassy_nrf::config::Config::default();
    config.lfclk_source = embassy_nrf::config::LfclkSource::ExternalXtal;
    config.gpiote_interrupt_priority = Priority::P2;
    config.time_interrupt_priority = Priority::P2;
    config
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("temprh starting");
    let p = embassy_nrf::init(embassy_config());

    // Sensor
    interrupt::TWISPI0.set_priority(Priority::P3);
    let mut i2c_config = twim::Config::default();
    i2c_config.frequency = twim::Frequency::K100;
    let i2c = Twim::new(p.TWISPI0, Irqs, p.P0_26, p.P0_27, i2c_config);
    let mut sensor = Htu21::new(i2c);
    if let Err(e) = sensor.reset(&mut Delay) {
        // Keep going: every later sample retries the bus.
        warn!("HTU21 reset failed: {}", e);
    }

    // BLE
    let sd = Softdevice::enable(&ble::softdevice_config());
    let server = unwrap!(SensorServer::new(sd, EVENTS.sender()));
    let sd: &'static Softdevice = sd;
    unwrap!(spawner.spawn(ble::softdevice_task(sd)));
    if let Err(e) = ble::set_preferred_conn_params() {
        warn!("Preferred connection parameters rejected: {}", e);
    }
    let adv_data = unwrap!(advertising::build(config::DEVICE_NAME));

    // Background tasks
    unwrap!(spawner.spawn(ticker::tick_task(
        &TICK_CONTROL,
        TickProducer::new(&EVENTS, &TICK_EPOCH)
    )));
    let led = Output::new(p.P0_13, Level::High, OutputDrive::Standard);
    unwrap!(spawner.spawn(led::led_task(led, &LINK)));

    let mut scheduler = Scheduler::new(
        sensor,
        GattNotifier::new(sd, server.handles()),
        TickerSource::new(&TICK_CONTROL, &TICK_EPOCH),
    );

    loop {
        LINK.signal(LinkState::Advertising);
        let conn = match ble::advertise(sd, &adv_data).await {
            Ok(conn) => conn,
            Err(e) => {
                warn!("Advertising failed: {}", e);
                Timer::after(Duration::from_secs(1)).await;
                continue;
            }
        };
        LINK.signal(LinkState::Connected);

        scheduler.binding_mut().attach(conn.clone());
        scheduler.connect();

        // Returns when the central disconnects.
        if let Either::First(_) = select(
            gatt_server::run(&conn, &server, |_| {}),
            scheduler.run(EVENTS.receiver()),
        )
        .await
        {
            debug!("GATT server stopped");
        }

        scheduler.binding_mut().detach();
        scheduler.disconnect();

        // Answer reads that raced the disconnect, drop stale ticks.
        let flushed = scheduler.drain(&EVENTS);
        if flushed > 0 {
            debug!("Flushed {} queued events", flushed);
        }
    }
}
