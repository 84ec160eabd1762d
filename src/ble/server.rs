//! GATT server for the humidity and temperature characteristics.
//!
//! Registered through the SoftDevice service builder rather than the
//! `#[gatt_server]` macro so that reads can be deferred: the SoftDevice
//! holds the read open, the request travels through the event queue and
//! the scheduler answers it with a fresh sample.
//!
//! Each characteristic lives in its own primary service; both services
//! carry the same vendor UUID.

use defmt::{debug, info, warn};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Sender, TrySendError};
use nrf_softdevice::ble::gatt_server::builder::ServiceBuilder;
use nrf_softdevice::ble::gatt_server::characteristic::{
    Attribute, Metadata, Presentation, Properties, UserDescription,
};
use nrf_softdevice::ble::gatt_server::{self, DeferredReadReply, Server, WriteOp};
use nrf_softdevice::ble::{Connection, GattError, Uuid};
use nrf_softdevice::Softdevice;
use temprh::config::EVENT_QUEUE_DEPTH;
use temprh::error::{BleError, Error};
use temprh::events::{Event, ReadReply, ReadRequest};
use temprh::gatt::{self, CharacteristicId, Notifier};
use temprh::reading::{CharacteristicValue, VALUE_LEN};

/// Producer half of the scheduler queue, as seen by the GATT server.
pub type EventSender =
    Sender<'static, CriticalSectionRawMutex, Event<GattReadReply>, EVENT_QUEUE_DEPTH>;

/// Value handles of the registered characteristics.
#[derive(Clone, Copy, Debug, defmt::Format)]
pub struct Handles {
    pub humidity: u16,
    pub temperature: u16,
}

impl Handles {
    pub fn value_handle(&self, id: CharacteristicId) -> u16 {
        match id {
            CharacteristicId::Humidity => self.humidity,
            CharacteristicId::Temperature => self.temperature,
        }
    }

    fn characteristic(&self, handle: u16) -> Option<CharacteristicId> {
        if handle == self.humidity {
            Some(CharacteristicId::Humidity)
        } else if handle == self.temperature {
            Some(CharacteristicId::Temperature)
        } else {
            None
        }
    }
}

pub struct SensorServer {
    handles: Handles,
    events: EventSender,
}

impl SensorServer {
    /// Register both sensor services.  Humidity first, then temperature.
    pub fn new(sd: &mut Softdevice, events: EventSender) -> Result<Self, Error> {
        let humidity = register(sd, CharacteristicId::Humidity)?;
        let temperature = register(sd, CharacteristicId::Temperature)?;
        let handles = Handles {
            humidity,
            temperature,
        };
        info!("GATT services registered: {}", handles);
        Ok(Self { handles, events })
    }

    pub fn handles(&self) -> Handles {
        self.handles
    }
}

fn register(sd: &mut Softdevice, id: CharacteristicId) -> Result<u16, BleError> {
    let meta = id.info();
    let cpf = meta.presentation;

    let mut service = ServiceBuilder::new(sd, Uuid::new_128(&gatt::service_uuid()))
        .map_err(|_| BleError::RegisterFailed)?;

    let attribute = Attribute::new([0u8; VALUE_LEN]).deferred_read();
    let metadata = Metadata {
        user_description: Some(UserDescription::new(meta.name.as_bytes())),
        cpfd: Some(Presentation {
            format: cpf.format,
            exponent: cpf.exponent,
            unit: cpf.unit,
            name_space: cpf.namespace,
            description: cpf.description,
        }),
        ..Metadata::new(Properties::new().read().notify())
    };

    let characteristic = service
        .add_characteristic(Uuid::new_128(&meta.uuid()), attribute, metadata)
        .map_err(|_| BleError::RegisterFailed)?;
    let handles = characteristic.build();
    let _ = service.build();

    debug!("{} value handle {}", meta.name, handles.value_handle);
    Ok(handles.value_handle)
}

impl Server for SensorServer {
    type Event = ();

    fn on_write(
        &self,
        _conn: &Connection,
        _handle: u16,
        _op: WriteOp,
        _offset: usize,
        _data: &[u8],
    ) -> Option<Self::Event> {
        None
    }

    fn on_deferred_read(
        &self,
        handle: u16,
        _offset: usize,
        reply: DeferredReadReply,
    ) -> Option<Self::Event> {
        let reply = GattReadReply(reply);
        let Some(characteristic) = self.handles.characteristic(handle) else {
            reply.reply(None);
            return None;
        };

        let request = ReadRequest {
            characteristic,
            reply,
        };
        if let Err(TrySendError::Full(Event::Read(request))) =
            self.events.try_send(Event::Read(request))
        {
            warn!("Event queue full - rejecting read of {}", characteristic);
            request.reply.reply(None);
        }
        None
    }
}

/// Pending SoftDevice read, answered by the scheduler.
pub struct GattReadReply(DeferredReadReply);

impl ReadReply for GattReadReply {
    fn reply(self, value: Option<CharacteristicValue>) {
        let result = match &value {
            Some(value) => self.0.reply(Ok(Some(value.as_bytes()))),
            None => self.0.reply(Err(GattError::ATTERR_UNLIKELY_ERROR)),
        };
        if let Err(e) = result {
            debug!("Read reply not delivered: {}", BleError::Raw(e as u32));
        }
    }
}

/// [`Notifier`] on top of the SoftDevice attribute table.
///
/// The stored value is always updated so later plain reads see it; the
/// notification only goes out while a central is attached.
pub struct GattNotifier {
    sd: &'static Softdevice,
    handles: Handles,
    conn: Option<Connection>,
}

impl GattNotifier {
    pub fn new(sd: &'static Softdevice, handles: Handles) -> Self {
        Self {
            sd,
            handles,
            conn: None,
        }
    }

    pub fn attach(&mut self, conn: Connection) {
        self.conn = Some(conn);
    }

    pub fn detach(&mut self) {
        self.conn = None;
    }
}

impl Notifier for GattNotifier {
    fn notify(&mut self, characteristic: CharacteristicId, value: &[u8]) {
        let handle = self.handles.value_handle(characteristic);
        if gatt_server::set_value(self.sd, handle, value).is_err() {
            debug!("set_value failed for {}", characteristic);
            return;
        }
        if let Some(conn) = &self.conn {
            // Fails while the central has notifications disabled.
            if gatt_server::notify_value(conn, handle, value).is_err() {
                debug!("{} not notified", characteristic);
            }
        }
    }
}
