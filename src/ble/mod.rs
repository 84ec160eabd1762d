//! Bluetooth Low Energy subsystem.
//!
//! This module drives the Nordic SoftDevice S140 in **Peripheral** role:
//!
//! 1. **SoftDevice config** - LF clock from the 32.768 kHz crystal, one
//!    peripheral link, default ATT MTU.
//! 2. **Advertiser** - connectable undirected advertising carrying the
//!    device name; restarted by `main` after every disconnect.
//! 3. **GATT server** - see [`server`].

pub mod server;

use core::mem;

use defmt::info;
use nrf_softdevice::ble::{peripheral, Connection, TxPower};
use nrf_softdevice::{raw, Softdevice};
use temprh::config;
use temprh::error::BleError;

/// SoftDevice configuration for a single-central sensor peripheral.
pub fn softdevice_config() -> nrf_softdevice::Config {
    nrf_softdevice::Config {
        clock: Some(raw::nrf_clock_lf_cfg_t {
            source: raw::NRF_CLOCK_LF_SRC_XTAL as u8,
            rc_ctiv: 0,
            rc_temp_ctiv: 0,
            accuracy: raw::NRF_CLOCK_LF_ACCURACY_20_PPM as u8,
        }),
        conn_gap: Some(raw::ble_gap_conn_cfg_t {
            conn_count: 1,
            event_length: 24,
        }),
        conn_gatt: Some(raw::ble_gatt_conn_cfg_t {
            att_mtu: config::BLE_ATT_MTU,
        }),
        gatts_attr_tab_size: Some(raw::ble_gatts_cfg_attr_tab_size_t {
            attr_tab_size: raw::BLE_GATTS_ATTR_TAB_SIZE_DEFAULT,
        }),
        gap_role_count: Some(raw::ble_gap_cfg_role_count_t {
            adv_set_count: 1,
            periph_role_count: 1,
            central_role_count: 0,
            central_sec_count: 0,
            _bitfield_1: raw::ble_gap_cfg_role_count_t::new_bitfield_1(0),
        }),
        gap_device_name: Some(raw::ble_gap_cfg_device_name_t {
            p_value: config::DEVICE_NAME.as_ptr() as _,
            current_len: config::DEVICE_NAME.len() as u16,
            max_len: config::DEVICE_NAME.len() as u16,
            write_perm: unsafe { mem::zeroed() },
            _bitfield_1: raw::ble_gap_cfg_device_name_t::new_bitfield_1(
                raw::BLE_GATTS_VLOC_STACK as u8,
            ),
        }),
        ..Default::default()
    }
}

#[embassy_executor::task]
pub async fn softdevice_task(sd: &'static Softdevice) -> ! {
    sd.run().await
}

/// Publish the preferred connection parameters in the GAP service.
pub fn set_preferred_conn_params() -> Result<(), BleError> {
    let params = raw::ble_gap_conn_params_t {
        min_conn_interval: config::BLE_CONN_INTERVAL_MIN,
        max_conn_interval: config::BLE_CONN_INTERVAL_MAX,
        slave_latency: config::BLE_SLAVE_LATENCY,
        conn_sup_timeout: config::BLE_SUP_TIMEOUT,
    };
    let ret = unsafe { raw::sd_ble_gap_ppcp_set(&params) };
    if ret != raw::NRF_SUCCESS {
        return Err(BleError::Raw(ret));
    }
    Ok(())
}

/// Advertise until a central connects.
pub async fn advertise(sd: &Softdevice, adv_data: &[u8]) -> Result<Connection, BleError> {
    let config = peripheral::Config {
        interval: config::BLE_ADV_INTERVAL,
        tx_power: tx_power(config::BLE_TX_POWER_DBM),
        ..Default::default()
    };
    let adv = peripheral::ConnectableAdvertisement::ScannableUndirected {
        adv_data,
        scan_data: &[],
    };

    info!("Advertising as \"{}\"", config::DEVICE_NAME);
    peripheral::advertise_connectable(sd, adv, &config)
        .await
        .map_err(|_| BleError::AdvertiseFailed)
}

fn tx_power(dbm: i8) -> TxPower {
    match dbm {
        i8::MIN..=-12 => TxPower::Minus12dBm,
        -11..=-8 => TxPower::Minus8dBm,
        -7..=-4 => TxPower::Minus4dBm,
        -3..=3 => TxPower::ZerodBm,
        _ => TxPower::Plus4dBm,
    }
}
