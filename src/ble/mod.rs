//! Bluetooth Low Energy subsystem.
//!
//! This module drives the Nordic SoftDevice S140 in **Peripheral** role:
//!
//! 1. **Advertiser** - advertises the charging service UUID and waits for a
//!    central to connect (one connection at a time).
//! 2. **GATT server** - the charging service with a `command` characteristic
//!    (write opcodes, read/notify results) and a `port_state`
//!    characteristic (notified on every port change).
//! 3. **Notifier** - drains the port-update queue filled by the station's
//!    [`QueueSink`] and pushes each update to the connected central.
//!
//! Plug-in, payment and unplug signals reach the station as command writes.

pub mod gatt;

use chargeport::config::{self, NOTIFY_QUEUE_DEPTH};
use chargeport::{Command, CommandResult, PortUpdate, StatusSink};
use defmt::{debug, info, warn};
use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use heapless::Vec;
use nrf_softdevice::ble::advertisement_builder::{
    Flag, LegacyAdvertisementBuilder, LegacyAdvertisementPayload, ServiceList,
};
use nrf_softdevice::ble::{gatt_server, peripheral, Connection};
use nrf_softdevice::Softdevice;

use crate::power;
use crate::Station;
use gatt::{ChargingServiceEvent, Server, ServerEvent};

/// Port updates waiting to be notified to the central.
static NOTIFY_QUEUE: Channel<CriticalSectionRawMutex, PortUpdate, NOTIFY_QUEUE_DEPTH> =
    Channel::new();

/// Station-side end of the notification queue.
///
/// Never blocks: when the queue is full the update is dropped.
pub struct QueueSink;

impl StatusSink for QueueSink {
    fn notify(&self, update: PortUpdate) {
        if NOTIFY_QUEUE.try_send(update).is_err() {
            warn!("notify queue full - dropping update for port {}", update.port);
        }
    }
}

static ADV_DATA: LegacyAdvertisementPayload = LegacyAdvertisementBuilder::new()
    .flags(&[Flag::GeneralDiscovery, Flag::LE_Only])
    .services_128(ServiceList::Complete, &[config::SERVICE_UUID_LE])
    .build();

static SCAN_DATA: LegacyAdvertisementPayload = LegacyAdvertisementBuilder::new()
    .full_name(config::BLE_DEVICE_NAME)
    .build();

/// Advertise, serve one central until it leaves, repeat.
pub async fn run(sd: &'static Softdevice, server: &'static Server, station: &'static Station) -> ! {
    loop {
        let adv_config = peripheral::Config {
            interval: config::BLE_ADV_INTERVAL,
            ..Default::default()
        };
        let adv = peripheral::ConnectableAdvertisement::ScannableUndirected {
            adv_data: &ADV_DATA,
            scan_data: &SCAN_DATA,
        };

        let conn = match peripheral::advertise_connectable(sd, adv, &adv_config).await {
            Ok(conn) => conn,
            Err(e) => {
                warn!("advertising failed: {:?}", e);
                continue;
            }
        };

        info!("central connected");
        // Updates queued before this central arrived describe stale state.
        while NOTIFY_QUEUE.try_receive().is_ok() {}
        station.on_connection_established();

        let gatt_fut = gatt_server::run(&conn, server, |e| match e {
            ServerEvent::Charging(e) => match e {
                ChargingServiceEvent::CommandWrite(data) => {
                    on_command(server, &conn, station, &data)
                }
                ChargingServiceEvent::CommandCccdWrite { notifications } => {
                    info!("command result notifications: {}", notifications)
                }
                ChargingServiceEvent::PortStateCccdWrite { notifications } => {
                    info!("port state notifications: {}", notifications)
                }
            },
        });

        match select(gatt_fut, notify_loop(server, &conn)).await {
            Either::First(reason) => info!("central disconnected: {:?}", reason),
            Either::Second(_) => {}
        }

        station.on_connection_lost();
    }
}

/// Decode and execute one command write, then publish its result.
fn on_command(server: &Server, conn: &Connection, station: &Station, data: &[u8]) {
    let result = match Command::from_ble_bytes(data) {
        Ok(command) => {
            let outcome = station.execute(command);
            if matches!(&outcome, Ok(t) if t.changed()) {
                power::request_refresh();
            }
            CommandResult::new(command.opcode(), &outcome)
        }
        Err(e) => {
            warn!("command write rejected: {}", e);
            CommandResult::malformed()
        }
    };

    let value = gatt_value(&result.to_bytes());
    if let Err(e) = server.charging.command_set(&value) {
        warn!("command result set failed: {:?}", e);
    }
    if let Err(e) = server.charging.command_notify(conn, &value) {
        debug!("command result not notified: {:?}", e);
    }
}

/// Push queued port updates to the central until the link drops.
async fn notify_loop(server: &Server, conn: &Connection) -> ! {
    loop {
        let update = NOTIFY_QUEUE.receive().await;
        let value = gatt_value(&update.to_bytes());

        if let Err(e) = server.charging.port_state_set(&value) {
            warn!("port state set failed: {:?}", e);
        }
        if let Err(e) = server.charging.port_state_notify(conn, &value) {
            debug!("port {} update not notified: {:?}", update.port, e);
        }
    }
}

fn gatt_value<const N: usize>(bytes: &[u8]) -> Vec<u8, N> {
    let mut value = Vec::new();
    // Callers pass exactly N bytes.
    let _ = value.extend_from_slice(bytes);
    value
}
