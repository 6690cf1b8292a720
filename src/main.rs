//! chargeport firmware - nRF52840 + SoftDevice S140.
//!
//! Tasks:
//! - `softdevice_task`: runs the BLE stack.
//! - `ble_task`: advertising, GATT server, command handling, notifications.
//! - `tick_task`: one charging-state tick every `TICK_PERIOD_SECS`.
//! - `power_task`: drives the USB power enables from the port registry.
//!
//! The station lives in a `StaticCell` and is shared by `&'static`
//! reference between the BLE and tick tasks.

#![no_std]
#![no_main]

mod ble;
mod power;

use core::mem;

use chargeport::{config, ChargingStation};
use defmt::{info, unwrap};
use embassy_executor::Spawner;
use embassy_nrf::gpio::{Level, Output, OutputDrive};
use embassy_nrf::interrupt::Priority;
use embassy_time::{Duration, Ticker};
use nrf_softdevice::{raw, Softdevice};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

/// The station core as wired on this board.
pub type Station = ChargingStation<ble::QueueSink, { config::PORT_COUNT }>;

type PowerPin = Output<'static>;

static STATION: StaticCell<Station> = StaticCell::new();
static SERVER: StaticCell<ble::gatt::Server> = StaticCell::new();

#[embassy_executor::task]
async fn softdevice_task(sd: &'static Softdevice) -> ! {
    sd.run().await
}

#[embassy_executor::task]
async fn ble_task(
    sd: &'static Softdevice,
    server: &'static ble::gatt::Server,
    station: &'static Station,
) -> ! {
    ble::run(sd, server, station).await
}

#[embassy_executor::task]
async fn tick_task(station: &'static Station) -> ! {
    let mut ticker = Ticker::every(Duration::from_secs(config::TICK_PERIOD_SECS));
    loop {
        ticker.next().await;
        let expired = station.tick();
        if !expired.is_empty() {
            power::request_refresh();
        }
    }
}

#[embassy_executor::task]
async fn power_task(
    station: &'static Station,
    lines: power::PowerLines<PowerPin, { config::PORT_COUNT }>,
) -> ! {
    power::run(station.registry(), lines).await
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("chargeport starting - {} ports", config::PORT_COUNT);

    // Interrupt priorities must leave P0/P1/P4 to the SoftDevice.
    let mut ecfg = embassy_nrf::config::Config::default();
    ecfg.gpiote_interrupt_priority = Priority::P2;
    ecfg.time_interrupt_priority = Priority::P2;
    let p = embassy_nrf::init(ecfg);

    let lines = power::PowerLines::new([
        Output::new(p.P0_03, Level::Low, OutputDrive::Standard),
        Output::new(p.P0_04, Level::Low, OutputDrive::Standard),
        Output::new(p.P0_28, Level::Low, OutputDrive::Standard),
        Output::new(p.P0_29, Level::Low, OutputDrive::Standard),
    ]);

    let sd_config = nrf_softdevice::Config {
        clock: Some(raw::nrf_clock_lf_cfg_t {
            source: raw::NRF_CLOCK_LF_SRC_RC as u8,
            rc_ctiv: 16,
            rc_temp_ctiv: 2,
            accuracy: raw::NRF_CLOCK_LF_ACCURACY_500_PPM as u8,
        }),
        conn_gap: Some(raw::ble_gap_conn_cfg_t {
            conn_count: 1,
            event_length: 24,
        }),
        conn_gatt: Some(raw::ble_gatt_conn_cfg_t { att_mtu: 128 }),
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
            p_value: config::BLE_DEVICE_NAME.as_ptr() as _,
            current_len: config::BLE_DEVICE_NAME.len() as u16,
            max_len: config::BLE_DEVICE_NAME.len() as u16,
            write_perm: unsafe { mem::zeroed() },
            _bitfield_1: raw::ble_gap_cfg_device_name_t::new_bitfield_1(
                raw::BLE_GATTS_VLOC_STACK as u8,
            ),
        }),
        ..Default::default()
    };

    let sd = Softdevice::enable(&sd_config);
    let server = SERVER.init(unwrap!(ble::gatt::Server::new(sd)));
    unwrap!(spawner.spawn(softdevice_task(sd)));

    let station: &'static Station = STATION.init(ChargingStation::new(ble::QueueSink));

    unwrap!(spawner.spawn(power_task(station, lines)));
    unwrap!(spawner.spawn(tick_task(station)));
    unwrap!(spawner.spawn(ble_task(sd, server, station)));
}
