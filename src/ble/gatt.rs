//! GATT layout of the charging service.
//!
//! UUIDs share the 128-bit base `0000xxxx-1212-efde-1523-785fef13d123`.
//! Payload layouts are documented in `chargeport::protocol`.

use chargeport::protocol::{COMMAND_SIZE, PORT_UPDATE_SIZE};

#[nrf_softdevice::gatt_service(uuid = "0000f00d-1212-efde-1523-785fef13d123")]
pub struct ChargingService {
    /// Write `[opcode, port]`; reads and notifications return `[opcode, result]`.
    #[characteristic(uuid = "0000beef-1212-efde-1523-785fef13d123", read, write, notify)]
    pub command: heapless::Vec<u8, COMMAND_SIZE>,
    /// Last port change, `[port, status, ticks_lo, ticks_hi]`.
    #[characteristic(uuid = "0000bef0-1212-efde-1523-785fef13d123", read, notify)]
    pub port_state: heapless::Vec<u8, PORT_UPDATE_SIZE>,
}

#[nrf_softdevice::gatt_server]
pub struct Server {
    pub charging: ChargingService,
}
