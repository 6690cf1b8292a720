use crate::port::PortRecord;

/// Decide which USB power lines should be on for the given port records.
///
/// Only ports that are charging (free grace or paid) get power; an expired
/// free session keeps its device plugged in but unpowered.
pub fn power_enables<const N: usize>(ports: &[PortRecord; N]) -> [bool; N] {
    core::array::from_fn(|index| ports[index].status.supplies_power())
}
