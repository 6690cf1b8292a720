//! Charging station facade.
//!
//! The one handle shared by the radio event context and the tick context.
//! Every operation takes `&self`: per-port atomicity comes from the
//! registry, connection state from the bridge.  Each resolved status change
//! is pushed to the bridge before the call returns.

use crate::bridge::{NotificationBridge, StatusSink};
use crate::config::CHOOSE_AVAILABLE_PORT;
use crate::error::{Error, Result};
use crate::machine::{Event, Timing, Transition};
use crate::port::{PortStatus, Ticks};
use crate::protocol::{Command, PortSelector, PortUpdate};
use crate::registry::PortRegistry;
use crate::scheduler::{self, Expiries};

pub struct ChargingStation<S, const N: usize> {
    registry: PortRegistry<N>,
    bridge: NotificationBridge<S>,
}

impl<S: StatusSink, const N: usize> ChargingStation<S, N> {
    pub fn new(sink: S) -> Self {
        Self::with_timing(sink, Timing::DEFAULT)
    }

    pub fn with_timing(sink: S, timing: Timing) -> Self {
        Self {
            registry: PortRegistry::with_timing(timing),
            bridge: NotificationBridge::new(sink),
        }
    }

    /// Query surface. Overrides that must be reported go through
    /// [`Self::set_status`] and [`Self::init_port`].
    pub fn registry(&self) -> &PortRegistry<N> {
        &self.registry
    }

    pub fn bridge(&self) -> &NotificationBridge<S> {
        &self.bridge
    }

    pub fn on_connection_established(&self) {
        self.bridge.on_connection_established();
    }

    pub fn on_connection_lost(&self) {
        self.bridge.on_connection_lost();
    }

    /// A device was plugged into `port`.
    pub fn plug_in(&self, port: usize) -> Result<Transition> {
        self.handle_event(port, Event::PlugIn)
    }

    /// A device was plugged into whichever port is free; the lowest index wins.
    pub fn plug_in_any(&self) -> Result<Transition> {
        self.report(self.registry.claim_available())
    }

    pub fn payment_confirmed(&self, port: usize) -> Result<Transition> {
        self.handle_event(port, Event::PaymentConfirmed)
    }

    pub fn unplug(&self, port: usize) -> Result<Transition> {
        self.handle_event(port, Event::Unplug)
    }

    pub fn admin_reset(&self, port: usize) -> Result<Transition> {
        self.handle_event(port, Event::AdminReset)
    }

    pub fn handle_event(&self, port: usize, event: Event) -> Result<Transition> {
        self.report(self.registry.apply_event(port, event))
    }

    /// Administrative status override, reported like any other change.
    pub fn set_status(&self, port: usize, status: PortStatus) -> Result<Transition> {
        self.report(self.registry.set_status(port, status))
    }

    /// Administrative override of status and countdown in one atomic write.
    pub fn init_port(&self, port: usize, status: PortStatus, ticks: Ticks) -> Result<Transition> {
        self.report(self.registry.init_port(port, status, ticks))
    }

    /// Run a decoded GATT command.
    pub fn execute(&self, command: Command) -> Result<Transition> {
        match (command.event, command.port) {
            (Event::PlugIn, PortSelector::Any) => self.plug_in_any(),
            (_, PortSelector::Any) => Err(Error::InvalidPort(CHOOSE_AVAILABLE_PORT as usize)),
            (event, PortSelector::Index(index)) => self.handle_event(index, event),
        }
    }

    /// One scheduler period: tick every port and report expiries in order.
    pub fn tick(&self) -> Expiries<N> {
        let expired = scheduler::sweep(&self.registry);
        for t in &expired {
            self.bridge.port_changed(PortUpdate::from(t));
        }
        expired
    }

    fn report(&self, outcome: Result<Transition>) -> Result<Transition> {
        if let Ok(t) = &outcome {
            if t.changed() {
                self.bridge.port_changed(PortUpdate::from(t));
            }
        }
        outcome
    }
}
