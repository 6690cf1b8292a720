//! Notification bridge between the state machine and the BLE transport.
//!
//! The core only ever pushes "port changed" updates through a
//! [`StatusSink`]; it never waits for delivery and never retries.  Updates
//! are only attempted while a central is connected.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::protocol::PortUpdate;

/// Receiver of port state changes, implemented by the transport layer.
///
/// Implementations must not block; dropping an update is acceptable.
pub trait StatusSink {
    fn notify(&self, update: PortUpdate);
}

impl<S: StatusSink + ?Sized> StatusSink for &S {
    fn notify(&self, update: PortUpdate) {
        (**self).notify(update)
    }
}

/// Gate in front of a [`StatusSink`] that tracks connection eligibility.
pub struct NotificationBridge<S> {
    sink: S,
    connected: AtomicBool,
    dropped: AtomicU32,
}

impl<S: StatusSink> NotificationBridge<S> {
    pub const fn new(sink: S) -> Self {
        Self {
            sink,
            connected: AtomicBool::new(false),
            dropped: AtomicU32::new(0),
        }
    }

    pub fn on_connection_established(&self) {
        self.connected.store(true, Ordering::Release);
        info!("bridge: central connected, notifications enabled");
    }

    pub fn on_connection_lost(&self) {
        self.connected.store(false, Ordering::Release);
        info!("bridge: central disconnected, notifications paused");
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Forward `update` if a central is connected; otherwise drop it.
    ///
    /// Returns whether the update was handed to the sink.
    pub fn port_changed(&self, update: PortUpdate) -> bool {
        if !self.is_connected() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            debug!("bridge: no central, dropping update for port {}", update.port);
            return false;
        }
        self.sink.notify(update);
        true
    }

    /// Updates skipped because nobody was connected.
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}
