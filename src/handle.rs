// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Connected device handle.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::{Mutex, MutexGuard};

use crate::driver::{DeviceDriver, DeviceIdentity, DeviceLimits};
use crate::types::BleAddress;

/// Connection state of a device handle.
///
/// Transitions only move forward
/// (`Disconnected → Connecting → Connected | Failed`, `Connected → Disconnected`);
/// [`DeviceHandle::reset`] is the only way back from `Failed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    /// Device is not connected.
    Disconnected,
    /// A connection attempt is in progress.
    Connecting,
    /// Device is connected and operational.
    Connected,
    /// Connection failed with an error.
    Failed(String),
}

impl ConnectionState {
    /// Returns true if the device is connected.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Returns true if the device is in a failed state.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    fn can_move_to(&self, next: &Self) -> bool {
        matches!(
            (self, next),
            (Self::Disconnected, Self::Connecting)
                | (Self::Connecting, Self::Connected | Self::Failed(_))
                | (Self::Connected, Self::Disconnected | Self::Failed(_))
        )
    }
}

struct Inner<D> {
    address: BleAddress,
    identity: RwLock<DeviceIdentity>,
    limits: RwLock<DeviceLimits>,
    state: RwLock<ConnectionState>,
    driver: Mutex<D>,
}

/// A device link handed from pairing to the polling coordinator.
///
/// The driver sits behind an async mutex so at most one operation reaches
/// the transport at a time. Clones share the same link; once the handle is
/// given to a [`PollingCoordinator`](crate::coordinator::PollingCoordinator)
/// all I/O should go through the coordinator.
pub struct DeviceHandle<D> {
    inner: Arc<Inner<D>>,
}

impl<D: DeviceDriver> DeviceHandle<D> {
    /// Wraps an unconnected driver.
    ///
    /// Identity and limits stay empty until [`capture`](Self::capture) runs
    /// on a connected driver.
    pub(crate) fn new(address: BleAddress, driver: D) -> Self {
        Self {
            inner: Arc::new(Inner {
                address,
                identity: RwLock::new(DeviceIdentity::default()),
                limits: RwLock::new(DeviceLimits::default()),
                state: RwLock::new(ConnectionState::Disconnected),
                driver: Mutex::new(driver),
            }),
        }
    }

    /// Wraps a driver whose link is already open.
    ///
    /// Use this when a link was established outside the pairing
    /// coordinator.
    pub fn connected(address: BleAddress, driver: D) -> Self {
        let handle = Self::new(address, driver);
        if let Ok(driver) = handle.inner.driver.try_lock() {
            handle.capture(&driver);
        }
        *handle.inner.state.write() = ConnectionState::Connected;
        handle
    }

    /// Records the identity and limits a connected driver reports.
    pub(crate) fn capture(&self, driver: &D) {
        let identity = driver.identity();
        tracing::debug!(
            address = %self.inner.address,
            serial_number = %identity.serial_number,
            "Device identity read"
        );
        *self.inner.identity.write() = identity;
        *self.inner.limits.write() = driver.limits();
    }

    /// Returns the device address.
    #[must_use]
    pub fn address(&self) -> BleAddress {
        self.inner.address
    }

    /// Returns the identity read from the driver once connected.
    ///
    /// Empty before the first successful connection.
    #[must_use]
    pub fn identity(&self) -> DeviceIdentity {
        self.inner.identity.read().clone()
    }

    /// Returns the device's integer bounds.
    #[must_use]
    pub fn limits(&self) -> DeviceLimits {
        *self.inner.limits.read()
    }

    /// Returns the current connection state.
    #[must_use]
    pub fn connection_state(&self) -> ConnectionState {
        self.inner.state.read().clone()
    }

    /// Returns true if the device is connected.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.inner.state.read().is_connected()
    }

    /// Moves to `next` if the transition is forward.
    ///
    /// Returns `false` and leaves the state unchanged otherwise.
    pub(crate) fn transition(&self, next: ConnectionState) -> bool {
        let mut state = self.inner.state.write();
        if state.can_move_to(&next) {
            tracing::debug!(
                address = %self.inner.address,
                from = ?*state,
                to = ?next,
                "Connection state changed"
            );
            *state = next;
            true
        } else {
            false
        }
    }

    /// Resets the handle to `Disconnected` ahead of an explicit reconnect.
    pub fn reset(&self) {
        *self.inner.state.write() = ConnectionState::Disconnected;
    }

    /// Waits for exclusive access to the driver.
    pub(crate) async fn driver(&self) -> MutexGuard<'_, D> {
        self.inner.driver.lock().await
    }
}

impl<D> Clone for DeviceHandle<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<D> std::fmt::Debug for DeviceHandle<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceHandle")
            .field("address", &self.inner.address)
            .field("serial_number", &self.inner.identity.read().serial_number)
            .field("state", &*self.inner.state.read())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::fake::FakeControl;

    fn addr() -> BleAddress {
        "11:22:33:44:55:66".parse().unwrap()
    }

    fn handle() -> DeviceHandle<crate::driver::fake::FakeDriver> {
        DeviceHandle::new(addr(), FakeControl::new().driver())
    }

    #[test]
    fn new_handle_is_disconnected() {
        let handle = handle();
        assert!(!handle.is_connected());
        assert_eq!(handle.connection_state(), ConnectionState::Disconnected);
    }

    #[test]
    fn forward_transitions_are_accepted() {
        let handle = handle();
        assert!(handle.transition(ConnectionState::Connecting));
        assert!(handle.transition(ConnectionState::Connected));
        assert!(handle.is_connected());
        assert!(handle.transition(ConnectionState::Disconnected));
    }

    #[test]
    fn backward_transitions_are_refused() {
        let handle = handle();
        assert!(!handle.transition(ConnectionState::Connected));
        assert!(handle.transition(ConnectionState::Connecting));
        assert!(handle.transition(ConnectionState::Failed("timeout".to_string())));
        assert!(!handle.transition(ConnectionState::Connecting));
        assert!(handle.connection_state().is_failed());
    }

    #[test]
    fn reset_returns_to_disconnected() {
        let handle = handle();
        handle.transition(ConnectionState::Connecting);
        handle.transition(ConnectionState::Failed("refused".to_string()));

        handle.reset();

        assert_eq!(handle.connection_state(), ConnectionState::Disconnected);
        assert!(handle.transition(ConnectionState::Connecting));
    }

    #[test]
    fn clones_share_state() {
        let handle = handle();
        let other = handle.clone();
        handle.transition(ConnectionState::Connecting);
        assert_eq!(other.connection_state(), ConnectionState::Connecting);
    }

    #[test]
    fn identity_is_captured_when_connected() {
        let handle = DeviceHandle::connected(addr(), FakeControl::new().driver());
        assert_eq!(handle.identity().serial_number, "FR0001");
    }

    #[tokio::test]
    async fn identity_waits_for_connection() {
        let control = FakeControl::new();
        control.learn_identity_on_connect();
        let handle = DeviceHandle::new(addr(), control.driver());
        assert!(handle.identity().serial_number.is_empty());

        let mut driver = handle.driver().await;
        driver.connect().await.unwrap();
        handle.capture(&driver);
        drop(driver);

        assert_eq!(handle.identity().serial_number, "FR0001");
    }
}
