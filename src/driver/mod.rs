// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device driver contract.
//!
//! The wire-level Bluetooth transport and command encoding live outside this
//! crate. This module defines the operations the coordinators need from a
//! driver: connect, query, one mutation per capability, and identity.
//!
//! # Implementing a driver
//!
//! ```
//! use flamerite_lib::driver::{DeviceDriver, DeviceIdentity, StateReport};
//! use flamerite_lib::error::DriverError;
//! use flamerite_lib::types::{HeatLevel, LedChannel, LedColor};
//!
//! struct NullDriver;
//!
//! impl DeviceDriver for NullDriver {
//!     async fn connect(&mut self) -> Result<(), DriverError> {
//!         Err(DriverError::ConnectionFailed("no radio".into()))
//!     }
//!     async fn disconnect(&mut self) -> Result<(), DriverError> { Ok(()) }
//!     async fn query_state(&mut self) -> Result<StateReport, DriverError> {
//!         Err(DriverError::NotConnected)
//!     }
//!     async fn set_powered_on(&mut self, _: bool) -> Result<(), DriverError> { Ok(()) }
//!     async fn set_heat_level(&mut self, _: HeatLevel) -> Result<(), DriverError> { Ok(()) }
//!     async fn set_thermostat(&mut self, _: u8) -> Result<(), DriverError> { Ok(()) }
//!     async fn set_color(&mut self, _: LedChannel, _: LedColor) -> Result<(), DriverError> { Ok(()) }
//!     async fn set_brightness(&mut self, _: LedChannel, _: u8) -> Result<(), DriverError> { Ok(()) }
//!     fn identity(&self) -> DeviceIdentity { DeviceIdentity::default() }
//! }
//! ```

#[cfg(test)]
pub(crate) mod fake;

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::DriverError;
use crate::types::{BleAddress, HeatLevel, LedChannel, LedColor, ValueRange};

/// GATT service advertised by supported fireplaces.
pub const DEVICE_SERVICE_UUID: &str = "0000fff0-0000-1000-8000-00805f9b34fb";

/// A nearby advertisement as reported by the discovery collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advertisement {
    /// Address of the advertising device.
    pub address: BleAddress,
    /// Advertised local name, if any.
    pub local_name: Option<String>,
    /// Advertised service UUIDs, lower-case.
    pub service_uuids: Vec<String>,
    /// Whether the device accepts connections.
    pub connectable: bool,
}

impl Advertisement {
    /// Creates a connectable advertisement with no name or services.
    #[must_use]
    pub fn new(address: BleAddress) -> Self {
        Self {
            address,
            local_name: None,
            service_uuids: Vec::new(),
            connectable: true,
        }
    }

    /// Adds an advertised service UUID.
    #[must_use]
    pub fn with_service_uuid(mut self, uuid: impl Into<String>) -> Self {
        self.service_uuids.push(uuid.into().to_lowercase());
        self
    }

    /// Sets the advertised local name.
    #[must_use]
    pub fn with_local_name(mut self, name: impl Into<String>) -> Self {
        self.local_name = Some(name.into());
        self
    }

    /// Marks the advertisement as non-connectable.
    #[must_use]
    pub fn non_connectable(mut self) -> Self {
        self.connectable = false;
        self
    }

    /// Returns `true` if the given service UUID is advertised.
    #[must_use]
    pub fn advertises(&self, uuid: &str) -> bool {
        self.service_uuids.iter().any(|u| u.eq_ignore_ascii_case(uuid))
    }
}

/// Stable identity fields read from the device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    /// Serial number; the basis of every unique id.
    pub serial_number: String,
    /// Manufacturer name.
    pub manufacturer: String,
    /// Model number.
    pub model: String,
    /// Firmware revision.
    pub firmware_revision: String,
    /// Hardware revision.
    pub hardware_revision: String,
    /// Advertised device name.
    pub name: String,
}

impl DeviceIdentity {
    /// Returns the unique id of a surface with the given key.
    #[must_use]
    pub fn unique_id_for(&self, key: &str) -> String {
        format!("{}_{key}", self.serial_number)
    }
}

/// Integer bounds the device accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceLimits {
    /// Thermostat target range.
    pub thermostat: ValueRange,
    /// LED brightness range, shared by both channels.
    pub brightness: ValueRange,
}

impl Default for DeviceLimits {
    fn default() -> Self {
        Self {
            thermostat: ValueRange::DEFAULT_THERMOSTAT,
            brightness: ValueRange::DEFAULT_BRIGHTNESS,
        }
    }
}

/// State of one LED strip as read from the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedState {
    /// Current color.
    pub color: LedColor,
    /// Current brightness.
    pub brightness: u8,
}

/// Result of one successful state query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateReport {
    /// Main power.
    pub powered_on: bool,
    /// Heater level.
    pub heat_level: HeatLevel,
    /// Thermostat target.
    pub thermostat: u8,
    /// Flame effect strip.
    pub flame: LedState,
    /// Fuel bed strip.
    pub fuel: LedState,
}

impl StateReport {
    /// Returns the state of one LED strip.
    #[must_use]
    pub const fn led(&self, channel: LedChannel) -> LedState {
        match channel {
            LedChannel::Flame => self.flame,
            LedChannel::Fuel => self.fuel,
        }
    }
}

/// Operations a device driver provides.
///
/// The underlying transport does not tolerate concurrent operations; callers
/// in this crate always hold exclusive access while an operation runs.
/// Every I/O method returns an error on failure and otherwise applies its
/// effect before resolving.
pub trait DeviceDriver: Send + 'static {
    /// Makes one attempt to establish the physical link.
    fn connect(&mut self) -> impl Future<Output = Result<(), DriverError>> + Send;

    /// Closes the link.
    fn disconnect(&mut self) -> impl Future<Output = Result<(), DriverError>> + Send;

    /// Reads the full device state.
    fn query_state(&mut self) -> impl Future<Output = Result<StateReport, DriverError>> + Send;

    /// Switches main power.
    fn set_powered_on(&mut self, on: bool)
    -> impl Future<Output = Result<(), DriverError>> + Send;

    /// Sets the heater level.
    fn set_heat_level(
        &mut self,
        level: HeatLevel,
    ) -> impl Future<Output = Result<(), DriverError>> + Send;

    /// Sets the thermostat target.
    fn set_thermostat(&mut self, target: u8)
    -> impl Future<Output = Result<(), DriverError>> + Send;

    /// Sets the color of one LED strip.
    fn set_color(
        &mut self,
        channel: LedChannel,
        color: LedColor,
    ) -> impl Future<Output = Result<(), DriverError>> + Send;

    /// Sets the brightness of one LED strip.
    fn set_brightness(
        &mut self,
        channel: LedChannel,
        brightness: u8,
    ) -> impl Future<Output = Result<(), DriverError>> + Send;

    /// Returns the identity fields read during connection.
    fn identity(&self) -> DeviceIdentity;

    /// Returns the device's integer bounds.
    fn limits(&self) -> DeviceLimits {
        DeviceLimits::default()
    }

    /// Returns `true` if the advertisement belongs to a supported device.
    fn is_supported_device(advertisement: &Advertisement) -> bool
    where
        Self: Sized,
    {
        advertisement.advertises(DEVICE_SERVICE_UUID)
    }
}

/// Resolves addresses to driver instances.
///
/// This is the seam to the platform's Bluetooth stack: `open` returns `None`
/// when the address is not currently discoverable.
pub trait DriverProvider: Send + Sync + 'static {
    /// The driver type produced.
    type Driver: DeviceDriver;

    /// Creates an unconnected driver for the address.
    fn open(&self, address: &BleAddress) -> Option<Self::Driver>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::fake::FakeDriver;

    fn addr() -> BleAddress {
        "aa:bb:cc:dd:ee:ff".parse().unwrap()
    }

    #[test]
    fn supported_device_requires_service_uuid() {
        let plain = Advertisement::new(addr());
        let fireplace = Advertisement::new(addr()).with_service_uuid(DEVICE_SERVICE_UUID);
        let upper =
            Advertisement::new(addr()).with_service_uuid(DEVICE_SERVICE_UUID.to_uppercase());

        assert!(!FakeDriver::is_supported_device(&plain));
        assert!(FakeDriver::is_supported_device(&fireplace));
        assert!(FakeDriver::is_supported_device(&upper));
    }

    #[test]
    fn unique_id_uses_serial() {
        let identity = DeviceIdentity {
            serial_number: "FR123".to_string(),
            ..DeviceIdentity::default()
        };
        assert_eq!(identity.unique_id_for("power_state"), "FR123_power_state");
    }

    #[test]
    fn default_limits_match_reference_device() {
        let limits = DeviceLimits::default();
        assert_eq!(limits.thermostat.min(), 16);
        assert_eq!(limits.thermostat.max(), 31);
        assert_eq!(limits.brightness.min(), 1);
        assert_eq!(limits.brightness.max(), 10);
    }
}
