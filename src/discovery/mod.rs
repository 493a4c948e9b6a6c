// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Filtering of nearby Bluetooth advertisements.
//!
//! Scanning is done by the host's Bluetooth stack. This module only decides
//! which of the reported advertisements are worth offering for setup:
//!
//! 1. The device accepts connections
//! 2. The address has not been configured yet
//! 3. The driver recognises the advertisement as a supported fireplace
//!
//! # Examples
//!
//! ```
//! use flamerite_lib::discovery::candidates;
//! use flamerite_lib::driver::{Advertisement, DEVICE_SERVICE_UUID};
//! # use flamerite_lib::driver::{DeviceDriver, DeviceIdentity, StateReport};
//! # use flamerite_lib::error::DriverError;
//! # use flamerite_lib::types::{HeatLevel, LedChannel, LedColor};
//! # struct Nitra;
//! # impl DeviceDriver for Nitra {
//! #     async fn connect(&mut self) -> Result<(), DriverError> { Ok(()) }
//! #     async fn disconnect(&mut self) -> Result<(), DriverError> { Ok(()) }
//! #     async fn query_state(&mut self) -> Result<StateReport, DriverError> { Err(DriverError::NotConnected) }
//! #     async fn set_powered_on(&mut self, _: bool) -> Result<(), DriverError> { Ok(()) }
//! #     async fn set_heat_level(&mut self, _: HeatLevel) -> Result<(), DriverError> { Ok(()) }
//! #     async fn set_thermostat(&mut self, _: u8) -> Result<(), DriverError> { Ok(()) }
//! #     async fn set_color(&mut self, _: LedChannel, _: LedColor) -> Result<(), DriverError> { Ok(()) }
//! #     async fn set_brightness(&mut self, _: LedChannel, _: u8) -> Result<(), DriverError> { Ok(()) }
//! #     fn identity(&self) -> DeviceIdentity { DeviceIdentity::default() }
//! # }
//!
//! let lounge = "AA:BB:CC:DD:EE:01".parse().unwrap();
//! let kitchen = "AA:BB:CC:DD:EE:02".parse().unwrap();
//! let seen = vec![
//!     Advertisement::new(kitchen).with_service_uuid(DEVICE_SERVICE_UUID),
//!     Advertisement::new(lounge).with_service_uuid(DEVICE_SERVICE_UUID),
//! ];
//!
//! // The lounge fireplace is already set up
//! let found = candidates::<Nitra>(&seen, &[lounge]);
//! assert_eq!(found, vec![kitchen]);
//! ```

use std::collections::BTreeSet;

use crate::driver::{Advertisement, DeviceDriver};
use crate::types::BleAddress;

/// Returns the addresses that can be offered for setup.
///
/// The result is sorted and holds each address once, even when a device
/// was reported several times.
#[must_use]
pub fn candidates<D: DeviceDriver>(
    advertisements: &[Advertisement],
    configured: &[BleAddress],
) -> Vec<BleAddress> {
    let found: BTreeSet<BleAddress> = advertisements
        .iter()
        .filter(|adv| adv.connectable)
        .filter(|adv| !configured.contains(&adv.address))
        .filter(|adv| D::is_supported_device(adv))
        .map(|adv| adv.address)
        .collect();

    tracing::debug!(
        seen = advertisements.len(),
        candidates = found.len(),
        "Filtered discovered devices"
    );

    found.into_iter().collect()
}

/// Returns true if a single advertisement may be offered for setup.
#[must_use]
pub fn is_candidate<D: DeviceDriver>(
    advertisement: &Advertisement,
    configured: &[BleAddress],
) -> bool {
    advertisement.connectable
        && !configured.contains(&advertisement.address)
        && D::is_supported_device(advertisement)
}
