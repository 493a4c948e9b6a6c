// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Runtime for a configured appliance.
//!
//! [`Appliance`] ties a persisted [`ConfigEntry`] to a running
//! [`PollingCoordinator`] and hands out the appliance's surfaces.
//!
//! # Examples
//!
//! ```no_run
//! use flamerite_lib::appliance::Appliance;
//! use flamerite_lib::config::{ApplianceConfig, ConfigEntry};
//! use flamerite_lib::pairing::PairingCoordinator;
//! use flamerite_lib::surface::Surface;
//! # use flamerite_lib::driver::DriverProvider;
//!
//! # async fn example<P: DriverProvider>(provider: P, json: &str) -> flamerite_lib::Result<()> {
//! let pairing = PairingCoordinator::new(provider);
//! let entry = ConfigEntry::from_json(json)?;
//!
//! let appliance = Appliance::setup(&pairing, &entry, &ApplianceConfig::default()).await?;
//!
//! let power = appliance.power_switch();
//! println!("{}: {:?}", power.unique_id(), power.is_on());
//! power.turn_on().await?;
//!
//! appliance.unload().await;
//! # Ok(())
//! # }
//! ```

use crate::config::{ApplianceConfig, ConfigEntry};
use crate::coordinator::{CoordinatorHandle, PollingCoordinator};
use crate::driver::{DeviceDriver, DeviceIdentity, DriverProvider};
use crate::error::{Error, PairingError, Result};
use crate::handle::DeviceHandle;
use crate::pairing::PairingCoordinator;
use crate::surface::{BrightnessControl, Climate, ColorSelect, PowerSwitch};
use crate::types::{BleAddress, LedChannel};

/// A configured, connected appliance.
pub struct Appliance<D: DeviceDriver> {
    coordinator: PollingCoordinator<D>,
    link: CoordinatorHandle,
}

impl<D: DeviceDriver> Appliance<D> {
    /// Connects to the appliance in `entry` and starts polling.
    ///
    /// Uses the setup retry policy from `config`. A request for an address
    /// that is still pairing attaches to that session.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotReady` when the appliance is not nearby, does not
    /// accept a connection, or (with `require_initial_state`) does not
    /// answer the first state query. Setup may be retried later.
    pub async fn setup<P>(
        pairing: &PairingCoordinator<P>,
        entry: &ConfigEntry,
        config: &ApplianceConfig,
    ) -> Result<Self>
    where
        P: DriverProvider<Driver = D>,
    {
        let address = entry.address;
        tracing::debug!(%address, title = %entry.title, "Setting up appliance");

        let handle = match pairing.connect(address, &config.setup_retry).await {
            Ok(handle) => handle,
            Err(Error::Pairing(PairingError::DeviceNotFound(_))) => {
                return Err(not_ready(address, "no nearby device with this address"));
            }
            Err(e) => {
                return Err(not_ready(address, format!("failed to connect: {e}")));
            }
        };

        Self::from_handle(handle, config).await
    }

    /// Starts polling over an already connected handle.
    ///
    /// Use this with the handle taken from a completed setup flow.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotReady` if `require_initial_state` is set and the
    /// first state query fails. The link is closed in that case.
    pub async fn from_handle(handle: DeviceHandle<D>, config: &ApplianceConfig) -> Result<Self> {
        let address = handle.address();
        let coordinator = PollingCoordinator::start(handle, config.coordinator.clone()).await;
        let link = coordinator.handle();

        if config.require_initial_state && link.snapshot().is_none() {
            let reason = link
                .state()
                .last_error
                .unwrap_or_else(|| "no state received".to_string());
            coordinator.disconnect().await;
            return Err(not_ready(address, format!("initial state query failed: {reason}")));
        }

        tracing::info!(
            %address,
            serial_number = %link.identity().serial_number,
            model = %link.identity().model,
            "Appliance ready"
        );

        Ok(Self { coordinator, link })
    }

    /// Returns the appliance address.
    #[must_use]
    pub fn address(&self) -> BleAddress {
        self.link.address()
    }

    /// Returns the identity read from the device.
    #[must_use]
    pub fn identity(&self) -> &DeviceIdentity {
        self.link.identity()
    }

    /// Returns the coordinator handle shared by all surfaces.
    #[must_use]
    pub fn coordinator(&self) -> &CoordinatorHandle {
        &self.link
    }

    /// Main power switch.
    #[must_use]
    pub fn power_switch(&self) -> PowerSwitch {
        PowerSwitch::new(self.link.clone())
    }

    /// Heater control.
    #[must_use]
    pub fn climate(&self) -> Climate {
        Climate::new(self.link.clone())
    }

    /// Color picker for a strip.
    #[must_use]
    pub fn color_select(&self, channel: LedChannel) -> ColorSelect {
        ColorSelect::new(self.link.clone(), channel)
    }

    /// Brightness control for a strip.
    #[must_use]
    pub fn brightness(&self, channel: LedChannel) -> BrightnessControl {
        BrightnessControl::new(self.link.clone(), channel)
    }

    /// Flame LED color picker.
    #[must_use]
    pub fn flame_color(&self) -> ColorSelect {
        self.color_select(LedChannel::Flame)
    }

    /// Fuel bed LED color picker.
    #[must_use]
    pub fn fuel_color(&self) -> ColorSelect {
        self.color_select(LedChannel::Fuel)
    }

    /// Flame LED brightness.
    #[must_use]
    pub fn flame_brightness(&self) -> BrightnessControl {
        self.brightness(LedChannel::Flame)
    }

    /// Fuel bed LED brightness.
    #[must_use]
    pub fn fuel_brightness(&self) -> BrightnessControl {
        self.brightness(LedChannel::Fuel)
    }

    /// Stops polling and closes the link.
    ///
    /// Safe to call more than once.
    pub async fn unload(&self) {
        tracing::info!(address = %self.address(), "Unloading appliance");
        self.coordinator.disconnect().await;
    }
}

impl<D: DeviceDriver> std::fmt::Debug for Appliance<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Appliance")
            .field("address", &self.address())
            .field("serial_number", &self.identity().serial_number)
            .field("phase", &self.link.phase())
            .finish_non_exhaustive()
    }
}

fn not_ready(address: BleAddress, reason: impl Into<String>) -> Error {
    let reason = reason.into();
    tracing::warn!(%address, %reason, "Appliance not ready");
    Error::NotReady { address, reason }
}
