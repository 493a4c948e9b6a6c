// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Main power switch.

use super::{Surface, read, write};
use crate::capability::{Capability, Command};
use crate::coordinator::{CoordinatorHandle, Observed};
use crate::error::Result;

/// On/off control of the whole appliance.
///
/// After switching off, the fireplace keeps reporting "on" while it winds
/// down. The coordinator's debounce overlay makes [`is_on`](Self::is_on)
/// return `false` for that window.
#[derive(Debug, Clone)]
pub struct PowerSwitch {
    link: CoordinatorHandle,
}

impl PowerSwitch {
    /// Creates the switch.
    #[must_use]
    pub fn new(link: CoordinatorHandle) -> Self {
        Self { link }
    }

    /// Returns whether the appliance is on.
    #[must_use]
    pub fn is_on(&self) -> Option<Observed<bool>> {
        read(&self.link, Capability::Power, |v| v.as_bool())
    }

    /// Switches the appliance on.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn turn_on(&self) -> Result<()> {
        self.set(true).await
    }

    /// Switches the appliance off.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn turn_off(&self) -> Result<()> {
        self.set(false).await
    }

    /// Sets the power state.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn set(&self, on: bool) -> Result<()> {
        write(&self.link, Command::SetPower(on)).await
    }

    /// Flips the observed power state.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn toggle(&self) -> Result<()> {
        let on = self.is_on().is_some_and(|o| o.value);
        self.set(!on).await
    }
}

impl Surface for PowerSwitch {
    fn key(&self) -> &'static str {
        Capability::Power.key()
    }

    fn coordinator(&self) -> &CoordinatorHandle {
        &self.link
    }
}
