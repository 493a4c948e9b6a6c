// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Typed controls over a running coordinator.
//!
//! A surface is a read/write projection of one or more capabilities:
//!
//! | Surface               | Key(s)                                 | Capabilities                     |
//! |-----------------------|----------------------------------------|----------------------------------|
//! | [`PowerSwitch`]       | `power_state`                          | power                            |
//! | [`Climate`]           | `heater`                               | power, heat level, thermostat    |
//! | [`ColorSelect`]       | `flame_leds`, `fuel_leds`              | LED color                        |
//! | [`BrightnessControl`] | `flame_brightness`, `fuel_brightness`  | LED brightness                   |
//!
//! Reads come from the last snapshot (with any debounce override) and never
//! touch the device. Writes queue a command on the coordinator and, once it
//! succeeds, request a refresh.

mod climate;
mod number;
mod select;
mod switch;

pub use climate::Climate;
pub use number::BrightnessControl;
pub use select::ColorSelect;
pub use switch::PowerSwitch;

use crate::capability::{Capability, CapabilityValue, Command};
use crate::coordinator::{CoordinatorHandle, Observed};
use crate::error::Result;

/// Behaviour shared by every surface.
pub trait Surface {
    /// Stable key of the surface.
    fn key(&self) -> &'static str;

    /// The coordinator the surface reads from and writes to.
    fn coordinator(&self) -> &CoordinatorHandle;

    /// Unique id, derived from the device serial number and the key.
    fn unique_id(&self) -> String {
        self.coordinator().identity().unique_id_for(self.key())
    }

    /// Returns true while the last poll succeeded.
    fn available(&self) -> bool {
        self.coordinator().is_available()
    }
}

/// Reads a capability and converts its value.
fn read<T>(
    link: &CoordinatorHandle,
    capability: Capability,
    convert: impl FnOnce(CapabilityValue) -> Option<T>,
) -> Option<Observed<T>> {
    let observed = link.observe(capability)?;
    Some(Observed {
        value: convert(observed.value)?,
        stale: observed.stale,
    })
}

/// Applies a command, then asks for a refresh.
async fn write(link: &CoordinatorHandle, command: Command) -> Result<()> {
    link.mutate(command).await?;
    link.request_refresh();
    Ok(())
}
