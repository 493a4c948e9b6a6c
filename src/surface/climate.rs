// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Heater control.
//!
//! The heater is presented as a thermostat with two modes and a fan-style
//! setting, all derived from the device's heat level:
//!
//! | Heat level | HVAC mode | Fan mode |
//! |------------|-----------|----------|
//! | Off        | off       | off      |
//! | Low        | heat      | low      |
//! | High       | heat      | high     |
//!
//! The heater only runs while the appliance is on, so selecting a heating
//! mode powers the appliance up first when needed.

use super::{Surface, read, write};
use crate::capability::{Capability, Command};
use crate::coordinator::{CoordinatorHandle, Observed};
use crate::error::Result;
use crate::types::{FanMode, HeatLevel, HvacMode};

/// Heater and thermostat control.
#[derive(Debug, Clone)]
pub struct Climate {
    link: CoordinatorHandle,
}

impl Climate {
    /// Key of the climate surface.
    pub const KEY: &'static str = "heater";

    /// Creates the climate surface.
    #[must_use]
    pub fn new(link: CoordinatorHandle) -> Self {
        Self { link }
    }

    /// Modes offered to users.
    #[must_use]
    pub fn hvac_modes(&self) -> &'static [HvacMode] {
        &HvacMode::ALL
    }

    /// Fan settings offered to users.
    #[must_use]
    pub fn fan_modes(&self) -> &'static [FanMode] {
        &FanMode::ALL
    }

    /// Lowest thermostat target.
    #[must_use]
    pub fn min_temp(&self) -> u8 {
        self.link.limits().thermostat.min()
    }

    /// Highest thermostat target.
    #[must_use]
    pub fn max_temp(&self) -> u8 {
        self.link.limits().thermostat.max()
    }

    /// Thermostat step, in degrees Celsius.
    #[must_use]
    pub fn temperature_step(&self) -> u8 {
        1
    }

    /// Current heat level.
    #[must_use]
    pub fn heat_level(&self) -> Option<Observed<HeatLevel>> {
        read(&self.link, Capability::HeatLevel, |v| v.as_heat_level())
    }

    /// Current mode.
    #[must_use]
    pub fn hvac_mode(&self) -> Option<Observed<HvacMode>> {
        self.heat_level().map(|o| o.map(HvacMode::from_heat_level))
    }

    /// Current fan setting.
    #[must_use]
    pub fn fan_mode(&self) -> Option<Observed<FanMode>> {
        self.heat_level().map(|o| o.map(FanMode::from_heat_level))
    }

    /// Current thermostat target.
    #[must_use]
    pub fn target_temperature(&self) -> Option<Observed<u8>> {
        read(&self.link, Capability::Thermostat, |v| v.as_integer())
    }

    /// Sets the mode.
    ///
    /// Switching to [`HvacMode::Heat`] keeps an already selected heat level
    /// and picks [`HeatLevel::Low`] otherwise. Switching to
    /// [`HvacMode::Off`] leaves main power alone.
    ///
    /// # Errors
    ///
    /// Returns an error if a command fails; later commands are not sent.
    pub async fn set_hvac_mode(&self, mode: HvacMode) -> Result<()> {
        let level = match mode {
            HvacMode::Heat => {
                self.ensure_powered().await?;
                match self.current_level() {
                    HeatLevel::Off => HeatLevel::Low,
                    level => level,
                }
            }
            HvacMode::Off => HeatLevel::Off,
        };
        write(&self.link, Command::SetHeatLevel(level)).await
    }

    /// Sets the fan setting.
    ///
    /// [`FanMode::Off`] only turns the heater off.
    ///
    /// # Errors
    ///
    /// Returns an error if a command fails; later commands are not sent.
    pub async fn set_fan_mode(&self, mode: FanMode) -> Result<()> {
        if mode != FanMode::Off {
            self.ensure_powered().await?;
        }
        write(&self.link, Command::SetHeatLevel(mode.heat_level())).await
    }

    /// Sets the thermostat target, clamped to the device's range.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn set_target_temperature(&self, target: i32) -> Result<()> {
        let target = self.link.limits().thermostat.clamp(target);
        write(&self.link, Command::SetThermostat(target)).await
    }

    fn current_level(&self) -> HeatLevel {
        self.heat_level().map_or(HeatLevel::Off, |o| o.value)
    }

    async fn ensure_powered(&self) -> Result<()> {
        let on = read(&self.link, Capability::Power, |v| v.as_bool()).is_some_and(|o| o.value);
        if !on {
            tracing::debug!(address = %self.link.address(), "Powering on before heating");
            self.link.mutate(Command::SetPower(true)).await?;
        }
        Ok(())
    }
}

impl Surface for Climate {
    fn key(&self) -> &'static str {
        Self::KEY
    }

    fn coordinator(&self) -> &CoordinatorHandle {
        &self.link
    }
}
