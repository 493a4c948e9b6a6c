// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device capabilities and the commands that change them.
//!
//! Every controllable field of the fireplace is one [`Capability`] variant.
//! Each variant knows how to read its value out of a
//! [`DeviceSnapshot`] and how to turn a requested value into a [`Command`];
//! each command knows which driver operation carries it out.
//!
//! # Examples
//!
//! ```
//! use flamerite_lib::capability::{Capability, CapabilityValue, Command};
//! use flamerite_lib::types::{LedChannel, LedColor};
//!
//! let cap = Capability::Color(LedChannel::Fuel);
//! assert_eq!(cap.key(), "fuel_leds");
//!
//! let cmd = cap.command(CapabilityValue::Color(LedColor::Blue)).unwrap();
//! assert_eq!(cmd, Command::SetColor(LedChannel::Fuel, LedColor::Blue));
//! assert_eq!(cmd.capability(), cap);
//! ```

use std::fmt;

use crate::coordinator::DeviceSnapshot;
use crate::driver::DeviceDriver;
use crate::error::{DriverError, ValueError};
use crate::types::{HeatLevel, LedChannel, LedColor};

/// A controllable aspect of the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Main power.
    Power,
    /// Heater level.
    HeatLevel,
    /// Thermostat target.
    Thermostat,
    /// Color of one LED strip.
    Color(LedChannel),
    /// Brightness of one LED strip.
    Brightness(LedChannel),
}

impl Capability {
    /// Every capability of the device.
    pub const ALL: [Self; 7] = [
        Self::Power,
        Self::HeatLevel,
        Self::Thermostat,
        Self::Color(LedChannel::Flame),
        Self::Color(LedChannel::Fuel),
        Self::Brightness(LedChannel::Flame),
        Self::Brightness(LedChannel::Fuel),
    ];

    /// Stable key, used in unique ids.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        match self {
            Self::Power => "power_state",
            Self::HeatLevel => "heat_level",
            Self::Thermostat => "thermostat",
            Self::Color(LedChannel::Flame) => "flame_leds",
            Self::Color(LedChannel::Fuel) => "fuel_leds",
            Self::Brightness(LedChannel::Flame) => "flame_brightness",
            Self::Brightness(LedChannel::Fuel) => "fuel_brightness",
        }
    }

    /// Reads this capability's value from a snapshot.
    #[must_use]
    pub fn read(&self, snapshot: &DeviceSnapshot) -> CapabilityValue {
        match *self {
            Self::Power => CapabilityValue::Bool(snapshot.powered_on()),
            Self::HeatLevel => CapabilityValue::HeatLevel(snapshot.heat_level()),
            Self::Thermostat => CapabilityValue::Integer(snapshot.thermostat()),
            Self::Color(channel) => CapabilityValue::Color(snapshot.color(channel)),
            Self::Brightness(channel) => CapabilityValue::Integer(snapshot.brightness(channel)),
        }
    }

    /// Builds the command that sets this capability to `value`.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::WrongKind` if the value does not fit the
    /// capability.
    pub fn command(&self, value: CapabilityValue) -> Result<Command, ValueError> {
        match (*self, value) {
            (Self::Power, CapabilityValue::Bool(on)) => Ok(Command::SetPower(on)),
            (Self::HeatLevel, CapabilityValue::HeatLevel(level)) => {
                Ok(Command::SetHeatLevel(level))
            }
            (Self::Thermostat, CapabilityValue::Integer(target)) => {
                Ok(Command::SetThermostat(target))
            }
            (Self::Color(channel), CapabilityValue::Color(color)) => {
                Ok(Command::SetColor(channel, color))
            }
            (Self::Brightness(channel), CapabilityValue::Integer(level)) => {
                Ok(Command::SetBrightness(channel, level))
            }
            (cap, value) => Err(ValueError::WrongKind {
                capability: cap.key(),
                value: format!("{value:?}"),
            }),
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A value held by a capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityValue {
    /// On/off value.
    Bool(bool),
    /// Heater level.
    HeatLevel(HeatLevel),
    /// Integer setting (thermostat, brightness).
    Integer(u8),
    /// LED color.
    Color(LedColor),
}

impl CapabilityValue {
    /// Returns the boolean, if this is one.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the heat level, if this is one.
    #[must_use]
    pub const fn as_heat_level(&self) -> Option<HeatLevel> {
        match self {
            Self::HeatLevel(level) => Some(*level),
            _ => None,
        }
    }

    /// Returns the integer, if this is one.
    #[must_use]
    pub const fn as_integer(&self) -> Option<u8> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the color, if this is one.
    #[must_use]
    pub const fn as_color(&self) -> Option<LedColor> {
        match self {
            Self::Color(c) => Some(*c),
            _ => None,
        }
    }
}

/// A single device mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Switch main power.
    SetPower(bool),
    /// Set the heater level.
    SetHeatLevel(HeatLevel),
    /// Set the thermostat target.
    SetThermostat(u8),
    /// Set one strip's color.
    SetColor(LedChannel, LedColor),
    /// Set one strip's brightness.
    SetBrightness(LedChannel, u8),
}

impl Command {
    /// The capability this command changes.
    #[must_use]
    pub const fn capability(&self) -> Capability {
        match self {
            Self::SetPower(_) => Capability::Power,
            Self::SetHeatLevel(_) => Capability::HeatLevel,
            Self::SetThermostat(_) => Capability::Thermostat,
            Self::SetColor(channel, _) => Capability::Color(*channel),
            Self::SetBrightness(channel, _) => Capability::Brightness(*channel),
        }
    }

    /// The value the capability holds once the command has taken effect.
    #[must_use]
    pub const fn value(&self) -> CapabilityValue {
        match self {
            Self::SetPower(on) => CapabilityValue::Bool(*on),
            Self::SetHeatLevel(level) => CapabilityValue::HeatLevel(*level),
            Self::SetThermostat(n) | Self::SetBrightness(_, n) => CapabilityValue::Integer(*n),
            Self::SetColor(_, color) => CapabilityValue::Color(*color),
        }
    }

    /// Returns `true` for commands that switch something off.
    #[must_use]
    pub const fn is_off(&self) -> bool {
        matches!(
            self,
            Self::SetPower(false) | Self::SetHeatLevel(HeatLevel::Off)
        )
    }

    /// Runs the command against a driver.
    pub(crate) async fn apply<D: DeviceDriver>(self, driver: &mut D) -> Result<(), DriverError> {
        match self {
            Self::SetPower(on) => driver.set_powered_on(on).await,
            Self::SetHeatLevel(level) => driver.set_heat_level(level).await,
            Self::SetThermostat(target) => driver.set_thermostat(target).await,
            Self::SetColor(channel, color) => driver.set_color(channel, color).await,
            Self::SetBrightness(channel, level) => driver.set_brightness(channel, level).await,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SetPower(on) => write!(f, "power {}", if *on { "on" } else { "off" }),
            Self::SetHeatLevel(level) => write!(f, "heat level {level}"),
            Self::SetThermostat(n) => write!(f, "thermostat {n}"),
            Self::SetColor(channel, color) => write!(f, "{channel} color {color}"),
            Self::SetBrightness(channel, n) => write!(f, "{channel} brightness {n}"),
        }
    }
}
