// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Heater types.
//!
//! The device itself only knows a three-step [`HeatLevel`]. Climate
//! surfaces present it as a two-value [`HvacMode`] plus a three-value
//! [`FanMode`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// Heater output level as reported and accepted by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeatLevel {
    /// Heater off.
    #[default]
    Off,
    /// Low heat.
    Low,
    /// High heat.
    High,
}

impl HeatLevel {
    /// Returns the lowercase level name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Low => "low",
            Self::High => "high",
        }
    }

    /// Returns `true` unless the heater is off.
    #[must_use]
    pub const fn is_heating(&self) -> bool {
        !matches!(self, Self::Off)
    }
}

impl fmt::Display for HeatLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HeatLevel {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "off" | "0" => Ok(Self::Off),
            "low" | "1" => Ok(Self::Low),
            "high" | "2" => Ok(Self::High),
            _ => Err(ValueError::InvalidHeatLevel(s.to_string())),
        }
    }
}

/// Operating mode shown by the climate surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HvacMode {
    /// Heater off.
    Off,
    /// Heater running at some level.
    Heat,
}

impl HvacMode {
    /// Modes offered to users.
    pub const ALL: [Self; 2] = [Self::Heat, Self::Off];

    /// Derives the mode from a heat level.
    #[must_use]
    pub const fn from_heat_level(level: HeatLevel) -> Self {
        match level {
            HeatLevel::Off => Self::Off,
            HeatLevel::Low | HeatLevel::High => Self::Heat,
        }
    }

    /// Returns the lowercase mode name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Heat => "heat",
        }
    }
}

impl fmt::Display for HvacMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HvacMode {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "off" => Ok(Self::Off),
            "heat" => Ok(Self::Heat),
            _ => Err(ValueError::InvalidHvacMode(s.to_string())),
        }
    }
}

/// Fan-style heat setting shown by the climate surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FanMode {
    /// Heater off.
    Off,
    /// Low heat.
    Low,
    /// High heat.
    High,
}

impl FanMode {
    /// Modes offered to users.
    pub const ALL: [Self; 3] = [Self::Off, Self::Low, Self::High];

    /// Derives the fan setting from a heat level.
    #[must_use]
    pub const fn from_heat_level(level: HeatLevel) -> Self {
        match level {
            HeatLevel::Off => Self::Off,
            HeatLevel::Low => Self::Low,
            HeatLevel::High => Self::High,
        }
    }

    /// Returns the heat level this setting selects.
    #[must_use]
    pub const fn heat_level(&self) -> HeatLevel {
        match self {
            Self::Off => HeatLevel::Off,
            Self::Low => HeatLevel::Low,
            Self::High => HeatLevel::High,
        }
    }

    /// Returns the lowercase mode name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Low => "low",
            Self::High => "high",
        }
    }
}

impl fmt::Display for FanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FanMode {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "off" => Ok(Self::Off),
            "low" => Ok(Self::Low),
            "high" => Ok(Self::High),
            _ => Err(ValueError::InvalidFanMode(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hvac_mode_from_heat_level() {
        assert_eq!(HvacMode::from_heat_level(HeatLevel::Off), HvacMode::Off);
        assert_eq!(HvacMode::from_heat_level(HeatLevel::Low), HvacMode::Heat);
        assert_eq!(HvacMode::from_heat_level(HeatLevel::High), HvacMode::Heat);
    }

    #[test]
    fn fan_mode_maps_both_ways() {
        for mode in FanMode::ALL {
            assert_eq!(FanMode::from_heat_level(mode.heat_level()), mode);
        }
    }

    #[test]
    fn heat_level_from_str() {
        assert_eq!("HIGH".parse::<HeatLevel>().unwrap(), HeatLevel::High);
        assert_eq!("1".parse::<HeatLevel>().unwrap(), HeatLevel::Low);
        assert!("medium".parse::<HeatLevel>().is_err());
    }

    #[test]
    fn mode_parse_errors_name_the_input() {
        assert_eq!(
            "cool".parse::<HvacMode>().unwrap_err(),
            ValueError::InvalidHvacMode("cool".to_string())
        );
        assert_eq!(
            "auto".parse::<FanMode>().unwrap_err(),
            ValueError::InvalidFanMode("auto".to_string())
        );
    }

    #[test]
    fn is_heating() {
        assert!(!HeatLevel::Off.is_heating());
        assert!(HeatLevel::Low.is_heating());
        assert!(HeatLevel::High.is_heating());
    }
}
