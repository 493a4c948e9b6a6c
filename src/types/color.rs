// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! LED color and channel types.
//!
//! The fireplace has two independently controlled LED strips: the flame
//! effect and the fuel bed. Each strip takes one color from a fixed palette.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// One of the two LED strips of the fireplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedChannel {
    /// The flame effect LEDs.
    Flame,
    /// The fuel bed LEDs.
    Fuel,
}

impl LedChannel {
    /// Both channels, in display order.
    pub const ALL: [Self; 2] = [Self::Flame, Self::Fuel];

    /// Returns the lowercase channel name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Flame => "flame",
            Self::Fuel => "fuel",
        }
    }
}

impl fmt::Display for LedChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Color palette supported by the fireplace LEDs.
///
/// # Examples
///
/// ```
/// use flamerite_lib::types::LedColor;
///
/// let color: LedColor = "amber".parse().unwrap();
/// assert_eq!(color, LedColor::Amber);
/// assert_eq!(color.to_string(), "amber");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedColor {
    /// Red.
    Red,
    /// Orange.
    Orange,
    /// Amber (the factory flame color).
    Amber,
    /// Yellow.
    Yellow,
    /// Green.
    Green,
    /// Blue.
    Blue,
    /// Purple.
    Purple,
    /// White.
    White,
}

impl LedColor {
    /// The full palette, in the order it is presented to users.
    pub const ALL: [Self; 8] = [
        Self::Red,
        Self::Orange,
        Self::Amber,
        Self::Yellow,
        Self::Green,
        Self::Blue,
        Self::Purple,
        Self::White,
    ];

    /// Returns the option name used by selectors.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Orange => "orange",
            Self::Amber => "amber",
            Self::Yellow => "yellow",
            Self::Green => "green",
            Self::Blue => "blue",
            Self::Purple => "purple",
            Self::White => "white",
        }
    }
}

impl fmt::Display for LedColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LedColor {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == lower)
            .ok_or_else(|| ValueError::InvalidColor(s.to_string()))
    }
}
