// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device-declared integer ranges.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// An inclusive integer range declared by the device.
///
/// Thermostat targets and LED brightness are both integers bounded by
/// limits the driver reports. Writes are clamped into the range rather than
/// rejected.
///
/// # Examples
///
/// ```
/// use flamerite_lib::types::ValueRange;
///
/// let range = ValueRange::new(1, 10).unwrap();
/// assert_eq!(range.clamp(0), 1);
/// assert_eq!(range.clamp(7), 7);
/// assert_eq!(range.clamp(42), 10);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawRange")]
pub struct ValueRange {
    min: u8,
    max: u8,
}

/// Unchecked wire form; deserialization goes through [`ValueRange::new`].
#[derive(Deserialize)]
struct RawRange {
    min: u8,
    max: u8,
}

impl TryFrom<RawRange> for ValueRange {
    type Error = ValueError;

    fn try_from(raw: RawRange) -> Result<Self, Self::Error> {
        Self::new(raw.min, raw.max)
    }
}

impl ValueRange {
    /// Thermostat range of the reference fireplace, in °C.
    pub const DEFAULT_THERMOSTAT: Self = Self { min: 16, max: 31 };

    /// LED brightness range of the reference fireplace.
    pub const DEFAULT_BRIGHTNESS: Self = Self { min: 1, max: 10 };

    /// Creates a new range.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` if `min` is greater than `max`.
    pub fn new(min: u8, max: u8) -> Result<Self, ValueError> {
        if min > max {
            return Err(ValueError::OutOfRange {
                min: 0,
                max: i32::from(max),
                actual: i32::from(min),
            });
        }
        Ok(Self { min, max })
    }

    /// Lower bound.
    #[must_use]
    pub const fn min(&self) -> u8 {
        self.min
    }

    /// Upper bound.
    #[must_use]
    pub const fn max(&self) -> u8 {
        self.max
    }

    /// Returns `true` if the value lies within the range.
    #[must_use]
    pub fn contains(&self, value: i32) -> bool {
        (i32::from(self.min)..=i32::from(self.max)).contains(&value)
    }

    /// Clamps an arbitrary integer into the range.
    #[must_use]
    pub fn clamp(&self, value: i32) -> u8 {
        let clamped = value.clamp(i32::from(self.min), i32::from(self.max));
        // Clamped into [min, max] which both fit in u8.
        u8::try_from(clamped).unwrap_or(self.max)
    }
}

impl fmt::Display for ValueRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_saturates_both_ends() {
        let range = ValueRange::new(16, 31).unwrap();
        assert_eq!(range.clamp(-5), 16);
        assert_eq!(range.clamp(16), 16);
        assert_eq!(range.clamp(22), 22);
        assert_eq!(range.clamp(31), 31);
        assert_eq!(range.clamp(1000), 31);
    }

    #[test]
    fn deserialize_rejects_inverted_bounds() {
        let err = serde_json::from_str::<ValueRange>(r#"{"min":10,"max":1}"#).unwrap_err();
        assert!(err.to_string().contains("out of range"), "{err}");

        let range: ValueRange = serde_json::from_str(r#"{"min":1,"max":10}"#).unwrap();
        assert_eq!(range, ValueRange::DEFAULT_BRIGHTNESS);
        assert_eq!(range.clamp(5), 5);
    }

    #[test]
    fn contains() {
        let range = ValueRange::new(1, 10).unwrap();
        assert!(range.contains(1));
        assert!(range.contains(10));
        assert!(!range.contains(0));
        assert!(!range.contains(11));
    }

    #[test]
    fn inverted_range_is_rejected() {
        assert!(ValueRange::new(10, 1).is_err());
    }

    #[test]
    fn single_value_range() {
        let range = ValueRange::new(5, 5).unwrap();
        assert_eq!(range.clamp(0), 5);
        assert_eq!(range.clamp(9), 5);
    }
}
