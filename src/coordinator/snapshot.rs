// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Immutable device snapshots.

use chrono::{DateTime, Utc};

use crate::driver::{LedState, StateReport};
use crate::types::{HeatLevel, LedChannel, LedColor};

/// The last successfully queried device state.
///
/// Snapshots are never modified; each poll produces a new one that replaces
/// the previous snapshot wholesale, so a reader always sees every field from
/// the same query.
///
/// # Examples
///
/// ```
/// use flamerite_lib::coordinator::DeviceSnapshot;
/// use flamerite_lib::driver::{LedState, StateReport};
/// use flamerite_lib::types::{HeatLevel, LedChannel, LedColor};
///
/// let led = LedState { color: LedColor::Amber, brightness: 5 };
/// let report = StateReport {
///     powered_on: true,
///     heat_level: HeatLevel::Low,
///     thermostat: 21,
///     flame: led,
///     fuel: led,
/// };
/// let snapshot = DeviceSnapshot::new(1, report);
/// assert!(snapshot.powered_on());
/// assert_eq!(snapshot.brightness(LedChannel::Fuel), 5);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSnapshot {
    sequence: u64,
    queried_at: DateTime<Utc>,
    report: StateReport,
}

impl DeviceSnapshot {
    /// Creates a snapshot stamped with the current wall-clock time.
    #[must_use]
    pub fn new(sequence: u64, report: StateReport) -> Self {
        Self {
            sequence,
            queried_at: Utc::now(),
            report,
        }
    }

    /// Position of this snapshot in the sequence of successful polls.
    #[must_use]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// When the query completed. For display only.
    #[must_use]
    pub fn queried_at(&self) -> DateTime<Utc> {
        self.queried_at
    }

    /// The raw report the snapshot was built from.
    #[must_use]
    pub fn report(&self) -> &StateReport {
        &self.report
    }

    /// Main power.
    #[must_use]
    pub fn powered_on(&self) -> bool {
        self.report.powered_on
    }

    /// Heater level.
    #[must_use]
    pub fn heat_level(&self) -> HeatLevel {
        self.report.heat_level
    }

    /// Thermostat target.
    #[must_use]
    pub fn thermostat(&self) -> u8 {
        self.report.thermostat
    }

    /// State of one LED strip.
    #[must_use]
    pub fn led(&self, channel: LedChannel) -> LedState {
        self.report.led(channel)
    }

    /// Color of one LED strip.
    #[must_use]
    pub fn color(&self, channel: LedChannel) -> LedColor {
        self.led(channel).color
    }

    /// Brightness of one LED strip.
    #[must_use]
    pub fn brightness(&self, channel: LedChannel) -> u8 {
        self.led(channel).brightness
    }
}
