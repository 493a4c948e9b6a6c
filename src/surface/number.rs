// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! LED brightness control.

use super::{Surface, read, write};
use crate::capability::{Capability, Command};
use crate::coordinator::{CoordinatorHandle, Observed};
use crate::error::Result;
use crate::types::LedChannel;

/// Brightness slider for one LED strip.
#[derive(Debug, Clone)]
pub struct BrightnessControl {
    link: CoordinatorHandle,
    channel: LedChannel,
}

impl BrightnessControl {
    /// Creates the control for `channel`.
    #[must_use]
    pub fn new(link: CoordinatorHandle, channel: LedChannel) -> Self {
        Self { link, channel }
    }

    /// The strip this control adjusts.
    #[must_use]
    pub fn channel(&self) -> LedChannel {
        self.channel
    }

    /// Lowest accepted level.
    #[must_use]
    pub fn min(&self) -> u8 {
        self.link.limits().brightness.min()
    }

    /// Highest accepted level.
    #[must_use]
    pub fn max(&self) -> u8 {
        self.link.limits().brightness.max()
    }

    /// Current level.
    #[must_use]
    pub fn value(&self) -> Option<Observed<u8>> {
        read(&self.link, Capability::Brightness(self.channel), |v| v.as_integer())
    }

    /// Sets the level, clamped to the device's range.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn set_value(&self, level: i32) -> Result<()> {
        let level = self.link.limits().brightness.clamp(level);
        write(&self.link, Command::SetBrightness(self.channel, level)).await
    }
}

impl Surface for BrightnessControl {
    fn key(&self) -> &'static str {
        Capability::Brightness(self.channel).key()
    }

    fn coordinator(&self) -> &CoordinatorHandle {
        &self.link
    }
}
