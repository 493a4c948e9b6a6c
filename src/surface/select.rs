// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! LED color selection.

use super::{Surface, read, write};
use crate::capability::{Capability, Command};
use crate::coordinator::{CoordinatorHandle, Observed};
use crate::error::Result;
use crate::types::{LedChannel, LedColor};

/// Color picker for one LED strip.
#[derive(Debug, Clone)]
pub struct ColorSelect {
    link: CoordinatorHandle,
    channel: LedChannel,
}

impl ColorSelect {
    /// Creates the selector for `channel`.
    #[must_use]
    pub fn new(link: CoordinatorHandle, channel: LedChannel) -> Self {
        Self { link, channel }
    }

    /// The strip this selector controls.
    #[must_use]
    pub fn channel(&self) -> LedChannel {
        self.channel
    }

    /// Names of the selectable colors.
    #[must_use]
    pub fn options(&self) -> Vec<&'static str> {
        LedColor::ALL.iter().map(LedColor::as_str).collect()
    }

    /// Current color.
    #[must_use]
    pub fn current(&self) -> Option<Observed<LedColor>> {
        read(&self.link, Capability::Color(self.channel), |v| v.as_color())
    }

    /// Name of the current color.
    #[must_use]
    pub fn current_option(&self) -> Option<Observed<&'static str>> {
        self.current().map(|o| o.map(|c| c.as_str()))
    }

    /// Selects a color by name.
    ///
    /// # Errors
    ///
    /// Returns `Error::Value` for an unknown name, or an error if the
    /// command fails.
    pub async fn select_option(&self, option: &str) -> Result<()> {
        let color: LedColor = option.parse()?;
        self.set_color(color).await
    }

    /// Sets the color.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn set_color(&self, color: LedColor) -> Result<()> {
        write(&self.link, Command::SetColor(self.channel, color)).await
    }
}

impl Surface for ColorSelect {
    fn key(&self) -> &'static str {
        Capability::Color(self.channel).key()
    }

    fn coordinator(&self) -> &CoordinatorHandle {
        &self.link
    }
}
