// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-capability debounce overlay.
//!
//! Some actuators keep reporting their old value for a while after being
//! switched off. While an overlay entry is active, reads of that capability
//! return the forced value instead of the polled one.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

use crate::capability::{Capability, CapabilityValue};

#[derive(Debug, Clone, Copy)]
struct Forced {
    value: CapabilityValue,
    until: Instant,
}

/// Forced values with monotonic expiry, keyed by capability.
#[derive(Debug, Default)]
pub struct DebounceOverlay {
    entries: Mutex<HashMap<Capability, Forced>>,
}

impl DebounceOverlay {
    /// Creates an empty overlay.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Forces `value` for `capability` until `window` has elapsed.
    ///
    /// Replaces any existing entry for the capability.
    pub fn force(&self, capability: Capability, value: CapabilityValue, window: Duration) {
        let until = Instant::now() + window;
        tracing::debug!(
            %capability,
            ?value,
            window_ms = window.as_millis(),
            "Debounce overlay installed"
        );
        self.entries
            .lock()
            .insert(capability, Forced { value, until });
    }

    /// Drops the entry for `capability`, if any.
    pub fn clear(&self, capability: Capability) {
        if self.entries.lock().remove(&capability).is_some() {
            tracing::debug!(%capability, "Debounce overlay cleared");
        }
    }

    /// Returns the forced value if the entry has not expired.
    ///
    /// Expired entries are removed.
    #[must_use]
    pub fn get(&self, capability: Capability) -> Option<CapabilityValue> {
        let mut entries = self.entries.lock();
        match entries.get(&capability) {
            Some(forced) if Instant::now() < forced.until => Some(forced.value),
            Some(_) => {
                entries.remove(&capability);
                None
            }
            None => None,
        }
    }

    /// Time left on the entry for `capability`.
    #[must_use]
    pub fn remaining(&self, capability: Capability) -> Option<Duration> {
        let entries = self.entries.lock();
        let forced = entries.get(&capability)?;
        let left = forced.until.saturating_duration_since(Instant::now());
        (!left.is_zero()).then_some(left)
    }
}
