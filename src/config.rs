// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Configuration types.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::capability::Capability;
use crate::error::ConfigError;
use crate::types::BleAddress;

/// Default interval between state polls.
pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_millis(5000);

/// Shortest accepted interval between state polls.
pub const MIN_UPDATE_INTERVAL: Duration = Duration::from_millis(100);

/// How long the fireplace keeps reporting "on" after being switched off.
pub const POWER_OFF_SETTLE: Duration = Duration::from_secs(7);

/// Connection attempts made when setting up an already-paired device.
pub const SETUP_CONNECT_ATTEMPTS: u32 = 4;

/// Connection attempts made while waiting for the user to press the pair button.
pub const PAIRING_CONNECT_ATTEMPTS: u32 = 20;

/// Retry schedule for connection attempts.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use flamerite_lib::config::RetryPolicy;
///
/// // Reconnecting a known device at startup
/// let policy = RetryPolicy::setup();
/// assert_eq!(policy.max_attempts, 4);
///
/// // First-time pairing
/// let policy = RetryPolicy::interactive();
/// assert_eq!(policy.max_attempts, 20);
///
/// // Custom policy
/// let policy = RetryPolicy::new()
///     .with_max_attempts(5)
///     .with_initial_delay(Duration::from_millis(500))
///     .with_max_delay(Duration::from_secs(2));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first.
    pub max_attempts: u32,
    /// Delay after the first failed attempt.
    pub initial_delay: Duration,
    /// Upper bound on the delay between attempts.
    pub max_delay: Duration,
    /// Multiplier for exponential backoff.
    pub backoff_multiplier: f32,
}

impl RetryPolicy {
    /// Creates a new retry policy with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Policy for reconnecting a configured device during setup.
    #[must_use]
    pub fn setup() -> Self {
        Self {
            max_attempts: SETUP_CONNECT_ATTEMPTS,
            ..Self::default()
        }
    }

    /// Policy for first-time pairing, where the user must press the pair
    /// button on the appliance while attempts continue.
    #[must_use]
    pub fn interactive() -> Self {
        Self {
            max_attempts: PAIRING_CONNECT_ATTEMPTS,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(3),
            backoff_multiplier: 1.5,
        }
    }

    /// Sets the total number of attempts.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Sets the delay after the first failed attempt.
    #[must_use]
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the maximum delay between attempts.
    #[must_use]
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the backoff multiplier.
    #[must_use]
    pub fn with_backoff_multiplier(mut self, multiplier: f32) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Calculates the delay after the given number of failed attempts.
    ///
    /// `failed` is 1 after the first failure.
    #[must_use]
    pub fn delay_after(&self, failed: u32) -> Duration {
        if failed <= 1 {
            return self.initial_delay.min(self.max_delay);
        }

        let multiplier = self
            .backoff_multiplier
            .powi(i32::try_from(failed - 1).unwrap_or(i32::MAX));

        // Safe: initial_delay is seconds, not near f32 precision limits
        #[allow(clippy::cast_precision_loss)]
        let delay_ms = self.initial_delay.as_millis() as f32 * multiplier;

        // Safe: delay_ms is positive and bounded by max_delay below
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let delay = Duration::from_millis(delay_ms as u64);

        delay.min(self.max_delay)
    }

    /// Returns true if another attempt may follow `made` attempts.
    #[must_use]
    pub fn should_retry(&self, made: u32) -> bool {
        made < self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: SETUP_CONNECT_ATTEMPTS,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(5),
            backoff_multiplier: 2.0,
        }
    }
}

/// Settings for the polling coordinator.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use flamerite_lib::capability::Capability;
/// use flamerite_lib::config::CoordinatorConfig;
///
/// let config = CoordinatorConfig::default()
///     .with_update_interval(Duration::from_secs(10))
///     .with_debounce(Capability::HeatLevel, Duration::from_secs(3));
///
/// assert_eq!(config.debounce_window(Capability::Power), Some(Duration::from_secs(7)));
/// ```
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Interval between scheduled polls; never shorter than
    /// [`MIN_UPDATE_INTERVAL`] in effect.
    pub update_interval: Duration,
    /// Capacity of the device job queue.
    pub job_queue_capacity: usize,
    /// Settle windows for capabilities whose off commands lag on the device.
    debounce: HashMap<Capability, Duration>,
}

impl CoordinatorConfig {
    /// Sets the poll interval, raised to [`MIN_UPDATE_INTERVAL`] if shorter.
    #[must_use]
    pub fn with_update_interval(mut self, interval: Duration) -> Self {
        self.update_interval = interval.max(MIN_UPDATE_INTERVAL);
        self
    }

    /// Returns the poll interval the worker runs with.
    #[must_use]
    pub fn effective_update_interval(&self) -> Duration {
        self.update_interval.max(MIN_UPDATE_INTERVAL)
    }

    /// Sets the job queue capacity.
    #[must_use]
    pub fn with_job_queue_capacity(mut self, capacity: usize) -> Self {
        self.job_queue_capacity = capacity.max(1);
        self
    }

    /// Sets the settle window after an off command for a capability.
    #[must_use]
    pub fn with_debounce(mut self, capability: Capability, window: Duration) -> Self {
        self.debounce.insert(capability, window);
        self
    }

    /// Disables debouncing for a capability.
    #[must_use]
    pub fn without_debounce(mut self, capability: Capability) -> Self {
        self.debounce.remove(&capability);
        self
    }

    /// Returns the settle window for a capability, if any.
    #[must_use]
    pub fn debounce_window(&self, capability: Capability) -> Option<Duration> {
        self.debounce.get(&capability).copied()
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            update_interval: DEFAULT_UPDATE_INTERVAL,
            job_queue_capacity: 32,
            debounce: HashMap::from([(Capability::Power, POWER_OFF_SETTLE)]),
        }
    }
}

/// Settings for bringing up a configured appliance.
#[derive(Debug, Clone)]
pub struct ApplianceConfig {
    /// Polling coordinator settings.
    pub coordinator: CoordinatorConfig,
    /// Connection retries during setup.
    pub setup_retry: RetryPolicy,
    /// Fail setup when the first state query fails.
    pub require_initial_state: bool,
}

impl ApplianceConfig {
    /// Sets the coordinator settings.
    #[must_use]
    pub fn with_coordinator(mut self, coordinator: CoordinatorConfig) -> Self {
        self.coordinator = coordinator;
        self
    }

    /// Sets the setup retry policy.
    #[must_use]
    pub fn with_setup_retry(mut self, policy: RetryPolicy) -> Self {
        self.setup_retry = policy;
        self
    }

    /// Sets whether the first state query must succeed.
    #[must_use]
    pub fn with_require_initial_state(mut self, require: bool) -> Self {
        self.require_initial_state = require;
        self
    }
}

impl Default for ApplianceConfig {
    fn default() -> Self {
        Self {
            coordinator: CoordinatorConfig::default(),
            setup_retry: RetryPolicy::setup(),
            require_initial_state: true,
        }
    }
}

/// Persisted record of a successfully paired appliance.
///
/// # Examples
///
/// ```
/// use flamerite_lib::config::ConfigEntry;
///
/// let entry = ConfigEntry::new("AA:BB:CC:DD:EE:FF".parse().unwrap());
/// let json = entry.to_json().unwrap();
/// assert_eq!(ConfigEntry::from_json(&json).unwrap(), entry);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigEntry {
    /// Bluetooth address of the appliance.
    pub address: BleAddress,
    /// Stable unique id (lower-case address).
    pub unique_id: String,
    /// Display title.
    pub title: String,
}

impl ConfigEntry {
    /// Creates an entry titled with the address.
    #[must_use]
    pub fn new(address: BleAddress) -> Self {
        Self {
            address,
            unique_id: address.unique_id(),
            title: address.to_string(),
        }
    }

    /// Sets the display title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Serializes the entry to JSON.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Json` if serialization fails.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Reads an entry from JSON.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Json` for malformed input and
    /// `ConfigError::MissingField` if the unique id is empty.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let entry: Self = serde_json::from_str(json)?;
        if entry.unique_id.is_empty() {
            return Err(ConfigError::MissingField("unique_id".to_string()));
        }
        Ok(entry)
    }
}
