// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! First-time setup flow.
//!
//! The flow walks a user from discovered devices to a persisted
//! [`ConfigEntry`]:
//!
//! ```text
//! SelectDevice ──select──┐
//!                        ├──> Pairing ──> Complete
//! Confirm ─────confirm───┘        │
//!                                 └─────> Aborted
//! ```
//!
//! Each step returns a [`StepResult`] describing what the presentation
//! layer should show next. Rendering is left to the caller.

use std::fmt;

use tokio::sync::watch;

use super::{PairingCoordinator, PairingSession, PairingStatus};
use crate::config::{ConfigEntry, RetryPolicy};
use crate::discovery;
use crate::driver::{Advertisement, DeviceDriver, DriverProvider};
use crate::error::PairingError;
use crate::handle::DeviceHandle;
use crate::types::BleAddress;

/// Why a setup flow ended without an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AbortReason {
    /// No supported, unconfigured device was discovered.
    NoDevicesFound,
    /// The discovered device is already set up.
    AlreadyConfigured,
    /// The selected device disappeared before pairing.
    DeviceNoLongerPresent,
    /// Pairing did not complete.
    PairingFailed,
}

impl AbortReason {
    /// Stable reason string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NoDevicesFound => "no_devices_found",
            Self::AlreadyConfigured => "already_configured",
            Self::DeviceNoLongerPresent => "device_no_longer_present",
            Self::PairingFailed => "pairing_failed",
        }
    }
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&PairingError> for AbortReason {
    fn from(error: &PairingError) -> Self {
        match error {
            PairingError::DeviceNotFound(_) => Self::DeviceNoLongerPresent,
            PairingError::PairingTimeout { .. } | PairingError::Cancelled => Self::PairingFailed,
        }
    }
}

/// What the caller should present next.
#[derive(Debug, Clone)]
pub enum StepResult {
    /// Let the user pick one of these addresses.
    NeedsSelection(Vec<BleAddress>),
    /// Ask the user to confirm setting up this device.
    NeedsConfirmation(BleAddress),
    /// Pairing is running; the receiver reports attempts.
    InProgress(watch::Receiver<PairingStatus>),
    /// Setup finished; persist this entry.
    Success(ConfigEntry),
    /// Setup ended.
    Aborted(AbortReason),
}

enum FlowState<D> {
    Start,
    SelectDevice { candidates: Vec<BleAddress> },
    Confirm { address: BleAddress },
    Pairing { session: PairingSession<D> },
    Complete { entry: ConfigEntry, device: Option<DeviceHandle<D>> },
    Aborted(AbortReason),
}

impl<D> FlowState<D> {
    const fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::SelectDevice { .. } => "select_device",
            Self::Confirm { .. } => "confirm",
            Self::Pairing { .. } => "pairing",
            Self::Complete { .. } => "complete",
            Self::Aborted(_) => "aborted",
        }
    }
}

/// Setup flow for one appliance.
///
/// # Examples
///
/// ```no_run
/// use flamerite_lib::config::RetryPolicy;
/// use flamerite_lib::pairing::{PairingCoordinator, SetupFlow, StepResult};
/// # use flamerite_lib::driver::{Advertisement, DriverProvider};
///
/// # async fn example<P: DriverProvider>(provider: P, seen: Vec<Advertisement>) {
/// let pairing = PairingCoordinator::new(provider);
/// let mut flow = SetupFlow::new(pairing, RetryPolicy::interactive());
///
/// if let StepResult::NeedsSelection(addresses) = flow.start_user(&seen, &[]) {
///     flow.select(addresses[0]);
///     match flow.wait().await {
///         StepResult::Success(entry) => println!("paired {}", entry.title),
///         StepResult::Aborted(reason) => println!("aborted: {reason}"),
///         _ => {}
///     }
/// }
/// # }
/// ```
pub struct SetupFlow<P: DriverProvider> {
    pairing: PairingCoordinator<P>,
    policy: RetryPolicy,
    state: FlowState<P::Driver>,
}

impl<P: DriverProvider> SetupFlow<P> {
    /// Creates a flow that pairs with `policy`.
    pub fn new(pairing: PairingCoordinator<P>, policy: RetryPolicy) -> Self {
        Self {
            pairing,
            policy,
            state: FlowState::Start,
        }
    }

    /// Starts a user-initiated flow from a scan.
    pub fn start_user(
        &mut self,
        discovered: &[Advertisement],
        configured: &[BleAddress],
    ) -> StepResult {
        let candidates = discovery::candidates::<P::Driver>(discovered, configured);
        if candidates.is_empty() {
            return self.abort(AbortReason::NoDevicesFound);
        }
        tracing::debug!(candidates = candidates.len(), "Setup waiting for device selection");
        self.state = FlowState::SelectDevice { candidates };
        self.current()
    }

    /// Starts a flow for a device the host reported on its own.
    pub fn start_discovered(
        &mut self,
        advertisement: &Advertisement,
        configured: &[BleAddress],
    ) -> StepResult {
        let address = advertisement.address;
        if configured.contains(&address) {
            return self.abort(AbortReason::AlreadyConfigured);
        }
        if !discovery::is_candidate::<P::Driver>(advertisement, configured) {
            return self.abort(AbortReason::NoDevicesFound);
        }
        tracing::debug!(%address, "Setup waiting for confirmation");
        self.state = FlowState::Confirm { address };
        self.current()
    }

    /// Picks a device from the offered candidates and starts pairing.
    ///
    /// An address that was not offered leaves the flow unchanged.
    pub fn select(&mut self, address: BleAddress) -> StepResult {
        let offered = match &self.state {
            FlowState::SelectDevice { candidates } => Some(candidates.contains(&address)),
            _ => None,
        };
        match offered {
            Some(true) => self.pair(address),
            Some(false) => {
                tracing::debug!(%address, "Ignoring selection of unoffered device");
                self.current()
            }
            None => self.current(),
        }
    }

    /// Confirms a discovered device and starts pairing.
    pub fn confirm(&mut self) -> StepResult {
        match self.state {
            FlowState::Confirm { address } => self.pair(address),
            _ => self.current(),
        }
    }

    /// Advances past a finished pairing session without waiting.
    pub fn poll(&mut self) -> StepResult {
        match self.session().and_then(|s| s.try_outcome()) {
            Some(outcome) => self.finish(outcome),
            None => self.current(),
        }
    }

    /// Waits for a running pairing session to end.
    pub async fn wait(&mut self) -> StepResult {
        let Some(session) = self.session() else {
            return self.current();
        };
        let outcome = match session.wait().await {
            Ok(handle) => Ok(handle),
            Err(crate::Error::Pairing(e)) => Err(e),
            Err(_) => Err(PairingError::Cancelled),
        };
        self.finish(outcome)
    }

    /// Cancels a running pairing session.
    ///
    /// Outside the pairing step this only reports the current step.
    pub fn cancel(&mut self) -> StepResult {
        match self.session() {
            Some(session) => {
                session.cancel();
                self.abort(AbortReason::PairingFailed)
            }
            None => self.current(),
        }
    }

    /// Returns the step the flow is on, without advancing it.
    #[must_use]
    pub fn current(&self) -> StepResult {
        match &self.state {
            FlowState::Start => StepResult::NeedsSelection(Vec::new()),
            FlowState::SelectDevice { candidates } => {
                StepResult::NeedsSelection(candidates.clone())
            }
            FlowState::Confirm { address } => StepResult::NeedsConfirmation(*address),
            FlowState::Pairing { session } => StepResult::InProgress(session.progress()),
            FlowState::Complete { entry, .. } => StepResult::Success(entry.clone()),
            FlowState::Aborted(reason) => StepResult::Aborted(*reason),
        }
    }

    /// Returns true once the flow has completed or aborted.
    #[must_use]
    pub fn is_done(&self) -> bool {
        matches!(self.state, FlowState::Complete { .. } | FlowState::Aborted(_))
    }

    /// Takes the connected device out of a completed flow.
    ///
    /// Returns `None` before completion or when already taken.
    pub fn take_device(&mut self) -> Option<DeviceHandle<P::Driver>> {
        match &mut self.state {
            FlowState::Complete { device, .. } => device.take(),
            _ => None,
        }
    }

    fn session(&self) -> Option<PairingSession<P::Driver>> {
        match &self.state {
            FlowState::Pairing { session } => Some(session.clone()),
            _ => None,
        }
    }

    fn pair(&mut self, address: BleAddress) -> StepResult {
        let session = self.pairing.begin(address, &self.policy);
        tracing::info!(%address, session = %session.id(), "Setup pairing started");
        if let Some(outcome) = session.try_outcome() {
            return self.finish(outcome);
        }
        self.state = FlowState::Pairing { session };
        self.current()
    }

    fn finish(&mut self, outcome: Result<DeviceHandle<P::Driver>, PairingError>) -> StepResult {
        match outcome {
            Ok(device) => {
                let entry = entry_for(&device);
                tracing::info!(address = %entry.address, "Setup complete");
                self.state = FlowState::Complete {
                    entry,
                    device: Some(device),
                };
                self.current()
            }
            Err(e) => self.abort(AbortReason::from(&e)),
        }
    }

    fn abort(&mut self, reason: AbortReason) -> StepResult {
        tracing::info!(from = self.state.name(), %reason, "Setup aborted");
        self.state = FlowState::Aborted(reason);
        StepResult::Aborted(reason)
    }
}

impl<P: DriverProvider> fmt::Debug for SetupFlow<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetupFlow")
            .field("state", &self.state.name())
            .finish_non_exhaustive()
    }
}

fn entry_for<D: DeviceDriver>(device: &DeviceHandle<D>) -> ConfigEntry {
    ConfigEntry::new(device.address())
}
