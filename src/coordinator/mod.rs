// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Polling coordinator.
//!
//! A [`PollingCoordinator`] takes ownership of a connected
//! [`DeviceHandle`] and runs one background task that
//!
//! - queries the device on a fixed interval,
//! - applies commands queued by surfaces, one at a time,
//! - runs coalesced on-demand refreshes.
//!
//! Every query result replaces the published [`DeviceSnapshot`] wholesale.
//! Readers never block on device I/O; they get the last snapshot together
//! with a staleness flag.
//!
//! # Examples
//!
//! ```no_run
//! use flamerite_lib::capability::{Capability, Command};
//! use flamerite_lib::config::CoordinatorConfig;
//! use flamerite_lib::coordinator::PollingCoordinator;
//! # use flamerite_lib::driver::DeviceDriver;
//! # use flamerite_lib::handle::DeviceHandle;
//!
//! # async fn example<D: DeviceDriver>(handle: DeviceHandle<D>) -> flamerite_lib::Result<()> {
//! let coordinator = PollingCoordinator::start(handle, CoordinatorConfig::default()).await;
//! let link = coordinator.handle();
//!
//! link.mutate(Command::SetPower(true)).await?;
//! link.request_refresh();
//!
//! if let Some(power) = link.observe(Capability::Power) {
//!     println!("power: {:?} (stale: {})", power.value, power.stale);
//! }
//!
//! coordinator.disconnect().await;
//! # Ok(())
//! # }
//! ```

mod overlay;
mod snapshot;
mod worker;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

pub use overlay::DebounceOverlay;
pub use snapshot::DeviceSnapshot;
use worker::Job;

use crate::capability::{Capability, CapabilityValue, Command};
use crate::config::CoordinatorConfig;
use crate::driver::{DeviceDriver, DeviceIdentity, DeviceLimits};
use crate::error::{Error, Result};
use crate::handle::{ConnectionState, DeviceHandle};
use crate::types::BleAddress;

/// Lifecycle phase of a coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollPhase {
    /// No query has run yet.
    #[default]
    Idle,
    /// The last query succeeded.
    Connected,
    /// A query is in flight.
    Refreshing,
    /// The last query failed; the snapshot is stale.
    Unavailable,
    /// The coordinator has been shut down.
    Stopped,
}

/// Everything a reader can learn about the coordinator without I/O.
#[derive(Debug, Clone, Default)]
pub struct PollState {
    /// Current phase.
    pub phase: PollPhase,
    /// Last successful snapshot.
    pub snapshot: Option<Arc<DeviceSnapshot>>,
    /// True when the last query failed or the coordinator stopped.
    pub stale: bool,
    /// Queries attempted so far.
    pub queries: u64,
    /// Failed queries since the last success.
    pub consecutive_failures: u32,
    /// Error text of the last failed query.
    pub last_error: Option<String>,
}

impl PollState {
    /// Returns true if a fresh snapshot is available.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.snapshot.is_some()
            && !self.stale
            && matches!(self.phase, PollPhase::Connected | PollPhase::Refreshing)
    }
}

/// A value read through the coordinator, with its staleness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observed<T> {
    /// The value.
    pub value: T,
    /// True if the value comes from a snapshot the last poll could not
    /// confirm.
    pub stale: bool,
}

impl<T> Observed<T> {
    /// Converts the value, keeping the staleness flag.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Observed<U> {
        Observed {
            value: f(self.value),
            stale: self.stale,
        }
    }
}

/// State shared between the worker and every [`CoordinatorHandle`].
#[derive(Debug)]
pub(crate) struct Shared {
    address: BleAddress,
    identity: DeviceIdentity,
    limits: DeviceLimits,
    config: CoordinatorConfig,
    state: watch::Sender<PollState>,
    overlay: DebounceOverlay,
    refresh_queued: AtomicBool,
    jobs: mpsc::Sender<Job>,
}

impl Shared {
    /// Updates the debounce overlay after a successful command.
    fn settle(&self, command: Command) {
        let capability = command.capability();
        match self.config.debounce_window(capability) {
            Some(window) if command.is_off() => {
                self.overlay.force(capability, command.value(), window);
            }
            _ => self.overlay.clear(capability),
        }
    }
}

/// Owns the background poll task for one device.
///
/// Dropping the coordinator stops the task but leaves the driver link open;
/// call [`disconnect`](Self::disconnect) to release it.
pub struct PollingCoordinator<D: DeviceDriver> {
    device: DeviceHandle<D>,
    link: CoordinatorHandle,
    stop: watch::Sender<bool>,
    worker: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

impl<D: DeviceDriver> PollingCoordinator<D> {
    /// Runs a first query, then starts polling in the background.
    ///
    /// The outcome of the first query is visible through
    /// [`CoordinatorHandle::state`] as soon as this returns.
    pub async fn start(device: DeviceHandle<D>, config: CoordinatorConfig) -> Self {
        let (jobs_tx, jobs_rx) = mpsc::channel(config.job_queue_capacity.max(1));
        let (state_tx, _) = watch::channel(PollState::default());
        let (stop_tx, stop_rx) = watch::channel(false);

        let shared = Arc::new(Shared {
            address: device.address(),
            identity: device.identity(),
            limits: device.limits(),
            config,
            state: state_tx,
            overlay: DebounceOverlay::new(),
            refresh_queued: AtomicBool::new(false),
            jobs: jobs_tx,
        });

        worker::poll(&device, &shared).await;

        let task = tokio::spawn(worker::run(
            device.clone(),
            Arc::clone(&shared),
            jobs_rx,
            stop_rx,
        ));

        tracing::info!(
            address = %shared.address,
            serial_number = %shared.identity.serial_number,
            interval_ms = shared.config.effective_update_interval().as_millis(),
            "Polling started"
        );

        Self {
            device,
            link: CoordinatorHandle { shared },
            stop: stop_tx,
            worker: parking_lot::Mutex::new(Some(task)),
        }
    }

    /// Returns a cloneable handle for readers and writers.
    #[must_use]
    pub fn handle(&self) -> CoordinatorHandle {
        self.link.clone()
    }

    /// Returns the device handle the coordinator owns.
    #[must_use]
    pub fn device(&self) -> &DeviceHandle<D> {
        &self.device
    }

    /// Stops polling and releases the device link.
    ///
    /// Waits for the worker to finish its current job. Jobs still queued
    /// fail with [`Error::NotConnected`]. Errors from the driver's
    /// disconnect are logged and ignored. Calling this more than once is a
    /// no-op.
    pub async fn disconnect(&self) {
        let Some(task) = self.worker.lock().take() else {
            return;
        };

        // Receiver lives in the task; a send error means it already exited
        let _ = self.stop.send(true);
        if let Err(e) = task.await {
            tracing::debug!(
                address = %self.device.address(),
                error = %e,
                "Poll worker ended abnormally"
            );
        }

        {
            let mut driver = self.device.driver().await;
            if let Err(e) = driver.disconnect().await {
                tracing::debug!(
                    address = %self.device.address(),
                    error = %e,
                    "Ignoring disconnect error"
                );
            }
        }
        self.device.transition(ConnectionState::Disconnected);

        self.link.shared.state.send_modify(|s| {
            s.phase = PollPhase::Stopped;
            s.stale = true;
        });

        tracing::info!(address = %self.device.address(), "Polling stopped");
    }
}

impl<D: DeviceDriver> Drop for PollingCoordinator<D> {
    fn drop(&mut self) {
        if self.worker.lock().is_some() {
            let _ = self.stop.send(true);
        }
    }
}

impl<D: DeviceDriver> std::fmt::Debug for PollingCoordinator<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollingCoordinator")
            .field("device", &self.device)
            .field("phase", &self.link.phase())
            .finish_non_exhaustive()
    }
}

/// Cloneable access to a running coordinator.
///
/// Reads are served from the last snapshot and never wait on the device.
#[derive(Debug, Clone)]
pub struct CoordinatorHandle {
    shared: Arc<Shared>,
}

impl CoordinatorHandle {
    /// Returns the device address.
    #[must_use]
    pub fn address(&self) -> BleAddress {
        self.shared.address
    }

    /// Returns the device identity.
    #[must_use]
    pub fn identity(&self) -> &DeviceIdentity {
        &self.shared.identity
    }

    /// Returns the device's integer bounds.
    #[must_use]
    pub fn limits(&self) -> DeviceLimits {
        self.shared.limits
    }

    /// Returns the current poll state.
    #[must_use]
    pub fn state(&self) -> PollState {
        self.shared.state.borrow().clone()
    }

    /// Returns the current phase.
    #[must_use]
    pub fn phase(&self) -> PollPhase {
        self.shared.state.borrow().phase
    }

    /// Returns the last successful snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Option<Arc<DeviceSnapshot>> {
        self.shared.state.borrow().snapshot.clone()
    }

    /// Returns true if the last query succeeded.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.shared.state.borrow().is_available()
    }

    /// Subscribes to poll state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PollState> {
        self.shared.state.subscribe()
    }

    /// Asks for a poll outside the regular schedule.
    ///
    /// Returns immediately. Requests made while one is already queued are
    /// merged into it.
    pub fn request_refresh(&self) {
        if self.shared.refresh_queued.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Err(e) = self.shared.jobs.try_send(Job::Refresh) {
            self.shared.refresh_queued.store(false, Ordering::Release);
            tracing::debug!(address = %self.shared.address, error = %e, "Refresh request dropped");
        }
    }

    /// Applies a command to the device.
    ///
    /// The command runs after any job already queued. Once it succeeds,
    /// an off command for a debounced capability forces the off value for
    /// that capability's settle window.
    ///
    /// # Errors
    ///
    /// Returns `Error::Driver` if the device rejects the command and
    /// `Error::NotConnected` if the coordinator has stopped.
    pub async fn mutate(&self, command: Command) -> Result<()> {
        let (reply, outcome) = oneshot::channel();
        self.shared
            .jobs
            .send(Job::Mutate { command, reply })
            .await
            .map_err(|_| Error::NotConnected)?;
        outcome.await.map_err(|_| Error::NotConnected)??;
        Ok(())
    }

    /// Reads a capability, applying any active debounce override.
    ///
    /// Returns `None` before the first successful query.
    #[must_use]
    pub fn observe(&self, capability: Capability) -> Option<Observed<CapabilityValue>> {
        let (snapshot, stale) = {
            let state = self.shared.state.borrow();
            (state.snapshot.clone(), state.stale)
        };
        let snapshot = snapshot?;
        let value = self
            .shared
            .overlay
            .get(capability)
            .unwrap_or_else(|| capability.read(&snapshot));
        Some(Observed { value, stale })
    }

    /// Returns the forced value for a capability, if its settle window is
    /// still open.
    #[must_use]
    pub fn debounced(&self, capability: Capability) -> Option<CapabilityValue> {
        self.shared.overlay.get(capability)
    }
}
