// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pairing and connection establishment.
//!
//! The [`PairingCoordinator`] turns an address into a connected
//! [`DeviceHandle`], retrying the driver's connect operation according to a
//! [`RetryPolicy`]. First-time pairing uses a long interactive policy
//! because the appliance only accepts the link once its pair button has
//! been pressed.
//!
//! Only one session runs per address. A second request for the same
//! address attaches to the running session instead of starting another
//! sequence of attempts.
//!
//! # Examples
//!
//! ```no_run
//! use flamerite_lib::config::RetryPolicy;
//! use flamerite_lib::pairing::PairingCoordinator;
//! # use flamerite_lib::driver::DriverProvider;
//!
//! # async fn example<P: DriverProvider>(provider: P) -> flamerite_lib::Result<()> {
//! let pairing = PairingCoordinator::new(provider);
//! let address = "AA:BB:CC:DD:EE:FF".parse()?;
//!
//! let session = pairing.begin(address, &RetryPolicy::interactive());
//! let mut progress = session.progress();
//! tokio::spawn(async move {
//!     while progress.changed().await.is_ok() {
//!         println!("{:?}", *progress.borrow());
//!     }
//! });
//!
//! let handle = session.wait().await?;
//! assert!(handle.is_connected());
//! # Ok(())
//! # }
//! ```

pub mod flow;
mod session;

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;

pub use flow::{AbortReason, SetupFlow, StepResult};
pub use session::{PairingSession, PairingStatus, SessionId};

use crate::config::RetryPolicy;
use crate::driver::{DeviceDriver, DriverProvider};
use crate::error::{PairingError, Result};
use crate::handle::{ConnectionState, DeviceHandle};
use crate::types::BleAddress;

type Registry<D> = Arc<Mutex<HashMap<BleAddress, PairingSession<D>>>>;

/// Runs pairing sessions, at most one per address.
pub struct PairingCoordinator<P: DriverProvider> {
    provider: Arc<P>,
    sessions: Registry<P::Driver>,
}

impl<P: DriverProvider> PairingCoordinator<P> {
    /// Creates a coordinator that opens drivers through `provider`.
    pub fn new(provider: P) -> Self {
        Self {
            provider: Arc::new(provider),
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Returns the driver provider.
    #[must_use]
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Connects to `address`, waiting for the session to end.
    ///
    /// # Errors
    ///
    /// Returns `Error::Pairing` with `DeviceNotFound` if the provider does
    /// not know the address, `PairingTimeout` once every attempt has failed,
    /// or `Cancelled`.
    pub async fn connect(
        &self,
        address: BleAddress,
        policy: &RetryPolicy,
    ) -> Result<DeviceHandle<P::Driver>> {
        self.begin(address, policy).wait().await
    }

    /// Starts a session for `address`, or attaches to the running one.
    ///
    /// When a session is already running, `policy` is ignored.
    pub fn begin(&self, address: BleAddress, policy: &RetryPolicy) -> PairingSession<P::Driver> {
        let mut sessions = self.sessions.lock();
        if let Some(existing) = sessions.get(&address) {
            tracing::debug!(
                %address,
                session = %existing.id(),
                "Attaching to running pairing session"
            );
            return existing.clone();
        }

        let Some(driver) = self.provider.open(&address) else {
            tracing::warn!(%address, "Device not found for pairing");
            return PairingSession::failed(address, PairingError::DeviceNotFound(address));
        };

        let max_attempts = policy.max_attempts.max(1);
        let session = PairingSession::new(address, max_attempts);
        sessions.insert(address, session.clone());
        drop(sessions);

        tracing::info!(%address, session = %session.id(), max_attempts, "Pairing started");

        tokio::spawn(run(
            Arc::clone(&self.sessions),
            session.clone(),
            DeviceHandle::new(address, driver),
            policy.clone(),
        ));

        session
    }

    /// Cancels the running session for `address`.
    ///
    /// Returns false if no session is running.
    pub fn cancel(&self, address: &BleAddress) -> bool {
        let session = self.sessions.lock().get(address).cloned();
        match session {
            Some(session) => {
                session.cancel();
                true
            }
            None => false,
        }
    }

    /// Returns true while a session for `address` is running.
    #[must_use]
    pub fn is_pairing(&self, address: &BleAddress) -> bool {
        self.sessions.lock().contains_key(address)
    }

    /// Returns the addresses with a running session, sorted.
    #[must_use]
    pub fn active_sessions(&self) -> Vec<BleAddress> {
        let mut addresses: Vec<_> = self.sessions.lock().keys().copied().collect();
        addresses.sort_unstable();
        addresses
    }
}

impl<P: DriverProvider> Clone for PairingCoordinator<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            sessions: Arc::clone(&self.sessions),
        }
    }
}

impl<P: DriverProvider> std::fmt::Debug for PairingCoordinator<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PairingCoordinator")
            .field("active_sessions", &self.active_sessions())
            .finish_non_exhaustive()
    }
}

async fn run<D: DeviceDriver>(
    registry: Registry<D>,
    session: PairingSession<D>,
    handle: DeviceHandle<D>,
    policy: RetryPolicy,
) {
    let outcome = attempt(&session, handle, &policy).await;

    // Unregister first so a caller reacting to the result starts fresh
    {
        let mut sessions = registry.lock();
        if sessions
            .get(&session.address())
            .is_some_and(|s| s.id() == session.id())
        {
            sessions.remove(&session.address());
        }
    }

    session.finish(outcome);
}

async fn attempt<D: DeviceDriver>(
    session: &PairingSession<D>,
    handle: DeviceHandle<D>,
    policy: &RetryPolicy,
) -> std::result::Result<DeviceHandle<D>, PairingError> {
    let address = handle.address();
    let max_attempts = policy.max_attempts.max(1);
    let mut cancel = session.cancel_signal();
    handle.transition(ConnectionState::Connecting);

    let mut attempt = 0;
    loop {
        attempt += 1;
        let stop = *cancel.borrow();
        if stop {
            return Err(abandon(&handle, false).await);
        }

        session.report(PairingStatus::Pending {
            attempt,
            max_attempts,
        });

        let result = {
            let mut driver = handle.driver().await;
            let result = tokio::select! {
                biased;
                () = cancelled(&mut cancel) => None,
                r = driver.connect() => Some(r),
            };
            if matches!(result, Some(Ok(()))) {
                handle.capture(&driver);
            }
            result
        };

        match result {
            None => return Err(abandon(&handle, true).await),
            Some(Ok(())) => {
                handle.transition(ConnectionState::Connected);
                tracing::info!(%address, attempt, "Paired");
                return Ok(handle);
            }
            Some(Err(e)) => {
                tracing::debug!(
                    %address,
                    attempt,
                    max_attempts,
                    error = %e,
                    "Connection attempt failed"
                );
            }
        }

        if !policy.should_retry(attempt) {
            break;
        }
        let delay = policy.delay_after(attempt);
        tokio::select! {
            biased;
            () = cancelled(&mut cancel) => return Err(abandon(&handle, false).await),
            () = tokio::time::sleep(delay) => {}
        }
    }

    handle.transition(ConnectionState::Failed(format!(
        "no connection after {attempt} attempts"
    )));
    tracing::warn!(%address, attempts = attempt, "Pairing failed");
    Err(PairingError::PairingTimeout { attempts: attempt })
}

/// Resolves once cancellation has been requested.
async fn cancelled(signal: &mut watch::Receiver<bool>) {
    // A dropped sender means the session is gone; treat it as cancelled
    let _ = signal.wait_for(|c| *c).await;
}

async fn abandon<D: DeviceDriver>(handle: &DeviceHandle<D>, in_flight: bool) -> PairingError {
    if in_flight {
        let mut driver = handle.driver().await;
        if let Err(e) = driver.disconnect().await {
            tracing::debug!(address = %handle.address(), error = %e, "Ignoring disconnect error");
        }
    }
    handle.transition(ConnectionState::Failed("cancelled".to_string()));
    tracing::info!(address = %handle.address(), "Pairing cancelled");
    PairingError::Cancelled
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::driver::fake::{DriverCall, FakeProvider};
    use crate::error::Error;

    fn addr() -> BleAddress {
        "AA:BB:CC:DD:EE:03".parse().unwrap()
    }

    fn quick(attempts: u32) -> RetryPolicy {
        RetryPolicy::new()
            .with_max_attempts(attempts)
            .with_initial_delay(Duration::from_millis(100))
            .with_max_delay(Duration::from_millis(100))
    }

    #[tokio::test(start_paused = true)]
    async fn connects_after_failures() {
        let provider = FakeProvider::new();
        let control = provider.add(addr());
        control.fail_connects(3);
        let pairing = PairingCoordinator::new(provider);

        let handle = pairing.connect(addr(), &RetryPolicy::setup()).await.unwrap();

        assert!(handle.is_connected());
        assert_eq!(control.count(DriverCall::Connect), 4);
        assert!(!pairing.is_pairing(&addr()));
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_connects_share_one_session() {
        let provider = FakeProvider::new();
        let control = provider.add(addr());
        control.set_connect_delay(Duration::from_millis(200));
        let pairing = PairingCoordinator::new(provider.clone());
        let policy = RetryPolicy::interactive();

        let (a, b) = tokio::join!(
            pairing.connect(addr(), &policy),
            pairing.connect(addr(), &policy),
        );

        let a = a.unwrap();
        let b = b.unwrap();
        assert_eq!(provider.opens(), 1);
        assert_eq!(control.count(DriverCall::Connect), 1);
        assert_eq!(a.address(), b.address());
        assert!(a.is_connected() && b.is_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn second_begin_attaches_to_running_session() {
        let provider = FakeProvider::new();
        let control = provider.add(addr());
        control.fail_connects(u32::MAX);
        let pairing = PairingCoordinator::new(provider);

        let first = pairing.begin(addr(), &quick(5));
        let second = pairing.begin(addr(), &quick(5));

        assert_eq!(first.id(), second.id());
        assert_eq!(pairing.active_sessions(), vec![addr()]);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_attempts_leave_no_session() {
        let provider = FakeProvider::new();
        let control = provider.add(addr());
        control.fail_connects(u32::MAX);
        let pairing = PairingCoordinator::new(provider);

        let session = pairing.begin(addr(), &RetryPolicy::interactive());
        let first_id = session.id();
        let err = session.wait().await.unwrap_err();

        assert!(matches!(
            err,
            Error::Pairing(PairingError::PairingTimeout { attempts: 20 })
        ));
        assert_eq!(control.count(DriverCall::Connect), 20);
        assert!(!pairing.is_pairing(&addr()));
        assert!(pairing.active_sessions().is_empty());

        let retry = pairing.begin(addr(), &quick(1));
        assert_ne!(retry.id(), first_id);
    }

    #[tokio::test(start_paused = true)]
    async fn attempt_budget_follows_policy() {
        let provider = FakeProvider::new();
        let control = provider.add(addr());
        control.fail_connects(u32::MAX);
        let pairing = PairingCoordinator::new(provider);

        let err = pairing.connect(addr(), &quick(3)).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Pairing(PairingError::PairingTimeout { attempts: 3 })
        ));
        assert_eq!(control.count(DriverCall::Connect), 3);

        control.clear_calls();
        let err = pairing.connect(addr(), &quick(0)).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Pairing(PairingError::PairingTimeout { attempts: 1 })
        ));
        assert_eq!(control.count(DriverCall::Connect), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn identity_is_read_after_connect() {
        let provider = FakeProvider::new();
        let control = provider.add(addr());
        control.learn_identity_on_connect();
        control.fail_connects(1);
        let pairing = PairingCoordinator::new(provider);

        let handle = pairing.connect(addr(), &quick(3)).await.unwrap();

        assert_eq!(handle.identity().serial_number, "FR0001");
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_address_is_not_found() {
        let pairing = PairingCoordinator::new(FakeProvider::new());

        let err = pairing.connect(addr(), &quick(3)).await.unwrap_err();

        assert!(matches!(
            err,
            Error::Pairing(PairingError::DeviceNotFound(a)) if a == addr()
        ));
        assert!(!pairing.is_pairing(&addr()));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_retry_wait() {
        let provider = FakeProvider::new();
        let control = provider.add(addr());
        control.fail_connects(u32::MAX);
        let pairing = PairingCoordinator::new(provider);

        let session = pairing.begin(addr(), &RetryPolicy::interactive());
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(pairing.cancel(&addr()));

        let err = session.wait().await.unwrap_err();

        assert!(matches!(err, Error::Pairing(PairingError::Cancelled)));
        assert_eq!(session.status(), PairingStatus::Failed(PairingError::Cancelled));
        assert_eq!(control.count(DriverCall::Connect), 1);
        assert!(!pairing.is_pairing(&addr()));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_abandons_in_flight_attempt() {
        let provider = FakeProvider::new();
        let control = provider.add(addr());
        control.set_connect_delay(Duration::from_secs(30));
        let pairing = PairingCoordinator::new(provider);

        let session = pairing.begin(addr(), &quick(3));
        tokio::time::sleep(Duration::from_millis(10)).await;
        session.cancel();

        let started = tokio::time::Instant::now();
        let err = session.wait().await.unwrap_err();

        assert!(matches!(err, Error::Pairing(PairingError::Cancelled)));
        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(control.count(DriverCall::Disconnect), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_without_session_is_noop() {
        let pairing = PairingCoordinator::new(FakeProvider::new());
        assert!(!pairing.cancel(&addr()));
    }

    #[tokio::test(start_paused = true)]
    async fn progress_reports_attempts() {
        let provider = FakeProvider::new();
        let control = provider.add(addr());
        control.fail_connects(1);
        let pairing = PairingCoordinator::new(provider);

        let session = pairing.begin(addr(), &quick(3));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(
            session.status(),
            PairingStatus::Pending {
                attempt: 1,
                max_attempts: 3
            }
        );

        session.wait().await.unwrap();
        assert_eq!(session.status(), PairingStatus::Succeeded);
    }
}
