// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pairing session handles.

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;
use uuid::Uuid;

use crate::driver::DeviceDriver;
use crate::error::{Error, PairingError};
use crate::handle::DeviceHandle;
use crate::types::BleAddress;

/// Unique identifier for a pairing session.
///
/// A fresh id is issued each time a session starts, so a retry after a
/// failed session can be told apart from the session it replaces.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Creates a new unique session identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let short = &self.0.to_string()[..8];
        write!(f, "SessionId({short}...)")
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Progress of a pairing session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairingStatus {
    /// A connection attempt is running.
    Pending {
        /// 1-based number of the current attempt.
        attempt: u32,
        /// Attempts allowed in total.
        max_attempts: u32,
    },
    /// The device is connected.
    Succeeded,
    /// The session ended without a connection.
    Failed(PairingError),
}

impl PairingStatus {
    /// Returns true once the session has ended.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending { .. })
    }
}

type Outcome<D> = Option<Result<DeviceHandle<D>, PairingError>>;

struct Inner<D> {
    id: SessionId,
    address: BleAddress,
    progress: watch::Sender<PairingStatus>,
    cancel: watch::Sender<bool>,
    outcome: watch::Sender<Outcome<D>>,
}

/// A running pairing session.
///
/// Clones observe the same session. Every caller that attached to the
/// session receives a clone of the same [`DeviceHandle`] on success.
pub struct PairingSession<D> {
    inner: Arc<Inner<D>>,
}

impl<D: DeviceDriver> PairingSession<D> {
    pub(crate) fn new(address: BleAddress, max_attempts: u32) -> Self {
        let (progress, _) = watch::channel(PairingStatus::Pending {
            attempt: 0,
            max_attempts,
        });
        let (cancel, _) = watch::channel(false);
        let (outcome, _) = watch::channel(None);
        Self {
            inner: Arc::new(Inner {
                id: SessionId::new(),
                address,
                progress,
                cancel,
                outcome,
            }),
        }
    }

    /// Creates a session that has already failed.
    pub(crate) fn failed(address: BleAddress, error: PairingError) -> Self {
        let session = Self::new(address, 0);
        session.finish(Err(error));
        session
    }

    /// Returns the session id.
    #[must_use]
    pub fn id(&self) -> SessionId {
        self.inner.id
    }

    /// Returns the address being paired.
    #[must_use]
    pub fn address(&self) -> BleAddress {
        self.inner.address
    }

    /// Subscribes to progress updates.
    #[must_use]
    pub fn progress(&self) -> watch::Receiver<PairingStatus> {
        self.inner.progress.subscribe()
    }

    /// Returns the latest progress.
    #[must_use]
    pub fn status(&self) -> PairingStatus {
        self.inner.progress.borrow().clone()
    }

    /// Returns true once the session has ended.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.inner.outcome.borrow().is_some()
    }

    /// Requests cancellation.
    ///
    /// A session waiting between attempts stops at once; an attempt in
    /// flight is abandoned. Has no effect on a finished session.
    pub fn cancel(&self) {
        if !self.inner.cancel.send_replace(true) {
            tracing::debug!(
                address = %self.inner.address,
                session = %self.inner.id,
                "Pairing cancel requested"
            );
        }
    }

    /// Waits for the session to end.
    ///
    /// # Errors
    ///
    /// Returns `Error::Pairing` with the terminal failure.
    pub async fn wait(&self) -> Result<DeviceHandle<D>, Error> {
        let mut rx = self.inner.outcome.subscribe();
        let outcome = {
            let guard = rx
                .wait_for(Option::is_some)
                .await
                .map_err(|_| PairingError::Cancelled)?;
            guard.clone()
        };
        outcome
            .unwrap_or(Err(PairingError::Cancelled))
            .map_err(Error::from)
    }

    /// Returns the outcome without waiting, if the session has ended.
    #[must_use]
    pub fn try_outcome(&self) -> Option<Result<DeviceHandle<D>, PairingError>> {
        self.inner.outcome.borrow().clone()
    }

    pub(crate) fn cancel_signal(&self) -> watch::Receiver<bool> {
        self.inner.cancel.subscribe()
    }

    pub(crate) fn report(&self, status: PairingStatus) {
        self.inner.progress.send_replace(status);
    }

    /// Publishes the terminal result. The outcome is stored before the
    /// status so a waiter woken by `Succeeded` always finds the handle.
    pub(crate) fn finish(&self, outcome: Result<DeviceHandle<D>, PairingError>) {
        let status = match &outcome {
            Ok(_) => PairingStatus::Succeeded,
            Err(e) => PairingStatus::Failed(e.clone()),
        };
        self.inner.outcome.send_replace(Some(outcome));
        self.inner.progress.send_replace(status);
    }
}

impl<D> Clone for PairingSession<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<D> fmt::Debug for PairingSession<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PairingSession")
            .field("id", &self.inner.id)
            .field("address", &self.inner.address)
            .field("status", &*self.inner.progress.borrow())
            .finish_non_exhaustive()
    }
}
