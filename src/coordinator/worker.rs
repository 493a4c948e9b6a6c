// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The single task that owns device I/O for a coordinator.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{self, Instant, MissedTickBehavior};

use super::{DeviceSnapshot, PollPhase, Shared};
use crate::capability::Command;
use crate::driver::DeviceDriver;
use crate::error::DriverError;
use crate::handle::DeviceHandle;

/// Work queued for the worker.
#[derive(Debug)]
pub(crate) enum Job {
    /// Apply a command and report the outcome.
    Mutate {
        command: Command,
        reply: oneshot::Sender<Result<(), DriverError>>,
    },
    /// Poll outside the regular schedule.
    Refresh,
}

/// Runs until `stop` changes or its sender is dropped.
///
/// Jobs are handled in arrival order, so a mutation queued before a refresh
/// request is applied before that refresh queries the device. A due tick
/// runs before the next queued job. At most one
/// extra poll runs between two scheduled ticks; later requests wait for the
/// next tick.
pub(crate) async fn run<D: DeviceDriver>(
    handle: DeviceHandle<D>,
    shared: Arc<Shared>,
    mut jobs: mpsc::Receiver<Job>,
    mut stop: watch::Receiver<bool>,
) {
    let period = shared.config.effective_update_interval();
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut extra_used = false;

    tracing::debug!(
        address = %handle.address(),
        interval_ms = period.as_millis(),
        "Poll worker started"
    );

    loop {
        tokio::select! {
            biased;

            _ = stop.changed() => break,

            // A due tick wins over queued jobs
            _ = ticker.tick() => {
                extra_used = false;
                poll(&handle, &shared).await;
            }

            job = jobs.recv() => match job {
                Some(Job::Mutate { command, reply }) => {
                    let result = execute(&handle, &shared, command).await;
                    // Caller may have given up waiting
                    let _ = reply.send(result);
                }
                Some(Job::Refresh) => {
                    shared.refresh_queued.store(false, Ordering::Release);
                    if extra_used {
                        tracing::debug!(
                            address = %handle.address(),
                            "Refresh deferred to next tick"
                        );
                    } else {
                        extra_used = true;
                        poll(&handle, &shared).await;
                    }
                }
                None => break,
            },
        }
    }

    tracing::debug!(address = %handle.address(), "Poll worker stopped");
}

/// Queries the device once and publishes the outcome.
pub(crate) async fn poll<D: DeviceDriver>(handle: &DeviceHandle<D>, shared: &Shared) -> bool {
    shared.state.send_modify(|s| {
        s.phase = PollPhase::Refreshing;
        s.queries += 1;
    });

    let result = {
        let mut driver = handle.driver().await;
        driver.query_state().await
    };

    match result {
        Ok(report) => {
            shared.state.send_modify(|s| {
                let sequence = s.snapshot.as_ref().map_or(1, |prev| prev.sequence() + 1);
                s.snapshot = Some(Arc::new(DeviceSnapshot::new(sequence, report)));
                s.phase = PollPhase::Connected;
                s.stale = false;
                s.consecutive_failures = 0;
                s.last_error = None;
            });
            tracing::debug!(
                address = %handle.address(),
                powered_on = report.powered_on,
                heat_level = %report.heat_level,
                "State refreshed"
            );
            true
        }
        Err(e) => {
            let mut failures = 0;
            shared.state.send_modify(|s| {
                s.phase = PollPhase::Unavailable;
                s.stale = true;
                s.consecutive_failures += 1;
                s.last_error = Some(e.to_string());
                failures = s.consecutive_failures;
            });
            tracing::warn!(address = %handle.address(), error = %e, failures, "State query failed");
            false
        }
    }
}

async fn execute<D: DeviceDriver>(
    handle: &DeviceHandle<D>,
    shared: &Shared,
    command: Command,
) -> Result<(), DriverError> {
    let result = {
        let mut driver = handle.driver().await;
        command.apply(&mut *driver).await
    };

    match &result {
        Ok(()) => {
            tracing::debug!(address = %handle.address(), %command, "Command applied");
            shared.settle(command);
        }
        Err(e) => {
            tracing::warn!(address = %handle.address(), %command, error = %e, "Command failed");
        }
    }

    result
}
