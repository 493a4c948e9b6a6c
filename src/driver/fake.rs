// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Scripted in-memory driver for unit tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use super::{DeviceDriver, DeviceIdentity, DriverProvider, LedState, StateReport};
use crate::error::DriverError;
use crate::types::{BleAddress, HeatLevel, LedChannel, LedColor};

/// One recorded driver call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DriverCall {
    Connect,
    Disconnect,
    Query,
    SetPower(bool),
    SetHeat(HeatLevel),
    SetThermostat(u8),
    SetColor(LedChannel, LedColor),
    SetBrightness(LedChannel, u8),
}

impl DriverCall {
    pub(crate) fn is_mutation(self) -> bool {
        !matches!(self, Self::Connect | Self::Disconnect | Self::Query)
    }
}

#[derive(Debug)]
struct Script {
    state: StateReport,
    calls: Vec<DriverCall>,
    connect_failures: u32,
    connect_delay: Duration,
    query_delay: Duration,
    mutation_delay: Duration,
    identity_known: bool,
    fail_queries: bool,
    fail_mutations: bool,
    fail_disconnect: bool,
    lag_power_off: bool,
}

/// Test-side view of a fake driver; clones share the same script.
#[derive(Debug, Clone)]
pub(crate) struct FakeControl {
    script: Arc<Mutex<Script>>,
}

impl FakeControl {
    pub(crate) fn new() -> Self {
        Self {
            script: Arc::new(Mutex::new(Script {
                state: default_report(),
                calls: Vec::new(),
                connect_failures: 0,
                connect_delay: Duration::ZERO,
                query_delay: Duration::ZERO,
                mutation_delay: Duration::ZERO,
                identity_known: true,
                fail_queries: false,
                fail_mutations: false,
                fail_disconnect: false,
                lag_power_off: false,
            })),
        }
    }

    pub(crate) fn driver(&self) -> FakeDriver {
        FakeDriver {
            script: Arc::clone(&self.script),
        }
    }

    pub(crate) fn set_state(&self, f: impl FnOnce(&mut StateReport)) {
        f(&mut self.script.lock().state);
    }

    pub(crate) fn state(&self) -> StateReport {
        self.script.lock().state
    }

    pub(crate) fn fail_connects(&self, times: u32) {
        self.script.lock().connect_failures = times;
    }

    pub(crate) fn set_connect_delay(&self, delay: Duration) {
        self.script.lock().connect_delay = delay;
    }

    pub(crate) fn set_query_delay(&self, delay: Duration) {
        self.script.lock().query_delay = delay;
    }

    pub(crate) fn set_mutation_delay(&self, delay: Duration) {
        self.script.lock().mutation_delay = delay;
    }

    /// Reports an empty identity until the first successful connect.
    pub(crate) fn learn_identity_on_connect(&self) {
        self.script.lock().identity_known = false;
    }

    pub(crate) fn fail_queries(&self, fail: bool) {
        self.script.lock().fail_queries = fail;
    }

    pub(crate) fn fail_mutations(&self, fail: bool) {
        self.script.lock().fail_mutations = fail;
    }

    pub(crate) fn fail_disconnect(&self, fail: bool) {
        self.script.lock().fail_disconnect = fail;
    }

    /// Keeps reporting power on after a power-off command.
    pub(crate) fn lag_power_off(&self, lag: bool) {
        self.script.lock().lag_power_off = lag;
    }

    pub(crate) fn calls(&self) -> Vec<DriverCall> {
        self.script.lock().calls.clone()
    }

    pub(crate) fn mutations(&self) -> Vec<DriverCall> {
        self.calls().into_iter().filter(|c| c.is_mutation()).collect()
    }

    pub(crate) fn count(&self, call: DriverCall) -> usize {
        self.script.lock().calls.iter().filter(|c| **c == call).count()
    }

    pub(crate) fn clear_calls(&self) {
        self.script.lock().calls.clear();
    }
}

pub(crate) fn default_report() -> StateReport {
    StateReport {
        powered_on: false,
        heat_level: HeatLevel::Off,
        thermostat: 20,
        flame: LedState {
            color: LedColor::Amber,
            brightness: 5,
        },
        fuel: LedState {
            color: LedColor::Red,
            brightness: 5,
        },
    }
}

pub(crate) struct FakeDriver {
    script: Arc<Mutex<Script>>,
}

impl FakeDriver {
    fn record(&self, call: DriverCall) {
        self.script.lock().calls.push(call);
    }

    async fn mutate(
        &self,
        call: DriverCall,
        apply: impl FnOnce(&mut Script),
    ) -> Result<(), DriverError> {
        let delay = self.script.lock().mutation_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let mut script = self.script.lock();
        script.calls.push(call);
        if script.fail_mutations {
            return Err(DriverError::CommandRejected(format!("{call:?}")));
        }
        apply(&mut script);
        Ok(())
    }
}

impl DeviceDriver for FakeDriver {
    async fn connect(&mut self) -> Result<(), DriverError> {
        self.record(DriverCall::Connect);
        let delay = self.script.lock().connect_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let mut script = self.script.lock();
        if script.connect_failures > 0 {
            script.connect_failures -= 1;
            return Err(DriverError::ConnectionFailed("not paired".to_string()));
        }
        script.identity_known = true;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), DriverError> {
        self.record(DriverCall::Disconnect);
        if self.script.lock().fail_disconnect {
            return Err(DriverError::Io("already gone".to_string()));
        }
        Ok(())
    }

    async fn query_state(&mut self) -> Result<StateReport, DriverError> {
        self.record(DriverCall::Query);
        let delay = self.script.lock().query_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let script = self.script.lock();
        if script.fail_queries {
            return Err(DriverError::Io("no response".to_string()));
        }
        Ok(script.state)
    }

    async fn set_powered_on(&mut self, on: bool) -> Result<(), DriverError> {
        self.mutate(DriverCall::SetPower(on), |s| {
            if on || !s.lag_power_off {
                s.state.powered_on = on;
            }
        })
        .await
    }

    async fn set_heat_level(&mut self, level: HeatLevel) -> Result<(), DriverError> {
        self.mutate(DriverCall::SetHeat(level), |s| s.state.heat_level = level).await
    }

    async fn set_thermostat(&mut self, target: u8) -> Result<(), DriverError> {
        self.mutate(DriverCall::SetThermostat(target), |s| {
            s.state.thermostat = target;
        })
        .await
    }

    async fn set_color(&mut self, channel: LedChannel, color: LedColor) -> Result<(), DriverError> {
        self.mutate(DriverCall::SetColor(channel, color), |s| match channel {
            LedChannel::Flame => s.state.flame.color = color,
            LedChannel::Fuel => s.state.fuel.color = color,
        })
        .await
    }

    async fn set_brightness(
        &mut self,
        channel: LedChannel,
        brightness: u8,
    ) -> Result<(), DriverError> {
        self.mutate(DriverCall::SetBrightness(channel, brightness), |s| {
            match channel {
                LedChannel::Flame => s.state.flame.brightness = brightness,
                LedChannel::Fuel => s.state.fuel.brightness = brightness,
            }
        })
        .await
    }

    fn identity(&self) -> DeviceIdentity {
        if !self.script.lock().identity_known {
            return DeviceIdentity::default();
        }
        DeviceIdentity {
            serial_number: "FR0001".to_string(),
            manufacturer: "Flamerite".to_string(),
            model: "NITRA".to_string(),
            firmware_revision: "1.2".to_string(),
            hardware_revision: "A".to_string(),
            name: "Fireplace".to_string(),
        }
    }
}

/// Provider that hands out fake drivers for registered addresses.
#[derive(Debug, Clone, Default)]
pub(crate) struct FakeProvider {
    devices: Arc<Mutex<HashMap<BleAddress, FakeControl>>>,
    opens: Arc<Mutex<u32>>,
}

impl FakeProvider {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(&self, address: BleAddress) -> FakeControl {
        let control = FakeControl::new();
        self.devices.lock().insert(address, control.clone());
        control
    }

    pub(crate) fn remove(&self, address: &BleAddress) {
        self.devices.lock().remove(address);
    }

    pub(crate) fn opens(&self) -> u32 {
        *self.opens.lock()
    }
}

impl DriverProvider for FakeProvider {
    type Driver = FakeDriver;

    fn open(&self, address: &BleAddress) -> Option<FakeDriver> {
        let devices = self.devices.lock();
        let control = devices.get(address)?;
        *self.opens.lock() += 1;
        Some(control.driver())
    }
}
