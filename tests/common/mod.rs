// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Simulated fireplace shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use flamerite_lib::driver::{
    Advertisement, DEVICE_SERVICE_UUID, DeviceDriver, DeviceIdentity, DriverProvider, LedState,
    StateReport,
};
use flamerite_lib::error::DriverError;
use flamerite_lib::types::{BleAddress, HeatLevel, LedChannel, LedColor};
use parking_lot::Mutex;
use tokio::time::Instant;

/// One operation seen by the simulated device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Connect,
    Disconnect,
    Query,
    Power(bool),
    Heat(HeatLevel),
    Thermostat(u8),
    Color(LedChannel, LedColor),
    Brightness(LedChannel, u8),
}

#[derive(Debug)]
struct Appliance {
    report: StateReport,
    /// Power stays reported on until this instant after a power-off.
    winding_down_until: Option<Instant>,
    wind_down: Duration,
    /// Connection attempts refused before the pair button is pressed.
    refuse_connects: u32,
    offline: bool,
    ops: Vec<Op>,
}

/// Test-side control of one simulated fireplace.
#[derive(Debug, Clone)]
pub struct Fireplace {
    inner: Arc<Mutex<Appliance>>,
}

impl Fireplace {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Appliance {
                report: StateReport {
                    powered_on: false,
                    heat_level: HeatLevel::Off,
                    thermostat: 21,
                    flame: LedState {
                        color: LedColor::Orange,
                        brightness: 6,
                    },
                    fuel: LedState {
                        color: LedColor::Red,
                        brightness: 4,
                    },
                },
                winding_down_until: None,
                wind_down: Duration::ZERO,
                refuse_connects: 0,
                offline: false,
                ops: Vec::new(),
            })),
        }
    }

    /// Keeps reporting power on for `duration` after a power-off.
    pub fn with_wind_down(self, duration: Duration) -> Self {
        self.inner.lock().wind_down = duration;
        self
    }

    /// Refuses the next `attempts` connection attempts.
    pub fn refuse_connects(&self, attempts: u32) {
        self.inner.lock().refuse_connects = attempts;
    }

    pub fn set_offline(&self, offline: bool) {
        self.inner.lock().offline = offline;
    }

    pub fn update(&self, f: impl FnOnce(&mut StateReport)) {
        f(&mut self.inner.lock().report);
    }

    pub fn report(&self) -> StateReport {
        self.inner.lock().report
    }

    pub fn ops(&self) -> Vec<Op> {
        self.inner.lock().ops.clone()
    }

    pub fn writes(&self) -> Vec<Op> {
        self.ops()
            .into_iter()
            .filter(|op| !matches!(op, Op::Connect | Op::Disconnect | Op::Query))
            .collect()
    }

    pub fn count(&self, op: Op) -> usize {
        self.inner.lock().ops.iter().filter(|o| **o == op).count()
    }

    pub fn forget_ops(&self) {
        self.inner.lock().ops.clear();
    }

    pub fn advertisement(address: BleAddress) -> Advertisement {
        Advertisement::new(address)
            .with_local_name("NITRA")
            .with_service_uuid(DEVICE_SERVICE_UUID)
    }

    fn driver(&self) -> FireplaceDriver {
        FireplaceDriver {
            inner: Arc::clone(&self.inner),
        }
    }
}

pub struct FireplaceDriver {
    inner: Arc<Mutex<Appliance>>,
}

impl FireplaceDriver {
    fn write(&self, op: Op, apply: impl FnOnce(&mut Appliance)) -> Result<(), DriverError> {
        let mut appliance = self.inner.lock();
        appliance.ops.push(op);
        if appliance.offline {
            return Err(DriverError::Io("link lost".to_string()));
        }
        apply(&mut appliance);
        Ok(())
    }
}

impl DeviceDriver for FireplaceDriver {
    async fn connect(&mut self) -> Result<(), DriverError> {
        let mut appliance = self.inner.lock();
        appliance.ops.push(Op::Connect);
        if appliance.refuse_connects > 0 {
            appliance.refuse_connects -= 1;
            return Err(DriverError::ConnectionFailed("pairing refused".to_string()));
        }
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), DriverError> {
        self.inner.lock().ops.push(Op::Disconnect);
        Ok(())
    }

    async fn query_state(&mut self) -> Result<StateReport, DriverError> {
        let mut appliance = self.inner.lock();
        appliance.ops.push(Op::Query);
        if appliance.offline {
            return Err(DriverError::Timeout(2000));
        }
        let mut report = appliance.report;
        if appliance
            .winding_down_until
            .is_some_and(|until| Instant::now() < until)
        {
            report.powered_on = true;
        }
        Ok(report)
    }

    async fn set_powered_on(&mut self, on: bool) -> Result<(), DriverError> {
        self.write(Op::Power(on), |a| {
            if !on && a.report.powered_on && !a.wind_down.is_zero() {
                a.winding_down_until = Some(Instant::now() + a.wind_down);
            }
            if on {
                a.winding_down_until = None;
            }
            a.report.powered_on = on;
        })
    }

    async fn set_heat_level(&mut self, level: HeatLevel) -> Result<(), DriverError> {
        self.write(Op::Heat(level), |a| a.report.heat_level = level)
    }

    async fn set_thermostat(&mut self, target: u8) -> Result<(), DriverError> {
        self.write(Op::Thermostat(target), |a| a.report.thermostat = target)
    }

    async fn set_color(&mut self, channel: LedChannel, color: LedColor) -> Result<(), DriverError> {
        self.write(Op::Color(channel, color), |a| match channel {
            LedChannel::Flame => a.report.flame.color = color,
            LedChannel::Fuel => a.report.fuel.color = color,
        })
    }

    async fn set_brightness(&mut self, channel: LedChannel, level: u8) -> Result<(), DriverError> {
        self.write(Op::Brightness(channel, level), |a| match channel {
            LedChannel::Flame => a.report.flame.brightness = level,
            LedChannel::Fuel => a.report.fuel.brightness = level,
        })
    }

    fn identity(&self) -> DeviceIdentity {
        DeviceIdentity {
            serial_number: "NTR-000042".to_string(),
            manufacturer: "Flamerite".to_string(),
            model: "NITRA".to_string(),
            firmware_revision: "2.0.1".to_string(),
            hardware_revision: "B".to_string(),
            name: "NITRA".to_string(),
        }
    }
}

impl Default for Fireplace {
    fn default() -> Self {
        Self::new()
    }
}

/// Hands out drivers for the fireplaces in range.
#[derive(Debug, Clone, Default)]
pub struct Neighbourhood {
    fireplaces: Arc<Mutex<HashMap<BleAddress, Fireplace>>>,
}

impl Neighbourhood {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn install(&self, address: BleAddress, fireplace: Fireplace) -> Fireplace {
        self.fireplaces.lock().insert(address, fireplace.clone());
        fireplace
    }

    pub fn remove(&self, address: &BleAddress) {
        self.fireplaces.lock().remove(address);
    }
}

impl DriverProvider for Neighbourhood {
    type Driver = FireplaceDriver;

    fn open(&self, address: &BleAddress) -> Option<FireplaceDriver> {
        self.fireplaces.lock().get(address).map(Fireplace::driver)
    }
}

pub fn address(last: u8) -> BleAddress {
    BleAddress::new([0xC0, 0xFF, 0xEE, 0x00, 0x00, last])
}
