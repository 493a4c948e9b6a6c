// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `Flamerite` Lib - A Rust library to pair with and control Flamerite
//! Bluetooth fireplaces.
//!
//! The library sits between a device driver (which speaks the appliance's
//! Bluetooth protocol) and a home-automation host. It provides:
//!
//! - **Pairing**: retrying connection sessions, one per address, with
//!   progress reporting and cancellation
//! - **Setup flow**: select / confirm / pair steps that end in a persisted
//!   [`ConfigEntry`]
//! - **Polling**: a single worker per device that serializes every query
//!   and command and publishes immutable snapshots
//! - **Surfaces**: typed power, heater, LED color and LED brightness
//!   controls built on the latest snapshot
//!
//! # Quick Start
//!
//! ## First-time setup
//!
//! ```no_run
//! use flamerite_lib::config::{ApplianceConfig, RetryPolicy};
//! use flamerite_lib::pairing::{PairingCoordinator, SetupFlow, StepResult};
//! use flamerite_lib::Appliance;
//! # use flamerite_lib::driver::{Advertisement, DriverProvider};
//!
//! # async fn example<P: DriverProvider>(provider: P, scan: Vec<Advertisement>) -> flamerite_lib::Result<()> {
//! let pairing = PairingCoordinator::new(provider);
//! let mut flow = SetupFlow::new(pairing.clone(), RetryPolicy::interactive());
//!
//! if let StepResult::NeedsSelection(found) = flow.start_user(&scan, &[]) {
//!     // Ask the user to press the pair button now
//!     flow.select(found[0]);
//!     if let StepResult::Success(entry) = flow.wait().await {
//!         println!("store: {}", entry.to_json()?);
//!         if let Some(device) = flow.take_device() {
//!             let appliance = Appliance::from_handle(device, &ApplianceConfig::default()).await?;
//!             appliance.power_switch().turn_on().await?;
//!         }
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Startup with a stored entry
//!
//! ```no_run
//! use flamerite_lib::config::{ApplianceConfig, ConfigEntry};
//! use flamerite_lib::pairing::PairingCoordinator;
//! use flamerite_lib::types::{FanMode, LedColor};
//! use flamerite_lib::Appliance;
//! # use flamerite_lib::driver::DriverProvider;
//!
//! # async fn example<P: DriverProvider>(provider: P, stored: &str) -> flamerite_lib::Result<()> {
//! let pairing = PairingCoordinator::new(provider);
//! let entry = ConfigEntry::from_json(stored)?;
//! let appliance = Appliance::setup(&pairing, &entry, &ApplianceConfig::default()).await?;
//!
//! appliance.climate().set_fan_mode(FanMode::Low).await?;
//! appliance.flame_color().set_color(LedColor::Blue).await?;
//!
//! appliance.unload().await;
//! # Ok(())
//! # }
//! ```

pub mod appliance;
pub mod capability;
pub mod config;
pub mod coordinator;
pub mod discovery;
pub mod driver;
pub mod error;
pub mod handle;
pub mod pairing;
pub mod surface;
pub mod types;

pub use appliance::Appliance;
pub use capability::{Capability, CapabilityValue, Command};
pub use config::{ApplianceConfig, ConfigEntry, CoordinatorConfig, RetryPolicy};
pub use coordinator::{
    CoordinatorHandle, DeviceSnapshot, Observed, PollPhase, PollState, PollingCoordinator,
};
pub use driver::{
    Advertisement, DeviceDriver, DeviceIdentity, DeviceLimits, DriverProvider, StateReport,
};
pub use error::{ConfigError, DriverError, Error, PairingError, Result, ValueError};
pub use handle::{ConnectionState, DeviceHandle};
pub use pairing::{
    AbortReason, PairingCoordinator, PairingSession, PairingStatus, SessionId, SetupFlow,
    StepResult,
};
pub use surface::{BrightnessControl, Climate, ColorSelect, PowerSwitch, Surface};
pub use types::{BleAddress, FanMode, HeatLevel, HvacMode, LedChannel, LedColor, ValueRange};
