// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types for fireplace control.
//!
//! # Types
//!
//! - [`BleAddress`] - Bluetooth device address
//! - [`HeatLevel`] - Heater output (Off/Low/High)
//! - [`HvacMode`], [`FanMode`] - Climate surface views of the heat level
//! - [`LedChannel`], [`LedColor`] - LED strip and palette
//! - [`ValueRange`] - Device-declared integer bounds

mod address;
mod color;
mod heat;
mod range;

pub use address::BleAddress;
pub use color::{LedChannel, LedColor};
pub use heat::{FanMode, HeatLevel, HvacMode};
pub use range::ValueRange;
