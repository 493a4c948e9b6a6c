// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the Flamerite library.
//!
//! Errors are layered: value validation, driver I/O, pairing, and
//! configuration each have their own enum, all of which convert into the
//! top-level [`Error`].

use thiserror::Error;

use crate::types::BleAddress;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// A value failed validation.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// The device driver reported a failure.
    #[error("driver error: {0}")]
    Driver(#[from] DriverError),

    /// Pairing with the device failed.
    #[error("pairing error: {0}")]
    Pairing(#[from] PairingError),

    /// A persisted configuration entry could not be read.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// The device could not be set up right now; setup may be retried later.
    #[error("device {address} is not ready: {reason}")]
    NotReady {
        /// Address of the device being set up.
        address: BleAddress,
        /// Why setup could not complete.
        reason: String,
    },

    /// The polling coordinator has been stopped.
    #[error("device is not connected")]
    NotConnected,
}

/// Errors related to value validation and parsing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// A numeric value is outside the allowed range.
    #[error("value {actual} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Minimum allowed value.
        min: i32,
        /// Maximum allowed value.
        max: i32,
        /// The actual value that was provided.
        actual: i32,
    },

    /// A Bluetooth address could not be parsed.
    #[error("invalid bluetooth address: {0}")]
    InvalidAddress(String),

    /// An LED color name was not recognised.
    #[error("invalid color: {0}")]
    InvalidColor(String),

    /// A heat level name was not recognised.
    #[error("invalid heat level: {0}")]
    InvalidHeatLevel(String),

    /// A fan mode name was not recognised.
    #[error("invalid fan mode: {0}")]
    InvalidFanMode(String),

    /// An HVAC mode name was not recognised.
    #[error("invalid hvac mode: {0}")]
    InvalidHvacMode(String),

    /// A value of the wrong kind was supplied for a capability.
    #[error("capability {capability} does not accept {value}")]
    WrongKind {
        /// The capability key.
        capability: &'static str,
        /// Debug rendering of the rejected value.
        value: String,
    },
}

/// Errors raised by a device driver.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DriverError {
    /// The link to the device could not be established.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Reading from or writing to the device failed.
    #[error("I/O error: {0}")]
    Io(String),

    /// The device refused the command.
    #[error("command rejected: {0}")]
    CommandRejected(String),

    /// The device did not answer in time.
    #[error("operation timed out after {0} ms")]
    Timeout(u64),

    /// The driver has no open link.
    #[error("device is not connected")]
    NotConnected,
}

/// Terminal pairing failures.
///
/// Exhausting the retry budget is reported as [`PairingError::PairingTimeout`]
/// whether the device refused or was simply unreachable; drivers do not
/// expose enough detail to tell the two apart.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PairingError {
    /// The address was not discoverable before the first attempt.
    #[error("device {0} not found")]
    DeviceNotFound(BleAddress),

    /// Every connection attempt failed.
    #[error("pairing timed out after {attempts} attempts")]
    PairingTimeout {
        /// Number of attempts made.
        attempts: u32,
    },

    /// The session was cancelled.
    #[error("pairing cancelled")]
    Cancelled,
}

/// Errors related to persisted configuration entries.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A required field is missing or empty.
    #[error("missing field: {0}")]
    MissingField(String),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_error_display() {
        let err = ValueError::OutOfRange {
            min: 1,
            max: 10,
            actual: 12,
        };
        assert_eq!(err.to_string(), "value 12 is out of range [1, 10]");
    }

    #[test]
    fn error_from_driver_error() {
        let err: Error = DriverError::Io("link lost".to_string()).into();
        assert!(matches!(err, Error::Driver(DriverError::Io(_))));
    }

    #[test]
    fn pairing_error_display() {
        let err = PairingError::PairingTimeout { attempts: 20 };
        assert_eq!(err.to_string(), "pairing timed out after 20 attempts");
    }

    #[test]
    fn not_ready_display() {
        let address: BleAddress = "aa:bb:cc:dd:ee:ff".parse().unwrap();
        let err = Error::NotReady {
            address,
            reason: "no response".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "device AA:BB:CC:DD:EE:FF is not ready: no response"
        );
    }
}
