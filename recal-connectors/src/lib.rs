//! Acquisition Adapters for Sensor Readings
//!
//! ## Overview
//!
//! This crate provides the transports that feed raw readings into the
//! calibration engine. Each adapter wraps one acquisition channel behind
//! the same narrow contract: ask for one reading, get either a finite
//! value or an explicit "unavailable".
//!
//! ## Transport Selection
//!
//! ### Serial (UART)
//!
//! **When to use:** the sensor is wired to the host and prints one reading
//! per line. Lowest latency, no network dependency, but tied to a device
//! path and baud rate.
//!
//! ### HTTP
//!
//! **When to use:** the sensor (or its gateway) exposes a polling endpoint.
//! Firewall-friendly and easy to debug, at the cost of HTTP overhead per
//! reading.
//!
//! ## The Unavailability Contract
//!
//! Acquisition is external, blocking, and fallible. Transient failures
//! (an unplugged cable, a dropped request) are *normal operation* and must
//! degrade to "no observation this cycle", never to a panic or an error
//! escaping into the engine's control flow:
//!
//! - [`AcquisitionSource::try_sample`] is the transport implementation and
//!   returns a typed [`AcquisitionError`] on failure.
//! - [`AcquisitionSource::sample`] is what polling loops call: it logs the
//!   failure and returns `None`. No error type crosses the cycle boundary.
//!
//! Non-finite parsed values (NaN, infinities) count as malformed payloads,
//! not readings.

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "serial")]
pub mod serial;

// Re-export common types
#[cfg(feature = "http")]
pub use http::HttpSource;
#[cfg(feature = "serial")]
pub use serial::SerialSource;

use log::warn;
use thiserror::Error;

/// Why a reading could not be acquired this cycle
#[derive(Debug, Error)]
pub enum AcquisitionError {
    /// No acquisition mode was configured; every attempt reports this
    #[error("no acquisition mode configured")]
    NotConfigured,

    /// The transport could not deliver a reading (port, network, server)
    #[error("transport unavailable: {0}")]
    Transport(String),

    /// The transport delivered something that is not a finite reading
    #[error("malformed reading: {0}")]
    Malformed(String),
}

/// One acquisition channel delivering raw sensor readings.
///
/// Implementations block for at most their configured timeout and never
/// panic on transport failures.
pub trait AcquisitionSource {
    /// Attempt one reading; transport and payload failures are typed
    fn try_sample(&mut self) -> Result<f64, AcquisitionError>;

    /// Short human-readable channel description, used in diagnostics
    fn description(&self) -> &str;

    /// Acquire one reading, degrading failures to "unavailable".
    ///
    /// This is the cycle-boundary form of the contract: the failure is
    /// logged here and `None` is all the caller sees.
    fn sample(&mut self) -> Option<f64> {
        match self.try_sample() {
            Ok(value) => Some(value),
            Err(err) => {
                warn!("{}: no reading this cycle: {err}", self.description());
                None
            }
        }
    }
}

/// Placeholder source installed when no acquisition mode is selected.
///
/// Keeps the process alive and loudly unproductive: every sample reports
/// unavailable with a clear diagnostic instead of looping silently.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredSource;

impl AcquisitionSource for UnconfiguredSource {
    fn try_sample(&mut self) -> Result<f64, AcquisitionError> {
        Err(AcquisitionError::NotConfigured)
    }

    fn description(&self) -> &str {
        "acquisition"
    }
}

/// Accept only finite parsed values; NaN and infinities are malformed
pub(crate) fn finite_reading(value: f64) -> Result<f64, AcquisitionError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(AcquisitionError::Malformed(format!(
            "non-finite sensor value {value}"
        )))
    }
}
