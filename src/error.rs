//! Error types for the voxpad application.
//!
//! This module defines the custom error types used throughout the
//! application. It uses the `thiserror` crate to derive error
//! implementations.

use thiserror::Error;

/// Device-side errors for the voxpad application.
///
/// `DriverMissing` is kept separate from other device failures so that a
/// missing uinput driver can be reported with an actionable message
/// instead of a generic initialization failure.
#[derive(Error, Debug)]
pub enum Error {
    /// The system-level virtual input driver is absent or inaccessible
    #[error("virtual input driver unavailable: {0}")]
    DriverMissing(String),

    /// Error initializing or writing to the virtual pad
    #[error("virtual pad error: {0}")]
    Device(String),
}
