// SPDX-FileCopyrightText: 2025 2025 Contributors to the gst-amlhal project.
// SPDX-License-Identifier: Apache-2.0

//! Error types for audio HAL operations.
//!
//! The HAL reports failures as negative `errno` values. This module maps
//! them to a Rust error enum and adds the failures that only exist on the
//! Rust side (library loading, missing entry points).

use std::os::raw::c_int;

/// Convenience result type using [`Error`] as the error variant.
pub type Result<T> = core::result::Result<T, Error>;

const EINVAL: c_int = 22;
const ENODEV: c_int = 19;
const ENOSYS: c_int = 38;

/// Errors that can occur when talking to the audio HAL.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A non-zero HAL status code without a more specific mapping.
    #[error("HAL status: {0}")]
    Status(c_int),

    /// The HAL rejected an argument (`-EINVAL`).
    #[error("Invalid argument")]
    InvalidArg,

    /// The requested output device is not present (`-ENODEV`).
    #[error("No such device")]
    NoDevice,

    /// The device or stream table does not implement an entry point.
    #[error("Unsupported HAL entry point: {0}")]
    Unsupported(&'static str),

    /// The HAL returned success but handed back a null handle.
    #[error("Null handle returned by the HAL")]
    NullHandle,

    /// A generic error for Rust-level failures.
    #[error("Other error: {0}")]
    Other(String),

    /// Failed to load the client library or resolve one of its symbols.
    #[error("Loading library: {0}")]
    LibLoading(#[from] libloading::Error),
}

impl Error {
    /// Converts a HAL status code to a [`Result`].
    ///
    /// Zero is success. `-ENOSYS` is reported as [`Error::Unsupported`]
    /// tagged with `what`.
    pub fn from_status(status: c_int, what: &'static str) -> Result<()> {
        match status {
            0 => Ok(()),
            other => Err(Error::from_code(other, what)),
        }
    }

    /// Maps a failing (non-zero) HAL status code to an [`Error`].
    pub fn from_code(code: c_int, what: &'static str) -> Error {
        match code {
            s if s == -EINVAL => Error::InvalidArg,
            s if s == -ENODEV => Error::NoDevice,
            s if s == -ENOSYS => Error::Unsupported(what),
            other => Error::Status(other),
        }
    }
}
