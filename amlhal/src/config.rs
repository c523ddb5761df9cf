// SPDX-FileCopyrightText: 2025 2025 Contributors to the gst-amlhal project.
// SPDX-License-Identifier: Apache-2.0

//! Location of the vendor audio client library.

/// File name of the Amlogic audio client library.
pub const AUDIO_CLIENT_LIBRARY: &str = "libaudio_client.so";

/// Returns the path handed to [`crate::load_api`] when nothing else is
/// configured.
///
/// This is the bare library name, so the dynamic loader's search path
/// decides which copy is used.
pub fn default_library_path() -> std::path::PathBuf {
    AUDIO_CLIENT_LIBRARY.into()
}
