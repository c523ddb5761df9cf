//! Build script for gst-amlhal-rs
//!
//! Generates the version metadata (`COMMIT_ID`, `BUILD_REL_DATE`) consumed by
//! `gst::plugin_define!` in lib.rs.

// SPDX-FileCopyrightText: 2025 2025 Contributors to the gst-amlhal project.
// SPDX-License-Identifier: Apache-2.0

fn main() {
    gst_plugin_version_helper::info()
}
