//! GStreamer Plugin for the Amlogic audio HAL
//!
//! This crate implements a GStreamer plugin providing one element:
//!
//! - **amlhalasink**: An audio sink that plays raw PCM and AC3/E-AC3
//!   bitstreams through the Amlogic audio server (`libaudio_client.so`)
//!
//! ## Audio HAL Overview
//! The Amlogic audio HAL is an Android-style `audio_hw_device`. The sink opens
//! one output stream per negotiated format and writes to it directly; the HAL
//! queues, mixes and routes to the selected output port. Compressed streams
//! are passed through frame by frame after their first frame header has been
//! parsed.
//!
//! ## Supported Media Formats
//! - **Raw**: S16LE, 48 kHz, 1 to 32 interleaved channels (mono is expanded
//!   to stereo)
//! - **Compressed**: AC3 (`audio/x-ac3`) and E-AC3 (`audio/x-eac3`)
//!
//! ## Crate Layout
//! - [`ringbuffer`]: device session and commit engine, independent of GStreamer
//!   elements and testable against mock devices
//! - [`amlhalasink`]: the element, its properties and the pipeline clock

// SPDX-FileCopyrightText: 2025 2025 Contributors to the gst-amlhal project.
// SPDX-License-Identifier: Apache-2.0

// Allow non-Send fields in Send types (required for GStreamer's threading model)
// and unused doc comments (sometimes present in macro-generated code)
#![allow(clippy::non_send_fields_in_send_ty, unused_doc_comments)]

use gst::glib;
use gstreamer as gst;

/// Audio HAL sink element
pub mod amlhalasink;

/// Ring buffer engine between the element and the HAL output stream
pub mod ringbuffer;

/// Registers the amlhalasink element with GStreamer.
fn plugin_init(plugin: &gst::Plugin) -> Result<(), glib::BoolError> {
    amlhalasink::register(plugin)
}

/// GStreamer plugin metadata and entry point.
///
/// - Plugin name: "amlhal"
/// - Version: From CARGO_PKG_VERSION + git commit ID
/// - License: Apache-2.0
gst::plugin_define!(
    amlhal,
    env!("CARGO_PKG_DESCRIPTION"),
    plugin_init,
    concat!(env!("CARGO_PKG_VERSION"), "-", env!("COMMIT_ID")),
    "Apache-2.0",
    env!("CARGO_PKG_NAME"),
    env!("CARGO_PKG_NAME"),
    env!("CARGO_PKG_REPOSITORY"),
    env!("BUILD_REL_DATE")
);
