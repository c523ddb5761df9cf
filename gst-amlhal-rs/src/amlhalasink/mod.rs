//! Amlogic audio HAL sink element
//!
//! This module implements `amlhalasink`, a GStreamer sink element that writes
//! PCM or AC3/E-AC3 bitstream audio to the Amlogic audio server through its
//! HAL client library.
//!
//! ## Responsibilities
//! - Accepts S16LE PCM (48 kHz, 1 to 32 channels) or AC3/E-AC3 bitstreams
//! - Opens a HAL output stream for the negotiated format
//! - Commits audio through the ring buffer engine, retrying partial writes
//! - Provides a pipeline clock driven by the device presentation position
//!
//! ## Properties
//! - `output-port`: Speaker, HDMI-Tx, HDMI ARC or SPDIF (set before PAUSED)
//! - `direct-mode`: Main mixing port when true, system sound mixer otherwise
//! - `volume` / `mute`: Applied to the HAL sink device port
//! - `hal-library`: Audio client library to load
//!
//! ## Example Pipeline
//! ```bash
//! gst-launch-1.0 filesrc location=movie.ac3 ! ac3parse ! \
//!     amlhalasink output-port=hdmi-arc
//! ```

// SPDX-FileCopyrightText: 2025 2025 Contributors to the gst-amlhal project.
// SPDX-License-Identifier: Apache-2.0

use gst::glib;
use gst::prelude::*;
use gstreamer as gst;
use gstreamer_base as gst_base;

/// Pipeline clock backed by the ring buffer's time source
pub mod clock;

/// Core implementation (properties, state changes, GStreamer trait impls)
mod imp;

/// Buffer rendering through the byte adapter into the ring buffer
mod render;

/// State structures (settings, device, ring buffer)
mod state;

pub use state::OutputPort;

/// GLib wrapper type for the AmlHalAsink element.
///
/// ## Inheritance Chain
/// - `gst::Object`
/// - `gst::Element`
/// - `gst_base::BaseSink`
/// - `AmlHalAsink`
glib::wrapper! {
    pub struct AmlHalAsink(ObjectSubclass<imp::AmlHalAsink>) @extends gst_base::BaseSink, gst::Element, gst::Object;
}

/// Registers the amlhalasink element with GStreamer.
///
/// # Rank
/// PRIMARY: on Amlogic boxes this is the audio sink autoplugging should pick.
pub fn register(plugin: &gst::Plugin) -> Result<(), glib::BoolError> {
    gst::Element::register(
        Some(plugin),
        "amlhalasink",
        gst::Rank::PRIMARY,
        AmlHalAsink::static_type(),
    )
}
