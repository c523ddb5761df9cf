//! Pipeline clock driven by the audio HAL presentation position.

// SPDX-FileCopyrightText: 2025 2025 Contributors to the gst-amlhal project.
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use gst::glib;
use gst::subclass::prelude::*;
use gstreamer as gst;

use crate::ringbuffer::TimeSource;

mod imp;

glib::wrapper! {
    pub struct AmlHalClock(ObjectSubclass<imp::AmlHalClock>) @extends gst::SystemClock, gst::Clock, gst::Object;
}

impl AmlHalClock {
    pub fn new() -> Self {
        glib::Object::builder()
            .property("name", "GstAmlSinkClock")
            .build()
    }

    /// Points the clock at the time source of the current ring buffer.
    ///
    /// Without a source the clock holds the last time it reported.
    pub fn set_time_source(&self, source: Option<Arc<TimeSource>>) {
        self.imp().set_time_source(source);
    }
}

impl Default for AmlHalClock {
    fn default() -> Self {
        Self::new()
    }
}
