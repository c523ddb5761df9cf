// SPDX-FileCopyrightText: 2025 2025 Contributors to the gst-amlhal project.
// SPDX-License-Identifier: Apache-2.0

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicU64, Ordering},
};

use gst::glib;
use gst::subclass::prelude::*;
use gstreamer as gst;

use crate::ringbuffer::TimeSource;

#[derive(Default)]
pub struct AmlHalClock {
    source: Mutex<Option<Arc<TimeSource>>>,
    /// Last reported time in nanoseconds.
    last: AtomicU64,
}

impl AmlHalClock {
    pub(super) fn set_time_source(&self, source: Option<Arc<TimeSource>>) {
        if let Ok(mut slot) = self.source.lock() {
            *slot = source;
        }
    }
}

#[glib::object_subclass]
impl ObjectSubclass for AmlHalClock {
    const NAME: &'static str = "GstAmlHalClock";
    type Type = super::AmlHalClock;
    type ParentType = gst::SystemClock;
}

impl ObjectImpl for AmlHalClock {}

impl GstObjectImpl for AmlHalClock {}

impl ClockImpl for AmlHalClock {
    fn internal_time(&self) -> gst::ClockTime {
        let source = self.source.lock().ok().and_then(|slot| slot.clone());
        let now = source.and_then(|source| source.current_time());

        let last = match now {
            Some(time) => {
                let previous = self.last.fetch_max(time.nseconds(), Ordering::AcqRel);
                previous.max(time.nseconds())
            }
            None => self.last.load(Ordering::Acquire),
        };
        gst::ClockTime::from_nseconds(last)
    }
}

impl SystemClockImpl for AmlHalClock {}
