// SPDX-FileCopyrightText: 2025 2025 Contributors to the gst-amlhal project.
// SPDX-License-Identifier: Apache-2.0

//! Playback time derived from the device presentation position.
//!
//! [`TimeSource`] is shared between the streaming thread, which owns the
//! [`super::RingBuffer`], and the pipeline clock, which polls it from its own
//! thread. Every field the clock reads is an atomic or sits behind a mutex
//! that is never held across a device write.

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicU8, AtomicU32, AtomicU64, Ordering},
    },
    time::Instant,
};

use amlhal::OutputStream;
use gstreamer as gst;
use tracing::{debug, warn};

/// Lifecycle of a device session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SessionState {
    Closed = 0,
    Acquired = 1,
    Started = 2,
    Paused = 3,
}

impl SessionState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => SessionState::Acquired,
            2 => SessionState::Started,
            3 => SessionState::Paused,
            _ => SessionState::Closed,
        }
    }
}

pub struct TimeSource {
    state: AtomicU8,
    may_start: AtomicBool,
    compressed: AtomicBool,
    sample_rate: AtomicU32,
    flushed: AtomicBool,
    /// Microseconds between `epoch` and the last clear.
    flush_time_us: AtomicU64,
    /// Highest time handed out this session, in nanoseconds.
    last_time_ns: AtomicU64,
    epoch: Instant,
    stream: Mutex<Option<Arc<dyn OutputStream>>>,
}

impl Default for TimeSource {
    fn default() -> Self {
        Self {
            state: AtomicU8::new(SessionState::Closed as u8),
            may_start: AtomicBool::new(false),
            compressed: AtomicBool::new(false),
            sample_rate: AtomicU32::new(0),
            flushed: AtomicBool::new(false),
            flush_time_us: AtomicU64::new(0),
            last_time_ns: AtomicU64::new(0),
            epoch: Instant::now(),
            stream: Mutex::new(None),
        }
    }
}

impl TimeSource {
    pub fn state(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub(crate) fn set_state(&self, state: SessionState) {
        self.state.store(state as u8, Ordering::Release);
    }

    pub fn may_start(&self) -> bool {
        self.may_start.load(Ordering::Acquire)
    }

    pub fn set_may_start(&self, may_start: bool) {
        self.may_start.store(may_start, Ordering::Release);
    }

    pub fn is_flushed(&self) -> bool {
        self.flushed.load(Ordering::Acquire)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate.load(Ordering::Acquire)
    }

    pub(crate) fn set_sample_rate(&self, rate: u32) {
        self.sample_rate.store(rate, Ordering::Release);
    }

    /// Binds the time source to a freshly opened stream.
    pub(crate) fn attach(&self, stream: Arc<dyn OutputStream>, sample_rate: u32, compressed: bool) {
        self.sample_rate.store(sample_rate, Ordering::Release);
        self.compressed.store(compressed, Ordering::Release);
        self.flushed.store(false, Ordering::Release);
        self.last_time_ns.store(0, Ordering::Release);
        if let Ok(mut slot) = self.stream.lock() {
            *slot = Some(stream);
        }
    }

    pub(crate) fn detach(&self) {
        if let Ok(mut slot) = self.stream.lock() {
            slot.take();
        }
    }

    /// Records a clear at the current wall-clock time.
    pub(crate) fn mark_flushed(&self) {
        let now = self.epoch.elapsed().as_micros() as u64;
        self.flush_time_us.store(now, Ordering::Release);
        self.flushed.store(true, Ordering::Release);
    }

    pub(crate) fn clear_flushed(&self) {
        self.flushed.store(false, Ordering::Release);
    }

    /// Time elapsed since the last clear, if it still applies.
    fn flush_compensation_us(&self) -> u64 {
        if !self.compressed.load(Ordering::Acquire) || !self.flushed.load(Ordering::Acquire) {
            return 0;
        }
        let now = self.epoch.elapsed().as_micros() as u64;
        now.saturating_sub(self.flush_time_us.load(Ordering::Acquire))
    }

    /// Current stream time, or `None` without an open stream or when the
    /// device cannot report its position.
    ///
    /// The presentation position is converted to time at the session sample
    /// rate. After a clear on a compressed stream the wall-clock time since
    /// the clear is added, since the device counter does not move for
    /// discarded frames. The result never goes backwards within a session.
    pub fn current_time(&self) -> Option<gst::ClockTime> {
        let stream = self.stream.lock().ok()?.clone()?;
        let position = match stream.presentation_position() {
            Ok(position) => position,
            Err(err) => {
                warn!("get_presentation_position failure: {}", err);
                return None;
            }
        };

        let rate = self.sample_rate();
        if rate == 0 {
            return None;
        }
        let base_ns = (position.frames as u128 * 1_000_000_000 / rate as u128) as u64;

        let delta_us = self.flush_compensation_us();
        if delta_us > 0 {
            debug!("flush time passed {} us", delta_us);
        }
        let time_ns = base_ns.saturating_add(delta_us.saturating_mul(1000));

        let previous = self.last_time_ns.fetch_max(time_ns, Ordering::AcqRel);
        Some(gst::ClockTime::from_nseconds(time_ns.max(previous)))
    }
}
