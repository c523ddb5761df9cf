// SPDX-FileCopyrightText: 2025 2025 Contributors to the gst-amlhal project.
// SPDX-License-Identifier: Apache-2.0

//! Audio ring buffer backed by an audio HAL output stream.
//!
//! There is no buffer of our own: every commit goes straight to the HAL
//! stream's `write`, which may accept fewer bytes than offered. This module
//! owns the device session and everything that has to stay consistent with
//! it:
//!
//! - **Session**: acquire/release of the output stream and the
//!   start/pause/stop/clear state machine
//! - **Commit** (`commit.rs`): format branch, frame alignment, may-start
//!   gating, mono expansion and the partial-write loop
//! - **Time** (`clock.rs`): presentation position to stream time, with
//!   compensation after a compressed-stream clear
//!
//! ## Lifecycle
//!
//! ```text
//! Closed ──acquire──► Acquired ──start/commit──► Started ◄──start── Paused
//!    ▲                    ▲                        │  └───pause────►  │
//!    │                    └─────────stop───────────┘                  │
//!    └──────────────────────────release───────────────────────────────┘
//! ```
//!
//! The streaming thread drives every operation except
//! [`TimeSource::current_time`], which the pipeline clock calls from its own
//! thread through the shared [`TimeSource`].

use std::sync::Arc;

use amlhal::{AudioHwDevice, OutputStream};
use tracing::{debug, error};

mod clock;
mod commit;
mod error;
mod extend;
mod format;
mod header;

#[cfg(test)]
mod ringbuffer_tests;

pub use clock::{SessionState, TimeSource};
pub use error::{HeaderError, RingBufferError};
pub use extend::{EXTEND_BUFFER_SIZE, ExtendBuffer};
pub use format::{OutputConfig, SampleFormat, StreamSpec};
pub use header::{CompressedFormat, FrameMeta, parse as parse_header};

/// Bytes of silence written by a raw PCM clear.
pub const FLUSH_DATA_SIZE: usize = 32 * 1024;

/// Write progress of the current session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackCursor {
    /// Samples handed to the device. Never reset within a session.
    pub samples_committed: u64,
    /// Compressed frames fully written.
    pub frames_sent: u32,
    pub paused: bool,
}

/// A device session plus its commit engine.
pub struct RingBuffer {
    spec: Option<StreamSpec>,
    stream: Option<Arc<dyn OutputStream>>,
    meta: FrameMeta,
    cursor: PlaybackCursor,
    extend: Option<ExtendBuffer>,
    time: Arc<TimeSource>,
}

impl Default for RingBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl RingBuffer {
    pub fn new() -> Self {
        Self {
            spec: None,
            stream: None,
            meta: FrameMeta::default(),
            cursor: PlaybackCursor::default(),
            extend: None,
            time: Arc::new(TimeSource::default()),
        }
    }

    /// Shared handle for the pipeline clock.
    pub fn time_source(&self) -> Arc<TimeSource> {
        self.time.clone()
    }

    pub fn state(&self) -> SessionState {
        self.time.state()
    }

    pub fn spec(&self) -> Option<&StreamSpec> {
        self.spec.as_ref()
    }

    pub fn cursor(&self) -> &PlaybackCursor {
        &self.cursor
    }

    pub fn frame_meta(&self) -> &FrameMeta {
        &self.meta
    }

    pub fn is_acquired(&self) -> bool {
        self.stream.is_some()
    }

    pub fn set_may_start(&self, may_start: bool) {
        self.time.set_may_start(may_start);
    }

    /// Opens an output stream for `spec` on `device`.
    ///
    /// The stream stays corked until the first commit (or [`Self::start`]).
    pub fn acquire(
        &mut self,
        device: &dyn AudioHwDevice,
        spec: StreamSpec,
        output: &OutputConfig,
    ) -> Result<(), RingBufferError> {
        if self.stream.is_some() {
            return Err(RingBufferError::AlreadyAcquired);
        }

        let (config, expand) = format::stream_config(&spec, output).inspect_err(|err| {
            error!("{}", err);
        })?;
        let stream = device.open_output_stream(&config).inspect_err(|err| {
            error!("can not open output stream: {}", err);
        })?;

        debug!(
            "acquired {:?}, rate {}, channels {}",
            spec.format, spec.sample_rate, spec.channels
        );

        self.time
            .attach(stream.clone(), spec.sample_rate, spec.format.is_compressed());
        self.stream = Some(stream);
        self.spec = Some(spec);
        self.meta = FrameMeta::default();
        self.cursor = PlaybackCursor::default();
        self.extend = expand.then(ExtendBuffer::new);
        self.time.set_state(SessionState::Acquired);
        Ok(())
    }

    /// Closes the output stream and forgets the session.
    pub fn release(&mut self) {
        self.time.detach();
        if self.stream.take().is_some() {
            debug!("released stream, {} frames sent", self.cursor.frames_sent);
        }
        self.spec = None;
        self.extend = None;
        self.meta = FrameMeta::default();
        self.time.set_state(SessionState::Closed);
    }

    /// Starts or resumes playback.
    pub fn start(&mut self) -> Result<(), RingBufferError> {
        if self.stream.is_none() {
            error!("start without a stream");
            return Err(RingBufferError::NotAcquired);
        }
        if self.cursor.paused {
            debug!("resume");
            self.cursor.paused = false;
        }
        self.time.set_state(SessionState::Started);
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), RingBufferError> {
        if self.stream.is_none() {
            error!("pause without a stream");
            return Err(RingBufferError::NotAcquired);
        }
        if self.cursor.paused {
            debug!("already in pause state");
            return Ok(());
        }
        self.cursor.paused = true;
        self.time.set_state(SessionState::Paused);
        debug!("pause");
        Ok(())
    }

    /// Stops the device: pauses it, then drops whatever it has queued.
    pub fn stop(&mut self) -> Result<(), RingBufferError> {
        let stream = self.stream.as_ref().ok_or_else(|| {
            error!("stop without a stream");
            RingBufferError::NotAcquired
        })?;

        if let Err(err) = stream.pause() {
            debug!("stream pause: {}", err);
        }
        stream.flush().inspect_err(|err| {
            error!("flush failure: {}", err);
        })?;
        self.time.set_state(SessionState::Acquired);
        debug!("stop");
        Ok(())
    }
}
