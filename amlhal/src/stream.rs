// SPDX-FileCopyrightText: 2025 2025 Contributors to the gst-amlhal project.
// SPDX-License-Identifier: Apache-2.0

//! Output stream handle.

use std::{os::raw::c_int, sync::Arc, time::Duration};

use amlhal_sys::AudioStreamOut;

use crate::{Error, PresentationPosition, Result, device::DeviceContext};

/// Data-path operations on one HAL output stream.
///
/// Methods take `&self`: the streaming thread writes while the pipeline
/// clock queries the presentation position from another thread.
pub trait OutputStream: Send + Sync {
    /// Writes audio and returns how many bytes the device accepted.
    ///
    /// Fewer bytes than requested is a partial write, not an error.
    fn write(&self, data: &[u8]) -> Result<usize>;

    /// Returns the number of frames rendered so far.
    fn presentation_position(&self) -> Result<PresentationPosition>;

    fn pause(&self) -> Result<()>;

    /// Discards data queued in the device (raw PCM stop path).
    fn flush(&self) -> Result<()>;
}

/// An `audio_stream_out` opened on a [`crate::HalDevice`].
///
/// Closed on drop.
pub struct HalOutputStream {
    context: Arc<DeviceContext>,
    stream: *mut AudioStreamOut,
}

// Safety: the client library proxies every call to the audio server and
// tolerates a writer thread and a position query running concurrently.
unsafe impl Send for HalOutputStream {}
unsafe impl Sync for HalOutputStream {}

impl HalOutputStream {
    pub(crate) fn new(context: Arc<DeviceContext>, stream: *mut AudioStreamOut) -> Self {
        Self { context, stream }
    }

    fn table(&self) -> AudioStreamOut {
        unsafe { *self.stream }
    }
}

impl OutputStream for HalOutputStream {
    fn write(&self, data: &[u8]) -> Result<usize> {
        let write = self.table().write.ok_or(Error::Unsupported("write"))?;
        let ret = unsafe { write(self.stream, data.as_ptr().cast(), data.len()) };
        if ret < 0 {
            return Err(Error::from_code(ret as c_int, "write"));
        }
        Ok(ret as usize)
    }

    fn presentation_position(&self) -> Result<PresentationPosition> {
        let get_position = self
            .table()
            .get_presentation_position
            .ok_or(Error::Unsupported("get_presentation_position"))?;

        let mut frames = 0u64;
        let mut timestamp = amlhal_sys::Timespec::default();
        Error::from_status(
            unsafe { get_position(self.stream, &mut frames, &mut timestamp) },
            "get_presentation_position",
        )?;
        Ok(PresentationPosition {
            frames,
            timestamp: Duration::new(timestamp.tv_sec.max(0) as u64, timestamp.tv_nsec.max(0) as u32),
        })
    }

    fn pause(&self) -> Result<()> {
        let pause = self.table().pause.ok_or(Error::Unsupported("pause"))?;
        Error::from_status(unsafe { pause(self.stream) }, "pause")
    }

    fn flush(&self) -> Result<()> {
        let flush = self.table().flush.ok_or(Error::Unsupported("flush"))?;
        Error::from_status(unsafe { flush(self.stream) }, "flush")
    }
}

impl Drop for HalOutputStream {
    fn drop(&mut self) {
        if !self.stream.is_null() {
            self.context.close_output_stream(self.stream);
            self.stream = std::ptr::null_mut();
        }
    }
}
