// SPDX-FileCopyrightText: 2025 2025 Contributors to the gst-amlhal project.
// SPDX-License-Identifier: Apache-2.0

//! Error types for the ring buffer engine.

/// Why a compressed frame header could not be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum HeaderError {
    /// Fewer than five bytes were available.
    #[error("Need at least 5 header bytes, got {0}")]
    InsufficientData(usize),

    /// The chunk does not start with the `0x0B 0x77` sync word.
    #[error("Sync word mismatch")]
    SyncMismatch,

    /// A sample-rate or frame-size code is out of range or reserved.
    #[error("Unsupported rate code")]
    UnsupportedRate,
}

/// Errors returned by [`super::RingBuffer`] operations.
#[derive(Debug, thiserror::Error)]
pub enum RingBufferError {
    /// A compressed payload is not a whole number of encoded frames.
    ///
    /// Nothing was consumed; the caller retries with more data.
    #[error("{len} bytes are not aligned to {frame_size}-byte frames")]
    FrameAlignment { len: usize, frame_size: usize },

    /// Mono expansion would overflow the scratch buffer.
    #[error("Extend buffer too small: {needed} vs {capacity}")]
    BufferTooSmall { needed: usize, capacity: usize },

    /// Input and output sample counts differ or are negative.
    #[error("Unsupported rate conversion {in_samples}/{out_samples}")]
    UnsupportedRateConversion { in_samples: i64, out_samples: i64 },

    /// The payload holds fewer bytes than the declared sample count needs.
    #[error("Payload of {len} bytes is shorter than {needed} bytes")]
    ShortPayload { len: usize, needed: usize },

    #[error("Unsupported channel count {0}")]
    UnsupportedChannels(u32),

    /// The operation needs an acquired device session.
    #[error("No device stream")]
    NotAcquired,

    #[error("Device session already acquired")]
    AlreadyAcquired,

    /// The device failed an open, write, close or query call.
    #[error("Device fault: {0}")]
    DeviceFault(#[from] amlhal::Error),
}

impl RingBufferError {
    /// Whether the session cannot continue after this error.
    pub fn is_fatal(&self) -> bool {
        matches!(self, RingBufferError::BufferTooSmall { .. })
    }
}
