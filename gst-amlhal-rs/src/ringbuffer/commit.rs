// SPDX-FileCopyrightText: 2025 2025 Contributors to the gst-amlhal project.
// SPDX-License-Identifier: Apache-2.0

//! Commit and clear: the data path into the HAL stream.

use amlhal::OutputStream;
use tracing::{debug, error, trace, warn};

use super::{
    CompressedFormat, FLUSH_DATA_SIZE, RingBuffer, RingBufferError, SampleFormat, SessionState,
    TimeSource, header,
};

impl RingBuffer {
    /// Writes `in_samples` samples from `data` to the device.
    ///
    /// Returns how many samples the caller may consider consumed:
    ///
    /// - `in_samples` once everything was written, when the cursor is paused
    ///   (the data is dropped), or when the first compressed chunk has no
    ///   decodable header (the chunk is dropped)
    /// - `0` when playback may not start yet, paused sessions included; the
    ///   caller retries later
    ///
    /// Compressed streams are counted in bytes, raw PCM in sample frames.
    ///
    /// # Errors
    ///
    /// [`RingBufferError::FrameAlignment`] leaves the data unconsumed so it can
    /// be retried together with more bytes. [`RingBufferError::BufferTooSmall`]
    /// is fatal for the session. [`RingBufferError::DeviceFault`] stops the
    /// write loop; samples already written stay accounted.
    pub fn commit(
        &mut self,
        data: &[u8],
        in_samples: i64,
        out_samples: i64,
    ) -> Result<usize, RingBufferError> {
        if in_samples < 0 || in_samples != out_samples {
            error!("unsupported use case {}/{}", in_samples, out_samples);
            return Err(RingBufferError::UnsupportedRateConversion {
                in_samples,
                out_samples,
            });
        }
        let spec = self.spec.ok_or(RingBufferError::NotAcquired)?;
        let stream = self.stream.clone().ok_or(RingBufferError::NotAcquired)?;

        let in_samples = in_samples as usize;
        let mut bpf = spec.bytes_per_frame();
        let byte_count = in_samples
            .checked_mul(bpf)
            .ok_or(RingBufferError::ShortPayload {
                len: data.len(),
                needed: usize::MAX,
            })?;
        if data.len() < byte_count {
            return Err(RingBufferError::ShortPayload {
                len: data.len(),
                needed: byte_count,
            });
        }
        let data = &data[..byte_count];

        let compressed = match spec.format {
            SampleFormat::Pcm16 => None,
            SampleFormat::Ac3 => Some(CompressedFormat::Ac3),
            SampleFormat::EAc3 => Some(CompressedFormat::EAc3),
        };

        if let Some(format) = compressed {
            if !self.meta.parsed {
                match header::parse(format, data) {
                    Ok(meta) => {
                        debug!(
                            "encoded_size {} spf {}",
                            meta.encoded_frame_size, meta.samples_per_frame
                        );
                        if let Some(rate) = meta.sample_rate_override {
                            self.time.set_sample_rate(rate);
                        }
                        self.meta = meta;
                    }
                    Err(err) => {
                        warn!("parse header info fails ({}), discard {} bytes", err, byte_count);
                        return Ok(in_samples);
                    }
                }
            }

            let frame_size = self.meta.encoded_frame_size as usize;
            if byte_count % frame_size != 0 {
                error!("not frame aligned {} {}", byte_count, frame_size);
                return Err(RingBufferError::FrameAlignment {
                    len: byte_count,
                    frame_size,
                });
            }
        }

        if self.time.state() != SessionState::Started {
            if !self.time.may_start() {
                trace!("we can not start");
                return Ok(0);
            }
            debug!("start!");
            self.start()?;
        }

        // Only reachable when the cursor is paused on a started session;
        // `pause()` moves the state to Paused and the gate above resumes it.
        if self.cursor.paused {
            warn!("drop {} frame in pause state", in_samples);
            return Ok(in_samples);
        }

        let payload = match (&mut self.extend, compressed) {
            (Some(extend), None) => {
                let expanded = extend.expand(data, bpf).inspect_err(|err| {
                    error!("{}", err);
                })?;
                bpf *= 2;
                expanded
            }
            _ => data,
        };

        let time = &self.time;
        let cursor = &mut self.cursor;
        match compressed {
            Some(_) => {
                let frame_size = self.meta.encoded_frame_size as usize;
                let samples_per_frame = self.meta.samples_per_frame as u64;
                for frame in payload.chunks_exact(frame_size) {
                    write_all(&*stream, time, frame, |_| {})?;
                    cursor.samples_committed += samples_per_frame;
                    cursor.frames_sent += 1;
                    trace!(
                        "frame {} written, sample {}",
                        cursor.frames_sent, cursor.samples_committed
                    );
                }
            }
            None => {
                let mut accounted = 0;
                write_all(&*stream, time, payload, |written_total| {
                    let whole = written_total / bpf;
                    cursor.samples_committed += (whole - accounted) as u64;
                    accounted = whole;
                })?;
                trace!("pcm written, sample {}", cursor.samples_committed);
            }
        }

        Ok(in_samples)
    }

    /// Discards what is queued so playback can restart cleanly.
    ///
    /// Raw PCM is pushed out of the device with a block of silence.
    /// Compressed streams have no silence encoding; the clear is only
    /// recorded so [`TimeSource::current_time`] can bridge the gap.
    pub fn clear(&mut self) {
        let (Some(stream), Some(spec)) = (self.stream.as_ref(), self.spec.as_ref()) else {
            return;
        };

        if spec.format.is_compressed() {
            debug!("flush bitstream frame_sent {}", self.cursor.frames_sent);
        } else {
            let silence = vec![0u8; FLUSH_DATA_SIZE];
            match write_all(&**stream, &self.time, &silence, |_| {}) {
                Ok(()) => debug!("clear done"),
                Err(err) => error!("clear failed: {}", err),
            }
        }
        self.time.mark_flushed();
    }
}

/// Writes all of `data`, reissuing the remainder after partial writes.
///
/// `progress` sees the running total after every write. A write that
/// returns zero is retried as is.
fn write_all(
    stream: &dyn OutputStream,
    time: &TimeSource,
    data: &[u8],
    mut progress: impl FnMut(usize),
) -> Result<(), RingBufferError> {
    let mut offset = 0;
    while offset < data.len() {
        let written = stream.write(&data[offset..]).inspect_err(|err| {
            error!("write failed after {}/{} bytes: {}", offset, data.len(), err);
        })?;
        let written = written.min(data.len() - offset);
        if written > 0 {
            time.clear_flushed();
        }
        offset += written;
        trace!("write {} left {}", written, data.len() - offset);
        progress(offset);
    }
    Ok(())
}
