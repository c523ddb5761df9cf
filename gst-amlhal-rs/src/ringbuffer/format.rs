// SPDX-FileCopyrightText: 2025 2025 Contributors to the gst-amlhal project.
// SPDX-License-Identifier: Apache-2.0

//! Stream description and its mapping onto HAL output parameters.

use amlhal::{AudioFormat, ChannelMask, OutputDevice, OutputFlags, StreamConfig};

use super::RingBufferError;

/// Encoding of the audio handed to the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleFormat {
    /// Interleaved S16LE.
    Pcm16,
    Ac3,
    EAc3,
}

impl SampleFormat {
    pub fn is_compressed(self) -> bool {
        !matches!(self, SampleFormat::Pcm16)
    }

    pub fn hal_format(self) -> AudioFormat {
        match self {
            SampleFormat::Pcm16 => AudioFormat::Pcm16Bit,
            SampleFormat::Ac3 => AudioFormat::Ac3,
            SampleFormat::EAc3 => AudioFormat::EAc3,
        }
    }
}

/// Negotiated stream parameters, fixed for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSpec {
    pub format: SampleFormat,
    pub sample_rate: u32,
    pub channels: u32,
}

impl StreamSpec {
    /// Bytes per sample frame as seen by callers of `commit`.
    ///
    /// Compressed streams are counted in bytes, so one "sample" is one byte.
    pub fn bytes_per_frame(&self) -> usize {
        match self.format {
            SampleFormat::Pcm16 => 2 * self.channels as usize,
            SampleFormat::Ac3 | SampleFormat::EAc3 => 1,
        }
    }
}

/// Element configuration that shapes the opened output stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputConfig {
    /// Open a direct output instead of going through the system mixer.
    pub direct_mode: bool,
    pub device: OutputDevice,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            direct_mode: true,
            device: OutputDevice::Speaker,
        }
    }
}

/// Output stream parameters for `spec`, and whether mono input has to be
/// expanded to stereo before writing.
pub(crate) fn stream_config(
    spec: &StreamSpec,
    output: &OutputConfig,
) -> Result<(StreamConfig, bool), RingBufferError> {
    if !output.direct_mode && spec.channels != 2 {
        return Err(RingBufferError::UnsupportedChannels(spec.channels));
    }

    let (channel_mask, expand) = match spec.channels {
        1 => (ChannelMask::Stereo, true),
        n => (
            ChannelMask::from_channels(n).ok_or(RingBufferError::UnsupportedChannels(n))?,
            false,
        ),
    };

    let config = StreamConfig {
        sample_rate: spec.sample_rate,
        channel_mask,
        format: spec.format.hal_format(),
        flags: if output.direct_mode {
            OutputFlags::Direct
        } else {
            OutputFlags::Primary
        },
        device: output.device,
    };
    Ok((config, expand))
}
