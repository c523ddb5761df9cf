// SPDX-FileCopyrightText: 2025 2025 Contributors to the gst-amlhal project.
// SPDX-License-Identifier: Apache-2.0

//! Typed views of the HAL's integer codes.

use std::time::Duration;

/// Sample encoding of an output stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioFormat {
    /// Interleaved signed 16-bit little-endian PCM.
    Pcm16Bit,
    /// Dolby Digital bitstream.
    Ac3,
    /// Dolby Digital Plus bitstream.
    EAc3,
}

impl AudioFormat {
    pub fn as_raw(self) -> amlhal_sys::audio_format_t {
        match self {
            AudioFormat::Pcm16Bit => amlhal_sys::AUDIO_FORMAT_PCM_16_BIT,
            AudioFormat::Ac3 => amlhal_sys::AUDIO_FORMAT_AC3,
            AudioFormat::EAc3 => amlhal_sys::AUDIO_FORMAT_E_AC3,
        }
    }
}

/// Speaker layout requested from the HAL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelMask {
    Stereo,
    FivePointOne,
    SevenPointOne,
}

impl ChannelMask {
    /// Picks the layout for an interleaved channel count, if the HAL has one.
    pub fn from_channels(channels: u32) -> Option<Self> {
        match channels {
            2 => Some(ChannelMask::Stereo),
            6 => Some(ChannelMask::FivePointOne),
            8 => Some(ChannelMask::SevenPointOne),
            _ => None,
        }
    }

    pub fn channels(self) -> u32 {
        match self {
            ChannelMask::Stereo => 2,
            ChannelMask::FivePointOne => 6,
            ChannelMask::SevenPointOne => 8,
        }
    }

    pub fn as_raw(self) -> amlhal_sys::audio_channel_mask_t {
        match self {
            ChannelMask::Stereo => amlhal_sys::AUDIO_CHANNEL_OUT_STEREO,
            ChannelMask::FivePointOne => amlhal_sys::AUDIO_CHANNEL_OUT_5POINT1,
            ChannelMask::SevenPointOne => amlhal_sys::AUDIO_CHANNEL_OUT_7POINT1,
        }
    }
}

/// Mixing path of an output stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFlags {
    /// Bypasses the system mixer (main program audio, bitstream passthrough).
    Direct,
    /// Goes through the system sound mixer.
    Primary,
}

impl OutputFlags {
    pub fn as_raw(self) -> amlhal_sys::audio_output_flags_t {
        match self {
            OutputFlags::Direct => amlhal_sys::AUDIO_OUTPUT_FLAG_DIRECT,
            OutputFlags::Primary => amlhal_sys::AUDIO_OUTPUT_FLAG_PRIMARY,
        }
    }
}

/// Physical output the stream is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputDevice {
    Speaker,
    Hdmi,
    HdmiArc,
    Spdif,
}

impl OutputDevice {
    pub fn as_raw(self) -> amlhal_sys::audio_devices_t {
        match self {
            OutputDevice::Speaker => amlhal_sys::AUDIO_DEVICE_OUT_SPEAKER,
            OutputDevice::Hdmi => amlhal_sys::AUDIO_DEVICE_OUT_HDMI,
            OutputDevice::HdmiArc => amlhal_sys::AUDIO_DEVICE_OUT_HDMI_ARC,
            OutputDevice::Spdif => amlhal_sys::AUDIO_DEVICE_OUT_SPDIF,
        }
    }
}

/// Parameters of `open_output_stream`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConfig {
    pub sample_rate: u32,
    pub channel_mask: ChannelMask,
    pub format: AudioFormat,
    pub flags: OutputFlags,
    pub device: OutputDevice,
}

impl StreamConfig {
    pub(crate) fn to_raw(self) -> amlhal_sys::AudioConfig {
        amlhal_sys::AudioConfig {
            sample_rate: self.sample_rate,
            channel_mask: self.channel_mask.as_raw(),
            format: self.format.as_raw(),
            ..Default::default()
        }
    }
}

/// Role of an audio port within a patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortRole {
    Source,
    Sink,
}

/// One end of an audio patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortKind {
    /// A software mix port.
    Mix,
    /// A hardware output device.
    Device(OutputDevice),
}

/// Configuration of one audio port, as used for patches and gain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortConfig {
    pub id: i32,
    pub role: PortRole,
    pub kind: PortKind,
    pub sample_rate: u32,
    pub format: AudioFormat,
}

impl PortConfig {
    pub(crate) fn to_raw(self) -> amlhal_sys::AudioPortConfig {
        let mut raw = amlhal_sys::AudioPortConfig {
            id: self.id,
            role: match self.role {
                PortRole::Source => amlhal_sys::AUDIO_PORT_ROLE_SOURCE,
                PortRole::Sink => amlhal_sys::AUDIO_PORT_ROLE_SINK,
            },
            config_mask: amlhal_sys::AUDIO_PORT_CONFIG_SAMPLE_RATE
                | amlhal_sys::AUDIO_PORT_CONFIG_FORMAT,
            sample_rate: self.sample_rate,
            format: self.format.as_raw(),
            ..Default::default()
        };
        match self.kind {
            PortKind::Mix => raw.type_ = amlhal_sys::AUDIO_PORT_TYPE_MIX,
            PortKind::Device(device) => {
                raw.type_ = amlhal_sys::AUDIO_PORT_TYPE_DEVICE;
                raw.ext.type_ = device.as_raw();
            }
        }
        raw
    }

    /// Builds the gain-only configuration for a sink device port.
    ///
    /// The HAL takes gain in hundredths of a dB.
    pub(crate) fn raw_gain(id: i32, gain_mb: i32) -> amlhal_sys::AudioPortConfig {
        let mut raw = amlhal_sys::AudioPortConfig {
            id,
            role: amlhal_sys::AUDIO_PORT_ROLE_SINK,
            type_: amlhal_sys::AUDIO_PORT_TYPE_DEVICE,
            config_mask: amlhal_sys::AUDIO_PORT_CONFIG_GAIN,
            ..Default::default()
        };
        raw.gain.values[0] = gain_mb;
        raw
    }
}

/// Handle of an audio patch created on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PatchHandle(pub i32);

/// Rendered position reported by an output stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresentationPosition {
    /// Frames that have left the device since the stream was opened.
    pub frames: u64,
    /// Monotonic time at which `frames` was sampled.
    pub timestamp: Duration,
}
