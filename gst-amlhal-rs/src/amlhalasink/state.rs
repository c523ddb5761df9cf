//! State for the Amlogic audio HAL sink
//!
//! ## Key Types
//! - `Settings`: User-configurable properties (output port, mode, volume)
//! - `State`: Runtime state (loaded HAL device, patch, ring buffer, pending bytes)
//! - `Context`: Holds the `State` between `start()` and `stop()`
//!
//! ## Initialization Flow
//! 1. `start()` loads the HAL client library, opens the device and creates the
//!    mix to speaker patch
//! 2. `set_caps()` maps the negotiated caps to a `StreamSpec` with
//!    `stream_spec_from_caps()` and acquires the ring buffer
//! 3. `render()` feeds buffers through the byte adapter into the ring buffer

// SPDX-FileCopyrightText: 2025 2025 Contributors to the gst-amlhal project.
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use amlhal::{
    AudioFormat, AudioHwDevice, OutputDevice, PatchHandle, PortConfig, PortKind, PortRole,
};
use gst::glib;
use gstreamer as gst;
use gstreamer_audio as gst_audio;
use gstreamer_base as gst_base;

use crate::amlhalasink::imp::CAT;
use crate::ringbuffer::{OutputConfig, RingBuffer, SampleFormat, StreamSpec};

/// Default value for the output-port property
pub(crate) const DEFAULT_OUTPUT_PORT: OutputPort = OutputPort::Speaker;

/// Default value for the direct-mode property
pub(crate) const DEFAULT_DIRECT_MODE: bool = true;

/// Default value for the volume property (linear, 1.0 = 100%)
pub(crate) const DEFAULT_VOLUME: f64 = 1.0;

/// Upper bound of the volume property
pub(crate) const MAX_VOLUME: f64 = 1.0;

/// Default value for the mute property
pub(crate) const DEFAULT_MUTE: bool = false;

/// Port id of the sink device end of the mix patch; gain is applied here.
pub(crate) const SINK_PORT_ID: i32 = 2;

/// Port id of the mix (source) end of the patch.
pub(crate) const MIX_PORT_ID: i32 = 1;

/// Rate of both ends of the mix to speaker patch.
const PATCH_SAMPLE_RATE: u32 = 48000;

/// Physical output selected with the output-port property.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, glib::Enum)]
#[repr(u32)]
#[enum_type(name = "AmlAsinkOutputPort")]
pub enum OutputPort {
    #[default]
    #[enum_value(name = "Speaker", nick = "speaker")]
    Speaker = 0,
    #[enum_value(name = "HDMI-Tx", nick = "hdmitx")]
    HdmiTx = 1,
    #[enum_value(name = "HDMI ARC", nick = "hdmi-arc")]
    HdmiArc = 2,
    #[enum_value(name = "SPDIF", nick = "spdif")]
    Spdif = 3,
}

impl From<OutputPort> for OutputDevice {
    fn from(port: OutputPort) -> Self {
        match port {
            OutputPort::Speaker => OutputDevice::Speaker,
            OutputPort::HdmiTx => OutputDevice::Hdmi,
            OutputPort::HdmiArc => OutputDevice::HdmiArc,
            OutputPort::Spdif => OutputDevice::Spdif,
        }
    }
}

/// User-configurable settings for the amlhalasink element.
#[derive(Debug, Clone)]
pub(crate) struct Settings {
    /// Output the stream is routed to (applies to the next acquire)
    pub output_port: OutputPort,

    /// Direct output instead of the system sound mixer
    pub direct_mode: bool,

    /// Linear volume
    pub volume: f64,

    pub mute: bool,

    /// Path or name of the audio client library
    pub hal_library: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            output_port: DEFAULT_OUTPUT_PORT,
            direct_mode: DEFAULT_DIRECT_MODE,
            volume: DEFAULT_VOLUME,
            mute: DEFAULT_MUTE,
            hal_library: amlhal::config::AUDIO_CLIENT_LIBRARY.to_owned(),
        }
    }
}

impl Settings {
    pub(crate) fn output_config(&self) -> OutputConfig {
        OutputConfig {
            direct_mode: self.direct_mode,
            device: self.output_port.into(),
        }
    }
}

/// Runtime state for the amlhalasink element.
pub(crate) struct State {
    /// The loaded HAL device (unloaded when the last handle drops)
    pub device: Arc<dyn AudioHwDevice>,

    /// Mix to speaker patch, if the HAL accepted it
    pub patch: Option<PatchHandle>,

    /// Device session and commit engine
    pub ring: RingBuffer,

    /// Bytes received but not yet committed (alignment or start gating)
    pub adapter: gst_base::UniqueAdapter,
}

impl State {
    pub(crate) fn new(device: Arc<dyn AudioHwDevice>) -> Self {
        State {
            device,
            patch: None,
            ring: RingBuffer::new(),
            adapter: gst_base::UniqueAdapter::new(),
        }
    }
}

/// Context wrapper for the element's mutable state.
///
/// `state` is created in start() and destroyed in stop().
#[derive(Default)]
pub(crate) struct Context {
    pub state: Option<State>,
}

fn mix_port() -> PortConfig {
    PortConfig {
        id: MIX_PORT_ID,
        role: PortRole::Source,
        kind: PortKind::Mix,
        sample_rate: PATCH_SAMPLE_RATE,
        format: AudioFormat::Pcm16Bit,
    }
}

fn speaker_port() -> PortConfig {
    PortConfig {
        id: SINK_PORT_ID,
        role: PortRole::Sink,
        kind: PortKind::Device(OutputDevice::Speaker),
        sample_rate: PATCH_SAMPLE_RATE,
        format: AudioFormat::Pcm16Bit,
    }
}

/// Routes the mix port to the speaker, then applies any non-default volume
/// and mute from `settings`.
///
/// # Errors
///
/// Fails if the HAL refuses the patch. Gain and mute failures are logged
/// and do not fail the setup.
pub(crate) fn setup_device(
    device: &dyn AudioHwDevice,
    settings: &Settings,
) -> amlhal::Result<PatchHandle> {
    let patch = device.create_patch(&mix_port(), &speaker_port())?;
    gst::debug!(CAT, "patch {:?} created", patch);

    if settings.volume != DEFAULT_VOLUME {
        if let Err(err) = apply_volume(device, settings.volume) {
            gst::error!(CAT, "port_config fail: {}", err);
        }
    }
    if settings.mute != DEFAULT_MUTE {
        if let Err(err) = apply_mute(device, settings.mute) {
            gst::error!(CAT, "mute fail: {}", err);
        }
    }

    Ok(patch)
}

/// Sends a linear volume to the sink device port.
pub(crate) fn apply_volume(device: &dyn AudioHwDevice, volume: f64) -> amlhal::Result<()> {
    let gain_mb = volume_to_gain_mb(volume);
    device.set_port_gain(SINK_PORT_ID, gain_mb)?;
    gst::log!(CAT, "hal volume set to {} mB", gain_mb);
    Ok(())
}

pub(crate) fn apply_mute(device: &dyn AudioHwDevice, mute: bool) -> amlhal::Result<()> {
    device.set_master_mute(mute)
}

/// Converts a linear volume to the HAL port gain in hundredths of a dB.
pub(crate) fn volume_to_gain_mb(volume: f64) -> i32 {
    let db = gst_audio::StreamVolume::convert_volume(
        gst_audio::StreamVolumeFormat::Linear,
        gst_audio::StreamVolumeFormat::Db,
        volume,
    );
    // `as` saturates, so silence (-inf dB) maps to the lowest gain.
    (db * 100.0) as i32
}

/// Maps negotiated caps to the stream parameters of a session.
pub(crate) fn stream_spec_from_caps(caps: &gst::CapsRef) -> Result<StreamSpec, gst::LoggableError> {
    let structure = caps
        .structure(0)
        .ok_or_else(|| gst::loggable_error!(CAT, "No structure in caps {}", caps))?;

    match structure.name().as_str() {
        "audio/x-raw" => {
            let info = gst_audio::AudioInfo::from_caps(caps)
                .map_err(|e| gst::loggable_error!(CAT, "Invalid audio caps: {}", e))?;
            if info.format() != gst_audio::AudioFormat::S16le {
                return Err(gst::loggable_error!(
                    CAT,
                    "Unsupported raw format {}",
                    info.format()
                ));
            }
            Ok(StreamSpec {
                format: SampleFormat::Pcm16,
                sample_rate: info.rate(),
                channels: info.channels(),
            })
        }
        name @ ("audio/x-ac3" | "audio/x-eac3") => {
            let rate = structure
                .get::<i32>("rate")
                .map_err(|e| gst::loggable_error!(CAT, "No rate in {}: {}", name, e))?;
            let channels = structure
                .get::<i32>("channels")
                .map_err(|e| gst::loggable_error!(CAT, "No channels in {}: {}", name, e))?;
            if rate <= 0 || channels <= 0 {
                return Err(gst::loggable_error!(
                    CAT,
                    "Invalid rate {} or channels {}",
                    rate,
                    channels
                ));
            }
            Ok(StreamSpec {
                format: if name == "audio/x-ac3" {
                    SampleFormat::Ac3
                } else {
                    SampleFormat::EAc3
                },
                sample_rate: rate as u32,
                channels: channels as u32,
            })
        }
        other => Err(gst::loggable_error!(CAT, "Unsupported media type {}", other)),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::Mutex;

    use amlhal::{OutputStream, StreamConfig};

    use super::*;

    #[derive(Default)]
    struct ControlDevice {
        refuse_patch: bool,
        patches: Mutex<Vec<(PortConfig, PortConfig)>>,
        gains: Mutex<Vec<(i32, i32)>>,
        mutes: Mutex<Vec<bool>>,
    }

    impl AudioHwDevice for ControlDevice {
        fn open_output_stream(
            &self,
            _config: &StreamConfig,
        ) -> amlhal::Result<Arc<dyn OutputStream>> {
            Err(amlhal::Error::NoDevice)
        }

        fn create_patch(&self, source: &PortConfig, sink: &PortConfig) -> amlhal::Result<PatchHandle> {
            if self.refuse_patch {
                return Err(amlhal::Error::InvalidArg);
            }
            self.patches.lock().unwrap().push((*source, *sink));
            Ok(PatchHandle(7))
        }

        fn release_patch(&self, _patch: PatchHandle) -> amlhal::Result<()> {
            Ok(())
        }

        fn set_port_gain(&self, port_id: i32, gain_mb: i32) -> amlhal::Result<()> {
            self.gains.lock().unwrap().push((port_id, gain_mb));
            Ok(())
        }

        fn set_master_mute(&self, mute: bool) -> amlhal::Result<()> {
            self.mutes.lock().unwrap().push(mute);
            Ok(())
        }
    }

    fn init() {
        gst::init().unwrap();
    }

    #[test]
    fn refused_patch_fails_setup() {
        init();
        let device = ControlDevice {
            refuse_patch: true,
            ..Default::default()
        };
        let settings = Settings {
            volume: 0.5,
            mute: true,
            ..Default::default()
        };

        assert!(matches!(
            setup_device(&device, &settings),
            Err(amlhal::Error::InvalidArg)
        ));
        assert!(device.gains.lock().unwrap().is_empty());
        assert!(device.mutes.lock().unwrap().is_empty());
    }

    #[test]
    fn setup_routes_mix_to_speaker() {
        init();
        let device = ControlDevice::default();

        let patch = setup_device(&device, &Settings::default()).unwrap();

        assert_eq!(patch, PatchHandle(7));
        let patches = device.patches.lock().unwrap();
        assert_eq!(patches.len(), 1);
        let (source, sink) = patches[0];
        assert_eq!(source.id, MIX_PORT_ID);
        assert_eq!(source.kind, PortKind::Mix);
        assert_eq!(sink.id, SINK_PORT_ID);
        assert_eq!(sink.kind, PortKind::Device(OutputDevice::Speaker));
        assert_eq!(sink.sample_rate, 48000);
        // Defaults are left to the HAL.
        assert!(device.gains.lock().unwrap().is_empty());
        assert!(device.mutes.lock().unwrap().is_empty());
    }

    #[test]
    fn setup_applies_stored_volume_and_mute() {
        init();
        let device = ControlDevice::default();
        let settings = Settings {
            volume: 0.5,
            mute: true,
            ..Default::default()
        };

        setup_device(&device, &settings).unwrap();

        assert_eq!(
            *device.gains.lock().unwrap(),
            vec![(SINK_PORT_ID, volume_to_gain_mb(0.5))]
        );
        assert_eq!(*device.mutes.lock().unwrap(), vec![true]);
    }

    #[test]
    fn gain_is_hundredths_of_a_db() {
        init();
        assert_eq!(volume_to_gain_mb(1.0), 0);
        // 0.5 linear is about -6.02 dB.
        assert_eq!(volume_to_gain_mb(0.5), -602);
        assert!(volume_to_gain_mb(0.0) < -10000);
    }
}
