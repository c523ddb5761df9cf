//! Amlogic audio HAL sink implementation
//!
//! This module contains the core implementation of the amlhalasink element.
//! It implements GStreamer's BaseSink trait, handling:
//! - Element lifecycle (HAL load/unload in start/stop)
//! - Property management (output-port, direct-mode, volume, mute, hal-library)
//! - Caps negotiation (acquiring the ring buffer for the negotiated format)
//! - Buffer rendering (see `render.rs`)
//! - Clock provision (`AmlHalClock`, driven by the ring buffer time source)
//!
//! ## Data Flow
//! ```text
//! render() ──► UniqueAdapter ──► RingBuffer::commit ──► HAL output stream
//!                                        │
//!                          TimeSource ◄──┘──► AmlHalClock (pipeline clock)
//! ```
//!
//! ## State Changes
//! - READY → PAUSED: posts CLOCK_PROVIDE
//! - PAUSED → PLAYING: the ring buffer may start on the next commit
//! - PLAYING → PAUSED: start permission withdrawn, ring buffer paused
//! - PAUSED → READY: posts CLOCK_LOST

// SPDX-FileCopyrightText: 2025 2025 Contributors to the gst-amlhal project.
// SPDX-License-Identifier: Apache-2.0

use gst::glib;
use gst::prelude::*;
use gst::subclass::prelude::*;
use gst_base::prelude::*;
use gst_base::subclass::prelude::*;
use gstreamer as gst;
use gstreamer_base as gst_base;

use amlhal::{AudioHwDevice, HalDevice};
use tracing::trace;

use std::sync::Arc;
use std::sync::LazyLock;
use std::sync::Mutex;

use crate::amlhalasink;
use crate::amlhalasink::clock::AmlHalClock;
use crate::amlhalasink::render;
use crate::amlhalasink::state::{
    Context, DEFAULT_DIRECT_MODE, DEFAULT_MUTE, DEFAULT_OUTPUT_PORT, DEFAULT_VOLUME,
    MAX_VOLUME, OutputPort, Settings, State, apply_mute, apply_volume, setup_device,
    stream_spec_from_caps,
};

/// GStreamer debug category for amlhalasink messages.
///
/// Set GST_DEBUG=amlhalasink:5 to see TRACE-level logs.
pub(crate) static CAT: LazyLock<gst::DebugCategory> = LazyLock::new(|| {
    gst::DebugCategory::new(
        "amlhalasink",
        gst::DebugColorFlags::empty(),
        Some("Amlogic audio HAL sink"),
    )
});

/// Amlogic audio HAL sink element implementation.
///
/// ## Thread Safety
/// `context` is locked by the streaming thread for every render, including
/// the blocking device writes, and by the application thread for state
/// changes. Volume and mute updates only take the short-held `device` slot,
/// and the clock reads the ring buffer's shared `TimeSource`; neither waits
/// on a render.
pub struct AmlHalAsink {
    /// User-configurable properties
    settings: Mutex<Settings>,

    /// Runtime state (HAL device, ring buffer, pending bytes)
    context: Mutex<Context>,

    /// The loaded HAL device, for control calls outside the streaming thread
    device: Mutex<Option<Arc<dyn AudioHwDevice>>>,

    /// Clock offered to the pipeline
    clock: AmlHalClock,
}

impl Default for AmlHalAsink {
    fn default() -> Self {
        AmlHalAsink {
            settings: Mutex::new(Settings::default()),
            context: Mutex::new(Context::default()),
            device: Mutex::new(None),
            clock: AmlHalClock::new(),
        }
    }
}

#[glib::object_subclass]
impl ObjectSubclass for AmlHalAsink {
    const NAME: &'static str = "GstAmlHalAsink";
    type Type = amlhalasink::AmlHalAsink;
    type ParentType = gst_base::BaseSink;
}

impl ObjectImpl for AmlHalAsink {
    fn properties() -> &'static [glib::ParamSpec] {
        static PROPERTIES: LazyLock<Vec<glib::ParamSpec>> = LazyLock::new(|| {
            vec![
                glib::ParamSpecEnum::builder_with_default("output-port", DEFAULT_OUTPUT_PORT)
                    .nick("Output Port")
                    .blurb("select active output port for audio")
                    .mutable_ready()
                    .build(),
                glib::ParamSpecBoolean::builder("direct-mode")
                    .nick("Direct Mode")
                    .blurb(
                        "Select this mode for main mixing port, unselect it for system sound mixing port",
                    )
                    .default_value(DEFAULT_DIRECT_MODE)
                    .mutable_ready()
                    .build(),
                glib::ParamSpecDouble::builder("volume")
                    .nick("Volume")
                    .blurb("Linear volume of this stream, 1.0=100%")
                    .minimum(0.0)
                    .maximum(MAX_VOLUME)
                    .default_value(DEFAULT_VOLUME)
                    .mutable_playing()
                    .build(),
                glib::ParamSpecBoolean::builder("mute")
                    .nick("Mute")
                    .blurb("Mute state of this stream")
                    .default_value(DEFAULT_MUTE)
                    .mutable_playing()
                    .build(),
                glib::ParamSpecString::builder("hal-library")
                    .nick("HAL Library")
                    .blurb("Audio client library providing the audio HAL")
                    .default_value(Some(amlhal::config::AUDIO_CLIENT_LIBRARY))
                    .mutable_ready()
                    .build(),
            ]
        });

        PROPERTIES.as_ref()
    }

    /// Sets up tracing (if enabled), leaves pacing to the blocking device
    /// writes and advertises the provided clock.
    fn constructed(&self) {
        #[cfg(feature = "tracing")]
        {
            use tracing_subscriber::filter::LevelFilter;
            use tracing_subscriber::util::SubscriberInitExt;

            let _ = tracing_subscriber::fmt()
                .compact()
                .with_file(true)
                .with_line_number(true)
                .with_thread_ids(true)
                .with_target(false)
                .with_max_level(LevelFilter::TRACE)
                .with_ansi(true)
                .finish()
                .try_init();
        }

        self.parent_constructed();

        let obj = self.obj();
        obj.set_sync(false);
        obj.set_element_flags(gst::ElementFlags::PROVIDE_CLOCK | gst::ElementFlags::REQUIRE_CLOCK);
    }

    fn set_property(&self, _id: usize, value: &glib::Value, pspec: &glib::ParamSpec) {
        match pspec.name() {
            "volume" => match value.get::<f64>() {
                Ok(volume) => self.set_volume(volume),
                Err(_) => gst::error!(CAT, imp = self, "Invalid type for volume property"),
            },
            "mute" => match value.get::<bool>() {
                Ok(mute) => self.set_mute(mute),
                Err(_) => gst::error!(CAT, imp = self, "Invalid type for mute property"),
            },
            name => {
                let Ok(mut settings) = self.settings.lock() else {
                    gst::error!(
                        CAT,
                        imp = self,
                        "Settings mutex poisoned, property change ignored"
                    );
                    return;
                };
                match name {
                    "output-port" => match value.get::<OutputPort>() {
                        Ok(port) => {
                            gst::debug!(CAT, imp = self, "set output port: {:?}", port);
                            settings.output_port = port;
                        }
                        Err(_) => {
                            gst::error!(CAT, imp = self, "Invalid type for output-port property")
                        }
                    },
                    "direct-mode" => match value.get::<bool>() {
                        Ok(direct_mode) => {
                            gst::debug!(CAT, imp = self, "set direct mode: {}", direct_mode);
                            settings.direct_mode = direct_mode;
                        }
                        Err(_) => {
                            gst::error!(CAT, imp = self, "Invalid type for direct-mode property")
                        }
                    },
                    "hal-library" => match value.get::<Option<String>>() {
                        Ok(library) => {
                            let library = library
                                .unwrap_or_else(|| amlhal::config::AUDIO_CLIENT_LIBRARY.to_owned());
                            gst::info!(
                                CAT,
                                imp = self,
                                "Changing hal-library from {} to {}",
                                settings.hal_library,
                                library
                            );
                            settings.hal_library = library;
                        }
                        Err(_) => {
                            gst::error!(CAT, imp = self, "Invalid type for hal-library property")
                        }
                    },
                    other => gst::error!(CAT, imp = self, "Unknown property '{}'", other),
                }
            }
        }
    }

    fn property(&self, _id: usize, pspec: &glib::ParamSpec) -> glib::Value {
        let Ok(settings) = self.settings.lock() else {
            gst::error!(CAT, imp = self, "Settings mutex poisoned");
            return pspec.default_value().clone();
        };
        match pspec.name() {
            "output-port" => settings.output_port.to_value(),
            "direct-mode" => settings.direct_mode.to_value(),
            "volume" => settings.volume.to_value(),
            "mute" => settings.mute.to_value(),
            "hal-library" => settings.hal_library.to_value(),
            other => {
                gst::error!(CAT, imp = self, "Unknown property {}", other);
                pspec.default_value().clone()
            }
        }
    }
}

impl GstObjectImpl for AmlHalAsink {}

impl ElementImpl for AmlHalAsink {
    fn metadata() -> Option<&'static gst::subclass::ElementMetadata> {
        static ELEMENT_METADATA: LazyLock<gst::subclass::ElementMetadata> = LazyLock::new(|| {
            gst::subclass::ElementMetadata::new(
                "Amlogic audio HAL sink",
                "Sink/Audio",
                "Plays PCM and AC3/E-AC3 audio through the Amlogic audio HAL",
                "Contributors to the gst-amlhal project",
            )
        });

        Some(&*ELEMENT_METADATA)
    }

    /// One always-present sink pad accepting:
    /// - audio/x-raw, S16LE, 48 kHz, 1 to 32 interleaved channels
    /// - audio/x-ac3 and audio/x-eac3 at any rate and channel count
    fn pad_templates() -> &'static [gst::PadTemplate] {
        static PAD_TEMPLATES: LazyLock<Result<Vec<gst::PadTemplate>, glib::BoolError>> =
            LazyLock::new(|| {
                let mut caps = gst::Caps::new_empty();
                {
                    let caps_mut = caps.make_mut();

                    caps_mut.append(
                        gst::Caps::builder("audio/x-raw")
                            .field("format", "S16LE")
                            .field("rate", 48000i32)
                            .field("channels", gst::IntRange::new(1i32, 32))
                            .field("layout", "interleaved")
                            .build(),
                    );

                    for media_type in ["audio/x-ac3", "audio/x-eac3"] {
                        caps_mut.append(
                            gst::Caps::builder(media_type)
                                .field("channels", gst::IntRange::new(1i32, i32::MAX))
                                .field("rate", gst::IntRange::new(1i32, i32::MAX))
                                .build(),
                        );
                    }
                }

                let sink_pad_template = gst::PadTemplate::new(
                    "sink",
                    gst::PadDirection::Sink,
                    gst::PadPresence::Always,
                    &caps,
                )?;

                Ok(vec![sink_pad_template])
            });

        match PAD_TEMPLATES.as_ref() {
            Ok(templates) => templates,
            Err(err) => {
                trace!("Failed to create pad templates: {:?}", err);
                &[]
            }
        }
    }

    fn provide_clock(&self) -> Option<gst::Clock> {
        Some(self.clock.clone().upcast())
    }

    fn change_state(
        &self,
        transition: gst::StateChange,
    ) -> Result<gst::StateChangeSuccess, gst::StateChangeError> {
        gst::trace!(CAT, imp = self, "Changing state {:?}", transition);

        match transition {
            gst::StateChange::ReadyToPaused => {
                let message = gst::message::ClockProvide::builder(self.clock.upcast_ref(), true)
                    .src(&*self.obj())
                    .build();
                self.post(message);
            }
            gst::StateChange::PausedToPlaying => self.with_ring(|ring| ring.set_may_start(true)),
            gst::StateChange::PlayingToPaused => self.with_ring(|ring| {
                ring.set_may_start(false);
                if ring.is_acquired() {
                    let _ = ring.pause();
                }
            }),
            _ => (),
        }

        let success = self.parent_change_state(transition)?;

        if transition == gst::StateChange::PausedToReady {
            let message = gst::message::ClockLost::builder(self.clock.upcast_ref())
                .src(&*self.obj())
                .build();
            self.post(message);
        }

        Ok(success)
    }
}

impl BaseSinkImpl for AmlHalAsink {
    /// Loads the HAL and routes the mix port to the speaker.
    ///
    /// Failing to load the HAL or to create the patch fails the state change
    /// and unloads the device again.
    fn start(&self) -> Result<(), gst::ErrorMessage> {
        let mut context = self.context.lock().map_err(|e| {
            gst::error_msg!(gst::CoreError::Failed, ["Failed to get state mutex: {}", e])
        })?;

        let settings = self
            .settings
            .lock()
            .map_err(|e| {
                gst::error_msg!(
                    gst::CoreError::Failed,
                    ["Failed to get settings mutex: {}", e]
                )
            })?
            .clone();

        let device = open_device(&settings)?;

        gst::debug!(CAT, imp = self, "create mix --> speaker patch...");
        let patch = setup_device(device.as_ref(), &settings).map_err(|e| {
            gst::error_msg!(gst::ResourceError::OpenWrite, ["patch fail: {}", e])
        })?;

        let mut state = State::new(device.clone());
        state.patch = Some(patch);

        match self.device.lock() {
            Ok(mut slot) => *slot = Some(device),
            Err(e) => gst::error!(CAT, imp = self, "Failed to lock device mutex: {}", e),
        }
        self.clock.set_time_source(Some(state.ring.time_source()));
        context.state = Some(state);

        gst::info!(CAT, imp = self, "Started");
        Ok(())
    }

    /// Stops and releases the device session, then unloads the HAL.
    fn stop(&self) -> Result<(), gst::ErrorMessage> {
        let mut context = self.context.lock().map_err(|e| {
            gst::error_msg!(
                gst::CoreError::Failed,
                ["Failed to get context mutex: {}", e]
            )
        })?;

        self.clock.set_time_source(None);
        if let Ok(mut slot) = self.device.lock() {
            slot.take();
        }

        let Some(mut state) = context.state.take() else {
            return Ok(());
        };

        if state.ring.is_acquired() {
            if let Err(err) = state.ring.stop() {
                gst::warning!(CAT, imp = self, "stop: {}", err);
            }
            state.ring.release();
        }

        if let Some(patch) = state.patch.take() {
            match state.device.release_patch(patch) {
                Ok(()) => gst::debug!(CAT, imp = self, "patch destroyed"),
                Err(err) => gst::error!(CAT, imp = self, "destroy patch fail: {}", err),
            }
        }

        drop(state);
        gst::info!(CAT, imp = self, "Stopped");
        Ok(())
    }

    fn render(&self, buffer: &gst::Buffer) -> Result<gst::FlowSuccess, gst::FlowError> {
        let mut context = self.context.lock().map_err(|_| gst::FlowError::Error)?;
        let state = context.state.as_mut().ok_or(gst::FlowError::Flushing)?;

        render::render(self, state, buffer)
    }

    /// Answers CAPS and ACCEPT_CAPS from the pad template.
    fn query(&self, query: &mut gst::QueryRef) -> bool {
        match query.view_mut() {
            gst::QueryViewMut::Caps(q) => {
                let template = self.obj().sink_pad().pad_template_caps();
                let caps = match q.filter() {
                    Some(filter) => {
                        filter.intersect_with_mode(&template, gst::CapsIntersectMode::First)
                    }
                    None => template,
                };
                gst::debug!(CAT, imp = self, "Returning caps {:?}", caps);
                q.set_result(&caps);
                true
            }
            gst::QueryViewMut::AcceptCaps(q) => {
                let template = self.obj().sink_pad().pad_template_caps();
                let accepted = q.caps().is_subset(&template);
                gst::debug!(CAT, imp = self, "caps {:?} accepted: {}", q.caps(), accepted);
                q.set_result(accepted);
                true
            }
            _ => BaseSinkImplExt::parent_query(self, query),
        }
    }

    fn event(&self, event: gst::Event) -> bool {
        match event.view() {
            gst::EventView::Gap(gap) => {
                let (_timestamp, duration) = gap.get();
                if duration.is_none() {
                    self.with_ring(|ring| ring.clear());
                }
            }
            gst::EventView::Eos(_) => self.with_ring(|ring| ring.clear()),
            gst::EventView::FlushStart(_) => self.with_ring(|ring| {
                if ring.is_acquired() {
                    let _ = ring.pause();
                }
                ring.clear();
            }),
            gst::EventView::FlushStop(_) => {
                if let Ok(mut context) = self.context.lock() {
                    if let Some(state) = context.state.as_mut() {
                        state.adapter.clear();
                    }
                }
            }
            _ => (),
        }

        self.parent_event(event)
    }

    /// Acquires the ring buffer for the negotiated format.
    ///
    /// A caps change on a running session releases the old stream first.
    fn set_caps(&self, caps: &gst::Caps) -> Result<(), gst::LoggableError> {
        let spec = stream_spec_from_caps(caps)?;

        let mut context = self
            .context
            .lock()
            .map_err(|e| gst::loggable_error!(CAT, "Failed to lock context mutex: {}", e))?;
        let state = context
            .state
            .as_mut()
            .ok_or(gst::loggable_error!(CAT, "Failed to get state"))?;

        let output = self
            .settings
            .lock()
            .map_err(|e| gst::loggable_error!(CAT, "Failed to lock settings mutex: {}", e))?
            .output_config();

        if state.ring.spec() == Some(&spec) {
            return Ok(());
        }
        if state.ring.is_acquired() {
            gst::debug!(CAT, imp = self, "caps changed, releasing stream");
            state.ring.release();
            state.adapter.clear();
        }

        state
            .ring
            .acquire(state.device.as_ref(), spec, &output)
            .map_err(|e| gst::loggable_error!(CAT, "Failed to acquire ring buffer: {}", e))?;

        gst::debug!(
            CAT,
            imp = self,
            "format {:?}, sr {}, ch {}",
            spec.format,
            spec.sample_rate,
            spec.channels
        );
        Ok(())
    }
}

impl AmlHalAsink {
    /// Runs `f` on the ring buffer if the element is started.
    fn with_ring(&self, f: impl FnOnce(&mut crate::ringbuffer::RingBuffer)) {
        match self.context.lock() {
            Ok(mut context) => {
                if let Some(state) = context.state.as_mut() {
                    f(&mut state.ring);
                }
            }
            Err(e) => gst::error!(CAT, imp = self, "Failed to lock context mutex: {}", e),
        }
    }

    fn device(&self) -> Option<Arc<dyn AudioHwDevice>> {
        self.device.lock().ok()?.clone()
    }

    fn post(&self, message: gst::Message) {
        if let Err(err) = self.obj().post_message(message) {
            gst::warning!(CAT, imp = self, "Failed to post message: {}", err);
        }
    }

    /// Stores the volume, pushing it to the HAL when a device is loaded.
    ///
    /// A value the HAL rejects is not stored.
    fn set_volume(&self, volume: f64) {
        gst::debug!(CAT, imp = self, "set vol: {}", volume);
        if let Some(device) = self.device() {
            if let Err(err) = apply_volume(device.as_ref(), volume) {
                gst::error!(CAT, imp = self, "port_config fail: {}", err);
                return;
            }
        }
        if let Ok(mut settings) = self.settings.lock() {
            settings.volume = volume;
        }
    }

    fn set_mute(&self, mute: bool) {
        gst::debug!(CAT, imp = self, "set mute: {}", mute);
        if let Some(device) = self.device() {
            if let Err(err) = apply_mute(device.as_ref(), mute) {
                gst::error!(CAT, imp = self, "mute fail: {}", err);
                return;
            }
        }
        if let Ok(mut settings) = self.settings.lock() {
            settings.mute = mute;
        }
    }
}

/// Loads the audio client library and opens the HAL device.
fn open_device(settings: &Settings) -> Result<Arc<dyn AudioHwDevice>, gst::ErrorMessage> {
    let api = amlhal::load_api(&settings.hal_library).map_err(|e| {
        gst::error_msg!(
            gst::ResourceError::OpenWrite,
            ["Failed to load {}: {}", settings.hal_library, e]
        )
    })?;

    let device = HalDevice::open(api).map_err(|e| {
        gst::error_msg!(
            gst::ResourceError::OpenWrite,
            ["fail to load hw: {}", e]
        )
    })?;

    Ok(Arc::new(device))
}
