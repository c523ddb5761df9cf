// SPDX-FileCopyrightText: 2025 2025 Contributors to the gst-amlhal project.
// SPDX-License-Identifier: Apache-2.0

//! Audio HAL device handle.
//!
//! [`AudioHwDevice`] is the capability surface the sink needs from a device:
//! opening output streams plus the control-plane calls (patches, port gain,
//! master mute). [`HalDevice`] implements it on top of the vendor client
//! library; tests implement it with in-memory mocks.

use std::sync::Arc;

use amlhal_sys::AudioStreamOut;
use tracing::{debug, error};

use crate::{
    Error, OutputStream, PatchHandle, PortConfig, Result, StreamConfig,
    api::AudioClientApiHandle, stream::HalOutputStream,
};

/// Operations the sink performs on an audio HAL device.
pub trait AudioHwDevice: Send + Sync {
    /// Opens an output stream. The stream is closed when the last reference
    /// to it is dropped.
    fn open_output_stream(&self, config: &StreamConfig) -> Result<Arc<dyn OutputStream>>;

    /// Connects one source port to one sink port.
    fn create_patch(&self, source: &PortConfig, sink: &PortConfig) -> Result<PatchHandle>;

    fn release_patch(&self, patch: PatchHandle) -> Result<()>;

    /// Sets the gain of a sink device port, in hundredths of a dB.
    fn set_port_gain(&self, port_id: i32, gain_mb: i32) -> Result<()>;

    fn set_master_mute(&self, mute: bool) -> Result<()>;
}

/// Shared ownership of a loaded `audio_hw_device`.
///
/// Streams keep a reference so the device cannot be unloaded under them.
pub(crate) struct DeviceContext {
    api: AudioClientApiHandle,
    pub(crate) device: *mut amlhal_sys::AudioHwDevice,
}

// Safety: the audio client serialises calls on the device internally; the
// pointer itself is only dereferenced to read the function table.
unsafe impl Send for DeviceContext {}
unsafe impl Sync for DeviceContext {}

impl DeviceContext {
    /// Reads the device function table.
    pub(crate) fn table(&self) -> amlhal_sys::AudioHwDevice {
        unsafe { *self.device }
    }

    pub(crate) fn close_output_stream(&self, stream: *mut AudioStreamOut) {
        match self.table().close_output_stream {
            Some(close) => unsafe { close(self.device, stream) },
            None => error!("Device has no close_output_stream, leaking stream"),
        }
    }
}

impl Drop for DeviceContext {
    /// Unloads the device when the last reference is dropped.
    fn drop(&mut self) {
        if !self.device.is_null() {
            unsafe { (self.api.unload_interface)(self.device) };
            debug!("Unloaded audio HAL device");
        }
    }
}

/// The vendor audio HAL device.
///
/// # Examples
///
/// ```no_run
/// use amlhal::{AudioHwDevice, HalDevice, config::default_library_path, load_api};
///
/// # fn main() -> Result<(), amlhal::Error> {
/// let api = load_api(default_library_path())?;
/// let device = HalDevice::open(api)?;
/// device.set_master_mute(false)?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct HalDevice {
    context: Arc<DeviceContext>,
}

impl HalDevice {
    /// Loads the device through the client library.
    ///
    /// # Errors
    ///
    /// Returns the HAL status if `audio_hw_load_interface` fails, or
    /// [`Error::NullHandle`] if it succeeds without returning a device.
    pub fn open(api: AudioClientApiHandle) -> Result<Self> {
        let mut device: *mut amlhal_sys::AudioHwDevice = std::ptr::null_mut();
        Error::from_status(
            unsafe { (api.load_interface)(&mut device) },
            "audio_hw_load_interface",
        )?;
        if device.is_null() {
            return Err(Error::NullHandle);
        }
        debug!("Loaded audio HAL device");
        Ok(Self {
            context: Arc::new(DeviceContext { api, device }),
        })
    }
}

impl AudioHwDevice for HalDevice {
    fn open_output_stream(&self, config: &StreamConfig) -> Result<Arc<dyn OutputStream>> {
        let open = self
            .context
            .table()
            .open_output_stream
            .ok_or(Error::Unsupported("open_output_stream"))?;

        let mut raw_config = config.to_raw();
        let mut stream: *mut AudioStreamOut = std::ptr::null_mut();
        Error::from_status(
            unsafe {
                open(
                    self.context.device,
                    0,
                    config.device.as_raw(),
                    config.flags.as_raw(),
                    &mut raw_config,
                    &mut stream,
                    std::ptr::null(),
                )
            },
            "open_output_stream",
        )?;
        if stream.is_null() {
            return Err(Error::NullHandle);
        }

        debug!(
            "Opened output stream: format {:?}, rate {}, mask {:?}, {:?} on {:?}",
            config.format, config.sample_rate, config.channel_mask, config.flags, config.device
        );
        Ok(Arc::new(HalOutputStream::new(self.context.clone(), stream)))
    }

    fn create_patch(&self, source: &PortConfig, sink: &PortConfig) -> Result<PatchHandle> {
        let create = self
            .context
            .table()
            .create_audio_patch
            .ok_or(Error::Unsupported("create_audio_patch"))?;

        let source = source.to_raw();
        let sink = sink.to_raw();
        let mut handle = amlhal_sys::AUDIO_PATCH_HANDLE_NONE;
        Error::from_status(
            unsafe { create(self.context.device, 1, &source, 1, &sink, &mut handle) },
            "create_audio_patch",
        )?;
        Ok(PatchHandle(handle))
    }

    fn release_patch(&self, patch: PatchHandle) -> Result<()> {
        let release = self
            .context
            .table()
            .release_audio_patch
            .ok_or(Error::Unsupported("release_audio_patch"))?;
        Error::from_status(
            unsafe { release(self.context.device, patch.0) },
            "release_audio_patch",
        )
    }

    fn set_port_gain(&self, port_id: i32, gain_mb: i32) -> Result<()> {
        let set_config = self
            .context
            .table()
            .set_audio_port_config
            .ok_or(Error::Unsupported("set_audio_port_config"))?;
        let config = PortConfig::raw_gain(port_id, gain_mb);
        Error::from_status(
            unsafe { set_config(self.context.device, &config) },
            "set_audio_port_config",
        )
    }

    fn set_master_mute(&self, mute: bool) -> Result<()> {
        let set_mute = self
            .context
            .table()
            .set_master_mute
            .ok_or(Error::Unsupported("set_master_mute"))?;
        Error::from_status(
            unsafe { set_mute(self.context.device, mute) },
            "set_master_mute",
        )
    }
}
