// SPDX-FileCopyrightText: 2025 2025 Contributors to the gst-amlhal project.
// SPDX-License-Identifier: Apache-2.0

//! # amlhal-sys: Raw FFI declarations for the Amlogic audio client library
//!
//! This crate declares the C ABI exposed by the vendor audio client
//! (`libaudio_client.so`): the Android-style `audio_hw_device` function
//! table, the `audio_stream_out` table, and the plain configuration structs
//! passed through them.
//!
//! ## Usage
//!
//! **Most users should NOT use this crate directly.** Use the safe [`amlhal`]
//! wrapper instead, which provides:
//! - RAII ownership of device and stream handles
//! - Rust-idiomatic error handling with `Result`
//! - Typed formats, channel masks, output flags and devices
//!
//! ## ABI
//!
//! The layouts follow the `hardware/audio.h` revision shipped with the
//! Amlogic Linux audio server (the one with `get_microphones` in the device
//! table and no `flags` member in `audio_port_config`). Entries of the
//! function tables that nothing in this workspace calls are declared as
//! opaque pointers ([`UnusedFn`]) so only their size matters.
//!
//! The library itself is not linked; [`amlhal`] resolves
//! [`AUDIO_HW_LOAD_INTERFACE_SYMBOL`] and [`AUDIO_HW_UNLOAD_INTERFACE_SYMBOL`]
//! at runtime.
//!
//! [`amlhal`]: https://docs.rs/amlhal

#![allow(non_upper_case_globals)]
#![allow(non_camel_case_types)]
#![allow(clippy::missing_safety_doc)]

use std::os::raw::{c_char, c_int, c_long, c_uint, c_void};

pub type audio_format_t = u32;
pub type audio_channel_mask_t = u32;
pub type audio_devices_t = u32;
pub type audio_output_flags_t = u32;
pub type audio_io_handle_t = c_int;
pub type audio_patch_handle_t = c_int;
pub type audio_port_handle_t = c_int;
pub type audio_module_handle_t = c_int;
pub type audio_port_role_t = c_int;
pub type audio_port_type_t = c_int;
pub type audio_gain_mode_t = u32;

/// Placeholder for function-table slots that are never called.
pub type UnusedFn = Option<unsafe extern "C" fn()>;

pub const AUDIO_FORMAT_PCM_16_BIT: audio_format_t = 0x1;
pub const AUDIO_FORMAT_AC3: audio_format_t = 0x0900_0000;
pub const AUDIO_FORMAT_E_AC3: audio_format_t = 0x0A00_0000;

pub const AUDIO_CHANNEL_OUT_STEREO: audio_channel_mask_t = 0x3;
pub const AUDIO_CHANNEL_OUT_5POINT1: audio_channel_mask_t = 0x3F;
pub const AUDIO_CHANNEL_OUT_7POINT1: audio_channel_mask_t = 0x63F;

pub const AUDIO_OUTPUT_FLAG_DIRECT: audio_output_flags_t = 0x1;
pub const AUDIO_OUTPUT_FLAG_PRIMARY: audio_output_flags_t = 0x2;

pub const AUDIO_DEVICE_OUT_SPEAKER: audio_devices_t = 0x2;
pub const AUDIO_DEVICE_OUT_AUX_DIGITAL: audio_devices_t = 0x400;
pub const AUDIO_DEVICE_OUT_HDMI: audio_devices_t = AUDIO_DEVICE_OUT_AUX_DIGITAL;
pub const AUDIO_DEVICE_OUT_HDMI_ARC: audio_devices_t = 0x40000;
pub const AUDIO_DEVICE_OUT_SPDIF: audio_devices_t = 0x80000;

pub const AUDIO_PORT_ROLE_NONE: audio_port_role_t = 0;
pub const AUDIO_PORT_ROLE_SOURCE: audio_port_role_t = 1;
pub const AUDIO_PORT_ROLE_SINK: audio_port_role_t = 2;

pub const AUDIO_PORT_TYPE_NONE: audio_port_type_t = 0;
pub const AUDIO_PORT_TYPE_DEVICE: audio_port_type_t = 1;
pub const AUDIO_PORT_TYPE_MIX: audio_port_type_t = 2;

pub const AUDIO_PORT_CONFIG_SAMPLE_RATE: c_uint = 0x1;
pub const AUDIO_PORT_CONFIG_CHANNEL_MASK: c_uint = 0x2;
pub const AUDIO_PORT_CONFIG_FORMAT: c_uint = 0x4;
pub const AUDIO_PORT_CONFIG_GAIN: c_uint = 0x8;

pub const AUDIO_PATCH_HANDLE_NONE: audio_patch_handle_t = 0;

pub const AUDIO_GAIN_CONFIG_VALUES: usize = 32;
pub const AUDIO_DEVICE_MAX_ADDRESS_LEN: usize = 32;

/// Symbol name of `int audio_hw_load_interface(audio_hw_device_t **dev)`.
pub const AUDIO_HW_LOAD_INTERFACE_SYMBOL: &[u8] = b"audio_hw_load_interface\0";

/// Symbol name of `void audio_hw_unload_interface(audio_hw_device_t *dev)`.
pub const AUDIO_HW_UNLOAD_INTERFACE_SYMBOL: &[u8] = b"audio_hw_unload_interface\0";

pub type AudioHwLoadInterfaceFn = unsafe extern "C" fn(dev: *mut *mut AudioHwDevice) -> c_int;
pub type AudioHwUnloadInterfaceFn = unsafe extern "C" fn(dev: *mut AudioHwDevice);

#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Timespec {
    pub tv_sec: c_long,
    pub tv_nsec: c_long,
}

#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
pub struct AudioOffloadInfo {
    pub version: u16,
    pub size: u16,
    pub sample_rate: u32,
    pub channel_mask: audio_channel_mask_t,
    pub format: audio_format_t,
    pub stream_type: c_int,
    pub bit_rate: u32,
    pub duration_us: i64,
    pub has_video: bool,
    pub is_streaming: bool,
    pub bit_width: u32,
    pub offload_buffer_size: u32,
    pub usage: c_int,
}

#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub channel_mask: audio_channel_mask_t,
    pub format: audio_format_t,
    pub offload_info: AudioOffloadInfo,
    pub frame_count: usize,
}

#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
pub struct AudioGainConfig {
    pub index: c_int,
    pub mode: audio_gain_mode_t,
    pub channel_mask: audio_channel_mask_t,
    pub values: [c_int; AUDIO_GAIN_CONFIG_VALUES],
    pub ramp_duration_ms: c_uint,
}

/// Device flavour of the `audio_port_config.ext` union.
///
/// It is the largest member of the union, so using it as the whole union
/// keeps the size right for mix and session ports as well.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
pub struct AudioPortConfigDeviceExt {
    pub hw_module: audio_module_handle_t,
    pub type_: audio_devices_t,
    pub address: [c_char; AUDIO_DEVICE_MAX_ADDRESS_LEN],
}

#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
pub struct AudioPortConfig {
    pub id: audio_port_handle_t,
    pub role: audio_port_role_t,
    pub type_: audio_port_type_t,
    pub config_mask: c_uint,
    pub sample_rate: c_uint,
    pub channel_mask: audio_channel_mask_t,
    pub format: audio_format_t,
    pub gain: AudioGainConfig,
    pub ext: AudioPortConfigDeviceExt,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct HwDevice {
    pub tag: u32,
    pub version: u32,
    pub module: *mut c_void,
    pub reserved: [usize; 12],
    pub close: Option<unsafe extern "C" fn(device: *mut HwDevice) -> c_int>,
}

/// `struct audio_stream`, the common head of every stream table.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct AudioStream {
    pub get_sample_rate: Option<unsafe extern "C" fn(stream: *const AudioStream) -> u32>,
    pub set_sample_rate: UnusedFn,
    pub get_buffer_size: Option<unsafe extern "C" fn(stream: *const AudioStream) -> usize>,
    pub get_channels: UnusedFn,
    pub get_format: UnusedFn,
    pub set_format: UnusedFn,
    pub standby: Option<unsafe extern "C" fn(stream: *mut AudioStream) -> c_int>,
    pub dump: UnusedFn,
    pub get_device: UnusedFn,
    pub set_device: UnusedFn,
    pub set_parameters: UnusedFn,
    pub get_parameters: UnusedFn,
    pub add_audio_effect: UnusedFn,
    pub remove_audio_effect: UnusedFn,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct AudioStreamOut {
    pub common: AudioStream,
    pub get_latency: Option<unsafe extern "C" fn(stream: *const AudioStreamOut) -> u32>,
    pub set_volume:
        Option<unsafe extern "C" fn(stream: *mut AudioStreamOut, left: f32, right: f32) -> c_int>,
    pub write: Option<
        unsafe extern "C" fn(stream: *mut AudioStreamOut, buffer: *const c_void, bytes: usize) -> isize,
    >,
    pub get_render_position: UnusedFn,
    pub get_next_write_timestamp: UnusedFn,
    pub set_callback: UnusedFn,
    pub pause: Option<unsafe extern "C" fn(stream: *mut AudioStreamOut) -> c_int>,
    pub resume: Option<unsafe extern "C" fn(stream: *mut AudioStreamOut) -> c_int>,
    pub drain: UnusedFn,
    pub flush: Option<unsafe extern "C" fn(stream: *mut AudioStreamOut) -> c_int>,
    pub get_presentation_position: Option<
        unsafe extern "C" fn(
            stream: *const AudioStreamOut,
            frames: *mut u64,
            timestamp: *mut Timespec,
        ) -> c_int,
    >,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct AudioHwDevice {
    pub common: HwDevice,
    pub get_supported_devices: UnusedFn,
    pub init_check: Option<unsafe extern "C" fn(dev: *const AudioHwDevice) -> c_int>,
    pub set_voice_volume: UnusedFn,
    pub set_master_volume: Option<unsafe extern "C" fn(dev: *mut AudioHwDevice, volume: f32) -> c_int>,
    pub get_master_volume: UnusedFn,
    pub set_mode: UnusedFn,
    pub set_mic_mute: UnusedFn,
    pub get_mic_mute: UnusedFn,
    pub set_parameters: UnusedFn,
    pub get_parameters: UnusedFn,
    pub get_input_buffer_size: UnusedFn,
    pub open_output_stream: Option<
        unsafe extern "C" fn(
            dev: *mut AudioHwDevice,
            handle: audio_io_handle_t,
            devices: audio_devices_t,
            flags: audio_output_flags_t,
            config: *mut AudioConfig,
            stream_out: *mut *mut AudioStreamOut,
            address: *const c_char,
        ) -> c_int,
    >,
    pub close_output_stream:
        Option<unsafe extern "C" fn(dev: *mut AudioHwDevice, stream_out: *mut AudioStreamOut)>,
    pub open_input_stream: UnusedFn,
    pub close_input_stream: UnusedFn,
    pub get_microphones: UnusedFn,
    pub dump: UnusedFn,
    pub set_master_mute: Option<unsafe extern "C" fn(dev: *mut AudioHwDevice, mute: bool) -> c_int>,
    pub get_master_mute:
        Option<unsafe extern "C" fn(dev: *mut AudioHwDevice, mute: *mut bool) -> c_int>,
    pub create_audio_patch: Option<
        unsafe extern "C" fn(
            dev: *mut AudioHwDevice,
            num_sources: c_uint,
            sources: *const AudioPortConfig,
            num_sinks: c_uint,
            sinks: *const AudioPortConfig,
            handle: *mut audio_patch_handle_t,
        ) -> c_int,
    >,
    pub release_audio_patch:
        Option<unsafe extern "C" fn(dev: *mut AudioHwDevice, handle: audio_patch_handle_t) -> c_int>,
    pub get_audio_port: UnusedFn,
    pub set_audio_port_config: Option<
        unsafe extern "C" fn(dev: *mut AudioHwDevice, config: *const AudioPortConfig) -> c_int,
    >,
}
