// SPDX-FileCopyrightText: 2025 2025 Contributors to the gst-amlhal project.
// SPDX-License-Identifier: Apache-2.0

//! # amlhal - Amlogic audio HAL
//!
//! Safe Rust access to the Amlogic audio server through its client library
//! (`libaudio_client.so`), which exposes an Android-style `audio_hw_device`.
//!
//! ## Key Concepts
//!
//! - **Client library**: loaded at runtime with [`load_api`]; nothing links
//!   against it at build time
//! - **Device** ([`HalDevice`]): the loaded `audio_hw_device`, owner of
//!   patches, port gain and master mute
//! - **Output stream** ([`OutputStream`]): one PCM or bitstream output opened
//!   on the device, written with possibly-partial writes
//!
//! ## Architecture
//!
//! ```text
//! load_api ──► AudioClientApi
//!                   │
//!                   └─► HalDevice ──► open_output_stream ──► HalOutputStream
//!                       (AudioHwDevice)                      (OutputStream)
//! ```
//!
//! The device and stream surfaces are traits so the sink's ring buffer can be
//! driven by mock devices in tests.
//!
//! ## Example
//!
//! ```no_run
//! use amlhal::{
//!     AudioFormat, AudioHwDevice, ChannelMask, HalDevice, OutputDevice, OutputFlags,
//!     StreamConfig, config::default_library_path, load_api,
//! };
//!
//! # fn main() -> Result<(), amlhal::Error> {
//! let device = HalDevice::open(load_api(default_library_path())?)?;
//! let stream = device.open_output_stream(&StreamConfig {
//!     sample_rate: 48000,
//!     channel_mask: ChannelMask::Stereo,
//!     format: AudioFormat::Pcm16Bit,
//!     flags: OutputFlags::Direct,
//!     device: OutputDevice::Speaker,
//! })?;
//!
//! let silence = [0u8; 4096];
//! let mut offset = 0;
//! while offset < silence.len() {
//!     offset += stream.write(&silence[offset..])?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Thread Safety
//!
//! [`HalDevice`] and [`HalOutputStream`] are `Send + Sync`: the client
//! library forwards every call to the audio server, so a writer thread and a
//! clock thread may use the same stream.

mod api;
mod device;
mod error;
mod stream;
mod types;

pub mod config;

pub use api::{AudioClientApi, AudioClientApiHandle, load_api};
pub use device::{AudioHwDevice, HalDevice};
pub use error::{Error, Result};
pub use stream::{HalOutputStream, OutputStream};
pub use types::*;
