// SPDX-FileCopyrightText: 2025 2025 Contributors to the gst-amlhal project.
// SPDX-License-Identifier: Apache-2.0

//! Plays a raw S16LE file through the audio HAL.
//!
//! ```text
//! cargo run --example hal_play -- --input tone.raw --rate 48000 --port hdmi
//! ```

use std::{fs, path::PathBuf};

use amlhal::{
    AudioFormat, AudioHwDevice, ChannelMask, HalDevice, OutputDevice, OutputFlags, StreamConfig,
    config::default_library_path, load_api,
};
use clap::{Parser, ValueEnum};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Port {
    Speaker,
    Hdmi,
    HdmiArc,
    Spdif,
}

impl From<Port> for OutputDevice {
    fn from(port: Port) -> Self {
        match port {
            Port::Speaker => OutputDevice::Speaker,
            Port::Hdmi => OutputDevice::Hdmi,
            Port::HdmiArc => OutputDevice::HdmiArc,
            Port::Spdif => OutputDevice::Spdif,
        }
    }
}

#[derive(Debug, Parser)]
#[command(version, about = "Write raw 16-bit PCM to the Amlogic audio HAL")]
struct Opts {
    /// Interleaved S16LE input file.
    #[arg(long)]
    input: PathBuf,

    #[arg(long, default_value_t = 48000)]
    rate: u32,

    /// 2, 6 or 8.
    #[arg(long, default_value_t = 2)]
    channels: u32,

    #[arg(long, value_enum, default_value_t = Port::Speaker)]
    port: Port,

    /// Path of the audio client library.
    #[arg(long)]
    library: Option<PathBuf>,

    /// Route through the system mixer instead of a direct output.
    #[arg(long)]
    primary: bool,

    /// Bytes handed to each write call.
    #[arg(long, default_value_t = 4096)]
    chunk: usize,
}

fn main() -> Result<(), amlhal::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(tracing::level_filters::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let opts = Opts::parse();
    let channel_mask = ChannelMask::from_channels(opts.channels).ok_or_else(|| {
        amlhal::Error::Other(format!("unsupported channel count {}", opts.channels))
    })?;
    let data = fs::read(&opts.input).map_err(|e| {
        amlhal::Error::Other(format!("reading {}: {}", opts.input.display(), e))
    })?;

    let api = load_api(opts.library.unwrap_or_else(default_library_path))?;
    let device = HalDevice::open(api)?;
    let stream = device.open_output_stream(&StreamConfig {
        sample_rate: opts.rate,
        channel_mask,
        format: AudioFormat::Pcm16Bit,
        flags: if opts.primary {
            OutputFlags::Primary
        } else {
            OutputFlags::Direct
        },
        device: opts.port.into(),
    })?;

    let mut partial_writes = 0usize;
    for chunk in data.chunks(opts.chunk.max(1)) {
        let mut offset = 0;
        while offset < chunk.len() {
            let written = stream.write(&chunk[offset..])?;
            if written < chunk.len() - offset {
                partial_writes += 1;
            }
            offset += written;
        }
    }

    if partial_writes > 0 {
        warn!("{} partial writes", partial_writes);
    }
    info!(
        "Wrote {} bytes, presentation position {:?}",
        data.len(),
        stream.presentation_position()?
    );
    Ok(())
}
