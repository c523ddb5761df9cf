// SPDX-FileCopyrightText: 2025 2025 Contributors to the gst-amlhal project.
// SPDX-License-Identifier: Apache-2.0

//! AC3 / E-AC3 sync frame header parsing.
//!
//! Only the first five bytes of a frame are looked at: enough to learn the
//! encoded frame size and the number of PCM samples it decodes to.

use super::HeaderError;

/// Compressed formats the parser understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressedFormat {
    Ac3,
    EAc3,
}

/// Per-session facts learned from the first compressed frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameMeta {
    /// Bytes per encoded frame. Nonzero once `parsed` is set.
    pub encoded_frame_size: u32,
    pub samples_per_frame: u32,
    pub parsed: bool,
    /// Sample rate signalled by a reduced-rate E-AC3 stream.
    pub sample_rate_override: Option<u32>,
}

const SYNC_WORD: [u8; 2] = [0x0b, 0x77];

/// Samples per AC3 frame (6 blocks of 256).
const AC3_SAMPLES_PER_FRAME: u32 = 1536;

/// AC3 frame sizes in 16-bit words, ATSC A/52 table 5.13.
///
/// Rows are `frmsizecod`, columns are 32 kHz, 44.1 kHz, 48 kHz and the
/// half-rate 48 kHz variant. Index with `[frmsizecod][2 - fscod]`.
const AC3_FRAME_WORDS: [[u16; 4]; 38] = [
    [96, 69, 64, 32],
    [96, 70, 64, 32],
    [120, 87, 80, 40],
    [120, 88, 80, 40],
    [144, 104, 96, 48],
    [144, 105, 96, 48],
    [168, 121, 112, 56],
    [168, 122, 112, 56],
    [192, 139, 128, 64],
    [192, 140, 128, 64],
    [240, 174, 160, 80],
    [240, 175, 160, 80],
    [288, 208, 192, 96],
    [288, 209, 192, 96],
    [336, 243, 224, 112],
    [336, 244, 224, 112],
    [384, 278, 256, 128],
    [384, 279, 256, 128],
    [480, 348, 320, 160],
    [480, 349, 320, 160],
    [576, 417, 384, 192],
    [576, 418, 384, 192],
    [672, 487, 448, 224],
    [672, 488, 448, 224],
    [768, 557, 512, 256],
    [768, 558, 512, 256],
    [960, 696, 640, 320],
    [960, 697, 640, 320],
    [1152, 835, 768, 384],
    [1152, 836, 768, 384],
    [1344, 975, 896, 448],
    [1344, 976, 896, 448],
    [1536, 1114, 1024, 512],
    [1536, 1115, 1024, 512],
    [1728, 1253, 1152, 576],
    [1728, 1254, 1152, 576],
    [1920, 1393, 1280, 640],
    [1920, 1394, 1280, 640],
];

/// Reduced sample rates selected by E-AC3 `fscod2`.
const EAC3_REDUCED_RATES: [u32; 3] = [24000, 22050, 16000];

/// Samples per E-AC3 frame indexed by `numblkscod`.
const EAC3_SAMPLES_PER_FRAME: [u32; 4] = [256, 256 * 2, 256 * 3, 256 * 6];

/// Decodes the frame header at the start of `data`.
///
/// # Errors
///
/// Checks run in order: length, sync word, then the rate and size codes.
pub fn parse(format: CompressedFormat, data: &[u8]) -> Result<FrameMeta, HeaderError> {
    if data.len() < 5 {
        return Err(HeaderError::InsufficientData(data.len()));
    }
    if data[..2] != SYNC_WORD {
        return Err(HeaderError::SyncMismatch);
    }

    match format {
        CompressedFormat::Ac3 => parse_ac3(data),
        CompressedFormat::EAc3 => parse_eac3(data),
    }
}

fn parse_ac3(data: &[u8]) -> Result<FrameMeta, HeaderError> {
    let fscod = (data[4] >> 6) as usize;
    let frmsizecod = (data[4] & 0x3f) as usize;
    if fscod > 2 || frmsizecod >= AC3_FRAME_WORDS.len() {
        return Err(HeaderError::UnsupportedRate);
    }

    Ok(FrameMeta {
        encoded_frame_size: AC3_FRAME_WORDS[frmsizecod][2 - fscod] as u32 * 2,
        samples_per_frame: AC3_SAMPLES_PER_FRAME,
        parsed: true,
        sample_rate_override: None,
    })
}

fn parse_eac3(data: &[u8]) -> Result<FrameMeta, HeaderError> {
    let fscod = data[4] >> 6;
    // 11-bit frame size in words, minus one.
    let frmsizecod = data[3] as u32 + (((data[2] & 0x07) as u32) << 8) + 1;
    let code = ((data[4] >> 4) & 0x03) as usize;

    let (samples_per_frame, sample_rate_override) = if fscod == 3 {
        let rate = EAC3_REDUCED_RATES
            .get(code)
            .copied()
            .ok_or(HeaderError::UnsupportedRate)?;
        (256 * 6, Some(rate))
    } else {
        (EAC3_SAMPLES_PER_FRAME[code], None)
    };

    Ok(FrameMeta {
        encoded_frame_size: frmsizecod * 2,
        samples_per_frame,
        parsed: true,
        sample_rate_override,
    })
}
