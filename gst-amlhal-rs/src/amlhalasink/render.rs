// SPDX-FileCopyrightText: 2025 2025 Contributors to the gst-amlhal project.
// SPDX-License-Identifier: Apache-2.0

//! Buffer rendering for the amlhalasink element.
//!
//! Incoming buffers are queued in the state's `UniqueAdapter` and committed
//! to the ring buffer in chunks the commit engine can take whole:
//!
//! - raw PCM: whole sample frames, capped for mono so the expanded copy fits
//!   the extend buffer
//! - compressed, header known: whole encoded frames
//! - compressed, header not yet parsed: everything queued
//!
//! Bytes the ring buffer does not consume (misaligned tail, playback not
//! allowed to start yet) stay queued for the next buffer.

use gst::subclass::prelude::*;
use gstreamer as gst;

use crate::amlhalasink::imp::{AmlHalAsink, CAT};
use crate::amlhalasink::state::State;
use crate::ringbuffer::{EXTEND_BUFFER_SIZE, RingBufferError, SampleFormat, StreamSpec};

pub(crate) fn render(
    imp: &AmlHalAsink,
    state: &mut State,
    buffer: &gst::Buffer,
) -> Result<gst::FlowSuccess, gst::FlowError> {
    let Some(spec) = state.ring.spec().copied() else {
        gst::element_imp_error!(
            imp,
            gst::CoreError::Negotiation,
            ["Received a buffer before caps"]
        );
        return Err(gst::FlowError::NotNegotiated);
    };

    state.adapter.push(buffer.clone());
    let bpf = spec.bytes_per_frame();

    loop {
        let chunk = chunk_size(state, &spec);
        if chunk == 0 {
            break;
        }

        let samples = (chunk / bpf) as i64;
        let result = {
            let map = state.adapter.map(chunk).map_err(|_| {
                gst::error!(CAT, imp = imp, "Failed to map {} queued bytes", chunk);
                gst::FlowError::Error
            })?;
            state.ring.commit(&map, samples, samples)
        };

        match result {
            Ok(0) => {
                gst::trace!(CAT, imp = imp, "{} bytes kept until playback starts", chunk);
                break;
            }
            Ok(consumed) => state.adapter.flush(consumed * bpf),
            Err(RingBufferError::FrameAlignment { .. }) => {
                if !state.ring.frame_meta().parsed {
                    break;
                }
                // Frame size known now; the next chunk is whole frames.
                continue;
            }
            Err(err) if err.is_fatal() => {
                gst::element_imp_error!(imp, gst::StreamError::Failed, ["{}", err]);
                return Err(gst::FlowError::Error);
            }
            Err(RingBufferError::DeviceFault(err)) => {
                gst::warning!(CAT, imp = imp, "write failed, dropping {} bytes: {}", chunk, err);
                state.adapter.flush(chunk);
            }
            Err(err) => {
                gst::error!(CAT, imp = imp, "commit failed: {}", err);
                return Err(gst::FlowError::Error);
            }
        }
    }

    Ok(gst::FlowSuccess::Ok)
}

/// Returns how many queued bytes the next commit should cover.
fn chunk_size(state: &State, spec: &StreamSpec) -> usize {
    let available = state.adapter.available();
    match spec.format {
        SampleFormat::Pcm16 => {
            let bpf = spec.bytes_per_frame();
            let mut chunk = available - available % bpf;
            if spec.channels == 1 {
                chunk = chunk.min(EXTEND_BUFFER_SIZE / 2);
            }
            chunk
        }
        SampleFormat::Ac3 | SampleFormat::EAc3 => {
            let meta = state.ring.frame_meta();
            if meta.parsed {
                let frame_size = meta.encoded_frame_size as usize;
                available - available % frame_size
            } else {
                available
            }
        }
    }
}
