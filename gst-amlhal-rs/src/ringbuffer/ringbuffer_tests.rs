// SPDX-FileCopyrightText: 2025 2025 Contributors to the gst-amlhal project.
// SPDX-License-Identifier: Apache-2.0

//! Ring buffer tests against an in-memory HAL device.

use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    thread,
    time::Duration,
};

use amlhal::{
    AudioHwDevice, ChannelMask, OutputDevice, OutputFlags, OutputStream, PatchHandle, PortConfig,
    PresentationPosition, StreamConfig,
};
use gstreamer as gst;
use tracing_test::traced_test;

use super::*;

/// What the next `write` call does.
#[derive(Debug, Clone, Copy)]
enum MockWrite {
    /// Accept at most this many bytes.
    Accept(usize),
    /// Fail with a HAL status code.
    Fail(i32),
}

#[derive(Default)]
struct MockStream {
    script: Mutex<VecDeque<MockWrite>>,
    /// Bytes of every write call, in order, as accepted by the device.
    writes: Mutex<Vec<Vec<u8>>>,
    calls: Mutex<Vec<&'static str>>,
    frames: AtomicU64,
    position_fails: AtomicBool,
}

impl MockStream {
    fn script(&self, steps: &[MockWrite]) {
        self.script.lock().unwrap().extend(steps.iter().copied());
    }

    fn written(&self) -> Vec<u8> {
        self.writes.lock().unwrap().concat()
    }

    fn write_sizes(&self) -> Vec<usize> {
        self.writes.lock().unwrap().iter().map(Vec::len).collect()
    }

    fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }
}

impl OutputStream for MockStream {
    fn write(&self, data: &[u8]) -> amlhal::Result<usize> {
        let accepted = match self.script.lock().unwrap().pop_front() {
            Some(MockWrite::Accept(n)) => n.min(data.len()),
            Some(MockWrite::Fail(code)) => return Err(amlhal::Error::from_code(code, "write")),
            None => data.len(),
        };
        self.writes.lock().unwrap().push(data[..accepted].to_vec());
        Ok(accepted)
    }

    fn presentation_position(&self) -> amlhal::Result<PresentationPosition> {
        if self.position_fails.load(Ordering::SeqCst) {
            return Err(amlhal::Error::Status(-5));
        }
        Ok(PresentationPosition {
            frames: self.frames.load(Ordering::SeqCst),
            timestamp: Duration::ZERO,
        })
    }

    fn pause(&self) -> amlhal::Result<()> {
        self.calls.lock().unwrap().push("pause");
        Ok(())
    }

    fn flush(&self) -> amlhal::Result<()> {
        self.calls.lock().unwrap().push("flush");
        Ok(())
    }
}

#[derive(Default)]
struct MockDevice {
    stream: Arc<MockStream>,
    opened: Mutex<Vec<StreamConfig>>,
}

impl AudioHwDevice for MockDevice {
    fn open_output_stream(&self, config: &StreamConfig) -> amlhal::Result<Arc<dyn OutputStream>> {
        self.opened.lock().unwrap().push(*config);
        Ok(self.stream.clone())
    }

    fn create_patch(&self, _source: &PortConfig, _sink: &PortConfig) -> amlhal::Result<PatchHandle> {
        Ok(PatchHandle(1))
    }

    fn release_patch(&self, _patch: PatchHandle) -> amlhal::Result<()> {
        Ok(())
    }

    fn set_port_gain(&self, _port_id: i32, _gain_mb: i32) -> amlhal::Result<()> {
        Ok(())
    }

    fn set_master_mute(&self, _mute: bool) -> amlhal::Result<()> {
        Ok(())
    }
}

fn spec(format: SampleFormat, sample_rate: u32, channels: u32) -> StreamSpec {
    StreamSpec {
        format,
        sample_rate,
        channels,
    }
}

/// Acquires a session on a fresh mock device and allows it to start.
fn started(spec: StreamSpec) -> (RingBuffer, Arc<MockDevice>) {
    let device = Arc::new(MockDevice::default());
    let mut ring = RingBuffer::new();
    ring.acquire(device.as_ref(), spec, &OutputConfig::default())
        .expect("acquire");
    ring.set_may_start(true);
    (ring, device)
}

/// `count` back-to-back AC3 frames of `frame_size` bytes with the given codes.
fn ac3_frames(fscod: u8, frmsizecod: u8, frame_size: usize, count: usize) -> Vec<u8> {
    let mut frame = vec![0u8; frame_size];
    frame[..5].copy_from_slice(&[0x0b, 0x77, 0x12, 0x34, (fscod << 6) | frmsizecod]);
    frame.repeat(count)
}

fn commit_all(ring: &mut RingBuffer, data: &[u8]) -> Result<usize, RingBufferError> {
    let samples = (data.len() / ring.spec().expect("acquired").bytes_per_frame()) as i64;
    ring.commit(data, samples, samples)
}

#[test]
fn ac3_48k_buffer_is_written_frame_by_frame() {
    let (mut ring, device) = started(spec(SampleFormat::Ac3, 48000, 2));
    let data = ac3_frames(0, 0, 128, 12);

    assert_eq!(commit_all(&mut ring, &data).unwrap(), 1536);
    assert_eq!(ring.frame_meta().encoded_frame_size, 128);
    assert_eq!(ring.cursor().frames_sent, 12);
    assert_eq!(ring.cursor().samples_committed, 12 * 1536);
    assert_eq!(device.stream.write_sizes(), vec![128; 12]);
    assert_eq!(device.stream.written(), data);
}

#[test]
fn ac3_32k_buffer_is_eight_frames() {
    let (mut ring, device) = started(spec(SampleFormat::Ac3, 32000, 2));
    let data = ac3_frames(2, 0, 192, 8);

    assert_eq!(commit_all(&mut ring, &data).unwrap(), 1536);
    assert_eq!(ring.cursor().frames_sent, 8);
    assert_eq!(ring.cursor().samples_committed, 8 * 1536);
    assert_eq!(device.stream.write_sizes(), vec![192; 8]);
}

#[test]
fn misaligned_compressed_payload_is_not_consumed() {
    let (mut ring, device) = started(spec(SampleFormat::Ac3, 48000, 2));
    let mut data = ac3_frames(0, 0, 128, 2);
    data.truncate(200);

    match commit_all(&mut ring, &data) {
        Err(RingBufferError::FrameAlignment { len, frame_size }) => {
            assert_eq!(len, 200);
            assert_eq!(frame_size, 128);
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(ring.cursor().samples_committed, 0);
    assert!(device.stream.written().is_empty());

    // Header info stays cached, the retry with a whole frame goes through.
    assert_eq!(commit_all(&mut ring, &data[..128]).unwrap(), 128);
    assert_eq!(ring.cursor().samples_committed, 1536);
}

#[traced_test]
#[test]
fn undecodable_first_chunk_is_dropped_as_consumed() {
    let (mut ring, device) = started(spec(SampleFormat::EAc3, 48000, 2));
    let garbage = vec![0x55u8; 300];

    assert_eq!(commit_all(&mut ring, &garbage).unwrap(), 300);
    assert!(!ring.frame_meta().parsed);
    assert!(device.stream.written().is_empty());
    assert_eq!(ring.cursor().samples_committed, 0);
    assert!(logs_contain("parse header info fails"));
    assert!(logs_contain("discard 300 bytes"));
}

#[test]
fn frame_meta_is_parsed_once_per_session() {
    let (mut ring, _device) = started(spec(SampleFormat::Ac3, 48000, 2));
    commit_all(&mut ring, &ac3_frames(0, 0, 128, 1)).unwrap();

    // A later header announcing a larger frame does not change the size.
    let other = ac3_frames(0, 30, 128, 2);
    assert_eq!(commit_all(&mut ring, &other).unwrap(), 256);
    assert_eq!(ring.frame_meta().encoded_frame_size, 128);
    assert_eq!(ring.cursor().frames_sent, 3);

    // Re-acquiring starts from scratch.
    ring.release();
    let device = MockDevice::default();
    ring.acquire(&device, spec(SampleFormat::Ac3, 48000, 2), &OutputConfig::default())
        .unwrap();
    assert!(!ring.frame_meta().parsed);
    assert_eq!(ring.cursor().samples_committed, 0);
}

#[test]
fn compressed_partial_write_reissues_the_rest_of_the_frame() {
    let (mut ring, device) = started(spec(SampleFormat::Ac3, 48000, 2));
    device
        .stream
        .script(&[MockWrite::Accept(64), MockWrite::Accept(0), MockWrite::Accept(64)]);
    let data = ac3_frames(0, 0, 128, 2);

    assert_eq!(commit_all(&mut ring, &data).unwrap(), 256);
    assert_eq!(device.stream.write_sizes(), vec![64, 0, 64, 128]);
    assert_eq!(device.stream.written(), data);
    assert_eq!(ring.cursor().frames_sent, 2);
    assert_eq!(ring.cursor().samples_committed, 2 * 1536);
}

#[test]
fn pcm_partial_writes_account_only_written_frames() {
    let (mut ring, device) = started(spec(SampleFormat::Pcm16, 48000, 2));
    // 3 bytes is less than one stereo frame, 7 more completes two frames.
    device.stream.script(&[
        MockWrite::Accept(3),
        MockWrite::Accept(7),
        MockWrite::Fail(-5),
    ]);
    let data: Vec<u8> = (0..40u8).collect();

    match commit_all(&mut ring, &data) {
        Err(RingBufferError::DeviceFault(amlhal::Error::Status(-5))) => {}
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(device.stream.write_sizes(), vec![3, 7]);
    assert_eq!(ring.cursor().samples_committed, 2);

    // Without a fault the remainder goes through in one call.
    assert_eq!(commit_all(&mut ring, &data).unwrap(), 10);
    assert_eq!(ring.cursor().samples_committed, 12);
    assert_eq!(&device.stream.written()[10..], &data[..]);
}

#[test]
fn mono_pcm_is_expanded_to_stereo() {
    let (mut ring, device) = started(spec(SampleFormat::Pcm16, 48000, 1));
    assert_eq!(
        device.opened.lock().unwrap()[0].channel_mask,
        ChannelMask::Stereo
    );
    let data: Vec<u8> = (0..64u8).collect();

    assert_eq!(commit_all(&mut ring, &data).unwrap(), 32);
    let written = device.stream.written();
    assert_eq!(written.len(), 2 * data.len());
    for (i, sample) in data.chunks_exact(2).enumerate() {
        assert_eq!(&written[4 * i..4 * i + 2], sample);
        assert_eq!(&written[4 * i + 2..4 * i + 4], sample);
    }
    assert_eq!(ring.cursor().samples_committed, 32);
}

#[test]
fn mono_expansion_overflow_is_fatal() {
    let (mut ring, device) = started(spec(SampleFormat::Pcm16, 48000, 1));
    let data = vec![0u8; EXTEND_BUFFER_SIZE];

    let err = commit_all(&mut ring, &data).unwrap_err();
    assert!(matches!(err, RingBufferError::BufferTooSmall { .. }));
    assert!(err.is_fatal());
    assert!(device.stream.written().is_empty());
}

#[traced_test]
#[test]
fn commit_waits_for_permission_to_start() {
    let (mut ring, device) = started(spec(SampleFormat::Pcm16, 48000, 2));
    ring.set_may_start(false);

    assert_eq!(commit_all(&mut ring, &[0u8; 16]).unwrap(), 0);
    assert_eq!(ring.state(), SessionState::Acquired);
    assert!(device.stream.written().is_empty());
    assert!(logs_contain("we can not start"));

    ring.set_may_start(true);
    assert_eq!(commit_all(&mut ring, &[0u8; 16]).unwrap(), 4);
    assert_eq!(ring.state(), SessionState::Started);
}

#[test]
fn pause_and_start_toggle_the_session() {
    let (mut ring, _device) = started(spec(SampleFormat::Pcm16, 48000, 2));
    ring.start().unwrap();
    ring.pause().unwrap();
    ring.pause().unwrap();
    assert!(ring.cursor().paused);
    assert_eq!(ring.state(), SessionState::Paused);

    // A commit while playback is allowed resumes the session.
    assert_eq!(commit_all(&mut ring, &[0u8; 8]).unwrap(), 2);
    assert!(!ring.cursor().paused);
    assert_eq!(ring.state(), SessionState::Started);
}

#[test]
fn paused_session_keeps_data_until_playback_is_allowed() {
    let (mut ring, device) = started(spec(SampleFormat::Pcm16, 48000, 2));
    ring.start().unwrap();
    ring.set_may_start(false);
    ring.pause().unwrap();

    assert_eq!(commit_all(&mut ring, &[0u8; 16]).unwrap(), 0);
    assert!(device.stream.written().is_empty());
    assert_eq!(ring.state(), SessionState::Paused);
    assert!(ring.cursor().paused);

    ring.set_may_start(true);
    assert_eq!(commit_all(&mut ring, &[0u8; 16]).unwrap(), 4);
    assert_eq!(device.stream.written().len(), 16);
    assert!(!ring.cursor().paused);
}

/// A started session whose cursor is marked paused drops what it is given.
/// `pause()` always leaves the Started state, so only this module can set
/// the cursor up this way.
#[traced_test]
#[test]
fn paused_cursor_drops_data() {
    let (mut ring, device) = started(spec(SampleFormat::Pcm16, 48000, 2));
    ring.start().unwrap();
    ring.cursor.paused = true;

    assert_eq!(commit_all(&mut ring, &[0u8; 16]).unwrap(), 4);
    assert!(device.stream.written().is_empty());
    assert_eq!(ring.cursor().samples_committed, 0);
    assert!(logs_contain("in pause state"));
}

#[test]
fn mismatched_sample_counts_are_rejected() {
    let (mut ring, device) = started(spec(SampleFormat::Pcm16, 48000, 2));
    assert!(matches!(
        ring.commit(&[0u8; 16], 4, 2),
        Err(RingBufferError::UnsupportedRateConversion {
            in_samples: 4,
            out_samples: 2
        })
    ));
    assert!(matches!(
        ring.commit(&[0u8; 16], -1, -1),
        Err(RingBufferError::UnsupportedRateConversion { .. })
    ));
    assert!(device.stream.written().is_empty());
}

#[test]
fn oversized_sample_count_is_a_short_payload() {
    let (mut ring, device) = started(spec(SampleFormat::Pcm16, 48000, 2));

    assert!(matches!(
        ring.commit(&[0u8; 8], i64::MAX, i64::MAX),
        Err(RingBufferError::ShortPayload {
            len: 8,
            needed: usize::MAX
        })
    ));
    assert!(device.stream.written().is_empty());
    assert_eq!(ring.cursor().samples_committed, 0);
}

#[test]
fn session_operations_need_a_stream() {
    let mut ring = RingBuffer::new();
    assert!(matches!(ring.start(), Err(RingBufferError::NotAcquired)));
    assert!(matches!(ring.pause(), Err(RingBufferError::NotAcquired)));
    assert!(matches!(ring.stop(), Err(RingBufferError::NotAcquired)));
    assert!(matches!(
        ring.commit(&[0u8; 4], 1, 1),
        Err(RingBufferError::NotAcquired)
    ));
    assert_eq!(ring.time_source().current_time(), None);
    // Clearing without a stream is a no-op.
    ring.clear();
    assert!(!ring.time_source().is_flushed());
}

#[test]
fn acquire_maps_channels_and_output() {
    let device = MockDevice::default();
    let mut ring = RingBuffer::new();
    let output = OutputConfig {
        direct_mode: true,
        device: OutputDevice::HdmiArc,
    };

    ring.acquire(&device, spec(SampleFormat::Pcm16, 48000, 6), &output)
        .unwrap();
    assert!(matches!(
        ring.acquire(&device, spec(SampleFormat::Pcm16, 48000, 6), &output),
        Err(RingBufferError::AlreadyAcquired)
    ));
    ring.release();
    ring.acquire(&device, spec(SampleFormat::EAc3, 44100, 8), &output)
        .unwrap();
    ring.release();

    let opened = device.opened.lock().unwrap().clone();
    assert_eq!(opened[0].channel_mask, ChannelMask::FivePointOne);
    assert_eq!(opened[0].flags, OutputFlags::Direct);
    assert_eq!(opened[0].device, OutputDevice::HdmiArc);
    assert_eq!(opened[1].channel_mask, ChannelMask::SevenPointOne);
    assert_eq!(opened[1].format, amlhal::AudioFormat::EAc3);
    assert_eq!(opened[1].sample_rate, 44100);
}

#[test]
fn acquire_rejects_unsupported_layouts() {
    let device = MockDevice::default();
    let mut ring = RingBuffer::new();

    assert!(matches!(
        ring.acquire(&device, spec(SampleFormat::Pcm16, 48000, 3), &OutputConfig::default()),
        Err(RingBufferError::UnsupportedChannels(3))
    ));

    let mixed = OutputConfig {
        direct_mode: false,
        device: OutputDevice::Speaker,
    };
    assert!(matches!(
        ring.acquire(&device, spec(SampleFormat::Pcm16, 48000, 6), &mixed),
        Err(RingBufferError::UnsupportedChannels(6))
    ));
    assert!(matches!(
        ring.acquire(&device, spec(SampleFormat::Pcm16, 48000, 1), &mixed),
        Err(RingBufferError::UnsupportedChannels(1))
    ));
    assert!(device.opened.lock().unwrap().is_empty());

    ring.acquire(&device, spec(SampleFormat::Pcm16, 48000, 2), &mixed)
        .unwrap();
    assert_eq!(device.opened.lock().unwrap()[0].flags, OutputFlags::Primary);
    assert_eq!(ring.state(), SessionState::Acquired);
}

#[test]
fn stop_pauses_then_flushes_the_device() {
    let (mut ring, device) = started(spec(SampleFormat::Pcm16, 48000, 2));
    commit_all(&mut ring, &[0u8; 8]).unwrap();

    ring.stop().unwrap();
    assert_eq!(device.stream.calls(), vec!["pause", "flush"]);
    assert_eq!(ring.state(), SessionState::Acquired);
}

#[test]
fn raw_clear_writes_silence() {
    let (mut ring, device) = started(spec(SampleFormat::Pcm16, 48000, 2));
    device
        .stream
        .script(&[MockWrite::Accept(1000), MockWrite::Accept(0)]);

    ring.clear();
    let written = device.stream.written();
    assert_eq!(written.len(), FLUSH_DATA_SIZE);
    assert!(written.iter().all(|&b| b == 0));
    assert_eq!(
        device.stream.write_sizes(),
        vec![1000, 0, FLUSH_DATA_SIZE - 1000]
    );
    // Silence does not count as committed audio.
    assert_eq!(ring.cursor().samples_committed, 0);
}

#[test]
fn time_follows_presentation_position() {
    let (ring, device) = started(spec(SampleFormat::Pcm16, 48000, 2));
    let time = ring.time_source();

    device.stream.frames.store(48000, Ordering::SeqCst);
    assert_eq!(time.current_time(), Some(gst::ClockTime::SECOND));

    device.stream.frames.store(24000, Ordering::SeqCst);
    assert_eq!(time.current_time(), Some(gst::ClockTime::SECOND));

    device.stream.frames.store(72000, Ordering::SeqCst);
    assert_eq!(
        time.current_time(),
        Some(gst::ClockTime::from_mseconds(1500))
    );

    device.stream.position_fails.store(true, Ordering::SeqCst);
    assert_eq!(time.current_time(), None);
}

#[test]
fn raw_clear_adds_no_compensation() {
    let (mut ring, device) = started(spec(SampleFormat::Pcm16, 48000, 2));
    let time = ring.time_source();
    device.stream.frames.store(48000, Ordering::SeqCst);

    ring.clear();
    assert!(time.is_flushed());
    thread::sleep(Duration::from_millis(5));
    assert_eq!(time.current_time(), Some(gst::ClockTime::SECOND));
}

#[test]
fn compressed_clear_compensates_until_next_write() {
    let (mut ring, device) = started(spec(SampleFormat::Ac3, 48000, 2));
    let time = ring.time_source();
    device.stream.frames.store(48000, Ordering::SeqCst);

    ring.clear();
    assert!(time.is_flushed());
    assert!(device.stream.written().is_empty());

    thread::sleep(Duration::from_millis(5));
    let first = time.current_time().unwrap();
    assert!(first >= gst::ClockTime::SECOND + gst::ClockTime::from_mseconds(5));
    thread::sleep(Duration::from_millis(5));
    let second = time.current_time().unwrap();
    assert!(second > first);

    commit_all(&mut ring, &ac3_frames(0, 0, 128, 1)).unwrap();
    assert!(!time.is_flushed());
    // Compensation ends but the reported time does not go back.
    assert_eq!(time.current_time(), Some(second));
}

#[test]
fn reduced_rate_eac3_drives_the_clock_rate() {
    let (mut ring, device) = started(spec(SampleFormat::EAc3, 48000, 2));
    let time = ring.time_source();
    // frmsiz 100 words, fscod 3, fscod2 0 (24 kHz)
    let mut frame = vec![0u8; 200];
    frame[..5].copy_from_slice(&[0x0b, 0x77, 0x00, 99, 0xc0]);

    assert_eq!(commit_all(&mut ring, &frame).unwrap(), 200);
    assert_eq!(ring.frame_meta().sample_rate_override, Some(24000));
    assert_eq!(time.sample_rate(), 24000);

    device.stream.frames.store(24000, Ordering::SeqCst);
    assert_eq!(time.current_time(), Some(gst::ClockTime::SECOND));
}

#[test]
fn release_detaches_the_clock() {
    let (mut ring, device) = started(spec(SampleFormat::Pcm16, 48000, 2));
    let time = ring.time_source();
    device.stream.frames.store(48000, Ordering::SeqCst);
    assert!(time.current_time().is_some());

    ring.release();
    assert_eq!(ring.state(), SessionState::Closed);
    assert!(!ring.is_acquired());
    assert_eq!(time.current_time(), None);
}
