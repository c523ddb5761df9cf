// SPDX-FileCopyrightText: 2025 2025 Contributors to the gst-amlhal project.
// SPDX-License-Identifier: Apache-2.0

//! Mono to stereo expansion.

use super::RingBufferError;

/// Capacity of the expansion scratch buffer in bytes.
pub const EXTEND_BUFFER_SIZE: usize = 4096 * 2 * 2;

/// Scratch space for duplicating mono PCM into interleaved stereo.
///
/// Allocated once per session and reused by every commit.
pub struct ExtendBuffer {
    data: Box<[u8]>,
}

impl ExtendBuffer {
    pub fn new() -> Self {
        Self {
            data: vec![0u8; EXTEND_BUFFER_SIZE].into_boxed_slice(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Largest mono payload that still fits once doubled.
    pub fn max_input(&self) -> usize {
        self.capacity() / 2
    }

    /// Writes every `frame_size`-byte frame of `input` twice in a row and
    /// returns the expanded bytes.
    pub fn expand(&mut self, input: &[u8], frame_size: usize) -> Result<&[u8], RingBufferError> {
        let needed = input.len() * 2;
        if needed > self.capacity() {
            return Err(RingBufferError::BufferTooSmall {
                needed,
                capacity: self.capacity(),
            });
        }

        let out = &mut self.data[..needed];
        for (frame, pair) in input
            .chunks_exact(frame_size)
            .zip(out.chunks_exact_mut(frame_size * 2))
        {
            pair[..frame_size].copy_from_slice(frame);
            pair[frame_size..].copy_from_slice(frame);
        }
        Ok(&self.data[..needed])
    }
}

impl Default for ExtendBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicates_each_sample() {
        let mut buffer = ExtendBuffer::new();
        let input = [0x01, 0x02, 0x03, 0x04, 0xfe, 0xff];
        let out = buffer.expand(&input, 2).expect("fits");
        assert_eq!(
            out,
            &[0x01, 0x02, 0x01, 0x02, 0x03, 0x04, 0x03, 0x04, 0xfe, 0xff, 0xfe, 0xff]
        );
    }

    #[test]
    fn output_is_twice_the_input() {
        let mut buffer = ExtendBuffer::new();
        let input: Vec<u8> = (0..buffer.max_input()).map(|i| i as u8).collect();
        let out = buffer.expand(&input, 2).expect("fits exactly");
        assert_eq!(out.len(), EXTEND_BUFFER_SIZE);
        for (i, frame) in input.chunks_exact(2).enumerate() {
            assert_eq!(&out[i * 4..i * 4 + 2], frame);
            assert_eq!(&out[i * 4 + 2..i * 4 + 4], frame);
        }
    }

    #[test]
    fn rejects_payloads_that_overflow() {
        let mut buffer = ExtendBuffer::new();
        let input = vec![0u8; buffer.max_input() + 2];
        match buffer.expand(&input, 2) {
            Err(err @ RingBufferError::BufferTooSmall { needed, capacity }) => {
                assert_eq!(needed, EXTEND_BUFFER_SIZE + 4);
                assert_eq!(capacity, EXTEND_BUFFER_SIZE);
                assert!(err.is_fatal());
            }
            other => panic!("unexpected result {:?}", other.map(<[u8]>::len)),
        }
    }
}
