// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Lock-free single-producer single-consumer byte ring buffer
//!
//! The emulation thread is the only writer and the audio callback is the
//! only reader. Indexes are monotonically increasing and wrapped on
//! access, so `head - tail` is always the number of buffered bytes.
//! Writes beyond the free space and reads beyond the buffered count
//! truncate; neither side ever blocks.

use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

pub struct RingBuffer {
    buffer: Box<[AtomicU8]>,
    /// Producer position (total bytes written).
    head: AtomicUsize,
    /// Consumer position (total bytes read).
    tail: AtomicUsize,
}

impl RingBuffer {
    /// Create a ring holding at most `length` bytes.
    pub fn new(length: usize) -> Self {
        assert!(length > 0);

        let buffer = (0..length).map(|_| AtomicU8::new(0)).collect();

        Self {
            buffer,
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
        }
    }

    /// Capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Number of buffered bytes.
    pub fn count(&self) -> usize {
        self.head
            .load(Ordering::Acquire)
            .wrapping_sub(self.tail.load(Ordering::Acquire))
    }

    /// Fill level in [0, 1].
    pub fn usage(&self) -> f32 {
        self.count() as f32 / self.buffer.len() as f32
    }

    /// Write up to `src.len()` bytes; returns the number actually written.
    ///
    /// Producer side only.
    pub fn write(&self, src: &[u8]) -> usize {
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Acquire);

        let free = self.buffer.len() - head.wrapping_sub(tail);
        let amount = src.len().min(free);

        for (i, &byte) in src[..amount].iter().enumerate() {
            let index = head.wrapping_add(i) % self.buffer.len();
            self.buffer[index].store(byte, Ordering::Relaxed);
        }

        self.head.store(head.wrapping_add(amount), Ordering::Release);

        amount
    }

    /// Read up to `dst.len()` bytes; returns the number actually read.
    ///
    /// Consumer side only.
    pub fn read(&self, dst: &mut [u8]) -> usize {
        let tail = self.tail.load(Ordering::Relaxed);
        let head = self.head.load(Ordering::Acquire);

        let buffered = head.wrapping_sub(tail);
        let amount = dst.len().min(buffered);

        for (i, byte) in dst[..amount].iter_mut().enumerate() {
            let index = tail.wrapping_add(i) % self.buffer.len();
            *byte = self.buffer[index].load(Ordering::Relaxed);
        }

        self.tail.store(tail.wrapping_add(amount), Ordering::Release);

        amount
    }

    /// Drop all buffered bytes. Consumer side only.
    pub fn clear(&self) {
        let head = self.head.load(Ordering::Acquire);
        self.tail.store(head, Ordering::Release);
    }

    /// Write whole int16 samples; returns the number of samples written.
    ///
    /// Clamped to an even byte count so a sample is never torn in half.
    pub fn write_samples(&self, samples: &[i16]) -> usize {
        let free_samples = (self.buffer.len() - self.count()) / 2;
        let amount = samples.len().min(free_samples);

        for &sample in &samples[..amount] {
            self.write(&sample.to_le_bytes());
        }

        amount
    }

    /// Read whole int16 samples; returns the number of samples read.
    pub fn read_samples(&self, dst: &mut [i16]) -> usize {
        let buffered_samples = self.count() / 2;
        let amount = dst.len().min(buffered_samples);

        for sample in dst[..amount].iter_mut() {
            let mut bytes = [0u8; 2];
            self.read(&mut bytes);
            *sample = i16::from_le_bytes(bytes);
        }

        amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::Arc;

    #[test]
    fn test_write_then_read_fifo() {
        let rb = RingBuffer::new(16);

        assert_eq!(rb.write(&[1, 2, 3, 4]), 4);
        assert_eq!(rb.count(), 4);

        let mut out = [0u8; 4];
        assert_eq!(rb.read(&mut out), 4);
        assert_eq!(out, [1, 2, 3, 4]);
        assert_eq!(rb.count(), 0);
    }

    #[test]
    fn test_overfull_write_truncates() {
        let rb = RingBuffer::new(4);

        assert_eq!(rb.write(&[1, 2, 3, 4, 5, 6]), 4);
        assert_eq!(rb.count(), 4);

        let mut out = [0u8; 6];
        assert_eq!(rb.read(&mut out), 4);
        assert_eq!(&out[..4], &[1, 2, 3, 4]);
    }

    #[test]
    fn test_underfull_read_truncates() {
        let rb = RingBuffer::new(8);

        rb.write(&[9, 8]);

        let mut out = [0u8; 8];
        assert_eq!(rb.read(&mut out), 2);
        assert_eq!(&out[..2], &[9, 8]);

        // Empty ring reads nothing
        assert_eq!(rb.read(&mut out), 0);
    }

    #[test]
    fn test_wraparound() {
        let rb = RingBuffer::new(4);
        let mut out = [0u8; 4];

        // Advance the indexes past the physical end a few times
        for round in 0u8..10 {
            let data = [round, round.wrapping_add(1), round.wrapping_add(2)];
            assert_eq!(rb.write(&data), 3);
            assert_eq!(rb.read(&mut out[..3]), 3);
            assert_eq!(&out[..3], &data);
        }
    }

    #[test]
    fn test_clear() {
        let rb = RingBuffer::new(8);
        rb.write(&[1, 2, 3]);
        rb.clear();
        assert_eq!(rb.count(), 0);

        let mut out = [0u8; 3];
        assert_eq!(rb.read(&mut out), 0);
    }

    #[test]
    fn test_usage() {
        let rb = RingBuffer::new(10);
        assert_eq!(rb.usage(), 0.0);
        rb.write(&[0; 5]);
        assert!((rb.usage() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_sample_round_trip() {
        let rb = RingBuffer::new(64);
        let samples = [0i16, -1, 32767, -32768, 0x1234];

        assert_eq!(rb.write_samples(&samples), samples.len());

        let mut out = [0i16; 5];
        assert_eq!(rb.read_samples(&mut out), samples.len());
        assert_eq!(out, samples);
    }

    #[test]
    fn test_concurrent_producer_consumer() {
        let rb = Arc::new(RingBuffer::new(64));
        let producer = rb.clone();

        let total: usize = 10_000;

        let writer = std::thread::spawn(move || {
            let mut written = 0usize;
            while written < total {
                let byte = (written % 251) as u8;
                written += producer.write(&[byte]);
            }
        });

        let mut received = Vec::with_capacity(total);
        let mut byte = [0u8; 1];
        while received.len() < total {
            if rb.read(&mut byte) == 1 {
                received.push(byte[0]);
            }
        }

        writer.join().unwrap();

        for (i, &value) in received.iter().enumerate() {
            assert_eq!(value, (i % 251) as u8, "byte {} out of order", i);
        }
    }

    proptest! {
        /// Bytes come out in FIFO order no matter how the operations are
        /// interleaved, and lengths always respect capacity bookkeeping.
        #[test]
        fn prop_fifo_order(ops in proptest::collection::vec((any::<bool>(), 1usize..8), 1..64)) {
            let rb = RingBuffer::new(16);
            let mut expected = std::collections::VecDeque::new();
            let mut next_byte = 0u8;

            for (is_write, amount) in ops {
                if is_write {
                    let data: Vec<u8> = (0..amount)
                        .map(|_| {
                            let b = next_byte;
                            next_byte = next_byte.wrapping_add(1);
                            b
                        })
                        .collect();
                    let written = rb.write(&data);
                    prop_assert!(written <= data.len());
                    for &b in &data[..written] {
                        expected.push_back(b);
                    }
                    // Bytes past the free space are dropped, so roll the
                    // generator back for them.
                    next_byte = next_byte.wrapping_sub((data.len() - written) as u8);
                } else {
                    let mut out = vec![0u8; amount];
                    let read = rb.read(&mut out);
                    prop_assert_eq!(read, amount.min(expected.len()));
                    for &b in &out[..read] {
                        prop_assert_eq!(b, expected.pop_front().unwrap());
                    }
                }
                prop_assert_eq!(rb.count(), expected.len());
            }
        }
    }
}
