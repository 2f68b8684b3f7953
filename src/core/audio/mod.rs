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

//! Audio output path
//!
//! The SPU produces interleaved stereo int16 samples at 44.1 kHz on the
//! emulation thread; the host's audio callback consumes them on its own
//! thread. The two sides meet in a lock-free single-producer
//! single-consumer ring buffer that truncates instead of blocking.

pub mod ring_buffer;

pub use ring_buffer::RingBuffer;

#[cfg(feature = "audio")]
mod backend;
#[cfg(feature = "audio")]
pub use backend::AudioBackend;

/// Output sample rate in Hz.
pub const SAMPLE_RATE: u32 = 44_100;

/// Output channel count (interleaved stereo).
pub const NR_CHANNELS: usize = 2;

/// Ring capacity in bytes: ~0.1 s of stereo int16 at 44.1 kHz.
pub const BUFFER_SIZE: usize =
    (SAMPLE_RATE as usize * NR_CHANNELS * std::mem::size_of::<i16>()) / 10;
