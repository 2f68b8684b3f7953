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

//! cpal output backend
//!
//! Opens the default output device at 44.1 kHz stereo int16 and drains
//! the shared ring buffer from the device callback. Underruns play
//! silence; the emulation side is never blocked.

use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::SampleFormat;

use super::{RingBuffer, BUFFER_SIZE, NR_CHANNELS, SAMPLE_RATE};

pub struct AudioBackend {
    ring: Arc<RingBuffer>,
    _stream: cpal::Stream,
}

impl AudioBackend {
    /// Open the default output device and start the stream.
    pub fn new() -> Result<Self, String> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| "no audio output device found".to_string())?;

        let mut configs = device
            .supported_output_configs()
            .map_err(|e| format!("unable to query output configs: {e}"))?;

        let config = configs
            .find(|c| {
                c.channels() as usize == NR_CHANNELS
                    && c.min_sample_rate().0 <= SAMPLE_RATE
                    && c.max_sample_rate().0 >= SAMPLE_RATE
                    && matches!(c.sample_format(), SampleFormat::I16)
            })
            .ok_or_else(|| "no 44100 Hz stereo i16 output config found".to_string())?
            .with_sample_rate(cpal::SampleRate(SAMPLE_RATE));

        log::info!("audio: output config {:?}", config);

        let ring = Arc::new(RingBuffer::new(BUFFER_SIZE));
        let consumer = ring.clone();

        let stream = device
            .build_output_stream(
                &config.config(),
                move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                    let read = consumer.read_samples(data);
                    data[read..].fill(0);
                },
                |err| log::error!("audio: stream error: {err}"),
                None,
            )
            .map_err(|e| format!("unable to build output stream: {e}"))?;

        stream
            .play()
            .map_err(|e| format!("unable to start output stream: {e}"))?;

        Ok(Self {
            ring,
            _stream: stream,
        })
    }

    /// Producer handle for the SPU side.
    pub fn ring(&self) -> Arc<RingBuffer> {
        self.ring.clone()
    }

    /// Current fill level of the output buffer in [0, 1].
    pub fn buffer_usage(&self) -> f32 {
        self.ring.usage()
    }
}
