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

//! GPU command sink (stub)
//!
//! Rasterization is out of scope; the GPU accepts GP0/GP1 words from
//! the CPU and DMA so command streams can be exercised, counts them,
//! and reports a fixed ready status.

/// GPUSTAT value: ready to receive commands and DMA words.
const GPU_STATUS_READY: u32 = 0x1C00_0000;

pub struct GPU {
    /// GP0 words accepted since reset.
    gp0_words: u64,
    /// GP1 words accepted since reset.
    gp1_words: u64,
}

impl GPU {
    pub fn new() -> Self {
        Self {
            gp0_words: 0,
            gp1_words: 0,
        }
    }

    pub fn reset(&mut self) {
        self.gp0_words = 0;
        self.gp1_words = 0;
    }

    /// GP0: rendering / VRAM command words.
    pub fn write_gp0(&mut self, value: u32) {
        self.gp0_words += 1;
        log::trace!("gpu: gp0 0x{:08X}", value);
    }

    /// GP1: display control command words.
    pub fn write_gp1(&mut self, value: u32) {
        self.gp1_words += 1;
        log::info!("gpu: gp1 0x{:08X} (ignored)", value);
    }

    /// GPUREAD: no transfers are modeled, reads are zero.
    pub fn read_data(&self) -> u32 {
        0
    }

    /// GPUSTAT: permanently ready.
    pub fn read_status(&self) -> u32 {
        GPU_STATUS_READY
    }

    /// Number of GP0 words accepted since reset.
    pub fn gp0_words(&self) -> u64 {
        self.gp0_words
    }
}

impl Default for GPU {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_reports_ready() {
        let gpu = GPU::new();
        assert_eq!(gpu.read_status(), 0x1C00_0000);
        assert_eq!(gpu.read_data(), 0);
    }

    #[test]
    fn test_gp0_words_counted() {
        let mut gpu = GPU::new();

        gpu.write_gp0(0x0100_0000);
        gpu.write_gp0(0x0200_0000);
        assert_eq!(gpu.gp0_words(), 2);

        gpu.reset();
        assert_eq!(gpu.gp0_words(), 0);
    }
}
