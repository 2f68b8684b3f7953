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

//! Core emulation components
//!
//! Everything here is driven synchronously from the host's event loop
//! through [`system::System`]; the only concurrent actor is the audio
//! callback, which consumes the ring buffer in [`audio`].

pub mod audio;
pub mod cpu;
pub mod dma;
pub mod error;
pub mod exp2;
pub mod gpu;
pub mod interrupt;
pub mod memory;
pub mod spu;
pub mod system;
pub mod util;

// Re-export commonly used types
pub use cpu::CPU;
pub use dma::DMA;
pub use memory::Bus;
pub use spu::SPU;
pub use system::System;
