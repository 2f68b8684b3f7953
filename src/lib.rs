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

//! psemu: A PlayStation (PSX) emulator core
//!
//! This crate emulates the processor and system bus of the original
//! PlayStation: the MIPS R3000A interpreter with its coprocessor-0
//! exception model, the memory bus and address translation, the 7-channel
//! DMA controller, the interrupt controller, and the 24-voice SPU with
//! ADPCM decoding and ADSR envelopes.
//!
//! # Getting Started
//!
//! 1. Create a [`core::system::System`] instance
//! 2. Load a BIOS file
//! 3. Run the emulation loop
//!
//! ```no_run
//! use psemu::core::system::System;
//!
//! let mut system = System::new();
//! system.load_bios("path/to/bios.bin")?;
//! system.run_frame()?;
//! # Ok::<(), psemu::EmulatorError>(())
//! ```
//!
//! # Modules
//!
//! - [`core::cpu`]: MIPS R3000A CPU emulation
//! - [`core::memory`]: Memory bus and region decoding
//! - [`core::dma`]: DMA controller
//! - [`core::spu`]: Sound processing unit
//! - [`core::interrupt`]: Interrupt controller
//! - [`core::system`]: System integration and main loop
//!
//! # Error Handling
//!
//! All fallible operations return [`core::error::Result<T>`] which is an
//! alias for `Result<T, EmulatorError>`. Architectural CPU exceptions
//! (overflow, syscall, address errors, ...) are not errors in this sense;
//! they vector through COP0 and execution continues.

pub mod config;
pub mod core;

// Re-export commonly used types
pub use crate::core::error::{EmulatorError, Result};
