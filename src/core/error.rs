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

//! Emulator fault types
//!
//! These cover the non-recoverable faults: a bus access nothing decodes,
//! a malformed BIOS image, an unmodeled DMA or SPU register. They either
//! indicate a bug in the core or guest behavior that is not modeled yet,
//! and are reported to the host rather than vectored through COP0.

use thiserror::Error;

/// Non-recoverable emulator faults.
#[derive(Debug, Error)]
pub enum EmulatorError {
    /// BIOS file could not be read
    #[error("unable to read BIOS image: {0}")]
    BiosRead(#[from] std::io::Error),

    /// BIOS image is not exactly 512 KiB
    #[error("unexpected BIOS size: {0} bytes")]
    BiosSize(usize),

    /// Guest attempted to write to BIOS ROM
    #[error("write to BIOS region at 0x{address:08X}")]
    BiosWrite { address: u32 },

    /// Read from an address no region decodes
    #[error("unknown {width}-bit read at 0x{address:08X}")]
    UnknownRead { address: u32, width: u8 },

    /// Write to an address no region decodes
    #[error("unknown {width}-bit write at 0x{address:08X}: 0x{value:08X}")]
    UnknownWrite { address: u32, width: u8, value: u32 },

    /// Read from an unmapped DMA register
    #[error("dma: read from unknown register 0x{address:08X}")]
    DmaUnknownRead { address: u32 },

    /// Write to an unmapped DMA register
    #[error("dma: write to unknown register 0x{address:08X}")]
    DmaUnknownWrite { address: u32 },

    /// Channel programmed with the reserved sync mode
    #[error("dma: reserved sync mode on channel {channel}")]
    DmaReservedSyncMode { channel: usize },

    /// Transfer mode/channel/direction combination that is not modeled
    #[error("dma: {mode} transfer unsupported on channel {channel}")]
    DmaUnsupportedTransfer { channel: usize, mode: &'static str },

    /// Read from an unmapped SPU register
    #[error("spu: read from unknown register 0x{address:08X}")]
    SpuUnknownRead { address: u32 },

    /// Write to an unmapped SPU register
    #[error("spu: write to unknown register 0x{address:08X}: 0x{value:04X}")]
    SpuUnknownWrite { address: u32, value: u16 },

    /// Read from an unmapped expansion-region-2 register
    #[error("exp2: read from unknown register 0x{address:08X}")]
    Exp2UnknownRead { address: u32 },

    /// Write to an unmapped expansion-region-2 register
    #[error("exp2: write to unknown register 0x{address:08X}: 0x{value:02X}")]
    Exp2UnknownWrite { address: u32, value: u8 },
}

/// Result alias used by all fallible core operations.
pub type Result<T> = std::result::Result<T, EmulatorError>;
