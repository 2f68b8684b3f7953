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

//! DMA controller registers
//!
//! Seven channels, each with base address (MADR), block control (BCR)
//! and channel control (CHCR), plus the global priority (DPCR) and
//! interrupt (DICR) words. This module is pure register bookkeeping;
//! the transfers themselves are executed by the bus, which owns RAM and
//! the peripherals, on the register write that starts a channel.
//!
//! | Channel | Device   |
//! |---------|----------|
//! | 0       | MDEC In  |
//! | 1       | MDEC Out |
//! | 2       | GPU      |
//! | 3       | CD-ROM   |
//! | 4       | SPU      |
//! | 5       | PIO      |
//! | 6       | OTC      |

use crate::core::error::{EmulatorError, Result};

/// Number of DMA channels.
pub const NR_CHANNELS: usize = 7;

/// CHCR: transfer direction (0 = to RAM, 1 = from RAM)
const CHCR_DIRECTION: u32 = 0x1;
/// CHCR: address step (0 = +4, 1 = -4)
const CHCR_STEP: u32 = 0x2;
/// CHCR: sync mode field
const CHCR_SYNC_MODE: u32 = 0x600;
/// CHCR: start/busy
const CHCR_START: u32 = 0x0100_0000;
/// CHCR: manual trigger
const CHCR_TRIGGER: u32 = 0x1000_0000;
/// CHCR bits the OTC channel keeps on writes
const CHCR_OTC_MASK: u32 = 0x5100_0000;

/// DICR: force IRQ unconditionally
const DICR_IRQ_FORCE: u32 = 0x0000_8000;
/// DICR: per-channel IRQ masks
const DICR_IRQ_MASKS: u32 = 0x007F_0000;
/// DICR: master IRQ enable
const DICR_IRQ_MASTER_ENABLE: u32 = 0x0080_0000;
/// DICR: bits a write can set directly
const DICR_WRITABLE: u32 = 0x00FF_803F;
/// DICR: per-channel IRQ flags (write 1 to acknowledge)
const DICR_IRQ_FLAGS: u32 = 0x7F00_0000;
/// DICR: computed master flag
const DICR_IRQ_MASTER: u32 = 0x8000_0000;

const DICR_IRQ_MASK_BASE: u32 = 16;
const DICR_IRQ_FLAG_BASE: u32 = 24;

/// GPU command channel.
pub const CH_GPU: usize = 2;
/// SPU sound RAM channel.
pub const CH_SPU: usize = 4;
/// Ordering-table clear channel.
pub const CH_OTC: usize = 6;

/// CHCR sync mode field. The fourth encoding is reserved and treated
/// as an emulator fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Whole block at once, started by the trigger bit
    Manual,
    /// Blocks handed out on device request
    Request,
    /// Pointer-chased list of GPU command packets
    LinkedList,
}

/// CHCR direction bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    ToRam,
    FromRam,
}

/// CHCR step bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Forward,
    Backward,
}

#[derive(Clone, Copy, Default)]
struct Channel {
    base_address: u32,
    block_control: u32,
    channel_control: u32,
}

pub struct DMA {
    channels: [Channel; NR_CHANNELS],

    /// DPCR (0x1F8010F0). Reset value enables nothing and orders the
    /// channels by number.
    priority_control: u32,

    /// DICR (0x1F8010F4).
    interrupt_control: u32,

    /// Master-flag rising edge since the last [`DMA::take_irq`] call.
    pending_irq: bool,
}

impl DMA {
    pub fn new() -> Self {
        let mut dma = Self {
            channels: [Channel::default(); NR_CHANNELS],
            priority_control: 0,
            interrupt_control: 0,
            pending_irq: false,
        };

        dma.hard_reset();
        dma.soft_reset();

        dma
    }

    /// Zero every register.
    pub fn hard_reset(&mut self) {
        self.channels = [Channel::default(); NR_CHANNELS];
        self.priority_control = 0;
        self.interrupt_control = 0;
        self.pending_irq = false;
    }

    /// Restore the reset priority ordering.
    pub fn soft_reset(&mut self) {
        self.priority_control = 0x0765_4321;
    }

    /// Read a DMA register by bus address.
    pub fn read32(&self, address: u32) -> Result<u32> {
        match address {
            0x1F80_1080..=0x1F80_10EF => {
                let channel = ((address >> 4) & 0x7) as usize;

                match address & 0xF {
                    0x0 => Ok(self.channels[channel].base_address),
                    0x8 => Ok(self.channels[channel].channel_control),
                    _ => Err(EmulatorError::DmaUnknownRead { address }),
                }
            }
            0x1F80_10F0 => Ok(self.priority_control),
            0x1F80_10F4 => Ok(self.interrupt_control),
            _ => Err(EmulatorError::DmaUnknownRead { address }),
        }
    }

    /// Write a DMA register by bus address. Returns the channel number
    /// when the write leaves a channel enabled and activated; the caller
    /// must then run the transfer to completion.
    pub fn write32(&mut self, address: u32, value: u32) -> Result<Option<usize>> {
        match address {
            0x1F80_1080..=0x1F80_10EF => {
                let channel = ((address >> 4) & 0x7) as usize;

                match address & 0xF {
                    0x0 => {
                        self.channels[channel].base_address = value & 0x00FF_FFFF;
                        log::trace!("dma{}: madr=0x{:08X}", channel, value);
                        Ok(None)
                    }
                    0x4 => {
                        self.channels[channel].block_control = value;
                        log::trace!("dma{}: bcr=0x{:08X}", channel, value);
                        Ok(None)
                    }
                    0x8 => {
                        let value = if channel == CH_OTC {
                            // OTC only honors start/trigger and always
                            // steps backward
                            (value & CHCR_OTC_MASK) | CHCR_STEP
                        } else {
                            value
                        };

                        self.channels[channel].channel_control = value;
                        log::trace!("dma{}: chcr=0x{:08X}", channel, value);

                        if self.enabled(channel) && self.activated(channel)? {
                            log::debug!(
                                "dma{}: start madr=0x{:08X} bcr=0x{:08X} chcr=0x{:08X}",
                                channel,
                                self.channels[channel].base_address,
                                self.channels[channel].block_control,
                                self.channels[channel].channel_control
                            );
                            Ok(Some(channel))
                        } else {
                            Ok(None)
                        }
                    }
                    _ => Err(EmulatorError::DmaUnknownWrite { address }),
                }
            }
            0x1F80_10F0 => {
                self.priority_control = value;
                log::trace!("dma: dpcr=0x{:08X}", value);
                Ok(None)
            }
            0x1F80_10F4 => {
                // Acknowledge flags written as 1, replace the writable
                // bits, keep the remaining flags
                self.interrupt_control &= !DICR_WRITABLE;
                self.interrupt_control &= !(value & DICR_IRQ_FLAGS);
                self.interrupt_control |= value & DICR_WRITABLE;

                self.update_master_flag();

                log::trace!("dma: dicr=0x{:08X}", self.interrupt_control);
                Ok(None)
            }
            _ => Err(EmulatorError::DmaUnknownWrite { address }),
        }
    }

    /// DPCR enable bit for a channel (bit `4*channel + 3`).
    fn enabled(&self, channel: usize) -> bool {
        self.priority_control & (1 << (channel * 4 + 3)) != 0
    }

    /// Start bit set, and for manual sync the trigger bit too.
    fn activated(&self, channel: usize) -> Result<bool> {
        let control = self.channels[channel].channel_control;

        let trigger = match self.sync_mode(channel)? {
            SyncMode::Manual => control & CHCR_TRIGGER != 0,
            _ => true,
        };

        Ok(control & CHCR_START != 0 && trigger)
    }

    pub fn base_address(&self, channel: usize) -> u32 {
        self.channels[channel].base_address
    }

    pub fn sync_mode(&self, channel: usize) -> Result<SyncMode> {
        match (self.channels[channel].channel_control & CHCR_SYNC_MODE) >> 9 {
            0 => Ok(SyncMode::Manual),
            1 => Ok(SyncMode::Request),
            2 => Ok(SyncMode::LinkedList),
            _ => Err(EmulatorError::DmaReservedSyncMode { channel }),
        }
    }

    pub fn direction(&self, channel: usize) -> Direction {
        if self.channels[channel].channel_control & CHCR_DIRECTION != 0 {
            Direction::FromRam
        } else {
            Direction::ToRam
        }
    }

    pub fn step(&self, channel: usize) -> Step {
        if self.channels[channel].channel_control & CHCR_STEP != 0 {
            Step::Backward
        } else {
            Step::Forward
        }
    }

    /// Transfer length in words for the non-linked-list modes. A manual
    /// block size of 0 means 0x10000 words.
    pub fn remaining(&self, channel: usize) -> Result<u32> {
        let block_control = self.channels[channel].block_control;
        let block_size = block_control & 0xFFFF;
        let block_amount = block_control >> 16;

        match self.sync_mode(channel)? {
            SyncMode::Manual => Ok(if block_size == 0 { 0x10000 } else { block_size }),
            SyncMode::Request => Ok(block_size * block_amount),
            SyncMode::LinkedList => Ok(0),
        }
    }

    /// The trigger bit drops as soon as the transfer begins.
    pub fn clear_trigger(&mut self, channel: usize) {
        self.channels[channel].channel_control &= !CHCR_TRIGGER;
    }

    /// Complete a transfer: clear the start bit and raise the channel's
    /// interrupt flag when its mask bit allows.
    pub fn finish_transfer(&mut self, channel: usize) {
        self.channels[channel].channel_control &= !CHCR_START;

        if self.interrupt_control & (1 << (DICR_IRQ_MASK_BASE + channel as u32)) != 0 {
            self.interrupt_control |= 1 << (DICR_IRQ_FLAG_BASE + channel as u32);
            self.update_master_flag();
        }
    }

    /// Recompute DICR bit 31. A rising edge schedules a CPU interrupt,
    /// consumed by [`DMA::take_irq`].
    fn update_master_flag(&mut self) {
        let force = self.interrupt_control & DICR_IRQ_FORCE != 0;
        let enable = self.interrupt_control & DICR_IRQ_MASTER_ENABLE != 0;

        let flags = (self.interrupt_control & DICR_IRQ_FLAGS) >> DICR_IRQ_FLAG_BASE;
        let masks = (self.interrupt_control & DICR_IRQ_MASKS) >> DICR_IRQ_MASK_BASE;

        let previous = self.interrupt_control & DICR_IRQ_MASTER != 0;

        self.interrupt_control &= !DICR_IRQ_MASTER;

        if force || (enable && flags & masks != 0) {
            self.interrupt_control |= DICR_IRQ_MASTER;

            if !previous {
                self.pending_irq = true;
            }
        }
    }

    /// Consume a pending master-flag rising edge.
    pub fn take_irq(&mut self) -> bool {
        std::mem::take(&mut self.pending_irq)
    }
}

impl Default for DMA {
    fn default() -> Self {
        Self::new()
    }
}
