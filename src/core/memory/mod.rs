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

//! Memory bus
//!
//! Owns RAM, the BIOS image and every device, and routes 8/16/32-bit
//! physical accesses to them. Addresses arriving here are already
//! translated and size-aligned by the CPU; other masters (DMA) keep
//! their accesses aligned by construction.
//!
//! | Region      | Start      | Size    |
//! |-------------|------------|---------|
//! | RAM         | 0x00000000 | 2 MiB   |
//! | EXP1        | 0x1F000000 | 8 MiB   |
//! | MEMCTRL     | 0x1F801000 | 0x24    |
//! | MEMCTRL2    | 0x1F801060 | 4       |
//! | IRQ         | 0x1F801070 | 8       |
//! | DMA         | 0x1F801080 | 0x80    |
//! | TIMER       | 0x1F801100 | 0x30    |
//! | CDROM       | 0x1F801800 | 4       |
//! | GPU         | 0x1F801810 | 8       |
//! | SPU         | 0x1F801C00 | 0x400   |
//! | EXP2        | 0x1F802000 | 8 KiB   |
//! | BIOS        | 0x1FC00000 | 512 KiB |
//! | CACHECTRL   | 0xFFFE0130 | 4       |
//!
//! Each region is checked for every access size. The SPU is the only
//! width-restricted device (its registers are 16-bit half-words);
//! everywhere else sub-word accesses decode too: byte/half views of the
//! IRQ pair and GPU words are served shifted, the remaining stubs read
//! zero and swallow writes at any width.
//!
//! A miss on a non-debug access is an emulator fault: either the core
//! has a bug or the guest touched hardware that is not modeled.

use std::fs::File;
use std::io::Read;

use crate::core::dma::{self, Direction, Step, SyncMode, DMA};
use crate::core::error::{EmulatorError, Result};
use crate::core::exp2::Exp2;
use crate::core::gpu::GPU;
use crate::core::interrupt::{Interrupt, InterruptController};
use crate::core::spu::SPU;

/// Main RAM size (2 MiB).
pub const RAM_SIZE: usize = 2 * 1024 * 1024;

/// BIOS ROM size (512 KiB); images of any other size are rejected.
pub const BIOS_SIZE: usize = 512 * 1024;

const RAM_START: u32 = 0x0000_0000;
const RAM_END: u32 = RAM_START + RAM_SIZE as u32 - 1;

const EXP1_START: u32 = 0x1F00_0000;
const EXP1_END: u32 = EXP1_START + 8 * 1024 * 1024 - 1;

const MEMCTRL_START: u32 = 0x1F80_1000;
const MEMCTRL_END: u32 = MEMCTRL_START + 0x24 - 1;

const MEMCTRL2: u32 = 0x1F80_1060;
const MEMCTRL2_END: u32 = MEMCTRL2 + 4 - 1;

const IRQ_STATUS: u32 = 0x1F80_1070;
const IRQ_MASK: u32 = 0x1F80_1074;
const IRQ_END: u32 = IRQ_MASK + 4 - 1;

const DMA_START: u32 = 0x1F80_1080;
const DMA_END: u32 = DMA_START + 0x80 - 1;

const TIMER_START: u32 = 0x1F80_1100;
const TIMER_END: u32 = TIMER_START + 0x30 - 1;

const CDROM_START: u32 = 0x1F80_1800;
const CDROM_END: u32 = CDROM_START + 4 - 1;

const GPU_GP0: u32 = 0x1F80_1810;
const GPU_GP1: u32 = 0x1F80_1814;
const GPU_END: u32 = GPU_GP1 + 4 - 1;

const SPU_START: u32 = 0x1F80_1C00;
const SPU_END: u32 = SPU_START + 0x400 - 1;

const EXP2_START: u32 = 0x1F80_2000;
const EXP2_END: u32 = EXP2_START + 8 * 1024 - 1;

const BIOS_START: u32 = 0x1FC0_0000;
const BIOS_END: u32 = BIOS_START + BIOS_SIZE as u32 - 1;

const CACHECTRL: u32 = 0xFFFE_0130;
const CACHECTRL_END: u32 = CACHECTRL + 4 - 1;

/// DMA transfers address RAM in word units below this mask.
const DMA_ADDRESS_MASK: u32 = 0x1F_FFFC;

pub struct Bus {
    /// Main RAM, zeroed on hard reset.
    ram: Vec<u8>,

    /// BIOS ROM, read-only once loaded.
    bios: Vec<u8>,

    dma: DMA,
    gpu: GPU,
    spu: SPU,
    irq: InterruptController,
    exp2: Exp2,
}

impl Bus {
    pub fn new() -> Self {
        Self {
            ram: vec![0u8; RAM_SIZE],
            bios: vec![0u8; BIOS_SIZE],
            dma: DMA::new(),
            gpu: GPU::new(),
            spu: SPU::new(),
            irq: InterruptController::new(),
            exp2: Exp2::new(),
        }
    }

    /// Power-cycle everything except the loaded BIOS image.
    pub fn hard_reset(&mut self) {
        self.ram.fill(0);

        self.dma.hard_reset();
        self.dma.soft_reset();
        self.gpu.reset();
        self.spu.hard_reset();
        self.irq.reset();
        self.exp2.reset();
    }

    /// Load a BIOS ROM from a file. The image must be exactly 512 KiB.
    pub fn load_bios(&mut self, path: &str) -> Result<()> {
        let mut file = File::open(path)?;
        let mut image = Vec::with_capacity(BIOS_SIZE);
        file.read_to_end(&mut image)?;

        self.load_bios_image(&image)
    }

    /// Load a BIOS ROM already in memory.
    pub fn load_bios_image(&mut self, image: &[u8]) -> Result<()> {
        if image.len() != BIOS_SIZE {
            return Err(EmulatorError::BiosSize(image.len()));
        }

        self.bios.copy_from_slice(image);

        #[cfg(feature = "tty-patch")]
        self.patch_bios_tty();

        log::info!("bus: BIOS loaded ({} KiB)", BIOS_SIZE / 1024);
        Ok(())
    }

    /// Force-enable the BIOS kernel's TTY output by patching the flag
    /// check in its A(3Ch) putchar path.
    #[cfg(feature = "tty-patch")]
    fn patch_bios_tty(&mut self) {
        let patches = [(0x1BC3usize * 4, 0x2401_0001u32), (0x1BC5 * 4, 0xAF81_A9C0)];

        for (offset, word) in patches {
            self.bios[offset..offset + 4].copy_from_slice(&word.to_le_bytes());
        }

        log::info!("bus: BIOS patched for TTY output");
    }

    // Direct views for the host

    pub fn ram(&self) -> &[u8] {
        &self.ram
    }

    pub fn bios(&self) -> &[u8] {
        &self.bios
    }

    pub fn spu(&self) -> &SPU {
        &self.spu
    }

    pub fn spu_mut(&mut self) -> &mut SPU {
        &mut self.spu
    }

    pub fn gpu(&self) -> &GPU {
        &self.gpu
    }

    pub fn irq(&self) -> &InterruptController {
        &self.irq
    }

    pub fn irq_mut(&mut self) -> &mut InterruptController {
        &mut self.irq
    }

    /// Drain the EXP2 TTY line queue.
    pub fn take_tty_lines(&mut self) -> Vec<String> {
        self.exp2.take_tty_lines()
    }

    /// Level of the CPU interrupt line.
    pub fn irq_line(&self) -> bool {
        self.irq.pending()
    }

    // RAM helpers shared with the DMA engine

    fn ram_read32(&self, address: u32) -> u32 {
        let offset = (address & DMA_ADDRESS_MASK) as usize;
        u32::from_le_bytes([
            self.ram[offset],
            self.ram[offset + 1],
            self.ram[offset + 2],
            self.ram[offset + 3],
        ])
    }

    fn ram_write32(&mut self, address: u32, value: u32) {
        let offset = (address & DMA_ADDRESS_MASK) as usize;
        self.ram[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }

    /// The IRQ word a sub-word access at `address` falls into.
    fn irq_register(&self, address: u32) -> u32 {
        if address & 0x4 == 0 {
            self.irq.read_status()
        } else {
            self.irq.read_mask()
        }
    }

    /// The GPU word a sub-word access at `address` falls into.
    fn gpu_register(&self, address: u32) -> u32 {
        if address & !0x3 == GPU_GP0 {
            self.gpu.read_data()
        } else {
            self.gpu.read_status()
        }
    }

    /// 8-bit read.
    pub fn read8(&mut self, address: u32) -> Result<u8> {
        match address {
            RAM_START..=RAM_END => Ok(self.ram[address as usize]),
            BIOS_START..=BIOS_END => Ok(self.bios[(address - BIOS_START) as usize]),
            IRQ_STATUS..=IRQ_END => {
                Ok((self.irq_register(address) >> ((address & 0x3) * 8)) as u8)
            }
            DMA_START..=DMA_END => {
                log::info!("bus: byte read from dma at 0x{:08X}", address);
                Ok(0)
            }
            GPU_GP0..=GPU_END => {
                Ok((self.gpu_register(address) >> ((address & 0x3) * 8)) as u8)
            }
            TIMER_START..=TIMER_END => {
                log::info!("bus: read from timer at 0x{:08X}", address);
                Ok(0)
            }
            EXP1_START..=EXP1_END => {
                log::info!("bus: read from exp1 at 0x{:08X}", address);
                Ok(0)
            }
            CDROM_START..=CDROM_END => {
                log::info!("bus: read from cdrom at 0x{:08X}", address);
                Ok(0)
            }
            EXP2_START..=EXP2_END => self.exp2.read8(address),
            _ => Err(EmulatorError::UnknownRead { address, width: 8 }),
        }
    }

    /// 16-bit read.
    pub fn read16(&mut self, address: u32) -> Result<u16> {
        match address {
            RAM_START..=RAM_END => {
                let offset = address as usize;
                Ok(u16::from_le_bytes([self.ram[offset], self.ram[offset + 1]]))
            }
            BIOS_START..=BIOS_END => {
                let offset = (address - BIOS_START) as usize;
                Ok(u16::from_le_bytes([
                    self.bios[offset],
                    self.bios[offset + 1],
                ]))
            }
            IRQ_STATUS..=IRQ_END => {
                Ok((self.irq_register(address) >> ((address & 0x3) * 8)) as u16)
            }
            DMA_START..=DMA_END => {
                log::info!("bus: half-word read from dma at 0x{:08X}", address);
                Ok(0)
            }
            GPU_GP0..=GPU_END => {
                Ok((self.gpu_register(address) >> ((address & 0x3) * 8)) as u16)
            }
            SPU_START..=SPU_END => self.spu.read16(address),
            TIMER_START..=TIMER_END => {
                log::info!("bus: read from timer at 0x{:08X}", address);
                Ok(0)
            }
            EXP1_START..=EXP1_END => {
                log::info!("bus: read from exp1 at 0x{:08X}", address);
                Ok(0)
            }
            CDROM_START..=CDROM_END => {
                log::info!("bus: read from cdrom at 0x{:08X}", address);
                Ok(0)
            }
            EXP2_START..=EXP2_END => {
                log::info!("bus: half-word read from exp2 at 0x{:08X}", address);
                Ok(0)
            }
            _ => Err(EmulatorError::UnknownRead { address, width: 16 }),
        }
    }

    /// 32-bit read.
    pub fn read32(&mut self, address: u32) -> Result<u32> {
        match address {
            RAM_START..=RAM_END => {
                let offset = address as usize;
                Ok(u32::from_le_bytes([
                    self.ram[offset],
                    self.ram[offset + 1],
                    self.ram[offset + 2],
                    self.ram[offset + 3],
                ]))
            }
            BIOS_START..=BIOS_END => {
                let offset = (address - BIOS_START) as usize;
                Ok(u32::from_le_bytes([
                    self.bios[offset],
                    self.bios[offset + 1],
                    self.bios[offset + 2],
                    self.bios[offset + 3],
                ]))
            }
            IRQ_STATUS => Ok(self.irq.read_status()),
            IRQ_MASK => Ok(self.irq.read_mask()),
            DMA_START..=DMA_END => self.dma.read32(address),
            GPU_GP0 => Ok(self.gpu.read_data()),
            GPU_GP1 => Ok(self.gpu.read_status()),
            TIMER_START..=TIMER_END => {
                log::info!("bus: read from timer at 0x{:08X}", address);
                Ok(0)
            }
            CDROM_START..=CDROM_END => {
                log::info!("bus: read from cdrom at 0x{:08X}", address);
                Ok(0)
            }
            EXP1_START..=EXP1_END => {
                log::info!("bus: read from exp1 at 0x{:08X}", address);
                Ok(0)
            }
            EXP2_START..=EXP2_END => {
                log::info!("bus: word read from exp2 at 0x{:08X}", address);
                Ok(0)
            }
            _ => Err(EmulatorError::UnknownRead { address, width: 32 }),
        }
    }

    /// 8-bit write.
    pub fn write8(&mut self, address: u32, value: u8) -> Result<()> {
        match address {
            RAM_START..=RAM_END => {
                self.ram[address as usize] = value;
                Ok(())
            }
            BIOS_START..=BIOS_END => Err(EmulatorError::BiosWrite { address }),
            MEMCTRL_START..=MEMCTRL_END => {
                log::info!("bus: write to memctrl at 0x{:08X}: 0x{:02X}", address, value);
                Ok(())
            }
            MEMCTRL2..=MEMCTRL2_END => {
                log::info!("bus: write to ram_size register: 0x{:02X}", value);
                Ok(())
            }
            IRQ_STATUS..=IRQ_END => {
                let shift = (address & 0x3) * 8;

                if address & 0x4 == 0 {
                    // Acknowledge only the written byte of the status word
                    self.irq
                        .write_status(!(0xFFu32 << shift) | ((value as u32) << shift));
                } else {
                    let mask =
                        (self.irq.read_mask() & !(0xFFu32 << shift)) | ((value as u32) << shift);
                    self.irq.write_mask(mask);
                }
                Ok(())
            }
            DMA_START..=DMA_END => {
                log::info!("bus: byte write to dma at 0x{:08X}: 0x{:02X}", address, value);
                Ok(())
            }
            GPU_GP0..=GPU_END => {
                log::info!("bus: byte write to gpu at 0x{:08X}: 0x{:02X}", address, value);
                Ok(())
            }
            TIMER_START..=TIMER_END => {
                log::info!("bus: write to timer at 0x{:08X}: 0x{:02X}", address, value);
                Ok(())
            }
            EXP1_START..=EXP1_END => {
                log::info!("bus: write to exp1 at 0x{:08X}", address);
                Ok(())
            }
            CDROM_START..=CDROM_END => {
                log::info!("bus: write to cdrom at 0x{:08X}: 0x{:02X}", address, value);
                Ok(())
            }
            EXP2_START..=EXP2_END => self.exp2.write8(address, value),
            CACHECTRL..=CACHECTRL_END => {
                log::info!("bus: write to cachectrl: 0x{:02X}", value);
                Ok(())
            }
            _ => Err(EmulatorError::UnknownWrite {
                address,
                width: 8,
                value: value as u32,
            }),
        }
    }

    /// 16-bit write.
    pub fn write16(&mut self, address: u32, value: u16) -> Result<()> {
        match address {
            RAM_START..=RAM_END => {
                let offset = address as usize;
                self.ram[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
                Ok(())
            }
            BIOS_START..=BIOS_END => Err(EmulatorError::BiosWrite { address }),
            MEMCTRL_START..=MEMCTRL_END => {
                log::info!("bus: write to memctrl at 0x{:08X}: 0x{:04X}", address, value);
                Ok(())
            }
            MEMCTRL2..=MEMCTRL2_END => {
                log::info!("bus: write to ram_size register: 0x{:04X}", value);
                Ok(())
            }
            IRQ_STATUS..=IRQ_END => {
                let shift = (address & 0x3) * 8;

                if address & 0x4 == 0 {
                    // Acknowledge only the written half of the status word
                    self.irq
                        .write_status(!(0xFFFFu32 << shift) | ((value as u32) << shift));
                } else {
                    let mask = (self.irq.read_mask() & !(0xFFFFu32 << shift))
                        | ((value as u32) << shift);
                    self.irq.write_mask(mask);
                }
                Ok(())
            }
            DMA_START..=DMA_END => {
                log::info!(
                    "bus: half-word write to dma at 0x{:08X}: 0x{:04X}",
                    address,
                    value
                );
                Ok(())
            }
            GPU_GP0..=GPU_END => {
                log::info!(
                    "bus: half-word write to gpu at 0x{:08X}: 0x{:04X}",
                    address,
                    value
                );
                Ok(())
            }
            SPU_START..=SPU_END => self.spu.write16(address, value),
            TIMER_START..=TIMER_END => {
                log::info!("bus: write to timer at 0x{:08X}: 0x{:04X}", address, value);
                Ok(())
            }
            EXP1_START..=EXP1_END => {
                log::info!("bus: write to exp1 at 0x{:08X}", address);
                Ok(())
            }
            CDROM_START..=CDROM_END => {
                log::info!("bus: write to cdrom at 0x{:08X}: 0x{:04X}", address, value);
                Ok(())
            }
            EXP2_START..=EXP2_END => {
                log::info!(
                    "bus: half-word write to exp2 at 0x{:08X}: 0x{:04X}",
                    address,
                    value
                );
                Ok(())
            }
            CACHECTRL..=CACHECTRL_END => {
                log::info!("bus: write to cachectrl: 0x{:04X}", value);
                Ok(())
            }
            _ => Err(EmulatorError::UnknownWrite {
                address,
                width: 16,
                value: value as u32,
            }),
        }
    }

    /// 32-bit write.
    pub fn write32(&mut self, address: u32, value: u32) -> Result<()> {
        match address {
            RAM_START..=RAM_END => {
                let offset = address as usize;
                self.ram[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
                Ok(())
            }
            BIOS_START..=BIOS_END => Err(EmulatorError::BiosWrite { address }),
            MEMCTRL_START..=MEMCTRL_END => {
                log::info!("bus: write to memctrl at 0x{:08X}: 0x{:08X}", address, value);
                Ok(())
            }
            MEMCTRL2 => {
                log::info!("bus: write to ram_size register: 0x{:08X}", value);
                Ok(())
            }
            IRQ_STATUS => {
                self.irq.write_status(value);
                Ok(())
            }
            IRQ_MASK => {
                self.irq.write_mask(value);
                Ok(())
            }
            DMA_START..=DMA_END => self.dma_write32(address, value),
            GPU_GP0 => {
                self.gpu.write_gp0(value);
                Ok(())
            }
            GPU_GP1 => {
                self.gpu.write_gp1(value);
                Ok(())
            }
            TIMER_START..=TIMER_END => {
                log::info!("bus: write to timer at 0x{:08X}: 0x{:08X}", address, value);
                Ok(())
            }
            EXP1_START..=EXP1_END => {
                log::info!("bus: write to exp1 at 0x{:08X}", address);
                Ok(())
            }
            CDROM_START..=CDROM_END => {
                log::info!("bus: write to cdrom at 0x{:08X}: 0x{:08X}", address, value);
                Ok(())
            }
            EXP2_START..=EXP2_END => {
                log::info!("bus: word write to exp2 at 0x{:08X}: 0x{:08X}", address, value);
                Ok(())
            }
            CACHECTRL => {
                log::info!("bus: write to cachectrl: 0x{:08X}", value);
                Ok(())
            }
            _ => Err(EmulatorError::UnknownWrite {
                address,
                width: 32,
                value,
            }),
        }
    }

    // Debug accessors: no faults, no side effects beyond the write
    // itself, unknown regions read as zero.

    pub fn debug_read8(&self, address: u32) -> u8 {
        match address {
            RAM_START..=RAM_END => self.ram[address as usize],
            BIOS_START..=BIOS_END => self.bios[(address - BIOS_START) as usize],
            _ => 0,
        }
    }

    pub fn debug_read32(&self, address: u32) -> u32 {
        match address {
            RAM_START..=RAM_END => {
                let offset = address as usize;
                u32::from_le_bytes([
                    self.ram[offset],
                    self.ram[offset + 1],
                    self.ram[offset + 2],
                    self.ram[offset + 3],
                ])
            }
            BIOS_START..=BIOS_END => {
                let offset = (address - BIOS_START) as usize;
                u32::from_le_bytes([
                    self.bios[offset],
                    self.bios[offset + 1],
                    self.bios[offset + 2],
                    self.bios[offset + 3],
                ])
            }
            _ => 0,
        }
    }

    pub fn debug_write32(&mut self, address: u32, value: u32) {
        if let RAM_START..=RAM_END = address {
            let offset = address as usize;
            self.ram[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
        }
    }

    // DMA engine. Transfers run to completion inside the register write
    // that starts them; the CPU only ever observes finished transfers.

    fn dma_write32(&mut self, address: u32, value: u32) -> Result<()> {
        if let Some(channel) = self.dma.write32(address, value)? {
            self.run_dma_transfer(channel)?;
        }

        // DICR writes and transfer completion can both raise the master
        // flag; surface the edge as a CPU interrupt
        if self.dma.take_irq() {
            self.irq.assert_irq(Interrupt::DMA);
        }

        Ok(())
    }

    fn run_dma_transfer(&mut self, channel: usize) -> Result<()> {
        self.dma.clear_trigger(channel);

        match self.dma.sync_mode(channel)? {
            SyncMode::Manual => self.dma_transfer_manual(channel)?,
            SyncMode::Request => self.dma_transfer_request(channel)?,
            SyncMode::LinkedList => self.dma_transfer_linked_list(channel)?,
        }

        self.dma.finish_transfer(channel);

        Ok(())
    }

    /// Manual mode carries only the OTC channel: build the backward
    /// linked list the GPU ordering tables are seeded from.
    fn dma_transfer_manual(&mut self, channel: usize) -> Result<()> {
        if channel != dma::CH_OTC || self.dma.direction(channel) != Direction::ToRam {
            return Err(EmulatorError::DmaUnsupportedTransfer {
                channel,
                mode: "manual",
            });
        }

        let mut address = self.dma.base_address(channel) & !0x3;
        let mut remaining = self.dma.remaining(channel)?;

        // Each entry points at the word 4 below it; the last entry
        // written is the end-of-table marker
        while remaining > 0 {
            let value = if remaining == 1 {
                0x00FF_FFFF
            } else {
                address.wrapping_sub(4) & DMA_ADDRESS_MASK
            };

            self.ram_write32(address, value);

            address = address.wrapping_add(4);
            remaining -= 1;
        }

        log::debug!("dma{}: otc clear finished", channel);
        Ok(())
    }

    /// Request mode feeds RAM words to the GPU command port.
    fn dma_transfer_request(&mut self, channel: usize) -> Result<()> {
        if channel != dma::CH_GPU || self.dma.direction(channel) != Direction::FromRam {
            return Err(EmulatorError::DmaUnsupportedTransfer {
                channel,
                mode: "request",
            });
        }

        let step = self.dma.step(channel);
        let mut address = self.dma.base_address(channel) & !0x3;
        let mut remaining = self.dma.remaining(channel)?;

        while remaining > 0 {
            let word = self.ram_read32(address);
            self.gpu.write_gp0(word);

            address = match step {
                Step::Forward => address.wrapping_add(4),
                Step::Backward => address.wrapping_sub(4),
            } & DMA_ADDRESS_MASK;

            remaining -= 1;
        }

        log::debug!("dma{}: request transfer finished", channel);
        Ok(())
    }

    /// Linked-list mode walks GPU command packets: each header holds a
    /// word count in its top byte and the next packet's address below,
    /// terminated by a header with bit 23 set.
    fn dma_transfer_linked_list(&mut self, channel: usize) -> Result<()> {
        if channel != dma::CH_GPU || self.dma.direction(channel) != Direction::FromRam {
            return Err(EmulatorError::DmaUnsupportedTransfer {
                channel,
                mode: "linked-list",
            });
        }

        let mut address = self.dma.base_address(channel) & !0x3;

        loop {
            let header = self.ram_read32(address);
            let size = header >> 24;

            for _ in 0..size {
                address = address.wrapping_add(4) & DMA_ADDRESS_MASK;
                let word = self.ram_read32(address);
                self.gpu.write_gp0(word);
            }

            if header & 0x0080_0000 != 0 {
                break;
            }

            address = header & DMA_ADDRESS_MASK;
        }

        log::debug!("dma{}: linked-list transfer finished", channel);
        Ok(())
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DPCR: u32 = 0x1F80_10F0;
    const DICR: u32 = 0x1F80_10F4;

    const OTC_MADR: u32 = 0x1F80_10E0;
    const OTC_BCR: u32 = 0x1F80_10E4;
    const OTC_CHCR: u32 = 0x1F80_10E8;

    const GPU_MADR: u32 = 0x1F80_10A0;
    const GPU_BCR: u32 = 0x1F80_10A4;
    const GPU_CHCR: u32 = 0x1F80_10A8;

    #[test]
    fn test_ram_read_write_round_trip() {
        let mut bus = Bus::new();

        bus.write32(0x1000, 0xDEAD_BEEF).unwrap();
        assert_eq!(bus.read32(0x1000).unwrap(), 0xDEAD_BEEF);

        // Byte and half-word views of the same bytes (little endian)
        assert_eq!(bus.read8(0x1000).unwrap(), 0xEF);
        assert_eq!(bus.read8(0x1003).unwrap(), 0xDE);
        assert_eq!(bus.read16(0x1000).unwrap(), 0xBEEF);
        assert_eq!(bus.read16(0x1002).unwrap(), 0xDEAD);
    }

    #[test]
    fn test_bios_reads_after_load() {
        let mut bus = Bus::new();

        let mut image = vec![0u8; BIOS_SIZE];
        image[0..4].copy_from_slice(&0x1234_5678u32.to_le_bytes());
        bus.load_bios_image(&image).unwrap();

        assert_eq!(bus.read32(BIOS_START).unwrap(), 0x1234_5678);
        assert_eq!(bus.read16(BIOS_START).unwrap(), 0x5678);
        assert_eq!(bus.read8(BIOS_START + 1).unwrap(), 0x56);
    }

    #[test]
    fn test_bios_size_validation() {
        let mut bus = Bus::new();

        assert!(matches!(
            bus.load_bios_image(&[0u8; 1024]),
            Err(EmulatorError::BiosSize(1024))
        ));
        assert!(bus.load_bios_image(&vec![0u8; BIOS_SIZE + 1]).is_err());
    }

    #[test]
    fn test_bios_load_from_file() {
        use std::io::Write;

        let mut bus = Bus::new();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&vec![0xABu8; BIOS_SIZE]).unwrap();
        bus.load_bios(file.path().to_str().unwrap()).unwrap();
        assert_eq!(bus.read8(BIOS_START).unwrap(), 0xAB);

        // Short file is rejected
        let mut short = tempfile::NamedTempFile::new().unwrap();
        short.write_all(&[0u8; 16]).unwrap();
        assert!(bus.load_bios(short.path().to_str().unwrap()).is_err());
    }

    #[test]
    fn test_bios_writes_fault() {
        let mut bus = Bus::new();

        assert!(matches!(
            bus.write32(BIOS_START, 0),
            Err(EmulatorError::BiosWrite { .. })
        ));
        assert!(bus.write8(BIOS_START, 0).is_err());
        assert!(bus.write16(BIOS_START, 0).is_err());
    }

    #[test]
    fn test_unknown_address_faults() {
        let mut bus = Bus::new();

        assert!(bus.read32(0x0080_0000).is_err(), "past end of RAM");
        assert!(bus.write32(0x0080_0000, 0).is_err());

        // The SPU is the only width-restricted device: half-words only
        assert!(bus.read8(0x1F80_1C00).is_err());
        assert!(bus.read32(0x1F80_1C00).is_err());
        assert!(bus.write8(0x1F80_1C00, 0).is_err());
        assert!(bus.write32(0x1F80_1C00, 0).is_err());
    }

    #[test]
    fn test_stub_regions_decode_at_every_width() {
        let mut bus = Bus::new();

        // CDROM
        assert_eq!(bus.read8(0x1F80_1800).unwrap(), 0);
        assert_eq!(bus.read16(0x1F80_1800).unwrap(), 0);
        assert_eq!(bus.read32(0x1F80_1800).unwrap(), 0);
        bus.write8(0x1F80_1801, 0x55).unwrap();
        bus.write16(0x1F80_1802, 0x5555).unwrap();
        bus.write32(0x1F80_1800, 0x5555_5555).unwrap();

        // EXP1
        assert_eq!(bus.read8(0x1F00_0000).unwrap(), 0);
        assert_eq!(bus.read16(0x1F00_0000).unwrap(), 0);
        assert_eq!(bus.read32(0x1F00_0000).unwrap(), 0);
        bus.write8(0x1F00_0000, 1).unwrap();
        bus.write16(0x1F00_0000, 1).unwrap();
        bus.write32(0x1F00_0000, 1).unwrap();

        // TIMER
        assert_eq!(bus.read8(0x1F80_1100).unwrap(), 0);
        assert_eq!(bus.read16(0x1F80_1104).unwrap(), 0);
        assert_eq!(bus.read32(0x1F80_1108).unwrap(), 0);
        bus.write8(0x1F80_1100, 1).unwrap();
        bus.write16(0x1F80_1104, 1).unwrap();
        bus.write32(0x1F80_1108, 1).unwrap();

        // EXP2 outside the byte-wide DUART path
        assert_eq!(bus.read16(0x1F80_2000).unwrap(), 0);
        assert_eq!(bus.read32(0x1F80_2000).unwrap(), 0);
        bus.write16(0x1F80_2000, 1).unwrap();
        bus.write32(0x1F80_2000, 1).unwrap();
    }

    #[test]
    fn test_word_registers_serve_sub_word_views() {
        let mut bus = Bus::new();

        // GPUSTAT = 0x1C000000: visible through shifted half/byte reads
        assert_eq!(bus.read16(0x1F80_1814).unwrap(), 0x0000);
        assert_eq!(bus.read16(0x1F80_1816).unwrap(), 0x1C00);
        assert_eq!(bus.read8(0x1F80_1817).unwrap(), 0x1C);
        assert_eq!(bus.read8(0x1F80_1810).unwrap(), 0, "GPUREAD byte");

        // Narrow GPU writes are swallowed, not forwarded as commands
        bus.write16(0x1F80_1810, 0x1234).unwrap();
        bus.write8(0x1F80_1810, 0x12).unwrap();
        assert_eq!(bus.gpu().gp0_words(), 0);

        // Narrow DMA accesses decode as stubs and leave registers alone
        assert_eq!(bus.read8(0x1F80_10F0).unwrap(), 0);
        assert_eq!(bus.read16(0x1F80_10F0).unwrap(), 0);
        bus.write16(0x1F80_10F0, 0xFFFF).unwrap();
        bus.write8(0x1F80_10F1, 0xFF).unwrap();
        assert_eq!(bus.read32(0x1F80_10F0).unwrap(), 0x0765_4321, "DPCR untouched");

        // Control stubs accept narrow writes too
        bus.write8(0x1F80_1000, 1).unwrap(); // memctrl
        bus.write16(0x1F80_1060, 1).unwrap(); // ram_size
        bus.write8(0xFFFE_0130, 1).unwrap(); // cachectrl
        bus.write16(0xFFFE_0132, 1).unwrap();
    }

    #[test]
    fn test_irq_sub_word_views() {
        let mut bus = Bus::new();

        bus.irq_mut().assert_irq(Interrupt::VBLANK); // bit 0
        bus.irq_mut().assert_irq(Interrupt::SPU); // bit 9

        assert_eq!(bus.read8(IRQ_STATUS).unwrap(), 0x01);
        assert_eq!(bus.read8(IRQ_STATUS + 1).unwrap(), 0x02);
        assert_eq!(bus.read16(IRQ_STATUS + 2).unwrap(), 0);

        bus.write16(IRQ_MASK, 0x0201).unwrap();
        assert_eq!(bus.read8(IRQ_MASK).unwrap(), 0x01);
        assert_eq!(bus.read8(IRQ_MASK + 1).unwrap(), 0x02);

        // Byte acknowledge clears only VBLANK, leaving the SPU bit
        bus.write8(IRQ_STATUS, 0xFE).unwrap();
        assert_eq!(bus.read32(IRQ_STATUS).unwrap(), 0x200);
        assert!(bus.irq_line());

        // Byte mask update touches only its own byte
        bus.write8(IRQ_MASK + 1, 0x00).unwrap();
        assert_eq!(bus.read32(IRQ_MASK).unwrap(), 0x0001);
    }

    #[test]
    fn test_stubbed_regions() {
        let mut bus = Bus::new();

        assert_eq!(bus.read32(0x1F00_0000).unwrap(), 0, "EXP1 reads 0");
        assert_eq!(bus.read32(0x1F80_1100).unwrap(), 0, "timers read 0");
        assert_eq!(bus.read8(0x1F80_1800).unwrap(), 0, "cdrom reads 0");
        assert_eq!(bus.read32(0x1F80_1814).unwrap(), 0x1C00_0000, "GPUSTAT");
        assert_eq!(bus.read32(0x1F80_1810).unwrap(), 0, "GPUREAD");

        bus.write32(0x1F80_1000, 0x1F00_0000).unwrap(); // memctrl
        bus.write32(0x1F80_1060, 0x0000_0B88).unwrap(); // ram_size
        bus.write32(0xFFFE_0130, 0x0000_1E98).unwrap(); // cachectrl
        bus.write32(0x1F80_1114, 0).unwrap(); // timer mode
    }

    #[test]
    fn test_irq_registers() {
        let mut bus = Bus::new();

        bus.irq_mut().assert_irq(Interrupt::VBLANK);
        bus.irq_mut().assert_irq(Interrupt::SPU);

        assert_eq!(bus.read32(IRQ_STATUS).unwrap(), 0x201);

        bus.write32(IRQ_MASK, 0x201).unwrap();
        assert!(bus.irq_line());

        // Acknowledge VBLANK
        bus.write32(IRQ_STATUS, !1).unwrap();
        assert_eq!(bus.read32(IRQ_STATUS).unwrap(), 0x200);

        // 16-bit acknowledge works the same way
        bus.write16(IRQ_STATUS, !0x200u16 as u16).unwrap();
        assert_eq!(bus.read32(IRQ_STATUS).unwrap(), 0);
        assert!(!bus.irq_line());
    }

    #[test]
    fn test_otc_dma_builds_ordering_table() {
        let mut bus = Bus::new();

        bus.write32(DPCR, 0x0F65_4321).unwrap(); // enable channel 6
        bus.write32(OTC_MADR, 0x0010_0000).unwrap();
        bus.write32(OTC_BCR, 4).unwrap();
        bus.write32(OTC_CHCR, 0x1100_0000).unwrap(); // start + trigger

        assert_eq!(bus.read32(0x0010_0000).unwrap(), 0x000F_FFFC);
        assert_eq!(bus.read32(0x0010_0004).unwrap(), 0x0010_0000);
        assert_eq!(bus.read32(0x0010_0008).unwrap(), 0x0010_0004);
        assert_eq!(bus.read32(0x0010_000C).unwrap(), 0x00FF_FFFF, "terminator");

        // Start bit cleared on completion
        assert_eq!(bus.read32(OTC_CHCR).unwrap() & 0x0100_0000, 0);
    }

    #[test]
    fn test_gpu_request_dma_streams_words() {
        let mut bus = Bus::new();

        for i in 0..8u32 {
            bus.write32(0x2000 + i * 4, 0x0100_0000 + i).unwrap();
        }

        bus.write32(DPCR, 0x0765_4B21).unwrap(); // enable channel 2
        bus.write32(GPU_MADR, 0x2000).unwrap();
        bus.write32(GPU_BCR, 0x0002_0004).unwrap(); // 2 blocks of 4
        bus.write32(GPU_CHCR, 0x0100_0201).unwrap(); // start, request, from RAM

        assert_eq!(bus.gpu().gp0_words(), 8);
        assert_eq!(bus.read32(GPU_CHCR).unwrap() & 0x0100_0000, 0);
    }

    #[test]
    fn test_gpu_linked_list_dma_walks_packets() {
        let mut bus = Bus::new();

        // Packet A at 0x1000: 2 words, links to B at 0x2000
        bus.write32(0x1000, 0x0200_2000).unwrap();
        bus.write32(0x1004, 0xA0A0_A0A0).unwrap();
        bus.write32(0x1008, 0xB0B0_B0B0).unwrap();
        // Packet B: 1 word, terminator
        bus.write32(0x2000, 0x01FF_FFFF).unwrap();
        bus.write32(0x2004, 0xC0C0_C0C0).unwrap();

        bus.write32(DPCR, 0x0765_4B21).unwrap();
        bus.write32(GPU_MADR, 0x1000).unwrap();
        bus.write32(GPU_CHCR, 0x0100_0401).unwrap(); // start, linked-list, from RAM

        assert_eq!(bus.gpu().gp0_words(), 3);
    }

    #[test]
    fn test_gpu_dma_to_ram_faults() {
        let mut bus = Bus::new();

        bus.write32(DPCR, 0x0765_4B21).unwrap();
        bus.write32(GPU_MADR, 0x1000).unwrap();
        bus.write32(GPU_BCR, 0x0001_0001).unwrap();

        // Request mode toward RAM is not modeled
        assert!(bus.write32(GPU_CHCR, 0x0100_0200).is_err());
    }

    #[test]
    fn test_dma_completion_interrupt() {
        let mut bus = Bus::new();

        bus.write32(DPCR, 0x0F65_4321).unwrap();
        // Unmask channel 6 in DICR with master enable
        bus.write32(DICR, (1 << 22) | (1 << 23)).unwrap();
        // Let the DMA interrupt through the controller
        bus.write32(IRQ_MASK, Interrupt::DMA.bits()).unwrap();

        bus.write32(OTC_MADR, 0x100).unwrap();
        bus.write32(OTC_BCR, 4).unwrap();
        bus.write32(OTC_CHCR, 0x1100_0000).unwrap();

        assert!(bus.irq_line(), "completion asserted the DMA interrupt");
        assert_ne!(bus.read32(DICR).unwrap() & (1 << 31), 0);
    }

    #[test]
    fn test_spu_registers_via_bus() {
        let mut bus = Bus::new();

        bus.write16(0x1F80_1DA6, 0x0100).unwrap();
        for value in [0xAAAAu16, 0xBBBB, 0xCCCC] {
            bus.write16(0x1F80_1DA8, value).unwrap();
        }
        bus.write16(0x1F80_1DAA, 0x0010).unwrap();

        bus.spu_mut().tick();

        assert_eq!(&bus.spu().ram()[0x800..0x806], &[0xAA, 0xAA, 0xBB, 0xBB, 0xCC, 0xCC]);
    }

    #[test]
    fn test_exp2_tty_via_bus() {
        let mut bus = Bus::new();

        for &byte in b"psx kernel\n" {
            bus.write8(0x1F80_2023, byte).unwrap();
        }

        assert_eq!(bus.take_tty_lines(), vec!["psx kernel"]);
    }

    #[test]
    fn test_debug_access_is_fault_free() {
        let mut bus = Bus::new();

        assert_eq!(bus.debug_read32(0x1F80_1070), 0, "unknown regions read 0");
        assert_eq!(bus.debug_read8(0xFFFE_0130), 0);

        bus.debug_write32(0x80, 0x5555_5555);
        assert_eq!(bus.debug_read32(0x80), 0x5555_5555);

        // Writes outside RAM are dropped, not faulted
        bus.debug_write32(BIOS_START, 0x1234_5678);
        assert_eq!(bus.debug_read32(BIOS_START), 0);
    }
}
