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

//! System integration
//!
//! Ties the CPU and the bus together and owns the frame loop. The host
//! drives everything through [`System::step`] or [`System::run_frame`]
//! on a single thread; the audio backend's callback is the only other
//! actor and only touches the sample ring buffer.

#[cfg(feature = "audio")]
use crate::core::audio::AudioBackend;
use crate::core::cpu::{Disassembler, CPU, R3000_FREQ};
use crate::core::error::Result;
use crate::core::interrupt::Interrupt;
use crate::core::memory::Bus;

/// Display refresh rate the frame loop targets.
pub const REFRESH_RATE: u32 = 60;

/// CPU cycles executed per [`System::run_frame`].
pub const CYCLES_PER_FRAME: u32 = R3000_FREQ / REFRESH_RATE;

/// Complete console: CPU, bus (with all devices) and frame bookkeeping.
pub struct System {
    cpu: CPU,
    bus: Bus,

    /// Total cycles executed since the last hard reset.
    cycles: u64,

    /// Audio output backend, opened on request.
    #[cfg(feature = "audio")]
    audio: Option<AudioBackend>,
}

impl System {
    pub fn new() -> Self {
        Self {
            cpu: CPU::new(),
            bus: Bus::new(),
            cycles: 0,
            #[cfg(feature = "audio")]
            audio: None,
        }
    }

    /// Load a BIOS ROM from a file (must be exactly 512 KiB).
    pub fn load_bios(&mut self, path: &str) -> Result<()> {
        self.bus.load_bios(path)
    }

    /// Load a BIOS ROM already in memory.
    pub fn load_bios_image(&mut self, image: &[u8]) -> Result<()> {
        self.bus.load_bios_image(image)
    }

    /// Open the default audio device and wire the SPU into it. Failure
    /// only disables sound.
    #[cfg(feature = "audio")]
    pub fn start_audio(&mut self) {
        match AudioBackend::new() {
            Ok(backend) => {
                self.bus.spu_mut().set_audio_output(backend.ring());
                self.audio = Some(backend);
                log::info!("system: audio output started");
            }
            Err(e) => {
                log::warn!("system: audio disabled: {}", e);
            }
        }
    }

    /// Power-cycle the console: RAM and sound RAM are wiped, the CPU
    /// restarts at the reset vector. The BIOS image survives.
    pub fn hard_reset(&mut self) {
        self.cpu.hard_reset();
        self.bus.hard_reset();
        self.cycles = 0;
    }

    /// Restart execution at the reset vector without touching memory.
    pub fn soft_reset(&mut self) {
        self.cpu.soft_reset();
    }

    /// Execute one instruction and advance the SPU clock.
    pub fn step(&mut self) -> Result<()> {
        self.cpu.step(&mut self.bus)?;
        self.bus.spu_mut().step();

        self.cycles += 1;
        Ok(())
    }

    /// Run one video frame's worth of cycles, then raise VBLANK.
    pub fn run_frame(&mut self) -> Result<()> {
        for _ in 0..CYCLES_PER_FRAME {
            self.step()?;
        }

        self.bus.irq_mut().assert_irq(Interrupt::VBLANK);
        Ok(())
    }

    /// Total cycles executed since the last hard reset.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn cpu(&self) -> &CPU {
        &self.cpu
    }

    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut Bus {
        &mut self.bus
    }

    // Memory access with CPU address translation; used by tests and
    // debug front-ends poking guest addresses.

    pub fn read_memory8(&mut self, address: u32) -> Result<u8> {
        self.bus.read8(CPU::translate_address(address))
    }

    pub fn read_memory16(&mut self, address: u32) -> Result<u16> {
        self.bus.read16(CPU::translate_address(address))
    }

    pub fn read_memory32(&mut self, address: u32) -> Result<u32> {
        self.bus.read32(CPU::translate_address(address))
    }

    pub fn write_memory8(&mut self, address: u32, value: u8) -> Result<()> {
        self.bus.write8(CPU::translate_address(address), value)
    }

    pub fn write_memory16(&mut self, address: u32, value: u16) -> Result<()> {
        self.bus.write16(CPU::translate_address(address), value)
    }

    pub fn write_memory32(&mut self, address: u32, value: u32) -> Result<()> {
        self.bus.write32(CPU::translate_address(address), value)
    }

    // Fault-free debug accessors for memory-inspector UIs

    pub fn debug_read8(&self, address: u32) -> u8 {
        self.bus.debug_read8(CPU::translate_address(address))
    }

    pub fn debug_read32(&self, address: u32) -> u32 {
        self.bus.debug_read32(CPU::translate_address(address))
    }

    pub fn debug_write32(&mut self, address: u32, value: u32) {
        self.bus.debug_write32(CPU::translate_address(address), value)
    }

    /// Disassemble the instruction at a guest address.
    pub fn disassemble(&self, address: u32) -> String {
        Disassembler::disassemble(self.debug_read32(address), address)
    }

    /// Main RAM view.
    pub fn ram(&self) -> &[u8] {
        self.bus.ram()
    }

    /// BIOS ROM view.
    pub fn bios(&self) -> &[u8] {
        self.bus.bios()
    }

    /// Sound RAM view.
    pub fn spu_ram(&self) -> &[u8] {
        self.bus.spu().ram()
    }

    /// Drain the EXP2 TTY line queue.
    pub fn take_tty_lines(&mut self) -> Vec<String> {
        self.bus.take_tty_lines()
    }
}

impl Default for System {
    fn default() -> Self {
        Self::new()
    }
}
