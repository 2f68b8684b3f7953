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

//! CPU (MIPS R3000A) emulation
//!
//! One [`CPU::step`] call executes exactly one instruction. The
//! branch-delay slot is modeled with a three-PC rotation: `current_pc`
//! is the instruction being executed, `pc` the next fetch address and
//! `next_pc` the one after it. A branch only rewrites `next_pc`, so the
//! instruction in the delay slot still executes before the target takes
//! effect.

use crate::core::error::Result;
use crate::core::memory::Bus;

mod cop0;
mod decode;
mod disassembler;
mod instructions;

use cop0::COP0;
pub use cop0::ExceptionCause;
pub use disassembler::Disassembler;

/// CPU clock frequency in Hz.
pub const R3000_FREQ: u32 = 33_868_800;

/// Number of GPR slots: 32 architectural registers plus HI and LO.
pub const NR_REGISTERS: usize = 34;

/// GPR slot holding HI (multiply/divide high word).
pub const REG_HI: usize = 32;

/// GPR slot holding LO (multiply/divide low word).
pub const REG_LO: usize = 33;

/// Power-on program counter (BIOS entry point).
const RESET_VECTOR: u32 = 0xBFC0_0000;

/// Per-segment physical address masks, indexed by address bits 31-29.
/// KUSEG and KSEG2 map through unchanged, KSEG0/KSEG1 strip the segment
/// bits.
const SEGMENT_MASKS: [u32; 8] = [
    0xFFFF_FFFF,
    0xFFFF_FFFF,
    0xFFFF_FFFF,
    0xFFFF_FFFF, // KUSEG
    0x7FFF_FFFF, // KSEG0
    0x1FFF_FFFF, // KSEG1
    0xFFFF_FFFF,
    0xFFFF_FFFF, // KSEG2
];

pub struct CPU {
    /// Address of the next instruction to fetch.
    pc: u32,

    /// Fetch address after `pc`. Equal to `pc + 4` except inside a
    /// branch-delay slot, where it holds the branch target.
    next_pc: u32,

    /// Address of the instruction currently executing; exception return
    /// addresses are derived from it.
    current_pc: u32,

    /// General purpose registers; slot 0 is hard-wired to zero, slots
    /// 32/33 are HI/LO.
    regs: [u32; NR_REGISTERS],

    /// Set by the branch/jump instruction currently executing.
    branch: bool,

    /// The previous instruction was a branch/jump, i.e. the current one
    /// sits in its delay slot.
    branch_delay: bool,

    /// Coprocessor 0 (System Control Unit)
    cop0: COP0,
}

impl CPU {
    pub fn new() -> Self {
        let mut cpu = Self {
            pc: 0,
            next_pc: 0,
            current_pc: 0,
            regs: [0u32; NR_REGISTERS],
            branch: false,
            branch_delay: false,
            cop0: COP0::new(),
        };

        cpu.hard_reset();

        cpu
    }

    /// Power-cycle the CPU: zero the register file and COP0, then take
    /// the soft-reset path.
    pub fn hard_reset(&mut self) {
        self.cop0.hard_reset();
        self.regs = [0u32; NR_REGISTERS];

        self.soft_reset();
    }

    /// Restart execution at the reset vector without touching the
    /// register file. COP0 re-enters the boot configuration and latches
    /// the interrupted address into EPC.
    pub fn soft_reset(&mut self) {
        self.cop0.soft_reset(self.current_pc);

        self.pc = RESET_VECTOR;
        self.current_pc = RESET_VECTOR;
        self.next_pc = self.pc.wrapping_add(4);

        self.branch = false;
        self.branch_delay = false;
    }

    /// Read a GPR slot. Slot 0 always reads zero.
    #[inline(always)]
    pub fn reg(&self, index: usize) -> u32 {
        self.regs[index]
    }

    /// Write a GPR slot. Writes to slot 0 are dropped.
    #[inline(always)]
    pub fn set_reg(&mut self, index: usize, value: u32) {
        if index != 0 {
            self.regs[index] = value;
        }
    }

    /// Redirect execution, e.g. when a host loads an executable image.
    /// Any in-flight branch is abandoned.
    pub fn set_pc(&mut self, pc: u32) {
        self.pc = pc;
        self.current_pc = pc;
        self.next_pc = pc.wrapping_add(4);

        self.branch = false;
        self.branch_delay = false;
    }

    pub fn pc(&self) -> u32 {
        self.pc
    }

    pub fn next_pc(&self) -> u32 {
        self.next_pc
    }

    pub fn current_pc(&self) -> u32 {
        self.current_pc
    }

    /// COP0 status register (debug view).
    pub fn sr(&self) -> u32 {
        self.cop0.sr()
    }

    /// COP0 cause register (debug view).
    pub fn cause(&self) -> u32 {
        self.cop0.cause()
    }

    /// COP0 exception program counter (debug view).
    pub fn epc(&self) -> u32 {
        self.cop0.epc()
    }

    /// Apply the per-segment physical mask to a virtual address.
    #[inline(always)]
    pub fn translate_address(address: u32) -> u32 {
        address & SEGMENT_MASKS[(address >> 29) as usize]
    }

    /// Execute one instruction.
    ///
    /// Pending interrupts are sampled first; taking one replaces the
    /// instruction for this step. A misaligned PC raises AddressErrorLoad
    /// the same way.
    pub fn step(&mut self, bus: &mut Bus) -> Result<()> {
        if self.poll_interrupt(bus) {
            return Ok(());
        }

        if self.pc & 0x3 != 0 {
            self.exception(ExceptionCause::AddressErrorLoad);
            return Ok(());
        }

        // Fetches ignore cache isolation
        let instruction = bus.read32(Self::translate_address(self.pc))?;

        self.current_pc = self.pc;
        self.pc = self.next_pc;
        self.next_pc = self.next_pc.wrapping_add(4);

        self.branch_delay = self.branch;
        self.branch = false;

        self.execute(instruction, bus)
    }

    /// Sample the interrupt line; returns true when an Interrupt
    /// exception was taken instead of an instruction.
    fn poll_interrupt(&mut self, bus: &Bus) -> bool {
        let asserted = bus.irq_line();
        self.cop0.set_irq_line(asserted);

        if !(asserted && self.cop0.hw_interrupts_enabled()) {
            return false;
        }

        // The instruction at `pc` has not executed; it is the return
        // address. If it sits in a delay slot the branch is re-run.
        self.current_pc = self.pc;
        self.branch_delay = self.branch;
        self.branch = false;

        self.exception(ExceptionCause::Interrupt);

        true
    }

    /// Enter an exception: update COP0 and redirect execution to the
    /// handler. Both branch flags are cleared so stale delay-slot state
    /// cannot leak into the handler.
    pub(crate) fn exception(&mut self, cause: ExceptionCause) {
        let epc = if self.branch_delay {
            self.current_pc.wrapping_sub(4)
        } else {
            self.current_pc
        };

        log::debug!("cpu: exception {:?}, epc=0x{:08X}", cause, epc);

        let vector = self.cop0.enter_exception(cause, self.branch_delay, epc);

        self.pc = vector;
        self.next_pc = vector.wrapping_add(4);

        self.branch = false;
        self.branch_delay = false;
    }

    // Data-side memory accessors. All of them translate the virtual
    // address and honor cache isolation (reads as zero, writes dropped).

    pub(crate) fn load8(&self, bus: &mut Bus, address: u32) -> Result<u8> {
        if self.cop0.cache_isolated() {
            return Ok(0);
        }

        bus.read8(Self::translate_address(address))
    }

    pub(crate) fn load16(&self, bus: &mut Bus, address: u32) -> Result<u16> {
        if self.cop0.cache_isolated() {
            return Ok(0);
        }

        bus.read16(Self::translate_address(address))
    }

    pub(crate) fn load32(&self, bus: &mut Bus, address: u32) -> Result<u32> {
        if self.cop0.cache_isolated() {
            return Ok(0);
        }

        bus.read32(Self::translate_address(address))
    }

    pub(crate) fn store8(&self, bus: &mut Bus, address: u32, value: u8) -> Result<()> {
        if self.cop0.cache_isolated() {
            return Ok(());
        }

        bus.write8(Self::translate_address(address), value)
    }

    pub(crate) fn store16(&self, bus: &mut Bus, address: u32, value: u16) -> Result<()> {
        if self.cop0.cache_isolated() {
            return Ok(());
        }

        bus.write16(Self::translate_address(address), value)
    }

    pub(crate) fn store32(&self, bus: &mut Bus, address: u32, value: u32) -> Result<()> {
        if self.cop0.cache_isolated() {
            return Ok(());
        }

        bus.write32(Self::translate_address(address), value)
    }
}

impl Default for CPU {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_bus() -> Bus {
        Bus::new()
    }

    /// Place a program in RAM and point the CPU at it through KSEG0.
    fn boot_in_ram(cpu: &mut CPU, bus: &mut Bus, program: &[u32]) {
        for (i, &word) in program.iter().enumerate() {
            bus.write32(i as u32 * 4, word).unwrap();
        }
        cpu.pc = 0x8000_0000;
        cpu.current_pc = cpu.pc;
        cpu.next_pc = cpu.pc.wrapping_add(4);
    }

    #[test]
    fn test_reset_state() {
        let cpu = CPU::new();

        assert_eq!(cpu.pc(), 0xBFC0_0000);
        assert_eq!(cpu.next_pc(), 0xBFC0_0004);

        for i in 0..NR_REGISTERS {
            assert_eq!(cpu.reg(i), 0);
        }

        // SR.BEV and SR.TS set by the reset path
        assert_ne!(cpu.sr() & (1 << 22), 0, "BEV");
        assert_ne!(cpu.sr() & (1 << 21), 0, "TS");
        // Kernel mode, interrupts off
        assert_eq!(cpu.sr() & 0x3, 0);
    }

    #[test]
    fn test_gpr0_stays_zero() {
        let mut cpu = CPU::new();

        cpu.set_reg(0, 0xDEAD_BEEF);
        assert_eq!(cpu.reg(0), 0);

        cpu.set_reg(1, 0xDEAD_BEEF);
        assert_eq!(cpu.reg(1), 0xDEAD_BEEF);
    }

    #[test]
    fn test_translate_address() {
        // KUSEG: identity
        assert_eq!(CPU::translate_address(0x0000_1000), 0x0000_1000);
        // KSEG0: strip bit 31
        assert_eq!(CPU::translate_address(0x8000_1000), 0x0000_1000);
        // KSEG1: strip bits 31-29
        assert_eq!(CPU::translate_address(0xA000_1000), 0x0000_1000);
        assert_eq!(CPU::translate_address(0xBFC0_0000), 0x1FC0_0000);
        // KSEG2: identity
        assert_eq!(CPU::translate_address(0xFFFE_0130), 0xFFFE_0130);
    }

    #[test]
    fn test_sequential_pc_advance() {
        let mut cpu = CPU::new();
        let mut bus = test_bus();

        // ADDIU $2, $1, 0x10 with $1 = 0x1000
        cpu.set_reg(1, 0x0000_1000);
        boot_in_ram(&mut cpu, &mut bus, &[0x2422_0010]);

        let next_pc_before = cpu.next_pc();
        cpu.step(&mut bus).unwrap();

        assert_eq!(cpu.reg(2), 0x0000_1010);
        assert_eq!(cpu.pc(), next_pc_before);
        assert_eq!(cpu.next_pc(), next_pc_before.wrapping_add(4));
    }

    #[test]
    fn test_branch_delay_slot() {
        let mut cpu = CPU::new();
        let mut bus = test_bus();

        // BEQ $0, $0, over one instruction; ADDIU $1, $0, 7 in the delay
        // slot; ADDIU $1, $0, 9 in the branch shadow. The delay slot
        // executes, the shadowed instruction is skipped.
        boot_in_ram(
            &mut cpu,
            &mut bus,
            &[0x1000_0002, 0x2401_0007, 0x2401_0009, 0x0000_0000],
        );

        let base = cpu.pc();

        cpu.step(&mut bus).unwrap(); // BEQ
        assert_eq!(cpu.pc(), base + 4, "delay slot is fetched next");
        assert_eq!(cpu.next_pc(), base + 12, "branch target latched");

        cpu.step(&mut bus).unwrap(); // delay slot
        assert_eq!(cpu.reg(1), 7);
        assert_eq!(cpu.pc(), base + 12, "landed past the skipped instruction");

        cpu.step(&mut bus).unwrap();
        assert_eq!(cpu.reg(1), 7, "skipped instruction never executed");
    }

    #[test]
    fn test_overflow_exception_vector_and_epc() {
        let mut cpu = CPU::new();
        let mut bus = test_bus();

        // ADDI $2, $1, 1 with $1 = INT32_MAX
        cpu.set_reg(1, 0x7FFF_FFFF);
        boot_in_ram(&mut cpu, &mut bus, &[0x2022_0001]);
        let faulting_pc = cpu.pc();

        cpu.step(&mut bus).unwrap();

        assert_eq!((cpu.cause() >> 2) & 0x1F, 0xC, "ExCode = Overflow");
        assert_eq!(cpu.epc(), faulting_pc);
        // SR.BEV is set after reset, so the ROM vector is used
        assert_eq!(cpu.pc(), 0xBFC0_0180);
        assert_eq!(cpu.next_pc(), 0xBFC0_0184);
        assert_eq!(cpu.reg(2), 0, "destination unmodified on overflow");
    }

    #[test]
    fn test_exception_in_delay_slot() {
        let mut cpu = CPU::new();
        let mut bus = test_bus();

        // J +0; SYSCALL in the delay slot
        cpu.set_reg(1, 0);
        boot_in_ram(&mut cpu, &mut bus, &[0x0800_0008, 0x0000_000C]);
        let branch_pc = cpu.pc();

        cpu.step(&mut bus).unwrap(); // J
        cpu.step(&mut bus).unwrap(); // SYSCALL in delay slot

        assert_eq!((cpu.cause() >> 2) & 0x1F, 0x8, "ExCode = Syscall");
        assert_eq!(cpu.epc(), branch_pc, "EPC points at the branch");
        assert_ne!(cpu.cause() & (1 << 31), 0, "CAUSE.BD set");
    }

    #[test]
    fn test_rfe_restores_mode_stack() {
        let mut cpu = CPU::new();
        let mut bus = test_bus();

        // Run with user-visible mode bits set so the stack shift shows up
        assert!(cpu.cop0.write(12, cpu.sr() | 0x3));

        boot_in_ram(&mut cpu, &mut bus, &[0x0000_000C]);
        let sr_mode_before = cpu.sr() & 0x3F;

        cpu.step(&mut bus).unwrap(); // SYSCALL
        assert_eq!(cpu.sr() & 0x3F, (sr_mode_before << 2) & 0x3F);

        // Execute the handler's RFE out of RAM
        bus.write32(0x100, 0x4200_0010).unwrap();
        cpu.pc = 0x8000_0100;
        cpu.next_pc = cpu.pc + 4;

        cpu.step(&mut bus).unwrap();
        assert_eq!(cpu.sr() & 0x3F, sr_mode_before);
    }

    #[test]
    fn test_misaligned_pc_faults() {
        let mut cpu = CPU::new();
        let mut bus = test_bus();

        cpu.pc = 0x8000_0002;
        cpu.current_pc = cpu.pc;
        cpu.next_pc = cpu.pc + 4;

        cpu.step(&mut bus).unwrap();

        assert_eq!((cpu.cause() >> 2) & 0x1F, 0x4, "ExCode = AddressErrorLoad");
        assert_eq!(cpu.pc(), 0xBFC0_0180);
    }

    #[test]
    fn test_cache_isolation_gates_data_access() {
        let mut cpu = CPU::new();
        let mut bus = test_bus();

        bus.write32(0x40, 0x1234_5678).unwrap();

        // Turn on SR.ISC
        let sr = cpu.sr() | (1 << 16);
        assert!(cpu.cop0.write(12, sr));

        assert_eq!(cpu.load32(&mut bus, 0x40).unwrap(), 0, "isolated read is 0");
        cpu.store32(&mut bus, 0x40, 0xAAAA_AAAA).unwrap();

        // Turn isolation back off: the write was discarded
        assert!(cpu.cop0.write(12, sr & !(1 << 16)));
        assert_eq!(cpu.load32(&mut bus, 0x40).unwrap(), 0x1234_5678);
    }

    #[test]
    fn test_interrupt_taken_when_enabled() {
        use crate::core::interrupt::Interrupt;

        let mut cpu = CPU::new();
        let mut bus = test_bus();

        boot_in_ram(&mut cpu, &mut bus, &[0x0000_0000, 0x0000_0000]);
        let resume_pc = cpu.pc();

        // Unmask VBLANK in the controller and IM2+IEC in SR
        bus.irq_mut().write_mask(Interrupt::VBLANK.bits());
        bus.irq_mut().assert_irq(Interrupt::VBLANK);
        assert!(cpu.cop0.write(12, cpu.sr() | (1 << 10) | 1));

        cpu.step(&mut bus).unwrap();

        assert_eq!((cpu.cause() >> 2) & 0x1F, 0x0, "ExCode = Interrupt");
        assert_eq!(cpu.epc(), resume_pc);
        assert_ne!(cpu.cause() & (1 << 10), 0, "line mirrored into IP2");
    }

    proptest::proptest! {
        /// GPR slot 0 reads zero after any instruction sequence,
        /// including ones that fault on the bus or in COP0.
        #[test]
        fn prop_gpr0_stays_zero(words in proptest::collection::vec(proptest::prelude::any::<u32>(), 1..64)) {
            let mut cpu = CPU::new();
            let mut bus = Bus::new();

            for word in words {
                let _ = cpu.execute(word, &mut bus);
                proptest::prop_assert_eq!(cpu.reg(0), 0);
            }
        }
    }

    #[test]
    fn test_interrupt_held_off_while_masked() {
        use crate::core::interrupt::Interrupt;

        let mut cpu = CPU::new();
        let mut bus = test_bus();

        boot_in_ram(&mut cpu, &mut bus, &[0x0000_0000]);

        bus.irq_mut().write_mask(Interrupt::VBLANK.bits());
        bus.irq_mut().assert_irq(Interrupt::VBLANK);
        // SR.IEC stays clear

        let pc = cpu.pc();
        cpu.step(&mut bus).unwrap();
        assert_eq!(cpu.pc(), pc + 4, "no exception taken");
    }
}
