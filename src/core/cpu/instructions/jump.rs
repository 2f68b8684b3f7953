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

//! Unconditional jump instructions
//!
//! J/JAL form their target from the executing instruction's own address
//! (`current_pc`); the link value is the address after the delay slot,
//! which `next_pc` holds at execution time.

use super::super::decode::{rd, rs, target};
use super::super::CPU;
use crate::core::error::Result;

impl CPU {
    /// Redirect execution to an absolute address after the delay slot.
    pub(super) fn jump_to(&mut self, address: u32) {
        self.branch = true;
        self.next_pc = address;
    }

    /// J: jump within the current 256 MiB segment.
    pub(super) fn op_j(&mut self, instruction: u32) -> Result<()> {
        let address = (self.current_pc & 0xF000_0000) | (target(instruction) << 2);
        self.jump_to(address);
        Ok(())
    }

    /// JAL: like J, linking through $ra.
    pub(super) fn op_jal(&mut self, instruction: u32) -> Result<()> {
        self.set_reg(31, self.next_pc);

        let address = (self.current_pc & 0xF000_0000) | (target(instruction) << 2);
        self.jump_to(address);
        Ok(())
    }

    /// JR: jump to the address in rs.
    pub(super) fn op_jr(&mut self, instruction: u32) -> Result<()> {
        self.jump_to(self.reg(rs(instruction)));
        Ok(())
    }

    /// JALR: jump to rs, linking through rd.
    pub(super) fn op_jalr(&mut self, instruction: u32) -> Result<()> {
        self.set_reg(rd(instruction), self.next_pc);
        self.jump_to(self.reg(rs(instruction)));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::core::cpu::CPU;
    use crate::core::memory::Bus;

    fn step_one(cpu: &mut CPU, bus: &mut Bus, instruction: u32) {
        bus.write32(0, instruction).unwrap();
        cpu.set_pc(0x8000_0000);
        cpu.step(bus).unwrap();
    }

    #[test]
    fn test_j_target_in_segment() {
        let mut cpu = CPU::new();
        let mut bus = Bus::new();

        step_one(&mut cpu, &mut bus, 0x0800_0100); // J 0x400
        assert_eq!(cpu.next_pc(), 0x8000_0400);
    }

    #[test]
    fn test_jal_links_ra() {
        let mut cpu = CPU::new();
        let mut bus = Bus::new();

        step_one(&mut cpu, &mut bus, 0x0C00_0100); // JAL 0x400
        assert_eq!(cpu.next_pc(), 0x8000_0400);
        assert_eq!(cpu.reg(31), 0x8000_0008, "return past the delay slot");
    }

    #[test]
    fn test_jr_absolute() {
        let mut cpu = CPU::new();
        let mut bus = Bus::new();

        cpu.set_reg(4, 0xBFC0_1234);
        step_one(&mut cpu, &mut bus, 0x0080_0008); // JR $4
        assert_eq!(cpu.next_pc(), 0xBFC0_1234);
    }

    #[test]
    fn test_jalr_links_named_rd() {
        let mut cpu = CPU::new();
        let mut bus = Bus::new();

        cpu.set_reg(4, 0x8000_2000);
        step_one(&mut cpu, &mut bus, 0x0080_5809); // JALR $11, $4
        assert_eq!(cpu.next_pc(), 0x8000_2000);
        assert_eq!(cpu.reg(11), 0x8000_0008);
    }
}
