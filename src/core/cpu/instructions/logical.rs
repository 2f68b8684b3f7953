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

//! Bitwise instructions

use super::super::decode::{imm, rd, rs, rt};
use super::super::CPU;
use crate::core::error::Result;

impl CPU {
    /// AND: rd = rs & rt
    pub(super) fn op_and(&mut self, instruction: u32) -> Result<()> {
        let result = self.reg(rs(instruction)) & self.reg(rt(instruction));
        self.set_reg(rd(instruction), result);
        Ok(())
    }

    /// OR: rd = rs | rt
    pub(super) fn op_or(&mut self, instruction: u32) -> Result<()> {
        let result = self.reg(rs(instruction)) | self.reg(rt(instruction));
        self.set_reg(rd(instruction), result);
        Ok(())
    }

    /// XOR: rd = rs ^ rt
    pub(super) fn op_xor(&mut self, instruction: u32) -> Result<()> {
        let result = self.reg(rs(instruction)) ^ self.reg(rt(instruction));
        self.set_reg(rd(instruction), result);
        Ok(())
    }

    /// NOR: rd = !(rs | rt)
    pub(super) fn op_nor(&mut self, instruction: u32) -> Result<()> {
        let result = !(self.reg(rs(instruction)) | self.reg(rt(instruction)));
        self.set_reg(rd(instruction), result);
        Ok(())
    }

    /// ANDI: rt = rs & zero_extend(imm)
    pub(super) fn op_andi(&mut self, instruction: u32) -> Result<()> {
        let result = self.reg(rs(instruction)) & imm(instruction);
        self.set_reg(rt(instruction), result);
        Ok(())
    }

    /// ORI: rt = rs | zero_extend(imm)
    pub(super) fn op_ori(&mut self, instruction: u32) -> Result<()> {
        let result = self.reg(rs(instruction)) | imm(instruction);
        self.set_reg(rt(instruction), result);
        Ok(())
    }

    /// XORI: rt = rs ^ zero_extend(imm)
    pub(super) fn op_xori(&mut self, instruction: u32) -> Result<()> {
        let result = self.reg(rs(instruction)) ^ imm(instruction);
        self.set_reg(rt(instruction), result);
        Ok(())
    }

    /// LUI: rt = imm << 16
    pub(super) fn op_lui(&mut self, instruction: u32) -> Result<()> {
        self.set_reg(rt(instruction), imm(instruction) << 16);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::core::cpu::CPU;
    use crate::core::memory::Bus;

    #[test]
    fn test_bitwise_ops() {
        let mut cpu = CPU::new();
        let mut bus = Bus::new();

        cpu.set_reg(1, 0xF0F0_1234);
        cpu.set_reg(2, 0x0FF0_4321);

        cpu.execute(0x0022_1824, &mut bus).unwrap(); // AND
        assert_eq!(cpu.reg(3), 0xF0F0_1234 & 0x0FF0_4321);

        cpu.execute(0x0022_1825, &mut bus).unwrap(); // OR
        assert_eq!(cpu.reg(3), 0xF0F0_1234 | 0x0FF0_4321);

        cpu.execute(0x0022_1826, &mut bus).unwrap(); // XOR
        assert_eq!(cpu.reg(3), 0xF0F0_1234 ^ 0x0FF0_4321);

        cpu.execute(0x0022_1827, &mut bus).unwrap(); // NOR
        assert_eq!(cpu.reg(3), !(0xF0F0_1234 | 0x0FF0_4321));
    }

    #[test]
    fn test_immediates_zero_extend() {
        let mut cpu = CPU::new();
        let mut bus = Bus::new();

        cpu.set_reg(1, 0xFFFF_0000);

        cpu.execute(0x3422_8000, &mut bus).unwrap(); // ORI $2, $1, 0x8000
        assert_eq!(cpu.reg(2), 0xFFFF_8000, "ORI must not sign-extend");

        cpu.execute(0x3022_8000, &mut bus).unwrap(); // ANDI $2, $1, 0x8000
        assert_eq!(cpu.reg(2), 0x0000_0000);

        cpu.execute(0x3822_FFFF, &mut bus).unwrap(); // XORI $2, $1, 0xFFFF
        assert_eq!(cpu.reg(2), 0xFFFF_FFFF);
    }

    #[test]
    fn test_lui() {
        let mut cpu = CPU::new();
        let mut bus = Bus::new();

        cpu.execute(0x3C01_1F80, &mut bus).unwrap(); // LUI $1, 0x1F80
        assert_eq!(cpu.reg(1), 0x1F80_0000);
    }
}
