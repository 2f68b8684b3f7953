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

//! Instruction execution
//!
//! One file per instruction family; each adds `op_*` methods to [`CPU`].
//! Dispatch is a two-level match on the primary opcode and, for SPECIAL
//! and COP0 encodings, the secondary field. Anything that falls through
//! raises ReservedInstruction and continues.

mod arithmetic;
mod branch;
mod cop0;
mod exception;
mod jump;
mod load_store;
mod logical;
mod multiply;
mod shift;

use super::decode::{funct, opcode, rs, rt};
use super::{ExceptionCause, CPU};
use crate::core::error::Result;
use crate::core::memory::Bus;

impl CPU {
    /// Decode and execute one fetched instruction word.
    pub(super) fn execute(&mut self, instruction: u32, bus: &mut Bus) -> Result<()> {
        match opcode(instruction) {
            0x00 => self.execute_special(instruction, bus),
            0x01 => self.op_bcond(instruction),
            0x02 => self.op_j(instruction),
            0x03 => self.op_jal(instruction),
            0x04 => self.op_beq(instruction),
            0x05 => self.op_bne(instruction),
            0x06 => self.op_blez(instruction),
            0x07 => self.op_bgtz(instruction),
            0x08 => self.op_addi(instruction),
            0x09 => self.op_addiu(instruction),
            0x0A => self.op_slti(instruction),
            0x0B => self.op_sltiu(instruction),
            0x0C => self.op_andi(instruction),
            0x0D => self.op_ori(instruction),
            0x0E => self.op_xori(instruction),
            0x0F => self.op_lui(instruction),
            0x10 => self.execute_cop0(instruction),
            0x20 => self.op_lb(instruction, bus),
            0x21 => self.op_lh(instruction, bus),
            0x22 => self.op_lwl(instruction, bus),
            0x23 => self.op_lw(instruction, bus),
            0x24 => self.op_lbu(instruction, bus),
            0x25 => self.op_lhu(instruction, bus),
            0x26 => self.op_lwr(instruction, bus),
            0x28 => self.op_sb(instruction, bus),
            0x29 => self.op_sh(instruction, bus),
            0x2A => self.op_swl(instruction, bus),
            0x2B => self.op_sw(instruction, bus),
            0x2E => self.op_swr(instruction, bus),
            _ => {
                log::debug!("cpu: reserved instruction 0x{:08X}", instruction);
                self.exception(ExceptionCause::ReservedInstruction);
                Ok(())
            }
        }
    }

    /// SPECIAL (primary opcode 0x00): dispatch on the function field.
    fn execute_special(&mut self, instruction: u32, _bus: &mut Bus) -> Result<()> {
        match funct(instruction) {
            0x00 => self.op_sll(instruction),
            0x02 => self.op_srl(instruction),
            0x03 => self.op_sra(instruction),
            0x04 => self.op_sllv(instruction),
            0x06 => self.op_srlv(instruction),
            0x07 => self.op_srav(instruction),
            0x08 => self.op_jr(instruction),
            0x09 => self.op_jalr(instruction),
            0x0C => self.op_syscall(instruction),
            0x0D => self.op_break(instruction),
            0x10 => self.op_mfhi(instruction),
            0x11 => self.op_mthi(instruction),
            0x12 => self.op_mflo(instruction),
            0x13 => self.op_mtlo(instruction),
            0x18 => self.op_mult(instruction),
            0x19 => self.op_multu(instruction),
            0x1A => self.op_div(instruction),
            0x1B => self.op_divu(instruction),
            0x20 => self.op_add(instruction),
            0x21 => self.op_addu(instruction),
            0x22 => self.op_sub(instruction),
            0x23 => self.op_subu(instruction),
            0x24 => self.op_and(instruction),
            0x25 => self.op_or(instruction),
            0x26 => self.op_xor(instruction),
            0x27 => self.op_nor(instruction),
            0x2A => self.op_slt(instruction),
            0x2B => self.op_sltu(instruction),
            _ => {
                log::debug!("cpu: reserved special instruction 0x{:08X}", instruction);
                self.exception(ExceptionCause::ReservedInstruction);
                Ok(())
            }
        }
    }

    /// COP0 (primary opcode 0x10): dispatch on the RS field.
    fn execute_cop0(&mut self, instruction: u32) -> Result<()> {
        match rs(instruction) {
            0x00 => self.op_mfc0(instruction),
            0x04 => self.op_mtc0(instruction),
            0x10 => self.op_rfe(instruction),
            _ => {
                log::debug!("cpu: reserved cop0 instruction 0x{:08X}", instruction);
                self.exception(ExceptionCause::ReservedInstruction);
                Ok(())
            }
        }
    }

    /// BCOND (primary opcode 0x01): BLTZ/BGEZ/BLTZAL/BGEZAL selected by
    /// the RT field. Bit 0 picks the comparison, rt 0x10-0x11 link.
    fn op_bcond(&mut self, instruction: u32) -> Result<()> {
        let value = self.reg(rs(instruction)) as i32;
        let rt = rt(instruction);

        let taken = if rt & 0x1 == 0 {
            value < 0
        } else {
            value >= 0
        };
        let link = (rt & 0x1E) == 0x10;

        if link {
            // The return address is written whether or not the branch is
            // taken.
            self.set_reg(31, self.next_pc());
        }

        if taken {
            self.branch_to(super::decode::imm_se(instruction) << 2);
        }

        Ok(())
    }
}
