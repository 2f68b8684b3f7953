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

//! Arithmetic and comparison instructions

use super::super::decode::{imm_se, rd, rs, rt};
use super::super::{ExceptionCause, CPU};
use crate::core::error::Result;
use crate::core::util::add_overflows;

impl CPU {
    /// ADD: rd = rs + rt, Overflow exception on signed overflow.
    ///
    /// The destination is left unmodified when the exception is raised.
    pub(super) fn op_add(&mut self, instruction: u32) -> Result<()> {
        let s = self.reg(rs(instruction));
        let t = self.reg(rt(instruction));
        let result = s.wrapping_add(t);

        if add_overflows(s, t, result) {
            self.exception(ExceptionCause::Overflow);
            return Ok(());
        }

        self.set_reg(rd(instruction), result);
        Ok(())
    }

    /// ADDU: rd = rs + rt, wrapping.
    pub(super) fn op_addu(&mut self, instruction: u32) -> Result<()> {
        let result = self.reg(rs(instruction)).wrapping_add(self.reg(rt(instruction)));
        self.set_reg(rd(instruction), result);
        Ok(())
    }

    /// ADDI: rt = rs + sign_extend(imm), Overflow exception on signed
    /// overflow.
    pub(super) fn op_addi(&mut self, instruction: u32) -> Result<()> {
        let s = self.reg(rs(instruction));
        let imm = imm_se(instruction);
        let result = s.wrapping_add(imm);

        if add_overflows(s, imm, result) {
            self.exception(ExceptionCause::Overflow);
            return Ok(());
        }

        self.set_reg(rt(instruction), result);
        Ok(())
    }

    /// ADDIU: rt = rs + sign_extend(imm), wrapping. Despite the name the
    /// immediate is sign-extended.
    pub(super) fn op_addiu(&mut self, instruction: u32) -> Result<()> {
        let result = self.reg(rs(instruction)).wrapping_add(imm_se(instruction));
        self.set_reg(rt(instruction), result);
        Ok(())
    }

    /// SUB: rd = rs - rt, Overflow exception through the shared adder
    /// predicate.
    pub(super) fn op_sub(&mut self, instruction: u32) -> Result<()> {
        let s = self.reg(rs(instruction));
        let t = self.reg(rt(instruction));
        let result = s.wrapping_sub(t);

        if add_overflows(s, t, result) {
            self.exception(ExceptionCause::Overflow);
            return Ok(());
        }

        self.set_reg(rd(instruction), result);
        Ok(())
    }

    /// SUBU: rd = rs - rt, wrapping.
    pub(super) fn op_subu(&mut self, instruction: u32) -> Result<()> {
        let result = self.reg(rs(instruction)).wrapping_sub(self.reg(rt(instruction)));
        self.set_reg(rd(instruction), result);
        Ok(())
    }

    /// SLT: rd = (rs < rt) signed.
    pub(super) fn op_slt(&mut self, instruction: u32) -> Result<()> {
        let result = (self.reg(rs(instruction)) as i32) < (self.reg(rt(instruction)) as i32);
        self.set_reg(rd(instruction), result as u32);
        Ok(())
    }

    /// SLTU: rd = (rs < rt) unsigned.
    pub(super) fn op_sltu(&mut self, instruction: u32) -> Result<()> {
        let result = self.reg(rs(instruction)) < self.reg(rt(instruction));
        self.set_reg(rd(instruction), result as u32);
        Ok(())
    }

    /// SLTI: rt = (rs < sign_extend(imm)) signed.
    pub(super) fn op_slti(&mut self, instruction: u32) -> Result<()> {
        let result = (self.reg(rs(instruction)) as i32) < (imm_se(instruction) as i32);
        self.set_reg(rt(instruction), result as u32);
        Ok(())
    }

    /// SLTIU: rt = (rs < sign_extend(imm)) unsigned.
    pub(super) fn op_sltiu(&mut self, instruction: u32) -> Result<()> {
        let result = self.reg(rs(instruction)) < imm_se(instruction);
        self.set_reg(rt(instruction), result as u32);
        Ok(())
    }
}
