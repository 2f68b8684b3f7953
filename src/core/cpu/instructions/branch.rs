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

//! Conditional branch instructions
//!
//! Branches are relative to the delay-slot address, which `pc` already
//! holds while the branch executes. Only `next_pc` is rewritten, so the
//! delay-slot instruction runs before the target takes effect.

use super::super::decode::{imm_se, rs, rt};
use super::super::CPU;
use crate::core::error::Result;

impl CPU {
    /// Redirect execution to `pc + offset` after the delay slot.
    pub(super) fn branch_to(&mut self, offset: u32) {
        self.branch = true;
        self.next_pc = self.pc.wrapping_add(offset);
    }

    /// BEQ: branch when rs == rt
    pub(super) fn op_beq(&mut self, instruction: u32) -> Result<()> {
        if self.reg(rs(instruction)) == self.reg(rt(instruction)) {
            self.branch_to(imm_se(instruction) << 2);
        }
        Ok(())
    }

    /// BNE: branch when rs != rt
    pub(super) fn op_bne(&mut self, instruction: u32) -> Result<()> {
        if self.reg(rs(instruction)) != self.reg(rt(instruction)) {
            self.branch_to(imm_se(instruction) << 2);
        }
        Ok(())
    }

    /// BLEZ: branch when rs <= 0 (signed)
    pub(super) fn op_blez(&mut self, instruction: u32) -> Result<()> {
        if (self.reg(rs(instruction)) as i32) <= 0 {
            self.branch_to(imm_se(instruction) << 2);
        }
        Ok(())
    }

    /// BGTZ: branch when rs > 0 (signed)
    pub(super) fn op_bgtz(&mut self, instruction: u32) -> Result<()> {
        if (self.reg(rs(instruction)) as i32) > 0 {
            self.branch_to(imm_se(instruction) << 2);
        }
        Ok(())
    }
}
