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

//! Multiply/divide unit
//!
//! HI and LO live in GPR slots 32/33. Division never traps: the
//! quotient/remainder for a zero divisor and for INT32_MIN / -1 follow
//! the R3000's documented results.

use super::super::decode::{rd, rs, rt};
use super::super::{CPU, REG_HI, REG_LO};
use crate::core::error::Result;

impl CPU {
    /// MULT: HI:LO = rs * rt (signed 32x32 -> 64)
    pub(super) fn op_mult(&mut self, instruction: u32) -> Result<()> {
        let a = self.reg(rs(instruction)) as i32 as i64;
        let b = self.reg(rt(instruction)) as i32 as i64;

        let result = (a * b) as u64;

        self.set_reg(REG_HI, (result >> 32) as u32);
        self.set_reg(REG_LO, result as u32);
        Ok(())
    }

    /// MULTU: HI:LO = rs * rt (unsigned)
    pub(super) fn op_multu(&mut self, instruction: u32) -> Result<()> {
        let a = self.reg(rs(instruction)) as u64;
        let b = self.reg(rt(instruction)) as u64;

        let result = a * b;

        self.set_reg(REG_HI, (result >> 32) as u32);
        self.set_reg(REG_LO, result as u32);
        Ok(())
    }

    /// DIV: LO = rs / rt, HI = rs % rt (signed)
    pub(super) fn op_div(&mut self, instruction: u32) -> Result<()> {
        let n = self.reg(rs(instruction)) as i32;
        let d = self.reg(rt(instruction)) as i32;

        if d == 0 {
            self.set_reg(REG_HI, n as u32);
            self.set_reg(REG_LO, if n >= 0 { 0xFFFF_FFFF } else { 1 });
        } else if n == i32::MIN && d == -1 {
            self.set_reg(REG_HI, 0);
            self.set_reg(REG_LO, 0x8000_0000);
        } else {
            self.set_reg(REG_HI, (n % d) as u32);
            self.set_reg(REG_LO, (n / d) as u32);
        }
        Ok(())
    }

    /// DIVU: LO = rs / rt, HI = rs % rt (unsigned)
    pub(super) fn op_divu(&mut self, instruction: u32) -> Result<()> {
        let n = self.reg(rs(instruction));
        let d = self.reg(rt(instruction));

        if d == 0 {
            self.set_reg(REG_HI, n);
            self.set_reg(REG_LO, 0xFFFF_FFFF);
        } else {
            self.set_reg(REG_HI, n % d);
            self.set_reg(REG_LO, n / d);
        }
        Ok(())
    }

    /// MFHI: rd = HI
    pub(super) fn op_mfhi(&mut self, instruction: u32) -> Result<()> {
        self.set_reg(rd(instruction), self.reg(REG_HI));
        Ok(())
    }

    /// MTHI: HI = rs
    pub(super) fn op_mthi(&mut self, instruction: u32) -> Result<()> {
        self.set_reg(REG_HI, self.reg(rs(instruction)));
        Ok(())
    }

    /// MFLO: rd = LO
    pub(super) fn op_mflo(&mut self, instruction: u32) -> Result<()> {
        self.set_reg(rd(instruction), self.reg(REG_LO));
        Ok(())
    }

    /// MTLO: LO = rs
    pub(super) fn op_mtlo(&mut self, instruction: u32) -> Result<()> {
        self.set_reg(REG_LO, self.reg(rs(instruction)));
        Ok(())
    }
}
