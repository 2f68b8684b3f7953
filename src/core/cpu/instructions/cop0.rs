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

//! COP0 move and return-from-exception instructions

use super::super::decode::{rd, rt};
use super::super::{ExceptionCause, CPU};
use crate::core::error::Result;

impl CPU {
    /// MFC0: rt = cop0[rd]. Unreadable registers raise
    /// ReservedInstruction.
    pub(super) fn op_mfc0(&mut self, instruction: u32) -> Result<()> {
        match self.cop0.read(rd(instruction) as u32) {
            Some(value) => self.set_reg(rt(instruction), value),
            None => self.exception(ExceptionCause::ReservedInstruction),
        }
        Ok(())
    }

    /// MTC0: cop0[rd] = rt. Unwritable registers raise
    /// ReservedInstruction.
    pub(super) fn op_mtc0(&mut self, instruction: u32) -> Result<()> {
        let value = self.reg(rt(instruction));

        if !self.cop0.write(rd(instruction) as u32, value) {
            self.exception(ExceptionCause::ReservedInstruction);
        }
        Ok(())
    }

    /// RFE: pop the exception-mode stack.
    pub(super) fn op_rfe(&mut self, _instruction: u32) -> Result<()> {
        self.cop0.leave_exception();
        Ok(())
    }
}
