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

//! MIPS instruction disassembler
//!
//! Pure: a 32-bit word plus its address in, a deterministic string out.
//! The zero word reads `"NOP"`; anything that does not decode reads
//! `"UNKNOWN"`. Branch and jump targets are printed resolved against
//! the instruction address so a listing can be followed by eye.

use super::decode::{funct, imm, imm_se, opcode, rd, rs, rt, shamt, target};

/// MIPS ABI register names, plus the HI/LO slots.
const REGISTER_NAMES: [&str; 34] = [
    "$zr", "$at", "$v0", "$v1", "$a0", "$a1", "$a2", "$a3", "$t0", "$t1", "$t2", "$t3", "$t4",
    "$t5", "$t6", "$t7", "$s0", "$s1", "$s2", "$s3", "$s4", "$s5", "$s6", "$s7", "$t8", "$t9",
    "$k0", "$k1", "$gp", "$sp", "$fp", "$ra", "$hi", "$lo",
];

/// COP0 register names; unpopulated slots read `$err`.
const COP0_REGISTER_NAMES: [&str; 32] = [
    "$err", "$err", "$err", "$bpc", "$err", "$bda", "$jumpdest", "$dcic", "$badvaddr", "$bdam",
    "$err", "$bpcm", "$sr", "$cause", "$epc", "$prid", "$err", "$err", "$err", "$err", "$err",
    "$err", "$err", "$err", "$err", "$err", "$err", "$err", "$err", "$err", "$err", "$err",
];

/// Render a sign-extended immediate as `0x…` or `-0x…`.
fn signed_hex(value: u32) -> String {
    if value >= 0x8000_0000 {
        format!("-0x{:x}", value.wrapping_neg())
    } else {
        format!("0x{:x}", value)
    }
}

fn reg_name(index: usize) -> &'static str {
    REGISTER_NAMES[index]
}

fn cop0_reg_name(index: usize) -> &'static str {
    COP0_REGISTER_NAMES[index]
}

/// Instruction disassembler
pub struct Disassembler;

impl Disassembler {
    /// Disassemble one instruction word fetched from `address`.
    pub fn disassemble(instruction: u32, address: u32) -> String {
        if instruction == 0 {
            return "NOP".to_string();
        }

        let rs_n = reg_name(rs(instruction));
        let rt_n = reg_name(rt(instruction));

        // Resolved targets for the relative and segment-absolute forms
        let branch_target = address
            .wrapping_add(4)
            .wrapping_add(imm_se(instruction) << 2);
        let jump_target = (address & 0xF000_0000) | (target(instruction) << 2);

        match opcode(instruction) {
            0x00 => Self::disassemble_special(instruction),
            0x01 => {
                let mnemonic = match rt(instruction) {
                    0x00 => "BLTZ",
                    0x01 => "BGEZ",
                    0x10 => "BLTZAL",
                    0x11 => "BGEZAL",
                    _ => return "UNKNOWN".to_string(),
                };
                format!("{} {}, 0x{:08x}", mnemonic, rs_n, branch_target)
            }
            0x02 => format!("J 0x{:08x}", jump_target),
            0x03 => format!("JAL 0x{:08x}", jump_target),
            0x04 => format!("BEQ {}, {}, 0x{:08x}", rs_n, rt_n, branch_target),
            0x05 => format!("BNE {}, {}, 0x{:08x}", rs_n, rt_n, branch_target),
            0x06 => format!("BLEZ {}, 0x{:08x}", rs_n, branch_target),
            0x07 => format!("BGTZ {}, 0x{:08x}", rs_n, branch_target),
            0x08 => format!("ADDI {}, {}, {}", rt_n, rs_n, signed_hex(imm_se(instruction))),
            0x09 => format!("ADDIU {}, {}, {}", rt_n, rs_n, signed_hex(imm_se(instruction))),
            0x0A => format!("SLTI {}, {}, {}", rt_n, rs_n, signed_hex(imm_se(instruction))),
            0x0B => format!("SLTIU {}, {}, {}", rt_n, rs_n, signed_hex(imm_se(instruction))),
            0x0C => format!("ANDI {}, {}, 0x{:04x}", rt_n, rs_n, imm(instruction)),
            0x0D => format!("ORI {}, {}, 0x{:04x}", rt_n, rs_n, imm(instruction)),
            0x0E => format!("XORI {}, {}, 0x{:04x}", rt_n, rs_n, imm(instruction)),
            0x0F => format!("LUI {}, 0x{:04x}", rt_n, imm(instruction)),
            0x10 => Self::disassemble_cop0(instruction),
            0x20 => Self::memory_op("LB", instruction),
            0x21 => Self::memory_op("LH", instruction),
            0x22 => Self::memory_op("LWL", instruction),
            0x23 => Self::memory_op("LW", instruction),
            0x24 => Self::memory_op("LBU", instruction),
            0x25 => Self::memory_op("LHU", instruction),
            0x26 => Self::memory_op("LWR", instruction),
            0x28 => Self::memory_op("SB", instruction),
            0x29 => Self::memory_op("SH", instruction),
            0x2A => Self::memory_op("SWL", instruction),
            0x2B => Self::memory_op("SW", instruction),
            0x2E => Self::memory_op("SWR", instruction),
            _ => "UNKNOWN".to_string(),
        }
    }

    /// `MNEMONIC $rt, offset($rs)` form shared by all loads and stores.
    fn memory_op(mnemonic: &str, instruction: u32) -> String {
        format!(
            "{} {}, {}({})",
            mnemonic,
            reg_name(rt(instruction)),
            signed_hex(imm_se(instruction)),
            reg_name(rs(instruction))
        )
    }

    fn disassemble_special(instruction: u32) -> String {
        let rs_n = reg_name(rs(instruction));
        let rt_n = reg_name(rt(instruction));
        let rd_n = reg_name(rd(instruction));

        match funct(instruction) {
            0x00 => format!("SLL {}, {}, {}", rd_n, rt_n, shamt(instruction)),
            0x02 => format!("SRL {}, {}, {}", rd_n, rt_n, shamt(instruction)),
            0x03 => format!("SRA {}, {}, {}", rd_n, rt_n, shamt(instruction)),
            0x04 => format!("SLLV {}, {}, {}", rd_n, rt_n, rs_n),
            0x06 => format!("SRLV {}, {}, {}", rd_n, rt_n, rs_n),
            0x07 => format!("SRAV {}, {}, {}", rd_n, rt_n, rs_n),
            0x08 => format!("JR {}", rs_n),
            0x09 => format!("JALR {}, {}", rd_n, rs_n),
            0x0C => "SYSCALL".to_string(),
            0x0D => "BREAK".to_string(),
            0x10 => format!("MFHI {}", rd_n),
            0x11 => format!("MTHI {}", rs_n),
            0x12 => format!("MFLO {}", rd_n),
            0x13 => format!("MTLO {}", rs_n),
            0x18 => format!("MULT {}, {}", rs_n, rt_n),
            0x19 => format!("MULTU {}, {}", rs_n, rt_n),
            0x1A => format!("DIV {}, {}", rs_n, rt_n),
            0x1B => format!("DIVU {}, {}", rs_n, rt_n),
            0x20 => format!("ADD {}, {}, {}", rd_n, rs_n, rt_n),
            0x21 => format!("ADDU {}, {}, {}", rd_n, rs_n, rt_n),
            0x22 => format!("SUB {}, {}, {}", rd_n, rs_n, rt_n),
            0x23 => format!("SUBU {}, {}, {}", rd_n, rs_n, rt_n),
            0x24 => format!("AND {}, {}, {}", rd_n, rs_n, rt_n),
            0x25 => format!("OR {}, {}, {}", rd_n, rs_n, rt_n),
            0x26 => format!("XOR {}, {}, {}", rd_n, rs_n, rt_n),
            0x27 => format!("NOR {}, {}, {}", rd_n, rs_n, rt_n),
            0x2A => format!("SLT {}, {}, {}", rd_n, rs_n, rt_n),
            0x2B => format!("SLTU {}, {}, {}", rd_n, rs_n, rt_n),
            _ => "UNKNOWN".to_string(),
        }
    }

    fn disassemble_cop0(instruction: u32) -> String {
        let rt_n = reg_name(rt(instruction));
        let rd_n = cop0_reg_name(rd(instruction));

        match rs(instruction) {
            0x00 => format!("MFC0 {}, {}", rt_n, rd_n),
            0x04 => format!("MTC0 {}, {}", rt_n, rd_n),
            0x10 => "RFE".to_string(),
            _ => "UNKNOWN".to_string(),
        }
    }
}
