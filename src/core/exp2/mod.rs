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

//! Expansion Region 2: debug DUART and POST register
//!
//! The BIOS prints its kernel messages through channel A of a 2681
//! DUART mapped here. Only the Tx path matters: the status register
//! always reports the transmitter ready and empty, and bytes written to
//! the Tx holding register are assembled into lines. A completed line
//! goes to the log and into a queue the host can drain.

use crate::core::error::{EmulatorError, Result};

const EXP2_BASE: u32 = 0x1F80_2000;

const DUART_MODE_A: u32 = EXP2_BASE + 0x20;
const DUART_STATUS_A: u32 = EXP2_BASE + 0x21;
const DUART_COMMAND_A: u32 = EXP2_BASE + 0x22;
const DUART_TX_HOLDING_A: u32 = EXP2_BASE + 0x23;
const DUART_AUX_CONTROL: u32 = EXP2_BASE + 0x24;
const DUART_IRQ_MASK: u32 = EXP2_BASE + 0x25;
const DUART_MODE_B: u32 = EXP2_BASE + 0x28;
const DUART_CLOCK_SELECT_B: u32 = EXP2_BASE + 0x29;
const DUART_COMMAND_B: u32 = EXP2_BASE + 0x2A;
const DUART_OUTPUT_CONF: u32 = EXP2_BASE + 0x2D;
const DUART_SET_OUTPUT: u32 = EXP2_BASE + 0x2E;
const DUART_RESET_OUTPUT: u32 = EXP2_BASE + 0x2F;

const PSX_POST: u32 = EXP2_BASE + 0x41;

/// DUART status: Tx holding register ready.
const DUART_SR_TXRDY: u8 = 0x4;
/// DUART status: Tx shift register empty.
const DUART_SR_TXEMT: u8 = 0x8;

pub struct Exp2 {
    /// Line under assembly from Tx bytes.
    tx_buffer: String,
    /// Completed TTY lines awaiting the host.
    tty_lines: Vec<String>,
}

impl Exp2 {
    pub fn new() -> Self {
        Self {
            tx_buffer: String::new(),
            tty_lines: Vec::new(),
        }
    }

    pub fn reset(&mut self) {
        self.tx_buffer.clear();
        self.tty_lines.clear();
    }

    /// Feed one byte into the Tx path. `\r` is dropped, `\n` flushes a
    /// non-empty line.
    fn tx_byte(&mut self, byte: u8) {
        match byte {
            b'\r' => {}
            b'\n' => {
                if !self.tx_buffer.is_empty() {
                    let line = std::mem::take(&mut self.tx_buffer);
                    log::info!("tty: {}", line);
                    self.tty_lines.push(line);
                }
            }
            _ => self.tx_buffer.push(byte as char),
        }
    }

    /// Take the completed TTY lines accumulated so far.
    pub fn take_tty_lines(&mut self) -> Vec<String> {
        std::mem::take(&mut self.tty_lines)
    }

    pub fn read8(&self, address: u32) -> Result<u8> {
        match address {
            // The transmitter is always drained instantly
            DUART_STATUS_A => Ok(DUART_SR_TXEMT | DUART_SR_TXRDY),
            _ => Err(EmulatorError::Exp2UnknownRead { address }),
        }
    }

    pub fn write8(&mut self, address: u32, value: u8) -> Result<()> {
        match address {
            DUART_TX_HOLDING_A => {
                self.tx_byte(value);
                Ok(())
            }
            // Channel configuration is irrelevant to an instant Tx path
            DUART_MODE_A | DUART_COMMAND_A | DUART_AUX_CONTROL | DUART_IRQ_MASK | DUART_MODE_B
            | DUART_CLOCK_SELECT_B | DUART_COMMAND_B | DUART_OUTPUT_CONF | DUART_SET_OUTPUT
            | DUART_RESET_OUTPUT => Ok(()),
            PSX_POST => {
                log::info!("exp2: POST 0x{:X}", value);
                Ok(())
            }
            _ => Err(EmulatorError::Exp2UnknownWrite { address, value }),
        }
    }
}

impl Default for Exp2 {
    fn default() -> Self {
        Self::new()
    }
}
