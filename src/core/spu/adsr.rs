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

//! ADSR envelope generator
//!
//! Each phase derives four parameters (mode, direction, shift, step)
//! from the voice's 32-bit ADSR word. The envelope runs on a cycle
//! countdown: when it reaches zero the level moves by the derived step
//! and the countdown reloads from the derived shift, giving the
//! hardware's stepped exponential/linear ramps.
//!
//! ADSR word layout:
//!
//! ```text
//! 0-3    sustain level
//! 4-7    decay shift
//! 8-9    attack step
//! 10-14  attack shift
//! 15     attack mode
//! 16-20  release shift
//! 21     release mode
//! 22-23  sustain step
//! 24-28  sustain shift
//! 30     sustain direction
//! 31     sustain mode
//! ```

/// Envelope phase. `Disabled` voices produce no output and are skipped
/// by the mixer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Phase {
    Disabled,
    Attack,
    Decay,
    Sustain,
    Release,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode {
    Linear,
    Exponential,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Direction {
    Increase,
    Decrease,
}

pub(super) struct Envelope {
    /// Raw 32-bit ADSR configuration word.
    pub(super) config: u32,

    /// Current phase.
    pub(super) phase: Phase,

    /// Current level, 0..=0x7FFF.
    pub(super) level: i16,

    /// Countdown until the next level step.
    cycles: u32,
}

impl Envelope {
    pub(super) fn new() -> Self {
        Self {
            config: 0,
            phase: Phase::Disabled,
            level: 0,
            cycles: 0,
        }
    }

    /// Key-on: restart the attack ramp from silence.
    pub(super) fn key_on(&mut self) {
        self.phase = Phase::Attack;
        self.level = 0;
        self.cycles = 0;
    }

    /// Key-off: enter the release ramp from the current level.
    pub(super) fn key_off(&mut self) {
        self.phase = Phase::Release;
        self.cycles = 0;
    }

    fn mode(&self) -> Mode {
        let exponential = match self.phase {
            Phase::Attack => self.config & (1 << 15) != 0,
            Phase::Decay => true,
            Phase::Sustain => self.config & (1 << 31) != 0,
            Phase::Release => self.config & (1 << 21) != 0,
            Phase::Disabled => false,
        };

        if exponential {
            Mode::Exponential
        } else {
            Mode::Linear
        }
    }

    fn direction(&self) -> Direction {
        match self.phase {
            Phase::Attack => Direction::Increase,
            Phase::Sustain => {
                if self.config & (1 << 30) != 0 {
                    Direction::Decrease
                } else {
                    Direction::Increase
                }
            }
            _ => Direction::Decrease,
        }
    }

    fn shift(&self) -> i32 {
        (match self.phase {
            Phase::Attack => (self.config >> 10) & 0x1F,
            Phase::Decay => (self.config >> 4) & 0xF,
            Phase::Sustain => (self.config >> 24) & 0x1F,
            Phase::Release => (self.config >> 16) & 0x1F,
            Phase::Disabled => 0,
        }) as i32
    }

    fn step_value(&self) -> i32 {
        match self.phase {
            Phase::Attack => 7 - ((self.config >> 8) & 0x3) as i32,
            Phase::Sustain => {
                let step = ((self.config >> 22) & 0x3) as i32;
                match self.direction() {
                    Direction::Increase => 7 - step,
                    Direction::Decrease => -8 + step,
                }
            }
            Phase::Decay | Phase::Release => -8,
            Phase::Disabled => 0,
        }
    }

    /// Decay ends when the level falls to `(bits + 1) * 0x800`.
    fn sustain_level(&self) -> i32 {
        ((self.config & 0xF) as i32 + 1) * 0x800
    }

    /// Advance the envelope by one 44.1 kHz tick.
    pub(super) fn step(&mut self) {
        let phase = self.phase;
        let mode = self.mode();
        let direction = self.direction();

        if self.cycles != 0 {
            self.cycles -= 1;
        }

        let shift = self.shift();
        let mut cycles = 1u32 << (shift - 11).max(0);
        let mut step = self.step_value() << (11 - shift).max(0);

        if mode == Mode::Exponential && direction == Direction::Increase && self.level > 0x6000 {
            cycles *= 4;
        } else if mode == Mode::Exponential && direction == Direction::Decrease {
            step = step * self.level as i32 / 0x8000;
        }

        if self.cycles == 0 {
            self.cycles = cycles;

            let new_level = self.level as i32 + step;
            self.level = new_level.clamp(0, 0x7FFF) as i16;

            if phase == Phase::Attack && self.level == 0x7FFF {
                self.phase = Phase::Decay;
                self.cycles = 0;
            } else if phase == Phase::Decay && (self.level as i32) <= self.sustain_level() {
                self.phase = Phase::Sustain;
                self.cycles = 0;
            } else if phase == Phase::Release && self.level == 0 {
                self.phase = Phase::Disabled;
                self.cycles = 0;
            }
        }
    }
}
