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

//! Small numeric helpers shared across the core.

/// Signed-overflow predicate for the R3000 adder path.
///
/// True when operands of equal sign produced a result of the opposite
/// sign. ADD, ADDI and SUB all share this predicate.
#[inline(always)]
pub fn add_overflows(a: u32, b: u32, result: u32) -> bool {
    (!(a ^ b) & (a ^ result)) & 0x8000_0000 != 0
}

/// Clip a 32-bit intermediate sample to the int16 range.
#[inline(always)]
pub fn clip_i16(value: i32) -> i16 {
    value.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

/// Convert a signed 16-bit sample to a float in roughly [-1, 1].
#[inline(always)]
pub fn i16_to_f32(value: i16) -> f32 {
    value as f32 / 32768.0
}

/// Convert a float sample back to signed 16-bit, clipping to [-1, 1].
#[inline(always)]
pub fn f32_to_i16(value: f32) -> i16 {
    (value.clamp(-1.0, 1.0) * 32767.0) as i16
}
