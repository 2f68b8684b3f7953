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

//! Interpreter hot-loop benchmark

use criterion::{criterion_group, criterion_main, Criterion};

use psemu::core::system::System;

/// BIOS image holding a counting loop at the reset vector:
/// ADDIU $1, $1, 1; J start; NOP (delay slot)
fn bios_loop() -> Vec<u8> {
    let mut image = vec![0u8; 512 * 1024];
    for (i, word) in [0x2421_0001u32, 0x0BF0_0000, 0x0000_0000]
        .iter()
        .enumerate()
    {
        image[i * 4..i * 4 + 4].copy_from_slice(&word.to_le_bytes());
    }
    image
}

fn cpu_benchmark(c: &mut Criterion) {
    let mut system = System::new();
    system.load_bios_image(&bios_loop()).unwrap();

    c.bench_function("step_counting_loop", |b| {
        b.iter(|| {
            for _ in 0..1000 {
                system.step().unwrap();
            }
        })
    });

    c.bench_function("run_frame_idle_loop", |b| {
        b.iter(|| system.run_frame().unwrap())
    });
}

criterion_group!(benches, cpu_benchmark);
criterion_main!(benches);
