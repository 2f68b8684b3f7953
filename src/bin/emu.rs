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

//! Headless emulator entry point
//!
//! Boots a BIOS image and runs frames at 60 Hz, echoing the guest's
//! TTY output to stdout. Exits 0 on normal termination and 1 on usage
//! errors or emulator faults.

use std::time::{Duration, Instant};

use clap::Parser;

use psemu::config::Config;
use psemu::core::system::System;

const FRAME_TIME: Duration = Duration::from_nanos(1_000_000_000 / 60);

/// PlayStation emulator
#[derive(Parser)]
#[command(name = "emu")]
struct Cli {
    /// BIOS ROM image (exactly 512 KiB)
    bios: String,

    /// Optional host configuration file
    #[arg(long)]
    config: Option<String>,
}

fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            std::process::exit(1);
        }
    };

    let config = match &cli.config {
        Some(path) => match Config::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("emu: error: {e}");
                std::process::exit(1);
            }
        },
        None => Config::default(),
    };

    if let Err(e) = run(&cli, &config) {
        eprintln!("emu: error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli, config: &Config) -> psemu::Result<()> {
    let mut system = System::new();
    system.load_bios(&cli.bios)?;

    log::info!("emu: booting {}", cli.bios);

    #[cfg(feature = "audio")]
    if config.audio {
        system.start_audio();
    }

    loop {
        let frame_start = Instant::now();

        system.run_frame()?;

        for line in system.take_tty_lines() {
            println!("{line}");
        }

        if config.frame_limit {
            let elapsed = frame_start.elapsed();
            if elapsed < FRAME_TIME {
                std::thread::sleep(FRAME_TIME - elapsed);
            }
        }
    }
}
