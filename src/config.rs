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

//! Host configuration
//!
//! Optional TOML file consumed by the frame loop; every field has a
//! default so a missing file or empty table works.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Open the audio output device at startup.
    pub audio: bool,

    /// Pace frames to the 60 Hz refresh rate; off runs uncapped.
    pub frame_limit: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            audio: true,
            frame_limit: true,
        }
    }
}

impl Config {
    /// Load a configuration file.
    pub fn load(path: &str) -> Result<Self, String> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("unable to read config {path}: {e}"))?;

        toml::from_str(&text).map_err(|e| format!("unable to parse config {path}: {e}"))
    }
}
