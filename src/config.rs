// Copyright (c) 2026 MCU-Debug Authors.
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

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::disassembly::{DEFAULT_EXCLUDED_KEYWORDS, DEFAULT_TARGET_FUNCTION};
use crate::error::{ModelGenError, Result};

// Configuration is read from an optional JSON file. Every field has a default, so
// a file only needs to mention what it changes, e.g.
//
//   { "hardware_model_root": "hardware_models/oneCore", "toolchain": { "timeout_secs": 30 } }

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ToolchainConfig {
    pub compiler: String,
    pub compiler_flags: Vec<String>,
    pub objdump: String,
    /// Binary turning the trace feed into instruction functions and `program.xml`.
    pub extractor: PathBuf,
    /// Upper bound for each external command.
    pub timeout_secs: u64,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            compiler: "arm-none-eabi-gcc".to_string(),
            compiler_flags: [
                "-O0",
                "-mcpu=cortex-m0plus",
                "-mthumb",
                "-mfloat-abi=soft",
                "-mfpu=fpv4-sp-d16",
                "-nostartfiles",
                "-fno-builtin",
                "--specs=nosys.specs",
                "-nostdlib",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            objdump: "arm-none-eabi-objdump".to_string(),
            extractor: PathBuf::from("src/extract"),
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub output_dir: PathBuf,
    pub hardware_model_root: PathBuf,
    /// Defaults to `<hardware_model_root>/declarations.c`.
    pub declarations_template: Option<PathBuf>,
    /// Defaults to `<hardware_model_root>/hardware.xml`.
    pub core_model: Option<PathBuf>,
    pub target_function: String,
    pub excluded_keywords: Vec<String>,
    /// When false the template is copied unchanged.
    pub patch_declarations: bool,
    /// Fail instead of falling back to address 0 when the target function has no instruction.
    pub strict_target: bool,
    pub toolchain: ToolchainConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("generated_files"),
            hardware_model_root: PathBuf::from("hardware_models/twoCoresModel3_empty"),
            declarations_template: None,
            core_model: None,
            target_function: DEFAULT_TARGET_FUNCTION.to_string(),
            excluded_keywords: DEFAULT_EXCLUDED_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
            patch_declarations: true,
            strict_target: false,
            toolchain: ToolchainConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|source| ModelGenError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `path` if given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn declarations_template(&self) -> PathBuf {
        self.declarations_template
            .clone()
            .unwrap_or_else(|| self.hardware_model_root.join("declarations.c"))
    }

    pub fn core_model(&self) -> PathBuf {
        self.core_model
            .clone()
            .unwrap_or_else(|| self.hardware_model_root.join("hardware.xml"))
    }
}
