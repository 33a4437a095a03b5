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

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelGenError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed line {line_no} ({reason}): '{line}'")]
    MalformedLine {
        line_no: usize,
        line: String,
        reason: String,
    },

    #[error("marker '{marker}' not found in '{}'", path.display())]
    MissingMarker { marker: String, path: PathBuf },

    #[error(
        "marker '{marker}' appears more than once in '{}' (lines {first} and {second})",
        path.display()
    )]
    DuplicateMarker {
        marker: String,
        path: PathBuf,
        first: usize,
        second: usize,
    },

    #[error("no data to initialize: the memory table is empty")]
    EmptyMemoryTable,

    #[error("address 0x{address:x} appears twice in the memory table")]
    DuplicateAddress { address: u64 },

    #[error("memory row at 0x{address:x} runs past the end of the address space")]
    AddressOverflow { address: u64 },

    #[error("function '{function}' has no instruction in the disassembly listing")]
    MissingTargetFunction { function: String },

    #[error("template '{}' not found", path.display())]
    TemplateNotFound { path: PathBuf },

    #[error("'{command}' failed with {status}: {stderr}")]
    ToolFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("'{command}' did not finish within {seconds}s")]
    ToolTimeout { command: String, seconds: u64 },

    #[error("failed to load configuration '{}': {source}", path.display())]
    Config {
        path: PathBuf,
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, ModelGenError>;

impl ModelGenError {
    pub(crate) fn malformed(line_no: usize, line: &str, reason: impl Into<String>) -> Self {
        ModelGenError::MalformedLine {
            line_no,
            line: line.trim_end().to_string(),
            reason: reason.into(),
        }
    }
}
