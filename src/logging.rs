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

//! Process-wide logger settings

use anyhow::{Context, Result};
use flexi_logger::{LogSpecification, Logger, LoggerHandle};

pub const LOGGING_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Initialize logging. Must be called once at startup, and the returned handle kept
/// alive for the lifetime of the process.
///
/// `RUST_LOG` wins over `level` when set. Everything goes to stderr: stdout is
/// reserved for the JSON report.
pub fn init(level: &str) -> Result<LoggerHandle> {
    let spec = LogSpecification::env_or_parse(level)
        .with_context(|| format!("invalid log level '{}'", level))?;
    Logger::with(spec)
        .log_to_stderr()
        .format(flexi_logger::default_format)
        .start()
        .context("failed to start logger")
}
