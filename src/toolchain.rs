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

//! External tools: the cross compiler, objdump and the trace extractor.
//!
//! The translation core only depends on the textual output of these tools, so they
//! sit behind the `Toolchain` trait. `ArmToolchain` is the real implementation; tests
//! substitute canned outputs.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use log::{debug, info};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::runtime::Runtime;

use crate::config::ToolchainConfig;
use crate::error::{ModelGenError, Result};
use crate::paths::resolve_program;

pub trait Toolchain {
    /// Compile `source` into the ELF file `output`.
    fn compile(&self, source: &Path, output: &Path) -> Result<()>;
    /// `objdump -d` listing of `binary`.
    fn disassemble(&self, binary: &Path) -> Result<String>;
    /// `objdump -s -j .rodata` dump of `binary`.
    fn dump_rodata(&self, binary: &Path) -> Result<String>;
    /// Feed the trace records to the extractor, stopping at `last_instruction`.
    /// Returns the generated instruction functions; the extractor also leaves its
    /// base model (`program.xml`) in `work_dir`, which must be a directory of its own.
    fn extract_trace(&self, feed: &str, last_instruction: u64, work_dir: &Path) -> Result<String>;
}

pub struct ArmToolchain {
    config: ToolchainConfig,
    runtime: Runtime,
}

impl ArmToolchain {
    pub fn new(config: ToolchainConfig) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self { config, runtime })
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_secs)
    }

    /// Run `command` to completion, feeding `input` on stdin. A non-zero exit status
    /// or running past the timeout is an error; the child is killed in that case.
    fn run(&self, mut command: Command, input: Option<&[u8]>) -> Result<Vec<u8>> {
        let display = format!("{:?}", command.as_std());
        debug!("running {}", display);

        command
            .stdin(if input.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let seconds = self.config.timeout_secs;
        let timeout = self.timeout();
        self.runtime.block_on(async {
            let mut child = command.spawn().map_err(|e| {
                io::Error::new(e.kind(), format!("failed to start {}: {}", display, e))
            })?;

            let stdin = child.stdin.take();
            let write = async move {
                if let (Some(mut stdin), Some(data)) = (stdin, input) {
                    stdin.write_all(data).await?;
                    stdin.shutdown().await?;
                }
                Ok::<(), io::Error>(())
            };

            let finished = tokio::time::timeout(timeout, async {
                tokio::join!(write, child.wait_with_output())
            })
            .await;

            let (written, output) = finished.map_err(|_| ModelGenError::ToolTimeout {
                command: display.clone(),
                seconds,
            })?;
            let output = output?;

            if !output.status.success() {
                return Err(ModelGenError::ToolFailed {
                    command: display.clone(),
                    status: output.status.to_string(),
                    stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
                });
            }
            written?;
            Ok::<_, ModelGenError>(output.stdout)
        })
    }

    fn objdump(&self, args: &[&str], binary: &Path) -> Result<String> {
        let mut command = Command::new(&self.config.objdump);
        command.args(args).arg(binary);
        let stdout = self.run(command, None)?;
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }
}

impl Toolchain for ArmToolchain {
    fn compile(&self, source: &Path, output: &Path) -> Result<()> {
        let mut command = Command::new(&self.config.compiler);
        command
            .arg(source)
            .arg("-o")
            .arg(output)
            .args(&self.config.compiler_flags);
        self.run(command, None)?;
        info!("compiled {} -> {}", source.display(), output.display());
        Ok(())
    }

    fn disassemble(&self, binary: &Path) -> Result<String> {
        self.objdump(&["-d"], binary)
    }

    fn dump_rodata(&self, binary: &Path) -> Result<String> {
        self.objdump(&["-s", "-j", ".rodata"], binary)
    }

    fn extract_trace(&self, feed: &str, last_instruction: u64, work_dir: &Path) -> Result<String> {
        // the extractor runs inside work_dir, so a relative path must be resolved first
        let program: PathBuf = resolve_program(&self.config.extractor);
        let mut command = Command::new(program);
        command
            .arg(format!("0x{:x}", last_instruction))
            .current_dir(work_dir);
        let stdout = self.run(command, Some(feed.as_bytes()))?;
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }
}
