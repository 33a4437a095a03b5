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

//! Patching of the hardware model's C-like declaration file with the decoded
//! rodata, so the model starts with the program's constants in memory.

use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::Path;

use log::info;

use crate::error::{ModelGenError, Result};
use crate::markers::{locate_all, split_lines, write_atomically};
use crate::rodata::MemoryEntry;

pub const DATA_START_MARKER: &str = "const int dataStart";
pub const INIT_FUNCTION_MARKER: &str = "void initConsts";

/// Rewrite `template` (read from `path`, used for error reporting only).
pub fn patch_declarations(template: &str, entries: &[MemoryEntry], path: &Path) -> Result<String> {
    let lines = split_lines(template);
    let anchors = locate_all(&lines, &[DATA_START_MARKER, INIT_FUNCTION_MARKER], path)?;
    let (data_start_line, init_line) = (anchors[0], anchors[1]);

    let data_start = entries
        .first()
        .map(|e| e.address)
        .ok_or(ModelGenError::EmptyMemoryTable)?;

    let mut out = String::with_capacity(template.len() + entries.len() * 32);
    for (ix, line) in lines.iter().enumerate() {
        if ix == data_start_line {
            let _ = writeln!(out, "const int dataStart = {};", data_start);
        } else if ix == init_line {
            out.push_str("void initConsts(mem_t &mem) {\n");
            for entry in entries {
                let _ = writeln!(out, "\tmemWrite(mem, {},{});", entry.address, entry.value);
            }
            out.push_str("}\n");
        } else {
            out.push_str(line);
        }
    }
    Ok(out)
}

pub fn read_template(template: &Path) -> Result<String> {
    fs::read_to_string(template).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => ModelGenError::TemplateNotFound {
            path: template.to_path_buf(),
        },
        _ => ModelGenError::Io(e),
    })
}

/// Read the template, patch it and write `output`. Nothing is written on failure.
pub fn patch_declaration_file(template: &Path, entries: &[MemoryEntry], output: &Path) -> Result<()> {
    let text = read_template(template)?;
    let patched = patch_declarations(&text, entries, template)?;
    write_atomically(output, &patched)?;
    info!(
        "wrote {} ({} memory word(s)) from template {}",
        output.display(),
        entries.len(),
        template.display()
    );
    Ok(())
}

/// Write the template unchanged, for programs without constants to embed.
pub fn copy_declaration_file(template: &Path, output: &Path) -> Result<()> {
    let text = read_template(template)?;
    write_atomically(output, &text)?;
    info!("copied template {} to {}", template.display(), output.display());
    Ok(())
}
