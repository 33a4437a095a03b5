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

//! Marker lines: edit anchors recognised by a fixed substring.
//!
//! Both the declaration template and the model document are edited as a single
//! forward pass over their lines. Before that pass, every marker must be shown to
//! occur on exactly one line, so a damaged input fails loudly instead of producing a
//! silently corrupted output.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use log::debug;
use tempfile::NamedTempFile;

use crate::error::{ModelGenError, Result};

/// Index (0-based) of the single line containing `needle`.
pub fn locate_once(lines: &[&str], needle: &str, path: &Path) -> Result<usize> {
    let mut hits = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| line.contains(needle))
        .map(|(ix, _)| ix);

    let first = hits.next().ok_or_else(|| ModelGenError::MissingMarker {
        marker: needle.to_string(),
        path: path.to_path_buf(),
    })?;
    if let Some(second) = hits.next() {
        return Err(ModelGenError::DuplicateMarker {
            marker: needle.to_string(),
            path: path.to_path_buf(),
            first: first + 1,
            second: second + 1,
        });
    }
    debug!("marker '{}' on line {} of {}", needle, first + 1, path.display());
    Ok(first)
}

/// Check every needle and return their line indices in the same order.
pub fn locate_all(lines: &[&str], needles: &[&str], path: &Path) -> Result<Vec<usize>> {
    needles
        .iter()
        .map(|needle| locate_once(lines, needle, path))
        .collect()
}

/// Split keeping line terminators, so untouched lines pass through byte for byte.
pub fn split_lines(text: &str) -> Vec<&str> {
    text.split_inclusive('\n').collect()
}

/// Write `content` to `dest` through a temporary file in the same directory; `dest`
/// only appears once the whole content is on disk.
pub fn write_atomically(dest: &Path, content: &str) -> io::Result<()> {
    let dir = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(dest).map_err(|e| e.error)?;
    Ok(())
}
