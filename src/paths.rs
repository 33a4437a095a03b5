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

use std::env;
use std::path::{Path, PathBuf};

/// Name of the base model the trace extractor writes into its working directory.
pub const EXTRACTOR_MODEL_NAME: &str = "program.xml";

pub fn canonicalize_path(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir().unwrap_or_default().join(path)
    };
    // dunce resolves . and .. without the \\?\ prefix on Windows
    if let Ok(canonical) = dunce::canonicalize(&absolute) {
        return canonical;
    }
    // not created yet: resolve the directory it will be written to
    match (absolute.parent(), absolute.file_name()) {
        (Some(parent), Some(name)) => dunce::canonicalize(parent)
            .map(|dir| dir.join(name))
            .unwrap_or(absolute),
        _ => absolute,
    }
}

/// Whether both paths name the same file, existing or not.
pub fn same_path(a: &Path, b: &Path) -> bool {
    canonicalize_path(a) == canonicalize_path(b)
}

/// Programs given with a directory part are resolved against our working directory,
/// bare names are left for a `$PATH` lookup.
pub fn resolve_program(program: &Path) -> PathBuf {
    if program.components().count() > 1 {
        canonicalize_path(program)
    } else {
        program.to_path_buf()
    }
}

/// File name without directory and extension, e.g. `examples/foo.c` -> `foo`.
pub fn base_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// `<template-basename>_<name>.c`
pub fn declarations_output_path(output_dir: &Path, template: &Path, name: &str) -> PathBuf {
    output_dir.join(format!("{}_{}.c", base_name(template), name))
}

/// Every artifact of one build, all under the output directory and all named
/// after the binary, which keeps the full source stem (`a.v2.c` -> `a.v2`).
#[derive(Debug, Clone, PartialEq)]
pub struct BuildPaths {
    pub output_dir: PathBuf,
    pub name: String,
    pub binary: PathBuf,
    pub listing: PathBuf,
    pub rodata_dump: PathBuf,
    pub trace_feed: PathBuf,
    pub instructions: PathBuf,
    pub model: PathBuf,
}

impl BuildPaths {
    /// `model` overrides the default `<output_dir>/<name>.xml`.
    pub fn new(output_dir: &Path, source: &Path, model: Option<&Path>) -> Self {
        let name = base_name(source);
        let artifact = |ext: &str| output_dir.join(format!("{}.{}", name, ext));
        Self {
            output_dir: output_dir.to_path_buf(),
            binary: output_dir.join(&name),
            listing: artifact("objdump"),
            rodata_dump: artifact("rodata"),
            trace_feed: artifact("bin"),
            instructions: output_dir.join(format!("instructions_{}.c", name)),
            model: model
                .map(Path::to_path_buf)
                .unwrap_or_else(|| artifact("xml")),
            name,
        }
    }

    pub fn declarations(&self, template: &Path) -> PathBuf {
        declarations_output_path(&self.output_dir, template, &self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_names_from_source() {
        let paths = BuildPaths::new(Path::new("generated_files"), Path::new("examples/strcmp.c"), None);
        assert_eq!(paths.name, "strcmp");
        assert_eq!(paths.binary, PathBuf::from("generated_files/strcmp"));
        assert_eq!(paths.listing, PathBuf::from("generated_files/strcmp.objdump"));
        assert_eq!(paths.rodata_dump, PathBuf::from("generated_files/strcmp.rodata"));
        assert_eq!(paths.instructions, PathBuf::from("generated_files/instructions_strcmp.c"));
        assert_eq!(paths.model, PathBuf::from("generated_files/strcmp.xml"));
        assert_eq!(
            paths.declarations(Path::new("hardware_models/m/declarations.c")),
            PathBuf::from("generated_files/declarations_strcmp.c")
        );
    }

    #[test]
    fn dotted_stem_is_kept_whole() {
        let paths = BuildPaths::new(Path::new("out"), Path::new("strcmp.v2.c"), None);
        assert_eq!(paths.binary, PathBuf::from("out/strcmp.v2"));
        assert_eq!(paths.listing, PathBuf::from("out/strcmp.v2.objdump"));
        assert_eq!(paths.rodata_dump, PathBuf::from("out/strcmp.v2.rodata"));
        assert_eq!(paths.trace_feed, PathBuf::from("out/strcmp.v2.bin"));
        assert_eq!(paths.model, PathBuf::from("out/strcmp.v2.xml"));
        assert_eq!(
            paths.declarations(Path::new("declarations.c")),
            PathBuf::from("out/declarations_strcmp.v2.c")
        );

        let other = BuildPaths::new(Path::new("out"), Path::new("strcmp.v1.c"), None);
        assert_ne!(other.listing, paths.listing);
        assert_ne!(other.model, paths.model);
    }

    #[test]
    fn same_path_sees_through_dot_components() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("program.xml");
        std::fs::write(&base, "<TPN/>\n").unwrap();

        assert!(same_path(&base, &dir.path().join(".").join("program.xml")));
        assert!(same_path(
            &dir.path().join("new.xml"),
            &dir.path().join(".").join("new.xml")
        ));
        assert!(!same_path(&base, &dir.path().join("prog.xml")));
    }

    #[test]
    fn model_path_can_be_overridden() {
        let paths = BuildPaths::new(Path::new("out"), Path::new("a.c"), Some(Path::new("x/net.xml")));
        assert_eq!(paths.model, PathBuf::from("x/net.xml"));
    }

    #[test]
    fn bare_program_names_are_left_for_path_lookup() {
        assert_eq!(resolve_program(Path::new("objdump")), PathBuf::from("objdump"));
        assert!(resolve_program(Path::new("src/extract")).is_absolute());
    }
}
