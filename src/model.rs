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

//! Specialisation of a generated time Petri net project file.
//!
//! The base document is the `program.xml` written by the trace extractor. It is
//! edited line by line: the first place gets the start token, the net is reduced
//! to one token colour, and the `<project>` manifest is rewritten to pull in the
//! hardware model and the generated C files.

use std::borrow::Cow;
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::info;

use crate::error::Result;
use crate::markers::{locate_all, split_lines, write_atomically};
use crate::paths::same_path;

pub const START_PLACE_MARKER: &str = "<place id=\"1\"";
pub const TOKEN_COLOR_MARKER: &str = "<nbTokenColor>";
pub const PROJECT_MARKER: &str = "<project";

/// Files the project document should reference.
#[derive(Debug, Clone, Default)]
pub struct ProjectManifest {
    /// Sub-models opened as slaves of this net (e.g. the hardware model).
    pub slave_models: Vec<PathBuf>,
    /// C-like files included into the net's declarations.
    pub includes: Vec<PathBuf>,
}

fn file_name(path: &Path) -> Cow<'_, str> {
    match path.file_name() {
        Some(name) => name.to_string_lossy(),
        None => path.to_string_lossy(),
    }
}

fn escape_attr(value: &str) -> Cow<'_, str> {
    if !value.contains(&['&', '<', '>', '"'][..]) {
        return Cow::Borrowed(value);
    }
    let mut out = String::with_capacity(value.len() + 8);
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

fn render_project(manifest: &ProjectManifest) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "<project nbinput=\"{}\" openinput=\"{}\" nbinclude=\"{}\" >",
        manifest.slave_models.len(),
        0,
        manifest.includes.len()
    );
    for (ix, model) in manifest.slave_models.iter().enumerate() {
        let _ = writeln!(
            out,
            "\t<input id=\"{}\"  file=\"{}\"  status=\"closed\"/>",
            ix + 1,
            escape_attr(&file_name(model))
        );
    }
    for (ix, include) in manifest.includes.iter().enumerate() {
        let _ = writeln!(
            out,
            "\t<include id=\"{}\" file=\"{}\"/>",
            ix + 1,
            escape_attr(&file_name(include))
        );
    }
    out
}

/// Apply the edits to the text of a base document. The result depends only on
/// `base` and `manifest`.
pub fn edit_model(base: &str, manifest: &ProjectManifest, path: &Path) -> Result<String> {
    let lines = split_lines(base);
    let anchors = locate_all(
        &lines,
        &[START_PLACE_MARKER, TOKEN_COLOR_MARKER, PROJECT_MARKER],
        path,
    )?;
    let (place_line, color_line, project_line) = (anchors[0], anchors[1], anchors[2]);

    let mut out = String::with_capacity(base.len() + 256);
    for (ix, line) in lines.iter().enumerate() {
        if ix == place_line {
            out.push_str(&line.replace("initialMarking=\"0\"", "initialMarking=\"1\""));
        } else if ix == color_line {
            out.push_str("<nbTokenColor>1</nbTokenColor>\n");
        } else if ix == project_line {
            out.push_str(&render_project(manifest));
        } else {
            out.push_str(line);
        }
    }
    Ok(out)
}

/// Read `base`, edit it and write the result to `output`. The base is never modified.
pub fn edit_model_file(base: &Path, manifest: &ProjectManifest, output: &Path) -> Result<()> {
    if same_path(base, output) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("refusing to overwrite base model {}", base.display()),
        )
        .into());
    }
    let text = fs::read_to_string(base)?;
    let edited = edit_model(&text, manifest, base)?;
    write_atomically(output, &edited)?;
    info!(
        "wrote {} ({} slave model(s), {} include(s))",
        output.display(),
        manifest.slave_models.len(),
        manifest.includes.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelGenError;

    const BASE: &str = r#"<?xml version="1.0" encoding="UTF-8" ?>
<TPN name="program.xml">
<place id="1" identifier="INST8004" label="INST8004" initialMarking="0" eft="0" lft="0">
</place>
<place id="10" identifier="INST8016" label="INST8016" initialMarking="0" eft="0" lft="0">
</place>
<timedCost>-1</timedCost>
<nbTokenColor>2</nbTokenColor>
<project nbinput="0" openinput="0" nbinclude="0">
</project>
</TPN>
"#;

    fn manifest() -> ProjectManifest {
        ProjectManifest {
            slave_models: vec![PathBuf::from("hardware_models/m/core.xml")],
            includes: vec![PathBuf::from("generated_files/a.c"), PathBuf::from("b.c")],
        }
    }

    #[test]
    fn applies_all_edits() {
        let out = edit_model(BASE, &manifest(), Path::new("program.xml")).unwrap();
        let expected = r#"<?xml version="1.0" encoding="UTF-8" ?>
<TPN name="program.xml">
<place id="1" identifier="INST8004" label="INST8004" initialMarking="1" eft="0" lft="0">
</place>
<place id="10" identifier="INST8016" label="INST8016" initialMarking="0" eft="0" lft="0">
</place>
<timedCost>-1</timedCost>
<nbTokenColor>1</nbTokenColor>
<project nbinput="1" openinput="0" nbinclude="2" >
	<input id="1"  file="core.xml"  status="closed"/>
	<include id="1" file="a.c"/>
	<include id="2" file="b.c"/>
</project>
</TPN>
"#;
        assert_eq!(out, expected);
    }

    #[test]
    fn editing_the_same_base_twice_is_stable() {
        let once = edit_model(BASE, &manifest(), Path::new("program.xml")).unwrap();
        let twice = edit_model(BASE, &manifest(), Path::new("program.xml")).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn empty_manifest_declares_zero_counts() {
        let out = edit_model(BASE, &ProjectManifest::default(), Path::new("program.xml")).unwrap();
        assert!(out.contains("<project nbinput=\"0\" openinput=\"0\" nbinclude=\"0\" >\n</project>"));
    }

    #[test]
    fn attribute_values_are_escaped() {
        let manifest = ProjectManifest {
            slave_models: vec![],
            includes: vec![PathBuf::from("a&\"b\".c")],
        };
        let out = edit_model(BASE, &manifest, Path::new("program.xml")).unwrap();
        assert!(out.contains("file=\"a&amp;&quot;b&quot;.c\""));
    }

    #[test]
    fn duplicate_project_line_is_rejected() {
        let base = BASE.replace("</TPN>", "<project nbinput=\"0\">\n</TPN>");
        let err = edit_model(&base, &manifest(), Path::new("program.xml")).unwrap_err();
        assert!(matches!(err, ModelGenError::DuplicateMarker { marker, .. } if marker == PROJECT_MARKER));
    }

    #[test]
    fn missing_color_line_is_rejected() {
        let base = BASE.replace("<nbTokenColor>2</nbTokenColor>\n", "");
        let err = edit_model(&base, &manifest(), Path::new("program.xml")).unwrap_err();
        assert!(matches!(err, ModelGenError::MissingMarker { marker, .. } if marker == TOKEN_COLOR_MARKER));
    }

    #[test]
    fn file_edit_keeps_base_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("program.xml");
        let output = dir.path().join("prog.xml");
        fs::write(&base, BASE).unwrap();

        edit_model_file(&base, &manifest(), &output).unwrap();

        assert_eq!(fs::read_to_string(&base).unwrap(), BASE);
        assert!(fs::read_to_string(&output).unwrap().contains("nbinclude=\"2\""));
        assert!(edit_model_file(&base, &manifest(), &base).is_err());
    }

    #[test]
    fn base_is_protected_behind_dot_components() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("program.xml");
        fs::write(&base, BASE).unwrap();

        let aliased = dir.path().join(".").join("program.xml");
        assert!(matches!(
            edit_model_file(&base, &manifest(), &aliased),
            Err(ModelGenError::Io(e)) if e.kind() == io::ErrorKind::InvalidInput
        ));
        assert_eq!(fs::read_to_string(&base).unwrap(), BASE);
    }
}
