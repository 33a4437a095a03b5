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

//! C source to timed Petri net project, one stage after the other.
//!
//! Every stage consumes the artifact written by the previous one and writes its
//! own before the next starts. Intermediate artifacts (listing, rodata dump,
//! trace feed) are kept in the output directory for inspection; the extractor's
//! base model only lives in a scratch directory until the model is written.

use std::fs;
use std::path::Path;

use log::{info, warn};

use crate::config::Config;
use crate::declarations::{copy_declaration_file, patch_declaration_file};
use crate::disassembly::{render_trace_feed, resolve_last_instruction, trace_feed};
use crate::error::Result;
use crate::markers::write_atomically;
use crate::model::{edit_model_file, ProjectManifest};
use crate::paths::{BuildPaths, EXTRACTOR_MODEL_NAME};
use crate::report::RunReport;
use crate::rodata::parse_rodata;
use crate::toolchain::Toolchain;

pub struct Pipeline<T: Toolchain> {
    config: Config,
    toolchain: T,
}

impl<T: Toolchain> Pipeline<T> {
    pub fn new(config: Config, toolchain: T) -> Self {
        Self { config, toolchain }
    }

    /// Build the model for `source`. `model_output` overrides `<output_dir>/<name>.xml`.
    pub fn build(&self, source: &Path, model_output: Option<&Path>) -> Result<RunReport> {
        let config = &self.config;
        let paths = BuildPaths::new(&config.output_dir, source, model_output);
        fs::create_dir_all(&paths.output_dir)?;

        info!("compiling {}", source.display());
        self.toolchain.compile(source, &paths.binary)?;

        let listing = self.toolchain.disassemble(&paths.binary)?;
        write_atomically(&paths.listing, &listing)?;

        let records = trace_feed(&listing);
        let feed = render_trace_feed(&records);
        write_atomically(&paths.trace_feed, &feed)?;
        info!("wrote {} ({} record(s))", paths.trace_feed.display(), records.len());

        let last_instruction = resolve_last_instruction(
            &listing,
            &config.target_function,
            &config.excluded_keywords,
            config.strict_target,
        )?;

        let dump = self.toolchain.dump_rodata(&paths.binary)?;
        write_atomically(&paths.rodata_dump, &dump)?;
        let table = parse_rodata(&dump)?;

        let template = config.declarations_template();
        let declarations = paths.declarations(&template);
        let declarations_patched = if !config.patch_declarations {
            info!("declaration patching disabled, copying {}", template.display());
            copy_declaration_file(&template, &declarations)?;
            false
        } else if table.is_empty() {
            warn!(
                "no rodata in {}, copying {} unchanged",
                paths.binary.display(),
                template.display()
            );
            copy_declaration_file(&template, &declarations)?;
            false
        } else {
            patch_declaration_file(&template, table.entries(), &declarations)?;
            true
        };

        // the extractor always writes program.xml into its working directory, so it
        // gets a directory of its own and the model name stays free for `<name>.xml`
        let scratch = tempfile::tempdir_in(&paths.output_dir)?;
        info!("extracting instructions up to 0x{:x}", last_instruction);
        let instructions = self
            .toolchain
            .extract_trace(&feed, last_instruction, scratch.path())?;
        write_atomically(&paths.instructions, &instructions)?;

        let manifest = ProjectManifest {
            slave_models: vec![config.core_model()],
            includes: vec![declarations.clone(), paths.instructions.clone()],
        };
        let base_model = scratch.path().join(EXTRACTOR_MODEL_NAME);
        edit_model_file(&base_model, &manifest, &paths.model)?;
        scratch.close()?;

        let report = RunReport {
            binary: paths.binary,
            listing: paths.listing,
            rodata_dump: paths.rodata_dump,
            trace_feed: paths.trace_feed,
            declarations,
            declarations_patched,
            instructions: paths.instructions,
            model: paths.model,
            last_instruction,
            memory_entries: table.len(),
            rodata: table.region(),
        };
        info!("Property to get the execution times: {}", report.property());
        Ok(report)
    }
}
