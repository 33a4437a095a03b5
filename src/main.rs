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

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::Value;

use mcu_timing_model::config::Config;
use mcu_timing_model::declarations::patch_declaration_file;
use mcu_timing_model::disassembly::find_last_instruction;
use mcu_timing_model::logging::{self, LOGGING_LEVELS};
use mcu_timing_model::paths::{base_name, declarations_output_path};
use mcu_timing_model::report::{serialize_location, serialize_rodata};
use mcu_timing_model::rodata::parse_rodata;
use mcu_timing_model::toolchain::ArmToolchain;
use mcu_timing_model::Pipeline;

/// From a C program, generate a timed Petri net of its execution.
#[derive(Parser, Debug)]
#[command(name = "mcu-timing-model", version)]
struct Cli {
    /// Log level (RUST_LOG overrides it)
    #[arg(short = 'v', long = "verbose", global = true, default_value = "info",
          value_parser = clap::builder::PossibleValuesParser::new(LOGGING_LEVELS))]
    verbose: String,

    /// JSON configuration file
    #[arg(short = 'c', long = "config", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile a C file and generate its model
    Build(BuildArgs),
    /// Decode an `objdump -s -j .rodata` dump, optionally patching a declaration template
    Rodata(RodataArgs),
    /// Print the last instruction of a function in an `objdump -d` listing
    Locate(LocateArgs),
}

#[derive(Args, Debug)]
struct BuildArgs {
    /// Path to the C file
    file: PathBuf,

    /// Model output file (default: <output_dir>/<name>.xml)
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Declaration template to patch
    #[arg(long = "template")]
    template: Option<PathBuf>,

    /// Copy the declaration template without embedding the rodata
    #[arg(long = "no-patch", default_value_t = false)]
    no_patch: bool,

    /// Function whose last instruction ends the trace
    #[arg(short = 'f', long = "function")]
    function: Option<String>,

    /// Fail when the function has no instruction instead of using address 0
    #[arg(long = "strict", default_value_t = false)]
    strict: bool,
}

#[derive(Args, Debug)]
struct RodataArgs {
    /// Path to the rodata dump
    file: PathBuf,

    /// Patched declaration file (default: <output_dir>/<template>_<dump>.c)
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Update the declaration template with the data
    #[arg(short = 'u', long = "update", default_value_t = false)]
    update: bool,

    /// Declaration template used with --update
    #[arg(long = "template")]
    template: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct LocateArgs {
    /// Path to the disassembly listing
    file: PathBuf,

    #[arg(short = 'f', long = "function")]
    function: Option<String>,

    #[arg(long = "strict", default_value_t = false)]
    strict: bool,
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn read_input(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn run_build(mut config: Config, args: BuildArgs) -> Result<()> {
    if let Some(template) = args.template {
        config.declarations_template = Some(template);
    }
    if let Some(function) = args.function {
        config.target_function = function;
    }
    config.patch_declarations &= !args.no_patch;
    config.strict_target |= args.strict;

    let toolchain = ArmToolchain::new(config.toolchain.clone())
        .context("failed to start the process runtime")?;
    let pipeline = Pipeline::new(config, toolchain);
    let report = pipeline
        .build(&args.file, args.output.as_deref())
        .with_context(|| format!("failed to build a model for {}", args.file.display()))?;
    print_json(&report.to_json())
}

fn run_rodata(config: Config, args: RodataArgs) -> Result<()> {
    let text = read_input(&args.file)?;
    let table = parse_rodata(&text)
        .with_context(|| format!("failed to decode {}", args.file.display()))?;

    let mut written = None;
    if args.update {
        let template = args
            .template
            .unwrap_or_else(|| config.declarations_template());
        let output = args.output.unwrap_or_else(|| {
            declarations_output_path(&config.output_dir, &template, &base_name(&args.file))
        });
        patch_declaration_file(&template, table.entries(), &output)
            .with_context(|| format!("failed to patch {}", template.display()))?;
        written = Some(output);
    }
    print_json(&serialize_rodata(&table, written.as_deref()))
}

fn run_locate(config: Config, args: LocateArgs) -> Result<()> {
    let listing = read_input(&args.file)?;
    let function = args.function.unwrap_or(config.target_function);
    let strict = config.strict_target || args.strict;

    let found = find_last_instruction(&listing, &function, &config.excluded_keywords);
    found.resolve(&function, strict)?;
    print_json(&serialize_location(&function, found.address))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _logger = logging::init(&cli.verbose)?;

    let config = Config::load_or_default(cli.config.as_deref())
        .context("failed to load configuration")?;

    match cli.command {
        Command::Build(args) => run_build(config, args),
        Command::Rodata(args) => run_rodata(config, args),
        Command::Locate(args) => run_locate(config, args),
    }
}
