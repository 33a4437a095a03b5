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

// Crate root: declare modules and control visibility
pub mod config;
pub mod declarations;
pub mod disassembly;
pub mod error;
pub mod logging;
pub mod markers;
pub mod model;
pub mod paths;
pub mod pipeline;
pub mod report;
pub mod rodata;
pub mod toolchain;

// Re-export commonly used API from the library for binaries/tests
pub use config::{Config, ToolchainConfig};
pub use declarations::{patch_declaration_file, patch_declarations};
pub use disassembly::{find_last_instruction, resolve_last_instruction};
pub use error::{ModelGenError, Result};
pub use model::{edit_model, edit_model_file, ProjectManifest};
pub use pipeline::Pipeline;
pub use report::{timing_property, RunReport};
pub use rodata::{parse_rodata, MemoryEntry, RodataTable};
pub use toolchain::{ArmToolchain, Toolchain};
