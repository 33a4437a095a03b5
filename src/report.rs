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

use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Value;

use crate::rodata::{MemoryRegion, RodataTable};

/// Reachability property used downstream to measure the execution time up to
/// the last instruction, e.g. `EF[p,p](INST8016[0]>0)`.
pub fn timing_property(last_instruction: u64) -> String {
    format!("EF[p,p](INST{:x}[0]>0)", last_instruction)
}

fn hex(value: u64) -> String {
    format!("0x{:x}", value)
}

fn path_value(path: &Path) -> Value {
    Value::String(path.display().to_string())
}

/// Summary of one `build` run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub binary: PathBuf,
    pub listing: PathBuf,
    pub rodata_dump: PathBuf,
    pub trace_feed: PathBuf,
    pub declarations: PathBuf,
    /// False when the template was copied unchanged.
    pub declarations_patched: bool,
    pub instructions: PathBuf,
    pub model: PathBuf,
    pub last_instruction: u64,
    pub memory_entries: usize,
    pub rodata: Option<MemoryRegion>,
}

impl RunReport {
    pub fn property(&self) -> String {
        timing_property(self.last_instruction)
    }

    /// Format:
    /// {
    ///   "t": "build",
    ///   "artifacts": { "binary": "...", ... },
    ///   "last_instruction": "0x...",
    ///   "memory_entries": <n>,
    ///   "rodata": { "name", "start", "end", "size" } | null,
    ///   "property": "EF[p,p](INST...[0]>0)"
    /// }
    pub fn to_json(&self) -> Value {
        json!({
            "t": "build",
            "artifacts": {
                "binary": path_value(&self.binary),
                "listing": path_value(&self.listing),
                "rodata_dump": path_value(&self.rodata_dump),
                "trace_feed": path_value(&self.trace_feed),
                "declarations": path_value(&self.declarations),
                "instructions": path_value(&self.instructions),
                "model": path_value(&self.model),
            },
            "declarations_patched": self.declarations_patched,
            "last_instruction": hex(self.last_instruction),
            "memory_entries": self.memory_entries,
            "rodata": self.rodata.as_ref().map(MemoryRegion::to_json).unwrap_or(Value::Null),
            "property": self.property(),
        })
    }
}

/// Output of the `rodata` subcommand: every decoded word, addresses as hex strings.
pub fn serialize_rodata(table: &RodataTable, declarations: Option<&Path>) -> Value {
    let entries: Vec<Value> = table
        .entries()
        .iter()
        .map(|e| json!([hex(e.address), e.value]))
        .collect();
    json!({
        "t": "rodata",
        "data_start": table.data_start().map(hex),
        "region": table.region().as_ref().map(MemoryRegion::to_json).unwrap_or(Value::Null),
        "entries": Value::Array(entries),
        "declarations": declarations.map(path_value).unwrap_or(Value::Null),
    })
}

/// Output of the `locate` subcommand.
pub fn serialize_location(function: &str, address: Option<u64>) -> Value {
    json!({
        "t": "locate",
        "function": function,
        "found": address.is_some(),
        "last_instruction": hex(address.unwrap_or(0)),
        "property": timing_property(address.unwrap_or(0)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rodata::parse_rodata;

    #[test]
    fn property_uses_lower_hex() {
        assert_eq!(timing_property(0x8016), "EF[p,p](INST8016[0]>0)");
        assert_eq!(timing_property(0xABC), "EF[p,p](INSTabc[0]>0)");
    }

    #[test]
    fn build_report_lists_artifacts() {
        let report = RunReport {
            binary: PathBuf::from("out/prog"),
            listing: PathBuf::from("out/prog.objdump"),
            rodata_dump: PathBuf::from("out/prog.rodata"),
            trace_feed: PathBuf::from("out/prog.bin"),
            declarations: PathBuf::from("out/declarations_prog.c"),
            declarations_patched: true,
            instructions: PathBuf::from("out/instructions_prog.c"),
            model: PathBuf::from("out/prog.xml"),
            last_instruction: 0x8016,
            memory_entries: 0,
            rodata: None,
        };
        let v = report.to_json();
        assert_eq!(v["t"], "build");
        assert_eq!(v["artifacts"]["model"], "out/prog.xml");
        assert_eq!(v["last_instruction"], "0x8016");
        assert_eq!(v["rodata"], Value::Null);
        assert_eq!(v["property"], "EF[p,p](INST8016[0]>0)");
    }

    #[test]
    fn rodata_output_keeps_order() {
        let table = parse_rodata(
            "Contents of section .rodata:\n 1000 78563412 0a0b0c0d  ....\n",
        )
        .unwrap();
        let v = serialize_rodata(&table, None);
        let entries = v["entries"].as_array().expect("entries array");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], json!(["0x1000", 0x1234_5678u32]));
        assert_eq!(entries[1][0], "0x1004");
        assert_eq!(v["data_start"], "0x1000");
    }

    #[test]
    fn missing_function_reports_sentinel() {
        let v = serialize_location("main", None);
        assert_eq!(v["found"], false);
        assert_eq!(v["last_instruction"], "0x0");
    }
}
