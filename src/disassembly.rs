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

use std::fmt;
use std::sync::OnceLock;

use log::{debug, info, trace, warn};
use regex::Regex;

use crate::error::{ModelGenError, Result};

/// We read `objdump -d` listings as text. A listing interleaves section banners,
/// symbol headers and instruction lines:
///
/// ```text
/// Disassembly of section .text:
///
/// 00008000 <main>:
///     8000:	b580      	push	{r7, lr}
///     8004:	f000 f802 	bl	800c <foo>
///     8014:	00018080 	.word	0x00018080
/// ```
///
/// This module classifies those lines, finds the last real instruction of a
/// function, and turns the listing into the record stream the trace extractor reads.

pub const DEFAULT_TARGET_FUNCTION: &str = "main";
pub const DEFAULT_EXCLUDED_KEYWORDS: [&str; 2] = [".word", "nop"];

const SECTION_BANNER_PREFIX: &str = "Disassembly of section ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyLine {
    pub address: u64,
    pub bytes: String,
    pub instruction: String,
}

impl AssemblyLine {
    pub fn format_bytes(&self) -> String {
        format!("{:X}:{}:{}", self.address, self.bytes, self.instruction)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingLine<'a> {
    SymbolHeader { address: u64, name: &'a str },
    SectionBanner(&'a str),
    Instruction(AssemblyLine),
    Other,
}

fn symbol_header() -> &'static Regex {
    static HEADER: OnceLock<Regex> = OnceLock::new();
    HEADER.get_or_init(|| Regex::new(r"^\s*([0-9a-fA-F]+)\s+<(.+)>:\s*$").expect("constant regex"))
}

pub fn classify_line(line: &str) -> ListingLine<'_> {
    let s = line.trim_end_matches(&['\n', '\r'][..]);

    if let Some(caps) = symbol_header().captures(s) {
        if let (Some(addr), Some(name)) = (caps.get(1), caps.get(2)) {
            if let Ok(address) = u64::from_str_radix(addr.as_str(), 16) {
                return ListingLine::SymbolHeader {
                    address,
                    name: name.as_str(),
                };
            }
        }
    }

    if let Some(section) = s.strip_prefix(SECTION_BANNER_PREFIX) {
        return ListingLine::SectionBanner(section.trim_end_matches(':'));
    }

    // Instruction lines are "<addr>:\t<bytes>\t<mnemonic>\t<operands>". The tab right
    // after the colon tells them apart from the "<file>:     file format" banner.
    let Some((head, rest)) = s.split_once(':') else {
        return ListingLine::Other;
    };
    let Some(rest) = rest.strip_prefix('\t') else {
        return ListingLine::Other;
    };
    let Ok(address) = u64::from_str_radix(head.trim(), 16) else {
        return ListingLine::Other;
    };
    let (bytes, instruction) = rest.split_once('\t').unwrap_or((rest, ""));
    let instruction = instruction
        .split('\t')
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    ListingLine::Instruction(AssemblyLine {
        address,
        bytes: bytes.trim().to_string(),
        instruction,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    OutsideTarget,
    InsideTarget,
}

/// Outcome of a locator pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LastInstruction {
    /// Address of the last non-excluded instruction inside the target, in listing order.
    pub address: Option<u64>,
    /// Whether a header for the target function was seen at all.
    pub target_seen: bool,
}

impl LastInstruction {
    /// Zero when nothing was found, as the trace extractor expects.
    pub fn address_or_sentinel(&self) -> u64 {
        self.address.unwrap_or(0)
    }

    /// With `strict` unset a missing function (or one made only of excluded lines)
    /// degrades to the zero sentinel with a warning; with `strict` set it is an error.
    pub fn resolve(&self, target: &str, strict: bool) -> Result<u64> {
        match self.address {
            Some(address) => {
                info!("The last instruction found in '{}' is 0x{:x}", target, address);
                Ok(address)
            }
            None if strict => Err(ModelGenError::MissingTargetFunction {
                function: target.to_string(),
            }),
            None => {
                if self.target_seen {
                    warn!("'{}' only has excluded instructions, using 0", target);
                } else {
                    warn!("function '{}' not found in listing, using 0", target);
                }
                Ok(self.address_or_sentinel())
            }
        }
    }
}

/// Two-state scan over a listing. Every symbol header re-decides whether we are
/// inside the target function; inside it, each candidate instruction overwrites the
/// previous one, so the last one seen wins.
pub struct LastInstructionLocator<'a> {
    target: &'a str,
    excluded: &'a [String],
    state: ScanState,
    result: LastInstruction,
}

impl<'a> LastInstructionLocator<'a> {
    pub fn new(target: &'a str, excluded: &'a [String]) -> Self {
        Self {
            target,
            excluded,
            state: ScanState::OutsideTarget,
            result: LastInstruction::default(),
        }
    }

    pub fn step(&mut self, line: &str) {
        match classify_line(line) {
            ListingLine::SymbolHeader { name, .. } => {
                self.state = if name == self.target {
                    self.result.target_seen = true;
                    ScanState::InsideTarget
                } else {
                    ScanState::OutsideTarget
                };
            }
            ListingLine::SectionBanner(_) => self.state = ScanState::OutsideTarget,
            ListingLine::Instruction(instr) if self.state == ScanState::InsideTarget => {
                if let Some(keyword) = self.excluded.iter().find(|k| line.contains(k.as_str())) {
                    trace!("skipping 0x{:x} ({})", instr.address, keyword);
                } else {
                    debug!("candidate {}", instr.format_bytes());
                    self.result.address = Some(instr.address);
                }
            }
            ListingLine::Instruction(_) | ListingLine::Other => {}
        }
    }

    pub fn finish(self) -> LastInstruction {
        self.result
    }
}

pub fn find_last_instruction(listing: &str, target: &str, excluded: &[String]) -> LastInstruction {
    let mut locator = LastInstructionLocator::new(target, excluded);
    for line in listing.lines() {
        locator.step(line);
    }
    locator.finish()
}

/// Locate the last instruction of `target` and apply the missing-function policy
/// of [`LastInstruction::resolve`].
pub fn resolve_last_instruction(
    listing: &str,
    target: &str,
    excluded: &[String],
    strict: bool,
) -> Result<u64> {
    find_last_instruction(listing, target, excluded).resolve(target, strict)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceKind {
    Thumb,
    Wide,
    Word,
}

/// One line of the trace extractor's input: `<kind>:<hex address>:<hex code>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceRecord {
    pub kind: TraceKind,
    pub address: u64,
    pub code: String,
}

impl fmt::Display for TraceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            TraceKind::Thumb => 't',
            TraceKind::Wide => 'a',
            TraceKind::Word => 'w',
        };
        write!(f, "{}:{:x}:{}", kind, self.address, self.code)
    }
}

impl TraceRecord {
    fn from_assembly_line(line: &AssemblyLine) -> Option<Self> {
        let code: String = line.bytes.split_whitespace().collect();
        if code.is_empty() || !code.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let kind = if line.instruction.starts_with(".word") {
            TraceKind::Word
        } else if line.instruction.starts_with('.') {
            return None;
        } else {
            match code.len() {
                4 => TraceKind::Thumb,
                8 => TraceKind::Wide,
                _ => return None,
            }
        };
        Some(Self {
            kind,
            address: line.address,
            code,
        })
    }
}

/// Every instruction and literal word of the listing, in listing order.
pub fn trace_feed(listing: &str) -> Vec<TraceRecord> {
    listing
        .lines()
        .filter_map(|line| match classify_line(line) {
            ListingLine::Instruction(instr) => {
                let record = TraceRecord::from_assembly_line(&instr);
                if record.is_none() {
                    debug!("no trace record for {}", instr.format_bytes());
                }
                record
            }
            _ => None,
        })
        .collect()
}

pub fn render_trace_feed(records: &[TraceRecord]) -> String {
    let mut out = String::with_capacity(records.len() * 16);
    for record in records {
        out.push_str(&record.to_string());
        out.push('\n');
    }
    out
}
