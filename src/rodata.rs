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

//! Decoding of `objdump -s -j .rodata` output into a table of 32-bit memory words.
//!
//! A dump row looks like
//!
//! ```text
//!  18080 48656c6c 6f000000 00000000 00000000  Hello...........
//! ```
//!
//! i.e. a hex address, up to four little-endian word groups, and an ASCII column.
//! Rows before the `.rodata` banner are toolchain metadata and are skipped.

use std::collections::HashSet;
use std::sync::OnceLock;

use log::{debug, info};
use regex::Regex;
use serde_json::{json, Value};

use crate::error::{ModelGenError, Result};

pub const RODATA_BANNER: &str = "Contents of section .rodata:";
const SECTION_BANNER_PREFIX: &str = "Contents of section ";

/// Every hex group in a dump row stands for one word, even a short trailing one.
pub const WORD_SIZE: u64 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryEntry {
    pub address: u64,
    pub value: u32,
}

/// One decoded dump row: base address plus the words in row order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpLine {
    pub base_address: u64,
    pub words: Vec<u32>,
}

impl DumpLine {
    /// First address past the row, `None` when the row does not fit below 2^64.
    pub fn end_address(&self) -> Option<u64> {
        (self.words.len() as u64)
            .checked_mul(WORD_SIZE)
            .and_then(|len| self.base_address.checked_add(len))
    }

    pub fn entries(&self) -> impl Iterator<Item = MemoryEntry> + '_ {
        self.words
            .iter()
            .enumerate()
            .map(move |(ix, &value)| MemoryEntry {
                address: self.base_address + WORD_SIZE * ix as u64,
                value,
            })
    }
}

/// Decode one hex group as stored by objdump (bytes in memory order) into its
/// little-endian integer value, e.g. `78563412` -> `0x12345678`.
///
/// Groups shorter than 8 digits only occur on the last row of a section; the bytes
/// present are decoded the same way and the missing high bytes are zero.
pub fn decode_le_word(group: &str) -> std::result::Result<u32, String> {
    if group.is_empty() || group.len() > 8 || group.len() % 2 != 0 {
        return Err(format!("'{}' is not a 1-4 byte hex group", group));
    }
    let mut bytes = [0u8; 4];
    for (ix, pair) in group.as_bytes().chunks(2).enumerate() {
        let pair = std::str::from_utf8(pair).map_err(|e| e.to_string())?;
        bytes[ix] = u8::from_str_radix(pair, 16)
            .map_err(|_| format!("'{}' is not a hex byte in group '{}'", pair, group))?;
    }
    Ok(u32::from_le_bytes(bytes))
}

fn column_gap() -> &'static Regex {
    static GAP: OnceLock<Regex> = OnceLock::new();
    GAP.get_or_init(|| Regex::new(r"\s{2,}").expect("constant regex"))
}

/// Parse a single dump row into its base address and decoded words.
pub fn parse_dump_line(line_no: usize, line: &str) -> Result<DumpLine> {
    let trimmed = line.trim_end_matches(&['\n', '\r'][..]).trim_start();
    let sep = trimmed
        .find(char::is_whitespace)
        .ok_or_else(|| ModelGenError::malformed(line_no, line, "no separator after address"))?;
    let (addr_field, payload) = trimmed.split_at(sep);

    let addr_text = addr_field.trim_end_matches(':');
    let base_address = u64::from_str_radix(addr_text, 16).map_err(|_| {
        ModelGenError::malformed(line_no, line, format!("'{}' is not a hex address", addr_field))
    })?;

    let payload = payload.trim_start();
    let groups: Vec<&str> = match column_gap().find(payload) {
        // hex columns end where the padding before the ASCII column starts
        Some(gap) => payload[..gap.start()].split_whitespace().collect(),
        None => {
            let mut tokens: Vec<&str> = payload.split_whitespace().collect();
            tokens.pop();
            tokens
        }
    };

    let words = groups
        .iter()
        .map(|group| decode_le_word(group).map_err(|e| ModelGenError::malformed(line_no, line, e)))
        .collect::<Result<Vec<u32>>>()?;

    let parsed = DumpLine {
        base_address,
        words,
    };
    if parsed.end_address().is_none() {
        return Err(ModelGenError::malformed(
            line_no,
            line,
            "row runs past the end of the address space",
        ));
    }
    Ok(parsed)
}

/// Ordered memory table decoded from a rodata dump.
#[derive(Debug, Default)]
pub struct RodataTable {
    entries: Vec<MemoryEntry>,
    seen: HashSet<u64>,
}

impl RodataTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append all words of a row, in row order.
    pub fn push_line(&mut self, line: &DumpLine) -> Result<()> {
        if line.end_address().is_none() {
            return Err(ModelGenError::AddressOverflow {
                address: line.base_address,
            });
        }
        for entry in line.entries() {
            if !self.seen.insert(entry.address) {
                return Err(ModelGenError::DuplicateAddress {
                    address: entry.address,
                });
            }
            self.entries.push(entry);
        }
        Ok(())
    }

    pub fn entries(&self) -> &[MemoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Address of the first entry, which the declaration file uses as `dataStart`.
    pub fn data_start(&self) -> Option<u64> {
        self.entries.first().map(|e| e.address)
    }

    /// Smallest region covering every entry.
    pub fn region(&self) -> Option<MemoryRegion> {
        let start = self.entries.iter().map(|e| e.address).min()?;
        let end = self.entries.iter().map(|e| e.address).max()? + WORD_SIZE;
        Some(MemoryRegion::new(".rodata".to_string(), start, end - start))
    }
}

/// Build the memory table from the full text of a dump.
///
/// A dump without the `.rodata` banner yields an empty table: there is simply
/// nothing to embed.
pub fn parse_rodata(text: &str) -> Result<RodataTable> {
    let mut table = RodataTable::new();
    let mut in_rodata = false;

    for (ix, line) in text.lines().enumerate() {
        if !in_rodata {
            in_rodata = line.contains(RODATA_BANNER);
            continue;
        }
        if line.starts_with(SECTION_BANNER_PREFIX) {
            debug!("rodata ends at line {}: {}", ix + 1, line);
            break;
        }
        if line.trim().is_empty() {
            continue;
        }
        let parsed = parse_dump_line(ix + 1, line)?;
        debug!(
            "rodata 0x{:x}: {} word(s)",
            parsed.base_address,
            parsed.words.len()
        );
        table.push_line(&parsed)?;
    }

    if !in_rodata {
        info!("no '{}' banner in dump, memory table is empty", RODATA_BANNER);
    } else {
        info!("decoded {} rodata word(s)", table.len());
    }
    Ok(table)
}

/// Address span covered by the decoded section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryRegion {
    pub name: String,
    pub start: u64,
    pub size: u64,
}

impl MemoryRegion {
    pub fn new(name: String, start: u64, size: u64) -> Self {
        Self { name, start, size }
    }

    pub fn end(&self) -> u64 {
        self.start + self.size
    }

    pub fn to_json(&self) -> Value {
        json!({
            "name": self.name,
            "start": format!("0x{:x}", self.start),
            "end": format!("0x{:x}", self.end()),
            "size": format!("0x{:x}", self.size),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn le_hex(value: u32) -> String {
        value
            .to_le_bytes()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect()
    }

    #[test]
    fn decodes_bytes_in_memory_order() {
        assert_eq!(decode_le_word("78563412"), Ok(0x1234_5678));
        assert_eq!(decode_le_word("0a0b0c0d"), Ok(0x0d0c_0b0a));
        assert_eq!(decode_le_word("0102"), Ok(0x0201));
    }

    #[test]
    fn decoding_inverts_little_endian_encoding() {
        for value in [0u32, 1, 0x8000_0000, 0xdead_beef, u32::MAX] {
            assert_eq!(decode_le_word(&le_hex(value)), Ok(value));
        }
    }

    #[test]
    fn rejects_bad_groups() {
        assert!(decode_le_word("123").is_err());
        assert!(decode_le_word("0102030405").is_err());
        assert!(decode_le_word("zz000000").is_err());
        assert!(decode_le_word("").is_err());
    }

    #[test]
    fn parses_tab_separated_row() {
        let line = parse_dump_line(1, " 1000:\t78563412 0a0b0c0d    ....\n").unwrap();
        assert_eq!(line.base_address, 0x1000);
        assert_eq!(line.words, vec![0x1234_5678, 0x0d0c_0b0a]);
    }

    #[test]
    fn parses_objdump_row_with_spaces_in_ascii_column() {
        let line = parse_dump_line(
            1,
            " 18080 48656c6c 6f20776f 726c6400 00000000  Hello world.....",
        )
        .unwrap();
        assert_eq!(line.base_address, 0x18080);
        assert_eq!(line.words.len(), 4);
        assert_eq!(line.words[0], 0x6c6c_6548);
    }

    #[test]
    fn parses_short_final_row() {
        let line = parse_dump_line(1, " 18090 01000000 0200                 ......").unwrap();
        assert_eq!(line.words, vec![1, 2]);
    }

    #[test]
    fn row_without_separator_is_malformed() {
        let err = parse_dump_line(7, "18080").unwrap_err();
        assert!(matches!(err, ModelGenError::MalformedLine { line_no: 7, .. }));
    }

    #[test]
    fn row_with_bad_address_is_malformed() {
        let err = parse_dump_line(3, " xyz: 00000000  ....").unwrap_err();
        assert!(matches!(err, ModelGenError::MalformedLine { line_no: 3, .. }));
    }

    #[test]
    fn banner_scenario_yields_two_entries() {
        let dump = "prog:     file format elf32-littlearm\n\nContents of section .rodata:\n 1000:\t78563412 0a0b0c0d    ....\n";
        let table = parse_rodata(dump).unwrap();
        assert_eq!(
            table.entries(),
            &[
                MemoryEntry {
                    address: 0x1000,
                    value: 0x1234_5678
                },
                MemoryEntry {
                    address: 0x1004,
                    value: 0x0d0c_0b0a
                },
            ]
        );
        assert_eq!(table.data_start(), Some(0x1000));
    }

    #[test]
    fn dump_without_banner_is_empty() {
        let table = parse_rodata("prog:     file format elf32-littlearm\n").unwrap();
        assert!(table.is_empty());
        assert!(table.region().is_none());
        assert!(parse_rodata("").unwrap().is_empty());
    }

    #[test]
    fn entries_keep_line_order_with_stride_four() {
        let dump = "Contents of section .rodata:\n 2000 01000000 02000000 03000000 04000000  ................\n 1000 05000000  ....\n";
        let table = parse_rodata(dump).unwrap();
        let addrs: Vec<u64> = table.entries().iter().map(|e| e.address).collect();
        assert_eq!(addrs, vec![0x2000, 0x2004, 0x2008, 0x200c, 0x1000]);
        let region = table.region().unwrap();
        assert_eq!(region.start, 0x1000);
        assert_eq!(region.end(), 0x2010);
        assert_eq!(region.size, 0x1010);
    }

    #[test]
    fn next_section_banner_ends_rodata() {
        let dump = "Contents of section .rodata:\n 1000 01000000  ....\nContents of section .data:\n 3000 ffffffff  ....\n";
        let table = parse_rodata(dump).unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn overlapping_rows_are_rejected() {
        let dump = "Contents of section .rodata:\n 1000 01000000 02000000  ........\n 1004 03000000  ....\n";
        let err = parse_rodata(dump).unwrap_err();
        assert!(matches!(err, ModelGenError::DuplicateAddress { address: 0x1004 }));
    }

    #[test]
    fn row_past_the_address_space_is_malformed() {
        let dump = "Contents of section .rodata:\n ffffffffffffffff 01000000 02000000  ........\n";
        assert!(matches!(
            parse_rodata(dump),
            Err(ModelGenError::MalformedLine { line_no: 2, .. })
        ));

        let line = parse_dump_line(1, " fffffffffffffff0 01000000 02000000  ........").unwrap();
        assert_eq!(line.end_address(), Some(0xffff_ffff_ffff_fff8));
    }

    #[test]
    fn hand_built_row_past_the_address_space_is_rejected() {
        let mut table = RodataTable::new();
        let line = DumpLine {
            base_address: u64::MAX - 3,
            words: vec![1, 2],
        };
        assert!(matches!(
            table.push_line(&line),
            Err(ModelGenError::AddressOverflow { address }) if address == u64::MAX - 3
        ));
        assert!(table.is_empty());
    }

    #[test]
    fn malformed_row_aborts_the_dump() {
        let dump = "Contents of section .rodata:\n 1000 0100000g  ....\n";
        assert!(matches!(
            parse_rodata(dump),
            Err(ModelGenError::MalformedLine { line_no: 2, .. })
        ));
    }
}
