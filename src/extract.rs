use std::collections::BTreeSet;

use tracing::info;

use crate::address::{AddressSpace, BANK_C0_OFFSET};
use crate::decoder::ScriptDecoder;
use crate::disasm::fmt_instruction;
use crate::error::Result;
use crate::rom::Rom;
use crate::tables::{NewlinePolicy, Tables};

/// A chunk of output text. Instruction chunks carry their absolute address;
/// title and range markers carry none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub addr: Option<u32>,
    pub text: String,
}

impl Line {
    pub fn comment(text: impl Into<String>) -> Self {
        Self { addr: None, text: text.into() }
    }

    pub fn instruction(addr: u32, text: impl Into<String>) -> Self {
        Self { addr: Some(addr), text: text.into() }
    }

    /// True when the chunk already finishes with an empty line.
    pub fn ends_blank(&self) -> bool {
        self.text.ends_with("\n\n")
    }
}

/// Result of the decoding pass, before labels are spliced in.
#[derive(Debug, Clone, Default)]
pub struct Listing {
    pub lines: Vec<Line>,
    /// Every address that needs a label, sorted and deduplicated.
    pub labels: BTreeSet<u32>,
    /// Number of decoded instructions.
    pub instructions: usize,
}

/// Decodes every configured range in order and collects label candidates.
pub fn extract(rom: &Rom, tables: &Tables) -> Result<Listing> {
    let space = AddressSpace::new(rom.header(), tables.ranges.clone());
    let decoder = ScriptDecoder::new(tables, &space);
    let mut src = rom.cursor();
    let mut listing = Listing::default();

    listing.lines.push(Line::comment(format!("// Action Script dump for {}\n", tables.rom_info.name)));

    for range in space.ranges() {
        info!("Extracting range (0x{:06X}, 0x{:06X})", range.start, range.end);
        let start = range.start + BANK_C0_OFFSET;
        listing.lines.push(Line::comment(format!(
            "\n// RANGE (0x{:X}, 0x{:X})\n",
            start,
            range.end + BANK_C0_OFFSET
        )));
        listing.labels.insert(start);

        let end = space.file_offset(range.end);
        let mut offset = space.file_offset(range.start);
        while offset < end {
            let ins = decoder.decode(&mut src, offset)?;
            let prev_blank = listing.lines.last().is_some_and(Line::ends_blank);
            listing.lines.push(Line::instruction(ins.address, fmt_instruction(&ins, tables, prev_blank)));
            listing.labels.extend(ins.label_targets());
            listing.instructions += 1;

            offset += ins.len;
            if tables.opcodes[ins.opcode as usize].newline == NewlinePolicy::Label {
                let next = space.to_absolute(offset);
                if space.in_configured_range(next) {
                    listing.labels.insert(next);
                }
            }
        }
    }

    listing.labels.extend(tables.named_labels().map(|l| l.address));
    Ok(listing)
}
