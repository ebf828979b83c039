use serde::Deserialize;

/// HiROM bank $C0: ROM offset 0 maps here.
pub const BANK_C0_OFFSET: u32 = 0xC0_0000;

/// Length of an SMC-style copier header, when one precedes the ROM image.
pub const COPIER_HEADER: u32 = 0x200;

/// Size of the HiROM window (banks $C0 to $FF). Range offsets must fit in it.
pub const ROM_WINDOW: u32 = 0x40_0000;

/// Half-open `[start, end)` region of ROM-local offsets holding script code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "(u32, u32)")]
pub struct Range {
    pub start: u32,
    pub end: u32,
}

impl From<(u32, u32)> for Range {
    fn from((start, end): (u32, u32)) -> Self {
        Self { start, end }
    }
}

/// Maps between file offsets, ROM-local offsets and absolute (bank $C0)
/// addresses, and answers whether an address lies in a code range.
#[derive(Debug, Clone)]
pub struct AddressSpace {
    header: u32,
    ranges: Vec<Range>,
}

impl AddressSpace {
    pub fn new(header: u32, ranges: Vec<Range>) -> Self {
        Self { header, ranges }
    }

    pub fn ranges(&self) -> &[Range] {
        &self.ranges
    }

    /// File offset (header included) to absolute address.
    pub fn to_absolute(&self, file_offset: u32) -> u32 {
        file_offset.wrapping_sub(self.header).wrapping_add(BANK_C0_OFFSET)
    }

    /// ROM-local offset to file offset.
    pub fn file_offset(&self, local: u32) -> u32 {
        local.wrapping_add(self.header)
    }

    /// Strictly inside some range: both boundaries count as outside.
    pub fn in_configured_range(&self, absolute: u32) -> bool {
        let Some(local) = absolute.checked_sub(BANK_C0_OFFSET) else { return false };
        self.ranges.iter().any(|r| r.start < local && local < r.end)
    }

    /// Bank bits of the instruction at `file_offset`, relative to bank $C0.
    pub fn bank_of(&self, file_offset: u32) -> u32 {
        file_offset.wrapping_sub(self.header) & 0xFF_0000
    }

    /// Rebuilds a full address from a 16-bit pointer read by the instruction
    /// at `file_offset`. The pointer always lands in that instruction's bank.
    pub fn resolve_short(&self, file_offset: u32, short: u16) -> u32 {
        BANK_C0_OFFSET + self.bank_of(file_offset) + short as u32
    }
}
